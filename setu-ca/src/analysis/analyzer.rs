//! Contract analysis workflow
//!
//! upload → validate → store document → score → derive level, recommendation
//! and clauses → persist (one transaction) → activity log + notification.

use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use setu_common::db::{activity, notifications, ActivityEventType, NotificationCategory, User};

use super::clauses::{synthesize, ClauseSource};
use super::scoring::{ContractDocument, RiskScorer};
use super::Assessment;
use crate::db::contracts::{self, ContractAnalysis, FlaggedClause, NewAnalysis};
use crate::storage::{DocumentStore, StorageError};

/// Longest accepted employer name, in characters
pub const MAX_EMPLOYER_NAME_CHARS: usize = 200;
/// Longest accepted original file name, in characters
pub const MAX_FILENAME_CHARS: usize = 255;

const UNKNOWN_EMPLOYER: &str = "Unknown employer";

/// Per-field validation messages, keyed by form field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Validation failed")]
    Validation(FieldErrors),

    /// Unknown id, or an id owned by another user
    #[error("Contract analysis not found")]
    NotFound,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Common(#[from] setu_common::Error),
}

/// Raw upload as received from the form; every field may be missing
#[derive(Debug, Clone, Default)]
pub struct ContractUpload {
    pub employer_name: Option<String>,
    pub filename: Option<String>,
    pub content: Option<Vec<u8>>,
}

/// A persisted analysis with its clauses
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub analysis: ContractAnalysis,
    pub clauses: Vec<FlaggedClause>,
}

struct ValidUpload {
    employer_name: String,
    filename: String,
    content: Vec<u8>,
}

pub struct ContractAnalyzer {
    db: SqlitePool,
    store: Arc<dyn DocumentStore>,
    scorer: Arc<dyn RiskScorer>,
    clause_source: Arc<dyn ClauseSource>,
    max_upload_bytes: usize,
}

impl ContractAnalyzer {
    pub fn new(
        db: SqlitePool,
        store: Arc<dyn DocumentStore>,
        scorer: Arc<dyn RiskScorer>,
        clause_source: Arc<dyn ClauseSource>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            db,
            store,
            scorer,
            clause_source,
            max_upload_bytes,
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    pub fn scorer_name(&self) -> &'static str {
        self.scorer.name()
    }

    fn validate(&self, upload: ContractUpload) -> Result<ValidUpload, AnalysisError> {
        let mut errors = FieldErrors::default();

        let employer_name = upload.employer_name.unwrap_or_default().trim().to_string();
        if employer_name.chars().count() > MAX_EMPLOYER_NAME_CHARS {
            errors.add(
                "employer_name",
                format!("Ensure this value has at most {} characters.", MAX_EMPLOYER_NAME_CHARS),
            );
        }

        let filename = upload.filename.unwrap_or_default().trim().to_string();
        match upload.content {
            None => errors.add("file", "This field is required."),
            Some(ref content) if content.is_empty() => {
                errors.add("file", "The submitted file is empty.")
            }
            Some(ref content) if content.len() > self.max_upload_bytes => errors.add(
                "file",
                format!("The submitted file exceeds {} bytes.", self.max_upload_bytes),
            ),
            Some(_) if filename.is_empty() => errors.add("file", "No file name was submitted."),
            Some(_) if filename.chars().count() > MAX_FILENAME_CHARS => errors.add(
                "file",
                format!("Ensure the file name has at most {} characters.", MAX_FILENAME_CHARS),
            ),
            Some(_) => {}
        }

        if !errors.is_empty() {
            return Err(AnalysisError::Validation(errors));
        }

        Ok(ValidUpload {
            employer_name,
            filename,
            content: upload.content.unwrap_or_default(),
        })
    }

    /// Run the full analysis workflow for one upload
    pub async fn analyze(&self, user: &User, upload: ContractUpload) -> Result<AnalysisReport, AnalysisError> {
        let upload = self.validate(upload)?;

        let stored = self.store.store(&upload.filename, &upload.content).await?;

        let document = ContractDocument {
            employer_name: &upload.employer_name,
            filename: &upload.filename,
            content: &upload.content,
        };
        let score = self.scorer.score(&document).await;
        let assessment = Assessment::from_score(score);
        let drafts = synthesize(self.clause_source.as_ref(), score, &document).await;

        let new = NewAnalysis {
            user_id: user.id,
            employer_name: &upload.employer_name,
            original_filename: &upload.filename,
            document: &stored,
            assessment: &assessment,
        };

        let (analysis, clauses) = match contracts::insert_analysis_with_clauses(&self.db, &new, &drafts).await {
            Ok(inserted) => inserted,
            Err(e) => {
                // Nothing was committed; don't leave an orphaned document behind
                if let Err(cleanup) = self.store.remove(&stored.file_ref).await {
                    warn!(file_ref = %stored.file_ref, error = %cleanup, "Failed to remove orphaned document");
                }
                return Err(e.into());
            }
        };

        info!(
            user_id = user.id,
            analysis_id = analysis.id,
            scorer = self.scorer.name(),
            clause_source = self.clause_source.name(),
            risk_score = analysis.risk_score.value(),
            risk_level = %analysis.risk_level,
            clauses = clauses.len(),
            "Contract analyzed"
        );

        self.emit_side_effects(user, &analysis, clauses.len()).await;

        Ok(AnalysisReport { analysis, clauses })
    }

    /// One activity entry and one notification for the uploader only.
    /// Failures are logged; the analysis is already committed.
    async fn emit_side_effects(&self, user: &User, analysis: &ContractAnalysis, clause_count: usize) {
        let employer = if analysis.employer_name.is_empty() {
            UNKNOWN_EMPLOYER
        } else {
            analysis.employer_name.as_str()
        };

        let description = format!("Contract analyzed: {}", employer);
        if let Err(e) = activity::record_activity(&self.db, user.id, ActivityEventType::Contract, &description).await {
            warn!(user_id = user.id, analysis_id = analysis.id, error = %e, "Failed to record contract activity");
        }

        let noun = if clause_count == 1 { "clause" } else { "clauses" };
        let description = format!(
            "Your contract \"{}\" has been analyzed. {} risky {} found.",
            analysis.original_filename, clause_count, noun
        );
        if let Err(e) = notifications::create_notification(
            &self.db,
            user.id,
            NotificationCategory::Contract,
            "Contract Analysis Complete",
            &description,
        )
        .await
        {
            warn!(user_id = user.id, analysis_id = analysis.id, error = %e, "Failed to create contract notification");
        }
    }

    /// Most recent analysis for the user, if any
    pub async fn latest_for(&self, user: &User) -> Result<Option<ContractAnalysis>, AnalysisError> {
        Ok(contracts::latest_for(&self.db, user.id).await?)
    }

    /// Ownership-checked fetch; another user's id is reported as not found
    pub async fn get(&self, analysis_id: i64, user: &User) -> Result<ContractAnalysis, AnalysisError> {
        contracts::get_for_user(&self.db, analysis_id, user.id)
            .await?
            .ok_or(AnalysisError::NotFound)
    }

    pub async fn flagged_clauses_of(&self, analysis: &ContractAnalysis) -> Result<Vec<FlaggedClause>, AnalysisError> {
        Ok(contracts::flagged_clauses_of(&self.db, analysis.id).await?)
    }

    /// Report for an id, or for the latest analysis when `analysis_id` is `None`
    pub async fn report(&self, analysis_id: Option<i64>, user: &User) -> Result<AnalysisReport, AnalysisError> {
        let analysis = match analysis_id {
            Some(id) => self.get(id, user).await?,
            None => self.latest_for(user).await?.ok_or(AnalysisError::NotFound)?,
        };
        let clauses = self.flagged_clauses_of(&analysis).await?;
        Ok(AnalysisReport { analysis, clauses })
    }

    /// All analyses with their clause counts, newest first
    pub async fn history(&self, user: &User) -> Result<Vec<(ContractAnalysis, i64)>, AnalysisError> {
        let analyses = contracts::list_for_user(&self.db, user.id).await?;
        let counts: BTreeMap<i64, i64> = contracts::clause_counts(&self.db, user.id)
            .await?
            .into_iter()
            .collect();

        Ok(analyses
            .into_iter()
            .map(|a| {
                let count = counts.get(&a.id).copied().unwrap_or(0);
                (a, count)
            })
            .collect())
    }

    /// Stored contract bytes for an analysis the user owns
    pub async fn document(&self, analysis_id: i64, user: &User) -> Result<(ContractAnalysis, Vec<u8>), AnalysisError> {
        let analysis = self.get(analysis_id, user).await?;
        let bytes = self.store.retrieve(&analysis.file_ref).await?;
        Ok((analysis, bytes))
    }
}
