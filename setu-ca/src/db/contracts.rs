//! Contract analysis persistence
//!
//! Analyses are immutable audit records: this module has inserts and reads
//! only. Deletion happens solely through the `users` cascade.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use setu_common::{time, Error, Result};

use crate::analysis::{Assessment, FlaggedClauseDraft, RiskLevel, RiskScore, Severity};
use crate::storage::StoredDocument;

#[derive(Debug, Clone, Serialize)]
pub struct ContractAnalysis {
    pub id: i64,
    pub user_id: i64,
    pub employer_name: String,
    pub file_ref: String,
    pub original_filename: String,
    pub file_sha256: String,
    pub file_size: i64,
    pub analyzed_at: DateTime<Utc>,
    pub risk_score: RiskScore,
    pub risk_level: RiskLevel,
    pub ai_recommendation: String,
    pub ai_recommendation_ne: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlaggedClause {
    pub id: i64,
    pub analysis_id: i64,
    pub clause_reference: String,
    pub title: String,
    pub severity: Severity,
    pub original_text: String,
    pub explanation_ne: String,
    pub recommendation: String,
}

/// Everything needed to insert one analysis
#[derive(Debug, Clone)]
pub struct NewAnalysis<'a> {
    pub user_id: i64,
    pub employer_name: &'a str,
    pub original_filename: &'a str,
    pub document: &'a StoredDocument,
    pub assessment: &'a Assessment,
}

const ANALYSIS_COLUMNS: &str = "id, user_id, employer_name, file_ref, original_filename, \
                                file_sha256, file_size, analyzed_at, risk_score, risk_level, \
                                ai_recommendation, ai_recommendation_ne";

fn analysis_from_row(row: &SqliteRow) -> Result<ContractAnalysis> {
    let raw_score: i64 = row.try_get("risk_score")?;
    let risk_score = RiskScore::new(raw_score)
        .ok_or_else(|| Error::Decode(format!("Stored risk score out of range: {}", raw_score)))?;
    let risk_level: String = row.try_get("risk_level")?;
    let analyzed_at: String = row.try_get("analyzed_at")?;

    Ok(ContractAnalysis {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        employer_name: row.try_get("employer_name")?,
        file_ref: row.try_get("file_ref")?,
        original_filename: row.try_get("original_filename")?,
        file_sha256: row.try_get("file_sha256")?,
        file_size: row.try_get("file_size")?,
        analyzed_at: time::from_db(&analyzed_at)?,
        risk_score,
        risk_level: risk_level.parse()?,
        ai_recommendation: row.try_get("ai_recommendation")?,
        ai_recommendation_ne: row.try_get("ai_recommendation_ne")?,
    })
}

fn clause_from_row(row: &SqliteRow) -> Result<FlaggedClause> {
    let severity: String = row.try_get("severity")?;

    Ok(FlaggedClause {
        id: row.try_get("id")?,
        analysis_id: row.try_get("analysis_id")?,
        clause_reference: row.try_get("clause_reference")?,
        title: row.try_get("title")?,
        severity: severity.parse()?,
        original_text: row.try_get("original_text")?,
        explanation_ne: row.try_get("explanation_ne")?,
        recommendation: row.try_get("recommendation")?,
    })
}

/// Insert an analysis and its clauses atomically
///
/// The analysis row is written first, then the clauses, inside one
/// transaction. Clauses are returned in `flagged_clauses_of` order
/// (`clause_reference`, then id), whatever order the drafts came in.
pub async fn insert_analysis_with_clauses(
    pool: &SqlitePool,
    new: &NewAnalysis<'_>,
    drafts: &[FlaggedClauseDraft],
) -> Result<(ContractAnalysis, Vec<FlaggedClause>)> {
    let analyzed_at = time::now();
    let recommendation = new.assessment.recommendation;

    let mut tx = pool.begin().await?;

    let analysis_id = sqlx::query(
        r#"
        INSERT INTO contract_analyses (
            user_id, employer_name, file_ref, original_filename, file_sha256, file_size,
            analyzed_at, risk_score, risk_level, ai_recommendation, ai_recommendation_ne
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new.user_id)
    .bind(new.employer_name)
    .bind(&new.document.file_ref)
    .bind(new.original_filename)
    .bind(&new.document.sha256)
    .bind(new.document.size as i64)
    .bind(time::to_db(&analyzed_at))
    .bind(new.assessment.score.value() as i64)
    .bind(new.assessment.level.as_str())
    .bind(recommendation.en)
    .bind(recommendation.ne)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    let mut clauses = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let clause_id = sqlx::query(
            r#"
            INSERT INTO flagged_clauses (
                analysis_id, clause_reference, title, severity,
                original_text, explanation_ne, recommendation
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(analysis_id)
        .bind(&draft.clause_reference)
        .bind(&draft.title)
        .bind(draft.severity.as_str())
        .bind(&draft.original_text)
        .bind(&draft.explanation_ne)
        .bind(&draft.recommendation)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        clauses.push(FlaggedClause {
            id: clause_id,
            analysis_id,
            clause_reference: draft.clause_reference.clone(),
            title: draft.title.clone(),
            severity: draft.severity,
            original_text: draft.original_text.clone(),
            explanation_ne: draft.explanation_ne.clone(),
            recommendation: draft.recommendation.clone(),
        });
    }

    tx.commit().await?;

    clauses.sort_by(|a, b| {
        a.clause_reference
            .cmp(&b.clause_reference)
            .then(a.id.cmp(&b.id))
    });

    debug!(analysis_id, clauses = clauses.len(), "Committed contract analysis");

    let analysis = ContractAnalysis {
        id: analysis_id,
        user_id: new.user_id,
        employer_name: new.employer_name.to_string(),
        file_ref: new.document.file_ref.clone(),
        original_filename: new.original_filename.to_string(),
        file_sha256: new.document.sha256.clone(),
        file_size: new.document.size as i64,
        analyzed_at,
        risk_score: new.assessment.score,
        risk_level: new.assessment.level,
        ai_recommendation: recommendation.en.to_string(),
        ai_recommendation_ne: recommendation.ne.to_string(),
    };

    Ok((analysis, clauses))
}

/// Most recent analysis for a user (ties broken by insertion order)
pub async fn latest_for(pool: &SqlitePool, user_id: i64) -> Result<Option<ContractAnalysis>> {
    let sql = format!(
        "SELECT {} FROM contract_analyses WHERE user_id = ? ORDER BY analyzed_at DESC, id DESC LIMIT 1",
        ANALYSIS_COLUMNS
    );
    let row = sqlx::query(&sql).bind(user_id).fetch_optional(pool).await?;

    row.as_ref().map(analysis_from_row).transpose()
}

/// Ownership-checked fetch
///
/// Returns `None` both when the id does not exist and when it belongs to
/// someone else, so callers cannot distinguish the two.
pub async fn get_for_user(
    pool: &SqlitePool,
    analysis_id: i64,
    user_id: i64,
) -> Result<Option<ContractAnalysis>> {
    let sql = format!(
        "SELECT {} FROM contract_analyses WHERE id = ? AND user_id = ?",
        ANALYSIS_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(analysis_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(analysis_from_row).transpose()
}

/// Analysis history, newest first
pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<ContractAnalysis>> {
    let sql = format!(
        "SELECT {} FROM contract_analyses WHERE user_id = ? ORDER BY analyzed_at DESC, id DESC",
        ANALYSIS_COLUMNS
    );
    let rows = sqlx::query(&sql).bind(user_id).fetch_all(pool).await?;

    rows.iter().map(analysis_from_row).collect()
}

/// Clauses of an analysis ordered by `clause_reference` (lexicographic)
pub async fn flagged_clauses_of(pool: &SqlitePool, analysis_id: i64) -> Result<Vec<FlaggedClause>> {
    let rows = sqlx::query(
        r#"
        SELECT id, analysis_id, clause_reference, title, severity,
               original_text, explanation_ne, recommendation
        FROM flagged_clauses
        WHERE analysis_id = ?
        ORDER BY clause_reference ASC, id ASC
        "#,
    )
    .bind(analysis_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(clause_from_row).collect()
}

/// Clause counts for each analysis id in one query
pub async fn clause_counts(pool: &SqlitePool, user_id: i64) -> Result<Vec<(i64, i64)>> {
    let counts = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT a.id, COUNT(c.id)
        FROM contract_analyses a
        LEFT JOIN flagged_clauses c ON c.analysis_id = a.id
        WHERE a.user_id = ?
        GROUP BY a.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::clauses::{synthesize, TemplateClauseSource};
    use crate::analysis::ContractDocument;
    use setu_common::db::init::init_database;
    use setu_common::db::users::{create_user, NewUser};
    use tempfile::TempDir;

    fn stored(n: u8) -> StoredDocument {
        StoredDocument {
            file_ref: format!("doc-{}.pdf", n),
            sha256: "0".repeat(64),
            size: 10,
        }
    }

    async fn insert(pool: &SqlitePool, user_id: i64, score: i64, n: u8) -> ContractAnalysis {
        let assessment = Assessment::from_score(RiskScore::new(score).unwrap());
        let doc = ContractDocument {
            employer_name: "Acme Corp",
            filename: "c.pdf",
            content: b"",
        };
        let drafts = synthesize(&TemplateClauseSource, assessment.score, &doc).await;
        let document = stored(n);
        let new = NewAnalysis {
            user_id,
            employer_name: "Acme Corp",
            original_filename: "c.pdf",
            document: &document,
            assessment: &assessment,
        };
        insert_analysis_with_clauses(pool, &new, &drafts).await.unwrap().0
    }

    #[tokio::test]
    async fn test_insert_returns_clauses_in_read_order() {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("c.db")).await.unwrap();
        let user = create_user(&pool, &NewUser::worker("ram"), "t").await.unwrap();

        let assessment = Assessment::from_score(RiskScore::new(72).unwrap());
        let doc = ContractDocument {
            employer_name: "Acme Corp",
            filename: "c.pdf",
            content: b"",
        };
        // Tier order puts Clause 7.1 first
        let drafts = synthesize(&TemplateClauseSource, assessment.score, &doc).await;
        assert_eq!(drafts[0].clause_reference, "Clause 7.1");

        let document = stored(1);
        let new = NewAnalysis {
            user_id: user.id,
            employer_name: "Acme Corp",
            original_filename: "c.pdf",
            document: &document,
            assessment: &assessment,
        };
        let (analysis, inserted) = insert_analysis_with_clauses(&pool, &new, &drafts).await.unwrap();
        let read_back = flagged_clauses_of(&pool, analysis.id).await.unwrap();

        let inserted_ids: Vec<_> = inserted.iter().map(|c| c.id).collect();
        let read_ids: Vec<_> = read_back.iter().map(|c| c.id).collect();
        assert_eq!(inserted_ids, read_ids);
        assert_eq!(inserted[0].clause_reference, "Clause 4.2");
    }

    #[tokio::test]
    async fn test_clauses_read_back_in_reference_order() {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("c.db")).await.unwrap();
        let user = create_user(&pool, &NewUser::worker("ram"), "t").await.unwrap();

        let analysis = insert(&pool, user.id, 72, 1).await;
        let clauses = flagged_clauses_of(&pool, analysis.id).await.unwrap();

        let refs: Vec<_> = clauses.iter().map(|c| c.clause_reference.as_str()).collect();
        assert_eq!(refs, vec!["Clause 4.2", "Clause 7.1"]);
    }

    #[tokio::test]
    async fn test_latest_and_ownership() {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("c.db")).await.unwrap();
        let ram = create_user(&pool, &NewUser::worker("ram"), "a").await.unwrap();
        let hari = create_user(&pool, &NewUser::worker("hari"), "b").await.unwrap();

        assert!(latest_for(&pool, ram.id).await.unwrap().is_none());

        insert(&pool, ram.id, 20, 1).await;
        let second = insert(&pool, ram.id, 50, 2).await;

        let latest = latest_for(&pool, ram.id).await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);
        assert_eq!(latest.risk_level, RiskLevel::Medium);

        assert!(get_for_user(&pool, second.id, ram.id).await.unwrap().is_some());
        assert!(get_for_user(&pool, second.id, hari.id).await.unwrap().is_none());
        assert!(get_for_user(&pool, 9999, ram.id).await.unwrap().is_none());

        let history = list_for_user(&pool, ram.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, second.id);

        let mut counts = clause_counts(&pool, ram.id).await.unwrap();
        counts.sort();
        assert_eq!(counts.iter().map(|(_, n)| *n).collect::<Vec<_>>(), vec![0, 1]);
    }
}
