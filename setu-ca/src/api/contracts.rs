//! Contract upload and report endpoints

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use setu_common::db::User;

use crate::analysis::{AnalysisReport, ContractUpload, FieldErrors, Severity};
use crate::api::CurrentUser;
use crate::db::contracts::{ContractAnalysis, FlaggedClause};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Report body: analysis, clauses, and the recommendation in the user's language
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    #[serde(flatten)]
    pub report: AnalysisReport,
    pub recommendation: String,
}

impl ReportResponse {
    fn for_user(report: AnalysisReport, user: &User) -> Self {
        let recommendation = report
            .analysis
            .risk_level
            .recommendation()
            .text(user.language_preference)
            .to_string();
        Self { report, recommendation }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub analysis: ContractAnalysis,
    pub clause_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ClauseDetailResponse {
    pub analysis_id: i64,
    pub employer_name: String,
    pub clauses: Vec<FlaggedClause>,
    pub severity_counts: BTreeMap<&'static str, usize>,
}

fn severity_counts(clauses: &[FlaggedClause]) -> BTreeMap<&'static str, usize> {
    Severity::ALL
        .iter()
        .map(|sev| {
            let count = clauses.iter().filter(|c| c.severity == *sev).count();
            (sev.as_str(), count)
        })
        .collect()
}

fn multipart_error(err: MultipartError, max_upload_bytes: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        let mut fields = FieldErrors::default();
        fields.add("file", format!("The submitted file exceeds {} bytes.", max_upload_bytes));
        return ApiError::Validation(fields);
    }
    ApiError::BadRequest(err.body_text())
}

/// POST /contracts
///
/// Multipart form with `employer_name` (optional) and `file`.
pub async fn upload_contract(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let max_upload_bytes = state.analyzer.max_upload_bytes();
    let mut upload = ContractUpload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_upload_bytes))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "employer_name" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, max_upload_bytes))?;
                upload.employer_name = Some(text);
            }
            "file" => {
                upload.filename = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, max_upload_bytes))?;
                upload.content = Some(bytes.to_vec());
            }
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    let report = state.analyzer.analyze(&user, upload).await?;
    let location = format!("/contracts/{}/report", report.analysis.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(ReportResponse::for_user(report, &user)),
    ))
}

/// GET /contracts
pub async fn list_contracts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<HistoryEntry>>> {
    let history = state.analyzer.history(&user).await?;
    Ok(Json(
        history
            .into_iter()
            .map(|(analysis, clause_count)| HistoryEntry { analysis, clause_count })
            .collect(),
    ))
}

/// GET /contracts/report
///
/// Latest analysis for the user; 404 when there is none.
pub async fn latest_report(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<ReportResponse>> {
    let report = state.analyzer.report(None, &user).await?;
    Ok(Json(ReportResponse::for_user(report, &user)))
}

/// GET /contracts/:id/report
pub async fn get_report(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(analysis_id): Path<i64>,
) -> ApiResult<Json<ReportResponse>> {
    let report = state.analyzer.report(Some(analysis_id), &user).await?;
    Ok(Json(ReportResponse::for_user(report, &user)))
}

/// GET /contracts/:id/clauses
pub async fn get_clauses(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(analysis_id): Path<i64>,
) -> ApiResult<Json<ClauseDetailResponse>> {
    let analysis = state.analyzer.get(analysis_id, &user).await?;
    let clauses = state.analyzer.flagged_clauses_of(&analysis).await?;

    Ok(Json(ClauseDetailResponse {
        analysis_id: analysis.id,
        employer_name: analysis.employer_name,
        severity_counts: severity_counts(&clauses),
        clauses,
    }))
}

/// Header-safe rendition of a user-supplied file name
fn attachment_name(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim().is_empty() {
        "contract".to_string()
    } else {
        cleaned
    }
}

/// GET /contracts/:id/document
pub async fn download_document(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(analysis_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let (analysis, bytes) = state.analyzer.document(analysis_id, &user).await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        attachment_name(&analysis.original_filename)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

/// Build contract routes
pub fn contract_routes() -> Router<AppState> {
    Router::new()
        .route("/contracts", post(upload_contract).get(list_contracts))
        .route("/contracts/report", get(latest_report))
        .route("/contracts/:id/report", get(get_report))
        .route("/contracts/:id/clauses", get(get_clauses))
        .route("/contracts/:id/document", get(download_document))
}
