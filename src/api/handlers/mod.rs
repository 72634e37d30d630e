use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::DesignError;
use crate::export::{ExportArtifact, StoredExport};
use crate::models::*;
use crate::service::DesignService;

pub const STORAGE_FALLBACK_HEADER: &str = "X-Storage-Fallback";

// ============================================================
// Error Handling
// ============================================================

/// A [`DesignError`] on its way to becoming an HTTP response.
///
/// Persistence and internal failures are logged in full and sent to the
/// client as a generic message.
#[derive(Debug)]
pub struct ApiError(pub DesignError);

impl From<DesignError> for ApiError {
    fn from(e: DesignError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DesignError::Validation(errors) => {
                let body = serde_json::json!({
                    "error": self.0.to_string(),
                    "violations": errors.violations,
                });
                return (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response();
            }
            DesignError::InvalidQuery(_) | DesignError::UnsupportedFormat(_) => {
                StatusCode::BAD_REQUEST
            }
            DesignError::NotFound(_) => StatusCode::NOT_FOUND,
            DesignError::AccessDenied(_) => StatusCode::FORBIDDEN,
            DesignError::EmptyDesign | DesignError::InvalidSymmetry(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            DesignError::VersionConflict { .. } => StatusCode::CONFLICT,
            DesignError::Persistence(_) | DesignError::Internal(_) => {
                tracing::error!("Internal error: {:#}", self.0);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "Internal server error" })),
                )
                    .into_response();
            }
        };

        tracing::debug!(%status, "Request failed: {}", self.0);
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Designs
// ============================================================

pub async fn create_design(
    State(service): State<DesignService>,
    caller: Caller,
    Json(input): Json<CreateDesignInput>,
) -> ApiResult<(StatusCode, Json<Design>)> {
    let design = service.create(&caller, input)?;
    Ok((StatusCode::CREATED, Json(design)))
}

pub async fn list_own_designs(
    State(service): State<DesignService>,
    caller: Caller,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<DesignSummary>>> {
    Ok(Json(service.list_own(&caller, &query)?))
}

pub async fn list_public_designs(
    State(service): State<DesignService>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<DesignSummary>>> {
    Ok(Json(service.list_public(&query)?))
}

pub async fn get_design(
    State(service): State<DesignService>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Design>> {
    Ok(Json(service.get(&caller, id)?))
}

pub async fn update_design(
    State(service): State<DesignService>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(patch): Json<DesignPatch>,
) -> ApiResult<Json<Design>> {
    Ok(Json(service.update(&caller, id, patch)?))
}

pub async fn delete_design(
    State(service): State<DesignService>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    service.delete(&caller, id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clone_design(
    State(service): State<DesignService>,
    caller: Caller,
    Path(id): Path<Uuid>,
    input: Option<Json<CloneDesignInput>>,
) -> ApiResult<(StatusCode, Json<Design>)> {
    let name = input.and_then(|Json(i)| i.name);
    let copy = service.clone_design(&caller, id, name)?;
    Ok((StatusCode::CREATED, Json(copy)))
}

pub async fn toggle_visibility(
    State(service): State<DesignService>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Design>> {
    Ok(Json(service.toggle_public(&caller, id)?))
}

pub async fn get_history(
    State(service): State<DesignService>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<VersionHistoryEntry>>> {
    Ok(Json(service.history(&caller, id)?))
}

pub async fn get_analysis(
    State(service): State<DesignService>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DesignAnalysis>> {
    Ok(Json(service.analysis(&caller, id)?))
}

// ============================================================
// Export
// ============================================================

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

impl ExportQuery {
    fn format(&self) -> &str {
        self.format.as_deref().unwrap_or("svg")
    }
}

fn artifact_response(artifact: ExportArtifact) -> Response {
    (
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", artifact.file_name),
            ),
        ],
        Bytes::from(artifact.bytes),
    )
        .into_response()
}

pub async fn export_design(
    State(service): State<DesignService>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let artifact = service.export(&caller, id, query.format()).await?;
    Ok(artifact_response(artifact))
}

/// Export and upload. When the upload degrades to a local file, the bytes
/// are returned directly and flagged with [`STORAGE_FALLBACK_HEADER`].
pub async fn store_export(
    State(service): State<DesignService>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let stored = service.export_and_store(&caller, id, query.format()).await?;
    let info = stored.info();
    match stored {
        StoredExport::Remote { .. } => Ok((StatusCode::CREATED, Json(info)).into_response()),
        // The staged file is removed when `file` drops at the end of this arm.
        StoredExport::Local { file: _file, artifact } => {
            let mut response = artifact_response(artifact);
            response
                .headers_mut()
                .insert(STORAGE_FALLBACK_HEADER, header::HeaderValue::from_static("local"));
            Ok(response)
        }
    }
}
