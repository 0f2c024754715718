use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{info, warn};

use crate::entities::document::{self, DocumentStatus, DocumentType};
use crate::error::AppError;
use crate::models::analysis::DocumentAnalysis;
use crate::services::docx::DOCX_MIME;
use crate::state::AppState;

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub id: i32,
    pub filename: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub file_path: String,
    pub status: DocumentStatus,
    /// Generated SRS text.
    pub extracted_data: Option<String>,
    pub result_link: Option<String>,
    pub error_message: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl From<document::Model> for DocumentResponse {
    fn from(model: document::Model) -> Self {
        Self {
            id: model.id,
            filename: model.filename,
            doc_type: model.doc_type,
            file_path: model.file_path,
            status: model.status,
            extracted_data: model
                .extracted_data
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()),
            result_link: model.result_link,
            error_message: model.error_message,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    pub id: i32,
    pub filename: String,
    /// Always `PROCESSING`: processing has been scheduled, not necessarily started.
    pub status: DocumentStatus,
    pub timestamp: chrono::NaiveDateTime,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SummaryResponse {
    pub id: i32,
    pub summary: String,
}

#[utoipa::path(
    post,
    path = "/documents",
    request_body(content = Vec<u8>, content_type = "multipart/form-data", description = "`file` (required) and `type` (BRD, SRS or OTHER; default BRD)"),
    responses(
        (status = 201, description = "Document stored, processing scheduled", body = UploadResponse),
        (status = 400, description = "Missing file or unknown type"),
        (status = 500, description = "Storage failure")
    ),
    tag = "Documents"
)]
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut doc_type = DocumentType::Brd;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Invalid multipart data".to_string()))?
    {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("unknown").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::BadRequest("Failed to read file bytes".to_string()))?;
                file = Some((filename, data.to_vec()));
            }
            Some("type") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|_| AppError::BadRequest("Invalid type field".to_string()))?;
                if !raw.trim().is_empty() {
                    doc_type = raw.parse().map_err(AppError::BadRequest)?;
                }
            }
            _ => {}
        }
    }

    let Some((filename, data)) = file else {
        warn!("Documents | POST /documents | res=400 | No file field found");
        return Err(AppError::BadRequest("No file field found".to_string()));
    };

    let saved = state.documents.upload(&filename, doc_type, &data).await?;
    state.queue.enqueue(saved.id);

    info!(
        "Documents | POST /documents | id={} | file={} | size={} | res=201",
        saved.id,
        saved.filename,
        data.len()
    );
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            id: saved.id,
            filename: saved.filename,
            status: DocumentStatus::Processing,
            timestamp: saved.created_at,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/documents",
    responses(
        (status = 200, description = "All documents, newest first", body = Vec<DocumentResponse>)
    ),
    tag = "Documents"
)]
pub async fn list_documents(State(state): State<AppState>) -> Result<Json<Vec<DocumentResponse>>, AppError> {
    let docs = state.documents.list().await?;
    info!("Documents | GET /documents | count={} | res=200", docs.len());
    Ok(Json(docs.into_iter().map(DocumentResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/documents/{id}",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document", body = DocumentResponse),
        (status = 404, description = "Document not found")
    ),
    tag = "Documents"
)]
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DocumentResponse>, AppError> {
    let doc = state.documents.get(id).await?;
    Ok(Json(doc.into()))
}

#[utoipa::path(
    post,
    path = "/documents/{id}/process",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Processing finished", body = DocumentResponse),
        (status = 400, description = "Invalid id"),
        (status = 404, description = "Document not found"),
        (status = 409, description = "Already processing or completed"),
        (status = 500, description = "Pipeline failure"),
        (status = 502, description = "AI provider failure")
    ),
    tag = "Documents"
)]
pub async fn process_document(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DocumentResponse>, AppError> {
    let doc = state.documents.process(id).await?;
    info!("Documents | POST /documents/{}/process | status={} | res=200", id, doc.status);
    Ok(Json(doc.into()))
}

#[utoipa::path(
    delete,
    path = "/documents/{id}",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document and raw file deleted"),
        (status = 404, description = "Document not found"),
        (status = 409, description = "Document is being processed"),
        (status = 500, description = "Raw file could not be deleted; record kept")
    ),
    tag = "Documents"
)]
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.documents.delete(id).await?;
    info!("Documents | DELETE /documents/{} | res=200", id);
    Ok(Json(serde_json::json!({ "message": "Document deleted successfully" })))
}

#[utoipa::path(
    get,
    path = "/documents/{id}/download",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Rendered SRS artifact", content_type = "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        (status = 400, description = "Document not completed"),
        (status = 404, description = "Document not found")
    ),
    tag = "Documents"
)]
pub async fn download_document(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let doc = state.documents.get(id).await?;

    if doc.status != DocumentStatus::Completed {
        warn!("Documents | GET /documents/{}/download | status={} | res=400", id, doc.status);
        return Err(AppError::BadRequest(format!(
            "Document {} is not completed (status {})",
            id, doc.status
        )));
    }

    let link = doc
        .result_link
        .ok_or_else(|| AppError::NotFound(format!("Document {} has no rendered artifact", id)))?;

    let bytes = tokio::fs::read(&link)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to read artifact {}: {}", link, e)))?;

    let name = std::path::Path::new(&link)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("srs-{}.docx", id));

    info!("Documents | GET /documents/{}/download | size={} | res=200", id, bytes.len());
    Ok((
        [
            (header::CONTENT_TYPE, DOCX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", name)),
        ],
        bytes,
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/documents/{id}/summary",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "AI summary of the raw upload", body = SummaryResponse),
        (status = 404, description = "Document not found"),
        (status = 502, description = "AI provider failure"),
        (status = 503, description = "AI provider not configured")
    ),
    tag = "Documents"
)]
pub async fn summarize_document(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SummaryResponse>, AppError> {
    let summary = state.documents.summarize(id).await?;
    info!("Documents | GET /documents/{}/summary | res=200", id);
    Ok(Json(SummaryResponse { id, summary }))
}

#[utoipa::path(
    post,
    path = "/documents/{id}/analyze",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Structured analysis", body = DocumentAnalysis),
        (status = 404, description = "Document not found"),
        (status = 502, description = "AI provider failure or unparseable output")
    ),
    tag = "Documents"
)]
pub async fn analyze_document(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DocumentAnalysis>, AppError> {
    let analysis = state.documents.analyze(id).await?;
    info!("Documents | POST /documents/{}/analyze | res=200", id);
    Ok(Json(analysis))
}
