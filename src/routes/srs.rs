use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::entities::srs;
use crate::error::AppError;
use crate::models::srs_section::SrsSection;
use crate::state::AppState;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateSrsRequest {
    #[serde(alias = "documentId")]
    pub document_id: i32,
    #[serde(default)]
    pub title: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateSrsRequest {
    pub content: Option<String>,
    pub status: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SrsResponse {
    pub id: i32,
    pub source_document_id: i32,
    pub title: String,
    pub version: String,
    pub content: String,
    pub sections: Vec<SrsSection>,
    pub status: String,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl From<srs::Model> for SrsResponse {
    fn from(model: srs::Model) -> Self {
        Self {
            id: model.id,
            source_document_id: model.source_document_id,
            title: model.title,
            version: model.version,
            content: model.content,
            sections: serde_json::from_value(model.sections).unwrap_or_else(|e| {
                warn!("SRS | id={} has unreadable sections, returning none: {}", model.id, e);
                Vec::new()
            }),
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/srs",
    request_body = CreateSrsRequest,
    responses(
        (status = 201, description = "SRS generated", body = SrsResponse),
        (status = 404, description = "Document not found"),
        (status = 409, description = "Document must be processed first"),
        (status = 502, description = "AI provider failure")
    ),
    tag = "SRS"
)]
pub async fn create_srs(
    State(state): State<AppState>,
    Json(payload): Json<CreateSrsRequest>,
) -> Result<(StatusCode, Json<SrsResponse>), AppError> {
    let created = state.srs.generate(payload.document_id, &payload.title).await?;
    info!(
        "SRS | POST /srs | id={} | document={} | res=201",
        created.id, payload.document_id
    );
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get,
    path = "/srs",
    responses((status = 200, description = "All SRS records", body = Vec<SrsResponse>)),
    tag = "SRS"
)]
pub async fn list_srs(State(state): State<AppState>) -> Result<Json<Vec<SrsResponse>>, AppError> {
    let records = state.srs.list().await?;
    Ok(Json(records.into_iter().map(SrsResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/srs/{id}",
    params(("id" = i32, Path, description = "SRS ID")),
    responses(
        (status = 200, description = "SRS record", body = SrsResponse),
        (status = 404, description = "SRS not found")
    ),
    tag = "SRS"
)]
pub async fn get_srs(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SrsResponse>, AppError> {
    Ok(Json(state.srs.get(id).await?.into()))
}

#[utoipa::path(
    get,
    path = "/srs/document/{document_id}",
    params(("document_id" = i32, Path, description = "Source document ID")),
    responses((status = 200, description = "SRS records generated from the document", body = Vec<SrsResponse>)),
    tag = "SRS"
)]
pub async fn list_srs_by_document(
    State(state): State<AppState>,
    Path(document_id): Path<i32>,
) -> Result<Json<Vec<SrsResponse>>, AppError> {
    let records = state.srs.list_by_document(document_id).await?;
    Ok(Json(records.into_iter().map(SrsResponse::from).collect()))
}

#[utoipa::path(
    put,
    path = "/srs/{id}",
    params(("id" = i32, Path, description = "SRS ID")),
    request_body = UpdateSrsRequest,
    responses(
        (status = 200, description = "Updated SRS", body = SrsResponse),
        (status = 404, description = "SRS not found")
    ),
    tag = "SRS"
)]
pub async fn update_srs(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateSrsRequest>,
) -> Result<Json<SrsResponse>, AppError> {
    let updated = state.srs.update(id, payload.content, payload.status).await?;
    info!("SRS | PUT /srs/{} | status={} | res=200", id, updated.status);
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/srs/{id}",
    params(("id" = i32, Path, description = "SRS ID")),
    responses(
        (status = 200, description = "SRS deleted"),
        (status = 404, description = "SRS not found")
    ),
    tag = "SRS"
)]
pub async fn delete_srs(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.srs.delete(id).await?;
    info!("SRS | DELETE /srs/{} | res=200", id);
    Ok(Json(serde_json::json!({ "message": "SRS deleted successfully" })))
}
