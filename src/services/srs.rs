use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{info, warn};

use crate::entities::document::{self, DocumentStatus, Entity as Document};
use crate::entities::srs::{self, Entity as Srs, DEFAULT_VERSION, DRAFT_STATUS};
use crate::error::AppError;
use crate::models::srs_section::placeholder_outline;
use crate::services::ai::AiAdapter;
use crate::utils::text_extractor::{truncate_chars, MAX_SOURCE_CHARS};

/// Synchronous SRS generation from an already processed document.
pub struct SrsService {
    db: DatabaseConnection,
    ai: Arc<dyn AiAdapter>,
}

impl SrsService {
    pub fn new(db: DatabaseConnection, ai: Arc<dyn AiAdapter>) -> Self {
        Self { db, ai }
    }

    pub async fn generate(&self, document_id: i32, title: &str) -> Result<srs::Model, AppError> {
        let doc = Document::find_by_id(document_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", document_id)))?;

        if doc.status != DocumentStatus::Completed {
            return Err(AppError::PreconditionFailed(
                "document must be processed first".to_string(),
            ));
        }

        let source = stored_text(&doc);
        if source.trim().is_empty() {
            warn!("SRS | document {} has no stored text", document_id);
        }

        let content = self
            .ai
            .generate_srs(truncate_chars(&source, MAX_SOURCE_CHARS))
            .await?;

        let title = if title.trim().is_empty() {
            format!("SRS - {}", doc.filename)
        } else {
            title.trim().to_string()
        };

        let sections = serde_json::to_value(placeholder_outline())
            .map_err(|e| AppError::InternalServerError(format!("Failed to encode sections: {}", e)))?;

        let now = chrono::Utc::now().naive_utc();
        let record = srs::ActiveModel {
            source_document_id: Set(document_id),
            title: Set(title),
            version: Set(DEFAULT_VERSION.to_string()),
            content: Set(content),
            sections: Set(sections),
            status: Set(DRAFT_STATUS.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let saved = record.insert(&self.db).await?;
        info!("SRS | created id={} from document={} via {}", saved.id, document_id, self.ai.name());
        Ok(saved)
    }

    pub async fn get(&self, id: i32) -> Result<srs::Model, AppError> {
        Srs::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("SRS {} not found", id)))
    }

    pub async fn list(&self) -> Result<Vec<srs::Model>, AppError> {
        Ok(Srs::find()
            .order_by_desc(srs::Column::CreatedAt)
            .order_by_desc(srs::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn list_by_document(&self, document_id: i32) -> Result<Vec<srs::Model>, AppError> {
        Ok(Srs::find()
            .filter(srs::Column::SourceDocumentId.eq(document_id))
            .order_by_desc(srs::Column::CreatedAt)
            .order_by_desc(srs::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Partial update: `None` or empty values leave the stored field as is.
    pub async fn update(
        &self,
        id: i32,
        content: Option<String>,
        status: Option<String>,
    ) -> Result<srs::Model, AppError> {
        let existing = self.get(id).await?;

        let content = content.filter(|c| !c.is_empty());
        let status = status.filter(|s| !s.trim().is_empty());
        if content.is_none() && status.is_none() {
            return Ok(existing);
        }

        let mut active: srs::ActiveModel = existing.into();
        if let Some(content) = content {
            active.content = Set(content);
        }
        if let Some(status) = status {
            active.status = Set(status.trim().to_string());
        }
        active.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = active.update(&self.db).await?;
        info!("SRS | updated id={} status={}", updated.id, updated.status);
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        let res = Srs::delete_by_id(id).exec(&self.db).await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound(format!("SRS {} not found", id)));
        }
        info!("SRS | deleted id={}", id);
        Ok(())
    }
}

fn stored_text(doc: &document::Model) -> String {
    doc.extracted_data
        .as_deref()
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default()
}
