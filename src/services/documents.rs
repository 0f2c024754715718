use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{error, info, warn};

use crate::entities::document::{self, DocumentStatus, DocumentType, Entity as Document};
use crate::error::AppError;
use crate::models::analysis::DocumentAnalysis;
use crate::services::ai::AiAdapter;
use crate::services::docx::ArtifactRenderer;
use crate::services::storage::FileStorage;
use crate::utils::sanitize_filename;
use crate::utils::text_extractor::{self, MAX_SOURCE_CHARS};

pub const INTERRUPTED_MESSAGE: &str = "processing interrupted by restart";

/// Owns the document lifecycle: UPLOADED -> PROCESSING -> COMPLETED | FAILED.
///
/// Every transition out of PROCESSING is a conditional update on the current
/// status, so only the run that claimed the document can finish it.
pub struct DocumentService {
    db: DatabaseConnection,
    storage: FileStorage,
    ai: Arc<dyn AiAdapter>,
    renderer: Arc<dyn ArtifactRenderer>,
}

/// Outcome of the work done after a document was claimed.
enum RunError {
    /// Nothing usable was produced.
    Failed(AppError),
    /// Text was generated but could not be rendered; keep it for the retry.
    RenderFailed { draft: String, error: AppError },
}

impl DocumentService {
    pub fn new(
        db: DatabaseConnection,
        storage: FileStorage,
        ai: Arc<dyn AiAdapter>,
        renderer: Arc<dyn ArtifactRenderer>,
    ) -> Self {
        Self {
            db,
            storage,
            ai,
            renderer,
        }
    }

    /// Stores the raw file and records it as UPLOADED under its final path component.
    pub async fn upload(
        &self,
        filename: &str,
        doc_type: DocumentType,
        data: &[u8],
    ) -> Result<document::Model, AppError> {
        let filename = sanitize_filename(filename);
        let file_path = self.storage.save_file(&filename, data).await?;
        let now = chrono::Utc::now().naive_utc();

        let doc = document::ActiveModel {
            filename: Set(filename),
            doc_type: Set(doc_type),
            file_path: Set(file_path),
            status: Set(DocumentStatus::Uploaded),
            extracted_data: Set(None),
            result_link: Set(None),
            draft_content: Set(None),
            error_message: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let saved = doc.insert(&self.db).await?;
        info!("Documents | uploaded id={} file={} type={}", saved.id, saved.filename, saved.doc_type.as_str());
        Ok(saved)
    }

    pub async fn get(&self, id: i32) -> Result<document::Model, AppError> {
        Document::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))
    }

    /// All documents, newest first.
    pub async fn list(&self) -> Result<Vec<document::Model>, AppError> {
        Ok(Document::find()
            .order_by_desc(document::Column::CreatedAt)
            .order_by_desc(document::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Removes the record and the raw file together.
    ///
    /// The row delete is conditioned on the document not being PROCESSING and
    /// stays uncommitted until the file is gone, so a concurrent claim either
    /// wins first (and the delete is a `Conflict`) or finds no row. A failed
    /// file delete rolls back and keeps the record.
    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        let doc = self.get(id).await?;

        let txn = self.db.begin().await?;
        let res = Document::delete_many()
            .filter(document::Column::Id.eq(id))
            .filter(document::Column::Status.ne(DocumentStatus::Processing))
            .exec(&txn)
            .await?;

        if res.rows_affected == 0 {
            txn.rollback().await?;
            let current = self.get(id).await?;
            warn!("Documents | refused to delete id={} in status {}", id, current.status);
            return Err(AppError::Conflict(format!(
                "Document {} is being processed and cannot be deleted",
                id
            )));
        }

        if let Err(e) = self.storage.delete_file(&doc.file_path).await {
            txn.rollback().await?;
            return Err(e);
        }
        txn.commit().await?;

        info!("Documents | deleted id={} file={}", id, doc.filename);
        Ok(())
    }

    /// Runs the full pipeline for one document.
    ///
    /// Fails with `Conflict` without touching the AI provider when the document
    /// is not in a state processing may start from (another run holds it, or it
    /// already completed).
    pub async fn process(&self, id: i32) -> Result<document::Model, AppError> {
        let doc = self.get(id).await?;
        self.claim(&doc).await?;

        let started = Instant::now();
        info!("Documents | processing id={} file={}", id, doc.filename);

        match self.run(&doc).await {
            Ok((srs_text, result_link)) => {
                self.complete(id, srs_text, result_link).await?;
                info!("Documents | completed id={} took {:.2?}", id, started.elapsed());
                self.get(id).await
            }
            Err(RunError::Failed(err)) => {
                error!("Documents | failed id={}: {}", id, err);
                self.record_failure(id, err, None).await
            }
            Err(RunError::RenderFailed { draft, error: err }) => {
                error!("Documents | render failed id={}, keeping generated draft: {}", id, err);
                self.record_failure(id, err, Some(draft)).await
            }
        }
    }

    /// Summary of the raw upload produced by the AI provider.
    pub async fn summarize(&self, id: i32) -> Result<String, AppError> {
        let doc = self.get(id).await?;
        let summary = self
            .ai
            .extract_content(Path::new(&doc.file_path), doc.doc_type.as_str())
            .await?;
        Ok(summary)
    }

    /// Structured analysis of the raw upload. Leaves the document untouched.
    pub async fn analyze(&self, id: i32) -> Result<DocumentAnalysis, AppError> {
        let doc = self.get(id).await?;
        let text = self.source_text(&doc).await?;
        Ok(self.ai.analyze_document(&text).await?)
    }

    /// Moves documents left in PROCESSING by a previous run to FAILED.
    pub async fn recover_interrupted(&self) -> Result<u64, AppError> {
        let res = Document::update_many()
            .col_expr(document::Column::Status, Expr::value(DocumentStatus::Failed))
            .col_expr(document::Column::ErrorMessage, Expr::value(INTERRUPTED_MESSAGE))
            .col_expr(document::Column::UpdatedAt, Expr::value(chrono::Utc::now().naive_utc()))
            .filter(document::Column::Status.eq(DocumentStatus::Processing))
            .exec(&self.db)
            .await?;

        if res.rows_affected > 0 {
            warn!("Documents | recovered {} interrupted documents (set to FAILED)", res.rows_affected);
        }
        Ok(res.rows_affected)
    }

    /// UPLOADED|FAILED -> PROCESSING as a single conditional update.
    async fn claim(&self, doc: &document::Model) -> Result<(), AppError> {
        if !doc.status.can_start_processing() {
            warn!("Documents | refused to process id={} in status {}", doc.id, doc.status);
            return Err(AppError::Conflict(format!(
                "Document {} cannot be processed while {}",
                doc.id, doc.status
            )));
        }

        let res = Document::update_many()
            .col_expr(document::Column::Status, Expr::value(DocumentStatus::Processing))
            .col_expr(document::Column::UpdatedAt, Expr::value(chrono::Utc::now().naive_utc()))
            .filter(document::Column::Id.eq(doc.id))
            .filter(document::Column::Status.is_in([DocumentStatus::Uploaded, DocumentStatus::Failed]))
            .exec(&self.db)
            .await?;

        if res.rows_affected == 0 {
            let current = self.get(doc.id).await?;
            warn!("Documents | refused to process id={} in status {}", doc.id, current.status);
            return Err(AppError::Conflict(format!(
                "Document {} cannot be processed while {}",
                doc.id, current.status
            )));
        }
        Ok(())
    }

    async fn run(&self, doc: &document::Model) -> Result<(String, String), RunError> {
        let srs_text = match &doc.draft_content {
            Some(draft) => {
                info!("Documents | reusing generated draft for id={}", doc.id);
                draft.clone()
            }
            None => {
                let text = self.source_text(doc).await.map_err(RunError::Failed)?;
                self.ai
                    .generate_srs(&text)
                    .await
                    .map_err(|e| RunError::Failed(e.into()))?
            }
        };

        let title = format!("SRS Draft - {}", doc.filename);
        match self.renderer.render(&srs_text, &title).await {
            Ok(link) => Ok((srs_text, link)),
            Err(error) => Err(RunError::RenderFailed {
                draft: srs_text,
                error,
            }),
        }
    }

    /// Extracted, truncated text of the raw upload.
    async fn source_text(&self, doc: &document::Model) -> Result<String, AppError> {
        let data = self.storage.read_file(&doc.file_path).await?;
        let filename = doc.filename.clone();
        let fallback = data.clone();

        let text = match tokio::task::spawn_blocking(move || text_extractor::extract_text(&filename, &data)).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Documents | extractor crashed for id={}, using raw bytes: {}", doc.id, e);
                String::from_utf8_lossy(&fallback).into_owned()
            }
        };

        let total = text.chars().count();
        if total > MAX_SOURCE_CHARS {
            warn!(
                "Documents | id={} text is {} chars, keeping the first {}",
                doc.id, total, MAX_SOURCE_CHARS
            );
        }
        Ok(text_extractor::truncate_chars(&text, MAX_SOURCE_CHARS).to_string())
    }

    async fn complete(&self, id: i32, srs_text: String, result_link: String) -> Result<(), AppError> {
        let res = Document::update_many()
            .col_expr(document::Column::Status, Expr::value(DocumentStatus::Completed))
            .col_expr(document::Column::ExtractedData, Expr::value(srs_text.into_bytes()))
            .col_expr(document::Column::ResultLink, Expr::value(result_link))
            .col_expr(document::Column::DraftContent, Expr::value(Option::<String>::None))
            .col_expr(document::Column::ErrorMessage, Expr::value(Option::<String>::None))
            .col_expr(document::Column::UpdatedAt, Expr::value(chrono::Utc::now().naive_utc()))
            .filter(document::Column::Id.eq(id))
            .filter(document::Column::Status.eq(DocumentStatus::Processing))
            .exec(&self.db)
            .await?;

        if res.rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "Document {} disappeared while processing",
                id
            )));
        }
        Ok(())
    }

    /// Marks the run FAILED and hands back the pipeline error. If the status
    /// write itself fails the pipeline error is still the one returned.
    async fn record_failure(
        &self,
        id: i32,
        err: AppError,
        draft: Option<String>,
    ) -> Result<document::Model, AppError> {
        if let Err(store_err) = self.fail(id, &err, draft).await {
            error!(
                "Documents | could not mark id={} FAILED ({}); pipeline error was: {}",
                id, store_err, err
            );
        }
        Err(err)
    }

    async fn fail(&self, id: i32, err: &AppError, draft: Option<String>) -> Result<(), AppError> {
        let res = Document::update_many()
            .col_expr(document::Column::Status, Expr::value(DocumentStatus::Failed))
            .col_expr(document::Column::ErrorMessage, Expr::value(err.to_string()))
            .col_expr(document::Column::DraftContent, Expr::value(draft))
            .col_expr(document::Column::UpdatedAt, Expr::value(chrono::Utc::now().naive_utc()))
            .filter(document::Column::Id.eq(id))
            .filter(document::Column::Status.eq(DocumentStatus::Processing))
            .exec(&self.db)
            .await?;

        if res.rows_affected == 0 {
            warn!("Documents | id={} vanished before it could be marked FAILED", id);
        }
        Ok(())
    }
}
