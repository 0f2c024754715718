use std::path::PathBuf;

use async_trait::async_trait;
use docx_rs::{Docx, Paragraph, Run};
use tracing::{error, info};

use crate::error::AppError;
use crate::utils::sanitize_filename;

pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Persists generated SRS text as a binary document.
#[async_trait]
pub trait ArtifactRenderer: Send + Sync {
    /// Returns the stored path. The path depends only on `title`.
    async fn render(&self, text: &str, title: &str) -> Result<String, AppError>;
}

/// Writes `{output_dir}/{title}.docx`, one paragraph per non-empty line.
#[derive(Clone, Debug)]
pub struct DocxRenderer {
    output_dir: PathBuf,
}

impl DocxRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn artifact_path(&self, title: &str) -> PathBuf {
        self.output_dir.join(format!("{}.docx", sanitize_filename(title)))
    }
}

/// Drops `**` emphasis and leading `#` heading markers.
pub fn clean_markdown_line(line: &str) -> String {
    let without_emphasis = line.replace("**", "");
    let trimmed = without_emphasis.trim_start();
    if trimmed.starts_with('#') {
        trimmed.trim_start_matches('#').trim_start().to_string()
    } else {
        without_emphasis
    }
}

pub fn build_docx(text: &str) -> Docx {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(clean_markdown_line)
        .fold(Docx::new(), |doc, line| {
            doc.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)))
        })
}

#[async_trait]
impl ArtifactRenderer for DocxRenderer {
    async fn render(&self, text: &str, title: &str) -> Result<String, AppError> {
        tokio::fs::create_dir_all(&self.output_dir).await.map_err(|e| {
            AppError::Storage(format!("Failed to create output directory: {}", e))
        })?;

        let path = self.artifact_path(title);
        let text = text.to_string();
        let target = path.clone();

        tokio::task::spawn_blocking(move || -> Result<(), String> {
            let file = std::fs::File::create(&target).map_err(|e| e.to_string())?;
            build_docx(&text)
                .build()
                .pack(file)
                .map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| AppError::InternalServerError(format!("Render task join error: {}", e)))?
        .map_err(|e| {
            error!("Render | failed to write {}: {}", path.display(), e);
            AppError::Storage(format!("Failed to save docx file: {}", e))
        })?;

        info!("Render | wrote {}", path.display());
        Ok(path.to_string_lossy().into_owned())
    }
}
