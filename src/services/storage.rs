use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{error, info};

use crate::error::AppError;
use crate::utils::sanitize_filename;

const MAX_NAME_ATTEMPTS: u32 = 1_000;

async fn write_all(file: &mut File, data: &[u8]) -> std::io::Result<()> {
    file.write_all(data).await?;
    file.flush().await
}

/// Local-disk store for raw uploads.
#[derive(Clone, Debug)]
pub struct FileStorage {
    upload_dir: PathBuf,
}

impl FileStorage {
    pub async fn new(upload_dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let upload_dir = upload_dir.into();
        tokio::fs::create_dir_all(&upload_dir).await.map_err(|e| {
            error!("Storage | failed to create upload dir {}: {}", upload_dir.display(), e);
            AppError::Storage(format!("Failed to create upload directory: {}", e))
        })?;

        Ok(Self { upload_dir })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Writes `data` under `{upload_timestamp_ms}_{filename}` and returns the stored path.
    ///
    /// Never replaces an existing file: a name already taken in the same
    /// millisecond gets a `-{n}` counter after the timestamp.
    pub async fn save_file(&self, filename: &str, data: &[u8]) -> Result<String, AppError> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let name = sanitize_filename(filename);
        let mut attempt: u32 = 0;

        loop {
            let unique_name = if attempt == 0 {
                format!("{}_{}", timestamp, name)
            } else {
                format!("{}-{}_{}", timestamp, attempt, name)
            };
            let path = self.upload_dir.join(unique_name);

            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(mut file) => {
                    if let Err(e) = write_all(&mut file, data).await {
                        error!("Storage | write failed for {}: {}", path.display(), e);
                        let _ = tokio::fs::remove_file(&path).await;
                        return Err(AppError::Storage(format!("Failed to save file: {}", e)));
                    }
                    info!("Storage | saved {} bytes to {}", data.len(), path.display());
                    return Ok(path.to_string_lossy().into_owned());
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt < MAX_NAME_ATTEMPTS => {
                    attempt += 1;
                }
                Err(e) => {
                    error!("Storage | create failed for {}: {}", path.display(), e);
                    return Err(AppError::Storage(format!("Failed to save file: {}", e)));
                }
            }
        }
    }

    pub async fn read_file(&self, path: &str) -> Result<Vec<u8>, AppError> {
        tokio::fs::read(path).await.map_err(|e| {
            error!("Storage | read failed for {}: {}", path, e);
            AppError::Storage(format!("Failed to read file {}: {}", path, e))
        })
    }

    pub async fn delete_file(&self, path: &str) -> Result<(), AppError> {
        tokio::fs::remove_file(path).await.map_err(|e| {
            error!("Storage | delete failed for {}: {}", path, e);
            AppError::Storage(format!("Failed to delete file {}: {}", path, e))
        })
    }
}
