use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::services::documents::DocumentService;

/// Handle used by request handlers to schedule background processing.
#[derive(Clone, Debug)]
pub struct ProcessingQueue {
    tx: mpsc::UnboundedSender<i32>,
}

impl ProcessingQueue {
    /// Schedules `Process(document_id)` without waiting for it.
    pub fn enqueue(&self, document_id: i32) {
        if self.tx.send(document_id).is_err() {
            error!("Worker | queue closed, document {} will not be processed", document_id);
        }
    }
}

/// Drains the processing queue, one spawned task per document.
pub struct Worker {
    documents: Arc<DocumentService>,
    rx: mpsc::UnboundedReceiver<i32>,
}

impl Worker {
    pub fn new(documents: Arc<DocumentService>) -> (Self, ProcessingQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { documents, rx }, ProcessingQueue { tx })
    }

    /// Fails documents a previous run left in PROCESSING. Call before serving requests.
    pub async fn recover(&self) {
        if let Err(e) = self.documents.recover_interrupted().await {
            error!("Worker | failed to recover interrupted documents: {}", e);
        }
    }

    /// Runs until every `ProcessingQueue` handle has been dropped.
    pub async fn run(mut self) {
        info!("Worker started");

        while let Some(document_id) = self.rx.recv().await {
            let documents = Arc::clone(&self.documents);
            tokio::spawn(async move {
                info!("Worker | picked up document {}", document_id);
                let started = Instant::now();

                match documents.process(document_id).await {
                    Ok(doc) => info!(
                        "Worker | document {} finished as {} took {:.2?}",
                        document_id,
                        doc.status,
                        started.elapsed()
                    ),
                    Err(AppError::Conflict(msg)) => {
                        warn!("Worker | skipped document {}: {}", document_id, msg)
                    }
                    Err(e) => error!("Worker | document {} failed: {}", document_id, e),
                }
            });
        }

        info!("Worker stopped");
    }
}
