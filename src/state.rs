use std::sync::Arc;

use crate::services::documents::DocumentService;
use crate::services::srs::SrsService;
use crate::services::worker::ProcessingQueue;

#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<DocumentService>,
    pub srs: Arc<SrsService>,
    pub queue: ProcessingQueue,
}
