#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use tempfile::TempDir;
use tokio::sync::Semaphore;

use srs_forge::error::AppError;
use srs_forge::models::analysis::DocumentAnalysis;
use srs_forge::services::ai::{AiAdapter, AiError, AiResult};
use srs_forge::services::documents::DocumentService;
use srs_forge::services::docx::{ArtifactRenderer, DocxRenderer};
use srs_forge::services::srs::SrsService;
use srs_forge::services::storage::FileStorage;
use srs_forge::services::worker::{ProcessingQueue, Worker};
use srs_forge::state::AppState;

pub const GENERATED_SRS: &str = "# 1. Introduction\n**Purpose**: payroll\n\n# 2. Overall Description\nBatch export";

/// In-process AI double that records every `generate_srs` input.
pub struct ScriptedAi {
    generate_calls: AtomicUsize,
    inputs: Mutex<Vec<String>>,
    fail_generate: AtomicBool,
    gate: Option<Semaphore>,
}

impl ScriptedAi {
    pub fn new() -> Self {
        Self {
            generate_calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
            fail_generate: AtomicBool::new(false),
            gate: None,
        }
    }

    /// `generate_srs` blocks until [`ScriptedAi::release`] is called.
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1_000);
        }
    }

    pub fn fail_generate(&self, fail: bool) {
        self.fail_generate.store(fail, Ordering::SeqCst);
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn last_input(&self) -> Option<String> {
        self.inputs.lock().unwrap().last().cloned()
    }

    pub async fn wait_for_calls(&self, n: usize) {
        for _ in 0..200 {
            if self.generate_calls() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} generate_srs calls, saw {}", n, self.generate_calls());
    }
}

#[async_trait]
impl AiAdapter for ScriptedAi {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn extract_content(&self, path: &Path, type_hint: &str) -> AiResult<String> {
        let data = tokio::fs::read(path).await?;
        Ok(format!("{} summary of {} bytes", type_hint, data.len()))
    }

    async fn generate_srs(&self, source_text: &str) -> AiResult<String> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(source_text.to_string());

        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }

        if self.fail_generate.load(Ordering::SeqCst) {
            return Err(AiError::Api("500 Internal Server Error: upstream exploded".to_string()));
        }
        Ok(GENERATED_SRS.to_string())
    }

    async fn analyze_document(&self, text: &str) -> AiResult<DocumentAnalysis> {
        if text.trim().is_empty() {
            return Err(AiError::MalformedResponse("empty document".to_string()));
        }
        Ok(DocumentAnalysis {
            title: "Payroll".to_string(),
            summary: text.chars().take(20).collect(),
            ..Default::default()
        })
    }
}

/// Real `.docx` renderer that can be switched into a failing mode.
pub struct SwitchableRenderer {
    inner: DocxRenderer,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl SwitchableRenderer {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            inner: DocxRenderer::new(output_dir),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactRenderer for SwitchableRenderer {
    async fn render(&self, text: &str, title: &str) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Storage("disk full".to_string()));
        }
        self.inner.render(text, title).await
    }
}

/// One-page PDF with `text` set in Courier, built in memory.
pub fn sample_pdf(text: &str) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

pub struct TestApp {
    pub dir: TempDir,
    pub db: DatabaseConnection,
    pub ai: Arc<ScriptedAi>,
    pub renderer: Arc<SwitchableRenderer>,
    pub documents: Arc<DocumentService>,
    pub srs: Arc<SrsService>,
}

pub async fn setup_db(dir: &Path) -> DatabaseConnection {
    let url = format!("sqlite://{}?mode=rwc", dir.join("test.db").display());
    let db = Database::connect(url).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_ai(ScriptedAi::new()).await
    }

    pub async fn with_ai(ai: ScriptedAi) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = setup_db(dir.path()).await;
        let ai = Arc::new(ai);
        let renderer = Arc::new(SwitchableRenderer::new(&dir.path().join("outputs")));
        let storage = FileStorage::new(dir.path().join("uploads")).await.unwrap();

        let documents = Arc::new(DocumentService::new(
            db.clone(),
            storage,
            ai.clone(),
            renderer.clone(),
        ));
        let srs = Arc::new(SrsService::new(db.clone(), ai.clone()));

        Self {
            dir,
            db,
            ai,
            renderer,
            documents,
            srs,
        }
    }

    /// Starts the background worker and returns router state wired to it.
    pub async fn start_worker(&self) -> (AppState, ProcessingQueue) {
        let (worker, queue) = Worker::new(self.documents.clone());
        worker.recover().await;
        tokio::spawn(worker.run());
        let state = AppState {
            documents: self.documents.clone(),
            srs: self.srs.clone(),
            queue: queue.clone(),
        };
        (state, queue)
    }
}
