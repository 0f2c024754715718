mod common;

use std::time::Duration;

use sea_orm::{EntityTrait, PaginatorTrait};

use common::{sample_pdf, ScriptedAi, TestApp, GENERATED_SRS};
use srs_forge::entities::document::{self, DocumentStatus, DocumentType};
use srs_forge::entities::srs;
use srs_forge::error::AppError;
use srs_forge::services::documents::INTERRUPTED_MESSAGE;

async fn wait_for_terminal(app: &TestApp, id: i32) -> document::Model {
    for _ in 0..200 {
        let doc = app.documents.get(id).await.unwrap();
        if matches!(doc.status, DocumentStatus::Completed | DocumentStatus::Failed) {
            return doc;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("document {} never left PROCESSING", id);
}

async fn mark_processing(app: &TestApp, id: i32) {
    let mut active: document::ActiveModel = app.documents.get(id).await.unwrap().into();
    active.status = sea_orm::Set(DocumentStatus::Processing);
    sea_orm::ActiveModelTrait::update(active, &app.db).await.unwrap();
}

#[tokio::test]
async fn upload_creates_uploaded_document_without_ai_call() {
    let app = TestApp::new().await;

    let doc = app
        .documents
        .upload("brd.txt", DocumentType::Brd, b"Payroll must export nightly")
        .await
        .unwrap();

    assert_eq!(doc.status, DocumentStatus::Uploaded);
    assert!(doc.extracted_data.is_none());
    assert!(doc.result_link.is_none());
    assert!(std::fs::read(&doc.file_path).unwrap().starts_with(b"Payroll"));
    assert_eq!(app.ai.generate_calls(), 0);
}

#[tokio::test]
async fn process_completes_with_artifact_and_generated_text() {
    let app = TestApp::new().await;
    let body = "Business requirement. ".repeat(50 * 1024 / 22);
    let doc = app
        .documents
        .upload("brd.pdf", DocumentType::Brd, body.as_bytes())
        .await
        .unwrap();

    let done = app.documents.process(doc.id).await.unwrap();

    assert_eq!(done.status, DocumentStatus::Completed);
    let link = done.result_link.clone().unwrap();
    assert!(link.ends_with("SRS Draft - brd.pdf.docx"));
    assert!(std::path::Path::new(&link).exists());
    assert_eq!(done.extracted_data.as_deref(), Some(GENERATED_SRS.as_bytes()));
    assert!(done.error_message.is_none());
    assert_eq!(app.ai.generate_calls(), 1);
}

#[tokio::test]
async fn client_directories_are_dropped_from_the_filename() {
    let app = TestApp::new().await;

    let doc = app
        .documents
        .upload("C:\\docs\\brd.txt", DocumentType::Brd, b"Payroll")
        .await
        .unwrap();
    assert_eq!(doc.filename, "brd.txt");
    assert!(doc.file_path.ends_with("_brd.txt"));

    let done = app.documents.process(doc.id).await.unwrap();
    assert!(done
        .result_link
        .unwrap()
        .ends_with("SRS Draft - brd.txt.docx"));

    let other = app
        .documents
        .upload("../../etc/brd.txt", DocumentType::Brd, b"Payroll")
        .await
        .unwrap();
    assert_eq!(other.filename, "brd.txt");
    assert_ne!(other.file_path, doc.file_path);
}

#[tokio::test]
async fn pdf_text_is_extracted_before_generation() {
    let app = TestApp::new().await;
    let pdf = sample_pdf("Timesheets are approved weekly");
    let doc = app
        .documents
        .upload("brd.pdf", DocumentType::Brd, &pdf)
        .await
        .unwrap();

    app.documents.process(doc.id).await.unwrap();

    let sent = app.ai.last_input().unwrap();
    assert!(sent.contains("Timesheets"), "sent {:?}", sent);
    assert!(!sent.starts_with("%PDF"));
}

#[tokio::test]
async fn source_text_is_cut_to_first_15000_chars() {
    let app = TestApp::new().await;
    let text: String = (0..20_000u32)
        .map(|i| char::from(b'a' + (i % 26) as u8))
        .collect();
    let doc = app
        .documents
        .upload("big.txt", DocumentType::Brd, text.as_bytes())
        .await
        .unwrap();

    app.documents.process(doc.id).await.unwrap();

    let sent = app.ai.last_input().unwrap();
    assert_eq!(sent.chars().count(), 15_000);
    assert_eq!(sent, text.chars().take(15_000).collect::<String>());
}

#[tokio::test]
async fn ai_failure_marks_document_failed_with_message() {
    let app = TestApp::new().await;
    app.ai.fail_generate(true);
    let doc = app
        .documents
        .upload("brd.txt", DocumentType::Brd, b"text")
        .await
        .unwrap();

    let err = app.documents.process(doc.id).await.unwrap_err();
    assert!(matches!(err, AppError::ExternalService(_)));

    let failed = app.documents.get(doc.id).await.unwrap();
    assert_eq!(failed.status, DocumentStatus::Failed);
    assert!(failed.error_message.unwrap().contains("upstream exploded"));
    assert!(failed.extracted_data.is_none());
    assert!(failed.result_link.is_none());
    assert!(failed.draft_content.is_none());
}

#[tokio::test]
async fn failed_document_can_be_reprocessed() {
    let app = TestApp::new().await;
    app.ai.fail_generate(true);
    let doc = app
        .documents
        .upload("brd.txt", DocumentType::Brd, b"text")
        .await
        .unwrap();
    app.documents.process(doc.id).await.unwrap_err();

    app.ai.fail_generate(false);
    let done = app.documents.process(doc.id).await.unwrap();

    assert_eq!(done.status, DocumentStatus::Completed);
    assert!(done.error_message.is_none());
    assert_eq!(app.ai.generate_calls(), 2);
}

#[tokio::test]
async fn render_failure_keeps_draft_and_retry_skips_ai() {
    let app = TestApp::new().await;
    app.renderer.fail(true);
    let doc = app
        .documents
        .upload("brd.txt", DocumentType::Brd, b"text")
        .await
        .unwrap();

    let err = app.documents.process(doc.id).await.unwrap_err();
    assert!(matches!(err, AppError::Storage(_)));

    let failed = app.documents.get(doc.id).await.unwrap();
    assert_eq!(failed.status, DocumentStatus::Failed);
    assert_eq!(failed.draft_content.as_deref(), Some(GENERATED_SRS));
    assert!(failed.result_link.is_none());
    assert_eq!(app.ai.generate_calls(), 1);

    app.renderer.fail(false);
    let done = app.documents.process(doc.id).await.unwrap();

    assert_eq!(done.status, DocumentStatus::Completed);
    assert!(done.draft_content.is_none());
    assert_eq!(done.extracted_data.as_deref(), Some(GENERATED_SRS.as_bytes()));
    assert_eq!(app.ai.generate_calls(), 1);
    assert_eq!(app.renderer.calls(), 2);
}

#[tokio::test]
async fn completed_document_is_not_reprocessed() {
    let app = TestApp::new().await;
    let doc = app
        .documents
        .upload("brd.txt", DocumentType::Brd, b"text")
        .await
        .unwrap();
    app.documents.process(doc.id).await.unwrap();

    let err = app.documents.process(doc.id).await.unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(app.ai.generate_calls(), 1);
}

#[tokio::test]
async fn concurrent_process_calls_make_one_ai_call() {
    let app = TestApp::with_ai(ScriptedAi::gated()).await;
    let doc = app
        .documents
        .upload("brd.txt", DocumentType::Brd, b"text")
        .await
        .unwrap();

    let id = doc.id;
    let documents = app.documents.clone();
    let first = tokio::spawn(async move { documents.process(id).await });
    app.ai.wait_for_calls(1).await;

    assert_eq!(
        app.documents.get(doc.id).await.unwrap().status,
        DocumentStatus::Processing
    );
    let second = app.documents.process(doc.id).await.unwrap_err();
    assert!(matches!(second, AppError::Conflict(_)));

    app.ai.release();
    let done = first.await.unwrap().unwrap();

    assert_eq!(done.status, DocumentStatus::Completed);
    assert_eq!(app.ai.generate_calls(), 1);
}

#[tokio::test]
async fn background_trigger_racing_manual_process_makes_one_ai_call() {
    let app = TestApp::new().await;
    let (_state, queue) = app.start_worker().await;
    let doc = app
        .documents
        .upload("brd.txt", DocumentType::Brd, b"text")
        .await
        .unwrap();

    queue.enqueue(doc.id);
    let manual = app.documents.process(doc.id).await;

    let done = wait_for_terminal(&app, doc.id).await;
    assert_eq!(done.status, DocumentStatus::Completed);
    match manual {
        Ok(model) => assert_eq!(model.status, DocumentStatus::Completed),
        Err(e) => assert!(matches!(e, AppError::Conflict(_)), "unexpected error: {e}"),
    }

    // Give a losing background task time to (not) call the provider.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(app.ai.generate_calls(), 1);
}

#[tokio::test]
async fn worker_processes_enqueued_documents() {
    let app = TestApp::new().await;
    let (_state, queue) = app.start_worker().await;

    let a = app.documents.upload("a.txt", DocumentType::Brd, b"a").await.unwrap();
    let b = app.documents.upload("b.txt", DocumentType::Other, b"b").await.unwrap();
    queue.enqueue(a.id);
    queue.enqueue(b.id);

    assert_eq!(wait_for_terminal(&app, a.id).await.status, DocumentStatus::Completed);
    assert_eq!(wait_for_terminal(&app, b.id).await.status, DocumentStatus::Completed);
}

#[tokio::test]
async fn interrupted_documents_are_recovered_as_failed() {
    let app = TestApp::new().await;
    let stuck = app.documents.upload("stuck.txt", DocumentType::Brd, b"x").await.unwrap();
    let fresh = app.documents.upload("fresh.txt", DocumentType::Brd, b"y").await.unwrap();
    mark_processing(&app, stuck.id).await;

    let recovered = app.documents.recover_interrupted().await.unwrap();

    assert_eq!(recovered, 1);
    let stuck = app.documents.get(stuck.id).await.unwrap();
    assert_eq!(stuck.status, DocumentStatus::Failed);
    assert_eq!(stuck.error_message.as_deref(), Some(INTERRUPTED_MESSAGE));
    assert_eq!(
        app.documents.get(fresh.id).await.unwrap().status,
        DocumentStatus::Uploaded
    );
}

#[tokio::test]
async fn process_unknown_document_is_not_found() {
    let app = TestApp::new().await;
    let err = app.documents.process(4242).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(app.ai.generate_calls(), 0);
}

#[tokio::test]
async fn delete_removes_file_and_record() {
    let app = TestApp::new().await;
    let doc = app.documents.upload("brd.txt", DocumentType::Brd, b"x").await.unwrap();

    app.documents.delete(doc.id).await.unwrap();

    assert!(!std::path::Path::new(&doc.file_path).exists());
    assert!(matches!(
        app.documents.get(doc.id).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn failed_file_delete_keeps_the_record() {
    let app = TestApp::new().await;
    let doc = app.documents.upload("brd.txt", DocumentType::Brd, b"x").await.unwrap();
    std::fs::remove_file(&doc.file_path).unwrap();

    let err = app.documents.delete(doc.id).await.unwrap_err();

    assert!(matches!(err, AppError::Storage(_)));
    assert!(app.documents.get(doc.id).await.is_ok());
}

#[tokio::test]
async fn processing_document_cannot_be_deleted() {
    let app = TestApp::new().await;
    let doc = app.documents.upload("brd.txt", DocumentType::Brd, b"x").await.unwrap();
    mark_processing(&app, doc.id).await;

    let err = app.documents.delete(doc.id).await.unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert!(std::path::Path::new(&doc.file_path).exists());
}

#[tokio::test]
async fn document_claimed_by_a_running_process_cannot_be_deleted() {
    let app = TestApp::with_ai(ScriptedAi::gated()).await;
    let doc = app
        .documents
        .upload("brd.txt", DocumentType::Brd, b"text")
        .await
        .unwrap();

    let id = doc.id;
    let documents = app.documents.clone();
    let run = tokio::spawn(async move { documents.process(id).await });
    app.ai.wait_for_calls(1).await;

    let err = app.documents.delete(doc.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert!(std::path::Path::new(&doc.file_path).exists());

    app.ai.release();
    let done = run.await.unwrap().unwrap();
    assert_eq!(done.status, DocumentStatus::Completed);

    app.documents.delete(doc.id).await.unwrap();
    assert!(!std::path::Path::new(&doc.file_path).exists());
}

#[tokio::test]
async fn same_name_uploads_keep_separate_files() {
    let app = TestApp::new().await;
    let a = app.documents.upload("brd.txt", DocumentType::Brd, b"AAAA").await.unwrap();
    let b = app.documents.upload("brd.txt", DocumentType::Brd, b"BBBB").await.unwrap();

    assert_ne!(a.file_path, b.file_path);
    assert_eq!(std::fs::read(&a.file_path).unwrap(), b"AAAA");

    app.documents.delete(b.id).await.unwrap();
    app.documents.delete(a.id).await.unwrap();
    assert!(app.documents.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn list_returns_newest_first() {
    let app = TestApp::new().await;
    let first = app.documents.upload("1.txt", DocumentType::Brd, b"1").await.unwrap();
    let second = app.documents.upload("2.txt", DocumentType::Brd, b"2").await.unwrap();

    let ids: Vec<i32> = app.documents.list().await.unwrap().iter().map(|d| d.id).collect();

    assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn srs_generation_requires_completed_document() {
    let app = TestApp::new().await;
    let doc = app.documents.upload("brd.txt", DocumentType::Brd, b"x").await.unwrap();

    let err = app.srs.generate(doc.id, "Payroll SRS").await.unwrap_err();

    match err {
        AppError::PreconditionFailed(msg) => assert_eq!(msg, "document must be processed first"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(srs::Entity::find().count(&app.db).await.unwrap(), 0);
    assert_eq!(app.ai.generate_calls(), 0);
}

#[tokio::test]
async fn srs_generation_uses_stored_text_and_placeholder_outline() {
    let app = TestApp::new().await;
    let doc = app.documents.upload("brd.txt", DocumentType::Brd, b"x").await.unwrap();
    app.documents.process(doc.id).await.unwrap();
    std::fs::remove_file(&doc.file_path).unwrap();

    let record = app.srs.generate(doc.id, "  ").await.unwrap();

    assert_eq!(app.ai.last_input().as_deref(), Some(GENERATED_SRS));
    assert_eq!(record.title, "SRS - brd.txt");
    assert_eq!(record.version, "1.0");
    assert_eq!(record.status, "DRAFT");
    assert_eq!(record.source_document_id, doc.id);
    let titles: Vec<&str> = record
        .sections
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap())
        .collect();
    assert_eq!(
        titles,
        vec!["Introduction", "Functional Requirements", "Non-Functional Requirements"]
    );
}

#[tokio::test]
async fn srs_update_ignores_empty_fields() {
    let app = TestApp::new().await;
    let doc = app.documents.upload("brd.txt", DocumentType::Brd, b"x").await.unwrap();
    app.documents.process(doc.id).await.unwrap();
    let record = app.srs.generate(doc.id, "Payroll SRS").await.unwrap();

    let updated = app
        .srs
        .update(record.id, Some(String::new()), Some("APPROVED".to_string()))
        .await
        .unwrap();
    assert_eq!(updated.content, record.content);
    assert_eq!(updated.status, "APPROVED");

    let updated = app
        .srs
        .update(record.id, Some("Edited".to_string()), None)
        .await
        .unwrap();
    assert_eq!(updated.content, "Edited");
    assert_eq!(updated.status, "APPROVED");
}

#[tokio::test]
async fn srs_survives_document_delete_and_can_be_deleted() {
    let app = TestApp::new().await;
    let doc = app.documents.upload("brd.txt", DocumentType::Brd, b"x").await.unwrap();
    app.documents.process(doc.id).await.unwrap();
    let record = app.srs.generate(doc.id, "Payroll SRS").await.unwrap();

    app.documents.delete(doc.id).await.unwrap();
    assert_eq!(app.srs.list_by_document(doc.id).await.unwrap().len(), 1);

    app.srs.delete(record.id).await.unwrap();
    assert!(matches!(
        app.srs.delete(record.id).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn analyze_and_summary_leave_document_untouched() {
    let app = TestApp::new().await;
    let doc = app
        .documents
        .upload("brd.txt", DocumentType::Brd, b"Payroll must export nightly")
        .await
        .unwrap();
    let before = app.documents.get(doc.id).await.unwrap();

    let analysis = app.documents.analyze(doc.id).await.unwrap();
    assert_eq!(analysis.title, "Payroll");
    assert_eq!(analysis.summary.trim(), "Payroll must export");

    let summary = app.documents.summarize(doc.id).await.unwrap();
    assert_eq!(summary, "BRD summary of 27 bytes");

    assert_eq!(app.documents.get(doc.id).await.unwrap(), before);
}
