//! Document lifecycle tests: upload placeholder flow, status polling, and
//! report selection, driven against the in-memory backend.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use common::{sample_report, snapshot, FakeBackend};
use docsight::models::DocumentStatus;
use docsight::poller::PollConfig;
use docsight::registry::DocumentRegistry;
use docsight::session::SessionStore;

fn registry_with(backend: Arc<FakeBackend>) -> DocumentRegistry {
    DocumentRegistry::new(
        backend,
        Arc::new(SessionStore::in_memory()),
        PollConfig::default(),
    )
}

// ---- upload ---------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn upload_inserts_placeholder_then_patches_durable_id() {
    let backend = FakeBackend::new();
    backend.script_upload(Ok(7));
    backend.script_statuses([DocumentStatus::Completed]);
    let gate = Arc::new(Notify::new());
    *backend.upload_gate.lock().unwrap() = Some(gate.clone());

    backend.set_documents(vec![snapshot(1, "old.pdf", DocumentStatus::Completed)]);
    let registry = Arc::new(registry_with(backend.clone()));
    registry.refresh().await;

    let upload = {
        let registry = registry.clone();
        tokio::spawn(async move { registry.upload("new.pdf", vec![1, 2, 3]).await })
    };
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;

    // Placeholder exists immediately, head of the list, unique client id.
    let docs = registry.documents();
    assert_eq!(docs.len(), 2);
    assert!(docs[0].is_placeholder());
    assert_eq!(docs[0].status, DocumentStatus::Uploaded);
    assert_eq!(docs[0].filename, "new.pdf");
    assert_eq!(docs[0].size_bytes, Some(3));
    assert_ne!(docs[0].client_id, docs[1].client_id);
    let placeholder_id = docs[0].client_id.clone();

    gate.notify_one();
    let client_id = upload.await.unwrap();
    assert_eq!(client_id, placeholder_id);

    // Same entry, same position: durable id assigned, status processing.
    let docs = registry.documents();
    assert_eq!(docs[0].client_id, placeholder_id);
    assert_eq!(docs[0].id, Some(7));
    assert_eq!(docs[0].status, DocumentStatus::Processing);

    registry.wait_for_poll(7).await;
}

#[tokio::test]
async fn failed_upload_keeps_placeholder_without_id() {
    let backend = FakeBackend::new();
    backend.script_upload(Err("Upload failed"));
    let registry = registry_with(backend.clone());

    let client_id = registry.upload("bad.pdf", vec![0]).await;

    let docs = registry.documents();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].client_id, client_id);
    assert_eq!(docs[0].status, DocumentStatus::Failed);
    assert_eq!(docs[0].id, None);
    assert!(registry.error().unwrap().contains("Upload failed"));
    // No poll loop started for a failed upload.
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 0);
}

// ---- polling --------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn polling_stops_at_completed() {
    let backend = FakeBackend::new();
    backend.script_upload(Ok(5));
    backend.script_statuses([
        DocumentStatus::Processing,
        DocumentStatus::Processing,
        DocumentStatus::Completed,
    ]);
    let registry = registry_with(backend.clone());

    registry.upload("doc.pdf", vec![1]).await;
    registry.wait_for_poll(5).await;

    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 3);
    let doc = registry
        .documents()
        .into_iter()
        .find(|d| d.id == Some(5))
        .unwrap();
    assert_eq!(doc.status, DocumentStatus::Completed);

    // No further requests after the terminal tick.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn polling_stops_at_failed_status() {
    let backend = FakeBackend::new();
    backend.script_upload(Ok(4));
    backend.script_statuses([DocumentStatus::Processing, DocumentStatus::Failed]);
    let registry = registry_with(backend.clone());

    registry.upload("doc.pdf", vec![1]).await;
    registry.wait_for_poll(4).await;

    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 2);
    let doc = registry
        .documents()
        .into_iter()
        .find(|d| d.id == Some(4))
        .unwrap();
    assert_eq!(doc.status, DocumentStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn polling_stops_at_timeout_with_last_seen_status() {
    let backend = FakeBackend::new();
    backend.script_upload(Ok(6));
    // Empty script: every tick answers `processing`.
    let registry = registry_with(backend.clone());

    registry.upload("doc.pdf", vec![1]).await;
    registry.wait_for_poll(6).await;

    // 3 s interval over a 5 min window.
    let calls = backend.status_calls.load(Ordering::SeqCst);
    assert!((90..=101).contains(&calls), "unexpected tick count {calls}");

    let doc = registry
        .documents()
        .into_iter()
        .find(|d| d.id == Some(6))
        .unwrap();
    assert_eq!(doc.status, DocumentStatus::Processing);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), calls);
}

#[tokio::test(start_paused = true)]
async fn poll_tick_failures_are_silent_and_loop_continues() {
    let backend = FakeBackend::new();
    backend.script_upload(Ok(9));
    *backend.status_fail_script.lock().unwrap() = [true, true].into_iter().collect();
    backend.script_statuses([DocumentStatus::Completed]);
    let registry = registry_with(backend.clone());

    registry.upload("doc.pdf", vec![1]).await;
    registry.wait_for_poll(9).await;

    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 3);
    assert!(registry.error().is_none());
    let doc = registry
        .documents()
        .into_iter()
        .find(|d| d.id == Some(9))
        .unwrap();
    assert_eq!(doc.status, DocumentStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn stop_polling_cancels_the_loop() {
    let backend = FakeBackend::new();
    backend.script_upload(Ok(8));
    let registry = registry_with(backend.clone());

    registry.upload("doc.pdf", vec![1]).await;
    tokio::time::sleep(Duration::from_secs(10)).await;
    let before = backend.status_calls.load(Ordering::SeqCst);
    assert!(before >= 2);

    registry.stop_polling(8);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), before);
}

#[tokio::test(start_paused = true)]
async fn reset_stops_all_poll_loops() {
    let backend = FakeBackend::new();
    backend.script_upload(Ok(11));
    let registry = registry_with(backend.clone());

    registry.upload("doc.pdf", vec![1]).await;
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(backend.status_calls.load(Ordering::SeqCst) >= 1);

    registry.reset();
    let after_reset = backend.status_calls.load(Ordering::SeqCst);
    assert!(registry.documents().is_empty());
    assert!(registry.error().is_none());

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), after_reset);
}

// ---- selection & reports --------------------------------------------------

#[tokio::test]
async fn selecting_unfinished_document_clears_report_without_fetch() {
    let backend = FakeBackend::new();
    backend.set_documents(vec![
        snapshot(1, "busy.pdf", DocumentStatus::Processing),
        snapshot(2, "done.pdf", DocumentStatus::Completed),
    ]);
    let registry = registry_with(backend.clone());
    registry.refresh().await;

    // Show a report first so clearing is observable.
    registry.select(Some("2")).await;
    assert!(registry.report().is_some());
    assert_eq!(backend.report_calls.load(Ordering::SeqCst), 1);

    registry.select(Some("1")).await;
    assert!(registry.report().is_none());
    assert_eq!(backend.report_calls.load(Ordering::SeqCst), 1);
    assert_eq!(registry.selected_document().unwrap().id, Some(1));
}

#[tokio::test]
async fn selecting_completed_document_fetches_report_once() {
    let backend = FakeBackend::new();
    backend.set_documents(vec![snapshot(2, "done.pdf", DocumentStatus::Completed)]);
    backend.script_report(Ok(sample_report(2)));
    let registry = registry_with(backend.clone());
    registry.refresh().await;

    registry.select(Some("2")).await;

    assert_eq!(backend.report_calls.load(Ordering::SeqCst), 1);
    let report = registry.report().unwrap();
    assert_eq!(report.document_id, 2);
    assert_eq!(report.summary.as_deref(), Some("Revenue grew"));
    assert!(!registry.is_loading());
}

#[tokio::test]
async fn clearing_selection_drops_report_without_network() {
    let backend = FakeBackend::new();
    backend.set_documents(vec![snapshot(2, "done.pdf", DocumentStatus::Completed)]);
    let registry = registry_with(backend.clone());
    registry.refresh().await;

    registry.select(Some("2")).await;
    assert!(registry.report().is_some());

    registry.select(None).await;
    assert!(registry.selected_document().is_none());
    assert!(registry.report().is_none());
    assert_eq!(backend.report_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn report_fetch_failure_surfaces_error_and_leaves_report_cleared() {
    let backend = FakeBackend::new();
    backend.set_documents(vec![snapshot(2, "done.pdf", DocumentStatus::Completed)]);
    backend.script_report(Err("Failed to fetch report"));
    let registry = registry_with(backend.clone());
    registry.refresh().await;

    registry.select(Some("2")).await;

    assert!(registry.report().is_none());
    assert!(registry.error().unwrap().contains("Failed to fetch report"));
    assert!(!registry.is_loading());
}

// ---- rename & delete ------------------------------------------------------

#[tokio::test]
async fn rename_patches_local_record() {
    let backend = FakeBackend::new();
    backend.set_documents(vec![snapshot(3, "draft.pdf", DocumentStatus::Completed)]);
    let registry = registry_with(backend.clone());
    registry.refresh().await;

    registry.rename(3, "final.pdf").await;

    assert_eq!(registry.documents()[0].filename, "final.pdf");
    assert_eq!(
        backend.renamed.lock().unwrap().as_slice(),
        &[(3, "final.pdf".to_string())]
    );
}

#[tokio::test]
async fn deleting_selected_document_clears_selection() {
    let backend = FakeBackend::new();
    backend.set_documents(vec![
        snapshot(1, "a.pdf", DocumentStatus::Completed),
        snapshot(2, "b.pdf", DocumentStatus::Completed),
    ]);
    let registry = registry_with(backend.clone());
    registry.refresh().await;

    registry.select(Some("1")).await;
    registry.delete(1).await;

    assert!(registry.selected_document().is_none());
    assert!(registry.report().is_none());
    assert_eq!(registry.documents().len(), 1);
    assert_eq!(backend.deleted.lock().unwrap().as_slice(), &[1]);
}

#[tokio::test]
async fn deleting_other_document_leaves_selection_untouched() {
    let backend = FakeBackend::new();
    backend.set_documents(vec![
        snapshot(1, "a.pdf", DocumentStatus::Completed),
        snapshot(2, "b.pdf", DocumentStatus::Completed),
    ]);
    let registry = registry_with(backend.clone());
    registry.refresh().await;

    registry.select(Some("2")).await;
    registry.delete(1).await;

    assert_eq!(registry.selected_document().unwrap().id, Some(2));
    assert_eq!(registry.documents().len(), 1);
}
