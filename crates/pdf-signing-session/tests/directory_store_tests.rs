mod common;

use common::*;
use pdf_signing::coords::RenderPoint;
use pdf_signing::{ReasonCode, Stroke, ViewerKind};
use pdf_signing_session::*;
use tempfile::TempDir;

fn submission(bytes: Vec<u8>) -> SignedSubmission {
    SignedSubmission {
        artifact: bytes,
        filename: "signed_lease.pdf".to_string(),
        signer_name: "  Jane Doe ".to_string(),
        remarks: String::new(),
    }
}

async fn store_with_lease() -> (TempDir, DirectoryStore, DocumentId) {
    let dir = TempDir::new().unwrap();
    let store = DirectoryStore::new(dir.path());
    let id = DocumentId::new("lease");
    store
        .add_document(&id, &create_test_pdf(2), "lease.pdf")
        .await
        .unwrap();
    (dir, store, id)
}

#[tokio::test]
async fn test_add_and_fetch_document() {
    let (dir, store, id) = store_with_lease().await;

    assert!(dir.path().join("lease.pdf").exists());
    assert!(dir.path().join("lease.json").exists());

    let record = store.record(&id).await.unwrap();
    assert_eq!(record.original_name, "lease.pdf");
    assert_eq!(record.title, "lease");
    assert!(!record.is_signed);

    let fetched = store.fetch_for_signing(&id, None).await.unwrap();
    assert_eq!(fetched.original_name, "lease.pdf");
    assert_eq!(fetched.page_dimensions.len(), 2);
    assert_eq!(fetched.page_dimensions[0].width, 612.0);
    assert!(!fetched.already_signed);
    assert!(fetched.signed_at.is_none());
}

#[tokio::test]
async fn test_add_rejects_non_pdf() {
    let dir = TempDir::new().unwrap();
    let store = DirectoryStore::new(dir.path());
    let err = store
        .add_document(&"notes".into(), b"plain text", "notes.txt")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ReasonCode::Input);
}

#[tokio::test]
async fn test_missing_document_is_not_found() {
    let dir = TempDir::new().unwrap();
    let store = DirectoryStore::new(dir.path());

    let err = store.fetch_for_signing(&"nope".into(), None).await.unwrap_err();
    assert!(matches!(err, SignError::NotFound(_)));

    let err = store
        .fetch_for_signing(&"../escape".into(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SignError::NotFound(_)));
}

#[tokio::test]
async fn test_submit_marks_document_signed() {
    let (dir, store, id) = store_with_lease().await;

    store
        .submit_signed(&id, submission(create_test_pdf(2)), None)
        .await
        .unwrap();

    let signed_file = dir.path().join("signed").join("lease_signed_lease.pdf");
    assert!(signed_file.exists());

    let record = store.record(&id).await.unwrap();
    assert!(record.is_signed);
    assert!(record.signed_at.is_some());
    assert_eq!(record.signed_by.as_deref(), Some("Jane Doe"));
    assert_eq!(record.remarks, None);
    assert_eq!(record.signed_path.as_deref(), Some(signed_file.as_path()));

    let fetched = store.fetch_for_signing(&id, None).await.unwrap();
    assert!(fetched.already_signed);
    assert_eq!(fetched.signed_at, record.signed_at);
}

#[tokio::test]
async fn test_second_submission_is_already_signed() {
    let (_dir, store, id) = store_with_lease().await;
    store
        .submit_signed(&id, submission(create_test_pdf(1)), None)
        .await
        .unwrap();

    let err = store
        .submit_signed(&id, submission(create_test_pdf(1)), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SignError::AlreadySigned));
}

#[tokio::test]
async fn test_submit_validates_payload() {
    let (_dir, store, id) = store_with_lease().await;

    let err = store
        .submit_signed(&id, submission(b"GIF89a".to_vec()), None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "File is not a PDF");

    let mut blank = submission(create_test_pdf(1));
    blank.signer_name = "  ".to_string();
    let err = store.submit_signed(&id, blank, None).await.unwrap_err();
    assert_eq!(err.code(), ReasonCode::Input);

    assert!(!store.record(&id).await.unwrap().is_signed);
}

#[tokio::test]
async fn test_oversized_files_are_rejected() {
    let dir = TempDir::new().unwrap();
    let pdf = create_test_pdf(1);
    let store = DirectoryStore::new(dir.path()).with_max_file_size(pdf.len() - 1);
    let id = DocumentId::new("lease");

    let err = store.add_document(&id, &pdf, "lease.pdf").await.unwrap_err();
    assert_eq!(err.code(), ReasonCode::Input);
    assert!(!dir.path().join("lease.pdf").exists());

    let store = store.with_max_file_size(pdf.len());
    store.add_document(&id, &pdf, "lease.pdf").await.unwrap();

    let mut oversized = create_test_pdf(1);
    oversized.resize(pdf.len() + 1, b' ');
    let err = store
        .submit_signed(&id, submission(oversized), None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ReasonCode::Input);
    assert!(!store.record(&id).await.unwrap().is_signed);
}

#[test]
fn test_default_size_limit_is_100_mib() {
    let store = DirectoryStore::new("unused");
    assert_eq!(store.max_file_size(), 100 * 1024 * 1024);
}

#[tokio::test]
async fn test_corrupt_metadata_is_a_format_error() {
    let (dir, store, id) = store_with_lease().await;
    tokio::fs::write(dir.path().join("lease.json"), b"{ truncated")
        .await
        .unwrap();

    let err = store.record(&id).await.unwrap_err();
    assert_eq!(err.code(), ReasonCode::Format);

    let err = store.fetch_for_signing(&id, None).await.unwrap_err();
    assert_eq!(err.code(), ReasonCode::Format);
}

#[tokio::test]
async fn test_session_against_directory_store() {
    let (dir, store, id) = store_with_lease().await;
    let mut session = SigningSession::new(SessionConfig::new(ViewerKind::Overlay), store).unwrap();

    session.open(id.clone()).await.unwrap();
    session
        .commit_stroke(Stroke::from_points([(10.0, 10.0), (300.0, 140.0)]))
        .unwrap();
    session
        .place_signature(RenderPoint::new(72.0, 600.0))
        .unwrap();
    session.set_signer_name("Jane Doe").unwrap();
    session.set_remarks("Signed on site").unwrap();
    session.submit().await.unwrap();

    assert_eq!(session.state(), &SessionState::Success);
    let record = session.store().record(&id).await.unwrap();
    assert_eq!(record.remarks.as_deref(), Some("Signed on site"));
    assert!(dir.path().join("signed/lease_signed_lease.pdf").exists());

    // A new session sees the document as signed
    let store = DirectoryStore::new(dir.path());
    let mut again = SigningSession::new(SessionConfig::default(), store).unwrap();
    again.open(id).await.unwrap();
    assert_eq!(again.state(), &SessionState::AlreadySigned);
    assert!(again.signed_at().is_some());
}
