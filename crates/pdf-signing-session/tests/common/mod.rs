#![allow(dead_code)]

use image::{ImageFormat, Rgba, RgbaImage};
use lopdf::{Dictionary, Document, Object, Stream};
use pdf_signing::inspect_pdf;
use pdf_signing_session::*;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn create_test_pdf(num_pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for _ in 0..num_pages {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(num_pages as i64)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    let mut writer = Vec::new();
    doc.save_to(&mut writer).unwrap();
    writer
}

pub fn signature_png(width: u32, height: u32) -> Vec<u8> {
    let mut image = RgbaImage::new(width, height);
    for x in 0..width {
        image.put_pixel(x, height / 2, Rgba([0, 0, 0, 255]));
    }
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn fetched(bytes: Vec<u8>, original_name: &str, already_signed: bool) -> FetchedDocument {
    FetchedDocument {
        page_dimensions: inspect_pdf(&bytes).unwrap(),
        bytes,
        already_signed,
        signed_at: already_signed.then(chrono::Utc::now),
        original_name: original_name.to_string(),
    }
}

/// In-memory store that records every call
#[derive(Default)]
pub struct RecordingStore {
    documents: Mutex<HashMap<String, FetchedDocument>>,
    fetch_errors: Mutex<Vec<SignError>>,
    submit_errors: Mutex<Vec<SignError>>,
    submissions: Mutex<Vec<(DocumentId, SignedSubmission)>>,
    tokens: Mutex<Vec<Option<String>>>,
    fetches: AtomicUsize,
    submits: AtomicUsize,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, id: &str, document: FetchedDocument) -> Self {
        self.documents
            .lock()
            .unwrap()
            .insert(id.to_string(), document);
        self
    }

    /// Make the next fetch fail with `error`
    pub fn fail_next_fetch(&self, error: SignError) {
        self.fetch_errors.lock().unwrap().push(error);
    }

    /// Make the next submission fail with `error`
    pub fn fail_next_submit(&self, error: SignError) {
        self.submit_errors.lock().unwrap().push(error);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn submit_count(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<(DocumentId, SignedSubmission)> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn tokens(&self) -> Vec<Option<String>> {
        self.tokens.lock().unwrap().clone()
    }
}

impl DocumentStore for RecordingStore {
    async fn fetch_for_signing(
        &self,
        id: &DocumentId,
        access_token: Option<&str>,
    ) -> Result<FetchedDocument> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .lock()
            .unwrap()
            .push(access_token.map(str::to_string));
        if let Some(error) = self.fetch_errors.lock().unwrap().pop() {
            return Err(error);
        }
        self.documents
            .lock()
            .unwrap()
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| SignError::NotFound(id.to_string()))
    }

    async fn submit_signed(
        &self,
        id: &DocumentId,
        submission: SignedSubmission,
        access_token: Option<&str>,
    ) -> Result<()> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .lock()
            .unwrap()
            .push(access_token.map(str::to_string));
        if let Some(error) = self.submit_errors.lock().unwrap().pop() {
            return Err(error);
        }
        self.submissions
            .lock()
            .unwrap()
            .push((id.clone(), submission));
        Ok(())
    }
}
