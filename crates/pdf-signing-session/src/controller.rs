//! The signing session state machine.
//!
//! ```text
//! Loading -> Viewing -> CapturingSignature -> AwaitingPlacement -> Ready
//!    |                                                               |
//!    +-> AlreadySigned                      Failed(reason) <- Submitting -> Success
//! ```
//!
//! Input states (`Viewing` through `Ready`) are derived from what the
//! signer has provided so far, so clearing any input falls back to the
//! matching earlier state. A failure while submitting is recoverable; a
//! failure while loading is not.

use crate::config::SessionConfig;
use crate::resource::{DocumentHandle, HandleRegistry};
use crate::store::{DocumentId, DocumentStore, FetchedDocument, SignedSubmission};
use chrono::{DateTime, Utc};
use pdf_signing::coords::{
    RenderPoint, RenderRect, anchor_from_render, anchor_render_rect, is_within_page,
};
use pdf_signing::{
    AssemblyInput, AssemblyStrategy, CaptureMode, FailureReason, PageDimensions, PlacementAnchor,
    Result, SignError, SignatureCapture, SignedArtifact, SourceDocument, Stroke,
    ViewerCapability, ViewerStatus, assemble, create_viewer,
};
use std::fmt;

const MISSING_SIGNATURE: &str = "Please add your signature";
const MISSING_PLACEMENT: &str = "Please place your signature on the document";
const MISSING_NAME: &str = "Please enter your name";
const MISSING_ANNOTATION: &str = "Please place your signature in the document viewer";

/// Why a session failed and whether the signer can still fix it
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub reason: FailureReason,
    pub recoverable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Loading,
    Viewing,
    CapturingSignature,
    AwaitingPlacement,
    Ready,
    Submitting,
    Success,
    Failed(Failure),
    AlreadySigned,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Loading => "loading",
            SessionState::Viewing => "viewing",
            SessionState::CapturingSignature => "capturing signature",
            SessionState::AwaitingPlacement => "awaiting placement",
            SessionState::Ready => "ready",
            SessionState::Submitting => "submitting",
            SessionState::Success => "signed",
            SessionState::Failed(_) => "failed",
            SessionState::AlreadySigned => "already signed",
        }
    }

    /// Terminal states accept no further input
    pub fn is_terminal(&self) -> bool {
        match self {
            SessionState::Success | SessionState::AlreadySigned => true,
            SessionState::Failed(failure) => !failure.recoverable,
            _ => false,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Failed(failure) => write!(f, "failed ({})", failure.reason),
            other => f.write_str(other.name()),
        }
    }
}

/// Identifies one document fetch; only the latest ticket may complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    token: u64,
    document_id: DocumentId,
}

impl LoadTicket {
    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }
}

/// One signer working on one document.
///
/// Runs on a single task: every operation takes `&mut self`, so at most
/// one submission can be in flight.
pub struct SigningSession<S: DocumentStore> {
    config: SessionConfig,
    store: S,
    viewer: Box<dyn ViewerCapability>,
    handles: HandleRegistry,
    state: SessionState,

    document_id: Option<DocumentId>,
    handle: Option<DocumentHandle>,
    signed_at: Option<DateTime<Utc>>,
    next_token: u64,
    active_token: Option<u64>,

    capture: SignatureCapture,
    anchor: Option<PlacementAnchor>,
    /// Native height the anchor was computed for
    anchored_height: f64,
    signer_name: String,
    remarks: String,

    current_page: usize,
    scale: f64,
    artifact: Option<SignedArtifact>,
}

impl<S: DocumentStore> SigningSession<S> {
    /// Create a session whose viewer variant comes from `config`
    pub fn new(config: SessionConfig, store: S) -> Result<Self> {
        let viewer = create_viewer(config.viewer);
        Self::with_viewer(config, store, viewer)
    }

    pub fn with_viewer(
        config: SessionConfig,
        store: S,
        viewer: Box<dyn ViewerCapability>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            capture: SignatureCapture::new(config.capture),
            scale: config.preferences.clamp(config.preferences.initial_scale),
            config,
            store,
            viewer,
            handles: HandleRegistry::new(),
            state: SessionState::Loading,
            document_id: None,
            handle: None,
            signed_at: None,
            next_token: 0,
            active_token: None,
            anchor: None,
            anchored_height: 0.0,
            signer_name: String::new(),
            remarks: String::new(),
            current_page: 0,
            artifact: None,
        })
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Start loading `id`, superseding any fetch still in flight.
    ///
    /// All signer input from a previous document is dropped.
    pub fn begin_load(&mut self, id: DocumentId) -> LoadTicket {
        self.next_token += 1;
        let token = self.next_token;
        self.active_token = Some(token);

        self.viewer.unload();
        self.handle = None;
        self.signed_at = None;
        self.capture.clear();
        self.anchor = None;
        self.signer_name.clear();
        self.remarks.clear();
        self.current_page = 0;
        self.set_scale(self.config.preferences.initial_scale);
        self.artifact = None;
        self.document_id = Some(id.clone());
        self.transition(SessionState::Loading);

        log::info!("Loading document {} (request {})", id, token);
        LoadTicket {
            token,
            document_id: id,
        }
    }

    /// Apply the outcome of a fetch started by [`Self::begin_load`].
    ///
    /// Returns `false` when the ticket has been superseded or cancelled;
    /// the result is then dropped without touching the session.
    pub fn complete_load(&mut self, ticket: LoadTicket, result: Result<FetchedDocument>) -> bool {
        if !self.take_ticket(&ticket) {
            return false;
        }
        match result {
            Ok(fetched) => self.apply_document(fetched),
            Err(e) => self.apply_load_failure(&e),
        }
        true
    }

    /// Fetch `id` from the store and load it
    pub async fn open(&mut self, id: DocumentId) -> Result<()> {
        let ticket = self.begin_load(id);
        let fetched = self
            .store
            .fetch_for_signing(&ticket.document_id, self.config.access_token.as_deref())
            .await;

        if !self.take_ticket(&ticket) {
            return Ok(());
        }
        match fetched {
            Ok(document) => {
                self.apply_document(document);
                Ok(())
            }
            Err(e) => {
                self.apply_load_failure(&e);
                Err(e)
            }
        }
    }

    /// Wait until the viewer has finished opening the document.
    ///
    /// A viewer that cannot open the document fails the session for good.
    pub async fn wait_viewer_ready(&mut self) -> Result<()> {
        let mut status_rx = self.viewer.subscribe();
        let status = *status_rx
            .wait_for(|status| *status != ViewerStatus::Loading)
            .await
            .map_err(|_| SignError::ViewerNotReady)?;

        match status {
            ViewerStatus::Ready => Ok(()),
            ViewerStatus::Failed => {
                let error =
                    SignError::Format("The document viewer could not open this document".into());
                self.fail(&error, false);
                Err(error)
            }
            ViewerStatus::Idle | ViewerStatus::Loading => Err(SignError::ViewerNotReady),
        }
    }

    fn take_ticket(&mut self, ticket: &LoadTicket) -> bool {
        if self.active_token != Some(ticket.token) {
            log::debug!(
                "Discarding stale load of {} (request {})",
                ticket.document_id,
                ticket.token
            );
            return false;
        }
        self.active_token = None;
        true
    }

    fn apply_document(&mut self, fetched: FetchedDocument) {
        self.signed_at = fetched.signed_at;
        let already_signed = fetched.already_signed;
        let source = fetched.into_source();

        if source.page_count() == 0 {
            self.fail(&SignError::Format("Document has no pages".into()), false);
            return;
        }

        let handle = self.handles.acquire(&source);
        self.viewer.load_document(handle.document());
        self.handle = Some(handle);

        log::info!(
            "Loaded {} ({} pages)",
            source.original_name(),
            source.page_count()
        );

        if already_signed {
            self.transition(SessionState::AlreadySigned);
        } else {
            self.transition(SessionState::Viewing);
        }
    }

    fn apply_load_failure(&mut self, error: &SignError) {
        self.fail(error, false);
    }

    // =========================================================================
    // Signature capture
    // =========================================================================

    pub fn set_capture_mode(&mut self, mode: CaptureMode) -> Result<()> {
        self.ensure_editable()?;
        self.capture.set_mode(mode);
        self.signature_changed()
    }

    /// Commit a drawn stroke; returns whether a signature is now available
    pub fn commit_stroke(&mut self, stroke: Stroke) -> Result<bool> {
        self.ensure_editable()?;
        self.capture.commit_stroke(stroke);
        self.signature_changed()?;
        Ok(!self.capture.is_empty())
    }

    /// Use an image file as the signature
    pub fn upload_signature(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_editable()?;
        self.capture.load_upload(bytes)?;
        self.signature_changed()
    }

    pub fn clear_signature(&mut self) -> Result<()> {
        self.ensure_editable()?;
        self.capture.clear();
        self.signature_changed()
    }

    /// Keep the viewer and the anchor in step with the active raster.
    fn signature_changed(&mut self) -> Result<()> {
        match (self.anchor, self.capture.raster()) {
            (Some(anchor), Some(raster)) => {
                let height = raster.native_height(self.config.signature_width);
                let anchor = anchor.rebased(self.anchored_height, height);
                let placed = self
                    .viewer
                    .place_signature(&anchor, raster, self.config.signature_width);
                if let Err(e) = placed {
                    log::warn!("Viewer rejected the replaced signature: {e}");
                    self.anchor = None;
                    self.viewer.clear_signature();
                    self.refresh_state();
                    return Err(e);
                }
                self.anchor = Some(anchor);
                self.anchored_height = height;
            }
            (Some(_), None) => self.viewer.clear_signature(),
            (None, _) => {}
        }
        self.refresh_state();
        Ok(())
    }

    // =========================================================================
    // Placement and signer details
    // =========================================================================

    /// Place the signature's top-left corner at a point on the current page.
    ///
    /// `point` is in rendered pixels relative to the top-left of the
    /// rendered page at the current scale.
    pub fn place_signature(&mut self, point: RenderPoint) -> Result<PlacementAnchor> {
        self.ensure_editable()?;
        let page = self.current_page_dimensions()?;
        let raster = self
            .capture
            .raster()
            .ok_or_else(|| SignError::input(MISSING_SIGNATURE))?;

        if !is_within_page(point, page, self.scale) {
            return Err(SignError::input("Please place your signature on the page"));
        }

        let width = self.config.signature_width;
        let height = raster.native_height(width);
        let anchor = anchor_from_render(self.current_page, page, point, self.scale, height);
        self.viewer.place_signature(&anchor, raster, width)?;

        log::debug!(
            "Signature anchored on page {} at ({:.2}, {:.2})",
            anchor.page_index + 1,
            anchor.native_x,
            anchor.native_y
        );
        self.anchor = Some(anchor);
        self.anchored_height = height;
        self.refresh_state();
        Ok(anchor)
    }

    pub fn clear_placement(&mut self) -> Result<()> {
        self.ensure_editable()?;
        self.anchor = None;
        self.viewer.clear_signature();
        self.refresh_state();
        Ok(())
    }

    pub fn set_signer_name(&mut self, name: impl Into<String>) -> Result<()> {
        self.ensure_editable()?;
        self.signer_name = name.into();
        self.refresh_state();
        Ok(())
    }

    pub fn set_remarks(&mut self, remarks: impl Into<String>) -> Result<()> {
        self.ensure_editable()?;
        self.remarks = remarks.into();
        Ok(())
    }

    // =========================================================================
    // Navigation and zoom
    // =========================================================================

    pub fn go_to_page(&mut self, page_index: usize) -> Result<()> {
        let count = self.page_count();
        if page_index >= count {
            return Err(SignError::input(format!(
                "Page {} is out of range (document has {} pages)",
                page_index + 1,
                count
            )));
        }
        self.current_page = page_index;
        Ok(())
    }

    pub fn next_page(&mut self) -> usize {
        if self.current_page + 1 < self.page_count() {
            self.current_page += 1;
        }
        self.current_page
    }

    pub fn previous_page(&mut self) -> usize {
        self.current_page = self.current_page.saturating_sub(1);
        self.current_page
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.set_scale(self.scale + self.config.preferences.scale_step)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.set_scale(self.scale - self.config.preferences.scale_step)
    }

    /// Change the render scale; the anchor is unaffected
    pub fn set_scale(&mut self, scale: f64) -> f64 {
        self.scale = self.config.preferences.clamp(scale);
        self.scale
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Rendered box of the signature overlay on the current page
    pub fn signature_overlay(&self) -> Option<RenderRect> {
        let anchor = self.anchor.filter(|a| a.page_index == self.current_page)?;
        let raster = self.capture.raster()?;
        let page = self.document()?.page(anchor.page_index)?;
        let width = self.config.signature_width;
        Some(anchor_render_rect(
            &anchor,
            page,
            self.scale,
            width,
            raster.native_height(width),
        ))
    }

    /// First requirement still missing before the session can submit
    pub fn missing_input(&self) -> Option<&'static str> {
        if self.capture.is_empty() {
            Some(MISSING_SIGNATURE)
        } else if self.anchor.is_none() {
            Some(MISSING_PLACEMENT)
        } else if self.signer_name.trim().is_empty() {
            Some(MISSING_NAME)
        } else {
            None
        }
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Assemble the signed artifact and send it to the store.
    ///
    /// Rejected without any state change while input is missing. Once
    /// submission starts, every failure lands in a recoverable
    /// [`SessionState::Failed`] and nothing is retried.
    pub async fn submit(&mut self) -> Result<()> {
        self.ensure_editable()?;
        if let Some(message) = self.missing_input() {
            return Err(SignError::input(message));
        }
        let (Some(document), Some(id)) = (self.document().cloned(), self.document_id.clone()) else {
            return Err(SignError::ViewerNotReady);
        };
        if document.already_signed() {
            return Err(SignError::AlreadySigned);
        }

        self.transition(SessionState::Submitting);
        match self.run_submission(&id, &document).await {
            Ok(artifact) => {
                log::info!("Submitted {} for document {}", artifact.filename(), id);
                self.artifact = Some(artifact);
                self.transition(SessionState::Success);
                Ok(())
            }
            Err(e) => {
                log::warn!("Submission of document {} failed: {}", id, e);
                self.fail(&e, true);
                Err(e)
            }
        }
    }

    async fn run_submission(
        &self,
        id: &DocumentId,
        document: &SourceDocument,
    ) -> Result<SignedArtifact> {
        let input = match AssemblyStrategy::from(self.viewer.kind()) {
            AssemblyStrategy::RasterComposite => AssemblyInput::RasterComposite {
                source: document.bytes().clone(),
                signature_png: self.capture.export_raster()?,
                anchor: self.anchor.ok_or_else(|| SignError::input(MISSING_PLACEMENT))?,
                signature_width: self.config.signature_width,
            },
            AssemblyStrategy::AnnotationFlatten => {
                if !self.viewer.is_ready() {
                    return Err(SignError::ViewerNotReady);
                }
                if self.viewer.annotation_count() == 0 {
                    return Err(SignError::input(MISSING_ANNOTATION));
                }
                AssemblyInput::AnnotationFlatten {
                    annotated: self.viewer.serialize_with_annotations()?,
                }
            }
        };

        let artifact = assemble(input, document.original_name()).await?;
        let submission = SignedSubmission {
            artifact: artifact.bytes().to_vec(),
            filename: artifact.filename().to_string(),
            signer_name: self.signer_name.trim().to_string(),
            remarks: self.remarks.clone(),
        };
        self.store
            .submit_signed(id, submission, self.config.access_token.as_deref())
            .await?;
        Ok(artifact)
    }

    /// Abandon in-flight work: a pending fetch will be ignored when it
    /// resolves and an interrupted submission returns to input.
    pub fn cancel_pending(&mut self) {
        if let Some(token) = self.active_token.take() {
            log::debug!("Cancelled document request {}", token);
        }
        if self.state == SessionState::Submitting {
            self.state = self.input_state();
            log::debug!("Submission cancelled, back to {}", self.state);
        }
    }

    /// Tear the session down and release the document handle
    pub fn close(mut self) {
        self.cancel_pending();
        self.viewer.unload();
        self.handle = None;
        log::debug!("Session closed");
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn document_id(&self) -> Option<&DocumentId> {
        self.document_id.as_ref()
    }

    pub fn document(&self) -> Option<&SourceDocument> {
        self.handle.as_ref().map(DocumentHandle::document)
    }

    pub fn page_count(&self) -> usize {
        self.document().map_or(0, SourceDocument::page_count)
    }

    /// When the document was signed, for documents that loaded already signed
    pub fn signed_at(&self) -> Option<DateTime<Utc>> {
        self.signed_at
    }

    pub fn capture(&self) -> &SignatureCapture {
        &self.capture
    }

    pub fn anchor(&self) -> Option<&PlacementAnchor> {
        self.anchor.as_ref()
    }

    pub fn signer_name(&self) -> &str {
        &self.signer_name
    }

    pub fn remarks(&self) -> &str {
        &self.remarks
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// The artifact of the successful submission
    pub fn artifact(&self) -> Option<&SignedArtifact> {
        self.artifact.as_ref()
    }

    pub fn viewer(&self) -> &dyn ViewerCapability {
        self.viewer.as_ref()
    }

    pub fn viewer_mut(&mut self) -> &mut dyn ViewerCapability {
        self.viewer.as_mut()
    }

    pub fn handle_registry(&self) -> &HandleRegistry {
        &self.handles
    }

    // =========================================================================
    // State bookkeeping
    // =========================================================================

    fn ensure_editable(&self) -> Result<()> {
        match &self.state {
            SessionState::Loading => Err(SignError::ViewerNotReady),
            state if state.is_terminal() => Err(SignError::Locked(state.name())),
            SessionState::Submitting => Err(SignError::Locked(self.state.name())),
            _ => Ok(()),
        }
    }

    fn current_page_dimensions(&self) -> Result<PageDimensions> {
        self.document()
            .and_then(|doc| doc.page(self.current_page))
            .ok_or(SignError::ViewerNotReady)
    }

    /// Input state matching what the signer has provided
    fn input_state(&self) -> SessionState {
        match self.missing_input() {
            Some(MISSING_SIGNATURE) => SessionState::Viewing,
            Some(MISSING_PLACEMENT) => SessionState::CapturingSignature,
            Some(_) => SessionState::AwaitingPlacement,
            None => SessionState::Ready,
        }
    }

    fn refresh_state(&mut self) {
        let recoverable = match &self.state {
            SessionState::Failed(failure) => failure.recoverable,
            state => !state.is_terminal() && *state != SessionState::Loading,
        };
        if recoverable && self.state != SessionState::Submitting {
            self.transition(self.input_state());
        }
    }

    fn fail(&mut self, error: &SignError, recoverable: bool) {
        self.transition(SessionState::Failed(Failure {
            reason: error.reason(),
            recoverable,
        }));
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            log::debug!("Session state: {} -> {}", self.state, next);
            self.state = next;
        }
    }
}
