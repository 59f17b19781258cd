pub mod config;
pub mod controller;
pub mod resource;
pub mod store;

pub use config::{SessionConfig, ViewerPreferences};
pub use controller::{Failure, LoadTicket, SessionState, SigningSession};
pub use pdf_signing::{Result, SignError};
pub use resource::{DocumentHandle, HandleRegistry};
pub use store::{
    DirectoryStore, DocumentId, DocumentRecord, DocumentStore, FetchedDocument, SignedSubmission,
};
