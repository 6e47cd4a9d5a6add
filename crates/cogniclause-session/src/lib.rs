//! Evaluation session, history loading, and the interfaces to external services.

pub mod collab;
mod error;
pub mod history;
pub mod session;

pub use collab::{
    AnonymousIdentity, Evaluator, FileRequest, FileUpload, IdentityProvider, RecordStore,
    StaticIdentity, TextRequest,
};
pub use error::{IdentityError, SessionError, StoreError, TransportError};
pub use history::{fetch_records, load_history, refresh_history};
pub use session::{
    Completion, EvaluationSession, RequestKind, SessionConfig, SessionSnapshot, SessionState,
    Submission,
};
