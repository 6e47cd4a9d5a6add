//! Interfaces to the external services the session and history view depend on.
//!
//! Implementations are injected, so tests can substitute in-memory doubles
//! and the binary can wire the HTTP adapters from `cogniclause-sync`.

use std::time::Duration;

use async_trait::async_trait;
use cogniclause_core::HistoryRecord;
use serde::Serialize;
use tracing::warn;

use crate::error::{IdentityError, StoreError, TransportError};

/// JSON body for the text evaluation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A document picked or dropped by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Multipart payload for the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRequest {
    pub file: FileUpload,
    pub user_id: Option<String>,
    pub name: String,
}

/// The evaluation and upload service.
///
/// Both calls return the raw JSON body; normalisation happens in the session.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate_text(&self, request: TextRequest)
    -> Result<serde_json::Value, TransportError>;

    async fn upload_file(&self, request: FileRequest) -> Result<serde_json::Value, TransportError>;
}

/// Source of the signed-in user's id.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current user id, or `None` when nobody is signed in.
    async fn current_user_id(&self) -> Result<Option<String>, IdentityError>;

    async fn sign_out(&self) -> Result<(), IdentityError>;
}

/// Persisted evaluation summaries.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Records for `user_id` (or every visible record when `None`), newest first.
    async fn list_records(&self, user_id: Option<&str>) -> Result<Vec<HistoryRecord>, StoreError>;
}

/// Identity provider with nobody signed in.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousIdentity;

#[async_trait]
impl IdentityProvider for AnonymousIdentity {
    async fn current_user_id(&self) -> Result<Option<String>, IdentityError> {
        Ok(None)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        Ok(())
    }
}

/// Identity provider pinned to a fixed user id.
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    user_id: String,
}

impl StaticIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user_id(&self) -> Result<Option<String>, IdentityError> {
        Ok(Some(self.user_id.clone()))
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        Ok(())
    }
}

/// Read the current user id without letting a slow or failing provider
/// hold up the caller.
///
/// Errors, timeouts, and blank ids all yield `None`.
pub async fn best_effort_user_id(
    provider: &dyn IdentityProvider,
    timeout: Duration,
) -> Option<String> {
    match tokio::time::timeout(timeout, provider.current_user_id()).await {
        Ok(Ok(id)) => id.filter(|id| !id.trim().is_empty()),
        Ok(Err(e)) => {
            warn!(error = %e, "could not read identity, continuing without it");
            None
        }
        Err(_) => {
            warn!(?timeout, "identity lookup timed out, continuing without it");
            None
        }
    }
}
