//! Lifecycle of a single user-initiated evaluation.
//!
//! A submission moves the session through
//! `Idle → Submitting → Succeeded | Failed`, and `clear()` returns it to
//! `Idle`. Every accepted submission takes a new sequence number; only the
//! completion carrying the latest number may change state, so a slow
//! earlier request can never overwrite the outcome of a later one.
//!
//! State lives in a [`watch`] channel. Each transition is one
//! `send_modify`/`send_if_modified` call, which makes it atomic with respect
//! to the sequence check and lets front-ends observe changes via
//! [`EvaluationSession::subscribe`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cogniclause_core::normalize::{document_info, normalize};
use cogniclause_core::{DocumentInfo, EvaluationResult};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::collab::{
    Evaluator, FileRequest, FileUpload, IdentityProvider, TextRequest, best_effort_user_id,
};
use crate::error::{SessionError, TransportError};

/// Request name sent with pasted text.
pub const TEXT_REQUEST_NAME: &str = "manual evaluation";

/// Request name for uploads whose file name is blank.
pub const DEFAULT_UPLOAD_NAME: &str = "uploaded";

pub const EMPTY_TEXT_MESSAGE: &str = "Please paste some contract text or upload a PDF.";
pub const NO_FILE_MESSAGE: &str = "Please select a PDF file to upload.";

/// Timeouts applied by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Upper bound on one evaluation or upload call.
    pub request_timeout: Duration,
    /// Upper bound on the identity lookup that precedes each call.
    pub identity_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            identity_timeout: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Text,
    File,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Submitting {
        kind: RequestKind,
        started_at: DateTime<Utc>,
    },
    Succeeded {
        result: EvaluationResult,
        document: Option<DocumentInfo>,
    },
    Failed {
        message: String,
    },
}

/// Everything a front-end renders for the session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    pub state: SessionState,
    /// Text most recently submitted.
    pub draft_text: String,
    /// Name of the file most recently submitted.
    pub file_name: Option<String>,
    /// Inline message for rejected input. Cleared by the next accepted submission.
    pub validation_error: Option<String>,
    /// Sequence number of the most recently issued request.
    pub latest_seq: u64,
}

/// An accepted submission waiting to be sent.
#[derive(Debug, Clone)]
pub struct Submission {
    seq: u64,
    payload: Payload,
}

#[derive(Debug, Clone)]
enum Payload {
    Text(String),
    File(FileUpload),
}

impl Submission {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn kind(&self) -> RequestKind {
        match self.payload {
            Payload::Text(_) => RequestKind::Text,
            Payload::File(_) => RequestKind::File,
        }
    }
}

/// What happened to a completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The outcome became the session state.
    Applied,
    /// A newer submission (or a clear) was issued first; the outcome was dropped.
    Superseded,
}

pub struct EvaluationSession {
    evaluator: Arc<dyn Evaluator>,
    identity: Arc<dyn IdentityProvider>,
    config: SessionConfig,
    tx: watch::Sender<SessionSnapshot>,
}

impl EvaluationSession {
    pub fn new(
        evaluator: Arc<dyn Evaluator>,
        identity: Arc<dyn IdentityProvider>,
        config: SessionConfig,
    ) -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::default());
        Self {
            evaluator,
            identity,
            config,
            tx,
        }
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    // ── Observation ──

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.tx.borrow().state.clone()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.tx.borrow().state, SessionState::Submitting { .. })
    }

    pub fn result(&self) -> Option<EvaluationResult> {
        match &self.tx.borrow().state {
            SessionState::Succeeded { result, .. } => Some(result.clone()),
            _ => None,
        }
    }

    /// Failure message exactly as produced by the transport.
    pub fn error(&self) -> Option<String> {
        match &self.tx.borrow().state {
            SessionState::Failed { message } => Some(message.clone()),
            _ => None,
        }
    }

    pub fn validation_error(&self) -> Option<String> {
        self.tx.borrow().validation_error.clone()
    }

    pub fn latest_seq(&self) -> u64 {
        self.tx.borrow().latest_seq
    }

    // ── Submission ──

    /// Validate pasted text and enter `Submitting`.
    ///
    /// Blank text is rejected synchronously: the state is left untouched,
    /// the validation message is recorded, and no request is issued.
    pub fn prepare_text(&self, text: &str) -> Result<Submission, SessionError> {
        if text.trim().is_empty() {
            return Err(self.reject_input(EMPTY_TEXT_MESSAGE));
        }
        let seq = self.begin(RequestKind::Text, |snap| {
            snap.draft_text = text.to_string();
        });
        Ok(Submission {
            seq,
            payload: Payload::Text(text.to_string()),
        })
    }

    /// Validate a picked or dropped file and enter `Submitting`.
    pub fn prepare_file(&self, file: Option<FileUpload>) -> Result<Submission, SessionError> {
        let Some(file) = file.filter(|f| !f.bytes.is_empty()) else {
            return Err(self.reject_input(NO_FILE_MESSAGE));
        };
        let seq = self.begin(RequestKind::File, |snap| {
            snap.file_name = Some(file.file_name.clone());
        });
        Ok(Submission {
            seq,
            payload: Payload::File(file),
        })
    }

    /// Send a prepared submission and apply its outcome if it is still current.
    pub async fn execute(&self, submission: Submission) -> Completion {
        let Submission { seq, payload } = submission;
        let user_id =
            best_effort_user_id(self.identity.as_ref(), self.config.identity_timeout).await;

        let call = async {
            match payload {
                Payload::Text(text) => {
                    let request = TextRequest {
                        text,
                        user_id,
                        name: Some(TEXT_REQUEST_NAME.to_string()),
                    };
                    self.evaluator.evaluate_text(request).await
                }
                Payload::File(file) => {
                    let name = if file.file_name.trim().is_empty() {
                        DEFAULT_UPLOAD_NAME.to_string()
                    } else {
                        file.file_name.clone()
                    };
                    let request = FileRequest {
                        file,
                        user_id,
                        name,
                    };
                    self.evaluator.upload_file(request).await
                }
            }
        };

        let outcome = match tokio::time::timeout(self.config.request_timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(TransportError::Timeout(self.config.request_timeout)),
        };

        match outcome {
            Ok(raw) => self.resolve(seq, &raw),
            Err(e) => self.reject(seq, e.to_string()),
        }
    }

    pub async fn submit_text(&self, text: &str) -> Result<Completion, SessionError> {
        let submission = self.prepare_text(text)?;
        Ok(self.execute(submission).await)
    }

    pub async fn submit_file(&self, file: Option<FileUpload>) -> Result<Completion, SessionError> {
        let submission = self.prepare_file(file)?;
        Ok(self.execute(submission).await)
    }

    // ── Completion ──

    /// `Submitting → Succeeded(normalize(raw))` for request `seq`.
    pub fn resolve(&self, seq: u64, raw: &Value) -> Completion {
        let result = normalize(raw);
        let document = document_info(raw);
        let level = result.risk_level;
        let completion = self.complete(seq, SessionState::Succeeded { result, document });
        if completion == Completion::Applied {
            info!(seq, %level, "evaluation succeeded");
        }
        completion
    }

    /// `Submitting → Failed(message)` for request `seq`.
    pub fn reject(&self, seq: u64, message: impl Into<String>) -> Completion {
        let message = message.into();
        let completion = self.complete(
            seq,
            SessionState::Failed {
                message: message.clone(),
            },
        );
        if completion == Completion::Applied {
            warn!(seq, error = %message, "evaluation failed");
        }
        completion
    }

    /// Back to `Idle`, dropping text, file, result and error together.
    ///
    /// Any request still in flight is invalidated.
    pub fn clear(&self) {
        self.tx.send_modify(|snap| {
            let latest_seq = snap.latest_seq + 1;
            *snap = SessionSnapshot {
                latest_seq,
                ..SessionSnapshot::default()
            };
        });
    }

    // ── Internals ──

    fn reject_input(&self, message: &str) -> SessionError {
        self.tx.send_modify(|snap| {
            snap.validation_error = Some(message.to_string());
        });
        SessionError::Validation(message.to_string())
    }

    fn begin(&self, kind: RequestKind, update_draft: impl FnOnce(&mut SessionSnapshot)) -> u64 {
        let mut seq = 0;
        self.tx.send_modify(|snap| {
            if let SessionState::Submitting { .. } = snap.state {
                info!(superseded = snap.latest_seq, "superseding in-flight request");
            }
            snap.latest_seq += 1;
            seq = snap.latest_seq;
            snap.validation_error = None;
            snap.state = SessionState::Submitting {
                kind,
                started_at: Utc::now(),
            };
            update_draft(snap);
        });
        info!(seq, ?kind, "submission started");
        seq
    }

    fn complete(&self, seq: u64, next: SessionState) -> Completion {
        let mut completion = Completion::Superseded;
        self.tx.send_if_modified(|snap| {
            let current = snap.latest_seq == seq
                && matches!(snap.state, SessionState::Submitting { .. });
            if current {
                snap.state = next;
                completion = Completion::Applied;
            }
            current
        });
        if completion == Completion::Superseded {
            warn!(seq, latest = self.latest_seq(), "discarding stale response");
        }
        completion
    }
}
