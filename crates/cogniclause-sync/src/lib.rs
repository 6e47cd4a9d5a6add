//! Network adapters: the evaluation/upload API, and the auth+data backend
//! that holds identities and evaluation history.

#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "http")]
pub mod rest;

#[cfg(feature = "http")]
pub use http::{ApiClient, ApiError, HealthStatus, read_upload};
#[cfg(feature = "http")]
pub use rest::{AuthIdentity, BackendConfig, RestRecordStore};
