//! Auth+data backend: evaluation history over its REST interface and the
//! signed-in user over its auth interface.

use async_trait::async_trait;
use cogniclause_core::HistoryRecord;
use cogniclause_core::normalize::normalize_record;
use cogniclause_session::{IdentityError, IdentityProvider, RecordStore, StoreError};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::http::{ApiError, read_success};

/// Table holding persisted evaluations.
pub const CONTRACTS_TABLE: &str = "contracts";

/// Connection settings shared by the record store and the identity provider.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    /// Public API key, sent on every request.
    pub api_key: String,
    /// Session token of the signed-in user, if any.
    pub access_token: Option<String>,
}

impl BackendConfig {
    pub fn new(base_url: String, api_key: String, access_token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            access_token: access_token.filter(|t| !t.trim().is_empty()),
        }
    }

    /// Attach the API key and the best available bearer token.
    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        req.header("apikey", &self.api_key).bearer_auth(bearer)
    }
}

/// Evaluation history read from the backend's REST table interface.
pub struct RestRecordStore {
    client: reqwest::Client,
    config: BackendConfig,
}

impl RestRecordStore {
    pub fn new(client: reqwest::Client, config: BackendConfig) -> Self {
        Self { client, config }
    }

    fn records_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.base_url, CONTRACTS_TABLE)
    }

    async fn fetch(&self, user_id: Option<&str>) -> Result<String, ApiError> {
        let url = self.records_url();
        let mut query = vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        if let Some(id) = user_id {
            query.push(("user_id", format!("eq.{id}")));
        }

        info!(url = %url, filtered = user_id.is_some(), "listing evaluation history");
        let req = self.config.authorize(self.client.get(&url).query(&query));
        let resp = req.send().await?;
        read_success(resp).await
    }
}

#[async_trait]
impl RecordStore for RestRecordStore {
    async fn list_records(&self, user_id: Option<&str>) -> Result<Vec<HistoryRecord>, StoreError> {
        let body = self.fetch(user_id).await.map_err(store_error)?;
        parse_records(&body)
    }
}

/// Parse a table listing. An empty or `null` body is an empty history.
fn parse_records(body: &str) -> Result<Vec<HistoryRecord>, StoreError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let value: Value = serde_json::from_str(body)
        .map_err(|e| StoreError::Other(format!("invalid record listing: {e}")))?;
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(rows) => {
            let total = rows.len();
            let records: Vec<HistoryRecord> = rows.iter().filter_map(normalize_record).collect();
            if records.len() < total {
                warn!(skipped = total - records.len(), "skipped malformed history rows");
            }
            Ok(records)
        }
        other => Err(StoreError::Other(format!(
            "expected a list of records, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn store_error(err: ApiError) -> StoreError {
    match err {
        ApiError::Server { status, body } => StoreError::Server { status, body },
        ApiError::Http(e) => StoreError::Network(e.to_string()),
        other => StoreError::Other(other.to_string()),
    }
}

/// The signed-in user, resolved from a session token.
pub struct AuthIdentity {
    client: reqwest::Client,
    config: BackendConfig,
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
}

impl AuthIdentity {
    pub fn new(client: reqwest::Client, config: BackendConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl IdentityProvider for AuthIdentity {
    /// `None` when there is no token or the backend no longer accepts it.
    async fn current_user_id(&self) -> Result<Option<String>, IdentityError> {
        if self.config.access_token.is_none() {
            return Ok(None);
        }
        let url = format!("{}/auth/v1/user", self.config.base_url);
        let resp = self
            .config
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        let body = read_success(resp).await.map_err(identity_error)?;
        let user: AuthUser = serde_json::from_str(&body)
            .map_err(|e| IdentityError::Network(format!("invalid user response: {e}")))?;
        Ok(Some(user.id))
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        if self.config.access_token.is_none() {
            return Ok(());
        }
        let url = format!("{}/auth/v1/logout", self.config.base_url);

        info!(url = %url, "signing out");
        let resp = self
            .config
            .authorize(self.client.post(&url))
            .send()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;
        read_success(resp).await.map_err(identity_error)?;
        Ok(())
    }
}

fn identity_error(err: ApiError) -> IdentityError {
    match err {
        ApiError::Server { status, body } => IdentityError::Server { status, body },
        other => IdentityError::Network(other.to_string()),
    }
}
