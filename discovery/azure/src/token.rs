use reqwest::StatusCode;
use serde::{de, Deserialize, Deserializer};
use std::fmt;
use tracing::{debug, instrument};

/// Acquires bearer tokens for the Azure resource manager.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    async fn acquire(&self, scope: &str) -> Result<AccessToken, TokenError>;
}

#[derive(Clone, Deserialize)]
pub struct AccessToken {
    #[serde(rename = "access_token")]
    pub token: String,

    #[serde(default)]
    pub token_type: Option<String>,

    /// Seconds until the token expires. Token services disagree on whether
    /// this is a number or a string.
    #[serde(default, deserialize_with = "deserialize_expires_in")]
    pub expires_in: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("token request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to decode token response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Acquires tokens for a service principal with the OAuth2 client
/// credentials grant.
#[derive(Clone)]
pub struct ClientCredentialTokenProvider {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

/// Acquires tokens from the AKS login service on behalf of a tenant.
#[derive(Clone, Debug)]
pub struct AksTokenProvider {
    http: reqwest::Client,
    login_url: String,
    tenant_id: String,
}

#[derive(serde::Serialize)]
struct AksTokenRequest<'a> {
    #[serde(rename = "tenantID")]
    tenant_id: &'a str,
}

// === impl AccessToken ===

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

fn deserialize_expires_in<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    match Option::<serde_json::Value>::deserialize(d)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid expires_in: {n}"))),
        Some(serde_json::Value::String(s)) => s.parse().map(Some).map_err(de::Error::custom),
        Some(v) => Err(de::Error::custom(format!("invalid expires_in: {v}"))),
    }
}

async fn read_token(rsp: reqwest::Response) -> Result<AccessToken, TokenError> {
    let status = rsp.status();
    let body = rsp.bytes().await.map_err(TokenError::Request)?;
    if !status.is_success() {
        return Err(TokenError::Status {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }
    let token = serde_json::from_slice::<AccessToken>(&body).map_err(TokenError::Decode)?;
    debug!(expires_in = ?token.expires_in, "Acquired token");
    Ok(token)
}

// === impl ClientCredentialTokenProvider ===

impl ClientCredentialTokenProvider {
    pub fn new(
        http: reqwest::Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

#[async_trait::async_trait]
impl TokenProvider for ClientCredentialTokenProvider {
    #[instrument(skip(self), fields(url = %self.token_url, client_id = %self.client_id))]
    async fn acquire(&self, scope: &str) -> Result<AccessToken, TokenError> {
        let rsp = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", scope),
            ])
            .send()
            .await
            .map_err(TokenError::Request)?;
        read_token(rsp).await
    }
}

impl fmt::Debug for ClientCredentialTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentialTokenProvider")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

// === impl AksTokenProvider ===

impl AksTokenProvider {
    pub fn new(
        http: reqwest::Client,
        login_url: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Self {
        Self {
            http,
            login_url: login_url.into(),
            tenant_id: tenant_id.into(),
        }
    }
}

#[async_trait::async_trait]
impl TokenProvider for AksTokenProvider {
    /// The login service issues tokens for a fixed audience, so the scope is
    /// ignored.
    #[instrument(skip(self), fields(url = %self.login_url, tenant_id = %self.tenant_id))]
    async fn acquire(&self, _scope: &str) -> Result<AccessToken, TokenError> {
        let rsp = self
            .http
            .post(&self.login_url)
            .json(&AksTokenRequest {
                tenant_id: &self.tenant_id,
            })
            .send()
            .await
            .map_err(TokenError::Request)?;
        read_token(rsp).await
    }
}
