#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Lists the Azure data actions that govern access to a cluster's resources.

pub mod environment;
pub mod operations;
pub mod settings;
pub mod token;

pub use self::{
    environment::Environment,
    operations::OperationsClient,
    settings::{Identity, Settings},
    token::{AccessToken, TokenError, TokenProvider},
};
use dataaction_discovery_core::{Operation, UnsupportedClusterType};
use reqwest::StatusCode;

/// Lists the data actions that apply to a cluster.
#[async_trait::async_trait]
pub trait DataActionSource {
    async fn data_actions(&self) -> Result<Vec<Operation>, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    UnsupportedClusterType(#[from] UnsupportedClusterType),

    #[error("unknown Azure environment {0:?}")]
    UnknownEnvironment(String),

    #[error("failed to acquire a token for the operations request: {0}")]
    Auth(#[from] TokenError),

    #[error("failed to send operations request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("operations request failed with status {status}: {body}")]
    Response { status: StatusCode, body: String },

    #[error("failed to decode operations response: {0}")]
    Decode(#[source] serde_json::Error),
}
