use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ihbar_sdk::SdkError;
use thiserror::Error;
use tracing::{error, warn};

pub type Result<T> = std::result::Result<T, ServerError>;

/// Body returned for every failure that carries no client-facing detail.
pub const GENERIC_ERROR_MESSAGE: &str = "An unknown error occurred";

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid \"account\" provided")]
    InvalidAccount,

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Sdk(#[from] SdkError),

    #[error("Solana client error: {0}")]
    SolanaClient(#[from] solana_client::client_error::ClientError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::InvalidAccount => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::UnknownAction(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::Sdk(SdkError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ServerError::InvalidRequest(_) | ServerError::Sdk(_) => {
                (StatusCode::BAD_REQUEST, GENERIC_ERROR_MESSAGE.to_string())
            }
            ServerError::SolanaClient(_) => {
                (StatusCode::BAD_REQUEST, GENERIC_ERROR_MESSAGE.to_string())
            }
        };

        match &self {
            ServerError::SolanaClient(_) | ServerError::Sdk(SdkError::Crypto(_)) => {
                error!("Request failed: {}", self)
            }
            _ => warn!("Request rejected: {}", self),
        }

        (status, message).into_response()
    }
}
