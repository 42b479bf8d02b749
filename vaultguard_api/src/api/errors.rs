//! API error handling for the VaultGuard service.
//!
//! Every failure leaves the service as a structured `{error, details?}` JSON
//! body with a stable, machine-checkable `error` message — never a raw
//! transport error or a stack trace.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::registry::RegistryError;

#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    pub fn internal_server_error(error: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.error,
            details: self.details.as_deref(),
        };
        (self.status, Json(&body)).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::InvalidArgument(message) => Self::bad_request(message),
            RegistryError::NotFound => {
                Self::not_found("Will not found. The specified token ID does not exist.")
            }
            RegistryError::InsufficientFunds(details) => {
                Self::bad_request("Insufficient funds to pay for gas fees").with_details(details)
            }
            RegistryError::InvalidNonce(details) => {
                Self::bad_request("Invalid transaction nonce").with_details(details)
            }
            RegistryError::RemoteUnavailable { details, tx_hash } => {
                let details = match tx_hash {
                    Some(hash) => format!("{details} (transaction hash: {hash})"),
                    None => details,
                };
                Self::internal_server_error("Failed to reach the ledger node")
                    .with_details(details)
            }
        }
    }
}
