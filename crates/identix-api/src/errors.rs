//! Error type and conversions.
use axum::{response::IntoResponse, Json};
use hyper::StatusCode;
use identix_core::store::StoreError;
use identix_core::transfer::TransferError;
use serde_json::json;
use thiserror::Error;

/// Identix API error type.
#[derive(Error, Debug)]
pub enum IdentixAPIError {
    #[error("Credential not found.")]
    CredentialNotFound,
    #[error("DID not found.")]
    DidNotFound,
    /// Issuance aborted before the record was saved; carries the cause message.
    #[error("Failed to issue credential: {0}")]
    IssuanceFailed(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Seed phrase is required.")]
    SeedPhraseRequired,
    #[error("Failed to claim credential: {0}")]
    ClaimFailed(TransferError),
    #[error("Identix store error: {0}")]
    StoreError(StoreError),
    #[error("JSON Serialization Error: {0}.")]
    FailedToSerialize(serde_json::Error),
}

impl From<StoreError> for IdentixAPIError {
    fn from(err: StoreError) -> Self {
        IdentixAPIError::StoreError(err)
    }
}

impl From<TransferError> for IdentixAPIError {
    fn from(err: TransferError) -> Self {
        IdentixAPIError::ClaimFailed(err)
    }
}

impl From<serde_json::Error> for IdentixAPIError {
    fn from(err: serde_json::Error) -> Self {
        IdentixAPIError::FailedToSerialize(err)
    }
}

impl IdentixAPIError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            IdentixAPIError::CredentialNotFound | IdentixAPIError::DidNotFound => {
                StatusCode::NOT_FOUND
            }
            IdentixAPIError::InvalidRequest(_)
            | IdentixAPIError::SeedPhraseRequired
            | IdentixAPIError::ClaimFailed(TransferError::Malformed(_))
            | IdentixAPIError::ClaimFailed(TransferError::InvalidCredential) => {
                StatusCode::BAD_REQUEST
            }
            IdentixAPIError::IssuanceFailed(_)
            | IdentixAPIError::ClaimFailed(TransferError::Serialize(_))
            | IdentixAPIError::StoreError(_)
            | IdentixAPIError::FailedToSerialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Make IdentixAPIError suitable for axum responses, wrapped in the
// `{ "error": { "message", "status" } }` envelope.
impl IntoResponse for IdentixAPIError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "status": status.as_u16(),
            }
        }));
        (status, body).into_response()
    }
}
