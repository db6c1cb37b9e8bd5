//! External revocation registry, notified best-effort on revocation.
use async_trait::async_trait;
use thiserror::Error;

/// An error relating to the revocation registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Revocation registry unavailable.")]
    Unavailable,
    #[error("Revocation registry transaction failed: {0}")]
    TransactionFailed(String),
}

/// Registry recording revoked credentials outside local storage. Local status stays authoritative.
#[async_trait]
pub trait RevocationRegistry: Send + Sync {
    async fn revoke(&self, credential_id: &str) -> Result<(), RegistryError>;
}
