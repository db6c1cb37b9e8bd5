//! Credential agent interface and the adapter that degrades when the agent is missing or failing.
use crate::capability::Capability;
use async_trait::async_trait;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// An error relating to the external credential agent.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The agent does not implement the requested operation.
    #[error("Agent does not support: {0}")]
    Unsupported(&'static str),
    /// The agent call failed.
    #[error("Agent call failed: {0}")]
    Failed(String),
}

/// Answer of an agent verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentVerification {
    pub verified: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// External capability able to sign and verify credentials, and optionally manage identifiers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialAgent: Send + Sync {
    /// Signs an unsigned credential document, returning the verifiable form.
    async fn sign_credential(&self, credential: &Value) -> Result<Value, AgentError>;

    async fn verify_credential(&self, credential: &Value)
        -> Result<AgentVerification, AgentError>;

    /// Creates a managed identifier. Returns the agent's identifier object (`did`, `keys`, ...).
    async fn create_identifier(&self, _method: &str, _options: &Value) -> Result<Value, AgentError> {
        Err(AgentError::Unsupported("create_identifier"))
    }

    async fn resolve_did(&self, _did: &str) -> Result<Value, AgentError> {
        Err(AgentError::Unsupported("resolve_did"))
    }

    async fn delete_identifier(&self, _did: &str) -> Result<(), AgentError> {
        Err(AgentError::Unsupported("delete_identifier"))
    }
}

/// Wraps an optional [`CredentialAgent`]. Every `try_*` call turns absence and failure into
/// `None`/`false`, logging the failure.
#[derive(Clone, Default)]
pub struct AgentAdapter {
    agent: Option<Arc<dyn CredentialAgent>>,
}

impl AgentAdapter {
    pub fn new(agent: Arc<dyn CredentialAgent>) -> Self {
        Self { agent: Some(agent) }
    }

    /// An adapter with no agent configured.
    pub fn absent() -> Self {
        Self { agent: None }
    }

    pub fn capability(&self) -> Capability<&dyn CredentialAgent> {
        self.agent.as_deref().into()
    }

    pub async fn try_sign(&self, credential: &Value) -> Option<Value> {
        let agent = self.capability().available()?;
        match agent.sign_credential(credential).await {
            Ok(signed) => Some(signed),
            Err(e) => {
                warn!("Credential signing failed, issuing unsigned: {e}");
                None
            }
        }
    }

    pub async fn try_verify(&self, credential: &Value) -> Option<AgentVerification> {
        let agent = self.capability().available()?;
        match agent.verify_credential(credential).await {
            Ok(verification) => Some(verification),
            Err(e) => {
                warn!("Agent verification failed, falling back to stored status: {e}");
                None
            }
        }
    }

    pub async fn try_create_identifier(&self, method: &str, options: &Value) -> Option<Value> {
        let agent = self.capability().available()?;
        match agent.create_identifier(method, options).await {
            Ok(identifier) => Some(identifier),
            Err(e) => {
                warn!("Agent identifier creation failed: {e}");
                None
            }
        }
    }

    pub async fn try_resolve_did(&self, did: &str) -> Option<Value> {
        let agent = self.capability().available()?;
        match agent.resolve_did(did).await {
            Ok(document) => Some(document),
            Err(e) => {
                warn!("DID resolution failed for {did}: {e}");
                None
            }
        }
    }

    /// Returns whether the agent deleted the identifier.
    pub async fn try_delete_identifier(&self, did: &str) -> bool {
        let Some(agent) = self.capability().available() else {
            return false;
        };
        match agent.delete_identifier(did).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Agent identifier deletion failed for {did}: {e}");
                false
            }
        }
    }
}
