//! Credential lifecycle: issue, look up, verify and revoke.
use crate::errors::IdentixAPIError;
use chrono::{DateTime, Utc};
use identix_core::agent::{AgentAdapter, AgentVerification};
use identix_core::config::{core_config, CoreConfig};
use identix_core::credential::{
    issuer_of, referenced_credential_id, CredentialRecord, CredentialStatus, CredentialType,
    CredentialTypeInput, RevocationReceipt, RevocationStatus, VerificationResult,
};
use identix_core::registry::RevocationRegistry;
use identix_core::store::{CredentialFilter, StoreSelector};
use identix_core::utils::{iso_timestamp, synthesize_credential_id};
use identix_core::{DEFAULT_REVOCATION_REASON, VERIFICATION_FAILED};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Body of an issuance request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueRequest {
    #[serde(rename = "issuerDID", default)]
    pub issuer_did: Option<String>,
    #[serde(rename = "holderDID", default)]
    pub holder_did: Option<String>,
    #[serde(rename = "credentialSubject", default)]
    pub credential_subject: Option<Map<String, Value>>,
    #[serde(rename = "type", default)]
    pub credential_type: Option<CredentialTypeInput>,
}

/// Identifier for a newly issued credential: the proof token of a signed document, else the
/// document's own `id`, else a synthesized `cred:<millis>:<random>`.
pub fn assign_credential_id(document: &Value, now: DateTime<Utc>) -> String {
    let non_empty = |value: Option<&Value>| {
        value
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    non_empty(document.pointer("/proof/jwt"))
        .or_else(|| non_empty(document.get("id")))
        .unwrap_or_else(|| synthesize_credential_id(now))
}

/// Trust decision from stored status alone, used when the agent cannot answer.
pub fn local_verification(
    record: Option<&CredentialRecord>,
    issuer: Option<String>,
) -> VerificationResult {
    VerificationResult::from_record(record).with_issuer(issuer)
}

/// Converts an agent answer into a result. The agent's verdict is final.
pub fn agent_verification(answer: AgentVerification, issuer: Option<String>) -> VerificationResult {
    let reason = if answer.verified {
        None
    } else {
        Some(answer.error.unwrap_or_else(|| VERIFICATION_FAILED.to_string()))
    };
    VerificationResult {
        verified: answer.verified,
        reason,
        status: None,
        issuer,
    }
}

/// Unsigned credential document for an issuance.
fn unsigned_credential(
    config: &CoreConfig,
    issuer_did: &str,
    holder_did: &str,
    claims: Map<String, Value>,
    credential_type: &CredentialType,
    now: DateTime<Utc>,
) -> Value {
    let mut subject = Map::new();
    subject.insert("id".to_string(), Value::String(holder_did.to_string()));
    subject.extend(claims);
    json!({
        "@context": [config.credential_context],
        "type": credential_type.type_pair(),
        "issuer": { "id": issuer_did },
        "credentialSubject": subject,
        "issuanceDate": iso_timestamp(now),
    })
}

/// Issuance time stated in a (possibly signed) document.
fn stated_issuance_date(document: &Value) -> Option<DateTime<Utc>> {
    let stated = document.get("issuanceDate")?.as_str()?;
    DateTime::parse_from_rfc3339(stated)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

/// Issues, stores, verifies and revokes credentials against whichever backend is live per call.
#[derive(Clone)]
pub struct CredentialManager {
    stores: StoreSelector,
    agent: AgentAdapter,
    registry: Option<Arc<dyn RevocationRegistry>>,
    config: CoreConfig,
}

impl CredentialManager {
    pub fn new(stores: StoreSelector, agent: AgentAdapter) -> Self {
        Self {
            stores,
            agent,
            registry: None,
            config: core_config().clone(),
        }
    }

    pub fn with_registry(mut self, registry: Arc<dyn RevocationRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_config(mut self, config: CoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates an [`IssueRequest`] and issues it.
    pub async fn issue_request(
        &self,
        request: IssueRequest,
    ) -> Result<CredentialRecord, IdentixAPIError> {
        let non_empty = |did: Option<String>| did.filter(|did| !did.trim().is_empty());
        let (Some(issuer_did), Some(holder_did)) =
            (non_empty(request.issuer_did), non_empty(request.holder_did))
        else {
            return Err(IdentixAPIError::InvalidRequest(
                "issuerDID and holderDID are required".to_string(),
            ));
        };
        self.issue(
            &issuer_did,
            &holder_did,
            request.credential_subject.unwrap_or_default(),
            request.credential_type.as_ref(),
        )
        .await
    }

    /// Issues a credential. Signing is attempted through the agent; without a signature the
    /// unsigned document is stored. The record is inserted last, so a failure leaves nothing
    /// behind, and an id that is already stored is refused rather than overwritten.
    pub async fn issue(
        &self,
        issuer_did: &str,
        holder_did: &str,
        claims: Map<String, Value>,
        credential_type: Option<&CredentialTypeInput>,
    ) -> Result<CredentialRecord, IdentixAPIError> {
        let credential_type =
            CredentialType::resolve(credential_type, &self.config.default_credential_type);
        let now = Utc::now();
        let subject = claims.clone();
        let unsigned = unsigned_credential(
            &self.config,
            issuer_did,
            holder_did,
            claims,
            &credential_type,
            now,
        );

        let mut payload = match self.agent.try_sign(&unsigned).await {
            Some(signed @ Value::Object(_)) => signed,
            Some(_) => {
                warn!("Agent returned a non-object credential, issuing unsigned");
                unsigned
            }
            None => unsigned,
        };
        let credential_id = assign_credential_id(&payload, now);
        let issued_at = stated_issuance_date(&payload).unwrap_or(now);
        if let Value::Object(document) = &mut payload {
            document.insert("id".to_string(), Value::String(credential_id.clone()));
        }

        let record = CredentialRecord {
            credential_id,
            issuer_did: issuer_did.to_string(),
            holder_did: holder_did.to_string(),
            credential_type,
            subject,
            payload,
            status: CredentialStatus::Active,
            issued_at,
            revoked_at: None,
            revocation_reason: None,
        };
        let live = self.stores.select().await;
        live.insert(&record)
            .await
            .map_err(|e| IdentixAPIError::IssuanceFailed(e.to_string()))?;
        info!(
            "Issued credential {} ({}) to {} in {} store",
            record.credential_id,
            record.credential_type,
            record.holder_did,
            live.backend()
        );
        Ok(record)
    }

    pub async fn get(&self, credential_id: &str) -> Result<CredentialRecord, IdentixAPIError> {
        self.stores
            .select()
            .await
            .find_one(&CredentialFilter::ById(credential_id.to_string()))
            .await?
            .ok_or(IdentixAPIError::CredentialNotFound)
    }

    pub async fn list_by_holder(
        &self,
        holder_did: &str,
    ) -> Result<Vec<CredentialRecord>, IdentixAPIError> {
        Ok(self
            .stores
            .select()
            .await
            .find(&CredentialFilter::ByHolder(holder_did.to_string()))
            .await?)
    }

    pub async fn list_by_issuer(
        &self,
        issuer_did: &str,
    ) -> Result<Vec<CredentialRecord>, IdentixAPIError> {
        Ok(self
            .stores
            .select()
            .await
            .find(&CredentialFilter::ByIssuer(issuer_did.to_string()))
            .await?)
    }

    /// Verifies a credential document, or a credential identifier string.
    ///
    /// An agent answer is authoritative. Only when the agent is absent or fails is the stored
    /// status consulted.
    pub async fn verify(&self, input: &Value) -> Result<VerificationResult, IdentixAPIError> {
        let live = self.stores.select().await;
        let credential_id = referenced_credential_id(input).map(str::to_string);
        let lookup = |id: &String| CredentialFilter::ById(id.to_owned());

        let (document, stored) = match input {
            Value::Object(_) => (Some(input.clone()), None),
            _ => {
                let stored = match &credential_id {
                    Some(id) => live.find_one(&lookup(id)).await?,
                    None => None,
                };
                (stored.as_ref().map(|r| r.payload.clone()), Some(stored))
            }
        };
        let issuer = document
            .as_ref()
            .and_then(issuer_of)
            .map(str::to_string);

        if let Some(document) = &document {
            if let Some(answer) = self.agent.try_verify(document).await {
                return Ok(agent_verification(answer, issuer));
            }
        }

        let record = match stored {
            Some(record) => record,
            None => match &credential_id {
                Some(id) => live.find_one(&lookup(id)).await?,
                None => None,
            },
        };
        let issuer = issuer.or_else(|| record.as_ref().map(|r| r.issuer_did.clone()));
        Ok(local_verification(record.as_ref(), issuer))
    }

    /// Revokes a credential. Revoking again re-stamps the time and reason.
    pub async fn revoke(
        &self,
        credential_id: &str,
        reason: Option<&str>,
    ) -> Result<RevocationReceipt, IdentixAPIError> {
        let live = self.stores.select().await;
        let mut record = live
            .find_one(&CredentialFilter::ById(credential_id.to_string()))
            .await?
            .ok_or(IdentixAPIError::CredentialNotFound)?;

        let reason = reason
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .unwrap_or(DEFAULT_REVOCATION_REASON);
        let revoked_at = Utc::now();
        record.revoke(reason, revoked_at);
        live.save(&record).await?;
        info!("Revoked credential {credential_id}: {reason}");

        if let Some(registry) = &self.registry {
            if let Err(e) = registry.revoke(credential_id).await {
                warn!("Revocation registry update failed for {credential_id}: {e}");
            }
        }

        Ok(RevocationReceipt {
            credential_id: record.credential_id,
            status: record.status,
            reason: reason.to_string(),
            revoked_at,
        })
    }

    pub async fn check_revocation_status(
        &self,
        credential_id: &str,
    ) -> Result<RevocationStatus, IdentixAPIError> {
        let record = self.get(credential_id).await?;
        Ok(RevocationStatus::from(&record))
    }
}
