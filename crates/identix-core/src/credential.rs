//! Credential records, status and verification outcomes.
use crate::{REVOKED_REASON, VERIFIABLE_CREDENTIAL_TYPE, VERIFICATION_NOT_AVAILABLE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Lifecycle status of a credential. The only transition driven by this crate is
/// `Active -> Revoked`; `Expired` is reserved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
    #[default]
    Active,
    Revoked,
    Expired,
}

impl fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CredentialStatus::Active => "active",
            CredentialStatus::Revoked => "revoked",
            CredentialStatus::Expired => "expired",
        };
        write!(f, "{label}")
    }
}

/// The shapes in which a caller may name a credential type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CredentialTypeInput {
    /// A single specific label, e.g. `"EducationalCredential"`.
    Label(String),
    /// An ordered list, conventionally `["VerifiableCredential", "<specific type>"]`.
    Labels(Vec<String>),
}

/// A resolved, specific credential type label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialType(String);

impl CredentialType {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Resolves caller input to a single label. For a list the second entry is preferred (the
    /// first being the generic tag), then the first; blank or missing input gives `default_label`.
    pub fn resolve(input: Option<&CredentialTypeInput>, default_label: &str) -> Self {
        let label = match input {
            Some(CredentialTypeInput::Label(label)) => Some(label.as_str()),
            Some(CredentialTypeInput::Labels(labels)) => labels
                .get(1)
                .filter(|label| !label.trim().is_empty())
                .or_else(|| labels.first())
                .map(String::as_str),
            None => None,
        };
        match label.map(str::trim) {
            Some(label) if !label.is_empty() => Self(label.to_string()),
            _ => Self(default_label.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `[generic, specific]` pair written into a credential document.
    pub fn type_pair(&self) -> [&str; 2] {
        [VERIFIABLE_CREDENTIAL_TYPE, &self.0]
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The stored unit of truth for an issued credential.
///
/// Field names on the wire match the persisted collection layout (`issuer`, `holder`,
/// `credential`, ...) so that records written by other deployments can be read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub credential_id: String,
    #[serde(rename = "issuer")]
    pub issuer_did: String,
    #[serde(rename = "holder")]
    pub holder_did: String,
    #[serde(rename = "type")]
    pub credential_type: CredentialType,
    /// Claims as supplied by the caller. The holder `id` lives only in `payload`.
    #[serde(rename = "credentialSubject", default)]
    pub subject: Map<String, Value>,
    /// Signed or unsigned credential document. Its `id` always equals `credential_id`.
    #[serde(rename = "credential")]
    pub payload: Value,
    #[serde(default)]
    pub status: CredentialStatus,
    #[serde(rename = "issuanceDate")]
    pub issued_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_reason: Option<String>,
}

impl CredentialRecord {
    pub fn is_revoked(&self) -> bool {
        self.status == CredentialStatus::Revoked
    }

    /// Marks the record revoked. Revoking an already revoked record re-stamps the time and reason.
    pub fn revoke(&mut self, reason: &str, at: DateTime<Utc>) {
        self.status = CredentialStatus::Revoked;
        self.revocation_reason = Some(reason.to_string());
        self.revoked_at = Some(at);
    }

    /// The payload as handed to callers: the credential document with `id`, `status` and the
    /// resolved `type` label merged in.
    pub fn to_document(&self) -> Value {
        let mut document = match &self.payload {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        document.insert("id".to_string(), Value::String(self.credential_id.clone()));
        document.insert("status".to_string(), Value::String(self.status.to_string()));
        document.insert(
            "type".to_string(),
            Value::String(self.credential_type.to_string()),
        );
        Value::Object(document)
    }
}

/// Outcome of a verification query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub verified: bool,
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CredentialStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
}

impl VerificationResult {
    /// Local trust decision from a stored record, used when no agent can verify.
    pub fn from_record(record: Option<&CredentialRecord>) -> Self {
        match record {
            Some(record) if record.is_revoked() => Self {
                verified: false,
                reason: Some(REVOKED_REASON.to_string()),
                status: Some(record.status),
                issuer: None,
            },
            Some(record) => Self {
                verified: true,
                reason: None,
                status: Some(record.status),
                issuer: None,
            },
            None => Self {
                verified: false,
                reason: Some(VERIFICATION_NOT_AVAILABLE.to_string()),
                status: None,
                issuer: None,
            },
        }
    }

    pub fn with_issuer(mut self, issuer: Option<String>) -> Self {
        self.issuer = issuer;
        self
    }
}

/// Returned by a successful revocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationReceipt {
    pub credential_id: String,
    pub status: CredentialStatus,
    pub reason: String,
    pub revoked_at: DateTime<Utc>,
}

/// Snapshot of a credential's revocation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationStatus {
    pub credential_id: String,
    pub status: CredentialStatus,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revocation_reason: Option<String>,
}

impl From<&CredentialRecord> for RevocationStatus {
    fn from(record: &CredentialRecord) -> Self {
        Self {
            credential_id: record.credential_id.clone(),
            status: record.status,
            revoked: record.is_revoked(),
            revoked_at: record.revoked_at,
            revocation_reason: record.revocation_reason.clone(),
        }
    }
}

/// Credential identifier referenced by a verification input: a bare string, or the `id` (then
/// `credentialId`) field of a credential document.
pub fn referenced_credential_id(input: &Value) -> Option<&str> {
    match input {
        Value::String(id) => Some(id.as_str()),
        Value::Object(map) => map
            .get("id")
            .and_then(Value::as_str)
            .or_else(|| map.get("credentialId").and_then(Value::as_str)),
        _ => None,
    }
    .filter(|id| !id.is_empty())
}

/// Issuer DID of a credential document, whether `issuer` is a string or an `{id}` object.
pub fn issuer_of(document: &Value) -> Option<&str> {
    match document.get("issuer")? {
        Value::String(issuer) => Some(issuer.as_str()),
        Value::Object(issuer) => issuer.get("id").and_then(Value::as_str),
        _ => None,
    }
}
