//! DID records held alongside credentials.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity metadata for a holder or issuer DID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidRecord {
    pub did: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller_key_id: Option<String>,
    #[serde(default)]
    pub document: Value,
    pub created_at: DateTime<Utc>,
}

impl DidRecord {
    pub fn new(did: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            did: did.into(),
            method: method.into(),
            controller_key_id: None,
            document: Value::Null,
            created_at: Utc::now(),
        }
    }

    pub fn with_controller_key_id(mut self, kid: Option<String>) -> Self {
        self.controller_key_id = kid;
        self
    }

    pub fn with_document(mut self, document: Value) -> Self {
        self.document = document;
        self
    }
}

/// Partial update of a [`DidRecord`]; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidUpdate {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub controller_key_id: Option<String>,
    #[serde(default)]
    pub document: Option<Value>,
}

impl DidUpdate {
    pub fn apply(self, record: &mut DidRecord) {
        if let Some(method) = self.method {
            record.method = method;
        }
        if let Some(kid) = self.controller_key_id {
            record.controller_key_id = Some(kid);
        }
        if let Some(document) = self.document {
            record.document = document;
        }
    }
}
