//! DID management with graceful degradation when the agent or the durable store is missing.
use crate::errors::IdentixAPIError;
use identix_core::agent::AgentAdapter;
use identix_core::config::{core_config, CoreConfig};
use identix_core::did::{DidRecord, DidUpdate};
use identix_core::store::{Backend, StoreSelector};
use identix_core::utils::{ethr_did_from_seed, random_ethr_did};
use log::info;
use serde_json::{json, Value};

/// Method recorded for identifiers synthesized locally.
const FALLBACK_DID_METHOD: &str = "ethr";

#[derive(Clone)]
pub struct DidManager {
    stores: StoreSelector,
    agent: AgentAdapter,
    config: CoreConfig,
}

impl DidManager {
    pub fn new(stores: StoreSelector, agent: AgentAdapter) -> Self {
        Self {
            stores,
            agent,
            config: core_config().clone(),
        }
    }

    pub fn with_config(mut self, config: CoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Creates a DID through the agent, or synthesizes a random `did:ethr` when the agent cannot.
    /// Returns the identifier object (`did`, `keys`, `services`, ...).
    pub async fn create_did(
        &self,
        method: Option<&str>,
        options: &Value,
    ) -> Result<Value, IdentixAPIError> {
        let method = method.unwrap_or(&self.config.default_did_method);
        let created = self
            .agent
            .try_create_identifier(method, options)
            .await
            .and_then(|identifier| {
                let did = identifier.get("did")?.as_str()?.to_string();
                Some((did, identifier))
            });

        let (record, identifier) = match created {
            Some((did, identifier)) => {
                let kid = identifier
                    .pointer("/keys/0/kid")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let record = DidRecord::new(did, method)
                    .with_controller_key_id(kid)
                    .with_document(identifier.clone());
                (record, identifier)
            }
            None => {
                let did = random_ethr_did();
                let identifier = json!({ "did": did, "keys": [], "services": [] });
                let record =
                    DidRecord::new(did, FALLBACK_DID_METHOD).with_document(identifier.clone());
                (record, identifier)
            }
        };

        let live = self.stores.select().await;
        live.save_did(&record).await?;
        info!("Created {} in {} store", record.did, live.backend());
        Ok(identifier)
    }

    /// Derives the DID for a seed phrase. Deterministic, no storage access.
    pub fn recover_did(&self, seed_phrase: &str) -> Result<String, IdentixAPIError> {
        let seed = seed_phrase.trim().to_lowercase();
        if seed.is_empty() {
            return Err(IdentixAPIError::SeedPhraseRequired);
        }
        Ok(ethr_did_from_seed(&seed))
    }

    /// Resolves through the agent, falling back to the bare document `{ "id": did }`.
    pub async fn resolve_did(&self, did: &str) -> Value {
        match self.agent.try_resolve_did(did).await {
            Some(document) => document,
            None => json!({ "id": did }),
        }
    }

    /// Applies an update. An unknown DID is an error against the durable store and a no-op
    /// (`Ok(None)`) against the transient one.
    pub async fn update_did(
        &self,
        did: &str,
        update: DidUpdate,
    ) -> Result<Option<DidRecord>, IdentixAPIError> {
        let live = self.stores.select().await;
        match live.find_did(did).await? {
            Some(mut record) => {
                update.apply(&mut record);
                live.save_did(&record).await?;
                Ok(Some(record))
            }
            None => match live.backend() {
                Backend::Durable => Err(IdentixAPIError::DidNotFound),
                Backend::Transient => Ok(None),
            },
        }
    }

    /// Deletes from the agent (best effort) and from the live store. Unknown DIDs are not an error.
    pub async fn delete_did(&self, did: &str) -> Result<(), IdentixAPIError> {
        self.agent.try_delete_identifier(did).await;
        let live = self.stores.select().await;
        if live.delete_did(did).await? {
            info!("Deleted {did} from {} store", live.backend());
        }
        Ok(())
    }

    /// Stored DID record, if any, in the live store.
    pub async fn get_did(&self, did: &str) -> Result<Option<DidRecord>, IdentixAPIError> {
        Ok(self.stores.select().await.find_did(did).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use identix_core::agent::{AgentError, AgentVerification, CredentialAgent};
    use identix_core::credential::CredentialRecord;
    use identix_core::memory::MemoryStore;
    use identix_core::store::{CredentialFilter, CredentialStore, DidStore, RecordStore, StoreError};
    use mockall::mock;
    use std::sync::Arc;

    mock! {
        Agent {}
        #[async_trait]
        impl CredentialAgent for Agent {
            async fn sign_credential(&self, credential: &Value) -> Result<Value, AgentError>;
            async fn verify_credential(&self, credential: &Value) -> Result<AgentVerification, AgentError>;
            async fn create_identifier(&self, method: &str, options: &Value) -> Result<Value, AgentError>;
            async fn resolve_did(&self, did: &str) -> Result<Value, AgentError>;
            async fn delete_identifier(&self, did: &str) -> Result<(), AgentError>;
        }
    }

    /// Always-available store standing in for the durable backend.
    struct Durable(MemoryStore);

    #[async_trait]
    impl CredentialStore for Durable {
        async fn insert(&self, record: &CredentialRecord) -> Result<(), StoreError> {
            self.0.insert(record).await
        }
        async fn save(&self, record: &CredentialRecord) -> Result<(), StoreError> {
            self.0.save(record).await
        }
        async fn find_one(
            &self,
            filter: &CredentialFilter,
        ) -> Result<Option<CredentialRecord>, StoreError> {
            self.0.find_one(filter).await
        }
        async fn find(
            &self,
            filter: &CredentialFilter,
        ) -> Result<Vec<CredentialRecord>, StoreError> {
            self.0.find(filter).await
        }
    }

    #[async_trait]
    impl DidStore for Durable {
        async fn save_did(&self, record: &DidRecord) -> Result<(), StoreError> {
            self.0.save_did(record).await
        }
        async fn find_did(&self, did: &str) -> Result<Option<DidRecord>, StoreError> {
            self.0.find_did(did).await
        }
        async fn delete_did(&self, did: &str) -> Result<bool, StoreError> {
            self.0.delete_did(did).await
        }
    }

    #[async_trait]
    impl RecordStore for Durable {
        async fn is_available(&self) -> bool {
            true
        }
    }

    fn transient_manager(agent: AgentAdapter) -> DidManager {
        DidManager::new(
            StoreSelector::transient_only(Arc::new(MemoryStore::new())),
            agent,
        )
        .with_config(CoreConfig::default())
    }

    fn durable_manager() -> DidManager {
        let durable: Arc<dyn RecordStore> = Arc::new(Durable(MemoryStore::new()));
        DidManager::new(
            StoreSelector::new(Some(durable), Arc::new(MemoryStore::new())),
            AgentAdapter::absent(),
        )
        .with_config(CoreConfig::default())
    }

    #[tokio::test]
    async fn test_create_without_agent() {
        let manager = transient_manager(AgentAdapter::absent());
        let identifier = manager.create_did(None, &json!({})).await.unwrap();
        let did = identifier["did"].as_str().unwrap();
        assert!(did.starts_with("did:ethr:0x"));
        assert_eq!(identifier["keys"], json!([]));

        let record = manager.get_did(did).await.unwrap().unwrap();
        assert_eq!(record.method, "ethr");
        assert_eq!(record.controller_key_id, None);
    }

    #[tokio::test]
    async fn test_create_with_agent() {
        let mut agent = MockAgent::new();
        agent
            .expect_create_identifier()
            .withf(|method, _| method == "key")
            .returning(|_, _| {
                Ok(json!({
                    "did": "did:key:z6Mk",
                    "keys": [{ "kid": "kid-1", "type": "Ed25519" }],
                    "services": []
                }))
            });
        let manager = transient_manager(AgentAdapter::new(Arc::new(agent)));
        let identifier = manager.create_did(Some("key"), &json!({})).await.unwrap();
        assert_eq!(identifier["did"], "did:key:z6Mk");

        let record = manager.get_did("did:key:z6Mk").await.unwrap().unwrap();
        assert_eq!(record.method, "key");
        assert_eq!(record.controller_key_id.as_deref(), Some("kid-1"));
    }

    #[test]
    fn test_recover_did() {
        let manager = transient_manager(AgentAdapter::absent());
        let did = manager.recover_did("  Abandon Ability Able ").unwrap();
        assert_eq!(did, manager.recover_did("abandon ability able").unwrap());
        assert_eq!(did.len(), "did:ethr:0x".len() + 40);
        assert!(matches!(
            manager.recover_did("   "),
            Err(IdentixAPIError::SeedPhraseRequired)
        ));
    }

    #[tokio::test]
    async fn test_resolve_fallback() {
        let mut agent = MockAgent::new();
        agent
            .expect_resolve_did()
            .returning(|_| Err(AgentError::Failed("no resolver".to_string())));
        let manager = transient_manager(AgentAdapter::new(Arc::new(agent)));
        assert_eq!(
            manager.resolve_did("did:example:i1").await,
            json!({ "id": "did:example:i1" })
        );
        let manager = transient_manager(AgentAdapter::absent());
        assert_eq!(
            manager.resolve_did("did:example:i1").await,
            json!({ "id": "did:example:i1" })
        );
    }

    #[tokio::test]
    async fn test_update_transient_unknown_is_noop() {
        let manager = transient_manager(AgentAdapter::absent());
        let updated = manager
            .update_did("did:ethr:0xunknown", DidUpdate::default())
            .await
            .unwrap();
        assert_eq!(updated, None);
    }

    #[tokio::test]
    async fn test_update_durable() {
        let manager = durable_manager();
        assert!(matches!(
            manager
                .update_did("did:ethr:0xunknown", DidUpdate::default())
                .await,
            Err(IdentixAPIError::DidNotFound)
        ));

        let identifier = manager.create_did(None, &json!({})).await.unwrap();
        let did = identifier["did"].as_str().unwrap();
        let update = DidUpdate {
            controller_key_id: Some("kid-2".to_string()),
            ..Default::default()
        };
        let updated = manager.update_did(did, update).await.unwrap().unwrap();
        assert_eq!(updated.controller_key_id.as_deref(), Some("kid-2"));
        assert_eq!(manager.get_did(did).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_delete() {
        let mut agent = MockAgent::new();
        agent
            .expect_create_identifier()
            .returning(|_, _| Err(AgentError::Unsupported("create_identifier")));
        agent
            .expect_delete_identifier()
            .times(2)
            .returning(|_| Err(AgentError::Failed("unknown identifier".to_string())));
        let manager = transient_manager(AgentAdapter::new(Arc::new(agent)));
        let identifier = manager.create_did(None, &json!({})).await.unwrap();
        let did = identifier["did"].as_str().unwrap();

        manager.delete_did(did).await.unwrap();
        assert_eq!(manager.get_did(did).await.unwrap(), None);
        manager.delete_did(did).await.unwrap();
    }
}
