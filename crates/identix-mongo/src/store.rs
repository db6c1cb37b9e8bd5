//! Durable record store over MongoDB.
use crate::config::MongoConfig;
use crate::{
    MongoStoreError, MONGO_COLLECTION_CREDENTIALS, MONGO_COLLECTION_DIDS,
    MONGO_FILTER_CREDENTIAL_ID, MONGO_FILTER_DID, MONGO_FILTER_HOLDER, MONGO_FILTER_ISSUER,
    MONGO_SORT_FIELD,
};
use async_trait::async_trait;
use futures::TryStreamExt;
use identix_core::credential::CredentialRecord;
use identix_core::did::DidRecord;
use identix_core::store::{CredentialFilter, CredentialStore, DidStore, RecordStore, StoreError};
use log::debug;
use mongodb::bson::{doc, Document};
use mongodb::error::{Error, ErrorKind, WriteError, WriteFailure};
use mongodb::options::{ClientOptions, FindOptions, ReplaceOptions};
use mongodb::{Client, Collection};
use std::time::Duration;

/// Query document selecting the records a filter names.
pub fn filter_document(filter: &CredentialFilter) -> Document {
    match filter {
        CredentialFilter::ById(id) => doc! { MONGO_FILTER_CREDENTIAL_ID: id.as_str() },
        CredentialFilter::ByHolder(holder) => doc! { MONGO_FILTER_HOLDER: holder.as_str() },
        CredentialFilter::ByIssuer(issuer) => doc! { MONGO_FILTER_ISSUER: issuer.as_str() },
    }
}

/// Server code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

fn is_duplicate_key(error: &Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(WriteError {
            code: DUPLICATE_KEY_CODE,
            ..
        }))
    )
}

fn upsert() -> ReplaceOptions {
    ReplaceOptions::builder().upsert(true).build()
}

/// Store backed by the `credentials` and `dids` collections of one database.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    database: String,
}

impl MongoStore {
    /// Constructs the client. No connection is made until the first operation.
    pub async fn new(config: &MongoConfig) -> Result<Self, MongoStoreError> {
        let mut client_options = ClientOptions::parse(&config.connection_string)
            .await
            .map_err(MongoStoreError::ErrorCreatingClient)?;
        client_options.server_selection_timeout =
            Some(Duration::from_millis(config.server_selection_timeout_ms));
        let client =
            Client::with_options(client_options).map_err(MongoStoreError::ErrorCreatingClient)?;
        Ok(Self {
            client,
            database: config.database.to_owned(),
        })
    }

    fn credentials(&self) -> Collection<CredentialRecord> {
        self.client
            .database(&self.database)
            .collection(MONGO_COLLECTION_CREDENTIALS)
    }

    fn dids(&self) -> Collection<DidRecord> {
        self.client
            .database(&self.database)
            .collection(MONGO_COLLECTION_DIDS)
    }
}

#[async_trait]
impl CredentialStore for MongoStore {
    /// Checks for the id before inserting. A unique index on `credentialId`, where one exists,
    /// also closes the gap between the check and the insert.
    async fn insert(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        let duplicate = || StoreError::DuplicateCredential(record.credential_id.clone());
        let filter = CredentialFilter::ById(record.credential_id.clone());
        if self.find_one(&filter).await?.is_some() {
            return Err(duplicate());
        }
        match self.credentials().insert_one(record, None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(duplicate()),
            Err(e) => Err(MongoStoreError::QueryReturnedError(e).into()),
        }
    }

    async fn save(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        self.credentials()
            .replace_one(
                doc! { MONGO_FILTER_CREDENTIAL_ID: record.credential_id.as_str() },
                record,
                upsert(),
            )
            .await
            .map_err(MongoStoreError::QueryReturnedError)?;
        Ok(())
    }

    async fn find_one(
        &self,
        filter: &CredentialFilter,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self
            .credentials()
            .find_one(filter_document(filter), None)
            .await
            .map_err(MongoStoreError::QueryReturnedError)?)
    }

    async fn find(&self, filter: &CredentialFilter) -> Result<Vec<CredentialRecord>, StoreError> {
        let options = FindOptions::builder()
            .sort(doc! { MONGO_SORT_FIELD: 1 })
            .build();
        let cursor = self
            .credentials()
            .find(filter_document(filter), options)
            .await
            .map_err(MongoStoreError::QueryReturnedError)?;
        Ok(cursor
            .try_collect::<Vec<CredentialRecord>>()
            .await
            .map_err(MongoStoreError::QueryReturnedError)?)
    }
}

#[async_trait]
impl DidStore for MongoStore {
    async fn save_did(&self, record: &DidRecord) -> Result<(), StoreError> {
        self.dids()
            .replace_one(
                doc! { MONGO_FILTER_DID: record.did.as_str() },
                record,
                upsert(),
            )
            .await
            .map_err(MongoStoreError::QueryReturnedError)?;
        Ok(())
    }

    async fn find_did(&self, did: &str) -> Result<Option<DidRecord>, StoreError> {
        Ok(self
            .dids()
            .find_one(doc! { MONGO_FILTER_DID: did }, None)
            .await
            .map_err(MongoStoreError::QueryReturnedError)?)
    }

    async fn delete_did(&self, did: &str) -> Result<bool, StoreError> {
        let result = self
            .dids()
            .delete_one(doc! { MONGO_FILTER_DID: did }, None)
            .await
            .map_err(MongoStoreError::QueryReturnedError)?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl RecordStore for MongoStore {
    /// Pings the server, bounded by the configured server selection timeout.
    async fn is_available(&self) -> bool {
        match self
            .client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                debug!("MongoDB ping failed: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use identix_core::credential::{CredentialStatus, CredentialType};
    use serde_json::json;

    #[test]
    fn test_filter_document() {
        assert_eq!(
            filter_document(&CredentialFilter::ById("cred:1:a".to_string())),
            doc! { "credentialId": "cred:1:a" }
        );
        assert_eq!(
            filter_document(&CredentialFilter::ByHolder("did:example:h1".to_string())),
            doc! { "holder": "did:example:h1" }
        );
        assert_eq!(
            filter_document(&CredentialFilter::ByIssuer("did:example:i1".to_string())),
            doc! { "issuer": "did:example:i1" }
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let config = MongoConfig {
            connection_string: "mongodb://127.0.0.1:1/".to_string(),
            server_selection_timeout_ms: 100,
            ..Default::default()
        };
        let store = MongoStore::new(&config).await.unwrap();
        assert!(!store.is_available().await);
    }

    #[tokio::test]
    #[ignore = "Integration test requires MongoDB"]
    async fn test_round_trip() {
        let store = MongoStore::new(&MongoConfig {
            database: "identix-test".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
        assert!(store.is_available().await);

        let id = identix_core::utils::synthesize_credential_id(Utc::now());
        let mut record = CredentialRecord {
            credential_id: id.clone(),
            issuer_did: "did:example:i1".to_string(),
            holder_did: "did:example:h1".to_string(),
            credential_type: CredentialType::new("EducationalCredential"),
            subject: json!({"name": "José María"}).as_object().unwrap().to_owned(),
            payload: json!({ "id": id }),
            status: CredentialStatus::Active,
            issued_at: Utc::now(),
            revoked_at: None,
            revocation_reason: None,
        };
        store.insert(&record).await.unwrap();
        assert!(matches!(
            store.insert(&record).await,
            Err(StoreError::DuplicateCredential(_))
        ));
        record.revoke("lost", Utc::now());
        store.save(&record).await.unwrap();

        let filter = CredentialFilter::ById(id);
        let found = store.find_one(&filter).await.unwrap().unwrap();
        assert_eq!(found.status, CredentialStatus::Revoked);
        assert_eq!(found.subject, record.subject);
        assert_eq!(store.find(&filter).await.unwrap().len(), 1);
    }
}
