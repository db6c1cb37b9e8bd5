//! Transient in-process storage backend.
use crate::credential::CredentialRecord;
use crate::did::DidRecord;
use crate::store::{CredentialFilter, CredentialStore, DidStore, RecordStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Credential records in insertion order, indexed by `credential_id`.
#[derive(Default)]
struct CredentialTable {
    records: Vec<CredentialRecord>,
    index: HashMap<String, usize>,
}

impl CredentialTable {
    fn insert(&mut self, record: &CredentialRecord) -> Result<(), StoreError> {
        if self.index.contains_key(&record.credential_id) {
            return Err(StoreError::DuplicateCredential(
                record.credential_id.clone(),
            ));
        }
        self.upsert(record);
        Ok(())
    }

    fn upsert(&mut self, record: &CredentialRecord) {
        match self.index.get(&record.credential_id) {
            Some(&position) => self.records[position] = record.clone(),
            None => {
                self.index
                    .insert(record.credential_id.clone(), self.records.len());
                self.records.push(record.clone());
            }
        }
    }
}

/// Storage backend living only for the process lifetime.
///
/// Each logical map has its own lock; holder and issuer queries are linear scans.
#[derive(Default)]
pub struct MemoryStore {
    credentials: Mutex<CredentialTable>,
    dids: Mutex<HashMap<String, DidRecord>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|e| StoreError::LockPoisoned(e.to_string()))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of credential records held.
    pub fn credential_count(&self) -> usize {
        lock(&self.credentials)
            .map(|table| table.records.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn insert(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        lock(&self.credentials)?.insert(record)
    }

    async fn save(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        lock(&self.credentials)?.upsert(record);
        Ok(())
    }

    async fn find_one(
        &self,
        filter: &CredentialFilter,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let table = lock(&self.credentials)?;
        if let CredentialFilter::ById(id) = filter {
            return Ok(table
                .index
                .get(id)
                .map(|&position| table.records[position].clone()));
        }
        Ok(table
            .records
            .iter()
            .find(|record| filter.matches(record))
            .cloned())
    }

    async fn find(&self, filter: &CredentialFilter) -> Result<Vec<CredentialRecord>, StoreError> {
        Ok(lock(&self.credentials)?
            .records
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DidStore for MemoryStore {
    async fn save_did(&self, record: &DidRecord) -> Result<(), StoreError> {
        lock(&self.dids)?.insert(record.did.clone(), record.clone());
        Ok(())
    }

    async fn find_did(&self, did: &str) -> Result<Option<DidRecord>, StoreError> {
        Ok(lock(&self.dids)?.get(did).cloned())
    }

    async fn delete_did(&self, did: &str) -> Result<bool, StoreError> {
        Ok(lock(&self.dids)?.remove(did).is_some())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn is_available(&self) -> bool {
        true
    }
}
