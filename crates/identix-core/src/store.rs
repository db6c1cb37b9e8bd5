//! Storage traits shared by the durable and transient backends, and per-call backend selection.
use crate::capability::Capability;
use crate::credential::CredentialRecord;
use crate::did::DidRecord;
use async_trait::async_trait;
use log::debug;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use thiserror::Error;

/// An error relating to a storage backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A lock guarding in-process state was poisoned.
    #[error("Store lock poisoned: {0}")]
    LockPoisoned(String),
    /// The backend rejected or failed a query.
    #[error("Store backend error: {0}")]
    Backend(String),
    /// An insert named a `credential_id` that is already stored.
    #[error("Credential {0} already exists.")]
    DuplicateCredential(String),
}

/// Predicate over credential records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialFilter {
    ById(String),
    ByHolder(String),
    ByIssuer(String),
}

impl CredentialFilter {
    pub fn matches(&self, record: &CredentialRecord) -> bool {
        match self {
            CredentialFilter::ById(id) => &record.credential_id == id,
            CredentialFilter::ByHolder(holder) => &record.holder_did == holder,
            CredentialFilter::ByIssuer(issuer) => &record.issuer_did == issuer,
        }
    }
}

/// Persistence of credential records, keyed by `credential_id`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Adds a new record, failing with [`StoreError::DuplicateCredential`] if the id is taken.
    async fn insert(&self, record: &CredentialRecord) -> Result<(), StoreError>;
    /// Inserts or replaces by `credential_id`.
    async fn save(&self, record: &CredentialRecord) -> Result<(), StoreError>;
    async fn find_one(
        &self,
        filter: &CredentialFilter,
    ) -> Result<Option<CredentialRecord>, StoreError>;
    /// All matching records in insertion order.
    async fn find(&self, filter: &CredentialFilter) -> Result<Vec<CredentialRecord>, StoreError>;
}

/// Persistence of DID records, keyed by `did`.
#[async_trait]
pub trait DidStore: Send + Sync {
    async fn save_did(&self, record: &DidRecord) -> Result<(), StoreError>;
    async fn find_did(&self, did: &str) -> Result<Option<DidRecord>, StoreError>;
    /// Returns whether a record was removed.
    async fn delete_did(&self, did: &str) -> Result<bool, StoreError>;
}

/// A complete storage backend with a liveness probe.
#[async_trait]
pub trait RecordStore: CredentialStore + DidStore {
    async fn is_available(&self) -> bool;
}

/// Which of the two backends served an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Durable,
    Transient,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Durable => write!(f, "durable"),
            Backend::Transient => write!(f, "transient"),
        }
    }
}

/// The backend chosen for one operation. Every read and write of that operation goes through it.
#[derive(Clone)]
pub struct LiveStore {
    backend: Backend,
    store: Arc<dyn RecordStore>,
}

impl LiveStore {
    pub fn backend(&self) -> Backend {
        self.backend
    }
}

impl Deref for LiveStore {
    type Target = dyn RecordStore;

    fn deref(&self) -> &Self::Target {
        self.store.as_ref()
    }
}

/// Holds both backends and picks one per call.
///
/// The durable backend is probed afresh on every [`StoreSelector::select`], so a backend that
/// comes back up is used by the next operation. Records are never copied between backends.
#[derive(Clone)]
pub struct StoreSelector {
    durable: Option<Arc<dyn RecordStore>>,
    transient: Arc<dyn RecordStore>,
}

impl StoreSelector {
    pub fn new(
        durable: Option<Arc<dyn RecordStore>>,
        transient: Arc<dyn RecordStore>,
    ) -> Self {
        Self { durable, transient }
    }

    /// A selector with no durable backend configured.
    pub fn transient_only(transient: Arc<dyn RecordStore>) -> Self {
        Self::new(None, transient)
    }

    /// Probes the durable backend. Not configured and unreachable are treated alike.
    pub async fn durable_capability(&self) -> Capability<Arc<dyn RecordStore>> {
        match &self.durable {
            Some(durable) if durable.is_available().await => {
                Capability::Available(Arc::clone(durable))
            }
            _ => Capability::Unavailable,
        }
    }

    pub async fn select(&self) -> LiveStore {
        let live = match self.durable_capability().await {
            Capability::Available(store) => LiveStore {
                backend: Backend::Durable,
                store,
            },
            Capability::Unavailable => LiveStore {
                backend: Backend::Transient,
                store: Arc::clone(&self.transient),
            },
        };
        debug!("Using {} store", live.backend);
        live
    }
}
