//! MongoDB backend for credential and DID records.
pub mod config;
pub mod store;

use identix_core::store::StoreError;
use thiserror::Error;

pub use store::MongoStore;

// MongoDB
pub const MONGO_COLLECTION_CREDENTIALS: &str = "credentials";
pub const MONGO_COLLECTION_DIDS: &str = "dids";
pub const MONGO_FILTER_CREDENTIAL_ID: &str = "credentialId";
pub const MONGO_FILTER_HOLDER: &str = "holder";
pub const MONGO_FILTER_ISSUER: &str = "issuer";
pub const MONGO_FILTER_DID: &str = "did";
/// Natural (insertion) order for listings.
pub const MONGO_SORT_FIELD: &str = "_id";

/// An error relating to MongoDB.
#[derive(Error, Debug)]
pub enum MongoStoreError {
    /// Client could not be created from the configured connection string.
    #[error("Error creating MongoDB client: {0}")]
    ErrorCreatingClient(mongodb::error::Error),
    /// A query returned an error.
    #[error("MongoDB query returned error: {0}")]
    QueryReturnedError(mongodb::error::Error),
}

impl From<MongoStoreError> for StoreError {
    fn from(err: MongoStoreError) -> Self {
        StoreError::Backend(err.to_string())
    }
}
