//! Identix library.
pub use identix_api;
pub use identix_core;
pub use identix_mongo;
