//! API for issuing, verifying and revoking credentials and managing DIDs.
pub mod credential;
pub mod did;
pub mod errors;
pub mod transfer;

pub use credential::{CredentialManager, IssueRequest};
pub use did::DidManager;
pub use errors::IdentixAPIError;
