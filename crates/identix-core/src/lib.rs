//! Core types and traits for the credential lifecycle (storage layer independent).
pub mod agent;
pub mod capability;
pub mod config;
pub mod credential;
pub mod did;
pub mod memory;
pub mod registry;
pub mod store;
pub mod transfer;
pub mod utils;

/// Environment variable name for the Identix config file.
pub const IDENTIX_CONFIG: &str = "IDENTIX_CONFIG";

/// The generic tag carried first in every credential `type` pair.
pub const VERIFIABLE_CREDENTIAL_TYPE: &str = "VerifiableCredential";

/// Prefix of credential identifiers synthesized when neither a proof nor a document `id` is available.
pub const CREDENTIAL_ID_PREFIX: &str = "cred";

/// Revocation reason recorded when the caller supplies none.
pub const DEFAULT_REVOCATION_REASON: &str = "unspecified";

/// Reason reported by the local trust decision for a revoked credential.
pub const REVOKED_REASON: &str = "revoked by issuer";

/// Reason reported when neither the agent nor local storage can decide.
pub const VERIFICATION_NOT_AVAILABLE: &str = "verification not available";

/// Reason reported when the agent rejects a credential without an error message.
pub const VERIFICATION_FAILED: &str = "Verification failed";
