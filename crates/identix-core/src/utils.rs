//! Utils module.
use crate::CREDENTIAL_ID_PREFIX;
use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};

const BASE36_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
/// Length of the random suffix of a synthesized credential identifier.
const CREDENTIAL_ID_SUFFIX_LEN: usize = 9;
const ETHR_DID_PREFIX: &str = "did:ethr:0x";
/// Hex characters in an Ethereum address.
const ETHR_ADDRESS_HEX_LEN: usize = 40;

/// Random lower-case base-36 string of the given length.
pub fn random_base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36_ALPHABET[rng.gen_range(0..BASE36_ALPHABET.len())] as char)
        .collect()
}

/// Synthesizes `cred:<unix millis>:<9 base-36 chars>`.
pub fn synthesize_credential_id(now: DateTime<Utc>) -> String {
    format!(
        "{CREDENTIAL_ID_PREFIX}:{}:{}",
        now.timestamp_millis(),
        random_base36(CREDENTIAL_ID_SUFFIX_LEN)
    )
}

/// A `did:ethr` identifier over 20 random bytes.
pub fn random_ethr_did() -> String {
    let bytes: [u8; 20] = rand::random();
    format!("{ETHR_DID_PREFIX}{}", hex::encode(bytes))
}

/// Deterministic `did:ethr` identifier from a seed phrase (already normalized by the caller).
pub fn ethr_did_from_seed(seed: &str) -> String {
    let digest = hex::encode(Sha256::digest(seed.as_bytes()));
    format!("{ETHR_DID_PREFIX}{}", &digest[..ETHR_ADDRESS_HEX_LEN])
}

/// ISO 8601 timestamp with millisecond precision, as written into credential documents.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
