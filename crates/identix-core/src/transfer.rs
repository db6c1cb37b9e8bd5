//! Lossless hand-off of a credential payload through a URL fragment.
//!
//! The fragment is `#` followed by standard Base64 of the payload's UTF-8 JSON text. Decoding
//! tolerates a leading `#` being absent, a fragment that was percent-encoded once more on the way,
//! and legacy Latin-1 fragments.
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Fragment marker separating the claim URL from the encoded payload.
pub const FRAGMENT_MARKER: char = '#';

/// Accepts fragments with or without padding.
const FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// An error relating to encoding or claiming a transferred credential.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Failed to serialize credential: {0}")]
    Serialize(serde_json::Error),
    #[error("Malformed credential fragment: {0}")]
    Malformed(String),
    #[error("Invalid credential format.")]
    InvalidCredential,
}

impl From<serde_json::Error> for TransferError {
    fn from(err: serde_json::Error) -> Self {
        TransferError::Serialize(err)
    }
}

/// Encodes a payload as a URL fragment, including the leading `#`.
pub fn encode<T: Serialize + ?Sized>(payload: &T) -> Result<String, TransferError> {
    let json = serde_json::to_string(payload)?;
    Ok(format!("{FRAGMENT_MARKER}{}", STANDARD.encode(json.as_bytes())))
}

/// Decodes a fragment produced by [`encode`].
pub fn decode<T: DeserializeOwned>(fragment: &str) -> Result<T, TransferError> {
    let text = fragment.trim();
    let text = text.strip_prefix(FRAGMENT_MARKER).unwrap_or(text);
    let text = if text.contains('%') {
        urlencoding::decode(text)
            .map_err(|e| TransferError::Malformed(e.to_string()))?
            .into_owned()
    } else {
        text.to_string()
    };
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();

    let bytes = FORGIVING
        .decode(compact.as_bytes())
        .map_err(|e| TransferError::Malformed(e.to_string()))?;
    let json = match String::from_utf8(bytes) {
        Ok(json) => json,
        Err(e) => {
            debug!("Fragment is not UTF-8, reading as Latin-1");
            e.into_bytes().into_iter().map(char::from).collect()
        }
    };
    serde_json::from_str(&json).map_err(|e| TransferError::Malformed(e.to_string()))
}

/// Builds `<origin><claim_path>#<fragment>` for handing a payload to a wallet.
pub fn claim_url<T: Serialize + ?Sized>(
    origin: &str,
    claim_path: &str,
    payload: &T,
) -> Result<String, TransferError> {
    Ok(format!(
        "{}{}{}",
        origin.trim_end_matches('/'),
        claim_path,
        encode(payload)?
    ))
}

/// Text after the first `#` of a URL, if any.
pub fn fragment_of(url: &str) -> Option<&str> {
    url.split_once(FRAGMENT_MARKER).map(|(_, fragment)| fragment)
}

/// Decodes a fragment and checks the wallet acceptance rule: an object carrying `id` or
/// `credentialId`.
pub fn claim(fragment: &str) -> Result<Value, TransferError> {
    let payload: Value = decode(fragment)?;
    let identified = ["id", "credentialId"].iter().any(|key| {
        payload
            .get(key)
            .and_then(Value::as_str)
            .map_or(false, |id| !id.is_empty())
    });
    if identified {
        Ok(payload)
    } else {
        Err(TransferError::InvalidCredential)
    }
}
