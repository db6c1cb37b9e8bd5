//! Identix core configuration types and utilities.
use crate::IDENTIX_CONFIG;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fs;

const DEFAULT_CREDENTIAL_TYPE: &str = "CustomCredential";
const DEFAULT_CREDENTIAL_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
const DEFAULT_DID_METHOD: &str = "ethr";
const DEFAULT_WALLET_URL: &str = "http://localhost:3001";
const DEFAULT_WALLET_CLAIM_PATH: &str = "/claim";

lazy_static! {
    /// Lazy static reference to core configuration loaded from the file named by `IDENTIX_CONFIG`,
    /// or the defaults when the variable is unset.
    pub static ref CORE_CONFIG: CoreConfig = match std::env::var(IDENTIX_CONFIG) {
        Ok(path) => parse_toml(
            &fs::read_to_string(path).expect("Error reading identix config file")
        ),
        Err(_) => CoreConfig::default(),
    };
}

/// Parses and returns core configuration.
fn parse_toml(toml_str: &str) -> CoreConfig {
    toml::from_str::<Config>(toml_str)
        .expect("Error parsing identix config file")
        .core
}

/// Gets `identix-core` configuration variables.
pub fn core_config() -> &'static CoreConfig {
    &CORE_CONFIG
}

/// Configuration variables for `identix-core` crate.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
#[serde(default)]
pub struct CoreConfig {
    /// Credential type label used when the issuer does not supply one.
    pub default_credential_type: String,
    /// JSON-LD context written into every issued credential.
    pub credential_context: String,
    /// DID method used when creating a DID without an explicit method.
    pub default_did_method: String,
    /// Origin of the wallet application receiving claim links.
    pub wallet_url: String,
    /// Path of the wallet's claim page.
    pub wallet_claim_path: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            default_credential_type: DEFAULT_CREDENTIAL_TYPE.to_string(),
            credential_context: DEFAULT_CREDENTIAL_CONTEXT.to_string(),
            default_did_method: DEFAULT_DID_METHOD.to_string(),
            wallet_url: DEFAULT_WALLET_URL.to_string(),
            wallet_claim_path: DEFAULT_WALLET_CLAIM_PATH.to_string(),
        }
    }
}

/// Wrapper struct for parsing the `core` table.
#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct Config {
    /// Core configuration data.
    #[serde(default)]
    core: CoreConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_deserialize() {
        let config_string = r##"
        [core]
        default_credential_type = "EducationalCredential"
        wallet_url = "https://wallet.example.org"

        [non_core]
        key = "value"
        "##;

        let config: CoreConfig = parse_toml(config_string);

        assert_eq!(
            config,
            CoreConfig {
                default_credential_type: "EducationalCredential".to_string(),
                wallet_url: "https://wallet.example.org".to_string(),
                ..CoreConfig::default()
            }
        );
    }

    #[test]
    fn test_missing_core_table() {
        let config: CoreConfig = parse_toml("[mongo]\ndatabase = \"identix\"\n");
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn test_read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[core]\ndefault_did_method = \"key\"").unwrap();
        let config = parse_toml(&fs::read_to_string(file.path()).unwrap());
        assert_eq!(config.default_did_method, "key");
        assert_eq!(config.wallet_claim_path, DEFAULT_WALLET_CLAIM_PATH);
    }
}
