//! MongoDB configuration types and utilities.
use identix_core::IDENTIX_CONFIG;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fs;

lazy_static! {
    /// Lazy static reference to MongoDB configuration loaded from the file named by `IDENTIX_CONFIG`.
    pub static ref MONGO_CONFIG: MongoConfig = match std::env::var(IDENTIX_CONFIG) {
        Ok(path) => parse_toml(
            &fs::read_to_string(path).expect("Error reading identix config file")
        ),
        Err(_) => MongoConfig::default(),
    };
}

/// Parses and maps the `mongo` table.
fn parse_toml(toml_str: &str) -> MongoConfig {
    toml::from_str::<Config>(toml_str)
        .expect("Error parsing identix config file")
        .mongo
}

/// Gets `identix-mongo` configuration variables.
pub fn mongo_config() -> &'static MongoConfig {
    &MONGO_CONFIG
}

/// Configuration variables for `identix-mongo` crate.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
#[serde(default)]
pub struct MongoConfig {
    /// MongoDB endpoint.
    pub connection_string: String,
    /// Database holding the `credentials` and `dids` collections.
    pub database: String,
    /// Upper bound on server selection, and so on the liveness probe.
    pub server_selection_timeout_ms: u64,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            connection_string: "mongodb://localhost:27017/".to_string(),
            database: "identix".to_string(),
            server_selection_timeout_ms: 500,
        }
    }
}

/// Wrapper struct for parsing the `mongo` table.
#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct Config {
    #[serde(default)]
    mongo: MongoConfig,
}
