//! Issuer and wallet ends of the credential hand-off.
use crate::errors::IdentixAPIError;
use identix_core::config::CoreConfig;
use identix_core::credential::CredentialRecord;
use identix_core::transfer::{claim, claim_url, fragment_of};
use serde_json::Value;

/// Wallet claim link for an issued credential, e.g. `http://localhost:3001/claim#eyJ...`.
pub fn wallet_claim_url(
    config: &CoreConfig,
    record: &CredentialRecord,
) -> Result<String, IdentixAPIError> {
    Ok(claim_url(
        &config.wallet_url,
        &config.wallet_claim_path,
        &record.payload,
    )?)
}

/// Accepts a full claim URL or just its fragment and returns the credential to add to the wallet.
pub fn claim_credential(url_or_fragment: &str) -> Result<Value, IdentixAPIError> {
    let fragment = fragment_of(url_or_fragment).unwrap_or(url_or_fragment);
    Ok(claim(fragment)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::CredentialManager;
    use identix_core::agent::AgentAdapter;
    use identix_core::memory::MemoryStore;
    use identix_core::store::StoreSelector;
    use identix_core::transfer::TransferError;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_issue_then_claim() {
        let config = CoreConfig {
            wallet_url: "https://wallet.example.org/".to_string(),
            ..CoreConfig::default()
        };
        let manager = CredentialManager::new(
            StoreSelector::transient_only(Arc::new(MemoryStore::new())),
            AgentAdapter::absent(),
        )
        .with_config(config.clone());
        let subject = json!({"name": "Zoë Ångström", "institution": "École Polytechnique"});
        let record = manager
            .issue(
                "did:example:i1",
                "did:example:h1",
                subject.as_object().cloned().unwrap(),
                None,
            )
            .await
            .unwrap();

        let url = wallet_claim_url(&config, &record).unwrap();
        assert!(url.starts_with("https://wallet.example.org/claim#"));
        let claimed = claim_credential(&url).unwrap();
        assert_eq!(claimed, record.payload);
        assert_eq!(claimed["credentialSubject"]["name"], "Zoë Ångström");

        let fragment = fragment_of(&url).unwrap();
        assert_eq!(claim_credential(fragment).unwrap(), record.payload);
    }

    #[test]
    fn test_claim_garbage() {
        let err = claim_credential("https://wallet.example.org/claim#%%%").unwrap_err();
        assert!(matches!(
            err,
            IdentixAPIError::ClaimFailed(TransferError::Malformed(_))
        ));
        assert_eq!(err.status_code(), hyper::StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string().matches("Failed to claim credential").count(), 1);
    }
}
