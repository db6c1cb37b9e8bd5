use identix::identix_api::transfer::{claim_credential, wallet_claim_url};
use identix::identix_api::CredentialManager;
use identix::identix_core::agent::AgentAdapter;
use identix::identix_core::config::CoreConfig;
use identix::identix_core::memory::MemoryStore;
use identix::identix_core::store::StoreSelector;
use identix::identix_core::transfer::{decode, encode};
use serde_json::{json, Value};
use std::sync::Arc;

fn payload() -> Value {
    json!({
        "id": "cred:1700000000000:x1y2z3a4b",
        "issuer": { "id": "did:example:i1" },
        "credentialSubject": {
            "id": "did:example:h1",
            "name": "José María",
            "degree": { "title": "Licenciatura en Matemáticas", "honours": ["cum laude", "ñ"] }
        }
    })
}

#[test]
fn round_trip_is_exact() {
    let fragment = encode(&payload()).unwrap();
    assert_eq!(decode::<Value>(&fragment).unwrap(), payload());
}

#[test]
fn round_trip_survives_one_extra_percent_encoding() {
    let fragment = encode(&payload()).unwrap();
    let extra = format!("#{}", urlencoding::encode(&fragment[1..]));
    assert_eq!(decode::<Value>(&extra).unwrap(), payload());
}

#[tokio::test]
async fn issuer_to_wallet_hand_off() {
    let config = CoreConfig::default();
    let manager = CredentialManager::new(
        StoreSelector::transient_only(Arc::new(MemoryStore::new())),
        AgentAdapter::absent(),
    )
    .with_config(config.clone());
    let record = manager
        .issue(
            "did:example:i1",
            "did:example:h1",
            payload()["credentialSubject"]
                .as_object()
                .cloned()
                .unwrap(),
            None,
        )
        .await
        .unwrap();

    let url = wallet_claim_url(&config, &record).unwrap();
    assert!(url.starts_with("http://localhost:3001/claim#"));
    let claimed = claim_credential(&url).unwrap();
    assert_eq!(claimed, record.payload);
    assert_eq!(claimed["credentialSubject"]["name"], "José María");
}

#[test]
fn claim_rejects_payload_without_identifier() {
    let fragment = encode(&json!({"credentialSubject": {"name": "Alice"}})).unwrap();
    assert!(claim_credential(&fragment).is_err());
}
