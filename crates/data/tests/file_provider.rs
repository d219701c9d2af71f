use oraculo_core::{
    catalog, DeckProvider, DeckPurpose, DeckRequest, DeckTicket, OracleType, ProviderError,
};
use oraculo_data::{
    load_deck_payload, load_session_config_with, FileDeckProvider, SessionConfig, ENV_LANG,
    ENV_SEED,
};
use std::fs;

fn request(oracle: OracleType, spread: &str) -> DeckRequest {
    DeckRequest {
        ticket: DeckTicket {
            generation: 1,
            purpose: DeckPurpose::Initial,
        },
        oracle_type: oracle,
        spread_code: spread.to_string(),
    }
}

fn reversed_payload(oracle: OracleType) -> String {
    let cards: Vec<String> = catalog(oracle)
        .into_iter()
        .rev()
        .map(|code| format!(r#"{{"code":"{code}","reversed":true}}"#))
        .collect();
    format!(r#"{{"deck":[{}]}}"#, cards.join(","))
}

#[test]
fn prefers_spread_specific_payloads() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("tarot_cruz_celta.json"),
        reversed_payload(OracleType::Tarot),
    )
    .unwrap();
    let generic: Vec<String> = catalog(OracleType::Tarot)
        .into_iter()
        .map(|code| format!(r#"{{"code":"{code}"}}"#))
        .collect();
    fs::write(
        dir.path().join("tarot.json"),
        format!("[{}]", generic.join(",")),
    )
    .unwrap();

    let mut provider = FileDeckProvider::new(dir.path());
    let specific = provider
        .fetch_deck(&request(OracleType::Tarot, "cruz_celta"))
        .unwrap();
    assert_eq!(specific.deck.cards()[0].code, "tarot_minor_coins_king");
    assert!(specific.deck.cards()[0].is_reversed());

    let fallback = provider
        .fetch_deck(&request(OracleType::Tarot, "tres_ppp"))
        .unwrap();
    assert_eq!(fallback.deck.cards()[0].code, "tarot_major_00_fool");
}

#[test]
fn missing_payload_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let mut provider = FileDeckProvider::new(dir.path());
    assert!(matches!(
        provider.fetch_deck(&request(OracleType::Lenormand, "grand_tableau")),
        Err(ProviderError::Unavailable(_))
    ));
}

#[test]
fn short_payload_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("lenormand.json"),
        r#"{"deck":[{"code":"lenormand_01_rider"}]}"#,
    )
    .unwrap();
    let mut provider = FileDeckProvider::new(dir.path());
    assert_eq!(
        provider.fetch_deck(&request(OracleType::Lenormand, "linha_de_tres")),
        Err(ProviderError::DeckSize {
            expected: 36,
            actual: 1
        })
    );
}

#[test]
fn loads_payload_files_with_context() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cartomancia.json");
    fs::write(&path, reversed_payload(OracleType::Cartomancia)).unwrap();
    let response = load_deck_payload(&path, OracleType::Cartomancia).unwrap();
    assert_eq!(response.deck.len(), 52);
    assert!(response.deck.cards().iter().all(|card| !card.is_reversed()));

    let missing = dir.path().join("missing.json");
    let err = load_deck_payload(&missing, OracleType::Cartomancia).unwrap_err();
    assert!(err.to_string().contains("missing.json"));
}

#[test]
fn config_file_fills_in_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("oraculo.json");
    fs::write(&path, r#"{"seed": 7, "dismiss_guard_ms": 150}"#).unwrap();
    let config = load_session_config_with(Some(&path), |_| None).unwrap();
    assert_eq!(config.seed, 7);
    assert_eq!(config.dismiss_guard_ms, 150);
    assert_eq!(config.reversal_chance, SessionConfig::default().reversal_chance);
    assert_eq!(config.locale, "pt_BR");
}

#[test]
fn environment_overrides_the_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("oraculo.json");
    fs::write(&path, r#"{"seed": 7, "locale": "pt_BR"}"#).unwrap();
    let config = load_session_config_with(Some(&path), |key| match key {
        ENV_SEED => Some("21".to_string()),
        ENV_LANG => Some("en".to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config.seed, 21);
    assert_eq!(config.locale, "en_US");
}
