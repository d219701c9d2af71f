use crate::schema::SessionConfig;
use anyhow::Context;
use oraculo_core::{DeckResponse, OracleType, ProviderError, RawDeckCard, RawDeckResponse};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "oraculo.json";

pub const ENV_LANG: &str = "ORACULO_LANG";
pub const ENV_SEED: &str = "ORACULO_SEED";
pub const ENV_ASSETS: &str = "ORACULO_ASSETS";
pub const ENV_DECK_DIR: &str = "ORACULO_DECK_DIR";

/// Load the session config: explicit file, else `oraculo.json` when present,
/// else defaults. Environment overrides are applied last.
pub fn load_session_config(path: Option<&Path>) -> anyhow::Result<SessionConfig> {
    load_session_config_with(path, |key| std::env::var(key).ok())
}

/// [`load_session_config`] with the environment supplied by `lookup`.
pub fn load_session_config_with(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<SessionConfig> {
    let mut config: SessionConfig = match path {
        Some(path) => load_json(path)?,
        None if Path::new(CONFIG_FILE).exists() => load_json(CONFIG_FILE)?,
        None => SessionConfig::default(),
    };
    apply_env_overrides(&mut config, lookup)?;
    config.locale = normalize_locale(Some(&config.locale));
    Ok(config)
}

pub fn apply_env_overrides(
    config: &mut SessionConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(locale) = lookup(ENV_LANG) {
        config.locale = locale;
    }
    if let Some(seed) = lookup(ENV_SEED) {
        config.seed = seed
            .trim()
            .parse()
            .with_context(|| format!("parse {ENV_SEED}={seed}"))?;
    }
    if let Some(base) = lookup(ENV_ASSETS) {
        config.asset_base_url = base;
    }
    if let Some(dir) = lookup(ENV_DECK_DIR) {
        config.deck_dir = Some(dir.into());
    }
    Ok(())
}

pub fn normalize_locale(locale: Option<&str>) -> String {
    let raw = locale.unwrap_or("pt_BR").trim();
    if raw.is_empty() {
        return "pt_BR".to_string();
    }
    let lowered = raw.replace('-', "_").to_ascii_lowercase();
    match lowered.as_str() {
        "pt" | "pt_br" => "pt_BR".to_string(),
        "en" | "en_us" => "en_US".to_string(),
        _ => raw.replace('-', "_"),
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DeckPayload {
    Response(RawDeckResponse),
    Cards(Vec<RawDeckCard>),
}

/// Parse a provider payload: either `{ "deck": [...], "spreadCode": ... }`
/// or a bare card array.
pub fn parse_deck_payload(body: &str, oracle: OracleType) -> Result<DeckResponse, ProviderError> {
    let payload: DeckPayload =
        serde_json::from_str(body).map_err(|err| ProviderError::Malformed(err.to_string()))?;
    let raw = match payload {
        DeckPayload::Response(response) => response,
        DeckPayload::Cards(deck) => RawDeckResponse {
            deck,
            spread_code: None,
        },
    };
    raw.normalize(oracle)
}

pub fn load_deck_payload(path: &Path, oracle: OracleType) -> anyhow::Result<DeckResponse> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let response =
        parse_deck_payload(&raw, oracle).with_context(|| format!("parse {}", path.display()))?;
    Ok(response)
}

fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(value)
}
