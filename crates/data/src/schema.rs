use oraculo_core::{DEFAULT_ASSET_BASE, DEFAULT_REVERSAL_CHANCE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_SEED: u64 = 0xC0FFEE;
pub const DEFAULT_DISMISS_GUARD_MS: u64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_asset_base")]
    pub asset_base_url: String,
    #[serde(default = "default_dismiss_guard_ms")]
    pub dismiss_guard_ms: u64,
    #[serde(default = "default_reversal_chance")]
    pub reversal_chance: f64,
    /// Serve recorded provider payloads from this directory instead of shuffling.
    #[serde(default)]
    pub deck_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            seed: default_seed(),
            asset_base_url: default_asset_base(),
            dismiss_guard_ms: default_dismiss_guard_ms(),
            reversal_chance: default_reversal_chance(),
            deck_dir: None,
        }
    }
}

fn default_locale() -> String {
    "pt_BR".to_string()
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_asset_base() -> String {
    DEFAULT_ASSET_BASE.to_string()
}

fn default_dismiss_guard_ms() -> u64 {
    DEFAULT_DISMISS_GUARD_MS
}

fn default_reversal_chance() -> f64 {
    DEFAULT_REVERSAL_CHANCE
}
