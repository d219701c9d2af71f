use crate::OracleType;
use thiserror::Error;

pub const DEFAULT_ASSET_BASE: &str = "/cards";
const IMAGE_EXT: &str = "jpg";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssetError {
    #[error("unrecognized card code `{0}`")]
    UnrecognizedCode(String),
}

const TAROT_SUITS: [&str; 4] = ["coins", "cups", "swords", "wands"];
const PLAYING_SUITS: [&str; 4] = ["clubs", "diamonds", "hearts", "spades"];

/// Maps card codes to image URLs by prefix.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    base_url: String,
}

impl Default for AssetResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ASSET_BASE)
    }
}

impl AssetResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn front_image_url(&self, code: &str) -> Result<String, AssetError> {
        let unrecognized = || AssetError::UnrecognizedCode(code.to_string());
        let path = if let Some(rest) = code.strip_prefix("tarot_major_") {
            format!("tarot/major/{}", non_empty(rest).ok_or_else(unrecognized)?)
        } else if let Some(rest) = code.strip_prefix("tarot_minor_") {
            let (suit, name) = suited(rest, &TAROT_SUITS).ok_or_else(unrecognized)?;
            format!("tarot/minor/{suit}/{name}")
        } else if let Some(rest) = code.strip_prefix("lenormand_") {
            format!("lenormand/{}", non_empty(rest).ok_or_else(unrecognized)?)
        } else if let Some(rest) = code.strip_prefix("cartomancy_") {
            let (suit, name) = suited(rest, &PLAYING_SUITS).ok_or_else(unrecognized)?;
            format!("cartomancy/{suit}/{name}")
        } else {
            return Err(unrecognized());
        };
        Ok(format!("{}/{path}.{IMAGE_EXT}", self.base_url))
    }

    /// Front image, or the placeholder when the code is not recognized.
    pub fn front_image_or_placeholder(&self, code: &str) -> String {
        self.front_image_url(code).unwrap_or_else(|err| {
            tracing::debug!("using placeholder image: {err}");
            self.placeholder_url()
        })
    }

    pub fn back_image_url(&self, oracle: OracleType) -> String {
        format!("{}/backs/{}.{IMAGE_EXT}", self.base_url, oracle.as_str())
    }

    pub fn placeholder_url(&self) -> String {
        format!("{}/placeholder.{IMAGE_EXT}", self.base_url)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

fn suited<'a>(rest: &'a str, suits: &[&str]) -> Option<(&'a str, &'a str)> {
    let (suit, name) = rest.split_once('_')?;
    if !suits.contains(&suit) {
        return None;
    }
    Some((suit, non_empty(name)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_each_prefix_family() {
        let assets = AssetResolver::new("https://cdn.example/cards/");
        assert_eq!(
            assets.front_image_url("tarot_major_01_magician").unwrap(),
            "https://cdn.example/cards/tarot/major/01_magician.jpg"
        );
        assert_eq!(
            assets.front_image_url("tarot_minor_cups_queen").unwrap(),
            "https://cdn.example/cards/tarot/minor/cups/queen.jpg"
        );
        assert_eq!(
            assets.front_image_url("lenormand_17_stork").unwrap(),
            "https://cdn.example/cards/lenormand/17_stork.jpg"
        );
        assert_eq!(
            assets.front_image_url("cartomancy_spades_ace").unwrap(),
            "https://cdn.example/cards/cartomancy/spades/ace.jpg"
        );
        assert_eq!(
            assets.back_image_url(OracleType::Lenormand),
            "https://cdn.example/cards/backs/lenormand.jpg"
        );
    }

    #[test]
    fn unknown_prefixes_and_suits_are_errors() {
        let assets = AssetResolver::default();
        for code in ["runes_fehu", "tarot_minor_stars_two", "cartomancy_cups_ace", "tarot_major_"] {
            assert_eq!(
                assets.front_image_url(code),
                Err(AssetError::UnrecognizedCode(code.to_string()))
            );
        }
        assert_eq!(
            assets.front_image_or_placeholder("runes_fehu"),
            "/cards/placeholder.jpg"
        );
    }
}
