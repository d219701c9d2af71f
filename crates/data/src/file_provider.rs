use crate::load::parse_deck_payload;
use oraculo_core::{DeckProvider, DeckRequest, DeckResponse, ProviderError};
use std::fs;
use std::path::{Path, PathBuf};

/// Serves recorded provider payloads from a directory.
///
/// Looks up `<oracle>_<spread>.json`, then `<oracle>.json`.
#[derive(Debug, Clone)]
pub struct FileDeckProvider {
    dir: PathBuf,
}

impl FileDeckProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn payload_path(&self, request: &DeckRequest) -> Option<PathBuf> {
        let oracle = request.oracle_type.as_str();
        [
            self.dir
                .join(format!("{oracle}_{}.json", request.spread_code)),
            self.dir.join(format!("{oracle}.json")),
        ]
        .into_iter()
        .find(|path| path.is_file())
    }
}

impl DeckProvider for FileDeckProvider {
    fn fetch_deck(&mut self, request: &DeckRequest) -> Result<DeckResponse, ProviderError> {
        let path = self.payload_path(request).ok_or_else(|| {
            ProviderError::Unavailable(format!(
                "no payload for {} {} in {}",
                request.oracle_type,
                request.spread_code,
                self.dir.display()
            ))
        })?;
        tracing::debug!(path = %path.display(), "reading deck payload");
        let body = fs::read_to_string(&path)
            .map_err(|err| ProviderError::Unavailable(format!("read {}: {err}", path.display())))?;
        parse_deck_payload(&body, request.oracle_type)
    }
}
