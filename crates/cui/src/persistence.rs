use oraculo_core::Reading;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const SAVE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAction {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

impl SavedAction {
    pub fn new(action: &str, position: Option<usize>) -> Self {
        Self {
            action: action.to_string(),
            position,
        }
    }
}

/// Finished consultation as written by `--out`. Replayable as a script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedConsultation {
    pub version: u32,
    pub locale: String,
    pub seed: u64,
    pub queue: String,
    pub actions: Vec<SavedAction>,
    #[serde(default)]
    pub readings: Vec<Reading>,
}

#[derive(Debug, Clone)]
pub struct AutoPerformScript {
    pub locale: Option<String>,
    pub seed: Option<u64>,
    pub queue: Option<String>,
    pub actions: Vec<SavedAction>,
}

#[derive(Debug, Clone, Deserialize)]
struct AutoPerformScriptFile {
    #[serde(default)]
    locale: Option<String>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    queue: Option<String>,
    #[serde(default)]
    actions: Vec<SavedAction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum AutoPerformPayload {
    Saved(SavedConsultation),
    Script(AutoPerformScriptFile),
    Actions(Vec<SavedAction>),
}

pub fn save_consultation_file(
    locale_code: &str,
    seed: u64,
    queue: &str,
    actions: &[SavedAction],
    readings: &[Reading],
    path: &Path,
) -> Result<(), String> {
    let payload = SavedConsultation {
        version: SAVE_SCHEMA_VERSION,
        locale: locale_code.to_string(),
        seed,
        queue: queue.to_string(),
        actions: actions.to_vec(),
        readings: readings.to_vec(),
    };
    let body = serde_json::to_string_pretty(&payload).map_err(|err| err.to_string())?;
    fs::write(path, body).map_err(|err| err.to_string())
}

pub fn load_auto_perform_file(path: &Path) -> Result<AutoPerformScript, String> {
    let body = fs::read_to_string(path).map_err(|err| err.to_string())?;
    let payload: AutoPerformPayload = serde_json::from_str(&body).map_err(|err| err.to_string())?;
    let script = match payload {
        AutoPerformPayload::Saved(saved) => {
            if saved.version != SAVE_SCHEMA_VERSION {
                return Err(format!(
                    "unsupported save version {} (expected {})",
                    saved.version, SAVE_SCHEMA_VERSION
                ));
            }
            AutoPerformScript {
                locale: Some(saved.locale),
                seed: Some(saved.seed),
                queue: Some(saved.queue),
                actions: saved.actions,
            }
        }
        AutoPerformPayload::Script(script) => AutoPerformScript {
            locale: script.locale,
            seed: script.seed,
            queue: script.queue,
            actions: script.actions,
        },
        AutoPerformPayload::Actions(actions) => AutoPerformScript {
            locale: None,
            seed: None,
            queue: None,
            actions,
        },
    };
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oraculo_core::{Deck, Method, OracleType, QueueEntry};

    #[test]
    fn saved_consultation_replays_as_script() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("consulta.json");
        let entry = QueueEntry::new(Method::TresPpp);
        let deck = Deck::unshuffled(OracleType::Tarot);
        let readings = vec![Reading::from_selection(&entry, &deck, &[10, 47, 2])];
        let actions = vec![
            SavedAction::new("flip", Some(10)),
            SavedAction::new("flip", Some(47)),
            SavedAction::new("flip", Some(2)),
            SavedAction::new("continue", None),
        ];
        save_consultation_file("pt_BR", 42, "tarot:tres_ppp", &actions, &readings, &file)
            .expect("save");
        let loaded = load_auto_perform_file(&file).expect("load");
        assert_eq!(loaded.locale.as_deref(), Some("pt_BR"));
        assert_eq!(loaded.seed, Some(42));
        assert_eq!(loaded.queue.as_deref(), Some("tarot:tres_ppp"));
        assert_eq!(loaded.actions, actions);
    }

    #[test]
    fn load_auto_perform_from_actions_array() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("script.json");
        let body = r#"
[
  {"action":"reshuffle"},
  {"action":"flip","position":3}
]
"#;
        std::fs::write(&file, body).expect("write");
        let loaded = load_auto_perform_file(&file).expect("load auto");
        assert_eq!(loaded.seed, None);
        assert_eq!(loaded.queue, None);
        assert_eq!(loaded.actions.len(), 2);
        assert_eq!(loaded.actions[1].position, Some(3));
    }

    #[test]
    fn load_auto_perform_from_script_object() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("script.json");
        let body = r#"
{
  "locale":"en_US",
  "seed":99,
  "queue":"lenormand:grand_tableau",
  "actions":[{"action":"flip","position":0}]
}
"#;
        std::fs::write(&file, body).expect("write");
        let loaded = load_auto_perform_file(&file).expect("load auto");
        assert_eq!(loaded.seed, Some(99));
        assert_eq!(loaded.locale.as_deref(), Some("en_US"));
        assert_eq!(loaded.queue.as_deref(), Some("lenormand:grand_tableau"));
        assert_eq!(loaded.actions.len(), 1);
    }

    #[test]
    fn rejects_unknown_save_versions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("old.json");
        let body = r#"{"version":9,"locale":"pt_BR","seed":1,"queue":"tarot:sim_ou_nao","actions":[]}"#;
        std::fs::write(&file, body).expect("write");
        let err = load_auto_perform_file(&file).unwrap_err();
        assert!(err.contains("unsupported save version 9"));
    }
}
