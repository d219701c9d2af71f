use anyhow::{bail, Context, Result};
use oraculo_core::{
    methods_for, parse_queue_spec, AdvanceOutcome, Consultation, DeckProvider, DeckResolution,
    OracleType, QueueEntry, Reading, ShuffledDeckProvider,
};
use oraculo_data::{load_session_config, FileDeckProvider, SessionConfig};
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
struct CliOptions {
    cui: bool,
    list: bool,
    queue: Option<String>,
    picks: Vec<String>,
    seed: Option<u64>,
    locale: Option<String>,
    deck_dir: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn parse_cli_options(args: &[String]) -> CliOptions {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--cui" => options.cui = true,
            "--list" => options.list = true,
            flag => {
                if let Some(value) = args.get(idx + 1).cloned() {
                    let known = match flag {
                        "--queue" | "-q" => {
                            options.queue = Some(value);
                            true
                        }
                        "--pick" | "-p" => {
                            options.picks.push(value);
                            true
                        }
                        "--seed" => {
                            options.seed = value.parse::<u64>().ok();
                            true
                        }
                        "--lang" | "-l" => {
                            options.locale = Some(value);
                            true
                        }
                        "--deck-dir" => {
                            options.deck_dir = Some(PathBuf::from(value));
                            true
                        }
                        "--config" => {
                            options.config = Some(PathBuf::from(value));
                            true
                        }
                        _ => false,
                    };
                    if known {
                        idx += 1;
                    }
                }
            }
        }
        idx += 1;
    }
    options
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_cli_options(&args);
    if options.cui {
        let launch = oraculo_cui::LaunchOptions {
            queue: options.queue,
            locale: options.locale,
            seed: options.seed,
            config: options.config,
            ..oraculo_cui::LaunchOptions::default()
        };
        if let Err(err) = oraculo_cui::run(launch) {
            eprintln!("cui launch error: {err:#}");
            std::process::exit(1);
        }
        return;
    }
    init_logging();
    if options.list {
        print_methods();
        return;
    }
    if let Err(err) = run(&options) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(options: &CliOptions) -> Result<()> {
    let mut config = load_session_config(options.config.as_deref()).context("load config")?;
    if let Some(seed) = options.seed {
        config.seed = seed;
    }
    if let Some(dir) = options.deck_dir.clone() {
        config.deck_dir = Some(dir);
    }
    let Some(spec) = options.queue.as_deref() else {
        bail!("usage: oraculo-cli --queue tarot:tres_ppp --pick 10,47,2 [--seed N] [--deck-dir DIR] [--config PATH]");
    };
    let entries = parse_queue_spec(spec).with_context(|| format!("parse queue `{spec}`"))?;
    let readings = draw(entries, &options.picks, provider_for(&config))?;
    let body = serde_json::to_string_pretty(&readings).context("encode readings")?;
    println!("{body}");
    Ok(())
}

fn provider_for(config: &SessionConfig) -> Box<dyn DeckProvider> {
    match config.deck_dir.as_ref() {
        Some(dir) => Box::new(FileDeckProvider::new(dir)),
        None => Box::new(ShuffledDeckProvider::with_reversal_chance(
            config.seed,
            config.reversal_chance,
        )),
    }
}

fn parse_pick(value: &str) -> Result<Vec<usize>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<usize>()
                .with_context(|| format!("invalid position `{item}`"))
        })
        .collect()
}

/// Run one `--pick` per queue entry and return the readings in queue order.
fn draw<P: DeckProvider>(
    entries: Vec<QueueEntry>,
    picks: &[String],
    provider: P,
) -> Result<Vec<Reading>> {
    if picks.len() != entries.len() {
        bail!(
            "queue has {} entries but {} --pick values were given",
            entries.len(),
            picks.len()
        );
    }
    let mut consultation = Consultation::new(entries, provider);
    if let Some(DeckResolution::Failed(err)) = consultation.open() {
        bail!("deck unavailable: {err}");
    }
    for (index, pick) in picks.iter().enumerate() {
        let Some(entry) = consultation.engine().entry().cloned() else {
            bail!("entry {} has no active draw", index + 1);
        };
        if let Some(err) = consultation.engine().last_error() {
            bail!("deck unavailable for {}: {err}", entry.key());
        }
        for position in parse_pick(pick).with_context(|| format!("entry {}", index + 1))? {
            if !consultation.flip(position) {
                bail!("{}: position {position} was rejected", entry.key());
            }
        }
        match consultation.complete_entry() {
            None => bail!(
                "{}: needs {} cards, got {}",
                entry.key(),
                entry.cards_needed(),
                consultation.engine().selected().len()
            ),
            Some(AdvanceOutcome::Next(next)) => tracing::debug!(next = %next.key(), "advanced"),
            Some(AdvanceOutcome::Complete(selections)) => {
                tracing::debug!(entries = selections.len(), "consultation complete")
            }
            Some(AdvanceOutcome::Ignored) => bail!("queue refused to advance"),
        }
    }
    for event in consultation.drain_events() {
        tracing::debug!(?event, "consultation event");
    }
    Ok(consultation.readings().to_vec())
}

fn print_methods() {
    for oracle in OracleType::ALL {
        println!("{} ({} cards)", oracle.display_name(), oracle.total_cards());
        for method in methods_for(oracle) {
            println!(
                "  {}:{:<22} {:>2}  {}",
                oracle.as_str(),
                method.key(),
                method.cards_needed(),
                method.display_name()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picks(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parses_repeated_picks() {
        let options = parse_cli_options(&picks(&[
            "--queue",
            "tarot:tres_ppp,lenormand:grand_tableau",
            "--pick",
            "10,47,2",
            "--pick",
            "0",
            "--seed",
            "9",
        ]));
        assert_eq!(options.picks, vec!["10,47,2", "0"]);
        assert_eq!(options.seed, Some(9));
        assert!(!options.cui);
    }

    #[test]
    fn draws_each_entry_in_reveal_order() {
        let entries = parse_queue_spec("tarot:tres_ppp,lenormand:grand_tableau").unwrap();
        let readings = draw(
            entries,
            &picks(&["10,47,2", "4"]),
            ShuffledDeckProvider::new(1),
        )
        .unwrap();
        assert_eq!(readings.len(), 2);
        let positions: Vec<usize> = readings[0]
            .cards
            .iter()
            .map(|card| card.deck_position)
            .collect();
        assert_eq!(positions, vec![10, 47, 2]);
        assert_eq!(readings[1].cards.len(), 36);
    }

    #[test]
    fn short_picks_are_reported() {
        let entries = parse_queue_spec("cartomancia:cruz_simples").unwrap();
        let err = draw(entries, &picks(&["1,2"]), ShuffledDeckProvider::new(1)).unwrap_err();
        assert!(err.to_string().contains("needs 5 cards, got 2"));
    }

    #[test]
    fn duplicate_positions_are_rejected() {
        let entries = parse_queue_spec("tarot:tres_ppp").unwrap();
        let err = draw(entries, &picks(&["3,3,4"]), ShuffledDeckProvider::new(1)).unwrap_err();
        assert!(err.to_string().contains("position 3 was rejected"));
    }

    #[test]
    fn pick_count_must_match_queue() {
        let entries = parse_queue_spec("tarot:carta_do_dia,tarot:sim_ou_nao").unwrap();
        assert!(draw(entries, &picks(&["1"]), ShuffledDeckProvider::new(1)).is_err());
    }
}
