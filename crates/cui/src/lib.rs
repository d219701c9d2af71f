mod actions;
mod app;
mod input;
mod persistence;
mod view;
mod worker;

use anyhow::{Context, Result};
use app::App;
use crossterm::event::{self, Event as CEvent, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, ExecutableCommand};
use oraculo_core::parse_queue_spec;
use oraculo_data::load_session_config;
use persistence::{load_auto_perform_file, save_consultation_file};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, stdout, IsTerminal};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;

const DEFAULT_QUEUE: &str = "tarot:tres_ppp";

#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub queue: Option<String>,
    pub locale: Option<String>,
    pub seed: Option<u64>,
    pub config: Option<PathBuf>,
    pub log: Option<PathBuf>,
    pub auto_perform_json: Option<PathBuf>,
    pub out: Option<PathBuf>,
}

pub fn run(options: LaunchOptions) -> Result<()> {
    let _log_guard = match options.log.as_deref() {
        Some(path) => Some(init_file_logging(path)?),
        None => None,
    };

    let mut config = load_session_config(options.config.as_deref()).context("load config")?;
    let mut queue_value = options.queue.clone();
    let mut locale_value = options.locale.clone();
    let mut seed_value = options.seed;
    let mut auto_actions = None;
    if let Some(path) = options.auto_perform_json.as_ref() {
        let script = load_auto_perform_file(path)
            .map_err(|err| anyhow::anyhow!(err))
            .with_context(|| format!("load auto perform json from {}", path.display()))?;
        locale_value = locale_value.or(script.locale);
        seed_value = seed_value.or(script.seed);
        queue_value = queue_value.or(script.queue);
        auto_actions = Some(script.actions);
    }
    if let Some(locale) = locale_value {
        config.locale = locale;
    }
    if let Some(seed) = seed_value {
        config.seed = seed;
    }
    let spec = queue_value.unwrap_or_else(|| DEFAULT_QUEUE.to_string());
    let entries = parse_queue_spec(&spec).with_context(|| format!("parse queue `{spec}`"))?;
    tracing::info!(queue = %spec, seed = config.seed, "starting consultation");

    let mut app = App::bootstrap(&config, entries)?;
    if let Some(actions) = auto_actions {
        app.auto_perform_actions(&actions)
            .map_err(|err| anyhow::anyhow!(err))
            .context("apply auto perform actions")?;
        if app.is_finished() || app.should_quit {
            return write_out(&app, options.out.as_deref());
        }
    }

    ensure_interactive_terminal()?;

    enable_raw_mode().map_err(|err| {
        anyhow::anyhow!(
            "failed to enable raw mode; ensure the process owns an interactive terminal: {err}"
        )
    })?;
    let mut stdout = stdout();
    stdout
        .execute(EnterAlternateScreen)
        .context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let run_result = run_loop(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;
    run_result?;
    write_out(&app, options.out.as_deref())
}

pub fn run_with_args(args: &[String]) -> Result<()> {
    let options = parse_options(args);
    run(options)
}

fn parse_options(args: &[String]) -> LaunchOptions {
    let mut options = LaunchOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        let Some(value) = args.get(idx + 1).cloned() else {
            break;
        };
        match flag {
            "--queue" | "-q" => options.queue = Some(value),
            "--lang" | "-l" => options.locale = Some(value),
            "--seed" => options.seed = value.parse::<u64>().ok(),
            "--config" => options.config = Some(PathBuf::from(value)),
            "--log" => options.log = Some(PathBuf::from(value)),
            "--auto-perform-json" | "--auto-json" => {
                options.auto_perform_json = Some(PathBuf::from(value))
            }
            "--out" | "-o" => options.out = Some(PathBuf::from(value)),
            _ => {
                idx += 1;
                continue;
            }
        }
        idx += 2;
    }
    options
}

/// Log to a file only; the alternate screen owns stdout and stderr.
fn init_file_logging(path: &Path) -> Result<WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let file = std::fs::File::create(path)
        .with_context(|| format!("create log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .try_init()
        .context("install log subscriber")?;
    Ok(guard)
}

fn write_out(app: &App, out: Option<&Path>) -> Result<()> {
    let Some(path) = out else {
        return Ok(());
    };
    if !app.is_finished() {
        tracing::info!("consultation not finished; nothing written");
        return Ok(());
    }
    save_consultation_file(
        app.locale.code(),
        app.seed,
        &app.queue_spec,
        &app.recorded_actions,
        &app.readings,
        path,
    )
    .map_err(|err| anyhow::anyhow!(err))
    .with_context(|| format!("write readings to {}", path.display()))
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(120);
    while !app.should_quit {
        terminal.draw(|frame| view::draw(frame, app))?;
        if event::poll(tick_rate)? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let action = input::map_key(key);
                actions::dispatch(app, action);
            }
        }
        app.on_tick();
    }
    Ok(())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("leave alternate screen")?;
    terminal.show_cursor().context("show cursor")?;
    Ok(())
}

fn ensure_interactive_terminal() -> Result<()> {
    if io::stdin().is_terminal() && io::stdout().is_terminal() {
        return Ok(());
    }
    anyhow::bail!(
        "oraculo-cui requires an interactive TTY (run directly in a terminal, or pass an --auto-perform-json script that finishes the consultation)"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parses_launch_flags() {
        let options = parse_options(&args(&[
            "--queue",
            "tarot:tres_ppp,lenormand:grand_tableau",
            "--seed",
            "12",
            "--lang",
            "en",
            "--out",
            "readings.json",
        ]));
        assert_eq!(
            options.queue.as_deref(),
            Some("tarot:tres_ppp,lenormand:grand_tableau")
        );
        assert_eq!(options.seed, Some(12));
        assert_eq!(options.locale.as_deref(), Some("en"));
        assert_eq!(options.out, Some(PathBuf::from("readings.json")));
    }

    #[test]
    fn ignores_unknown_and_dangling_flags() {
        let options = parse_options(&args(&["--verbose", "--seed"]));
        assert_eq!(options.seed, None);
        assert_eq!(options.queue, None);
    }

    #[test]
    fn scripted_run_writes_readings_without_a_terminal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = dir.path().join("script.json");
        let out = dir.path().join("out.json");
        std::fs::write(
            &script,
            r#"{"queue":"lenormand:linha_de_tres","seed":5,
                "actions":[{"action":"flip","position":0},{"action":"flip","position":35},
                           {"action":"flip","position":17},{"action":"continue"}]}"#,
        )
        .expect("write");
        run(LaunchOptions {
            auto_perform_json: Some(script),
            out: Some(out.clone()),
            ..LaunchOptions::default()
        })
        .expect("run");
        let saved: persistence::SavedConsultation =
            serde_json::from_str(&std::fs::read_to_string(out).expect("read")).expect("parse");
        assert_eq!(saved.seed, 5);
        assert_eq!(saved.readings.len(), 1);
        let positions: Vec<usize> = saved.readings[0]
            .cards
            .iter()
            .map(|card| card.deck_position)
            .collect();
        assert_eq!(positions, vec![0, 35, 17]);
    }
}
