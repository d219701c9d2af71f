use crate::persistence::SavedAction;
use crate::worker::{DeckWorker, WorkerReply};
use anyhow::Result;
use oraculo_core::{
    AdvanceOutcome, AssetResolver, DeckProvider, DeckRequest, DeckResolution, Event, EventBus,
    OracleQueue, QueueEntry, QueueStatus, Reading, SelectionEngine, SelectionStatus,
    ShuffledDeckProvider,
};
use oraculo_data::{normalize_locale, FileDeckProvider, SessionConfig};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

const MAX_EVENT_LOG: usize = 200;
/// Grand Tableau layout: 4 rows of 9 houses.
pub const TABLEAU_COLUMNS: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiLocale {
    EnUs,
    PtBr,
}

impl UiLocale {
    pub fn from_opt(value: Option<&str>) -> Self {
        if normalize_locale(value) == "en_US" {
            Self::EnUs
        } else {
            Self::PtBr
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::EnUs => "en_US",
            Self::PtBr => "pt_BR",
        }
    }

    pub fn text<'a>(self, en: &'a str, pt: &'a str) -> &'a str {
        if matches!(self, Self::PtBr) {
            pt
        } else {
            en
        }
    }
}

/// Backdrop dismissal is ignored for `window` after the selection surface opens.
#[derive(Debug, Clone)]
pub struct DismissGuard {
    window: Duration,
    opened_at: Option<Instant>,
}

impl DismissGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            opened_at: None,
        }
    }

    pub fn arm(&mut self, now: Instant) {
        self.opened_at = Some(now);
    }

    pub fn disarm(&mut self) {
        self.opened_at = None;
    }

    pub fn allows_dismiss(&self, now: Instant) -> bool {
        match self.opened_at {
            Some(opened_at) => now.saturating_duration_since(opened_at) >= self.window,
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    Left,
    Right,
    Up,
    Down,
}

pub struct App {
    pub locale: UiLocale,
    pub seed: u64,
    pub queue_spec: String,
    pub assets: AssetResolver,
    pub queue: OracleQueue,
    pub engine: SelectionEngine,
    pub events: EventBus,
    pub readings: Vec<Reading>,
    pub recorded_actions: Vec<SavedAction>,
    pub cursor: usize,
    pub event_log: VecDeque<String>,
    pub status_line: String,
    pub show_help: bool,
    pub should_quit: bool,
    worker: DeckWorker,
    guard: DismissGuard,
}

fn build_provider(config: &SessionConfig) -> Box<dyn DeckProvider + Send> {
    match config.deck_dir.as_ref() {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "serving recorded deck payloads");
            Box::new(FileDeckProvider::new(dir))
        }
        None => Box::new(ShuffledDeckProvider::with_reversal_chance(
            config.seed,
            config.reversal_chance,
        )),
    }
}

/// `tarot:tres_ppp,lenormand:grand_tableau` for the given entries.
pub fn queue_spec(entries: &[QueueEntry]) -> String {
    entries
        .iter()
        .map(|entry| format!("{}:{}", entry.oracle_type.as_str(), entry.method.key()))
        .collect::<Vec<_>>()
        .join(",")
}

impl App {
    pub fn bootstrap(config: &SessionConfig, entries: Vec<QueueEntry>) -> Result<Self> {
        let locale = UiLocale::from_opt(Some(&config.locale));
        let worker = DeckWorker::spawn(build_provider(config))?;
        let mut app = Self {
            locale,
            seed: config.seed,
            queue_spec: queue_spec(&entries),
            assets: AssetResolver::new(config.asset_base_url.clone()),
            queue: OracleQueue::new(entries),
            engine: SelectionEngine::new(),
            events: EventBus::default(),
            readings: Vec::new(),
            recorded_actions: Vec::new(),
            cursor: 0,
            event_log: VecDeque::new(),
            status_line: locale.text("shuffling", "embaralhando").to_string(),
            show_help: false,
            should_quit: false,
            worker,
            guard: DismissGuard::new(Duration::from_millis(config.dismiss_guard_ms)),
        };
        app.open_current(Instant::now());
        Ok(app)
    }

    /// Collect finished deck fetches.
    pub fn on_tick(&mut self) {
        for reply in self.worker.poll() {
            self.apply_reply(reply);
        }
        self.flush_events();
    }

    /// Block until no deck fetch is outstanding or `timeout` passes.
    pub fn settle(&mut self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        while self.engine.deck_in_flight() || self.engine.reshuffle_in_flight() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::warn!("deck fetch still outstanding after {timeout:?}");
                break;
            }
            match self.worker.recv_timeout(remaining) {
                Some(reply) => self.apply_reply(reply),
                None => break,
            }
        }
        self.flush_events();
    }

    pub fn is_finished(&self) -> bool {
        self.queue.is_complete()
    }

    pub fn is_tableau(&self) -> bool {
        self.engine
            .entry()
            .is_some_and(|entry| entry.method.is_full_reveal())
    }

    pub fn deck_len(&self) -> usize {
        self.engine.deck().map_or(0, |deck| deck.len())
    }

    pub fn move_cursor(&mut self, movement: CursorMove) {
        let len = self.deck_len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let row = if self.is_tableau() { TABLEAU_COLUMNS } else { 1 };
        let step = match movement {
            CursorMove::Left => -1,
            CursorMove::Right => 1,
            CursorMove::Up => -(row as isize),
            CursorMove::Down => row as isize,
        };
        let next = self.cursor as isize + step;
        if (0..len as isize).contains(&next) {
            self.cursor = next as usize;
        }
    }

    pub fn flip_at_cursor(&mut self) {
        let position = self.cursor;
        self.flip(position);
    }

    pub fn flip(&mut self, position: usize) {
        if self.engine.flip(position, &mut self.events) {
            self.record_action("flip", Some(position));
            let remaining = self.engine.remaining();
            self.status_line = if self.engine.can_complete() {
                self.locale
                    .text("ready: press c to continue", "pronto: c para continuar")
                    .to_string()
            } else {
                format!(
                    "{} {remaining}",
                    self.locale.text("cards left:", "cartas restantes:")
                )
            };
        } else {
            self.status_line = self.flip_refusal(position).to_string();
        }
        self.flush_events();
    }

    fn flip_refusal(&self, position: usize) -> &'static str {
        if self.engine.reshuffle_in_flight() {
            self.locale.text("shuffling...", "embaralhando...")
        } else if self.engine.deck().is_none() {
            self.locale.text("deck not ready", "baralho indisponível")
        } else if self.engine.is_flipped(position) {
            self.locale.text("card already revealed", "carta já revelada")
        } else {
            self.locale.text("selection is full", "seleção completa")
        }
    }

    pub fn reshuffle(&mut self) {
        let Some(request) = self.engine.begin_reshuffle() else {
            self.status_line = self
                .locale
                .text(
                    "reshuffle unavailable after a reveal",
                    "não é possível embaralhar após revelar",
                )
                .to_string();
            return;
        };
        self.record_action("reshuffle", None);
        self.status_line = self.locale.text("shuffling", "embaralhando").to_string();
        self.dispatch(request);
        self.flush_events();
    }

    /// Repeat whichever fetch failed: the initial deck, or a reshuffle.
    pub fn retry_deck(&mut self) {
        if self.engine.last_error().is_none() {
            return;
        }
        self.engine.dismiss_error();
        let request = self
            .engine
            .request_deck()
            .or_else(|| self.engine.begin_reshuffle());
        if let Some(request) = request {
            self.record_action("retry", None);
            self.status_line = self.locale.text("shuffling", "embaralhando").to_string();
            self.dispatch(request);
        }
        self.flush_events();
    }

    pub fn continue_entry(&mut self) {
        let Some(selection) = self.engine.complete() else {
            self.status_line = format!(
                "{} {}",
                self.locale.text("cards left:", "cartas restantes:"),
                self.engine.remaining()
            );
            return;
        };
        let reading = self.engine.reading();
        match self.queue.advance(selection, &mut self.events) {
            AdvanceOutcome::Next(_) => {
                self.readings.extend(reading);
                self.record_action("continue", None);
                self.open_current(Instant::now());
            }
            AdvanceOutcome::Complete(_) => {
                self.readings.extend(reading);
                self.record_action("continue", None);
                self.engine.load_entry(None, None, &mut self.events);
                self.guard.disarm();
                self.status_line = self
                    .locale
                    .text("consultation complete", "consulta concluída")
                    .to_string();
            }
            AdvanceOutcome::Ignored => {}
        }
        self.flush_events();
    }

    /// Backdrop dismissal; ignored while the guard window is open.
    pub fn dismiss(&mut self, now: Instant) {
        if self.show_help {
            self.show_help = false;
            return;
        }
        if self.engine.last_error().is_some() {
            self.engine.dismiss_error();
            return;
        }
        if self.engine.entry().is_none() {
            return;
        }
        if !self.guard.allows_dismiss(now) {
            tracing::debug!("dismiss ignored inside guard window");
            return;
        }
        self.close();
    }

    /// Abandon the consultation. Nothing drawn so far is kept.
    pub fn close(&mut self) {
        if self.is_finished() {
            self.should_quit = true;
            return;
        }
        self.record_action("close", None);
        self.queue.close(&mut self.events);
        self.engine.load_entry(None, None, &mut self.events);
        self.readings.clear();
        self.guard.disarm();
        self.status_line = self
            .locale
            .text("consultation closed", "consulta encerrada")
            .to_string();
        self.flush_events();
        self.should_quit = true;
    }

    pub fn apply_saved_action(&mut self, action: &SavedAction) -> Result<(), String> {
        match action.action.as_str() {
            "flip" => {
                let position = action
                    .position
                    .ok_or_else(|| "flip without position".to_string())?;
                self.cursor = position;
                self.flip(position);
            }
            "reshuffle" => self.reshuffle(),
            "retry" => self.retry_deck(),
            "continue" => self.continue_entry(),
            "close" => self.close(),
            other => return Err(format!("unknown saved action '{other}'")),
        }
        Ok(())
    }

    pub fn auto_perform_actions(&mut self, actions: &[SavedAction]) -> Result<(), String> {
        const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
        self.settle(FETCH_TIMEOUT);
        for (idx, action) in actions.iter().enumerate() {
            self.apply_saved_action(action)
                .map_err(|err| format!("action {idx}: {err}"))?;
            self.settle(FETCH_TIMEOUT);
        }
        Ok(())
    }

    pub fn header_status(&self) -> &'static str {
        if self.queue.status() == QueueStatus::Closed {
            return self.locale.text("closed", "encerrada");
        }
        match self.engine.status() {
            SelectionStatus::Idle if self.is_finished() => self.locale.text("done", "concluída"),
            SelectionStatus::Idle => self.locale.text("idle", "ociosa"),
            SelectionStatus::AwaitingDeck => self.locale.text("shuffling", "embaralhando"),
            SelectionStatus::Drawing => self.locale.text("drawing", "escolhendo"),
            SelectionStatus::Ready => self.locale.text("ready", "pronta"),
        }
    }

    fn open_current(&mut self, now: Instant) {
        let entry = self.queue.current().cloned();
        self.engine.load_entry(entry, None, &mut self.events);
        self.cursor = 0;
        if self.engine.entry().is_some() {
            self.guard.arm(now);
        }
        if let Some(request) = self.engine.request_deck() {
            self.dispatch(request);
        }
        self.flush_events();
    }

    fn dispatch(&mut self, request: DeckRequest) {
        let ticket = request.ticket;
        if let Err(err) = self.worker.submit(request) {
            self.engine.resolve_deck(ticket, Err(err), &mut self.events);
        }
    }

    fn apply_reply(&mut self, reply: WorkerReply) {
        match self
            .engine
            .resolve_deck(reply.ticket, reply.result, &mut self.events)
        {
            DeckResolution::Applied => {
                self.cursor = self.cursor.min(self.deck_len().saturating_sub(1));
                self.status_line = self
                    .locale
                    .text("pick your cards", "escolha suas cartas")
                    .to_string();
            }
            DeckResolution::Failed(err) => {
                self.status_line = format!(
                    "{}: {err} ({})",
                    self.locale.text("deck failed", "falha no baralho"),
                    self.locale.text("t to retry", "t para tentar de novo")
                );
            }
            DeckResolution::Stale => {}
        }
    }

    fn record_action(&mut self, action: &str, position: Option<usize>) {
        self.recorded_actions
            .push(SavedAction::new(action, position));
    }

    fn flush_events(&mut self) {
        let lines: Vec<String> = self
            .events
            .drain()
            .map(|event| format_event(self.locale, &event))
            .collect();
        for line in lines {
            self.push_event_line(line);
        }
    }

    fn push_event_line(&mut self, line: String) {
        self.event_log.push_back(line);
        while self.event_log.len() > MAX_EVENT_LOG {
            self.event_log.pop_front();
        }
    }
}

fn format_event(locale: UiLocale, event: &Event) -> String {
    match event {
        Event::EntryLoaded {
            oracle,
            method,
            deck_ready,
        } => format!(
            "{} {} / {}{}",
            locale.text("entry", "entrada"),
            oracle.display_name(),
            method.display_name(),
            if *deck_ready { "" } else { " ..." }
        ),
        Event::DeckApplied {
            oracle,
            cards,
            reshuffle,
        } => format!(
            "{} {oracle} ({cards})",
            if *reshuffle {
                locale.text("reshuffled", "reembaralhado")
            } else {
                locale.text("deck ready", "baralho pronto")
            }
        ),
        Event::DeckFailed {
            oracle,
            reason,
            reshuffle,
        } => format!(
            "{} {oracle}{}: {reason}",
            locale.text("deck failed", "falha no baralho"),
            if *reshuffle { " (reshuffle)" } else { "" }
        ),
        Event::StaleDeckDiscarded { generation } => {
            format!("{} #{generation}", locale.text("stale deck", "baralho obsoleto"))
        }
        Event::CardFlipped { oracle, position } => {
            format!("{} {oracle} #{position}", locale.text("flipped", "virada"))
        }
        Event::TableauRevealed { cards } => {
            format!("{} ({cards})", locale.text("tableau revealed", "tableau revelado"))
        }
        Event::EntryCompleted { key, positions } => format!(
            "{} {key} {positions:?}",
            locale.text("completed", "concluída")
        ),
        Event::QueueAdvanced { index } => {
            format!("{} {}", locale.text("next entry", "próxima entrada"), index + 1)
        }
        Event::QueueCompleted { entries } => format!(
            "{} ({entries})",
            locale.text("consultation complete", "consulta concluída")
        ),
        Event::ConsultationClosed { discarded } => format!(
            "{} ({discarded})",
            locale.text("consultation closed", "consulta encerrada")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oraculo_core::{catalog, parse_queue_spec, OracleType};
    use std::fs;
    use std::path::Path;

    const WAIT: Duration = Duration::from_secs(5);

    fn app(spec: &str) -> App {
        let config = SessionConfig {
            seed: 7,
            ..SessionConfig::default()
        };
        let mut app = App::bootstrap(&config, parse_queue_spec(spec).unwrap()).unwrap();
        app.settle(WAIT);
        app
    }

    fn write_tarot_payload(dir: &Path) {
        let cards: Vec<String> = catalog(OracleType::Tarot)
            .into_iter()
            .map(|code| format!(r#"{{"code":"{code}"}}"#))
            .collect();
        fs::write(dir.join("tarot.json"), format!("[{}]", cards.join(","))).unwrap();
    }

    /// Tarot app served from `dir`, left with a failed reshuffle.
    fn app_after_failed_reshuffle(dir: &Path) -> App {
        write_tarot_payload(dir);
        let config = SessionConfig {
            deck_dir: Some(dir.to_path_buf()),
            ..SessionConfig::default()
        };
        let mut app = App::bootstrap(&config, parse_queue_spec("tarot:tres_ppp").unwrap()).unwrap();
        app.settle(WAIT);
        assert_eq!(app.deck_len(), 78);

        fs::remove_file(dir.join("tarot.json")).unwrap();
        app.reshuffle();
        app.settle(WAIT);
        assert!(app.engine.last_error().is_some());
        assert_eq!(app.deck_len(), 78);
        app
    }

    #[test]
    fn escape_on_a_deck_error_only_clears_the_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_after_failed_reshuffle(dir.path());
        app.dismiss(Instant::now() + Duration::from_secs(2));
        assert!(!app.should_quit);
        assert_eq!(app.queue.status(), QueueStatus::Drawing);
        assert!(app.engine.last_error().is_none());
        assert_eq!(app.deck_len(), 78);
    }

    #[test]
    fn retry_after_a_failed_reshuffle_reshuffles_again() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_after_failed_reshuffle(dir.path());
        write_tarot_payload(dir.path());
        app.retry_deck();
        app.settle(WAIT);
        assert!(app.engine.last_error().is_none());
        assert_eq!(
            app.recorded_actions.last(),
            Some(&SavedAction::new("retry", None))
        );
        assert!(app
            .event_log
            .back()
            .is_some_and(|line| line.starts_with("reembaralhado")));
    }

    #[test]
    fn guard_window_blocks_early_dismiss() {
        let mut guard = DismissGuard::new(Duration::from_millis(300));
        let opened = Instant::now();
        assert!(guard.allows_dismiss(opened));
        guard.arm(opened);
        assert!(!guard.allows_dismiss(opened + Duration::from_millis(299)));
        assert!(guard.allows_dismiss(opened + Duration::from_millis(300)));
        guard.disarm();
        assert!(guard.allows_dismiss(opened));
    }

    #[test]
    fn early_escape_keeps_the_consultation_open() {
        let mut app = app("tarot:tres_ppp");
        let opened = Instant::now();
        app.dismiss(opened);
        assert!(!app.should_quit);
        assert_eq!(app.queue.status(), QueueStatus::Drawing);
        app.dismiss(opened + Duration::from_secs(1));
        assert!(app.should_quit);
        assert_eq!(app.queue.status(), QueueStatus::Closed);
    }

    #[test]
    fn walks_a_two_entry_queue() {
        let mut app = app("tarot:tres_ppp,lenormand:grand_tableau");
        assert_eq!(app.deck_len(), 78);
        for position in [10, 47, 2] {
            app.flip(position);
        }
        app.continue_entry();
        app.settle(WAIT);
        assert!(app.is_tableau());
        assert_eq!(app.deck_len(), 36);

        app.move_cursor(CursorMove::Down);
        app.move_cursor(CursorMove::Right);
        assert_eq!(app.cursor, TABLEAU_COLUMNS + 1);
        app.flip_at_cursor();
        app.continue_entry();

        assert!(app.is_finished());
        assert_eq!(app.readings.len(), 2);
        let positions: Vec<usize> = app.readings[0]
            .cards
            .iter()
            .map(|card| card.deck_position)
            .collect();
        assert_eq!(positions, vec![10, 47, 2]);
        assert_eq!(app.readings[1].cards.len(), 36);
    }

    #[test]
    fn reshuffle_is_refused_after_a_reveal() {
        let mut app = app("cartomancia:tres_cartas");
        app.reshuffle();
        app.settle(WAIT);
        assert_eq!(app.deck_len(), 52);
        app.flip(0);
        let before = app.recorded_actions.len();
        app.reshuffle();
        assert_eq!(app.recorded_actions.len(), before);
        assert!(!app.engine.reshuffle_in_flight());
    }

    #[test]
    fn recorded_actions_replay_to_the_same_readings() {
        let mut first = app("tarot:sim_ou_nao");
        first.reshuffle();
        first.settle(WAIT);
        first.flip(5);
        first.continue_entry();

        let mut second = App::bootstrap(
            &SessionConfig {
                seed: 7,
                ..SessionConfig::default()
            },
            parse_queue_spec("tarot:sim_ou_nao").unwrap(),
        )
        .unwrap();
        second
            .auto_perform_actions(&first.recorded_actions)
            .unwrap();
        assert_eq!(second.readings.len(), 1);
        assert_eq!(second.readings, first.readings);
    }

    #[test]
    fn unknown_saved_actions_are_rejected() {
        let mut app = app("tarot:carta_do_dia");
        let err = app
            .apply_saved_action(&SavedAction::new("shuffle_harder", None))
            .unwrap_err();
        assert!(err.contains("shuffle_harder"));
    }
}
