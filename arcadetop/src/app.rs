//! Dashboard state and main loop: input handling, feed events, persistence, and drawing.

use std::{
    io,
    time::{Duration, Instant},
};

use anyhow::Result;
use chrono::{DateTime, Local};
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::connector::{ConnectorHandle, FeedEvent, FeedMode};
use crate::history::HistoryBuffer;
use crate::led::LedController;
use crate::settings::{Settings, MAX_REFRESH_MS, MIN_REFRESH_MS};
use crate::stats::{ScoreFilter, UsageStats};
use crate::store::KvStore;
use crate::types::{GameData, GameState, HighScore, Inbound, Outbound, SystemStatus, TelemetrySnapshot};
use crate::ui::{
    charts::{draw_score_chart, draw_sessions},
    games::draw_games,
    header::{draw_footer, draw_header},
    led::draw_led,
    scores::draw_high_scores,
    system::draw_system,
};

const CONTROL_FEEDBACK: Duration = Duration::from_secs(1);
const REFRESH_STEP_MS: u64 = 500;

/// Everything the panels show. Mutated only by the handlers below.
pub struct Dashboard {
    pub connected: bool,
    pub mode: FeedMode,
    pub device_online: Option<bool>,
    pub game: GameData,
    pub high_scores: Vec<HighScore>,
    pub history: HistoryBuffer,
    pub usage: UsageStats,
    pub session_samples: u64,
    pub led: LedController,
    pub score_filter: ScoreFilter,
    pub settings: Settings,
    pub last_update: Option<DateTime<Local>>,
    pub diagnostic: Option<String>,
    control_feedback: Option<(String, Instant)>,
}

impl Dashboard {
    pub fn new(settings: Settings, usage: UsageStats) -> Self {
        Self {
            connected: false,
            mode: FeedMode::Live,
            device_online: None,
            game: GameData::default(),
            high_scores: Vec::new(),
            history: HistoryBuffer::new(settings.history_capacity),
            usage,
            session_samples: 0,
            led: LedController::default(),
            score_filter: ScoreFilter::All,
            settings,
            last_update: None,
            diagnostic: None,
            control_feedback: None,
        }
    }

    /// Route one feed event to its handler. May return an LED frame to send.
    pub fn apply(&mut self, ev: FeedEvent) -> Option<Outbound> {
        match ev {
            FeedEvent::Connectivity(up) => {
                self.connected = up;
                None
            }
            FeedEvent::Mode(mode) => {
                self.mode = mode;
                None
            }
            FeedEvent::Diagnostic(msg) => {
                self.diagnostic = Some(msg);
                None
            }
            FeedEvent::Message(Inbound::GameData(snapshot)) => self.on_game_data(snapshot),
            FeedEvent::Message(Inbound::HighScores(hs)) => {
                self.high_scores = hs.scores;
                None
            }
            FeedEvent::Message(Inbound::SystemStatus(st)) => {
                self.on_system_status(&st);
                None
            }
            FeedEvent::Message(Inbound::GameState(gs)) => self.on_game_state(&gs),
            FeedEvent::Message(Inbound::Unknown(_)) => None,
        }
    }

    fn on_game_data(&mut self, snapshot: TelemetrySnapshot) -> Option<Outbound> {
        self.game = GameData::from_snapshot(&snapshot);
        self.history.append(snapshot);
        self.usage.record(&self.game.current_game);
        self.session_samples += 1;
        self.last_update = Some(Local::now());
        self.led.sync_to_game(&self.game.current_game)
    }

    fn on_system_status(&mut self, st: &SystemStatus) {
        self.game.apply_status(st);
        self.last_update = Some(Local::now());
    }

    fn on_game_state(&mut self, gs: &GameState) -> Option<Outbound> {
        let game = gs.current_game.as_deref().filter(|g| !g.is_empty())?;
        self.game.current_game = game.to_string();
        self.led.sync_to_game(game)
    }

    /// User-initiated "clear data": history, scores, counters.
    pub fn clear_data(&mut self) {
        self.history.clear();
        self.high_scores.clear();
        self.usage = UsageStats::default();
        self.session_samples = 0;
    }

    pub fn control_sent(&mut self, action: &str, now: Instant) {
        self.control_feedback = Some((format!("Sent: {}", action.to_uppercase()), now));
    }

    pub fn control_failed(&mut self, action: &str, now: Instant) {
        self.control_feedback = Some((format!("Failed: {}", action.to_uppercase()), now));
    }

    pub fn control_status(&self, now: Instant) -> &str {
        match &self.control_feedback {
            Some((msg, at)) if now.duration_since(*at) < CONTROL_FEEDBACK => msg.as_str(),
            _ => "Ready",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Control(&'static str),
    CycleFilter,
    Reconnect,
    StatusCheck,
    LedPower,
    LedBrighter,
    LedDimmer,
    LedMode,
    LedColor,
    ToggleDark,
    ToggleAutoRefresh,
    FasterRefresh,
    SlowerRefresh,
    ClearData,
    ResetSettings,
    Quit,
}

pub fn key_action(k: KeyEvent) -> Option<Action> {
    let is_game_key = matches!(
        k.code,
        KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
    );
    if k.kind == KeyEventKind::Release {
        return is_game_key.then_some(Action::Control("release"));
    }
    let action = press_action(k.code)?;
    // One control per press; held keys still repeat local actions.
    if k.kind == KeyEventKind::Repeat && matches!(action, Action::Control(_)) {
        return None;
    }
    Some(action)
}

fn press_action(code: KeyCode) -> Option<Action> {
    Some(match code {
        KeyCode::Up => Action::Control("up"),
        KeyCode::Down => Action::Control("down"),
        KeyCode::Left => Action::Control("left"),
        KeyCode::Right => Action::Control("right"),
        KeyCode::Char(' ') | KeyCode::Enter => Action::Control("fire"),
        KeyCode::Char('m') => Action::Control("menu"),
        KeyCode::Char('f') => Action::CycleFilter,
        KeyCode::Char('r') => Action::Reconnect,
        KeyCode::Char('s') => Action::StatusCheck,
        KeyCode::Char('l') => Action::LedPower,
        KeyCode::Char('+') | KeyCode::Char('=') => Action::LedBrighter,
        KeyCode::Char('-') => Action::LedDimmer,
        KeyCode::Char('o') => Action::LedMode,
        KeyCode::Char('c') => Action::LedColor,
        KeyCode::Char('d') => Action::ToggleDark,
        KeyCode::Char('a') => Action::ToggleAutoRefresh,
        KeyCode::Char('[') => Action::FasterRefresh,
        KeyCode::Char(']') => Action::SlowerRefresh,
        KeyCode::Char('x') => Action::ClearData,
        KeyCode::Char('R') => Action::ResetSettings,
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Action::Quit,
        _ => return None,
    })
}

/// Results of HTTP calls made on the dashboard's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    Control { action: &'static str, ok: bool },
    Status(bool),
}

pub struct App {
    dash: Dashboard,
    feed: ConnectorHandle,
    feed_events: mpsc::UnboundedReceiver<FeedEvent>,
    api: ApiClient,
    store: KvStore,
    bg_tx: mpsc::UnboundedSender<Background>,
    bg_rx: mpsc::UnboundedReceiver<Background>,
    should_quit: bool,
    tick: Duration,
}

impl App {
    pub fn new(
        dash: Dashboard,
        feed: ConnectorHandle,
        feed_events: mpsc::UnboundedReceiver<FeedEvent>,
        api: ApiClient,
        store: KvStore,
    ) -> Self {
        let (bg_tx, bg_rx) = mpsc::unbounded_channel();
        Self {
            dash,
            feed,
            feed_events,
            api,
            store,
            bg_tx,
            bg_rx,
            should_quit: false,
            tick: Duration::from_millis(100),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.dash.usage.sessions += 1;
        self.check_status();

        // Terminal setup
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        // Key releases are only reported once the terminal is asked for event types.
        let release_events = supports_keyboard_enhancement().unwrap_or(false);
        if release_events {
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        // Main loop
        let res = self.event_loop(&mut terminal).await;

        // Teardown
        if release_events {
            execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
        }
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        self.feed.shutdown();
        self.persist();
        res
    }

    async fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<()> {
        loop {
            // Input (non-blocking)
            while event::poll(Duration::from_millis(10))? {
                if let Event::Key(k) = event::read()? {
                    if let Some(action) = key_action(k) {
                        self.perform(action);
                    }
                }
            }
            if self.should_quit {
                break;
            }

            // Feed events in delivery order
            while let Ok(ev) = self.feed_events.try_recv() {
                if let Some(frame) = self.dash.apply(ev) {
                    self.send_frame(&frame);
                }
            }
            while let Ok(bg) = self.bg_rx.try_recv() {
                self.on_background(bg);
            }

            terminal.draw(|f| draw(f, &self.dash))?;
            sleep(self.tick).await;
        }
        Ok(())
    }

    fn send_frame(&self, frame: &Outbound) {
        if let Err(e) = self.feed.send(frame) {
            warn!(error = %e, "LED frame not sent");
        }
    }

    fn perform(&mut self, action: Action) {
        match action {
            Action::Control(name) => self.send_control(name),
            Action::CycleFilter => self.dash.score_filter = self.dash.score_filter.next(),
            Action::Reconnect => {
                if let Err(e) = self.feed.connect() {
                    warn!(error = %e, "reconnect request failed");
                }
            }
            Action::StatusCheck => self.check_status(),
            Action::LedPower => {
                let f = self.dash.led.toggle_power();
                self.send_frame(&f);
            }
            Action::LedBrighter => {
                let f = self.dash.led.brighter();
                self.send_frame(&f);
            }
            Action::LedDimmer => {
                let f = self.dash.led.dimmer();
                self.send_frame(&f);
            }
            Action::LedMode => {
                let f = self.dash.led.cycle_mode();
                self.send_frame(&f);
            }
            Action::LedColor => {
                let f = self.dash.led.cycle_color();
                self.send_frame(&f);
            }
            Action::ToggleDark => {
                self.dash.settings.dark_mode = !self.dash.settings.dark_mode;
                self.save_settings();
            }
            Action::ToggleAutoRefresh => {
                self.dash.settings.auto_refresh = !self.dash.settings.auto_refresh;
                self.push_polling();
            }
            Action::FasterRefresh => {
                let r = self.dash.settings.refresh_rate.saturating_sub(REFRESH_STEP_MS);
                self.dash.settings.refresh_rate = r.max(MIN_REFRESH_MS);
                self.push_polling();
            }
            Action::SlowerRefresh => {
                let r = self.dash.settings.refresh_rate + REFRESH_STEP_MS;
                self.dash.settings.refresh_rate = r.min(MAX_REFRESH_MS);
                self.push_polling();
            }
            Action::ClearData => {
                self.dash.clear_data();
                if let Err(e) = self.store.clear() {
                    warn!(error = %e, "could not clear local store");
                }
                info!("local data cleared");
            }
            Action::ResetSettings => match Settings::reset(&mut self.store) {
                Ok(s) => {
                    self.dash.settings = s;
                    self.push_polling();
                }
                Err(e) => warn!(error = %e, "could not reset settings"),
            },
            Action::Quit => self.should_quit = true,
        }
    }

    fn push_polling(&mut self) {
        let s = &self.dash.settings;
        if let Err(e) = self
            .feed
            .set_polling(s.auto_refresh, Duration::from_millis(s.refresh_rate))
        {
            warn!(error = %e, "polling update not delivered");
        }
        self.save_settings();
    }

    fn save_settings(&mut self) {
        if let Err(e) = self.dash.settings.save(&mut self.store) {
            warn!(error = %e, "could not save settings");
        }
    }

    fn persist(&mut self) {
        self.save_settings();
        if let Err(e) = self.dash.usage.save(&mut self.store) {
            warn!(error = %e, "could not save analytics");
        }
    }

    fn send_control(&self, action: &'static str) {
        let api = self.api.clone();
        let tx = self.bg_tx.clone();
        tokio::spawn(async move {
            let ok = match api.control(action).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, action, "control command failed");
                    false
                }
            };
            let _ = tx.send(Background::Control { action, ok });
        });
    }

    fn check_status(&self) {
        let api = self.api.clone();
        let tx = self.bg_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(Background::Status(api.status().await));
        });
    }

    fn on_background(&mut self, bg: Background) {
        let now = Instant::now();
        match bg {
            Background::Control { action, ok: true } => self.dash.control_sent(action, now),
            Background::Control { action, ok: false } => self.dash.control_failed(action, now),
            Background::Status(online) => self.dash.device_online = Some(online),
        }
    }
}

pub fn draw(f: &mut ratatui::Frame<'_>, d: &Dashboard) {
    let area = f.area();

    // Root rows: header, game cards, system + chart, scores + side panels, footer
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Length(7), // game cards
            Constraint::Length(9), // system + score chart
            Constraint::Min(8),    // scores (left), LED + sessions (right)
            Constraint::Length(1), // footer
        ])
        .split(area);

    draw_header(f, rows[0], d);
    draw_games(f, rows[1], &d.game);

    let mid = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(34), Constraint::Percentage(66)])
        .split(rows[2]);
    draw_system(f, mid[0], d);
    draw_score_chart(f, mid[1], &d.history);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[3]);
    draw_high_scores(f, bottom[0], &d.high_scores, d.score_filter);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(4)])
        .split(bottom[1]);
    draw_led(f, side[0], &d.led);
    draw_sessions(f, side[1], d);

    draw_footer(f, rows[4], d);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HighScores;
    use crossterm::event::{KeyEventState, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;

    fn dash() -> Dashboard {
        Dashboard::new(Settings::default(), UsageStats::default())
    }

    fn game_data(v: serde_json::Value) -> FeedEvent {
        FeedEvent::Message(Inbound::classify("gameData", v).unwrap())
    }

    #[test]
    fn game_data_updates_display_and_history() {
        let mut d = dash();
        d.apply(game_data(json!({"ufoScore": 120, "currentGame": "ufo"})));
        d.apply(game_data(json!({"snakeScore": 40, "currentGame": "snake"})));
        assert_eq!(d.game.snake_score, 40);
        assert_eq!(d.game.ufo_score, 0);
        assert_eq!(d.history.len(), 2);
        assert_eq!(d.session_samples, 2);
        assert_eq!(d.usage.samples_by_game.get("ufo"), Some(&1));
        assert!(d.last_update.is_some());
    }

    #[test]
    fn unparsable_frame_leaves_state_unchanged() {
        let mut d = dash();
        d.apply(game_data(json!({"ufoScore": 77})));
        let before = d.game.clone();

        // What the connector publishes for a frame it could not parse.
        let err = Inbound::parse("{\"type\":").unwrap_err();
        d.apply(FeedEvent::Diagnostic(err.to_string()));

        assert_eq!(d.game, before);
        assert_eq!(d.history.len(), 1);
        assert!(d.diagnostic.is_some());
    }

    #[test]
    fn system_status_merges_and_game_state_switches() {
        let mut d = dash();
        d.apply(game_data(json!({"uptime": 5000, "freeMemory": 4096})));
        d.apply(FeedEvent::Message(Inbound::SystemStatus(SystemStatus {
            wifi_signal: Some(-48),
            ..SystemStatus::default()
        })));
        assert_eq!(d.game.wifi_signal, -48);
        assert_eq!(d.game.uptime_ms, 5000);

        d.apply(FeedEvent::Message(Inbound::GameState(GameState {
            current_game: Some("pong".into()),
            ..GameState::default()
        })));
        assert_eq!(d.game.current_game, "pong");
        assert_eq!(d.history.len(), 1);
    }

    #[test]
    fn led_follows_game_when_synced() {
        let mut d = dash();
        d.led.toggle_power();
        d.led.set_mode(crate::types::LedMode::Game);
        let frame = d.apply(game_data(json!({"currentGame": "flappy"})));
        assert!(frame.is_some());
        assert_eq!(d.led.color, "#FFB86C");
        assert!(d.apply(game_data(json!({"currentGame": "flappy"}))).is_none());
    }

    #[test]
    fn clear_data_empties_history_and_scores() {
        let mut d = dash();
        d.apply(game_data(json!({"ufoScore": 1})));
        d.apply(FeedEvent::Message(Inbound::HighScores(HighScores {
            scores: vec![HighScore::default()],
        })));
        d.clear_data();
        assert!(d.history.is_empty());
        assert!(d.high_scores.is_empty());
        assert_eq!(d.history.recent(10).count(), 0);
    }

    #[test]
    fn connectivity_and_mode_track_feed() {
        let mut d = dash();
        d.apply(FeedEvent::Connectivity(true));
        assert!(d.connected);
        d.apply(FeedEvent::Mode(FeedMode::PollingFallback));
        d.apply(FeedEvent::Connectivity(false));
        assert!(!d.connected);
        assert_eq!(d.mode, FeedMode::PollingFallback);
    }

    #[test]
    fn control_feedback_expires() {
        let mut d = dash();
        let t0 = Instant::now();
        assert_eq!(d.control_status(t0), "Ready");
        d.control_sent("fire", t0);
        assert_eq!(d.control_status(t0), "Sent: FIRE");
        assert_eq!(d.control_status(t0 + Duration::from_millis(1001)), "Ready");
    }

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn key_map() {
        assert_eq!(
            key_action(key(KeyCode::Up, KeyEventKind::Press)),
            Some(Action::Control("up"))
        );
        assert_eq!(
            key_action(key(KeyCode::Enter, KeyEventKind::Press)),
            Some(Action::Control("fire"))
        );
        assert_eq!(
            key_action(key(KeyCode::Left, KeyEventKind::Release)),
            Some(Action::Control("release"))
        );
        assert_eq!(key_action(key(KeyCode::Enter, KeyEventKind::Release)), None);
        assert_eq!(key_action(key(KeyCode::Up, KeyEventKind::Repeat)), None);
        assert_eq!(key_action(key(KeyCode::Enter, KeyEventKind::Repeat)), None);
        assert_eq!(key_action(key(KeyCode::Char('m'), KeyEventKind::Repeat)), None);
        assert_eq!(
            key_action(key(KeyCode::Char('+'), KeyEventKind::Repeat)),
            Some(Action::LedBrighter)
        );
        assert_eq!(
            key_action(key(KeyCode::Esc, KeyEventKind::Press)),
            Some(Action::Quit)
        );
        assert_eq!(key_action(key(KeyCode::Char('z'), KeyEventKind::Press)), None);
    }

    #[test]
    fn draws_without_panicking_on_small_and_full_frames() {
        let mut d = dash();
        for i in 0..30 {
            d.apply(game_data(json!({"ufoScore": i * 10, "snakeScore": i, "currentGame": "ufo"})));
        }
        d.apply(FeedEvent::Message(Inbound::HighScores(HighScores {
            scores: vec![HighScore {
                player: "AAA".into(),
                game: "UFO Attack".into(),
                score: 4200,
            }],
        })));
        for (w, h) in [(120, 40), (40, 12), (10, 5)] {
            let mut term = Terminal::new(TestBackend::new(w, h)).unwrap();
            term.draw(|f| draw(f, &d)).unwrap();
        }
        let mut term = Terminal::new(TestBackend::new(120, 40)).unwrap();
        term.draw(|f| draw(f, &dash())).unwrap();
    }
}
