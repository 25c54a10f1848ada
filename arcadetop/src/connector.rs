//! Live feed connector.
//!
//! A single task owns the socket, the retry counter and both timers. Everything
//! that can change connector state arrives as a [`Signal`] on one internal
//! channel (dial results, frames, socket closure, timer expiry) or as a
//! [`Command`] from a [`ConnectorHandle`], and is handled to completion before
//! the next one. Outputs go out on a single [`FeedEvent`] channel.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::FeedError;
use crate::types::Inbound;
use crate::ws::{Dialer, Link};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMode {
    Live,
    /// Reconnect budget spent; telemetry is pulled over HTTP instead.
    PollingFallback,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Connectivity(bool),
    Message(Inbound),
    Diagnostic(String),
    Mode(FeedMode),
}

/// Pull path used while in [`FeedMode::PollingFallback`].
#[async_trait]
pub trait Poller: Send + Sync {
    async fn poll(&self) -> Result<Vec<Inbound>, FeedError>;
}

#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    pub reconnect_delay: Duration,
    pub max_reconnect_attempts: u32,
    pub poll_interval: Duration,
    /// Off means fallback mode stays quiet until a manual connect.
    pub poll_enabled: bool,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_millis(3000),
            max_reconnect_attempts: 5,
            poll_interval: Duration::from_millis(2000),
            poll_enabled: true,
        }
    }
}

pub enum Signal {
    Dialed {
        generation: u64,
        result: Result<Link, FeedError>,
    },
    Frame {
        generation: u64,
        text: String,
    },
    SocketClosed {
        generation: u64,
    },
    RetryDue,
    PollTick,
    Polled(Result<Vec<Inbound>, FeedError>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Connect,
    Send(String),
    Polling { enabled: bool, interval: Duration },
    Shutdown,
}

pub struct Connector {
    endpoint: Url,
    cfg: ConnectorConfig,
    dialer: Arc<dyn Dialer>,
    poller: Arc<dyn Poller>,
    events: mpsc::UnboundedSender<FeedEvent>,

    state: ConnectionState,
    mode: FeedMode,
    attempts: u32,
    // Bumped per dial; socket signals from older generations are stale.
    generation: u64,
    dials: u64,
    fallback_activations: u32,

    outbound: Option<mpsc::UnboundedSender<String>>,
    dial_task: Option<JoinHandle<()>>,
    pump: Option<JoinHandle<()>>,
    reconnect_timer: Option<JoinHandle<()>>,
    poll_timer: Option<JoinHandle<()>>,
    // At most one HTTP poll in flight.
    poll_request: Option<JoinHandle<()>>,

    signal_tx: mpsc::UnboundedSender<Signal>,
    signal_rx: mpsc::UnboundedReceiver<Signal>,
}

impl Connector {
    pub fn new(
        endpoint: Url,
        cfg: ConnectorConfig,
        dialer: Arc<dyn Dialer>,
        poller: Arc<dyn Poller>,
        events: mpsc::UnboundedSender<FeedEvent>,
    ) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        Self {
            endpoint,
            cfg,
            dialer,
            poller,
            events,
            state: ConnectionState::Disconnected,
            mode: FeedMode::Live,
            attempts: 0,
            generation: 0,
            dials: 0,
            fallback_activations: 0,
            outbound: None,
            dial_task: None,
            pump: None,
            reconnect_timer: None,
            poll_timer: None,
            poll_request: None,
            signal_tx,
            signal_rx,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn mode(&self) -> FeedMode {
        self.mode
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Number of sockets this connector has tried to open.
    pub fn dials(&self) -> u64 {
        self.dials
    }

    pub fn fallback_activations(&self) -> u32 {
        self.fallback_activations
    }

    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_timer.is_some()
    }

    pub fn polling(&self) -> bool {
        self.poll_timer.is_some()
    }

    fn emit(&self, ev: FeedEvent) {
        // The dashboard going away is not the connector's problem.
        let _ = self.events.send(ev);
    }

    /// Open a socket unless one is already open or opening.
    pub fn connect(&mut self) {
        if self.state != ConnectionState::Disconnected {
            debug!(state = ?self.state, "connect ignored");
            return;
        }
        cancel(&mut self.reconnect_timer);
        self.state = ConnectionState::Connecting;
        self.generation += 1;
        self.dials += 1;

        let generation = self.generation;
        let dialer = Arc::clone(&self.dialer);
        let endpoint = self.endpoint.clone();
        let tx = self.signal_tx.clone();
        info!(endpoint = %self.endpoint, attempt = self.attempts, "connecting");
        self.dial_task = Some(tokio::spawn(async move {
            let result = dialer.dial(&endpoint).await;
            let _ = tx.send(Signal::Dialed { generation, result });
        }));
    }

    fn on_open(&mut self, generation: u64, link: Link) {
        if generation != self.generation || self.state != ConnectionState::Connecting {
            debug!(generation, "dropping stale socket");
            return;
        }
        self.dial_task = None;
        self.state = ConnectionState::Connected;
        self.attempts = 0;
        self.outbound = Some(link.outbound);

        let tx = self.signal_tx.clone();
        let mut inbound = link.inbound;
        self.pump = Some(tokio::spawn(async move {
            while let Some(text) = inbound.recv().await {
                if tx.send(Signal::Frame { generation, text }).is_err() {
                    return;
                }
            }
            let _ = tx.send(Signal::SocketClosed { generation });
        }));

        if self.mode == FeedMode::PollingFallback {
            cancel(&mut self.poll_timer);
            cancel(&mut self.poll_request);
            self.mode = FeedMode::Live;
            self.emit(FeedEvent::Mode(FeedMode::Live));
            info!("live feed restored, polling stopped");
        }
        info!(endpoint = %self.endpoint, "connected");
        self.emit(FeedEvent::Connectivity(true));
    }

    /// Classify one text frame and publish it. Bad frames are dropped.
    pub fn on_message(&self, raw: &str) {
        match Inbound::parse(raw) {
            Ok(Inbound::Unknown(kind)) => debug!(%kind, "ignoring unknown message type"),
            Ok(msg) => {
                trace!(kind = msg.kind(), "frame");
                self.emit(FeedEvent::Message(msg));
            }
            Err(e) => {
                warn!(error = %e, "dropping frame");
                self.emit(FeedEvent::Diagnostic(e.to_string()));
            }
        }
    }

    /// Transport closed, errored, or never opened.
    pub fn on_close(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.outbound = None;
        self.dial_task = None;
        cancel(&mut self.pump);
        self.emit(FeedEvent::Connectivity(false));

        if self.mode == FeedMode::PollingFallback {
            debug!("socket closed while polling; not reconnecting");
            return;
        }
        self.attempts += 1;
        if self.attempts >= self.cfg.max_reconnect_attempts {
            self.activate_fallback();
        } else {
            self.schedule_reconnect();
        }
    }

    fn schedule_reconnect(&mut self) {
        cancel(&mut self.reconnect_timer);
        let delay = self.cfg.reconnect_delay;
        let tx = self.signal_tx.clone();
        info!(
            attempt = self.attempts,
            max = self.cfg.max_reconnect_attempts,
            delay_ms = delay.as_millis() as u64,
            "disconnected, scheduling reconnect"
        );
        self.reconnect_timer = Some(tokio::spawn(async move {
            sleep(delay).await;
            let _ = tx.send(Signal::RetryDue);
        }));
    }

    fn activate_fallback(&mut self) {
        if self.mode == FeedMode::PollingFallback {
            return;
        }
        cancel(&mut self.reconnect_timer);
        self.mode = FeedMode::PollingFallback;
        self.fallback_activations += 1;
        warn!(
            attempts = self.attempts,
            interval_ms = self.cfg.poll_interval.as_millis() as u64,
            "reconnect budget exhausted, falling back to polling"
        );
        self.start_polling();
        self.emit(FeedEvent::Mode(FeedMode::PollingFallback));
    }

    // Replaces any running poll timer. First tick fires immediately.
    fn start_polling(&mut self) {
        cancel(&mut self.poll_timer);
        if !self.cfg.poll_enabled {
            debug!("polling disabled");
            return;
        }
        let period = self.cfg.poll_interval;
        let tx = self.signal_tx.clone();
        self.poll_timer = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if tx.send(Signal::PollTick).is_err() {
                    return;
                }
            }
        }));
    }

    /// Apply new polling settings; restarts the timer if currently polling.
    pub fn set_polling(&mut self, enabled: bool, interval: Duration) {
        self.cfg.poll_enabled = enabled;
        self.cfg.poll_interval = interval.max(Duration::from_millis(1));
        if self.mode == FeedMode::PollingFallback {
            self.start_polling();
        }
    }

    fn on_poll_tick(&mut self) {
        if self.mode != FeedMode::PollingFallback {
            return;
        }
        if self.poll_request.as_ref().is_some_and(|h| !h.is_finished()) {
            debug!("previous poll still running, tick skipped");
            return;
        }
        let poller = Arc::clone(&self.poller);
        let tx = self.signal_tx.clone();
        self.poll_request = Some(tokio::spawn(async move {
            let _ = tx.send(Signal::Polled(poller.poll().await));
        }));
    }

    fn on_polled(&mut self, result: Result<Vec<Inbound>, FeedError>) {
        self.poll_request = None;
        if self.mode != FeedMode::PollingFallback {
            debug!("live feed active, poll result dropped");
            return;
        }
        match result {
            Ok(msgs) => {
                for m in msgs {
                    self.emit(FeedEvent::Message(m));
                }
            }
            Err(e) => {
                warn!(error = %e, "poll failed");
                self.emit(FeedEvent::Connectivity(false));
            }
        }
    }

    /// Whether an HTTP poll is currently in flight.
    pub fn poll_in_flight(&self) -> bool {
        self.poll_request.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Best-effort write; dropped (and logged) unless connected.
    pub fn send(&self, text: String) {
        match (&self.outbound, self.state) {
            (Some(out), ConnectionState::Connected) => {
                if out.send(text).is_err() {
                    warn!("socket writer gone, frame dropped");
                }
            }
            _ => debug!(state = ?self.state, "not connected, frame dropped"),
        }
    }

    pub fn handle_signal(&mut self, sig: Signal) {
        match sig {
            Signal::Dialed { generation, result } => {
                if generation != self.generation {
                    return;
                }
                match result {
                    Ok(link) => self.on_open(generation, link),
                    Err(e) => {
                        warn!(error = %e, endpoint = %self.endpoint, "connect failed");
                        self.on_close();
                    }
                }
            }
            Signal::Frame { generation, text } => {
                if generation == self.generation && self.state == ConnectionState::Connected {
                    self.on_message(&text);
                }
            }
            Signal::SocketClosed { generation } => {
                if generation == self.generation && self.state == ConnectionState::Connected {
                    info!("socket closed");
                    self.on_close();
                }
            }
            Signal::RetryDue => {
                self.reconnect_timer = None;
                self.connect();
            }
            Signal::PollTick => self.on_poll_tick(),
            Signal::Polled(result) => self.on_polled(result),
        }
    }

    /// Returns false once the connector should stop.
    pub fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Connect => {
                self.connect();
                true
            }
            Command::Send(text) => {
                self.send(text);
                true
            }
            Command::Polling { enabled, interval } => {
                self.set_polling(enabled, interval);
                true
            }
            Command::Shutdown => false,
        }
    }

    /// Wait for and handle the next internal signal.
    pub async fn step(&mut self) {
        if let Some(sig) = self.signal_rx.recv().await {
            self.handle_signal(sig);
        }
    }

    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        self.connect();
        loop {
            tokio::select! {
                Some(sig) = self.signal_rx.recv() => self.handle_signal(sig),
                cmd = commands.recv() => match cmd {
                    Some(cmd) => {
                        if !self.handle_command(cmd) {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
        self.shutdown();
    }

    fn shutdown(&mut self) {
        cancel(&mut self.reconnect_timer);
        cancel(&mut self.poll_timer);
        cancel(&mut self.poll_request);
        cancel(&mut self.pump);
        cancel(&mut self.dial_task);
        self.outbound = None;
        self.state = ConnectionState::Disconnected;
        debug!("connector stopped");
    }
}

impl Drop for Connector {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn cancel(slot: &mut Option<JoinHandle<()>>) {
    if let Some(h) = slot.take() {
        h.abort();
    }
}

/// The only way the rest of the app reaches the connector.
#[derive(Clone)]
pub struct ConnectorHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl ConnectorHandle {
    /// Manual connect; also the way out of polling fallback.
    pub fn connect(&self) -> Result<(), FeedError> {
        self.commands
            .send(Command::Connect)
            .map_err(|_| FeedError::Closed)
    }

    pub fn send<T: Serialize>(&self, message: &T) -> Result<(), FeedError> {
        let text = serde_json::to_string(message)?;
        self.commands
            .send(Command::Send(text))
            .map_err(|_| FeedError::Closed)
    }

    pub fn set_polling(&self, enabled: bool, interval: Duration) -> Result<(), FeedError> {
        self.commands
            .send(Command::Polling { enabled, interval })
            .map_err(|_| FeedError::Closed)
    }

    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

/// Start the connector task. It dials immediately.
pub fn spawn(
    endpoint: Url,
    cfg: ConnectorConfig,
    dialer: Arc<dyn Dialer>,
    poller: Arc<dyn Poller>,
) -> (
    ConnectorHandle,
    mpsc::UnboundedReceiver<FeedEvent>,
    JoinHandle<()>,
) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let connector = Connector::new(endpoint, cfg, dialer, poller, events_tx);
    let task = tokio::spawn(connector.run(cmd_rx));
    (ConnectorHandle { commands: cmd_tx }, events_rx, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    // Far end of a fake socket.
    struct Peer {
        to_client: mpsc::UnboundedSender<String>,
        from_client: mpsc::UnboundedReceiver<String>,
    }

    #[derive(Default)]
    struct FakeDialer {
        accept: AtomicBool,
        dials: AtomicUsize,
        peers: Mutex<Vec<Peer>>,
    }

    impl FakeDialer {
        fn accepting() -> Arc<Self> {
            let d = Self::default();
            d.accept.store(true, Ordering::SeqCst);
            Arc::new(d)
        }

        fn take_peer(&self) -> Peer {
            self.peers.lock().unwrap().remove(0)
        }
    }

    #[async_trait]
    impl Dialer for FakeDialer {
        async fn dial(&self, _endpoint: &Url) -> Result<Link, FeedError> {
            self.dials.fetch_add(1, Ordering::SeqCst);
            if !self.accept.load(Ordering::SeqCst) {
                return Err(FeedError::Transport("connection refused".into()));
            }
            let (to_client, inbound) = mpsc::unbounded_channel();
            let (outbound, from_client) = mpsc::unbounded_channel();
            self.peers.lock().unwrap().push(Peer {
                to_client,
                from_client,
            });
            Ok(Link { outbound, inbound })
        }
    }

    #[derive(Default)]
    struct CountingPoller {
        polls: AtomicUsize,
    }

    #[async_trait]
    impl Poller for CountingPoller {
        async fn poll(&self) -> Result<Vec<Inbound>, FeedError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Inbound::classify("gameData", serde_json::json!({"ufoScore": 1}))?])
        }
    }

    // Fails after `delay`, like a device that stopped answering HTTP.
    struct SlowPoller {
        delay: Duration,
        polls: AtomicUsize,
    }

    impl SlowPoller {
        fn new(delay_ms: u64) -> Arc<Self> {
            Arc::new(Self {
                delay: Duration::from_millis(delay_ms),
                polls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Poller for SlowPoller {
        async fn poll(&self) -> Result<Vec<Inbound>, FeedError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            sleep(self.delay).await;
            Err(FeedError::Request("gamedata returned 503".into()))
        }
    }

    fn connector(
        dialer: Arc<FakeDialer>,
        poller: Arc<CountingPoller>,
    ) -> (Connector, mpsc::UnboundedReceiver<FeedEvent>) {
        connector_with(dialer, poller)
    }

    fn connector_with(
        dialer: Arc<FakeDialer>,
        poller: Arc<dyn Poller>,
    ) -> (Connector, mpsc::UnboundedReceiver<FeedEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let url = Url::parse("ws://device.local/ws").unwrap();
        (
            Connector::new(url, ConnectorConfig::default(), dialer, poller, tx),
            rx,
        )
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<FeedEvent>) -> Vec<FeedEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn connect_success_resets_attempts_and_notifies() {
        let dialer = FakeDialer::accepting();
        let (mut c, mut rx) = connector(dialer.clone(), Arc::default());
        c.on_close();
        assert_eq!(c.attempts(), 1);
        drain(&mut rx);

        c.connect();
        assert_eq!(c.state(), ConnectionState::Connecting);
        c.step().await;
        assert_eq!(c.state(), ConnectionState::Connected);
        assert_eq!(c.attempts(), 0);
        assert!(!c.reconnect_pending());
        assert_eq!(drain(&mut rx), vec![FeedEvent::Connectivity(true)]);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_is_idempotent_while_connecting_or_connected() {
        let dialer = FakeDialer::accepting();
        let (mut c, _rx) = connector(dialer.clone(), Arc::default());
        c.connect();
        c.connect();
        assert_eq!(c.dials(), 1);
        c.step().await;
        assert_eq!(c.state(), ConnectionState::Connected);

        c.connect();
        assert_eq!(c.dials(), 1);
        assert_eq!(c.state(), ConnectionState::Connected);
        assert_eq!(dialer.dials.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn first_close_schedules_reconnect_after_delay() {
        let dialer = Arc::new(FakeDialer::default());
        let (mut c, mut rx) = connector(dialer.clone(), Arc::default());
        let t0 = Instant::now();
        c.on_close();
        assert_eq!(c.attempts(), 1);
        assert!(c.reconnect_pending());
        assert_eq!(drain(&mut rx), vec![FeedEvent::Connectivity(false)]);

        // Paused clock auto-advances exactly to the timer deadline.
        c.step().await;
        let waited = Instant::now() - t0;
        assert!(waited >= Duration::from_millis(3000) && waited < Duration::from_millis(3010));
        assert_eq!(c.state(), ConnectionState::Connecting);
        assert_eq!(c.dials(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn five_closes_activate_fallback_exactly_once() {
        let poller = Arc::new(CountingPoller::default());
        let (mut c, mut rx) = connector(Arc::new(FakeDialer::default()), poller.clone());
        for _ in 0..5 {
            c.on_close();
        }
        assert_eq!(c.mode(), FeedMode::PollingFallback);
        assert_eq!(c.fallback_activations(), 1);
        assert!(!c.reconnect_pending());
        assert!(c.polling());

        c.on_close();
        assert_eq!(c.fallback_activations(), 1);
        assert!(!c.reconnect_pending());

        let evs = drain(&mut rx);
        let modes = evs
            .iter()
            .filter(|e| matches!(e, FeedEvent::Mode(FeedMode::PollingFallback)))
            .count();
        assert_eq!(modes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_dials_exhaust_budget_then_poll() {
        let dialer = Arc::new(FakeDialer::default());
        let poller = Arc::new(CountingPoller::default());
        let (mut c, mut rx) = connector(dialer.clone(), poller.clone());
        c.connect();
        // dial fail, then (retry, dial fail) until the budget is spent
        while c.mode() == FeedMode::Live {
            c.step().await;
        }
        assert_eq!(dialer.dials.load(Ordering::SeqCst), 5);
        assert_eq!(c.fallback_activations(), 1);

        c.step().await; // first poll tick fires immediately
        c.step().await; // its result comes back as a signal
        assert_eq!(poller.polls.load(Ordering::SeqCst), 1);
        assert!(!c.poll_in_flight());
        let evs = drain(&mut rx);
        assert!(evs
            .iter()
            .any(|e| matches!(e, FeedEvent::Message(Inbound::GameData(_)))));
    }

    #[tokio::test(start_paused = true)]
    async fn polling_can_be_paused_and_restarted() {
        let (mut c, _rx) = connector(Arc::new(FakeDialer::default()), Arc::default());
        for _ in 0..5 {
            c.on_close();
        }
        assert!(c.polling());
        c.set_polling(false, Duration::from_millis(2000));
        assert!(!c.polling());
        assert_eq!(c.mode(), FeedMode::PollingFallback);
        c.set_polling(true, Duration::from_millis(4000));
        assert!(c.polling());
    }

    #[tokio::test(start_paused = true)]
    async fn polling_settings_do_not_start_timer_while_live() {
        let (mut c, _rx) = connector(FakeDialer::accepting(), Arc::default());
        c.set_polling(true, Duration::from_millis(1000));
        assert!(!c.polling());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_connect_leaves_fallback() {
        let dialer = Arc::new(FakeDialer::default());
        let (mut c, mut rx) = connector(dialer.clone(), Arc::default());
        for _ in 0..5 {
            c.on_close();
        }
        assert!(c.polling());
        drain(&mut rx);

        dialer.accept.store(true, Ordering::SeqCst);
        c.connect();
        // a poll tick may be handled before the dial result
        while c.state() != ConnectionState::Connected {
            c.step().await;
        }
        assert_eq!(c.mode(), FeedMode::Live);
        assert!(!c.polling());
        let lifecycle: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|e| !matches!(e, FeedEvent::Message(_)))
            .collect();
        assert_eq!(
            lifecycle,
            vec![
                FeedEvent::Mode(FeedMode::Live),
                FeedEvent::Connectivity(true)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn frames_are_classified_and_bad_ones_dropped() {
        let dialer = FakeDialer::accepting();
        let (mut c, mut rx) = connector(dialer.clone(), Arc::default());
        c.connect();
        c.step().await;
        drain(&mut rx);

        let peer = dialer.take_peer();
        peer.to_client.send("{not json".into()).unwrap();
        peer.to_client
            .send(r#"{"type":"futureThing","payload":{}}"#.into())
            .unwrap();
        peer.to_client
            .send(r#"{"type":"gameState","payload":{"currentGame":"pong"}}"#.into())
            .unwrap();
        for _ in 0..3 {
            c.step().await;
        }
        let evs = drain(&mut rx);
        assert_eq!(evs.len(), 2);
        assert!(matches!(evs[0], FeedEvent::Diagnostic(_)));
        match &evs[1] {
            FeedEvent::Message(Inbound::GameState(gs)) => {
                assert_eq!(gs.current_game.as_deref(), Some("pong"))
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn send_only_reaches_an_open_socket() {
        let dialer = FakeDialer::accepting();
        let (mut c, _rx) = connector(dialer.clone(), Arc::default());
        c.send("dropped".into());
        c.connect();
        c.step().await;
        c.send(r#"{"type":"LED_CONTROL"}"#.into());

        let mut peer = dialer.take_peer();
        assert_eq!(
            peer.from_client.try_recv().unwrap(),
            r#"{"type":"LED_CONTROL"}"#
        );
        assert!(peer.from_client.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn peer_close_triggers_reconnect() {
        let dialer = FakeDialer::accepting();
        let (mut c, mut rx) = connector(dialer.clone(), Arc::default());
        c.connect();
        c.step().await;
        drop(dialer.take_peer());
        c.step().await;
        assert_eq!(c.state(), ConnectionState::Disconnected);
        assert!(c.reconnect_pending());
        assert_eq!(
            drain(&mut rx),
            vec![
                FeedEvent::Connectivity(true),
                FeedEvent::Connectivity(false)
            ]
        );
    }
    #[tokio::test(start_paused = true)]
    async fn poll_in_flight_at_reconnect_does_not_touch_live_state() {
        let dialer = Arc::new(FakeDialer::default());
        let poller = SlowPoller::new(500);
        let (mut c, mut rx) = connector_with(dialer.clone(), poller.clone());
        for _ in 0..5 {
            c.on_close();
        }
        c.step().await; // first tick starts a slow poll
        while poller.polls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(c.poll_in_flight());

        dialer.accept.store(true, Ordering::SeqCst);
        c.connect();
        while c.state() != ConnectionState::Connected {
            c.step().await;
        }
        assert!(!c.poll_in_flight());

        // Well past the point the poll would have failed.
        sleep(Duration::from_millis(600)).await;
        while let Ok(sig) = c.signal_rx.try_recv() {
            c.handle_signal(sig);
        }
        assert_eq!(c.mode(), FeedMode::Live);
        let last = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, FeedEvent::Connectivity(_)))
            .last();
        assert_eq!(last, Some(FeedEvent::Connectivity(true)));
    }

    #[tokio::test(start_paused = true)]
    async fn late_poll_result_is_dropped_once_live() {
        let (mut c, mut rx) = connector(FakeDialer::accepting(), Arc::default());
        c.connect();
        c.step().await;
        drain(&mut rx);

        c.handle_signal(Signal::Polled(Ok(vec![Inbound::classify(
            "gameData",
            serde_json::json!({"ufoScore": 9}),
        )
        .unwrap()])));
        c.handle_signal(Signal::Polled(Err(FeedError::Timeout(5000))));
        assert!(drain(&mut rx).is_empty());
        assert_eq!(c.state(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_poll_skips_overlapping_ticks() {
        let poller = SlowPoller::new(3000);
        let (mut c, mut rx) = connector_with(Arc::new(FakeDialer::default()), poller.clone());
        for _ in 0..5 {
            c.on_close();
        }
        drain(&mut rx);

        c.step().await; // t=0 tick starts the poll
        c.step().await; // t=2000 tick lands while it is still running
        tokio::task::yield_now().await;
        assert_eq!(poller.polls.load(Ordering::SeqCst), 1);
        assert!(c.poll_in_flight());

        c.step().await; // t=3000 failure arrives
        assert!(!c.poll_in_flight());
        assert_eq!(drain(&mut rx), vec![FeedEvent::Connectivity(false)]);
    }
}
