use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{info, warn};

use common::{
    CommandSink, ControlCommand, DashboardConfig, DiagnosticsSnapshot, SharedDiagnostics,
    TelemetryManager,
};

use crate::event::DashboardEvent;
use crate::link::{run_link, LinkSink};
use crate::view::RenderView;

enum Step {
    Event(Option<DashboardEvent>),
    Tick,
}

/// The single consumer of dashboard events and the only writer of state.
///
/// Runs until `Shutdown` arrives or every event sender is gone, then hands
/// the manager back.
pub async fn run_session<S: CommandSink>(
    config: DashboardConfig,
    mut events: mpsc::Receiver<DashboardEvent>,
    sink: S,
    view_tx: watch::Sender<RenderView>,
    diagnostics: Arc<SharedDiagnostics>,
) -> TelemetryManager<S> {
    let period = config.simulation_period();
    let mut manager = TelemetryManager::new(sink);
    let mut rng = StdRng::from_entropy();
    let mut ticker: Option<Interval> = None;
    let mut link_up = false;

    info!(session = %config.session_name, "session started");
    view_tx.send_replace(RenderView::capture(&manager, link_up));

    loop {
        // Queued events win over a due tick, so a stop is never overtaken.
        let step = tokio::select! {
            biased;
            event = events.recv() => Step::Event(event),
            _ = next_tick(&mut ticker) => Step::Tick,
        };

        match step {
            Step::Tick => {
                manager.simulation_tick(Utc::now().timestamp_millis() as f64, &mut rng);
            }
            Step::Event(None) => break,
            Step::Event(Some(event)) => {
                match event {
                    DashboardEvent::Inbound(payload) => match manager.apply_inbound_frame(&payload) {
                        Ok(()) => diagnostics.record_frame(),
                        Err(err) => {
                            diagnostics.record_malformed();
                            warn!("discarding frame: {err}");
                        }
                    },
                    DashboardEvent::LinkUp => link_up = true,
                    DashboardEvent::LinkDown => link_up = false,
                    DashboardEvent::Key { key, pressed } => {
                        manager.on_key_transition(key, pressed);
                    }
                    DashboardEvent::SelectMode(mode) => manager.set_control_mode(mode),
                    DashboardEvent::Simulation(true) => {
                        manager.start_simulation();
                    }
                    DashboardEvent::Simulation(false) => {
                        manager.stop_simulation();
                    }
                    DashboardEvent::ToggleSimulation => {
                        if manager.is_simulating() {
                            manager.stop_simulation();
                        } else {
                            manager.start_simulation();
                        }
                    }
                    DashboardEvent::Shutdown => break,
                }
                // Same turn as the event: a cancelled timer cannot fire again.
                sync_ticker(&mut ticker, manager.is_simulating(), period);
            }
        }

        view_tx.send_replace(RenderView::capture(&manager, link_up));
    }

    manager.stop_simulation();
    view_tx.send_replace(RenderView::capture(&manager, link_up));
    info!(session = %config.session_name, "session stopped");
    manager
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn sync_ticker(ticker: &mut Option<Interval>, simulating: bool, period: Duration) {
    match (simulating, ticker.is_some()) {
        (true, false) => {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            *ticker = Some(interval);
        }
        (false, true) => *ticker = None,
        _ => {}
    }
}

/// Sink for sessions without a controller: commands are only logged.
#[derive(Debug, Default)]
pub struct LoggingSink {
    pub emitted: u64,
}

impl CommandSink for LoggingSink {
    fn emit(&mut self, command: ControlCommand) {
        match command.to_json() {
            Ok(json) => info!(command = %json, "offline, command not sent"),
            Err(err) => warn!("{err}"),
        }
        self.emitted += 1;
    }
}

/// A running session: the event queue's front door and the render view.
pub struct SessionHandle {
    events: mpsc::Sender<DashboardEvent>,
    view: watch::Receiver<RenderView>,
    diagnostics: Arc<SharedDiagnostics>,
    session: JoinHandle<()>,
    link: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Live session talking to `config.endpoint`. Needs a tokio runtime context.
    pub fn spawn(config: DashboardConfig) -> Self {
        let diagnostics = Arc::new(SharedDiagnostics::default());
        let capacity = config.event_queue_capacity.max(1);
        let (events_tx, events_rx) = mpsc::channel(capacity);
        let (outbound_tx, outbound_rx) = mpsc::channel(capacity);
        let (view_tx, view_rx) = watch::channel(RenderView::initial());
        let connected = Arc::new(AtomicBool::new(false));

        let sink = LinkSink::new(outbound_tx, connected.clone(), diagnostics.clone());
        let link = tokio::spawn(run_link(
            config.clone(),
            events_tx.clone(),
            outbound_rx,
            connected,
            diagnostics.clone(),
        ));

        let session_diagnostics = diagnostics.clone();
        let session = tokio::spawn(async move {
            run_session(config, events_rx, sink, view_tx, session_diagnostics).await;
        });

        Self {
            events: events_tx,
            view: view_rx,
            diagnostics,
            session,
            link: Some(link),
        }
    }

    /// Session with no controller link, for test mode on its own.
    pub fn spawn_offline(config: DashboardConfig) -> Self {
        let diagnostics = Arc::new(SharedDiagnostics::default());
        let (events_tx, events_rx) = mpsc::channel(config.event_queue_capacity.max(1));
        let (view_tx, view_rx) = watch::channel(RenderView::initial());

        let session_diagnostics = diagnostics.clone();
        let session = tokio::spawn(async move {
            let manager = run_session(
                config,
                events_rx,
                LoggingSink::default(),
                view_tx,
                session_diagnostics,
            )
            .await;
            info!(commands = manager.sink().emitted, "offline session finished");
        });

        Self {
            events: events_tx,
            view: view_rx,
            diagnostics,
            session,
            link: None,
        }
    }

    pub fn events(&self) -> mpsc::Sender<DashboardEvent> {
        self.events.clone()
    }

    pub fn view(&self) -> watch::Receiver<RenderView> {
        self.view.clone()
    }

    /// Latest state, never waits on the session.
    pub fn current(&self) -> RenderView {
        self.view.borrow().clone()
    }

    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    /// Non-blocking enqueue for UI threads. Returns false if the queue is
    /// full or the session has ended.
    pub fn send(&self, event: DashboardEvent) -> bool {
        match self.events.try_send(event) {
            Ok(()) => true,
            Err(err) => {
                warn!("event not queued: {err}");
                false
            }
        }
    }

    pub async fn shutdown(self) {
        let _ = self.events.send(DashboardEvent::Shutdown).await;
        drop(self.events);
        if let Err(err) = self.session.await {
            warn!("session task failed: {err}");
        }
        if let Some(link) = self.link {
            if let Err(err) = link.await {
                warn!("link task failed: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{ControlMode, Key};

    fn start(
        config: DashboardConfig,
    ) -> (
        mpsc::Sender<DashboardEvent>,
        watch::Receiver<RenderView>,
        JoinHandle<TelemetryManager<Vec<ControlCommand>>>,
    ) {
        let (tx, rx) = mpsc::channel(16);
        let (view_tx, view_rx) = watch::channel(RenderView::initial());
        let diagnostics = Arc::new(SharedDiagnostics::default());
        let task = tokio::spawn(run_session(config, rx, Vec::new(), view_tx, diagnostics));
        (tx, view_rx, task)
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_only_while_simulating() {
        let (tx, view, task) = start(DashboardConfig::default());

        tx.send(DashboardEvent::Simulation(true)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(260)).await;
        let running = view.borrow().simulation_ticks;
        assert!(running >= 4, "expected several ticks, got {running}");

        tx.send(DashboardEvent::ToggleSimulation).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let stopped_at = view.borrow().simulation_ticks;
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(view.borrow().simulation_ticks, stopped_at);
        assert!(!view.borrow().simulating);

        tx.send(DashboardEvent::Shutdown).await.unwrap();
        let manager = task.await.unwrap();
        assert!(manager.sink().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn mode_switch_stops_ticks_and_sends_one_set_mode() {
        let (tx, view, task) = start(DashboardConfig::default());

        tx.send(DashboardEvent::Simulation(true)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(160)).await;
        assert!(view.borrow().simulation_ticks >= 2);

        tx.send(DashboardEvent::SelectMode(ControlMode::Myo)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        let (stopped_at, angles) = {
            let current = view.borrow();
            assert!(!current.simulating);
            assert_eq!(current.mode, ControlMode::Myo);
            (current.simulation_ticks, current.snapshot.angles)
        };

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(view.borrow().simulation_ticks, stopped_at);
        assert_eq!(view.borrow().snapshot.angles, angles);

        tx.send(DashboardEvent::Shutdown).await.unwrap();
        let manager = task.await.unwrap();
        assert_eq!(manager.sink(), &vec![ControlCommand::set_mode(ControlMode::Myo)]);
    }

    #[tokio::test(start_paused = true)]
    async fn view_tracks_keys_and_link_state() {
        let (tx, view, task) = start(DashboardConfig::default());

        tx.send(DashboardEvent::LinkUp).await.unwrap();
        tx.send(DashboardEvent::Key { key: Key::Down, pressed: true }).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        {
            let current = view.borrow();
            assert!(current.link_up);
            assert!(current.keys.down);
            assert!(current.show_manual_overlay());
        }

        tx.send(DashboardEvent::SelectMode(ControlMode::Fsr)).await.unwrap();
        tx.send(DashboardEvent::LinkDown).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        {
            let current = view.borrow();
            assert!(!current.link_up);
            assert!(!current.show_manual_overlay());
            assert!(!current.keys.down);
        }

        drop(tx);
        let manager = task.await.unwrap();
        assert_eq!(manager.sink().len(), 3);
    }

    #[tokio::test]
    async fn malformed_frames_are_counted_not_fatal() {
        let config = DashboardConfig::default();
        let (tx, rx) = mpsc::channel(16);
        let (view_tx, view_rx) = watch::channel(RenderView::initial());
        let diagnostics = Arc::new(SharedDiagnostics::default());
        let task = tokio::spawn(run_session(config, rx, Vec::new(), view_tx, diagnostics.clone()));

        tx.send(DashboardEvent::Inbound("garbage".into())).await.unwrap();
        tx.send(DashboardEvent::Inbound(r#"{"sensors":{"flex":12,"force":"1.00"}}"#.into()))
            .await
            .unwrap();
        tx.send(DashboardEvent::Shutdown).await.unwrap();
        task.await.unwrap();

        let counts = diagnostics.snapshot();
        assert_eq!(counts.malformed_frames, 1);
        assert_eq!(counts.frames_received, 1);
        let current = view_rx.borrow();
        assert_eq!(current.snapshot.sensors.flex, 12);
        assert_eq!(current.snapshot.logs.len(), 2);
    }
}
