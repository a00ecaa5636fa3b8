use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use common::{CommandSink, ControlCommand, DashboardConfig, SharedDiagnostics, TelemetryError};

use crate::event::DashboardEvent;

/// Hands commands to the link task. While the socket is down commands are
/// dropped, logged and counted; nothing is queued for later.
pub struct LinkSink {
    outbound: mpsc::Sender<ControlCommand>,
    connected: Arc<AtomicBool>,
    diagnostics: Arc<SharedDiagnostics>,
}

impl LinkSink {
    pub fn new(
        outbound: mpsc::Sender<ControlCommand>,
        connected: Arc<AtomicBool>,
        diagnostics: Arc<SharedDiagnostics>,
    ) -> Self {
        Self {
            outbound,
            connected,
            diagnostics,
        }
    }
}

impl CommandSink for LinkSink {
    fn emit(&mut self, command: ControlCommand) {
        if !self.connected.load(Ordering::Acquire) {
            self.diagnostics.record_dropped();
            warn!(?command, "{}", TelemetryError::TransportUnavailable);
            return;
        }
        if let Err(err) = self.outbound.try_send(command) {
            self.diagnostics.record_dropped();
            warn!("outbound queue rejected command: {err}");
        }
    }
}

/// Keeps one WebSocket connection to the controller alive, reconnecting with
/// exponential backoff. Inbound text goes onto the event queue; commands from
/// `outbound` go out on the socket. Returns once the session is gone.
pub async fn run_link(
    config: DashboardConfig,
    events: mpsc::Sender<DashboardEvent>,
    mut outbound: mpsc::Receiver<ControlCommand>,
    connected: Arc<AtomicBool>,
    diagnostics: Arc<SharedDiagnostics>,
) {
    let mut backoff = config.reconnect_initial();

    loop {
        let attempt = tokio::select! {
            result = connect_async(config.endpoint.as_str()) => result,
            _ = events.closed() => return,
        };
        let (ws, _) = match attempt {
            Ok(value) => value,
            Err(err) => {
                diagnostics.record_reconnect();
                warn!(endpoint = %config.endpoint, "controller connect failed: {err}, retrying in {backoff:?}");
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {}
                    _ = events.closed() => return,
                }
                backoff = next_backoff(backoff, config.reconnect_max());
                continue;
            }
        };

        backoff = config.reconnect_initial();
        info!(endpoint = %config.endpoint, "controller link up");
        connected.store(true, Ordering::Release);
        if events.send(DashboardEvent::LinkUp).await.is_err() {
            return;
        }

        let (mut write, mut read) = ws.split();
        let reconnect = loop {
            tokio::select! {
                message = read.next() => match message {
                    Some(Ok(Message::Text(text))) => {
                        if events.send(DashboardEvent::Inbound(text)).await.is_err() {
                            break false;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break true,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        warn!("controller link error: {err}");
                        break true;
                    }
                },
                command = outbound.recv() => match command {
                    Some(command) => match command.to_json() {
                        Ok(json) => {
                            if let Err(err) = write.send(Message::Text(json)).await {
                                diagnostics.record_dropped();
                                warn!("sending command failed: {err}");
                                break true;
                            }
                            diagnostics.record_sent();
                        }
                        Err(err) => {
                            diagnostics.record_dropped();
                            warn!("{err}");
                        }
                    },
                    None => break false,
                },
                _ = events.closed() => break false,
            }
        };

        connected.store(false, Ordering::Release);
        // Anything still queued was meant for the old connection.
        while let Ok(command) = outbound.try_recv() {
            diagnostics.record_dropped();
            debug!(?command, "dropping command queued before disconnect");
        }
        let _ = write.close().await;

        if !reconnect {
            info!("controller link closed");
            return;
        }
        info!("controller link down");
        if events.send(DashboardEvent::LinkDown).await.is_err() {
            return;
        }
    }
}

pub fn next_backoff(current: Duration, max: Duration) -> Duration {
    (current * 2).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{ControlMode, Motor};

    #[test]
    fn backoff_doubles_up_to_ceiling() {
        let max = Duration::from_secs(10);
        let mut backoff = Duration::from_secs(1);
        let mut seen = Vec::new();
        for _ in 0..6 {
            backoff = next_backoff(backoff, max);
            seen.push(backoff.as_secs());
        }
        assert_eq!(seen, vec![2, 4, 8, 10, 10, 10]);
    }

    #[test]
    fn sink_drops_commands_while_disconnected() {
        let (tx, mut rx) = mpsc::channel(4);
        let connected = Arc::new(AtomicBool::new(false));
        let diagnostics = Arc::new(SharedDiagnostics::default());
        let mut sink = LinkSink::new(tx, connected.clone(), diagnostics.clone());

        sink.emit(ControlCommand::stop(Motor::One));
        assert!(rx.try_recv().is_err());
        assert_eq!(diagnostics.snapshot().commands_dropped, 1);

        connected.store(true, Ordering::Release);
        sink.emit(ControlCommand::set_mode(ControlMode::Myo));
        assert_eq!(rx.try_recv().unwrap(), ControlCommand::set_mode(ControlMode::Myo));
        assert_eq!(diagnostics.snapshot().commands_dropped, 1);
    }

    #[test]
    fn sink_counts_full_queue_as_dropped() {
        let (tx, _rx) = mpsc::channel(1);
        let diagnostics = Arc::new(SharedDiagnostics::default());
        let mut sink = LinkSink::new(tx, Arc::new(AtomicBool::new(true)), diagnostics.clone());

        sink.emit(ControlCommand::stop(Motor::One));
        sink.emit(ControlCommand::stop(Motor::Two));
        assert_eq!(diagnostics.snapshot().commands_dropped, 1);
    }
}
