//! Local stand-in for the finger controller: streams telemetry to every
//! connected dashboard and turns their commands into motor-driver payloads.

mod motor;
mod stream;

use std::env;
use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use common::config::load_config;
use common::logging::init_tracing;
use common::DashboardConfig;

use motor::{translate, BridgeAction, FingerState, FsrControl, IncomingCommand};

const MOTOR_TOPIC: &str = "motor/command";
const MODE_TOPIC: &str = "system/control_mode";

#[tokio::main]
async fn main() -> Result<()> {
    let config = match env::args().nth(1) {
        Some(path) => load_config(&path).with_context(|| format!("loading {path}"))?,
        None => DashboardConfig::default(),
    };
    init_tracing(&config.log_level);

    let listener = TcpListener::bind(&config.bridge.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.bridge.listen_addr))?;
    info!("controller bridge listening on ws://{}", listener.local_addr()?);

    let period = config.bridge.stream_period();
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted.context("accepting connection")?;
                tokio::spawn(handle_connection(stream, peer, period));
            }
            _ = tokio::signal::ctrl_c() => {
                info!("controller bridge stopped");
                break;
            }
        }
    }
    Ok(())
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, period: Duration) {
    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(err) => {
            warn!(%peer, "websocket handshake failed: {err}");
            return;
        }
    };
    info!(%peer, "dashboard connected");

    let (mut write, mut read) = ws.split();
    let mut rng = StdRng::from_entropy();
    let mut ticker = tokio::time::interval(period);
    let mut fsr = FsrControl::default();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let t = now_secs();
                let frame = stream::synthetic_frame(t, &mut rng);
                if write.send(Message::Text(frame.to_string())).await.is_err() {
                    break;
                }
                let finger = FingerState::from_force(stream::synthetic_force(t));
                if let Some(actions) = fsr.on_finger(finger) {
                    info!(?finger, "finger state changed");
                    actions.iter().for_each(publish_motor);
                }
            }
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => handle_command(&text, &mut fsr),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(%peer, "connection error: {err}");
                    break;
                }
            },
        }
    }
    info!(%peer, "dashboard disconnected");
}

fn handle_command(text: &str, fsr: &mut FsrControl) {
    let command: IncomingCommand = match serde_json::from_str(text) {
        Ok(command) => command,
        Err(_) => {
            warn!("received invalid JSON");
            return;
        }
    };

    match translate(&command) {
        BridgeAction::ModeChanged(mode) => {
            fsr.set_mode(&mode);
            info!(topic = MODE_TOPIC, %mode, fsr = fsr.is_active(), "control mode changed");
        }
        BridgeAction::Ignored => debug!(text, "ignoring command"),
        action => publish_motor(&action),
    }
}

fn publish_motor(action: &BridgeAction) {
    if let Some(payload) = action.motor_payload() {
        info!(topic = MOTOR_TOPIC, %payload, "motor command");
    }
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
