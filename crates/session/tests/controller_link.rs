use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use common::{ControlCommand, ControlMode, DashboardConfig, Direction, Key, Motor};
use session::{DashboardEvent, RenderView, SessionHandle};

const WAIT: Duration = Duration::from_secs(5);

async fn wait_for(view: &mut watch::Receiver<RenderView>, ready: impl Fn(&RenderView) -> bool) {
    timeout(WAIT, async {
        loop {
            if ready(&view.borrow_and_update()) {
                return;
            }
            view.changed().await.unwrap();
        }
    })
    .await
    .expect("view never reached the expected state");
}

#[tokio::test]
async fn frames_flow_in_and_commands_flow_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let controller = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Text(r#"{"angles":{"j1":0.5,"j2":0.25,"j3":0.125}}"#.into()))
            .await
            .unwrap();

        let mut received = Vec::new();
        while received.len() < 3 {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => received.push(text),
                Some(Ok(_)) => {}
                _ => break,
            }
        }
        received
    });

    let config = DashboardConfig {
        endpoint: format!("ws://{addr}"),
        ..Default::default()
    };
    let handle = SessionHandle::spawn(config);
    let mut view = handle.view();
    wait_for(&mut view, |v| v.link_up && v.snapshot.angles.j1 == 0.5).await;

    assert!(handle.send(DashboardEvent::Key { key: Key::Up, pressed: true }));
    assert!(handle.send(DashboardEvent::SelectMode(ControlMode::Myo)));

    let received = timeout(WAIT, controller).await.unwrap().unwrap();
    let decoded: Vec<ControlCommand> = received
        .iter()
        .map(|text| serde_json::from_str(text).unwrap())
        .collect();
    assert_eq!(
        decoded,
        vec![
            ControlCommand::start(Motor::One, Direction::Forward),
            ControlCommand::stop(Motor::One),
            ControlCommand::set_mode(ControlMode::Myo),
        ]
    );
    assert_eq!(received[0], r#"{"type":"control","motor":1,"dir":"forward","action":"start"}"#);

    let counts = handle.diagnostics();
    assert_eq!(counts.frames_received, 1);
    assert_eq!(counts.commands_sent, 3);

    handle.shutdown().await;
}

#[tokio::test]
async fn commands_are_dropped_without_a_controller() {
    // Grab a free port, then close it so nothing is listening.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let config = DashboardConfig {
        endpoint: format!("ws://{addr}"),
        reconnect_initial_ms: 20,
        reconnect_max_ms: 40,
        ..Default::default()
    };
    let handle = SessionHandle::spawn(config);
    let mut view = handle.view();

    assert!(handle.send(DashboardEvent::Key { key: Key::Right, pressed: true }));
    wait_for(&mut view, |v| v.keys.right).await;

    let current = handle.current();
    assert!(!current.link_up);
    assert_eq!(current.snapshot.logs.len(), 1);
    assert_eq!(handle.diagnostics().commands_dropped, 1);

    handle.shutdown().await;
}
