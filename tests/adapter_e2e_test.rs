use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};

use pirate_run::adapter::{
    build_observation, create_ack, create_hello, run_server, ClientCommand, InboundCommand,
    InboundPayload, OutboundMessage, ServerConfig, PROTOCOL_VERSION,
};
use pirate_run::core::GameState;
use pirate_run::types::GameAction;

type ClientLines = Lines<BufReader<OwnedReadHalf>>;

async fn start_server(
    max_pending: usize,
) -> (
    SocketAddr,
    mpsc::Receiver<InboundCommand>,
    mpsc::UnboundedSender<OutboundMessage>,
    tokio::task::JoinHandle<()>,
) {
    let config = ServerConfig {
        port: 0,
        max_pending_commands: max_pending,
        ..ServerConfig::default()
    };

    let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
    let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (ready_tx, ready_rx) = oneshot::channel();

    let handle = tokio::spawn(async move {
        let _ = run_server(config, cmd_tx, out_rx, Some(ready_tx)).await;
    });

    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .expect("server did not signal ready")
        .expect("ready channel dropped");
    (addr, cmd_rx, out_tx, handle)
}

async fn connect(addr: SocketAddr) -> (ClientLines, OwnedWriteHalf) {
    let stream = TcpStream::connect(addr).await.expect("connect failed");
    let (read_half, write_half) = stream.into_split();
    (BufReader::new(read_half).lines(), write_half)
}

async fn send_line(w: &mut OwnedWriteHalf, line: &str) {
    w.write_all(line.as_bytes()).await.unwrap();
    w.write_all(b"\n").await.unwrap();
    w.flush().await.unwrap();
}

async fn read_json(lines: &mut ClientLines) -> serde_json::Value {
    let line = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .expect("timeout waiting for line")
        .expect("io error")
        .expect("expected line");
    serde_json::from_str(&line).unwrap()
}

async fn handshake(w: &mut OwnedWriteHalf, lines: &mut ClientLines, stream: bool) -> serde_json::Value {
    let mut hello = create_hello(1, "e2e-test", PROTOCOL_VERSION);
    hello.requested.stream_observations = stream;
    send_line(w, &serde_json::to_string(&hello).unwrap()).await;
    let welcome = read_json(lines).await;
    assert_eq!(welcome["type"], "welcome");
    welcome
}

#[tokio::test]
async fn adapter_hello_command_ack_and_observation() {
    let (addr, mut cmd_rx, out_tx, server) = start_server(8).await;
    let (mut lines, mut w) = connect(addr).await;

    let welcome = handshake(&mut w, &mut lines, true).await;
    assert_eq!(welcome["seq"], 1);
    assert_eq!(welcome["role"], "controller");
    assert_eq!(welcome["game_id"], "pirate-run");
    assert_eq!(welcome["protocol_version"], PROTOCOL_VERSION);

    // Subscribing asks the game loop for an immediate observation.
    let first = tokio::time::timeout(Duration::from_secs(2), cmd_rx.recv())
        .await
        .unwrap()
        .expect("expected snapshot request");
    assert!(matches!(first.payload, InboundPayload::SnapshotRequest));

    send_line(
        &mut w,
        r#"{"type":"command","seq":2,"ts":1,"mode":"action","actions":["start","moveLeft","jump"]}"#,
    )
    .await;

    let inbound = tokio::time::timeout(Duration::from_secs(2), cmd_rx.recv())
        .await
        .unwrap()
        .expect("expected inbound command");
    assert_eq!(inbound.seq, 2);
    let InboundPayload::Command(ClientCommand::Actions(actions)) = inbound.payload else {
        panic!("unexpected payload");
    };
    assert_eq!(
        actions.as_slice(),
        &[GameAction::Start, GameAction::MoveLeft, GameAction::Jump]
    );

    out_tx
        .send(OutboundMessage::ToClientAck {
            client_id: inbound.client_id,
            ack: create_ack(2, 3),
        })
        .unwrap();

    let ack = read_json(&mut lines).await;
    assert_eq!(ack["type"], "ack");
    assert_eq!(ack["seq"], 2);
    assert_eq!(ack["status"], "ok");
    assert_eq!(ack["applied"], 3);

    let mut gs = GameState::new(1);
    gs.start();
    out_tx
        .send(OutboundMessage::BroadcastObservation {
            obs: build_observation(&gs, 10, &[]),
        })
        .unwrap();

    let obs = read_json(&mut lines).await;
    assert_eq!(obs["type"], "observation");
    assert_eq!(obs["seq"], 10);
    assert_eq!(obs["phase"], "running");
    assert_eq!(obs["player"]["lane"], 0);
    assert!(obs["state_hash"].as_str().is_some());

    server.abort();
}

#[tokio::test]
async fn adapter_backpressure_returns_error() {
    let (addr, mut cmd_rx, _out_tx, server) = start_server(1).await;
    let (mut lines, mut w) = connect(addr).await;
    handshake(&mut w, &mut lines, false).await;

    // Two commands without draining the queue; the second one overflows.
    send_line(
        &mut w,
        r#"{"type":"command","seq":2,"ts":1,"mode":"action","actions":["moveLeft"]}"#,
    )
    .await;
    send_line(
        &mut w,
        r#"{"type":"command","seq":3,"ts":1,"mode":"action","actions":["moveRight"]}"#,
    )
    .await;

    let err = read_json(&mut lines).await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["seq"], 3);
    assert_eq!(err["code"], "backpressure");

    let first = tokio::time::timeout(Duration::from_secs(2), cmd_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.seq, 2);

    server.abort();
}

#[tokio::test]
async fn adapter_rejects_command_before_hello() {
    let (addr, _cmd_rx, _out_tx, server) = start_server(4).await;
    let (mut lines, mut w) = connect(addr).await;

    send_line(
        &mut w,
        r#"{"type":"command","seq":5,"ts":1,"mode":"action","actions":["jump"]}"#,
    )
    .await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["seq"], 5);
    assert_eq!(err["code"], "handshake_required");

    server.abort();
}

#[tokio::test]
async fn adapter_rejects_non_increasing_seq() {
    let (addr, mut cmd_rx, _out_tx, server) = start_server(4).await;
    let (mut lines, mut w) = connect(addr).await;
    handshake(&mut w, &mut lines, false).await;

    // seq 1 was used by hello.
    send_line(
        &mut w,
        r#"{"type":"command","seq":1,"ts":1,"mode":"action","actions":["jump"]}"#,
    )
    .await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "invalid_command");
    assert_eq!(err["seq"], 1);

    send_line(
        &mut w,
        r#"{"type":"command","seq":4,"ts":1,"mode":"action","actions":["jump"]}"#,
    )
    .await;
    let inbound = tokio::time::timeout(Duration::from_secs(2), cmd_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(inbound.seq, 4);

    server.abort();
}

#[tokio::test]
async fn adapter_rejects_bad_commands() {
    let (addr, _cmd_rx, _out_tx, server) = start_server(4).await;
    let (mut lines, mut w) = connect(addr).await;
    handshake(&mut w, &mut lines, false).await;

    send_line(
        &mut w,
        r#"{"type":"command","seq":2,"ts":1,"mode":"action","actions":["fly"]}"#,
    )
    .await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "invalid_command");
    assert_eq!(err["seq"], 2);

    send_line(
        &mut w,
        r#"{"type":"command","seq":3,"ts":1,"mode":"action","actions":[]}"#,
    )
    .await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "invalid_command");
    assert_eq!(err["seq"], 3);

    send_line(&mut w, r#"{"type":"teleport","seq":4}"#).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "invalid_command");
    assert_eq!(err["seq"], 4);

    server.abort();
}

#[tokio::test]
async fn adapter_protocol_mismatch_closes_connection() {
    let (addr, _cmd_rx, _out_tx, server) = start_server(4).await;
    let (mut lines, mut w) = connect(addr).await;

    let hello = create_hello(1, "old-bot", "0.9.0");
    send_line(&mut w, &serde_json::to_string(&hello).unwrap()).await;

    let err = read_json(&mut lines).await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "protocol_mismatch");

    let eof = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .unwrap()
        .unwrap();
    assert!(eof.is_none());

    server.abort();
}

#[tokio::test]
async fn adapter_observer_cannot_command() {
    let (addr, _cmd_rx, _out_tx, server) = start_server(4).await;

    let (mut lines1, mut w1) = connect(addr).await;
    let welcome1 = handshake(&mut w1, &mut lines1, false).await;
    assert_eq!(welcome1["role"], "controller");

    let (mut lines2, mut w2) = connect(addr).await;
    let welcome2 = handshake(&mut w2, &mut lines2, false).await;
    assert_eq!(welcome2["role"], "observer");
    assert_eq!(welcome2["controller_id"], welcome1["client_id"]);

    send_line(
        &mut w2,
        r#"{"type":"command","seq":2,"ts":1,"mode":"action","actions":["jump"]}"#,
    )
    .await;
    let err = read_json(&mut lines2).await;
    assert_eq!(err["code"], "not_controller");

    send_line(&mut w2, r#"{"type":"control","seq":3,"ts":1,"action":"claim"}"#).await;
    let err = read_json(&mut lines2).await;
    assert_eq!(err["code"], "controller_active");

    server.abort();
}

#[tokio::test]
async fn adapter_reports_failed_bind() {
    use pirate_run::adapter::{run_server_with_status, AdapterStatus, ListenState};
    use tokio::sync::watch;

    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let config = ServerConfig {
        port: taken.local_addr().unwrap().port(),
        ..ServerConfig::default()
    };

    let (cmd_tx, _cmd_rx) = mpsc::channel::<InboundCommand>(1);
    let (_out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (ready_tx, ready_rx) = oneshot::channel();
    let (status_tx, status_rx) = watch::channel(AdapterStatus::default());

    let result = tokio::time::timeout(
        Duration::from_secs(2),
        run_server_with_status(config, cmd_tx, out_rx, Some(ready_tx), status_tx),
    )
    .await
    .expect("server should give up instead of serving");

    assert!(result.is_err());
    assert!(ready_rx.await.is_err(), "ready must not fire without a listener");
    assert_eq!(status_rx.borrow().listen, ListenState::Failed);
}

#[tokio::test]
async fn adapter_reports_listening_after_bind() {
    use pirate_run::adapter::{run_server_with_status, AdapterStatus, ListenState};
    use tokio::sync::watch;

    let config = ServerConfig {
        port: 0,
        ..ServerConfig::default()
    };
    let (cmd_tx, _cmd_rx) = mpsc::channel::<InboundCommand>(1);
    let (_out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (ready_tx, ready_rx) = oneshot::channel();
    let (status_tx, mut status_rx) = watch::channel(AdapterStatus::default());
    assert_eq!(status_rx.borrow().listen, ListenState::Starting);

    let server = tokio::spawn(async move {
        let _ = run_server_with_status(config, cmd_tx, out_rx, Some(ready_tx), status_tx).await;
    });
    tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .unwrap()
        .unwrap();

    let status = tokio::time::timeout(
        Duration::from_secs(2),
        status_rx.wait_for(|s| s.listen == ListenState::Listening),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(status.client_count, 0);
    drop(status);

    server.abort();
}

#[test]
fn adapter_runtime_status_shows_failure() {
    use pirate_run::adapter::{Adapter, ListenState};

    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let config = ServerConfig {
        port: taken.local_addr().unwrap().port(),
        ..ServerConfig::default()
    };

    let adapter = Adapter::start(config).expect("runtime starts even if the bind fails");
    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    while adapter.status().listen != ListenState::Failed {
        assert!(std::time::Instant::now() < deadline, "status never reported the failure");
        std::thread::sleep(Duration::from_millis(10));
    }
}
