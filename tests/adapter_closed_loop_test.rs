use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};

use pirate_run::adapter::protocol::{create_ack, create_hello, PROTOCOL_VERSION};
use pirate_run::adapter::runtime::InboundPayload;
use pirate_run::adapter::server::{build_observation, run_server, ServerConfig};
use pirate_run::adapter::{ClientCommand, InboundCommand, OutboundMessage};
use pirate_run::core::{GameState, World};
use pirate_run::types::{CoinKind, GameEvent, ObstacleKind, MAX_HEALTH, TICK_MS};

/// Simulated time per command round trip.
const TICKS_PER_COMMAND: u32 = 10;

type ClientLines = Lines<BufReader<OwnedReadHalf>>;

async fn read_json(lines: &mut ClientLines) -> serde_json::Value {
    let line = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .expect("timeout waiting for line")
        .expect("io error")
        .expect("expected line");
    serde_json::from_str(&line).unwrap()
}

async fn send_line(w: &mut OwnedWriteHalf, line: &str) {
    w.write_all(line.as_bytes()).await.unwrap();
    w.write_all(b"\n").await.unwrap();
    w.flush().await.unwrap();
}

/// Crates block the centre lane; coins line the right one.
fn obstacle_course() -> World {
    let mut world = World::empty();
    for i in 1..=10 {
        world.push_obstacle(ObstacleKind::Crate, 0, i as f32 * 20.0);
        world.push_coin(CoinKind::Gold, 1, i as f32 * 20.0 + 10.0);
    }
    world
}

async fn engine_loop(
    mut cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
) {
    let mut gs = GameState::with_world(1, obstacle_course());
    gs.start();
    let mut out_seq = 0u64;
    let mut events: Vec<GameEvent> = Vec::new();

    while let Some(inbound) = cmd_rx.recv().await {
        match inbound.payload {
            InboundPayload::SnapshotRequest => {}
            InboundPayload::Command(ClientCommand::Actions(actions)) => {
                let applied = actions.into_iter().filter(|&a| gs.apply_action(a)).count();
                let _ = out_tx.send(OutboundMessage::ToClientAck {
                    client_id: inbound.client_id,
                    ack: create_ack(inbound.seq, applied as u32),
                });

                for _ in 0..TICKS_PER_COMMAND {
                    gs.tick(TICK_MS, false);
                    events.extend(gs.take_events());
                }
            }
        }

        out_seq += 1;
        let _ = out_tx.send(OutboundMessage::ToClientObservation {
            client_id: inbound.client_id,
            obs: build_observation(&gs, out_seq, &events),
        });
        events.clear();
    }
}

/// Step off any lane with an obstacle close ahead.
fn choose_action(obs: &serde_json::Value) -> &'static str {
    let lane = obs["player"]["lane"].as_i64().unwrap();
    let blocked = obs["nearby"]["obstacles"]
        .as_array()
        .unwrap()
        .iter()
        .any(|o| o["lane"].as_i64() == Some(lane) && o["ahead"].as_f64().unwrap() < 12.0);

    match (blocked, lane) {
        (false, _) => "start",
        (true, l) if l < 1 => "moveRight",
        (true, _) => "moveLeft",
    }
}

#[tokio::test]
async fn bot_dodges_crates_over_the_socket() {
    let config = ServerConfig {
        port: 0,
        max_pending_commands: 8,
        ..ServerConfig::default()
    };

    let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(8);
    let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (ready_tx, ready_rx) = oneshot::channel();

    let server_handle = tokio::spawn(async move {
        let _ = run_server(config, cmd_tx, out_rx, Some(ready_tx)).await;
    });
    let engine_handle = tokio::spawn(engine_loop(cmd_rx, out_tx));

    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .unwrap()
        .unwrap();

    let stream = TcpStream::connect(addr).await.unwrap();
    let (read_half, mut w) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let hello = create_hello(1, "dodger", PROTOCOL_VERSION);
    send_line(&mut w, &serde_json::to_string(&hello).unwrap()).await;
    let welcome = read_json(&mut lines).await;
    assert_eq!(welcome["role"], "controller");

    // Subscribing yields an immediate observation.
    let mut obs = read_json(&mut lines).await;
    assert_eq!(obs["type"], "observation");
    assert_eq!(obs["phase"], "running");

    let mut seq = 1u64;
    let mut saw_coin_event = false;
    while obs["distance"].as_f64().unwrap() < 215.0 {
        assert!(seq < 500, "run did not progress");
        seq += 1;

        let action = choose_action(&obs);
        let cmd = serde_json::json!({
            "type": "command",
            "seq": seq,
            "ts": seq,
            "mode": "action",
            "actions": [action],
        });
        send_line(&mut w, &cmd.to_string()).await;

        let ack = read_json(&mut lines).await;
        assert_eq!(ack["type"], "ack", "expected ack, got {ack}");
        assert_eq!(ack["seq"], seq);
        // "start" is a no-op once running.
        let expected_applied = if action == "start" { 0 } else { 1 };
        assert_eq!(ack["applied"], expected_applied);

        obs = read_json(&mut lines).await;
        assert_eq!(obs["type"], "observation");
        if let Some(events) = obs["events"].as_array() {
            saw_coin_event |= events.iter().any(|e| e["name"] == "coin_collected");
        }
    }

    assert_eq!(obs["player"]["health"], MAX_HEALTH);
    assert_eq!(obs["player"]["lane"], 1);
    assert!(obs["coins"].as_u64().unwrap() >= 5);
    assert!(saw_coin_event);

    server_handle.abort();
    engine_handle.abort();
}
