//! TCP server for the control adapter
//!
//! Handles incoming connections and manages client lifecycle.
//! Uses tokio for async networking.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, watch, RwLock};

use anyhow::Context;
use arrayvec::ArrayVec;

use crate::core::world::lane_at;
use crate::core::GameState;
use crate::protocol::*;
use crate::runtime::{ClientCommand, InboundCommand, InboundPayload, OutboundMessage};
use crate::types::{GameAction, GameEvent, FINISH_DISTANCE};

/// Entities further ahead than this are left out of observations.
pub const OBSERVATION_RANGE: f32 = 60.0;

/// Pause before accepting again after a failed `accept`.
const ACCEPT_RETRY: Duration = Duration::from_millis(100);

/// Stable 64-bit FNV-1a hasher for deterministic `state_hash`.
///
/// `DefaultHasher` output is not guaranteed stable across Rust versions.
#[derive(Debug, Clone)]
struct Fnv1aHasher {
    state: u64,
}

impl Fnv1aHasher {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl std::hash::Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }
}

fn extract_seq_best_effort(s: &str) -> Option<u64> {
    let start = s.find("\"seq\"")?;
    let after_key = &s[start + 5..];
    let colon = after_key.find(':')?;
    let rest = after_key[colon + 1..].trim_start();
    let end = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if end == 0 {
        return None;
    }
    rest[..end].parse::<u64>().ok()
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub protocol_version: String,
    pub max_pending_commands: usize,
    /// Append every line sent or received to this file
    pub log_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
            protocol_version: PROTOCOL_VERSION.to_string(),
            max_pending_commands: 10,
            log_path: None,
        }
    }
}

impl ServerConfig {
    /// Create from `PIRATE_RUN_AI_*` environment variables.
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();

        let host = env::var("PIRATE_RUN_AI_HOST").unwrap_or(defaults.host);
        let port = env::var("PIRATE_RUN_AI_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let max_pending_commands = env::var("PIRATE_RUN_AI_MAX_PENDING")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_pending_commands);

        let log_path = env::var("PIRATE_RUN_AI_LOG_PATH")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Self {
            host,
            port,
            protocol_version: defaults.protocol_version,
            max_pending_commands,
            log_path,
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid adapter address {}:{}", self.host, self.port))
    }
}

/// Whether the listener is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListenState {
    #[default]
    Starting,
    Listening,
    /// The listener could not be set up (bad address, port taken); the adapter is gone.
    Failed,
}

/// Connection summary published to the game loop (for the HUD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdapterStatus {
    pub listen: ListenState,
    /// Clients that completed the handshake
    pub client_count: u16,
    pub controller_id: Option<usize>,
    pub streaming_count: u16,
}

/// Shared server state
pub struct ServerState {
    config: ServerConfig,
    clients: RwLock<Vec<ClientHandle>>,
    controller: RwLock<Option<usize>>,
    status_tx: watch::Sender<AdapterStatus>,
}

impl ServerState {
    pub fn new(config: ServerConfig, status_tx: watch::Sender<AdapterStatus>) -> Self {
        Self {
            config,
            clients: RwLock::new(Vec::new()),
            controller: RwLock::new(None),
            status_tx,
        }
    }

    /// Check if the adapter is disabled via environment
    pub fn is_disabled() -> bool {
        std::env::var("PIRATE_RUN_AI_DISABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub async fn controller_id(&self) -> Option<usize> {
        *self.controller.read().await
    }

    async fn is_handshaken(&self, client_id: usize) -> bool {
        let clients = self.clients.read().await;
        clients
            .iter()
            .find(|c| c.id == client_id)
            .map(|c| c.handshaken)
            .unwrap_or(false)
    }

    /// Record `seq` for the client. False if it does not strictly increase.
    async fn check_and_update_seq(&self, client_id: usize, seq: u64) -> bool {
        let mut clients = self.clients.write().await;
        let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
            return true;
        };

        match client.last_seq {
            Some(prev) if seq <= prev => false,
            _ => {
                client.last_seq = Some(seq);
                true
            }
        }
    }

    async fn publish_status(&self) {
        let controller_id = *self.controller.read().await;
        let clients = self.clients.read().await;
        let handshaken = clients.iter().filter(|c| c.handshaken);
        let status = AdapterStatus {
            listen: ListenState::Listening,
            client_count: handshaken.clone().count() as u16,
            controller_id,
            streaming_count: handshaken.filter(|c| c.stream_observations).count() as u16,
        };
        self.status_tx.send_replace(status);
    }

    async fn send_to(&self, client_id: usize, msg: ClientOutbound) {
        let clients = self.clients.read().await;
        if let Some(c) = clients.iter().find(|c| c.id == client_id) {
            let _ = c.tx.send(msg);
        }
    }

    async fn broadcast(&self, obs: ObservationMessage) {
        let clients = self.clients.read().await;
        for c in clients.iter().filter(|c| c.stream_observations) {
            let _ = c.tx.send(ClientOutbound::Observation(obs.clone()));
        }
    }

    /// Remove a client, promoting the lowest remaining id if it held control.
    async fn remove_client(&self, client_id: usize) {
        {
            let mut controller = self.controller.write().await;
            let mut clients = self.clients.write().await;
            let was_controller = *controller == Some(client_id);
            clients.retain(|c| c.id != client_id);
            if was_controller {
                let next_id = clients.iter().filter(|c| c.handshaken).map(|c| c.id).min();
                *controller = next_id;
                match next_id {
                    Some(new_id) => {
                        if let Some(c) = clients.iter_mut().find(|c| c.id == new_id) {
                            c.is_controller = true;
                        }
                        log::info!("client {} promoted to controller", new_id);
                    }
                    None => log::info!("controller {} released", client_id),
                }
            }
        }
        self.publish_status().await;
    }
}

/// Handle to a connected client
pub struct ClientHandle {
    pub id: usize,
    pub addr: SocketAddr,
    pub is_controller: bool,
    pub stream_observations: bool,
    pub handshaken: bool,
    pub last_seq: Option<u64>,
    pub tx: mpsc::UnboundedSender<ClientOutbound>,
}

#[derive(Debug, Clone)]
pub enum ClientOutbound {
    Ack(AckMessage),
    Error(ErrorMessage),
    Welcome(WelcomeMessage),
    Observation(ObservationMessage),
}

impl ClientOutbound {
    fn write_json(&self, buf: &mut Vec<u8>) -> serde_json::Result<()> {
        match self {
            ClientOutbound::Ack(v) => serde_json::to_writer(buf, v),
            ClientOutbound::Error(v) => serde_json::to_writer(buf, v),
            ClientOutbound::Welcome(v) => serde_json::to_writer(buf, v),
            ClientOutbound::Observation(v) => serde_json::to_writer(buf, v),
        }
    }
}

/// Start the TCP server
pub async fn run_server(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let (status_tx, _) = watch::channel(AdapterStatus::default());
    run_server_with_status(config, command_tx, out_rx, ready_tx, status_tx).await
}

/// Like [`run_server`], publishing connection changes on `status_tx`.
pub async fn run_server_with_status(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
    status_tx: watch::Sender<AdapterStatus>,
) -> anyhow::Result<()> {
    let wire_log_tx = config.log_path.clone().map(spawn_wire_log);

    let listener = match bind_listener(&config).await {
        Ok(l) => l,
        Err(e) => {
            status_tx.send_replace(AdapterStatus {
                listen: ListenState::Failed,
                ..AdapterStatus::default()
            });
            return Err(e);
        }
    };
    let bound = listener.local_addr()?;
    status_tx.send_modify(|s| s.listen = ListenState::Listening);
    log::info!("control adapter listening on {}", bound);
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState::new(config, status_tx));
    let mut client_id_counter = 0usize;

    // Outbound dispatcher.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                match msg {
                    OutboundMessage::ToClientAck { client_id, ack } => {
                        state.send_to(client_id, ClientOutbound::Ack(ack)).await
                    }
                    OutboundMessage::ToClientError { client_id, err } => {
                        state.send_to(client_id, ClientOutbound::Error(err)).await
                    }
                    OutboundMessage::ToClientObservation { client_id, obs } => {
                        state
                            .send_to(client_id, ClientOutbound::Observation(obs))
                            .await
                    }
                    OutboundMessage::BroadcastObservation { obs } => state.broadcast(obs).await,
                }
            }
        });
    }

    loop {
        let (socket, addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                // Usually transient (EMFILE, aborted handshake); back off and keep serving.
                log::warn!("accept failed: {}", e);
                tokio::time::sleep(ACCEPT_RETRY).await;
                continue;
            }
        };
        client_id_counter += 1;
        let client_id = client_id_counter;

        log::info!("client {} connected from {}", client_id, addr);

        let state = Arc::clone(&state);
        let command_tx = command_tx.clone();
        let wire_log_tx = wire_log_tx.clone();

        tokio::spawn(async move {
            if let Err(e) =
                handle_client(socket, addr, client_id, state, command_tx, wire_log_tx).await
            {
                log::warn!("client {} error: {:#}", client_id, e);
            }
            log::info!("client {} disconnected", client_id);
        });
    }
}

async fn bind_listener(config: &ServerConfig) -> anyhow::Result<TcpListener> {
    let addr = config.socket_addr()?;
    TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind control adapter on {}", addr))
}

/// Append raw wire lines to `path` from a background task.
fn spawn_wire_log(path: String) -> mpsc::UnboundedSender<Vec<u8>> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
    tokio::spawn(async move {
        use tokio::fs::OpenOptions;

        let mut file = match OpenOptions::new().create(true).append(true).open(&path).await {
            Ok(f) => f,
            Err(e) => {
                log::warn!("cannot open wire log {}: {}", path, e);
                return;
            }
        };

        while let Some(mut line) = rx.recv().await {
            line.push(b'\n');
            if file.write_all(&line).await.is_err() {
                break;
            }
        }
        let _ = file.flush().await;
    });
    tx
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    client_id: usize,
    state: Arc<ServerState>,
    command_tx: mpsc::Sender<InboundCommand>,
    wire_log_tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);

    let (tx, mut rx) = mpsc::unbounded_channel::<ClientOutbound>();

    {
        let mut clients = state.clients.write().await;
        clients.push(ClientHandle {
            id: client_id,
            addr,
            is_controller: false,
            stream_observations: false,
            handshaken: false,
            last_seq: None,
            tx: tx.clone(),
        });
    }

    let wire_log_tx_out = wire_log_tx.clone();

    let write_task = tokio::spawn(async move {
        let mut buf: Vec<u8> = Vec::with_capacity(4096);
        while let Some(msg) = rx.recv().await {
            buf.clear();
            if msg.write_json(&mut buf).is_err() {
                continue;
            }
            if let Some(tx) = wire_log_tx_out.as_ref() {
                let _ = tx.send(buf.clone());
            }
            buf.push(b'\n');
            if writer.write_all(&buf).await.is_err() {
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
        }
    });

    let reply = |msg: ClientOutbound| {
        let _ = tx.send(msg);
    };
    let fail = |seq: u64, code: ErrorCode, message: &str| {
        let _ = tx.send(ClientOutbound::Error(create_error(seq, code, message)));
    };

    let mut line = String::new();
    let outcome = loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break Ok(()),
            Ok(_) => {}
            Err(e) => break Err(e),
        }

        let raw_line = line.trim_end_matches(['\n', '\r']);
        let trimmed = raw_line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(tx) = wire_log_tx.as_ref() {
            let _ = tx.send(raw_line.as_bytes().to_vec());
        }

        match parse_message(trimmed) {
            Ok(ParsedMessage::Hello(hello)) => {
                if state.is_handshaken(client_id).await
                    && !state.check_and_update_seq(client_id, hello.seq).await
                {
                    fail(hello.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    continue;
                }

                let ours = state.config.protocol_version.split('.').next().unwrap_or_default();
                if hello.major_version() != ours {
                    fail(
                        hello.seq,
                        ErrorCode::ProtocolMismatch,
                        &format!("Protocol version {} not supported", hello.protocol_version),
                    );
                    break Ok(());
                }

                let wants_control = hello.requested.role != Some(RequestedRole::Observer);
                let role = {
                    let mut controller = state.controller.write().await;
                    let mut clients = state.clients.write().await;
                    let take = wants_control && controller.is_none();
                    if take {
                        *controller = Some(client_id);
                    }
                    if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
                        client.handshaken = true;
                        client.last_seq = Some(hello.seq);
                        client.stream_observations = hello.requested.stream_observations;
                        client.is_controller |= take;
                    }
                    if *controller == Some(client_id) {
                        AssignedRole::Controller
                    } else {
                        AssignedRole::Observer
                    }
                };
                if role == AssignedRole::Controller {
                    log::info!("client {} is now controller", client_id);
                }
                state.publish_status().await;

                let controller_id = state.controller_id().await.map(|id| id as u64);
                reply(ClientOutbound::Welcome(create_welcome(
                    hello.seq,
                    &state.config.protocol_version,
                    client_id as u64,
                    role,
                    controller_id,
                )));

                if hello.requested.stream_observations {
                    let _ = command_tx.try_send(InboundCommand {
                        client_id,
                        seq: hello.seq,
                        payload: InboundPayload::SnapshotRequest,
                    });
                }
            }
            Ok(ParsedMessage::Command(cmd)) => {
                if !state.is_handshaken(client_id).await {
                    fail(cmd.seq, ErrorCode::HandshakeRequired, "Send hello before command");
                    continue;
                }
                if !state.check_and_update_seq(client_id, cmd.seq).await {
                    fail(cmd.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    continue;
                }
                if state.controller_id().await != Some(client_id) {
                    fail(cmd.seq, ErrorCode::NotController, "Only controller may send commands");
                    continue;
                }
                let mapped = match map_command(&cmd) {
                    Ok(c) => c,
                    Err((code, message)) => {
                        fail(cmd.seq, code, &message);
                        continue;
                    }
                };
                // Ack is sent by the game loop once the command has been applied.
                if command_tx
                    .try_send(InboundCommand {
                        client_id,
                        seq: cmd.seq,
                        payload: InboundPayload::Command(mapped),
                    })
                    .is_err()
                {
                    fail(cmd.seq, ErrorCode::Backpressure, "Command queue is full");
                }
            }
            Ok(ParsedMessage::Control(ctrl)) => {
                if !state.is_handshaken(client_id).await {
                    fail(ctrl.seq, ErrorCode::HandshakeRequired, "Send hello before control");
                    continue;
                }
                if !state.check_and_update_seq(client_id, ctrl.seq).await {
                    fail(ctrl.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    continue;
                }

                {
                    let mut controller = state.controller.write().await;
                    let mut clients = state.clients.write().await;
                    match ctrl.action {
                        ControlAction::Claim if controller.is_none() || *controller == Some(client_id) => {
                            *controller = Some(client_id);
                            if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
                                client.is_controller = true;
                            }
                            log::info!("client {} claimed control", client_id);
                            reply(ClientOutbound::Ack(create_ack(ctrl.seq, 1)));
                        }
                        ControlAction::Claim => {
                            fail(ctrl.seq, ErrorCode::ControllerActive, "Controller already assigned");
                        }
                        ControlAction::Release if *controller == Some(client_id) => {
                            *controller = None;
                            if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
                                client.is_controller = false;
                            }
                            log::info!("client {} released control", client_id);
                            reply(ClientOutbound::Ack(create_ack(ctrl.seq, 1)));
                        }
                        ControlAction::Release => {
                            fail(ctrl.seq, ErrorCode::NotController, "Only controller may release");
                        }
                    }
                }
                state.publish_status().await;
            }
            Ok(ParsedMessage::Unknown(unknown)) => {
                if state.is_handshaken(client_id).await
                    && !state.check_and_update_seq(client_id, unknown.seq).await
                {
                    fail(unknown.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    continue;
                }
                fail(unknown.seq, ErrorCode::InvalidCommand, "Unknown message type");
            }
            Err(e) => {
                let seq = extract_seq_best_effort(trimmed).unwrap_or(0);
                fail(seq, ErrorCode::InvalidCommand, &format!("JSON parse error: {}", e));
            }
        }
    };

    // Unregistering drops the last other sender, so the writer drains and exits.
    state.remove_client(client_id).await;
    drop(tx);
    let _ = write_task.await;
    outcome.context("read from client failed")
}

/// Map a protocol command into a game-loop command.
fn map_command(cmd: &CommandMessage) -> Result<ClientCommand, (ErrorCode, String)> {
    match cmd.mode {
        CommandMode::Action => {
            let Some(ref names) = cmd.actions else {
                return Err((ErrorCode::InvalidCommand, "Missing actions".to_string()));
            };
            if names.0.is_empty() {
                return Err((ErrorCode::InvalidCommand, "Empty action list".to_string()));
            }
            let actions: ArrayVec<GameAction, MAX_ACTIONS_PER_COMMAND> =
                names.0.iter().map(|&a| GameAction::from(a)).collect();
            Ok(ClientCommand::Actions(actions))
        }
    }
}

/// Build an observation of `game_state`.
///
/// `events` are the gameplay events since the previous observation.
pub fn build_observation(
    game_state: &GameState,
    seq: u64,
    events: &[GameEvent],
) -> ObservationMessage {
    use std::hash::{Hash, Hasher};

    let player = game_state.player();
    let world = game_state.world();
    let ahead_of = |z: f32| player.z - z;
    let in_range = |ahead: f32| (0.0..=OBSERVATION_RANGE).contains(&ahead);

    let mut nearby = NearbyObservation::default();
    for o in world.obstacles().iter().filter(|o| !o.struck) {
        let ahead = ahead_of(o.z);
        if in_range(ahead) {
            nearby.obstacles.push(ObstacleObservation {
                kind: o.kind.into(),
                lane: lane_at(o.x),
                ahead,
            });
        }
    }
    for c in world.coins().iter().filter(|c| !c.collected) {
        let ahead = ahead_of(c.z);
        if in_range(ahead) {
            nearby.coins.push(CoinObservation {
                kind: c.kind.into(),
                lane: lane_at(c.x),
                ahead,
            });
        }
    }
    for p in world.pirates().iter().filter(|p| p.is_live()) {
        let ahead = ahead_of(p.z);
        if in_range(ahead) {
            nearby.pirates.push(PirateObservation {
                lane: lane_at(p.x),
                ahead,
                attacking: p.is_attacking(),
            });
        }
    }
    nearby.obstacles.sort_by(|a, b| a.ahead.total_cmp(&b.ahead));
    nearby.coins.sort_by(|a, b| a.ahead.total_cmp(&b.ahead));
    nearby.pirates.sort_by(|a, b| a.ahead.total_cmp(&b.ahead));

    let phase = game_state.phase();

    let mut hasher = Fnv1aHasher::new();
    phase.hash(&mut hasher);
    game_state.episode_id().hash(&mut hasher);
    game_state.seed().hash(&mut hasher);
    game_state.step().hash(&mut hasher);
    game_state.score().hash(&mut hasher);
    game_state.coins().hash(&mut hasher);
    game_state.pirates_defeated().hash(&mut hasher);
    game_state.distance().to_bits().hash(&mut hasher);
    game_state.speed().to_bits().hash(&mut hasher);
    player.lane.hash(&mut hasher);
    player.x.to_bits().hash(&mut hasher);
    player.y.to_bits().hash(&mut hasher);
    player.health.hash(&mut hasher);
    player.jumping.hash(&mut hasher);
    player.sliding.hash(&mut hasher);
    player.attack_ms.hash(&mut hasher);
    player.cooldown_ms.hash(&mut hasher);
    world.remaining_coins().hash(&mut hasher);
    for p in world.pirates() {
        p.attack_ms.hash(&mut hasher);
        p.fate.is_some().hash(&mut hasher);
    }
    let state_hash = StateHash(hasher.finish());

    ObservationMessage {
        msg_type: ObservationType::Observation,
        seq,
        ts: current_timestamp_ms(),
        phase: phase.into(),
        outcome: phase.outcome().map(OutcomeLower::from),
        playable: phase.is_running(),
        episode_id: game_state.episode_id(),
        seed: game_state.seed(),
        step: game_state.step(),
        elapsed_ms: game_state.elapsed_ms(),
        score: game_state.score(),
        coins: game_state.coins(),
        pirates_defeated: game_state.pirates_defeated(),
        distance: game_state.distance(),
        remaining: (FINISH_DISTANCE - game_state.distance()).max(0.0),
        speed: game_state.speed(),
        player: PlayerObservation {
            lane: player.lane,
            x: player.x,
            y: player.y,
            health: player.health,
            jumping: player.jumping,
            sliding: player.sliding,
            attacking: player.is_attacking(),
            can_attack: player.can_attack(),
        },
        nearby,
        events: events.iter().map(|&e| EventObservation::from(e)).collect(),
        state_hash,
    }
}
