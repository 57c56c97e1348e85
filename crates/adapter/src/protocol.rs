//! Protocol module - JSON message types for the control adapter
//!
//! Line-delimited JSON. Every message carries: type, seq (sequence number),
//! ts (timestamp in ms).

use serde::{Deserialize, Serialize};

use crate::types::{CoinKind, GameAction, GameEvent, ObstacleKind, Outcome, Phase};

use arrayvec::ArrayVec;

/// Protocol version spoken by this build. Clients must share the major version.
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Identifier reported in `welcome.game_id`.
pub const GAME_ID: &str = "pirate-run";

/// Maximum actions accepted in one command message.
pub const MAX_ACTIONS_PER_COMMAND: usize = 32;

// ============== Client -> Game Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HelloType {
    #[serde(rename = "hello")]
    #[default]
    Hello,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CommandType {
    #[serde(rename = "command")]
    #[default]
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ControlType {
    #[serde(rename = "control")]
    #[default]
    Control,
}

/// Client hello message (first message to establish connection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: HelloType,
    pub seq: u64,
    pub ts: u64,
    pub client: ClientInfo,
    pub protocol_version: String,
    pub formats: FormatsList,
    pub requested: RequestedCapabilities,
}

impl HelloMessage {
    /// Major component of the requested protocol version.
    pub fn major_version(&self) -> &str {
        self.protocol_version
            .split('.')
            .next()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatsList {
    pub json: bool,
}

impl<'de> Deserialize<'de> for FormatsList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;
        impl<'de> serde::de::Visitor<'de> for V {
            type Value = FormatsList;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "an array of format strings")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut json = false;
                while let Some(v) = seq.next_element::<&str>()? {
                    if v.eq_ignore_ascii_case("json") {
                        json = true;
                    }
                }
                Ok(FormatsList { json })
            }
        }

        deserializer.deserialize_seq(V)
    }
}

impl Serialize for FormatsList {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(if self.json { 1 } else { 0 }))?;
        if self.json {
            seq.serialize_element("json")?;
        }
        seq.end()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedCapabilities {
    pub stream_observations: bool,
    #[serde(default)]
    pub command_mode: CommandMode,
    /// `observer` never takes control on hello; `auto` and `controller` take it if free.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<RequestedRole>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestedRole {
    Auto,
    Controller,
    Observer,
}

impl<'de> Deserialize<'de> for RequestedRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else if s.eq_ignore_ascii_case("controller") {
            Ok(Self::Controller)
        } else if s.eq_ignore_ascii_case("observer") {
            Ok(Self::Observer)
        } else {
            Err(serde::de::Error::custom("invalid requested role"))
        }
    }
}

impl Serialize for RequestedRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            RequestedRole::Auto => serializer.serialize_str("auto"),
            RequestedRole::Controller => serializer.serialize_str("controller"),
            RequestedRole::Observer => serializer.serialize_str("observer"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignedRole {
    #[serde(rename = "controller")]
    Controller,
    #[serde(rename = "observer")]
    Observer,
}

/// Command message (controller only)
#[derive(Debug, Clone, Deserialize)]
pub struct CommandMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: CommandType,
    pub seq: u64,
    pub ts: u64,
    #[serde(default)]
    pub mode: CommandMode,
    #[serde(default)]
    pub actions: Option<ActionList>,
}

/// Only discrete actions are supported; the mode field is kept for forward compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommandMode {
    #[default]
    Action,
}

impl<'de> Deserialize<'de> for CommandMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.eq_ignore_ascii_case("action") {
            Ok(Self::Action)
        } else {
            Err(serde::de::Error::custom("invalid command mode"))
        }
    }
}

impl Serialize for CommandMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            CommandMode::Action => serializer.serialize_str("action"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionName {
    Start,
    MoveLeft,
    MoveRight,
    Jump,
    Slide,
    Attack,
    Pause,
    Restart,
}

impl<'de> Deserialize<'de> for ActionName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        GameAction::from_str(&s)
            .map(ActionName::from)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown action: {}", s)))
    }
}

impl Serialize for ActionName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(GameAction::from(*self).as_str())
    }
}

impl From<GameAction> for ActionName {
    fn from(value: GameAction) -> Self {
        match value {
            GameAction::Start => Self::Start,
            GameAction::MoveLeft => Self::MoveLeft,
            GameAction::MoveRight => Self::MoveRight,
            GameAction::Jump => Self::Jump,
            GameAction::Slide => Self::Slide,
            GameAction::Attack => Self::Attack,
            GameAction::Pause => Self::Pause,
            GameAction::Restart => Self::Restart,
        }
    }
}

impl From<ActionName> for GameAction {
    fn from(value: ActionName) -> Self {
        match value {
            ActionName::Start => Self::Start,
            ActionName::MoveLeft => Self::MoveLeft,
            ActionName::MoveRight => Self::MoveRight,
            ActionName::Jump => Self::Jump,
            ActionName::Slide => Self::Slide,
            ActionName::Attack => Self::Attack,
            ActionName::Pause => Self::Pause,
            ActionName::Restart => Self::Restart,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionList(pub ArrayVec<ActionName, MAX_ACTIONS_PER_COMMAND>);

impl<'de> Deserialize<'de> for ActionList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;
        impl<'de> serde::de::Visitor<'de> for V {
            type Value = ActionList;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "an array of action strings")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut out = ArrayVec::<ActionName, MAX_ACTIONS_PER_COMMAND>::new();
                while let Some(a) = seq.next_element::<ActionName>()? {
                    out.try_push(a)
                        .map_err(|_| serde::de::Error::custom("too many actions"))?;
                }
                Ok(ActionList(out))
            }
        }

        deserializer.deserialize_seq(V)
    }
}

impl Serialize for ActionList {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.0.iter())
    }
}

/// Control message (claim/release controller status)
#[derive(Debug, Clone, Deserialize)]
pub struct ControlMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: ControlType,
    pub seq: u64,
    pub ts: u64,
    pub action: ControlAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    Claim,
    Release,
}

impl<'de> Deserialize<'de> for ControlAction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.eq_ignore_ascii_case("claim") {
            Ok(Self::Claim)
        } else if s.eq_ignore_ascii_case("release") {
            Ok(Self::Release)
        } else {
            Err(serde::de::Error::custom("invalid control action"))
        }
    }
}

impl Serialize for ControlAction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            ControlAction::Claim => serializer.serialize_str("claim"),
            ControlAction::Release => serializer.serialize_str("release"),
        }
    }
}

// ============== Game -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WelcomeType {
    #[serde(rename = "welcome")]
    Welcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckType {
    #[serde(rename = "ack")]
    Ack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckStatus {
    #[serde(rename = "ok")]
    Ok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "handshake_required")]
    HandshakeRequired,
    #[serde(rename = "protocol_mismatch")]
    ProtocolMismatch,
    #[serde(rename = "not_controller")]
    NotController,
    #[serde(rename = "controller_active")]
    ControllerActive,
    #[serde(rename = "invalid_command")]
    InvalidCommand,
    #[serde(rename = "backpressure")]
    Backpressure,
}

/// Welcome message (response to hello)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: WelcomeType,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    pub client_id: u64,
    pub role: AssignedRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_id: Option<u64>,
    pub game_id: String,
    pub capabilities: ServerCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub formats: [CapabilityFormat; 1],
    pub command_modes: [CommandMode; 1],
    pub actions: ActionList,
    pub features: Vec<CapabilityFeature>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapabilityFormat {
    #[serde(rename = "json")]
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapabilityFeature {
    #[serde(rename = "player")]
    Player,
    #[serde(rename = "nearby")]
    Nearby,
    #[serde(rename = "events")]
    Events,
    #[serde(rename = "state_hash")]
    StateHash,
    #[serde(rename = "score")]
    Score,
}

/// Acknowledgment, sent after a command has been applied by the game loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: AckType,
    pub seq: u64,
    pub ts: u64,
    pub status: AckStatus,
    /// How many of the command's actions changed the game state
    #[serde(default)]
    pub applied: u32,
}

/// Error message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: ErrorType,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationType {
    #[serde(rename = "observation")]
    Observation,
}

/// Game state observation (streamed to subscribed clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationMessage {
    #[serde(rename = "type")]
    pub msg_type: ObservationType,
    pub seq: u64,
    pub ts: u64,
    pub phase: PhaseLower,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<OutcomeLower>,
    pub playable: bool,
    pub episode_id: u32,
    pub seed: u32,
    pub step: u32,
    pub elapsed_ms: u64,
    pub score: u32,
    pub coins: u32,
    pub pirates_defeated: u32,
    pub distance: f32,
    pub remaining: f32,
    pub speed: f32,
    pub player: PlayerObservation,
    pub nearby: NearbyObservation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventObservation>,
    pub state_hash: StateHash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseLower {
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "paused")]
    Paused,
    #[serde(rename = "ended")]
    Ended,
}

impl From<Phase> for PhaseLower {
    fn from(value: Phase) -> Self {
        match value {
            Phase::Ready => Self::Ready,
            Phase::Running => Self::Running,
            Phase::Paused => Self::Paused,
            Phase::Ended(_) => Self::Ended,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeLower {
    #[serde(rename = "level_complete")]
    LevelComplete,
    #[serde(rename = "defeated")]
    Defeated,
}

impl From<Outcome> for OutcomeLower {
    fn from(value: Outcome) -> Self {
        match value {
            Outcome::LevelComplete => Self::LevelComplete,
            Outcome::Defeated => Self::Defeated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerObservation {
    pub lane: i8,
    pub x: f32,
    pub y: f32,
    pub health: u32,
    pub jumping: bool,
    pub sliding: bool,
    pub attacking: bool,
    pub can_attack: bool,
}

/// Unresolved entities ahead of the player, nearest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NearbyObservation {
    pub obstacles: Vec<ObstacleObservation>,
    pub coins: Vec<CoinObservation>,
    pub pirates: Vec<PirateObservation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKindLower {
    #[serde(rename = "barrel")]
    Barrel,
    #[serde(rename = "crate")]
    Crate,
}

impl From<ObstacleKind> for ObstacleKindLower {
    fn from(value: ObstacleKind) -> Self {
        match value {
            ObstacleKind::Barrel => Self::Barrel,
            ObstacleKind::Crate => Self::Crate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoinKindLower {
    #[serde(rename = "gold")]
    Gold,
    #[serde(rename = "health")]
    Health,
}

impl From<CoinKind> for CoinKindLower {
    fn from(value: CoinKind) -> Self {
        match value {
            CoinKind::Gold => Self::Gold,
            CoinKind::Health => Self::Health,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleObservation {
    pub kind: ObstacleKindLower,
    pub lane: i8,
    /// Distance ahead of the player along the trail
    pub ahead: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoinObservation {
    pub kind: CoinKindLower,
    pub lane: i8,
    pub ahead: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PirateObservation {
    pub lane: i8,
    pub ahead: f32,
    pub attacking: bool,
}

/// One gameplay event, flattened for the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventObservation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lane: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pirate: Option<u16>,
}

impl From<GameEvent> for EventObservation {
    fn from(value: GameEvent) -> Self {
        let mut ev = Self {
            name: value.as_str().to_string(),
            lane: None,
            kind: None,
            pirate: None,
        };
        match value {
            GameEvent::LaneChanged { lane } => ev.lane = Some(lane),
            GameEvent::CoinCollected { kind } => ev.kind = Some(kind.as_str().to_string()),
            GameEvent::ObstacleHit { kind } => ev.kind = Some(kind.as_str().to_string()),
            GameEvent::PirateDefeated { index }
            | GameEvent::PirateHit { index }
            | GameEvent::SwordDucked { index } => ev.pirate = Some(index),
            GameEvent::Finished(outcome) => ev.kind = Some(outcome.as_str().to_string()),
            GameEvent::Started
            | GameEvent::Paused
            | GameEvent::Resumed
            | GameEvent::Jumped
            | GameEvent::Landed
            | GameEvent::Swung => {}
        }
        ev
    }
}

/// Deterministic state hash serialized as lowercase hex (without heap allocation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateHash(pub u64);

impl Serialize for StateHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut buf = [0u8; 16];
        let mut v = self.0;
        for i in 0..16 {
            buf[15 - i] = HEX[(v & 0x0f) as usize];
            v >>= 4;
        }
        match std::str::from_utf8(&buf) {
            Ok(s) => serializer.serialize_str(s),
            Err(e) => Err(serde::ser::Error::custom(e)),
        }
    }
}

impl<'de> Deserialize<'de> for StateHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        u64::from_str_radix(s.trim(), 16)
            .map(StateHash)
            .map_err(|_| serde::de::Error::custom("invalid hex"))
    }
}

// ============== Message Parsing ==============

/// Parse a JSON message from a string
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type")]
    enum InboundMessage {
        #[serde(rename = "hello")]
        Hello(HelloMessage),
        #[serde(rename = "command")]
        Command(CommandMessage),
        #[serde(rename = "control")]
        Control(ControlMessage),
    }

    match serde_json::from_str::<InboundMessage>(json) {
        Ok(InboundMessage::Hello(m)) => Ok(ParsedMessage::Hello(m)),
        Ok(InboundMessage::Command(m)) => Ok(ParsedMessage::Command(m)),
        Ok(InboundMessage::Control(m)) => Ok(ParsedMessage::Control(m)),
        Err(e) => {
            // An unknown type is reported to the client, not treated as malformed JSON.
            #[derive(Debug, Deserialize)]
            struct Header<'a> {
                #[serde(rename = "type")]
                msg_type: Option<&'a str>,
                seq: Option<u64>,
            }
            let header = serde_json::from_str::<Header>(json)?;
            match header.msg_type {
                Some("hello") | Some("command") | Some("control") => Err(e),
                _ => Ok(ParsedMessage::Unknown(UnknownMessage {
                    seq: header.seq.unwrap_or(0),
                })),
            }
        }
    }
}

/// Parsed incoming message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Command(CommandMessage),
    Control(ControlMessage),
    Unknown(UnknownMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
}

// ============== Utility Functions ==============

/// Create a hello message
pub fn create_hello(seq: u64, client_name: &str, protocol_version: &str) -> HelloMessage {
    HelloMessage {
        msg_type: HelloType::Hello,
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        protocol_version: protocol_version.to_string(),
        formats: FormatsList { json: true },
        requested: RequestedCapabilities {
            stream_observations: true,
            command_mode: CommandMode::Action,
            role: Some(RequestedRole::Auto),
        },
    }
}

/// Create a welcome message
pub fn create_welcome(
    seq: u64,
    protocol_version: &str,
    client_id: u64,
    role: AssignedRole,
    controller_id: Option<u64>,
) -> WelcomeMessage {
    let mut actions = ArrayVec::new();
    for a in [
        GameAction::Start,
        GameAction::MoveLeft,
        GameAction::MoveRight,
        GameAction::Jump,
        GameAction::Slide,
        GameAction::Attack,
        GameAction::Pause,
        GameAction::Restart,
    ] {
        actions.push(ActionName::from(a));
    }

    WelcomeMessage {
        msg_type: WelcomeType::Welcome,
        seq,
        ts: current_timestamp_ms(),
        protocol_version: protocol_version.to_string(),
        client_id,
        role,
        controller_id,
        game_id: GAME_ID.to_string(),
        capabilities: ServerCapabilities {
            formats: [CapabilityFormat::Json],
            command_modes: [CommandMode::Action],
            actions: ActionList(actions),
            features: vec![
                CapabilityFeature::Player,
                CapabilityFeature::Nearby,
                CapabilityFeature::Events,
                CapabilityFeature::StateHash,
                CapabilityFeature::Score,
            ],
        },
    }
}

/// Create an acknowledgment
pub fn create_ack(seq: u64, applied: u32) -> AckMessage {
    AckMessage {
        msg_type: AckType::Ack,
        seq,
        ts: current_timestamp_ms(),
        status: AckStatus::Ok,
        applied,
    }
}

/// Create an error message
pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
    }
}

/// Current wall-clock time in milliseconds
pub(crate) fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hello() {
        let json = r#"{"type":"hello","seq":1,"ts":1234567890,"client":{"name":"test-ai","version":"1.0.0"},"protocol_version":"1.0.0","formats":["json"],"requested":{"stream_observations":true,"command_mode":"action"}}"#;

        match parse_message(json).unwrap() {
            ParsedMessage::Hello(msg) => {
                assert_eq!(msg.msg_type, HelloType::Hello);
                assert_eq!(msg.seq, 1);
                assert_eq!(msg.client.name, "test-ai");
                assert_eq!(msg.major_version(), "1");
                assert!(msg.formats.json);
                assert_eq!(msg.requested.role, None);
            }
            _ => panic!("Expected Hello message"),
        }
    }

    #[test]
    fn test_parse_command_action() {
        let json = r#"{"type":"command","seq":2,"ts":1234567900,"mode":"action","actions":["moveLeft","JUMP","attack"]}"#;

        match parse_message(json).unwrap() {
            ParsedMessage::Command(msg) => {
                assert_eq!(msg.mode, CommandMode::Action);
                let a = msg.actions.unwrap();
                assert_eq!(a.0.as_slice(), &[ActionName::MoveLeft, ActionName::Jump, ActionName::Attack]);
            }
            _ => panic!("Expected Command message"),
        }
    }

    #[test]
    fn test_parse_command_rejects_unknown_action() {
        let json = r#"{"type":"command","seq":2,"ts":1,"mode":"action","actions":["fly"]}"#;
        assert!(parse_message(json).is_err());
    }

    #[test]
    fn test_parse_command_rejects_too_many_actions() {
        let actions = vec!["\"jump\""; MAX_ACTIONS_PER_COMMAND + 1].join(",");
        let json = format!(r#"{{"type":"command","seq":2,"ts":1,"actions":[{}]}}"#, actions);
        assert!(parse_message(&json).is_err());
    }

    #[test]
    fn test_parse_control() {
        let json = r#"{"type":"control","seq":3,"ts":1234567910,"action":"release"}"#;

        match parse_message(json).unwrap() {
            ParsedMessage::Control(msg) => assert_eq!(msg.action, ControlAction::Release),
            _ => panic!("Expected Control message"),
        }
    }

    #[test]
    fn test_unknown_type_keeps_seq() {
        match parse_message(r#"{"type":"parley","seq":9}"#).unwrap() {
            ParsedMessage::Unknown(u) => assert_eq!(u.seq, 9),
            _ => panic!("Expected Unknown message"),
        }
        assert!(parse_message("not json").is_err());
    }

    #[test]
    fn test_create_welcome() {
        let welcome = create_welcome(1, PROTOCOL_VERSION, 7, AssignedRole::Controller, Some(7));
        assert_eq!(welcome.msg_type, WelcomeType::Welcome);
        assert_eq!(welcome.client_id, 7);
        assert_eq!(welcome.role, AssignedRole::Controller);
        assert_eq!(welcome.game_id, "pirate-run");
        assert_eq!(welcome.capabilities.actions.0.len(), 8);

        let v = serde_json::to_value(&welcome).unwrap();
        assert_eq!(v["capabilities"]["actions"][1], "moveLeft");
        assert_eq!(v["role"], "controller");
    }

    #[test]
    fn test_create_error_code_wire_name() {
        let error = create_error(5, ErrorCode::NotController, "Only controller may send commands");
        let v = serde_json::to_value(&error).unwrap();
        assert_eq!(v["type"], "error");
        assert_eq!(v["code"], "not_controller");
    }

    #[test]
    fn test_ack_carries_applied_count() {
        let ack = create_ack(10, 2);
        let json = serde_json::to_string(&ack).unwrap();
        let parsed: AckMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.seq, 10);
        assert_eq!(parsed.applied, 2);
        assert_eq!(parsed.status, AckStatus::Ok);
    }

    #[test]
    fn test_state_hash_is_fixed_width_hex() {
        let v = serde_json::to_value(StateHash(0xab)).unwrap();
        assert_eq!(v, "00000000000000ab");
        let back: StateHash = serde_json::from_value(v).unwrap();
        assert_eq!(back, StateHash(0xab));
    }

    #[test]
    fn test_event_observation_flattens_payload() {
        let ev = EventObservation::from(GameEvent::LaneChanged { lane: -1 });
        assert_eq!(ev.name, "lane_changed");
        assert_eq!(ev.lane, Some(-1));

        let ev = EventObservation::from(GameEvent::Finished(Outcome::Defeated));
        assert_eq!(ev.kind.as_deref(), Some("defeated"));

        let v = serde_json::to_value(EventObservation::from(GameEvent::Jumped)).unwrap();
        assert_eq!(v, serde_json::json!({ "name": "jumped" }));
    }
}
