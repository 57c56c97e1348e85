//! Adapter module - external control of a run over a TCP socket with JSON lines
//!
//! Lets a bot (or a test harness) drive the game and watch it without touching
//! the terminal. The game loop stays synchronous; the server runs on its own
//! tokio runtime and talks to the loop through channels.
//!
//! # Protocol Overview
//!
//! 1. **Connection**: Client connects to TCP socket (default: 127.0.0.1:7878)
//! 2. **Handshake**: Client sends `hello`, server responds with `welcome`
//! 3. **Controller Assignment**: First client to hello becomes the controller
//!    (unless it asks to be an observer)
//! 4. **Observation Streaming**: Subscribed clients receive `observation` lines
//! 5. **Commanding**: The controller sends lists of actions
//!
//! ## Client → Server
//!
//! - **hello**: client info, protocol version, requested capabilities
//! - **command**: `{"mode":"action","actions":["moveLeft","jump"]}`
//! - **control**: `claim` or `release` the controller role
//!
//! ## Server → Client
//!
//! - **welcome**: assigned client id, role, and capabilities
//! - **observation**: phase, score, player, nearby obstacles/coins/pirates, events
//! - **ack**: sent after the game loop applied a command
//! - **error**: typed error code and message
//!
//! `seq` must strictly increase per client. When the controller disconnects the
//! lowest remaining client id is promoted. A full command queue is reported as
//! `backpressure`.
//!
//! # Environment Variables
//!
//! - `PIRATE_RUN_AI_HOST`: Bind address (default: "127.0.0.1")
//! - `PIRATE_RUN_AI_PORT`: Port number (default: 7878)
//! - `PIRATE_RUN_AI_MAX_PENDING`: Command queue depth (default: 10)
//! - `PIRATE_RUN_AI_LOG_PATH`: Append raw wire traffic to this file
//! - `PIRATE_RUN_AI_DISABLED`: Set to "1" or "true" to disable the adapter
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"ts":0,"client":{"name":"bot","version":"0.1.0"},"protocol_version":"1.0.0","formats":["json"],"requested":{"stream_observations":true,"command_mode":"action"}}
//! Server -> Client: {"type":"welcome","seq":1,"ts":...,"protocol_version":"1.0.0","client_id":1,"role":"controller",...}
//! Server -> Client: {"type":"observation","seq":1,"phase":"ready",...}
//! Client -> Server: {"type":"command","seq":2,"ts":0,"mode":"action","actions":["start"]}
//! Server -> Client: {"type":"ack","seq":2,"ts":...,"status":"ok","applied":1}
//! ```

pub mod protocol;
pub mod runtime;
pub mod server;

pub use pirate_run_core as core;
pub use pirate_run_types as types;

pub use protocol::*;
pub use runtime::{Adapter, ClientCommand, InboundCommand, InboundPayload, OutboundMessage};
pub use server::{
    build_observation, run_server, run_server_with_status, AdapterStatus, ListenState, ServerConfig,
    ServerState, OBSERVATION_RANGE,
};
