//! JSON protocol for headless game communication.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** Game state updates and responses
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready",...}`
//! 2. Controller sends commands as JSON lines
//! 3. Runner answers each command with exactly one response line
//! 4. Once no player ship is left, an `advance` answers with `game_over`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","seed":0,"planets":5}
//! -> {"cmd":"build","planet":0,"tile":0,"building":"Mine"}
//! <- {"type":"ack","cmd":"build"}
//! -> {"cmd":"advance","frames":60,"dt":0.016}
//! <- {"type":"state","game_age":0.96,"tick":58,...}
//! -> {"cmd":"build","planet":9,"tile":0,"building":"Farm"}
//! <- {"type":"rejected","cmd":"build","reason":"Invalid planet index: 9"}
//! ```

use serde::{Deserialize, Serialize};
use swarm_core::components::BuildingKind;
use swarm_core::production::PresenceReport;
use thiserror::Error;

use crate::snapshot::Snapshot;

/// Protocol version reported in the ready line.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Longest frame a controller may feed in one step, in seconds.
pub const MAX_FRAME_DELTA: f32 = 0.1;

/// Errors raised while reading or writing protocol lines.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Stream failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed command or unserializable response.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Input Commands (controller -> runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Feed `frames` frames of `dt` seconds each.
    Advance {
        #[serde(default = "default_frames")]
        frames: u32,
        #[serde(default = "default_dt")]
        dt: f32,
    },

    /// Set the speed multiplier. Zero pauses.
    Speed { value: f32 },

    /// Place a building on a tile.
    Build {
        planet: usize,
        tile: usize,
        building: BuildingKind,
    },

    /// Query current game state without advancing time.
    Query,

    /// Report presence scores of every planet.
    DumpPresence,

    /// Start the active wave now.
    DebugWave,

    /// Replace the running game with a fresh one.
    NewGame {
        seed: u64,
        #[serde(default = "default_galaxy_radius")]
        galaxy_radius: f32,
        #[serde(default = "default_planets")]
        planets: usize,
    },

    /// Quit the runner.
    Quit,
}

fn default_frames() -> u32 {
    1
}

fn default_dt() -> f32 {
    1.0 / 60.0
}

fn default_galaxy_radius() -> f32 {
    100.0
}

fn default_planets() -> usize {
    5
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Advance { .. } => "advance",
            Self::Speed { .. } => "speed",
            Self::Build { .. } => "build",
            Self::Query => "query",
            Self::DumpPresence => "dump_presence",
            Self::DebugWave => "debug_wave",
            Self::NewGame { .. } => "new_game",
            Self::Quit => "quit",
        }
    }
}

/// Clamp a frame delta the way the interactive frame loop does.
///
/// Negative and NaN deltas become zero.
pub fn clamp_frame_delta(dt: f32) -> f32 {
    if dt.is_nan() {
        return 0.0;
    }
    dt.clamp(0.0, MAX_FRAME_DELTA)
}

// ============================================================================
// Output Responses (runner -> controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready {
        version: String,
        seed: u64,
        planets: usize,
    },

    /// Current game state.
    State(Box<Snapshot>),

    /// Command applied.
    Ack { cmd: String },

    /// Command understood but refused by the game.
    Rejected { cmd: String, reason: String },

    /// Presence scores.
    Presence { reports: Vec<PresenceReport> },

    /// The last player ship is gone.
    GameOver { age: f32, tick: u64 },

    /// Error processing a line.
    Error { message: String },
}

impl Response {
    /// Create a ready response.
    pub fn ready(seed: u64, planets: usize) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            seed,
            planets,
        }
    }

    /// Create an ack response.
    pub fn ack(cmd: &Command) -> Self {
        Self::Ack {
            cmd: cmd.name().to_string(),
        }
    }

    /// Create a rejection response.
    pub fn rejected(cmd: &Command, reason: impl Into<String>) -> Self {
        Self::Rejected {
            cmd: cmd.name().to_string(),
            reason: reason.into(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Serialize to one JSON line, newline included.
    pub fn to_json_line(&self) -> Result<String, ProtocolError> {
        let mut json = serde_json::to_string(self)?;
        json.push('\n');
        Ok(json)
    }
}
