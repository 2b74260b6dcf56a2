//! Headless runner for the swarm simulation.
//!
//! This crate drives [`swarm_core`] without a window: a controller feeds
//! frame deltas and commands as JSON on stdin and reads game state back
//! on stdout. This enables:
//!
//! - **Scripted play**: a bot or test harness plays the game line by line
//! - **Balance runs**: many unattended games across seeds, in parallel
//! - **Determinism checks**: the same seed replayed must end in the same state
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from controller (advance, build, query, etc.)
//! - **stdout**: State updates and responses (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! See [`protocol`] module for the full command/response specification.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"advance","frames":60}' | cargo run -p swarm_headless -- run
//!
//! # Play one game unattended
//! cargo run -p swarm_headless -- simulate --seed 7 --seconds 120
//!
//! # Verify determinism
//! cargo run -p swarm_headless -- verify --seed 7 --runs 4
//! ```

pub mod batch;
pub mod protocol;
pub mod runner;
pub mod scenario;
pub mod snapshot;

pub use batch::{run_batch, run_game, BatchConfig, BatchResults, BatchSummary, GameMetrics};
pub use protocol::{Command, ProtocolError, Response};
pub use runner::HeadlessRunner;
pub use scenario::ScenarioError;
pub use snapshot::Snapshot;
