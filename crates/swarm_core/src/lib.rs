//! # Swarm Core
//!
//! Simulation core for a real-time space-combat economy game.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO
//! - No system randomness (one seeded generator per game)
//! - No process-wide state
//!
//! This separation enables:
//! - Headless runs and batch balancing
//! - Several independent games in one process
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`math`] - 2D/4D vector primitives
//! - [`store`] - Ship pool with generational handles
//! - [`flocking`] - Steering, targeting and weapons
//! - [`production`] - Buildings, shipyards and the build command
//! - [`economy`] - Resource ledger and upkeep
//! - [`waves`] - Escalating enemy waves
//! - [`clock`] - Frame-to-step conversion
//! - [`simulation`] - Core simulation loop

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod clock;
pub mod components;
pub mod config;
pub mod data;
pub mod economy;
pub mod error;
pub mod flocking;
pub mod galaxy;
pub mod math;
pub mod production;
pub mod rng;
pub mod simulation;
pub mod store;
pub mod waves;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clock::{ClockConfig, SimulationClock, StepMode};
    pub use crate::components::*;
    pub use crate::config::GameConfig;
    pub use crate::data::{BuildingData, BuildingTable, ShipClass, ShipClassTable};
    pub use crate::economy::{Resource, ResourceLedger, Resources};
    pub use crate::error::{GameError, Result};
    pub use crate::math::{Vec2, Vec4};
    pub use crate::production::PresenceReport;
    pub use crate::rng::SimRng;
    pub use crate::simulation::{PlanetView, ShipView, Simulation, TickEvents};
    pub use crate::store::{EntityStore, ShipHandle, ShipStore};
    pub use crate::waves::{Wave, WavePhase, WaveScheduler};
}
