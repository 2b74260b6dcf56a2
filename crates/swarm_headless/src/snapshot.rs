//! Serializable view of a running game.

use serde::{Deserialize, Serialize};
use swarm_core::components::{PerClass, Team};
use swarm_core::economy::Resources;
use swarm_core::simulation::{PlanetView, ShipView, Simulation};
use swarm_core::waves::{WavePhase, WaveScheduler};

/// Wave state as seen by a controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveState {
    /// Phase of the active wave.
    pub phase: WavePhase,
    /// Seconds until the active wave starts (negative once spawning).
    pub countdown: f32,
    /// Ships still to come from the active wave.
    pub remaining: PerClass<f32>,
    /// Size of the queued wave.
    pub next: PerClass<f32>,
    /// Waves started so far.
    pub started: u32,
}

impl WaveState {
    fn new(waves: &WaveScheduler) -> Self {
        let current = waves.current();
        Self {
            phase: current.phase(),
            countdown: current.countdown,
            remaining: current.remaining,
            next: waves.next().remaining,
            started: waves.waves_started(),
        }
    }
}

/// Full game state at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Seconds of simulated time.
    pub game_age: f32,
    /// Steps run.
    pub tick: u64,
    /// Speed multiplier.
    pub speed: f32,
    /// Whether the game has ended.
    pub game_over: bool,
    /// Stored resources.
    pub resources: Resources,
    /// Live player ships.
    pub player_ships: usize,
    /// Live enemy ships.
    pub enemy_ships: usize,
    /// Every live ship.
    pub ships: Vec<ShipView>,
    /// Every planet.
    pub planets: Vec<PlanetView>,
    /// Wave progress.
    pub waves: WaveState,
    /// State hash for determinism checks.
    pub hash: u64,
}

impl Snapshot {
    /// Capture the current state of `sim`.
    #[must_use]
    pub fn capture(sim: &Simulation) -> Self {
        Self {
            game_age: sim.game_age(),
            tick: sim.tick_count(),
            speed: sim.speed_modifier(),
            game_over: sim.is_game_over(),
            resources: sim.resources(),
            player_ships: sim.team_ship_count(Team::Player),
            enemy_ships: sim.team_ship_count(Team::Enemy),
            ships: sim.ships().collect(),
            planets: sim.planets().collect(),
            waves: WaveState::new(sim.waves()),
            hash: sim.state_hash(),
        }
    }
}
