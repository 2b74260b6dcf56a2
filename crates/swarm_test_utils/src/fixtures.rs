//! Test fixtures and helpers.
//!
//! Pre-built configurations and ship placements for consistent testing.
//! The "quiet" configurations switch off everything that spawns ships on
//! its own, so a test only sees the ships it placed.

use swarm_core::clock::{ClockConfig, StepMode};
use swarm_core::components::{ShipKind, Team};
use swarm_core::config::GameConfig;
use swarm_core::economy::Resources;
use swarm_core::math::Vec2;
use swarm_core::simulation::{Simulation, TickEvents};
use swarm_core::store::ShipHandle;

/// Fixed step used by the quiet configurations (exact in binary).
pub const TEST_STEP: f32 = 0.125;

/// Frame length that runs exactly one [`TEST_STEP`].
pub const TEST_FRAME: f32 = TEST_STEP;

/// Stock game with waves, reinforcements and the initial ship disabled.
///
/// An empty player fleet does not end these games; set
/// `end_on_fleet_loss` to test game over.
#[must_use]
pub fn quiet_config(seed: u64, planet_count: usize) -> GameConfig {
    let mut config = GameConfig::default().with_galaxy(seed, 100.0, planet_count);
    config.clock = ClockConfig {
        mode: StepMode::Fixed(TEST_STEP),
        max_steps_per_frame: 5,
    };
    config.waves.enabled = false;
    config.reinforcement_interval = None;
    config.initial_ship = false;
    config.end_on_fleet_loss = false;
    config
}

/// Quiet config with equal starting resources and no upkeep, so ledger
/// values follow building yields exactly.
#[must_use]
pub fn ledger_config(seed: u64, start: f32) -> GameConfig {
    let mut config = quiet_config(seed, 3);
    config.starting_resources = Resources::new(start, start, start);
    config.economy.food_upkeep = 0.0;
    config.economy.ship_energy_upkeep = false;
    config
}

/// A quiet simulation.
#[must_use]
pub fn quiet_simulation(seed: u64, planet_count: usize) -> Simulation {
    Simulation::with_config(quiet_config(seed, planet_count))
}

/// Spawn `count` ships of one kind in a row starting at `origin`, two
/// units apart.
///
/// # Panics
///
/// Panics if the ship pool is full.
pub fn spawn_row(
    sim: &mut Simulation,
    origin: Vec2,
    count: usize,
    kind: ShipKind,
    team: Team,
) -> Vec<ShipHandle> {
    (0..count)
        .map(|i| {
            let position = origin + Vec2::new(2.0 * i as f32, 0.0);
            sim.spawn_ship(position, kind, team)
                .expect("fixture spawn should fit in the pool")
        })
        .collect()
}

/// Quiet game with two opposing fleets lined up inside each other's
/// weapon range.
#[must_use]
pub fn battle_simulation(seed: u64, ships_per_side: usize) -> Simulation {
    let mut sim = quiet_simulation(seed, 4);
    spawn_row(
        &mut sim,
        Vec2::new(-40.0, 30.0),
        ships_per_side,
        ShipKind::Fighter,
        Team::Player,
    );
    spawn_row(
        &mut sim,
        Vec2::new(-40.0, 36.0),
        ships_per_side,
        ShipKind::Fighter,
        Team::Enemy,
    );
    spawn_row(
        &mut sim,
        Vec2::new(-40.0, 24.0),
        ships_per_side / 4 + 1,
        ShipKind::Cruiser,
        Team::Player,
    );
    spawn_row(
        &mut sim,
        Vec2::new(-40.0, 40.0),
        ships_per_side / 4 + 1,
        ShipKind::Bomber,
        Team::Enemy,
    );
    sim
}

/// Advance `frames` frames of `dt` seconds, merging the events.
pub fn run_frames(sim: &mut Simulation, frames: u32, dt: f32) -> TickEvents {
    let mut total = TickEvents::default();
    for _ in 0..frames {
        let events = sim.advance(dt);
        total.steps += events.steps;
        total.deaths.extend(events.deaths);
        total.spawned.extend(events.spawned);
        total.waves_started += events.waves_started;
        total.dropped_spawns += events.dropped_spawns;
        total.game_over = events.game_over;
    }
    tracing::trace!(frames, steps = total.steps, "fixture frames run");
    total
}
