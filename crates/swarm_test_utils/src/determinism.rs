//! Replay harness for determinism checks.
//!
//! A game must end in the same state whenever it is replayed from the same
//! configuration with the same frames and commands. The helpers here replay
//! a setup several times and compare [`Simulation::state_hash`] values.
//!
//! Things that break replays in this codebase:
//!
//! - a random draw that bypasses the game's own [`SimRng`]
//!   (`thread_rng`, wall-clock seeds)
//! - iterating a `HashMap`; ships go in pool order, planets by index
//! - state shared between two games in one process, which the threaded
//!   replays are there to catch
//!
//! [`SimRng`]: swarm_core::rng::SimRng

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use swarm_core::simulation::Simulation;

/// Frame length used by the simulation helpers below.
pub const HARNESS_FRAME: f32 = 1.0 / 60.0;

/// Final hashes of several replays of one setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// One hash per replay, in replay order.
    pub hashes: Vec<u64>,
    /// Frames each replay ran.
    pub frames: u64,
}

impl DeterminismResult {
    /// Whether every replay ended in the same state.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|pair| pair[0] == pair[1])
    }

    /// Distinct hashes, sorted.
    #[must_use]
    pub fn distinct_hashes(&self) -> Vec<u64> {
        let mut distinct = self.hashes.clone();
        distinct.sort_unstable();
        distinct.dedup();
        distinct
    }

    /// Fail the test unless every replay matched.
    ///
    /// # Panics
    ///
    /// Panics, listing every hash, if any two replays differ.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic(),
            "{} replays of {} frames ended in {} different states: {:?}",
            self.hashes.len(),
            self.frames,
            self.distinct_hashes().len(),
            self.hashes
        );
    }
}

/// Replay any state machine `runs` times for `frames` frames.
///
/// `setup` builds a fresh state, `frame` advances it once and `hash`
/// summarises the final state.
///
/// # Example
///
/// ```
/// use swarm_core::simulation::Simulation;
/// use swarm_test_utils::determinism::verify_determinism;
///
/// verify_determinism(
///     3,
///     60,
///     || Simulation::new_game(4, 100.0, 5),
///     |sim| {
///         sim.advance(1.0 / 60.0);
///     },
///     Simulation::state_hash,
/// )
/// .assert_deterministic();
/// ```
pub fn verify_determinism<S>(
    runs: usize,
    frames: u64,
    setup: impl Fn() -> S,
    frame: impl Fn(&mut S),
    hash: impl Fn(&S) -> u64,
) -> DeterminismResult {
    let hashes = (0..runs)
        .map(|_| {
            let mut state = setup();
            (0..frames).for_each(|_| frame(&mut state));
            hash(&state)
        })
        .collect();
    DeterminismResult { hashes, frames }
}

/// Replay a simulation twice with [`HARNESS_FRAME`] frames.
pub fn verify_simulation_determinism(setup: impl Fn() -> Simulation, frames: u64) -> bool {
    verify_determinism(2, frames, setup, advance_one, Simulation::state_hash).is_deterministic()
}

/// Replay a simulation on `threads` scoped threads at once.
///
/// # Panics
///
/// Panics if a replay thread panics.
pub fn run_parallel_simulations(
    setup: impl Fn() -> Simulation + Sync,
    threads: usize,
    frames: u64,
) -> DeterminismResult {
    let setup = &setup;
    let hashes = thread::scope(|scope| {
        let replays: Vec<_> = (0..threads)
            .map(|_| {
                scope.spawn(move || {
                    let mut sim = setup();
                    (0..frames).for_each(|_| advance_one(&mut sim));
                    sim.state_hash()
                })
            })
            .collect();
        replays
            .into_iter()
            .map(|replay| replay.join().expect("replay thread panicked"))
            .collect()
    });
    DeterminismResult { hashes, frames }
}

/// Step two replays side by side and report the first frame whose hashes
/// differ (frame 0 is the freshly built state).
pub fn find_first_divergence(setup: impl Fn() -> Simulation, frames: u64) -> Option<u64> {
    let mut left = setup();
    let mut right = setup();

    (0..=frames).find(|&frame| {
        if frame > 0 {
            advance_one(&mut left);
            advance_one(&mut right);
        }
        let diverged = left.state_hash() != right.state_hash();
        if diverged {
            tracing::debug!(frame, "replays diverged");
        }
        diverged
    })
}

/// Hash any hashable value with the same hasher the simulation uses.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn advance_one(sim: &mut Simulation) {
    sim.advance(HARNESS_FRAME);
}

/// Proptest strategies for simulation inputs.
pub mod strategies {
    use proptest::prelude::*;
    use swarm_core::components::{BuildingKind, ShipKind, Team};
    use swarm_core::math::Vec2;

    /// A frame delta between a stalled frame and a long hitch.
    pub fn arb_frame_delta() -> impl Strategy<Value = f32> {
        prop_oneof![
            4 => 0.0f32..0.05,
            1 => 0.05f32..2.0,
        ]
    }

    /// A position inside a square of half-width `extent`.
    pub fn arb_position(extent: f32) -> impl Strategy<Value = Vec2> {
        (-extent..extent, -extent..extent).prop_map(|(x, y)| Vec2::new(x, y))
    }

    /// Any ship kind.
    pub fn arb_ship_kind() -> impl Strategy<Value = ShipKind> {
        prop::sample::select(ShipKind::ALL.to_vec())
    }

    /// Either team.
    pub fn arb_team() -> impl Strategy<Value = Team> {
        prop_oneof![Just(Team::Player), Just(Team::Enemy)]
    }

    /// A building that the build command accepts.
    pub fn arb_buildable() -> impl Strategy<Value = BuildingKind> {
        prop::sample::select(vec![
            BuildingKind::Mine,
            BuildingKind::PowerPlant,
            BuildingKind::Farm,
            BuildingKind::ShipyardFighter,
            BuildingKind::ShipyardBomber,
            BuildingKind::ShipyardCruiser,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{battle_simulation, quiet_simulation};

    #[test]
    fn test_counter_replays_match() {
        let result = verify_determinism(
            5,
            100,
            || 0u64,
            |state| *state = state.wrapping_mul(31).wrapping_add(7),
            |state| *state,
        );
        result.assert_deterministic();
        assert_eq!(result.distinct_hashes().len(), 1);
    }

    #[test]
    fn test_detects_shared_state() {
        use std::sync::atomic::{AtomicU64, Ordering};
        let counter = AtomicU64::new(0);

        let result = verify_determinism(
            3,
            1,
            || counter.fetch_add(1, Ordering::SeqCst),
            |_| {},
            |state| *state,
        );
        assert!(!result.is_deterministic());
        assert_eq!(result.distinct_hashes().len(), 3);
    }

    #[test]
    fn test_stock_game_is_deterministic() {
        assert!(verify_simulation_determinism(
            || Simulation::new_game(11, 100.0, 6),
            240
        ));
    }

    #[test]
    fn test_battle_is_deterministic() {
        assert_eq!(find_first_divergence(|| battle_simulation(5, 12), 180), None);
    }

    #[test]
    fn test_divergence_found_at_start() {
        use std::sync::atomic::{AtomicU64, Ordering};
        let seed = AtomicU64::new(1);
        let found = find_first_divergence(
            || quiet_simulation(seed.fetch_add(1, Ordering::SeqCst), 4),
            10,
        );
        assert_eq!(found, Some(0));
    }

    #[test]
    fn test_parallel_games_match() {
        let result = run_parallel_simulations(|| battle_simulation(9, 8), 4, 120);
        assert_eq!(result.hashes.len(), 4);
        result.assert_deterministic();
    }

    #[test]
    fn test_different_seeds_diverge() {
        let a = quiet_simulation(1, 5);
        let b = quiet_simulation(2, 5);
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_compute_hash_stable() {
        assert_eq!(compute_hash(&(1u32, "ship")), compute_hash(&(1u32, "ship")));
    }
}
