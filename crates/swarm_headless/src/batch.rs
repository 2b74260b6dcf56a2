//! Batch game runner for balance testing.
//!
//! Runs many unattended games in parallel using rayon. Nobody builds
//! anything in these games, so they measure how long the stock economy
//! and the home fleet hold out against the escalating waves.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use swarm_core::components::Team;
use swarm_core::config::GameConfig;
use swarm_core::economy::Resources;
use swarm_core::simulation::Simulation;
use tracing::{debug, info, warn};

use crate::protocol::clamp_frame_delta;

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of games to run
    pub game_count: u32,
    /// Seed of the first game; game `i` uses `seed_start + i`
    pub seed_start: u64,
    /// Game time limit per game, in seconds
    pub seconds: f32,
    /// Frame delta fed to every game
    pub frame_delta: f32,
    /// Maximum parallel games (0 = use rayon default)
    pub parallel_games: u32,
    /// Configuration shared by every game; only the seed changes
    pub base: GameConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            game_count: 16,
            seed_start: 0,
            seconds: 300.0,
            frame_delta: 1.0 / 60.0,
            parallel_games: 0,
            base: GameConfig::default(),
        }
    }
}

impl BatchConfig {
    /// Create config for `game_count` games of `seconds` each
    pub fn new(game_count: u32, seconds: f32) -> Self {
        Self {
            game_count,
            seconds,
            ..Default::default()
        }
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the shared game configuration
    pub fn with_base(mut self, base: GameConfig) -> Self {
        self.base = base;
        self
    }

    /// Set parallelism
    pub fn with_parallel(mut self, parallel_games: u32) -> Self {
        self.parallel_games = parallel_games;
        self
    }
}

/// Outcome of one unattended game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Galaxy seed
    pub seed: u64,
    /// Whether a player ship was still alive at the time limit
    pub survived: bool,
    /// Game time reached
    pub game_age: f32,
    /// Steps run
    pub ticks: u64,
    /// Waves that started
    pub waves_started: u32,
    /// Ships destroyed
    pub ships_destroyed: usize,
    /// Ships spawned by waves, reinforcements and shipyards
    pub ships_spawned: usize,
    /// Spawns dropped for lack of pool space
    pub dropped_spawns: u32,
    /// Live player ships at the end
    pub player_ships: usize,
    /// Live enemy ships at the end
    pub enemy_ships: usize,
    /// Planets owned by the player at the end
    pub planets_owned: usize,
    /// Stored resources at the end
    pub resources: Resources,
    /// Final state hash
    pub final_state_hash: u64,
}

/// Aggregate over a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Games run
    pub games: usize,
    /// Games where the player survived
    pub survived: usize,
    /// `survived / games`
    pub survival_rate: f64,
    /// Mean game time reached
    pub mean_game_age: f64,
    /// Shortest game time reached
    pub min_game_age: f64,
    /// Mean waves started
    pub mean_waves: f64,
    /// Mean ships destroyed
    pub mean_ships_destroyed: f64,
}

impl BatchSummary {
    /// Aggregate per-game metrics
    pub fn from_games(games: &[GameMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }
        let n = games.len() as f64;
        let survived = games.iter().filter(|g| g.survived).count();
        let mean = |f: fn(&GameMetrics) -> f64| games.iter().map(f).sum::<f64>() / n;

        Self {
            games: games.len(),
            survived,
            survival_rate: survived as f64 / n,
            mean_game_age: mean(|g| g.game_age as f64),
            min_game_age: games
                .iter()
                .map(|g| g.game_age as f64)
                .fold(f64::INFINITY, f64::min),
            mean_waves: mean(|g| g.waves_started as f64),
            mean_ships_destroyed: mean(|g| g.ships_destroyed as f64),
        }
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual game metrics, in seed order
    pub games: Vec<GameMetrics>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
}

/// Progress tracking for batch runs
#[derive(Debug)]
pub struct BatchProgress {
    /// Total games
    pub total: u32,
    completed: AtomicU32,
    survived: AtomicU32,
    start_time: Instant,
}

impl BatchProgress {
    /// Create new progress tracker
    pub fn new(total: u32) -> Self {
        Self {
            total,
            completed: AtomicU32::new(0),
            survived: AtomicU32::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a completed game
    pub fn record_completion(&self, survived: bool) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if survived {
            self.survived.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get current completion count
    pub fn current(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Get completion percentage
    pub fn percentage(&self) -> f64 {
        self.current() as f64 / self.total.max(1) as f64 * 100.0
    }

    /// Survival rate over the games finished so far
    pub fn survival_rate(&self) -> f64 {
        let completed = self.current();
        if completed == 0 {
            return 0.0;
        }
        self.survived.load(Ordering::Relaxed) as f64 / completed as f64
    }

    /// Log progress
    pub fn report(&self) {
        info!(
            completed = self.current(),
            total = self.total,
            percent = format_args!("{:.1}", self.percentage()),
            survival = format_args!("{:.2}", self.survival_rate()),
            elapsed_s = self.start_time.elapsed().as_secs(),
            "batch progress"
        );
    }
}

/// Play one unattended game for `seconds` of game time in frames of
/// `frame_delta` seconds, stopping early on game over.
pub fn run_game(config: GameConfig, seconds: f32, frame_delta: f32) -> GameMetrics {
    let seed = config.galaxy.seed;
    let dt = clamp_frame_delta(frame_delta);
    let frames = if dt > 0.0 && seconds > 0.0 {
        (seconds / dt).ceil() as u64
    } else {
        0
    };

    let mut sim = Simulation::with_config(config);
    let mut ships_destroyed = 0;
    let mut ships_spawned = 0;
    let mut dropped_spawns = 0;

    for _ in 0..frames {
        let events = sim.advance(dt);
        ships_destroyed += events.deaths.len();
        ships_spawned += events.spawned.len();
        dropped_spawns += events.dropped_spawns;
        if events.game_over {
            break;
        }
    }

    let metrics = GameMetrics {
        seed,
        survived: !sim.is_game_over(),
        game_age: sim.game_age(),
        ticks: sim.tick_count(),
        waves_started: sim.waves().waves_started(),
        ships_destroyed,
        ships_spawned,
        dropped_spawns,
        player_ships: sim.team_ship_count(Team::Player),
        enemy_ships: sim.team_ship_count(Team::Enemy),
        planets_owned: sim.planets().filter(|p| p.owner == Team::Player).count(),
        resources: sim.resources(),
        final_state_hash: sim.state_hash(),
    };
    debug!(
        seed,
        survived = metrics.survived,
        age = metrics.game_age,
        "game finished"
    );
    metrics
}

/// Run a batch of games
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    let progress = BatchProgress::new(config.game_count);

    info!(
        games = config.game_count,
        seed_start = config.seed_start,
        seconds = config.seconds,
        "starting batch run"
    );

    let play = || -> Vec<GameMetrics> {
        (0..config.game_count)
            .into_par_iter()
            .map(|i| {
                let seed = config.seed_start.wrapping_add(u64::from(i));
                let mut game = config.base.clone();
                game.galaxy.seed = seed;
                let metrics = run_game(game, config.seconds, config.frame_delta);

                progress.record_completion(metrics.survived);
                if progress.current() % 10 == 0 {
                    progress.report();
                }
                metrics
            })
            .collect()
    };

    let games = match local_pool(config.parallel_games) {
        Some(pool) => pool.install(play),
        None => play(),
    };

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        games = games.len(),
        survival = format_args!("{:.2}", summary.survival_rate),
        duration_s = format_args!("{duration_seconds:.1}"),
        "batch complete"
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
    }
}

/// Result of replaying one seed several times
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterminismReport {
    /// Seed replayed
    pub seed: u64,
    /// Final state hash of each run
    pub hashes: Vec<u64>,
    /// Whether every run ended in the same state
    pub deterministic: bool,
}

/// Verify determinism by running the same game several times in parallel
pub fn verify_determinism(
    config: &GameConfig,
    runs: u32,
    seconds: f32,
    frame_delta: f32,
) -> DeterminismReport {
    let hashes: Vec<u64> = (0..runs)
        .into_par_iter()
        .map(|_| run_game(config.clone(), seconds, frame_delta).final_state_hash)
        .collect();
    let deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    if !deterministic {
        warn!(seed = config.galaxy.seed, ?hashes, "runs diverged");
    }

    DeterminismReport {
        seed: config.galaxy.seed,
        hashes,
        deterministic,
    }
}

fn local_pool(threads: u32) -> Option<rayon::ThreadPool> {
    if threads == 0 {
        return None;
    }
    match rayon::ThreadPoolBuilder::new()
        .num_threads(threads as usize)
        .build()
    {
        Ok(pool) => Some(pool),
        Err(e) => {
            warn!(error = %e, "thread pool unavailable, using the global pool");
            None
        }
    }
}
