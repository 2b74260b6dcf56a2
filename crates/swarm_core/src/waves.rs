//! Escalating enemy waves.
//!
//! The scheduler holds the active wave and a queued successor. A wave counts
//! down while pending, then spawns one enemy per class per step until its
//! counters run out. Once it is depleted and no enemy ship is left, the
//! queued wave is escalated and promoted.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::components::{PerClass, Ship, ShipKind, Team};
use crate::data::ShipClassTable;
use crate::math::Vec2;
use crate::rng::SimRng;
use crate::store::{ShipHandle, ShipStore};

/// Lifecycle stage of a wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WavePhase {
    /// Counting down.
    Pending,
    /// Releasing ships each step.
    Spawning,
    /// Every counter exhausted.
    Depleted,
}

/// A batch of enemy ships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    /// Ships still to spawn, per class. Fractional after escalation.
    pub remaining: PerClass<f32>,
    /// Seconds until spawning starts. Spawning begins once below zero.
    pub countdown: f32,
    /// Opposite corners of the spawn rectangle.
    pub spawn_area: (Vec2, Vec2),
}

impl Wave {
    /// Create a pending wave.
    #[must_use]
    pub const fn new(remaining: PerClass<f32>, countdown: f32, spawn_area: (Vec2, Vec2)) -> Self {
        Self {
            remaining,
            countdown,
            spawn_area,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> WavePhase {
        if self.countdown >= 0.0 {
            WavePhase::Pending
        } else if self.remaining.iter().any(|(_, &n)| n > 0.0) {
            WavePhase::Spawning
        } else {
            WavePhase::Depleted
        }
    }

    /// Whether every counter has run out and the countdown has elapsed.
    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.phase() == WavePhase::Depleted
    }

    /// Multiply every counter by `factor`.
    pub fn escalate(&mut self, factor: f32) {
        self.remaining = self.remaining.map(|n| n * factor);
    }

    /// Total ships still to spawn, rounding each fractional counter up.
    #[must_use]
    pub fn pending_ships(&self) -> u32 {
        self.remaining
            .iter()
            .map(|(_, &n)| n.max(0.0).ceil() as u32)
            .sum()
    }
}

/// Wave tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Whether waves run at all.
    pub enabled: bool,
    /// Counts of the first wave.
    pub first: PerClass<f32>,
    /// Seconds before the first wave spawns.
    pub first_countdown: f32,
    /// Counts of the queued wave at game start.
    pub next: PerClass<f32>,
    /// Countdown given to each promoted wave.
    pub interval: f32,
    /// Multiplier applied to the queued wave on promotion.
    pub escalation: f32,
    /// Spawn rectangle. Defaults to a box just outside the galaxy edge.
    pub spawn_area: Option<(Vec2, Vec2)>,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            first: PerClass::new(5.0, 0.0, 0.0),
            first_countdown: 30.0,
            next: PerClass::new(15.0, 5.0, 1.0),
            interval: 20.0,
            escalation: 1.5,
            spawn_area: None,
        }
    }
}

impl WaveConfig {
    /// The spawn rectangle for a galaxy of the given radius.
    #[must_use]
    pub fn spawn_area_for(&self, galaxy_radius: f32) -> (Vec2, Vec2) {
        self.spawn_area.unwrap_or((
            Vec2::new(galaxy_radius, -0.2 * galaxy_radius),
            Vec2::new(1.2 * galaxy_radius, 0.2 * galaxy_radius),
        ))
    }
}

/// What the scheduler did during one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaveOutcome {
    /// Enemy ships spawned.
    pub spawned: Vec<ShipHandle>,
    /// Spawns dropped because the pool was full.
    pub dropped: u32,
    /// Whether the active wave started spawning this step.
    pub started: bool,
    /// Whether the queued wave was promoted this step.
    pub promoted: bool,
}

/// Active and queued wave plus escalation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveScheduler {
    current: Wave,
    next: Wave,
    interval: f32,
    escalation: f32,
    enabled: bool,
    waves_started: u32,
}

impl WaveScheduler {
    /// Build the opening waves from config.
    #[must_use]
    pub fn new(config: &WaveConfig, galaxy_radius: f32) -> Self {
        let area = config.spawn_area_for(galaxy_radius);
        Self {
            current: Wave::new(config.first, config.first_countdown, area),
            next: Wave::new(config.next, config.interval, area),
            interval: config.interval,
            escalation: config.escalation,
            enabled: config.enabled,
            waves_started: 0,
        }
    }

    /// The active wave.
    #[must_use]
    pub const fn current(&self) -> &Wave {
        &self.current
    }

    /// The queued wave.
    #[must_use]
    pub const fn next(&self) -> &Wave {
        &self.next
    }

    /// Number of waves that have started spawning.
    #[must_use]
    pub const fn waves_started(&self) -> u32 {
        self.waves_started
    }

    /// Escalate the queued wave and make it the active one.
    ///
    /// The queued wave keeps its escalated counts so every promotion grows
    /// the following wave again.
    pub fn promote(&mut self) {
        self.next.escalate(self.escalation);
        self.current = self.next.clone();
        self.current.countdown = self.interval;
        self.next.countdown = self.interval;
        info!(
            fighters = self.current.remaining.fighter,
            bombers = self.current.remaining.bomber,
            cruisers = self.current.remaining.cruiser,
            "next wave queued as current"
        );
    }

    /// Start the active wave now, or promote the queued one if the active
    /// wave is already spent.
    pub fn trigger_now(&mut self) {
        match self.current.phase() {
            WavePhase::Pending => self.current.countdown = 0.0,
            WavePhase::Spawning => {}
            WavePhase::Depleted => {
                self.promote();
                self.current.countdown = 0.0;
            }
        }
    }

    /// Advance one step of `step` seconds.
    pub fn step(
        &mut self,
        ships: &mut ShipStore,
        classes: &ShipClassTable,
        rng: &mut SimRng,
        step: f32,
    ) -> WaveOutcome {
        let mut outcome = WaveOutcome::default();
        if !self.enabled {
            return outcome;
        }

        let enemies_left = ships.as_slice().iter().any(|s| s.team == Team::Enemy);
        if self.current.is_depleted() && !enemies_left {
            self.promote();
            outcome.promoted = true;
        }

        let was_pending = self.current.phase() == WavePhase::Pending;
        self.current.countdown -= step;
        if self.current.countdown >= 0.0 {
            return outcome;
        }
        if was_pending {
            self.waves_started += 1;
            outcome.started = true;
            info!(wave = self.waves_started, "wave incoming");
        }

        let (a, b) = self.current.spawn_area;
        for kind in ShipKind::ALL {
            let left = &mut self.current.remaining[kind];
            if *left <= 0.0 {
                continue;
            }
            *left = (*left - 1.0).max(0.0);

            let ship = Ship::new(rng.point_in_box(a, b), kind, Team::Enemy, classes[kind].health);
            match ships.spawn(ship) {
                Ok(handle) => {
                    debug!(%handle, kind = kind.name(), "enemy spawned");
                    outcome.spawned.push(handle);
                }
                Err(err) => {
                    warn!(%err, kind = kind.name(), "wave spawn dropped");
                    outcome.dropped += 1;
                }
            }
        }

        outcome
    }
}
