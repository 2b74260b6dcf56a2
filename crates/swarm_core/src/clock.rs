//! Simulation clock.
//!
//! Turns variable frame deltas into zero or more simulation steps. In fixed
//! mode the leftover fraction carries over between frames and catch-up is
//! capped, so a long stall never schedules an unbounded burst of steps.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// How frame time is cut into steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StepMode {
    /// Whole steps of this many seconds.
    Fixed(f32),
    /// One step per frame, sized to the frame.
    Variable,
}

/// Clock tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Step mode.
    pub mode: StepMode,
    /// Catch-up cap for fixed mode.
    pub max_steps_per_frame: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            mode: StepMode::Fixed(1.0 / 60.0),
            max_steps_per_frame: 5,
        }
    }
}

/// Steps to run for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepPlan {
    /// Number of steps.
    pub steps: u32,
    /// Length of each step in seconds.
    pub step: f32,
}

impl StepPlan {
    /// A plan that runs nothing.
    pub const NONE: Self = Self {
        steps: 0,
        step: 0.0,
    };
}

/// Frame-to-step converter with a speed modifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationClock {
    config: ClockConfig,
    leftover: f32,
    speed: f32,
}

impl SimulationClock {
    /// Create a clock at normal speed.
    #[must_use]
    pub const fn new(config: ClockConfig) -> Self {
        Self {
            config,
            leftover: 0.0,
            speed: 1.0,
        }
    }

    /// Speed multiplier. Zero or below pauses.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Set the speed multiplier.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Unconsumed time carried into the next frame.
    #[must_use]
    pub const fn leftover(&self) -> f32 {
        self.leftover
    }

    /// Step mode in use.
    #[must_use]
    pub const fn mode(&self) -> StepMode {
        self.config.mode
    }

    /// Plan the steps for a frame of `delta` seconds.
    pub fn advance(&mut self, delta: f32) -> StepPlan {
        if self.speed <= 0.0 {
            return StepPlan::NONE;
        }
        let scaled = delta * self.speed;
        if scaled.is_nan() || scaled <= 0.0 {
            return StepPlan::NONE;
        }

        match self.config.mode {
            StepMode::Variable => StepPlan {
                steps: 1,
                step: scaled,
            },
            StepMode::Fixed(step) if step > 0.0 => {
                self.leftover += scaled;
                let whole = (self.leftover / step).floor();
                let max = self.config.max_steps_per_frame;
                let steps = if whole > max as f32 {
                    debug!(
                        requested = whole,
                        max, "frame too long, dropping excess time"
                    );
                    self.leftover = 0.0;
                    max
                } else {
                    let steps = whole as u32;
                    self.leftover = (self.leftover - whole * step).max(0.0);
                    steps
                };
                StepPlan { steps, step }
            }
            StepMode::Fixed(_) => StepPlan::NONE,
        }
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(ClockConfig::default())
    }
}
