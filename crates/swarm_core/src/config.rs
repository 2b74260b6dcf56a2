//! Game configuration.
//!
//! Every tunable of a game lives in [`GameConfig`]. Defaults reproduce the
//! stock game; a RON file only needs to name the values it changes.
//!
//! # Example RON
//!
//! ```ron
//! (
//!     galaxy: (seed: 7, planet_count: 12),
//!     clock: (mode: Fixed(0.02)),
//!     waves: (enabled: false),
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::clock::ClockConfig;
use crate::data::{default_ship_classes, BuildingTable, ShipClassTable};
use crate::economy::{EconomyConfig, Resources};
use crate::error::{GameError, Result};
use crate::flocking::FlockingConfig;
use crate::galaxy::GalaxyConfig;
use crate::waves::WaveConfig;

/// Complete configuration of one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Galaxy layout.
    pub galaxy: GalaxyConfig,
    /// Step scheduling.
    pub clock: ClockConfig,
    /// Resources at game start.
    pub starting_resources: Resources,
    /// Per-class ship stats.
    pub ships: ShipClassTable,
    /// Per-building yields and costs.
    pub buildings: BuildingTable,
    /// Steering weights and radii.
    pub flocking: FlockingConfig,
    /// Enemy waves.
    pub waves: WaveConfig,
    /// Upkeep.
    pub economy: EconomyConfig,
    /// Seconds between free fighters at the home planet. `None` disables.
    pub reinforcement_interval: Option<f32>,
    /// Launch a fighter from the home planet at game start.
    pub initial_ship: bool,
    /// Ship pool limit. `None` grows until allocation fails.
    pub max_ships: Option<usize>,
    /// End the game once no player ship is left.
    pub end_on_fleet_loss: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            galaxy: GalaxyConfig::default(),
            clock: ClockConfig::default(),
            starting_resources: Resources::new(100.0, 450.0, 300.0),
            ships: default_ship_classes(),
            buildings: BuildingTable::default(),
            flocking: FlockingConfig::default(),
            waves: WaveConfig::default(),
            economy: EconomyConfig::default(),
            reinforcement_interval: Some(1.0),
            initial_ship: true,
            max_ships: None,
            end_on_fleet_loss: true,
        }
    }
}

impl GameConfig {
    /// Parse a (possibly partial) RON document.
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::ConfigParse(e.to_string()))
    }

    /// Serialize to pretty RON.
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::ConfigParse(e.to_string()))
    }

    /// Override the galaxy shape, keeping everything else.
    #[must_use]
    pub fn with_galaxy(mut self, seed: u64, radius: f32, planet_count: usize) -> Self {
        self.galaxy.seed = seed;
        self.galaxy.radius = radius;
        self.galaxy.planet_count = planet_count;
        self
    }
}
