//! Resource accounting.
//!
//! Three fungible resources are tracked in one [`ResourceLedger`]. Stored
//! values are real-valued and may go negative; negative energy switches off
//! energy-consuming buildings but is never clamped.
//!
//! Per-step income and upkeep are gathered as rates (per second) into one
//! [`Resources`] delta and scaled by the step size once, so the economy runs
//! at the same speed regardless of step granularity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::components::Team;
use crate::data::ShipClassTable;
use crate::error::{GameError, Result};
use crate::store::EntityStore;

/// One of the three resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    /// Powers mines, farms and ships.
    Energy,
    /// Pays for buildings and ships.
    RawMaterial,
    /// Feeds planets.
    Food,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Energy => "energy",
            Self::RawMaterial => "raw material",
            Self::Food => "food",
        };
        f.write_str(name)
    }
}

/// An amount (or rate) of each resource.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Resources {
    /// Energy.
    pub energy: f32,
    /// Raw material.
    pub raw_material: f32,
    /// Food.
    pub food: f32,
}

impl Resources {
    /// Create a new amount.
    #[must_use]
    pub const fn new(energy: f32, raw_material: f32, food: f32) -> Self {
        Self {
            energy,
            raw_material,
            food,
        }
    }

    /// Nothing of anything.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Amount of a single resource.
    #[must_use]
    pub const fn get(&self, resource: Resource) -> f32 {
        match resource {
            Resource::Energy => self.energy,
            Resource::RawMaterial => self.raw_material,
            Resource::Food => self.food,
        }
    }

    /// Mutable amount of a single resource.
    pub fn get_mut(&mut self, resource: Resource) -> &mut f32 {
        match resource {
            Resource::Energy => &mut self.energy,
            Resource::RawMaterial => &mut self.raw_material,
            Resource::Food => &mut self.food,
        }
    }
}

impl std::ops::Add for Resources {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(
            self.energy + rhs.energy,
            self.raw_material + rhs.raw_material,
            self.food + rhs.food,
        )
    }
}

impl std::ops::AddAssign for Resources {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Resources {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(
            self.energy - rhs.energy,
            self.raw_material - rhs.raw_material,
            self.food - rhs.food,
        )
    }
}

impl std::ops::Mul<f32> for Resources {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        Self::new(self.energy * rhs, self.raw_material * rhs, self.food * rhs)
    }
}

/// The player's stockpile.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceLedger {
    /// Current stored amounts.
    pub stored: Resources,
}

impl ResourceLedger {
    /// Create a ledger with starting amounts.
    #[must_use]
    pub const fn new(stored: Resources) -> Self {
        Self { stored }
    }

    /// Stored amount of one resource.
    #[must_use]
    pub const fn amount(&self, resource: Resource) -> f32 {
        self.stored.get(resource)
    }

    /// Check if an amount can be paid.
    #[must_use]
    pub fn can_afford(&self, resource: Resource, cost: f32) -> bool {
        self.stored.get(resource) >= cost
    }

    /// Spend an amount if available.
    ///
    /// Leaves the ledger unchanged on [`GameError::InsufficientFunds`].
    pub fn spend(&mut self, resource: Resource, cost: f32) -> Result<()> {
        let available = self.stored.get(resource);
        if available < cost {
            return Err(GameError::InsufficientFunds {
                resource,
                required: cost,
                available,
            });
        }
        *self.stored.get_mut(resource) -= cost;
        Ok(())
    }

    /// Add a per-second rate over `step` seconds.
    pub fn apply_rate(&mut self, rate: Resources, step: f32) {
        self.stored += rate * step;
    }
}

/// Upkeep tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Food drained per second per `sqrt(radius)` of each player planet.
    pub food_upkeep: f32,
    /// Whether player ships drain their class energy usage.
    pub ship_energy_upkeep: bool,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            food_upkeep: 0.2,
            ship_energy_upkeep: true,
        }
    }
}

/// Upkeep rate (per second) for the player's planets and ships.
#[must_use]
pub fn upkeep_rate(
    store: &EntityStore,
    classes: &ShipClassTable,
    config: &EconomyConfig,
) -> Resources {
    let mut rate = Resources::ZERO;

    for planet in store.planets.iter().filter(|p| p.owner == Team::Player) {
        rate.food -= config.food_upkeep * planet.radius.max(0.0).sqrt();
    }

    if config.ship_energy_upkeep {
        for ship in store.ships.as_slice().iter().filter(|s| s.team == Team::Player) {
            rate.energy -= classes[ship.kind].energy_usage;
        }
    }

    rate
}
