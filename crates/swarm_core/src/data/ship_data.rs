//! Ship class data: the static stats of each ship kind.

use serde::{Deserialize, Serialize};

use crate::components::{PerClass, ShipKind};

/// Static configuration for one ship kind.
///
/// # Example RON
///
/// ```ron
/// ShipClass(
///     acceleration: 4.0,
///     speed: 12.0,
///     damage: (fighter: 10.0, bomber: 6.0, cruiser: 2.0),
///     sensor_range: 30.0,
///     weapon_range: 10.0,
///     fire_speed: 20.0,
///     health: 10.0,
///     energy_usage: 0.05,
///     cost: 25.0,
/// )
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShipClass {
    /// How fast the heading turns toward the applied force.
    pub acceleration: f32,

    /// Scalar travel speed in world units per second.
    pub speed: f32,

    /// Damage per second dealt to a target, by the target's kind.
    pub damage: PerClass<f32>,

    /// Radius within which enemies may be acquired.
    pub sensor_range: f32,

    /// Radius within which the weapon fires.
    pub weapon_range: f32,

    /// Weapon animation rate (timer units per second).
    pub fire_speed: f32,

    /// Base health.
    pub health: f32,

    /// Energy drained per second while a player ship is alive.
    pub energy_usage: f32,

    /// Raw material cost to build at a shipyard.
    pub cost: f32,
}

impl ShipClass {
    /// Damage per second against a target of the given kind.
    #[must_use]
    pub fn damage_against(&self, kind: ShipKind) -> f32 {
        self.damage[kind]
    }

    /// Default fighter stats.
    #[must_use]
    pub const fn fighter() -> Self {
        Self {
            acceleration: 4.0,
            speed: 12.0,
            damage: PerClass::new(10.0, 6.0, 2.0),
            sensor_range: 30.0,
            weapon_range: 10.0,
            fire_speed: 20.0,
            health: 10.0,
            energy_usage: 0.05,
            cost: 25.0,
        }
    }

    /// Default bomber stats.
    #[must_use]
    pub const fn bomber() -> Self {
        Self {
            acceleration: 2.0,
            speed: 8.0,
            damage: PerClass::new(2.0, 4.0, 15.0),
            sensor_range: 25.0,
            weapon_range: 8.0,
            fire_speed: 10.0,
            health: 30.0,
            energy_usage: 0.2,
            cost: 80.0,
        }
    }

    /// Default cruiser stats.
    #[must_use]
    pub const fn cruiser() -> Self {
        Self {
            acceleration: 1.0,
            speed: 5.0,
            damage: PerClass::new(8.0, 8.0, 8.0),
            sensor_range: 40.0,
            weapon_range: 20.0,
            fire_speed: 5.0,
            health: 120.0,
            energy_usage: 1.0,
            cost: 300.0,
        }
    }
}

/// Stats for every ship kind.
pub type ShipClassTable = PerClass<ShipClass>;

/// The stock ship class table.
#[must_use]
pub const fn default_ship_classes() -> ShipClassTable {
    PerClass::new(ShipClass::fighter(), ShipClass::bomber(), ShipClass::cruiser())
}
