//! Entity data definitions.
//!
//! Ships, planets and tiles are pure data. Behaviour lives in the
//! simulation modules that borrow them for the duration of a step.

use serde::{Deserialize, Serialize};

use crate::math::{Vec2, Vec4};
use crate::store::ShipHandle;

// ============================================================================
// Teams and ship kinds
// ============================================================================

/// Side a ship or planet belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    /// The human player.
    Player,
    /// Wave-spawned attackers.
    Enemy,
}

impl Team {
    /// The other team.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }

    /// Display colour (RGBA).
    #[must_use]
    pub const fn color(self) -> Vec4 {
        match self {
            Self::Player => Vec4::new(0.3, 0.6, 1.0, 1.0),
            Self::Enemy => Vec4::new(1.0, 0.3, 0.2, 1.0),
        }
    }
}

/// Ship class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipKind {
    /// Fast, cheap, fragile.
    Fighter,
    /// Slow anti-capital ship.
    Bomber,
    /// Heavy long-range ship.
    Cruiser,
}

impl ShipKind {
    /// All ship kinds in table order.
    pub const ALL: [Self; 3] = [Self::Fighter, Self::Bomber, Self::Cruiser];

    /// Short name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fighter => "fighter",
            Self::Bomber => "bomber",
            Self::Cruiser => "cruiser",
        }
    }
}

/// One value per ship kind.
///
/// Used for damage tables, presence scores and wave spawn counts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerClass<T> {
    /// Value for fighters.
    pub fighter: T,
    /// Value for bombers.
    pub bomber: T,
    /// Value for cruisers.
    pub cruiser: T,
}

impl<T> PerClass<T> {
    /// Build a table from three values in fighter, bomber, cruiser order.
    #[must_use]
    pub const fn new(fighter: T, bomber: T, cruiser: T) -> Self {
        Self {
            fighter,
            bomber,
            cruiser,
        }
    }

    /// Iterate `(kind, value)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (ShipKind, &T)> {
        [
            (ShipKind::Fighter, &self.fighter),
            (ShipKind::Bomber, &self.bomber),
            (ShipKind::Cruiser, &self.cruiser),
        ]
        .into_iter()
    }
}

impl<T: Copy> PerClass<T> {
    /// Same value for every kind.
    #[must_use]
    pub const fn splat(value: T) -> Self {
        Self::new(value, value, value)
    }

    /// Apply `f` to every value.
    #[must_use]
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> PerClass<U> {
        PerClass::new(f(self.fighter), f(self.bomber), f(self.cruiser))
    }
}

impl<T> std::ops::Index<ShipKind> for PerClass<T> {
    type Output = T;

    fn index(&self, kind: ShipKind) -> &Self::Output {
        match kind {
            ShipKind::Fighter => &self.fighter,
            ShipKind::Bomber => &self.bomber,
            ShipKind::Cruiser => &self.cruiser,
        }
    }
}

impl<T> std::ops::IndexMut<ShipKind> for PerClass<T> {
    fn index_mut(&mut self, kind: ShipKind) -> &mut Self::Output {
        match kind {
            ShipKind::Fighter => &mut self.fighter,
            ShipKind::Bomber => &mut self.bomber,
            ShipKind::Cruiser => &mut self.cruiser,
        }
    }
}

// ============================================================================
// Ships
// ============================================================================

/// Health of a ship.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: f32,
    /// Maximum health points.
    pub max: f32,
}

impl Health {
    /// Create new health at full.
    #[must_use]
    pub const fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    /// A ship is dead once health reaches zero or below.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    /// Subtract damage. Health may go negative.
    pub fn apply_damage(&mut self, amount: f32) {
        self.current -= amount;
    }

    /// Health as a fraction of max, clamped to `[0, 1]`.
    #[must_use]
    pub fn ratio(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            (self.current / self.max).clamp(0.0, 1.0)
        }
    }
}

/// A mobile combat unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    /// World position.
    pub position: Vec2,
    /// Heading. Unit length after the first integration, zero at spawn.
    pub velocity: Vec2,
    /// Force applied during the last step.
    pub force: Vec2,
    /// Ship class.
    pub kind: ShipKind,
    /// Owning team.
    pub team: Team,
    /// Health.
    pub health: Health,
    /// Locked enemy, if any.
    pub target: Option<ShipHandle>,
    /// Weapon animation timer, wraps at [`WEAPON_TIMER_WRAP`].
    pub weapon_timer: f32,
}

/// Wrap value for [`Ship::weapon_timer`].
pub const WEAPON_TIMER_WRAP: f32 = 1000.0;

impl Ship {
    /// A fresh ship at rest with full health and no target.
    #[must_use]
    pub fn new(position: Vec2, kind: ShipKind, team: Team, base_health: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            force: Vec2::ZERO,
            kind,
            team,
            health: Health::new(base_health),
            target: None,
            weapon_timer: 0.0,
        }
    }

    /// Whether the ship should be removed at the next mortality sweep.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.health.is_dead()
    }

    /// Muzzle-flash cadence: true on odd whole values of the weapon timer.
    #[must_use]
    pub fn weapon_flash(&self) -> bool {
        (self.weapon_timer as u32) % 2 == 1
    }
}

// ============================================================================
// Planets
// ============================================================================

/// What stands on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Empty tile.
    #[default]
    None,
    /// Player headquarters: produces a little of everything.
    Headquarters,
    /// Converts energy into raw material.
    Mine,
    /// Produces energy.
    PowerPlant,
    /// Converts energy into food.
    Farm,
    /// Builds fighters.
    ShipyardFighter,
    /// Builds bombers.
    ShipyardBomber,
    /// Builds cruisers.
    ShipyardCruiser,
}

impl BuildingKind {
    /// Short name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Headquarters => "headquarters",
            Self::Mine => "mine",
            Self::PowerPlant => "power_plant",
            Self::Farm => "farm",
            Self::ShipyardFighter => "shipyard_fighter",
            Self::ShipyardBomber => "shipyard_bomber",
            Self::ShipyardCruiser => "shipyard_cruiser",
        }
    }

    /// Ship kind produced by this building, for shipyards.
    #[must_use]
    pub const fn shipyard_output(self) -> Option<ShipKind> {
        match self {
            Self::ShipyardFighter => Some(ShipKind::Fighter),
            Self::ShipyardBomber => Some(ShipKind::Bomber),
            Self::ShipyardCruiser => Some(ShipKind::Cruiser),
            _ => None,
        }
    }
}

/// One buildable slot on a planet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Tile {
    /// Building on the tile.
    pub building: BuildingKind,
    /// Building level (0 = nothing built).
    pub level: u8,
}

impl Tile {
    /// Tile with a level-1 building.
    #[must_use]
    pub const fn with_building(building: BuildingKind) -> Self {
        Self { building, level: 1 }
    }

    /// Whether nothing is built here.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.building == BuildingKind::None
    }
}

/// A stationary, contestable base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    /// World position.
    pub position: Vec2,
    /// Body radius.
    pub radius: f32,
    /// Current owner.
    pub owner: Team,
    /// Buildable tiles, `round(radius)` of them.
    pub tiles: Vec<Tile>,
    /// Per-class presence score, recomputed every step.
    pub presence: PerClass<f32>,
}

impl Planet {
    /// Create a planet with `round(radius)` empty tiles.
    #[must_use]
    pub fn new(position: Vec2, radius: f32, owner: Team) -> Self {
        let tile_count = radius.round().max(0.0) as usize;
        Self {
            position,
            radius,
            owner,
            tiles: vec![Tile::default(); tile_count],
            presence: PerClass::default(),
        }
    }

    /// Index of the middle tile.
    #[must_use]
    pub fn mid_tile(&self) -> usize {
        self.tiles.len() / 2
    }

    /// Whether any tile carries a building.
    #[must_use]
    pub fn has_buildings(&self) -> bool {
        self.tiles.iter().any(|t| !t.is_empty())
    }

    /// Point on the rim at `angle` and the outward direction there.
    #[must_use]
    pub fn rim_point(&self, angle: f32) -> (Vec2, Vec2) {
        let outward = Vec2::from_angle(angle);
        (self.position + outward * self.radius, outward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_opponent() {
        assert_eq!(Team::Player.opponent(), Team::Enemy);
        assert_eq!(Team::Enemy.opponent(), Team::Player);
    }

    #[test]
    fn test_per_class_index() {
        let mut table = PerClass::new(1.0, 2.0, 3.0);
        assert_eq!(table[ShipKind::Bomber], 2.0);
        table[ShipKind::Cruiser] += 1.0;
        assert_eq!(table.cruiser, 4.0);
        let doubled = table.map(|v| v * 2.0);
        assert_eq!(doubled, PerClass::new(2.0, 4.0, 8.0));
        let kinds: Vec<ShipKind> = table.iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, ShipKind::ALL.to_vec());
    }

    #[test]
    fn test_health_dead_at_zero() {
        let mut health = Health::new(10.0);
        assert!(!health.is_dead());
        health.apply_damage(10.0);
        assert!(health.is_dead());
        assert_eq!(health.ratio(), 0.0);
    }

    #[test]
    fn test_new_ship_at_rest() {
        let ship = Ship::new(Vec2::new(1.0, 2.0), ShipKind::Cruiser, Team::Enemy, 50.0);
        assert_eq!(ship.velocity, Vec2::ZERO);
        assert_eq!(ship.health.current, 50.0);
        assert!(ship.target.is_none());
        assert_eq!(ship.weapon_timer, 0.0);
    }

    #[test]
    fn test_planet_tile_count_is_rounded_radius() {
        let planet = Planet::new(Vec2::ZERO, 7.6, Team::Enemy);
        assert_eq!(planet.tiles.len(), 8);
        assert_eq!(planet.mid_tile(), 4);
        assert!(!planet.has_buildings());
    }

    #[test]
    fn test_shipyard_output() {
        assert_eq!(
            BuildingKind::ShipyardBomber.shipyard_output(),
            Some(ShipKind::Bomber)
        );
        assert_eq!(BuildingKind::Mine.shipyard_output(), None);
    }

    #[test]
    fn test_weapon_flash_parity() {
        let mut ship = Ship::new(Vec2::ZERO, ShipKind::Fighter, Team::Player, 1.0);
        ship.weapon_timer = 3.5;
        assert!(ship.weapon_flash());
        ship.weapon_timer = 4.2;
        assert!(!ship.weapon_flash());
    }
}
