//! Procedural galaxy layout.
//!
//! Planets are laid out along a two-armed spiral. Each planet draws its own
//! sub-seed up front, so changing how one planet uses its stream never
//! shifts the layout of the others.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::components::{BuildingKind, Planet, Team, Tile};
use crate::math::Vec2;
use crate::rng::SimRng;

/// Galaxy generation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalaxyConfig {
    /// Seed for layout and every later random decision.
    pub seed: u64,
    /// Distance from the centre to the outermost planet.
    pub radius: f32,
    /// Number of planets. At least one is always generated.
    pub planet_count: usize,
    /// Smallest planet radius (inclusive).
    pub min_planet_radius: f32,
    /// Largest planet radius (exclusive).
    pub max_planet_radius: f32,
    /// Range of the per-planet angle increment along the spiral, in radians.
    pub arm_twist: (f32, f32),
}

impl Default for GalaxyConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            radius: 100.0,
            planet_count: 5,
            min_planet_radius: 5.0,
            max_planet_radius: 20.0,
            arm_twist: (0.3, 1.2),
        }
    }
}

/// Lay out the planets.
///
/// Planet 0 sits at the centre, belongs to the player and carries the only
/// headquarters, on its middle tile. Every other planet starts enemy-owned
/// and empty. Radii are whole numbers in `[min, max)`.
#[must_use]
pub fn generate_galaxy(config: &GalaxyConfig, rng: &mut SimRng) -> Vec<Planet> {
    let count = config.planet_count.max(1);
    let seeds: Vec<u64> = (0..count).map(|_| rng.next_u64()).collect();

    let spacing = config.radius / count as f32;
    let size_span = (config.max_planet_radius - config.min_planet_radius).max(0.0);
    let mut distance = 0.0f32;
    let mut angle = 0.0f32;

    let mut planets: Vec<Planet> = seeds
        .iter()
        .enumerate()
        .map(|(i, &seed)| {
            let mut local = SimRng::new(seed);
            let arm = if i % 2 == 0 { 0.0 } else { PI };
            let position = Vec2::from_angle(angle + arm) * distance;

            distance += spacing;
            angle += local.range(config.arm_twist.0, config.arm_twist.1);

            let radius = config.min_planet_radius + (local.unit() * size_span).floor();
            Planet::new(position, radius, Team::Enemy)
        })
        .collect();

    if let Some(home) = planets.first_mut() {
        home.owner = Team::Player;
        let mid = home.mid_tile();
        if let Some(tile) = home.tiles.get_mut(mid) {
            *tile = Tile::with_building(BuildingKind::Headquarters);
        }
    }

    debug!(
        seed = config.seed,
        planets = planets.len(),
        "galaxy generated"
    );
    planets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn galaxy(seed: u64, count: usize) -> Vec<Planet> {
        let config = GalaxyConfig {
            seed,
            planet_count: count,
            ..GalaxyConfig::default()
        };
        generate_galaxy(&config, &mut SimRng::new(seed))
    }

    #[test]
    fn test_same_seed_same_layout() {
        assert_eq!(galaxy(42, 8), galaxy(42, 8));
        assert_ne!(galaxy(42, 8), galaxy(43, 8));
    }

    #[test]
    fn test_planet_sizes_and_tiles() {
        for planet in galaxy(7, 30) {
            assert!((5.0..20.0).contains(&planet.radius));
            assert_eq!(planet.radius.fract(), 0.0);
            assert_eq!(planet.tiles.len(), planet.radius.round() as usize);
        }
    }

    #[test]
    fn test_single_headquarters_on_home() {
        let planets = galaxy(3, 10);
        let home = &planets[0];
        assert_eq!(home.owner, Team::Player);
        assert_eq!(home.position, Vec2::ZERO);
        assert_eq!(
            home.tiles[home.mid_tile()].building,
            BuildingKind::Headquarters
        );

        let hq_count = planets
            .iter()
            .flat_map(|p| &p.tiles)
            .filter(|t| t.building == BuildingKind::Headquarters)
            .count();
        assert_eq!(hq_count, 1);
        assert!(planets[1..].iter().all(|p| p.owner == Team::Enemy));
    }

    #[test]
    fn test_planets_spread_outward() {
        let planets = galaxy(11, 5);
        // Spacing is radius / count = 20
        for (i, planet) in planets.iter().enumerate() {
            let expected = 20.0 * i as f32;
            assert!((planet.position.length() - expected).abs() < 1e-3);
        }
    }

    #[test]
    fn test_zero_planets_still_has_home() {
        assert_eq!(galaxy(1, 0).len(), 1);
    }
}
