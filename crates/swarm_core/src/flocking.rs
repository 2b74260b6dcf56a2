//! Ship steering, targeting and weapons.
//!
//! Every step each ship is in exactly one mode:
//!
//! - **Cruise** (no target): evade planet bodies, rally to the best friendly
//!   planet, flock with friendly ships and roll to acquire nearby enemies.
//!   A lock made this step cancels the flocking terms.
//! - **Target**: close on the locked enemy and fire. The lock breaks once
//!   the enemy is outside weapon range.
//!
//! Decisions are computed against a read-only view of the pool, then
//! applied in a second pass so no ship sees another ship's half-updated
//! state.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::components::{Planet, Ship, Team, WEAPON_TIMER_WRAP};
use crate::data::{ShipClass, ShipClassTable};
use crate::math::Vec2;
use crate::rng::SimRng;
use crate::store::{EntityStore, ShipHandle, ShipStore};

/// Steering weights and radii.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockingConfig {
    /// Weight of the pull toward the chosen rally planet.
    pub planet_weight: f32,
    /// Evasion starts inside this multiple of a planet's radius.
    pub evasion_margin: f32,
    /// Upper bound of the evasion push.
    pub evasion_max: f32,
    /// Separation radius.
    pub separation_radius: f32,
    /// Separation weight.
    pub separation_weight: f32,
    /// Alignment radius.
    pub alignment_radius: f32,
    /// Alignment weight.
    pub alignment_weight: f32,
    /// Cohesion radius.
    pub cohesion_radius: f32,
    /// Cohesion weight.
    pub cohesion_weight: f32,
    /// Per-step, per-candidate chance of locking an enemy in sensor range.
    pub acquire_chance: f32,
}

impl Default for FlockingConfig {
    fn default() -> Self {
        Self {
            planet_weight: 3.0,
            evasion_margin: 1.1,
            evasion_max: 10.0,
            separation_radius: 5.0,
            separation_weight: 1.0,
            alignment_radius: 2.0,
            alignment_weight: 1.0,
            cohesion_radius: 5.0,
            cohesion_weight: 1.0,
            acquire_chance: 0.1,
        }
    }
}

/// Recompute every planet's presence scores from scratch.
///
/// Each ship adds `1 / max(1, distance - radius)` to the score of its own
/// class on every planet its team owns.
pub fn accumulate_presence(store: &mut EntityStore) {
    for planet in &mut store.planets {
        planet.presence = Default::default();
    }
    for ship in store.ships.as_slice() {
        for planet in store.planets.iter_mut().filter(|p| p.owner == ship.team) {
            let gap = ship.position.distance(planet.position) - planet.radius;
            planet.presence[ship.kind] += 1.0 / gap.max(1.0);
        }
    }
}

/// Per-ship result of the read-only pass.
#[derive(Debug, Clone, Copy)]
struct Decision {
    force: Vec2,
    target: Option<ShipHandle>,
    weapon_timer: f32,
    hit: Option<(ShipHandle, f32)>,
}

/// Counters from one motion step, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionOutcome {
    /// Targets locked this step.
    pub acquired: u32,
    /// Ships that fired this step.
    pub firing: u32,
    /// Targets dropped this step.
    pub released: u32,
}

/// Steer, fight and integrate every ship for one step.
pub fn step_ships(
    store: &mut EntityStore,
    classes: &ShipClassTable,
    config: &FlockingConfig,
    rng: &mut SimRng,
    step: f32,
) -> MotionOutcome {
    let mut outcome = MotionOutcome::default();

    let decisions: Vec<Decision> = store
        .ships
        .iter()
        .map(|(handle, ship)| {
            let class = &classes[ship.kind];
            let decision = match ship.target {
                Some(target) => engage(&store.ships, ship, target, class, step),
                None => cruise(&store.ships, &store.planets, handle, ship, class, config, rng),
            };
            match (ship.target, decision.target) {
                (None, Some(_)) => outcome.acquired += 1,
                (Some(_), None) => outcome.released += 1,
                _ => {}
            }
            if decision.hit.is_some() {
                outcome.firing += 1;
            }
            decision
        })
        .collect();

    let mut hits = Vec::new();
    for (ship, decision) in store.ships.as_mut_slice().iter_mut().zip(&decisions) {
        ship.force = decision.force;
        ship.target = decision.target;
        ship.weapon_timer = decision.weapon_timer;
        let class = &classes[ship.kind];
        integrate(ship, class, step);
        if let Some(hit) = decision.hit {
            hits.push(hit);
        }
    }

    for (target, damage) in hits {
        if let Some(ship) = store.ships.get_mut(target) {
            ship.health.apply_damage(damage);
        }
    }

    outcome.released += release_stale_targets(&mut store.ships);
    trace!(
        acquired = outcome.acquired,
        firing = outcome.firing,
        released = outcome.released,
        "ships moved"
    );
    outcome
}

/// Turn the heading toward `force` and move at class speed.
fn integrate(ship: &mut Ship, class: &ShipClass, step: f32) {
    ship.velocity = (ship.velocity + ship.force * (step * class.acceleration)).normalize();
    ship.position += ship.velocity * (step * class.speed);
}

/// Drop targets that no longer resolve or whose health is gone.
fn release_stale_targets(ships: &mut ShipStore) -> u32 {
    let stale: Vec<usize> = ships
        .as_slice()
        .iter()
        .enumerate()
        .filter_map(|(i, ship)| {
            let target = ship.target?;
            let alive = ships.get(target).is_some_and(|t| !t.is_dead());
            (!alive).then_some(i)
        })
        .collect();

    let slice = ships.as_mut_slice();
    for &i in &stale {
        slice[i].target = None;
    }
    stale.len() as u32
}

/// Target mode: close in and fire.
fn engage(
    ships: &ShipStore,
    ship: &Ship,
    target: ShipHandle,
    class: &ShipClass,
    step: f32,
) -> Decision {
    let mut decision = Decision {
        force: Vec2::ZERO,
        target: None,
        weapon_timer: ship.weapon_timer,
        hit: None,
    };

    let Some(enemy) = ships.get(target) else {
        return decision;
    };
    if enemy.is_dead() || enemy.team == ship.team {
        return decision;
    }

    // Still closing in this step; the lock only holds inside weapon range.
    let offset = enemy.position - ship.position;
    decision.force = offset.normalize();
    if offset.length() > class.weapon_range {
        return decision;
    }

    decision.target = Some(target);
    decision.weapon_timer = (ship.weapon_timer + step * class.fire_speed) % WEAPON_TIMER_WRAP;
    decision.hit = Some((target, step * class.damage_against(enemy.kind)));
    decision
}

/// Cruise mode: evade, rally, flock and look for enemies.
fn cruise(
    ships: &ShipStore,
    planets: &[Planet],
    handle: ShipHandle,
    ship: &Ship,
    class: &ShipClass,
    config: &FlockingConfig,
    rng: &mut SimRng,
) -> Decision {
    let mut force = planet_forces(planets, ship, config);

    let mut separation = Vec2::ZERO;
    let mut alignment = Vec2::ZERO;
    let mut centroid = Vec2::ZERO;
    let mut peers = 0u32;
    let mut target = None;

    for (other_handle, other) in ships.iter() {
        if other_handle == handle {
            continue;
        }
        let distance = ship.position.distance(other.position);

        if other.team != ship.team {
            if !other.is_dead()
                && distance <= class.sensor_range
                && rng.chance(config.acquire_chance)
            {
                target = Some(other_handle);
                break;
            }
            continue;
        }

        if distance < config.separation_radius {
            let falloff = (config.separation_radius - distance) / config.separation_radius;
            separation += (ship.position - other.position).normalize() * falloff;
        }
        if distance < config.alignment_radius {
            alignment += other.velocity;
        }
        if distance < config.cohesion_radius {
            centroid += other.position;
            peers += 1;
        }
    }

    // A lock discards the flock terms summed before it.
    if target.is_none() {
        force += separation * config.separation_weight;
        force += alignment.normalize() * config.alignment_weight;
        if peers > 0 {
            let center = centroid * (1.0 / peers as f32);
            force += (center - ship.position).normalize() * config.cohesion_weight;
        }
    }

    Decision {
        force,
        target,
        weapon_timer: ship.weapon_timer,
        hit: None,
    }
}

/// Planet evasion plus the pull toward the best rally planet.
fn planet_forces(planets: &[Planet], ship: &Ship, config: &FlockingConfig) -> Vec2 {
    let mut force = Vec2::ZERO;

    for planet in planets {
        let distance = ship.position.distance(planet.position);
        let edge = planet.radius * config.evasion_margin;
        if distance < edge {
            let push = (edge - distance).clamp(0.0, config.evasion_max);
            force += (ship.position - planet.position).normalize() * push;
        }
    }

    let rally = planets
        .iter()
        .map(|planet| (planet, rally_score(planet, ship)))
        .min_by(|(_, a), (_, b)| a.total_cmp(b));
    if let Some((planet, _)) = rally {
        force += (planet.position - ship.position).normalize() * config.planet_weight;
    }

    force
}

/// Lower is better. Enemy planets are only chosen when no friendly one
/// exists.
fn rally_score(planet: &Planet, ship: &Ship) -> f32 {
    let distance = ship.position.distance(planet.position);
    if planet.owner == ship.team {
        distance.sqrt().sqrt() * planet.presence[ship.kind]
    } else {
        distance * 1000.0
    }
}
