//! Planet production: per-tile building behaviour and shipyards.
//!
//! Each step every tile of every player-owned planet is dispatched on its
//! [`BuildingKind`]. Producers contribute a per-second rate to the step's
//! resource delta; shipyards periodically pay raw material and launch a ship
//! from the planet rim.

use serde::{Deserialize, Serialize};
use tracing::{info, trace, warn};

use crate::components::{BuildingKind, Planet, Ship, ShipKind, Team, Tile};
use crate::data::{BuildingTable, ShipClassTable};
use crate::economy::{Resource, ResourceLedger, Resources};
use crate::error::{GameError, Result};
use crate::math::Vec2;
use crate::rng::SimRng;
use crate::store::{EntityStore, ShipHandle, ShipStore};

/// Jitter added to the outward launch direction of a new ship.
const LAUNCH_JITTER: f32 = 0.3;

/// What a tile does during one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TileAction {
    /// Nothing this step.
    Idle,
    /// Contribute a per-second resource rate.
    Yield(Resources),
    /// Try to build a ship of this kind.
    BuildShip(ShipKind),
}

impl BuildingKind {
    /// Behaviour of this building for the step that takes game age from
    /// `prev_age` to `age`.
    ///
    /// Energy consumers idle while `energy` is at or below zero. Shipyards
    /// fire once each time game age crosses a multiple of their interval.
    #[must_use]
    pub fn step_action(
        self,
        table: &BuildingTable,
        energy: f32,
        prev_age: f32,
        age: f32,
    ) -> TileAction {
        let Some(data) = table.get(self) else {
            return TileAction::Idle;
        };

        if let Some(kind) = self.shipyard_output() {
            return match data.build_interval {
                Some(interval) if crossed_interval(prev_age, age, interval) => {
                    TileAction::BuildShip(kind)
                }
                _ => TileAction::Idle,
            };
        }

        if data.needs_energy && energy <= 0.0 {
            return TileAction::Idle;
        }
        TileAction::Yield(data.yields)
    }
}

/// Whether game age crossed a whole multiple of `interval` this step.
#[must_use]
pub fn crossed_interval(prev_age: f32, age: f32, interval: f32) -> bool {
    interval > 0.0 && (age / interval).floor() > (prev_age / interval).floor()
}

/// Result of one production step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductionOutcome {
    /// Summed per-second yield of all running buildings.
    pub rate: Resources,
    /// Ships launched by shipyards.
    pub spawned: Vec<ShipHandle>,
    /// Launches dropped because the ship pool was full.
    pub dropped: u32,
}

/// Spawn a ship on a random point of the planet rim, heading roughly
/// outward.
pub fn spawn_at_rim(
    ships: &mut ShipStore,
    planet: &Planet,
    kind: ShipKind,
    team: Team,
    classes: &ShipClassTable,
    rng: &mut SimRng,
) -> Result<ShipHandle> {
    let (position, outward) = planet.rim_point(rng.angle());
    let jitter = Vec2::from_angle(rng.angle()) * LAUNCH_JITTER;

    let mut ship = Ship::new(position, kind, team, classes[kind].health);
    ship.velocity = (outward + jitter).normalize();
    ships.spawn(ship)
}

/// Run every building on every player planet for one step.
///
/// Shipyard costs are paid from `ledger` immediately; yields are returned as
/// a rate for the caller to apply once, scaled by the step size.
pub fn production_step(
    store: &mut EntityStore,
    ledger: &mut ResourceLedger,
    classes: &ShipClassTable,
    buildings: &BuildingTable,
    rng: &mut SimRng,
    prev_age: f32,
    age: f32,
) -> ProductionOutcome {
    let mut outcome = ProductionOutcome::default();

    for planet in store.planets.iter().filter(|p| p.owner == Team::Player) {
        for tile in &planet.tiles {
            let energy = ledger.amount(Resource::Energy);
            match tile.building.step_action(buildings, energy, prev_age, age) {
                TileAction::Idle => {}
                TileAction::Yield(rate) => outcome.rate += rate,
                TileAction::BuildShip(kind) => {
                    if planet.presence[kind] >= planet.radius {
                        trace!(kind = kind.name(), "shipyard idle: enough presence");
                        continue;
                    }
                    let cost = classes[kind].cost;
                    if let Err(err) = ledger.spend(Resource::RawMaterial, cost) {
                        trace!(%err, kind = kind.name(), "shipyard idle");
                        continue;
                    }
                    match spawn_at_rim(&mut store.ships, planet, kind, planet.owner, classes, rng)
                    {
                        Ok(handle) => outcome.spawned.push(handle),
                        Err(err) => {
                            *ledger.stored.get_mut(Resource::RawMaterial) += cost;
                            warn!(%err, kind = kind.name(), "shipyard launch dropped");
                            outcome.dropped += 1;
                        }
                    }
                }
            }
        }
    }

    outcome
}

/// Place a building on a tile, paying its raw material cost.
///
/// The first building on a planet transfers it to the player.
pub fn build_on_tile(
    store: &mut EntityStore,
    ledger: &mut ResourceLedger,
    buildings: &BuildingTable,
    planet_index: usize,
    tile_index: usize,
    kind: BuildingKind,
) -> Result<()> {
    if matches!(kind, BuildingKind::None | BuildingKind::Headquarters) {
        return Err(GameError::NotBuildable(kind.name()));
    }
    let planet = store
        .planets
        .get_mut(planet_index)
        .ok_or(GameError::InvalidPlanet(planet_index))?;
    let tile = planet
        .tiles
        .get_mut(tile_index)
        .ok_or(GameError::InvalidTile {
            planet: planet_index,
            tile: tile_index,
        })?;
    if !tile.is_empty() {
        return Err(GameError::TileOccupied {
            planet: planet_index,
            tile: tile_index,
        });
    }

    let cost = buildings.get(kind).map_or(0.0, |d| d.cost);
    ledger.spend(Resource::RawMaterial, cost)?;
    *tile = Tile::with_building(kind);

    info!(
        planet = planet_index,
        tile = tile_index,
        building = kind.name(),
        "building placed"
    );
    if planet.owner != Team::Player {
        planet.owner = Team::Player;
        info!(planet = planet_index, "planet captured");
    }
    Ok(())
}

/// Planet-local presence scores, for debugging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceReport {
    /// Planet index.
    pub planet: usize,
    /// Current owner.
    pub owner: Team,
    /// Fighter presence.
    pub fighter: f32,
    /// Bomber presence.
    pub bomber: f32,
    /// Cruiser presence.
    pub cruiser: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::default_ship_classes;

    fn home_store(kind: BuildingKind) -> EntityStore {
        let mut planet = Planet::new(Vec2::ZERO, 10.0, Team::Player);
        planet.tiles[0] = Tile::with_building(kind);
        EntityStore::new(vec![planet], None)
    }

    #[test]
    fn test_crossed_interval() {
        assert!(crossed_interval(1.99, 2.01, 2.0));
        assert!(!crossed_interval(2.01, 3.99, 2.0));
        assert!(crossed_interval(0.0, 10.0, 10.0));
        assert!(!crossed_interval(0.0, 5.0, 0.0));
    }

    #[test]
    fn test_headquarters_yields_all_three() {
        let table = BuildingTable::default();
        assert_eq!(
            BuildingKind::Headquarters.step_action(&table, 0.0, 0.0, 0.1),
            TileAction::Yield(Resources::new(3.0, 3.0, 3.0))
        );
    }

    #[test]
    fn test_energy_consumers_stop_without_energy() {
        let table = BuildingTable::default();
        for kind in [BuildingKind::Mine, BuildingKind::Farm] {
            assert_eq!(
                kind.step_action(&table, 0.0, 0.0, 0.1),
                TileAction::Idle
            );
            assert!(matches!(
                kind.step_action(&table, 5.0, 0.0, 0.1),
                TileAction::Yield(_)
            ));
        }
        // Power plants do not depend on stored energy
        assert!(matches!(
            BuildingKind::PowerPlant.step_action(&table, -5.0, 0.0, 0.1),
            TileAction::Yield(_)
        ));
    }

    #[test]
    fn test_empty_tile_idles() {
        let table = BuildingTable::default();
        assert_eq!(
            BuildingKind::None.step_action(&table, 100.0, 0.0, 1.0),
            TileAction::Idle
        );
    }

    #[test]
    fn test_shipyard_builds_on_interval() {
        let mut store = home_store(BuildingKind::ShipyardFighter);
        let mut ledger = ResourceLedger::new(Resources::new(0.0, 100.0, 0.0));
        let classes = default_ship_classes();
        let table = BuildingTable::default();
        let mut rng = SimRng::new(1);

        let outcome =
            production_step(&mut store, &mut ledger, &classes, &table, &mut rng, 1.9, 2.0);
        assert_eq!(outcome.spawned.len(), 1);
        assert_eq!(ledger.amount(Resource::RawMaterial), 75.0);

        let ship = store.ships.get(outcome.spawned[0]).unwrap();
        assert_eq!(ship.kind, ShipKind::Fighter);
        assert_eq!(ship.team, Team::Player);
        assert!((ship.position.length() - 10.0).abs() < 1e-3);
        assert!((ship.velocity.length() - 1.0).abs() < 1e-4);

        // Between multiples of the interval nothing happens
        let outcome =
            production_step(&mut store, &mut ledger, &classes, &table, &mut rng, 2.0, 2.5);
        assert!(outcome.spawned.is_empty());
    }

    #[test]
    fn test_shipyard_gated_by_funds_and_presence() {
        let classes = default_ship_classes();
        let table = BuildingTable::default();
        let mut rng = SimRng::new(2);

        let mut store = home_store(BuildingKind::ShipyardCruiser);
        let mut poor = ResourceLedger::new(Resources::new(0.0, 10.0, 0.0));
        let outcome =
            production_step(&mut store, &mut poor, &classes, &table, &mut rng, 29.9, 30.0);
        assert!(outcome.spawned.is_empty());
        assert_eq!(poor.amount(Resource::RawMaterial), 10.0);

        store.planets[0].presence.cruiser = 10.0;
        let mut rich = ResourceLedger::new(Resources::new(0.0, 1000.0, 0.0));
        let outcome =
            production_step(&mut store, &mut rich, &classes, &table, &mut rng, 29.9, 30.0);
        assert!(outcome.spawned.is_empty());
        assert_eq!(rich.amount(Resource::RawMaterial), 1000.0);
    }

    #[test]
    fn test_full_pool_refunds_launch() {
        let mut planet = Planet::new(Vec2::ZERO, 10.0, Team::Player);
        planet.tiles[0] = Tile::with_building(BuildingKind::ShipyardFighter);
        let mut store = EntityStore::new(vec![planet], Some(0));
        let mut ledger = ResourceLedger::new(Resources::new(0.0, 100.0, 0.0));
        let mut rng = SimRng::new(3);

        let outcome = production_step(
            &mut store,
            &mut ledger,
            &default_ship_classes(),
            &BuildingTable::default(),
            &mut rng,
            1.9,
            2.0,
        );
        assert_eq!(outcome.dropped, 1);
        assert_eq!(ledger.amount(Resource::RawMaterial), 100.0);
    }

    #[test]
    fn test_enemy_planets_do_not_produce() {
        let mut planet = Planet::new(Vec2::ZERO, 10.0, Team::Enemy);
        planet.tiles[0] = Tile::with_building(BuildingKind::PowerPlant);
        let mut store = EntityStore::new(vec![planet], None);
        let mut ledger = ResourceLedger::default();

        let outcome = production_step(
            &mut store,
            &mut ledger,
            &default_ship_classes(),
            &BuildingTable::default(),
            &mut SimRng::new(4),
            0.0,
            0.1,
        );
        assert_eq!(outcome.rate, Resources::ZERO);
    }

    #[test]
    fn test_build_on_tile_captures_planet() {
        let mut store = EntityStore::new(vec![Planet::new(Vec2::ZERO, 6.0, Team::Enemy)], None);
        let mut ledger = ResourceLedger::new(Resources::new(0.0, 60.0, 0.0));
        let table = BuildingTable::default();

        build_on_tile(&mut store, &mut ledger, &table, 0, 2, BuildingKind::Mine).unwrap();

        let planet = &store.planets[0];
        assert_eq!(planet.owner, Team::Player);
        assert_eq!(planet.tiles[2], Tile::with_building(BuildingKind::Mine));
        assert_eq!(ledger.amount(Resource::RawMaterial), 10.0);
    }

    #[test]
    fn test_build_on_tile_rejections() {
        let mut store = EntityStore::new(vec![Planet::new(Vec2::ZERO, 6.0, Team::Enemy)], None);
        let mut ledger = ResourceLedger::new(Resources::new(0.0, 60.0, 0.0));
        let table = BuildingTable::default();

        assert_eq!(
            build_on_tile(&mut store, &mut ledger, &table, 3, 0, BuildingKind::Mine),
            Err(GameError::InvalidPlanet(3))
        );
        assert_eq!(
            build_on_tile(&mut store, &mut ledger, &table, 0, 6, BuildingKind::Mine),
            Err(GameError::InvalidTile { planet: 0, tile: 6 })
        );
        assert_eq!(
            build_on_tile(&mut store, &mut ledger, &table, 0, 0, BuildingKind::Headquarters),
            Err(GameError::NotBuildable("headquarters"))
        );
        assert!(matches!(
            build_on_tile(&mut store, &mut ledger, &table, 0, 0, BuildingKind::ShipyardCruiser),
            Err(GameError::InsufficientFunds { .. })
        ));
        // Rejection leaves ownership and funds untouched
        assert_eq!(store.planets[0].owner, Team::Enemy);
        assert_eq!(ledger.amount(Resource::RawMaterial), 60.0);

        build_on_tile(&mut store, &mut ledger, &table, 0, 0, BuildingKind::Farm).unwrap();
        assert_eq!(
            build_on_tile(&mut store, &mut ledger, &table, 0, 0, BuildingKind::Farm),
            Err(GameError::TileOccupied { planet: 0, tile: 0 })
        );
    }
}
