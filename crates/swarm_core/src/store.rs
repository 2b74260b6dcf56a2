//! Entity storage for ships and planets.
//!
//! Ships live in a dense array so the per-step loops touch contiguous
//! memory. Removal swaps the last live ship into the hole, which moves
//! ships between array slots; outside code therefore never holds an array
//! index, only a [`ShipHandle`] (slot index + generation) that is resolved
//! through a slot table on every access.
//!
//! Planets are created once per game and never removed, so they are
//! addressed by plain index.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::components::{Planet, Ship, Team};
use crate::error::{GameError, Result};

/// Number of ships the pool grows by when full.
pub const SHIP_BLOCK: usize = 64;

/// Stable reference to a pooled ship.
///
/// A handle stays valid across pool growth and across removal of *other*
/// ships. Once its own ship is removed it resolves to nothing, even after
/// the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShipHandle {
    index: u32,
    generation: u32,
}

impl ShipHandle {
    /// Slot index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Slot generation.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ShipHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    /// Position in the dense array while occupied.
    dense: Option<u32>,
}

/// Pool of live ships.
#[derive(Debug, Clone, Default)]
pub struct ShipStore {
    ships: Vec<Ship>,
    /// Slot index of each dense entry.
    dense_slots: Vec<u32>,
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    max_ships: Option<usize>,
}

impl ShipStore {
    /// Create an empty, unbounded pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty pool that refuses to hold more than `max_ships`.
    #[must_use]
    pub fn with_limit(max_ships: usize) -> Self {
        Self {
            max_ships: Some(max_ships),
            ..Self::default()
        }
    }

    /// Number of live ships.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ships.len()
    }

    /// Whether the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ships.is_empty()
    }

    /// Allocated capacity of the dense array.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.ships.capacity()
    }

    /// Add a ship and return its handle.
    ///
    /// The dense array grows in blocks of [`SHIP_BLOCK`]. Growth failure or
    /// hitting the configured limit yields [`GameError::CapacityExceeded`]
    /// and leaves the pool unchanged.
    pub fn spawn(&mut self, ship: Ship) -> Result<ShipHandle> {
        let len = self.ships.len();
        if self.max_ships.is_some_and(|max| len >= max) {
            return Err(GameError::CapacityExceeded { capacity: len });
        }
        if len == self.ships.capacity() {
            let mut block = SHIP_BLOCK;
            if let Some(max) = self.max_ships {
                block = block.min(max - len);
            }
            self.ships
                .try_reserve_exact(block)
                .and_then(|()| self.dense_slots.try_reserve_exact(block))
                .map_err(|_| GameError::CapacityExceeded { capacity: len })?;
        }

        let slot_index = match self.free_slots.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[slot_index as usize];
        slot.dense = Some(len as u32);

        self.ships.push(ship);
        self.dense_slots.push(slot_index);

        Ok(ShipHandle {
            index: slot_index,
            generation: slot.generation,
        })
    }

    fn dense_index(&self, handle: ShipHandle) -> Option<usize> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.dense.map(|d| d as usize)
    }

    /// Whether the handle still refers to a pooled ship.
    #[must_use]
    pub fn contains(&self, handle: ShipHandle) -> bool {
        self.dense_index(handle).is_some()
    }

    /// Resolve a handle. Stale handles resolve to `None`.
    #[must_use]
    pub fn get(&self, handle: ShipHandle) -> Option<&Ship> {
        self.dense_index(handle).map(|d| &self.ships[d])
    }

    /// Resolve a handle mutably. Stale handles resolve to `None`.
    pub fn get_mut(&mut self, handle: ShipHandle) -> Option<&mut Ship> {
        self.dense_index(handle).map(|d| &mut self.ships[d])
    }

    /// Remove a ship in O(1) plus one pass to clear targets.
    ///
    /// Every other ship targeting the removed one loses its target before
    /// the last ship is swapped into the freed position.
    pub fn remove(&mut self, handle: ShipHandle) -> Result<Ship> {
        let dense = self
            .dense_index(handle)
            .ok_or(GameError::InvalidHandle(handle))?;

        for ship in &mut self.ships {
            if ship.target == Some(handle) {
                ship.target = None;
            }
        }

        let removed = self.ships.swap_remove(dense);
        self.dense_slots.swap_remove(dense);
        if let Some(&moved_slot) = self.dense_slots.get(dense) {
            self.slots[moved_slot as usize].dense = Some(dense as u32);
        }

        let slot = &mut self.slots[handle.index as usize];
        slot.dense = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(handle.index);

        Ok(removed)
    }

    /// Handle of the ship at a dense position.
    #[must_use]
    pub fn handle_at(&self, dense: usize) -> Option<ShipHandle> {
        let slot_index = *self.dense_slots.get(dense)?;
        Some(ShipHandle {
            index: slot_index,
            generation: self.slots[slot_index as usize].generation,
        })
    }

    /// Iterate live ships with their handles, in pool order.
    pub fn iter(&self) -> impl Iterator<Item = (ShipHandle, &Ship)> + '_ {
        self.dense_slots
            .iter()
            .zip(&self.ships)
            .map(|(&slot_index, ship)| {
                (
                    ShipHandle {
                        index: slot_index,
                        generation: self.slots[slot_index as usize].generation,
                    },
                    ship,
                )
            })
    }

    /// Live ships as a slice, in pool order.
    #[must_use]
    pub fn as_slice(&self) -> &[Ship] {
        &self.ships
    }

    /// Number of live ships on `team`.
    #[must_use]
    pub fn team_count(&self, team: Team) -> usize {
        self.ships.iter().filter(|s| s.team == team).count()
    }

    /// Live ships as a mutable slice, in pool order.
    pub fn as_mut_slice(&mut self) -> &mut [Ship] {
        &mut self.ships
    }

    /// Lock `attacker` onto `target`.
    ///
    /// Fails if either handle is stale or both ships are on the same team.
    pub fn set_target(&mut self, attacker: ShipHandle, target: ShipHandle) -> Result<()> {
        let target_team = self
            .get(target)
            .ok_or(GameError::InvalidHandle(target))?
            .team;
        let ship = self
            .get_mut(attacker)
            .ok_or(GameError::InvalidHandle(attacker))?;
        if ship.team == target_team {
            return Err(GameError::InvalidTarget { attacker, target });
        }
        ship.target = Some(target);
        Ok(())
    }
}

/// All entities of one game.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    /// Live ships.
    pub ships: ShipStore,
    /// Planets, fixed for the whole game.
    pub planets: Vec<Planet>,
}

impl EntityStore {
    /// Create a store holding the given planets and no ships.
    #[must_use]
    pub fn new(planets: Vec<Planet>, max_ships: Option<usize>) -> Self {
        let ships = match max_ships {
            Some(max) => ShipStore::with_limit(max),
            None => ShipStore::new(),
        };
        Self { ships, planets }
    }

    /// Planet by index.
    #[must_use]
    pub fn planet(&self, index: usize) -> Option<&Planet> {
        self.planets.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ShipKind, Team};
    use crate::math::Vec2;

    fn ship(x: f32, team: Team) -> Ship {
        Ship::new(Vec2::new(x, 0.0), ShipKind::Fighter, team, 10.0)
    }

    #[test]
    fn test_spawn_and_resolve() {
        let mut store = ShipStore::new();
        let a = store.spawn(ship(1.0, Team::Player)).unwrap();
        let b = store.spawn(ship(2.0, Team::Enemy)).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(a).unwrap().position.x, 1.0);
        assert_eq!(store.get(b).unwrap().position.x, 2.0);
        assert!(store.capacity() >= SHIP_BLOCK);
    }

    #[test]
    fn test_team_count_follows_removals() {
        let mut store = ShipStore::new();
        let player = store.spawn(ship(0.0, Team::Player)).unwrap();
        store.spawn(ship(1.0, Team::Enemy)).unwrap();
        store.spawn(ship(2.0, Team::Enemy)).unwrap();
        assert_eq!(store.team_count(Team::Player), 1);
        assert_eq!(store.team_count(Team::Enemy), 2);

        store.remove(player).unwrap();
        assert_eq!(store.team_count(Team::Player), 0);
        assert_eq!(store.team_count(Team::Enemy), 2);
    }

    #[test]
    fn test_remove_invalidates_handle() {
        let mut store = ShipStore::new();
        let a = store.spawn(ship(1.0, Team::Player)).unwrap();
        store.remove(a).unwrap();

        assert!(store.get(a).is_none());
        assert_eq!(store.remove(a), Err(GameError::InvalidHandle(a)));
    }

    #[test]
    fn test_reused_slot_does_not_alias() {
        let mut store = ShipStore::new();
        let a = store.spawn(ship(1.0, Team::Player)).unwrap();
        store.remove(a).unwrap();
        let b = store.spawn(ship(9.0, Team::Enemy)).unwrap();

        assert_eq!(a.index(), b.index());
        assert_ne!(a.generation(), b.generation());
        assert!(store.get(a).is_none());
        assert_eq!(store.get(b).unwrap().position.x, 9.0);
    }

    #[test]
    fn test_swap_remove_keeps_other_handles() {
        let mut store = ShipStore::new();
        let a = store.spawn(ship(1.0, Team::Player)).unwrap();
        let b = store.spawn(ship(2.0, Team::Enemy)).unwrap();
        let c = store.spawn(ship(3.0, Team::Enemy)).unwrap();

        store.set_target(a, b).unwrap();
        // Removing the first-inserted ship moves `c` into its dense position
        let removed = store.remove(a).unwrap();
        assert_eq!(removed.position.x, 1.0);

        assert_eq!(store.get(b).unwrap().position.x, 2.0);
        assert_eq!(store.get(c).unwrap().position.x, 3.0);
        assert_eq!(store.handle_at(0), Some(c));
    }

    #[test]
    fn test_remove_clears_targets() {
        let mut store = ShipStore::new();
        let a = store.spawn(ship(1.0, Team::Player)).unwrap();
        let b = store.spawn(ship(2.0, Team::Enemy)).unwrap();
        let c = store.spawn(ship(3.0, Team::Player)).unwrap();
        store.set_target(a, b).unwrap();
        store.set_target(c, b).unwrap();

        store.remove(b).unwrap();

        assert!(store.get(a).unwrap().target.is_none());
        assert!(store.get(c).unwrap().target.is_none());
    }

    #[test]
    fn test_set_target_rejects_same_team() {
        let mut store = ShipStore::new();
        let a = store.spawn(ship(1.0, Team::Player)).unwrap();
        let b = store.spawn(ship(2.0, Team::Player)).unwrap();
        assert_eq!(
            store.set_target(a, b),
            Err(GameError::InvalidTarget {
                attacker: a,
                target: b
            })
        );
    }

    #[test]
    fn test_limit_reports_capacity_exceeded() {
        let mut store = ShipStore::with_limit(2);
        store.spawn(ship(1.0, Team::Player)).unwrap();
        store.spawn(ship(2.0, Team::Player)).unwrap();
        let err = store.spawn(ship(3.0, Team::Player)).unwrap_err();
        assert_eq!(err, GameError::CapacityExceeded { capacity: 2 });
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_growth_keeps_handles_valid() {
        let mut store = ShipStore::new();
        let first = store.spawn(ship(0.5, Team::Player)).unwrap();
        for i in 0..(SHIP_BLOCK * 3) {
            store.spawn(ship(i as f32, Team::Enemy)).unwrap();
        }
        assert!(store.capacity() >= SHIP_BLOCK * 3 + 1);
        assert_eq!(store.get(first).unwrap().position.x, 0.5);
    }

    #[test]
    fn test_iter_yields_resolvable_handles() {
        let mut store = ShipStore::new();
        for i in 0..5 {
            store.spawn(ship(i as f32, Team::Enemy)).unwrap();
        }
        let handles: Vec<ShipHandle> = store.iter().map(|(h, _)| h).collect();
        store.remove(handles[1]).unwrap();
        for (handle, ship) in store.iter() {
            assert_eq!(store.get(handle).unwrap().position, ship.position);
        }
    }
}
