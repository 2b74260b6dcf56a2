//! Building data: yields, costs and shipyard cadence per building kind.

use serde::{Deserialize, Serialize};

use crate::components::BuildingKind;
use crate::economy::Resources;

/// Static configuration for one building kind.
///
/// # Example RON
///
/// ```ron
/// BuildingData(
///     yields: (energy: -2.0, raw_material: 3.0, food: 0.0),
///     needs_energy: true,
///     cost: 50.0,
///     build_interval: None,
/// )
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildingData {
    /// Resource change per second while running.
    #[serde(default)]
    pub yields: Resources,

    /// Building stops while stored energy is at or below zero.
    #[serde(default)]
    pub needs_energy: bool,

    /// Raw material cost to place.
    pub cost: f32,

    /// Seconds between ship builds, for shipyards.
    #[serde(default)]
    pub build_interval: Option<f32>,
}

impl BuildingData {
    const fn producer(yields: Resources, needs_energy: bool, cost: f32) -> Self {
        Self {
            yields,
            needs_energy,
            cost,
            build_interval: None,
        }
    }

    const fn shipyard(interval: f32, cost: f32) -> Self {
        Self {
            yields: Resources::ZERO,
            needs_energy: false,
            cost,
            build_interval: Some(interval),
        }
    }
}

/// Data for every building kind that can exist on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingTable {
    /// Headquarters (never buildable by command; cost is informational).
    pub headquarters: BuildingData,
    /// Mine.
    pub mine: BuildingData,
    /// Power plant.
    pub power_plant: BuildingData,
    /// Farm.
    pub farm: BuildingData,
    /// Fighter shipyard.
    pub shipyard_fighter: BuildingData,
    /// Bomber shipyard.
    pub shipyard_bomber: BuildingData,
    /// Cruiser shipyard.
    pub shipyard_cruiser: BuildingData,
}

impl BuildingTable {
    /// Data for a building kind. `None` for an empty tile.
    #[must_use]
    pub const fn get(&self, kind: BuildingKind) -> Option<&BuildingData> {
        match kind {
            BuildingKind::None => None,
            BuildingKind::Headquarters => Some(&self.headquarters),
            BuildingKind::Mine => Some(&self.mine),
            BuildingKind::PowerPlant => Some(&self.power_plant),
            BuildingKind::Farm => Some(&self.farm),
            BuildingKind::ShipyardFighter => Some(&self.shipyard_fighter),
            BuildingKind::ShipyardBomber => Some(&self.shipyard_bomber),
            BuildingKind::ShipyardCruiser => Some(&self.shipyard_cruiser),
        }
    }
}

impl Default for BuildingTable {
    fn default() -> Self {
        Self {
            headquarters: BuildingData::producer(Resources::new(3.0, 3.0, 3.0), false, 0.0),
            mine: BuildingData::producer(Resources::new(-2.0, 3.0, 0.0), true, 50.0),
            power_plant: BuildingData::producer(Resources::new(3.0, 0.0, 0.0), false, 50.0),
            farm: BuildingData::producer(Resources::new(-1.0, 0.0, 3.0), true, 50.0),
            shipyard_fighter: BuildingData::shipyard(2.0, 100.0),
            shipyard_bomber: BuildingData::shipyard(10.0, 200.0),
            shipyard_cruiser: BuildingData::shipyard(30.0, 400.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_yields() {
        let table = BuildingTable::default();
        let mine = table.get(BuildingKind::Mine).unwrap();
        assert_eq!(mine.yields, Resources::new(-2.0, 3.0, 0.0));
        assert!(mine.needs_energy);
        assert!(table.get(BuildingKind::None).is_none());
    }

    #[test]
    fn test_shipyard_intervals() {
        let table = BuildingTable::default();
        let intervals: Vec<Option<f32>> = [
            BuildingKind::ShipyardFighter,
            BuildingKind::ShipyardBomber,
            BuildingKind::ShipyardCruiser,
        ]
        .iter()
        .map(|&k| table.get(k).and_then(|d| d.build_interval))
        .collect();
        assert_eq!(intervals, vec![Some(2.0), Some(10.0), Some(30.0)]);
    }

    #[test]
    fn test_partial_ron_overrides_one_entry() {
        let text = "(mine: (yields: (raw_material: 5.0), cost: 10.0))";
        let table: BuildingTable = ron::from_str(text).unwrap();
        assert_eq!(table.mine.yields.raw_material, 5.0);
        assert_eq!(table.mine.yields.energy, 0.0);
        assert_eq!(table.farm, BuildingTable::default().farm);
    }
}
