//! Static game data tables.
//!
//! Pure data structures describing ship classes and buildings. All structs
//! deserialize from RON so balance can be tuned without code changes.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by `swarm_headless`.

mod building_data;
mod ship_data;

pub use building_data::{BuildingData, BuildingTable};
pub use ship_data::{default_ship_classes, ShipClass, ShipClassTable};
