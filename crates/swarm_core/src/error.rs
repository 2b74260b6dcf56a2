//! Error types for the game simulation.

use thiserror::Error;

use crate::economy::Resource;
use crate::store::ShipHandle;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all game simulation errors.
///
/// Nothing in here is fatal to a running simulation: a failed spawn is
/// dropped, a stale handle resolves to nothing, and an unaffordable build
/// leaves the state untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    /// The ship pool could not grow.
    #[error("Ship pool capacity exceeded ({capacity} ships)")]
    CapacityExceeded {
        /// Pool size at the time of the failed spawn.
        capacity: usize,
    },

    /// A handle referred to a ship that has since been removed.
    #[error("Stale or invalid ship handle: {0}")]
    InvalidHandle(ShipHandle),

    /// Not enough of a resource to pay for something.
    #[error("Insufficient funds: need {required} {resource}, have {available}")]
    InsufficientFunds {
        /// Resource that ran short.
        resource: Resource,
        /// Amount required.
        required: f32,
        /// Amount available.
        available: f32,
    },

    /// Planet index out of range.
    #[error("Invalid planet index: {0}")]
    InvalidPlanet(usize),

    /// Tile index out of range for the planet.
    #[error("Invalid tile {tile} on planet {planet}")]
    InvalidTile {
        /// Planet index.
        planet: usize,
        /// Tile index.
        tile: usize,
    },

    /// Tile already carries a building.
    #[error("Tile {tile} on planet {planet} is already occupied")]
    TileOccupied {
        /// Planet index.
        planet: usize,
        /// Tile index.
        tile: usize,
    },

    /// Building kind cannot be placed by a command.
    #[error("Building kind {0} cannot be built")]
    NotBuildable(&'static str),

    /// Target assignment violates the opposing-team rule.
    #[error("Ship {attacker} cannot target {target}")]
    InvalidTarget {
        /// Ship that would hold the target.
        attacker: ShipHandle,
        /// Requested target.
        target: ShipHandle,
    },

    /// Configuration file parsing error.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),
}
