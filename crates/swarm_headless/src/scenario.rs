//! Scenario loading.
//!
//! A scenario is a RON file holding a [`GameConfig`]. Every field is
//! optional; missing ones take the stock defaults, so a scenario only
//! names what it changes:
//!
//! ```ron
//! (
//!     galaxy: (seed: 42, planet_count: 8),
//!     waves: (escalation: 2.0),
//! )
//! ```

use std::path::Path;

use swarm_core::config::GameConfig;
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
}

/// Load a game configuration from a RON file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<GameConfig, ScenarioError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ScenarioError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    let config = from_ron_str(&contents)?;
    tracing::info!(
        path = %path.display(),
        seed = config.galaxy.seed,
        planets = config.galaxy.planet_count,
        "scenario loaded"
    );
    Ok(config)
}

/// Parse a game configuration from RON text.
pub fn from_ron_str(text: &str) -> Result<GameConfig, ScenarioError> {
    Ok(ron::from_str(text)?)
}

/// Load `path` if given, otherwise use the stock configuration.
pub fn load_or_default(path: Option<&Path>) -> Result<GameConfig, ScenarioError> {
    match path {
        Some(path) => load(path),
        None => Ok(GameConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_scenario_keeps_defaults() {
        let config = from_ron_str("(galaxy: (seed: 42, planet_count: 8))").unwrap();
        assert_eq!(config.galaxy.seed, 42);
        assert_eq!(config.galaxy.planet_count, 8);
        assert_eq!(config.waves, GameConfig::default().waves);
    }

    #[test]
    fn test_parse_error() {
        let err = from_ron_str("(galaxy: oops").unwrap_err();
        assert!(matches!(err, ScenarioError::ParseError(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load("/definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, ScenarioError::FileNotFound(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "(initial_ship: false, max_ships: Some(64))").unwrap();

        let config = load(file.path()).unwrap();
        assert!(!config.initial_ship);
        assert_eq!(config.max_ships, Some(64));
    }

    #[test]
    fn test_load_or_default_without_path() {
        assert_eq!(load_or_default(None).unwrap(), GameConfig::default());
    }
}
