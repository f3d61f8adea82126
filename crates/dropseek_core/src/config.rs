//! Engine configuration.
//!
//! # Responsibility
//! - Hold the tunable distances and presentation mode of the engine.
//! - Load them from JSON with every field defaulted.
//!
//! # Invariants
//! - A config returned by `from_json_str`/`load` has passed `validate()`.
//! - The expiry window is fixed (`DROP_TTL_MS`) and not configurable.

use crate::geo::direction::{DirectionMode, DirectionProjector, DEFAULT_OPEN_DISTANCE_M};
use crate::geo::proximity::DEFAULT_DISCOVERY_RADIUS_M;
use crate::sensor::LocationOptions;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid { field, reason } => write!(f, "invalid config `{field}`: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

/// Tunables for discovery, guidance and sensing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Drops farther than this are not discoverable.
    pub discovery_radius_m: f64,
    /// Opening is allowed at or within this distance.
    pub open_distance_m: f64,
    /// Indicator edge distance; `None` uses the discovery radius.
    pub guidance_max_range_m: Option<f64>,
    pub direction_mode: DirectionMode,
    pub high_accuracy_location: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            discovery_radius_m: DEFAULT_DISCOVERY_RADIUS_M,
            open_distance_m: DEFAULT_OPEN_DISTANCE_M,
            guidance_max_range_m: None,
            direction_mode: DirectionMode::Radar,
            high_accuracy_location: true,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.discovery_radius_m.is_finite() && self.discovery_radius_m > 0.0) {
            return Err(invalid("discovery_radius_m", "must be finite and > 0"));
        }
        if !(self.open_distance_m.is_finite() && self.open_distance_m >= 0.0) {
            return Err(invalid("open_distance_m", "must be finite and >= 0"));
        }
        if self.open_distance_m > self.discovery_radius_m {
            return Err(invalid(
                "open_distance_m",
                "must not exceed discovery_radius_m",
            ));
        }
        if let Some(range) = self.guidance_max_range_m {
            if !(range.is_finite() && range > 0.0) {
                return Err(invalid("guidance_max_range_m", "must be finite and > 0"));
            }
        }
        Ok(())
    }

    /// Effective indicator range.
    pub fn guidance_range_m(&self) -> f64 {
        self.guidance_max_range_m.unwrap_or(self.discovery_radius_m)
    }

    pub fn projector(&self) -> DirectionProjector {
        DirectionProjector::new(
            self.direction_mode,
            self.guidance_range_m(),
            self.open_distance_m,
        )
    }

    pub fn location_options(&self) -> LocationOptions {
        LocationOptions {
            high_accuracy: self.high_accuracy_location,
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, EngineConfig};
    use crate::geo::direction::DirectionMode;

    #[test]
    fn empty_document_yields_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.guidance_range_m(), 1000.0);
        assert!(config.location_options().high_accuracy);
    }

    #[test]
    fn partial_document_overrides_selected_fields() {
        let config = EngineConfig::from_json_str(
            r#"{"open_distance_m": 1.0, "guidance_max_range_m": 50.0, "direction_mode": "map"}"#,
        )
        .unwrap();
        assert_eq!(config.open_distance_m, 1.0);
        assert_eq!(config.direction_mode, DirectionMode::Map);

        let projector = config.projector();
        assert_eq!(projector.max_range_m(), 50.0);
        assert_eq!(projector.open_distance_m(), 1.0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for json in [
            r#"{"discovery_radius_m": 0}"#,
            r#"{"open_distance_m": -1}"#,
            r#"{"open_distance_m": 2000}"#,
            r#"{"guidance_max_range_m": 0}"#,
        ] {
            let err = EngineConfig::from_json_str(json).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }), "{json}: {err}");
        }
    }

    #[test]
    fn unknown_fields_and_bad_json_fail_to_parse() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"radius": 5}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"discovery_radius_m": 250}"#).unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.discovery_radius_m, 250.0);

        let missing = EngineConfig::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io(_)));
    }
}
