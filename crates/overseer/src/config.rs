//! Configuration loading for the Overseer.
//!
//! All tunable settings are loaded from a TOML file; every section has
//! serde defaults so a partial (or missing) file yields a working layer.

use serde::{Deserialize, Serialize};
use std::path::Path;

use deduction_events::rooms;

use crate::speech::SpeechWeights;

/// Complete Overseer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverseerConfig {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Known room catalogue
    #[serde(default = "default_rooms")]
    pub rooms: Vec<String>,
    /// Rooms with a reachable vent
    #[serde(default = "default_vent_rooms")]
    pub vent_rooms: Vec<String>,
    /// Speech scoring rule weights
    #[serde(default)]
    pub speech: SpeechWeights,
}

impl Default for OverseerConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            rooms: default_rooms(),
            vent_rooms: default_vent_rooms(),
            speech: SpeechWeights::default(),
        }
    }
}

impl OverseerConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::IoError)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::TomlError)
    }

    /// Serializes the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, TomlSerializeError> {
        toml::to_string_pretty(self).map_err(TomlSerializeError)
    }

    /// Whether the given room has a reachable vent.
    pub fn has_vent(&self, room: &str) -> bool {
        self.vent_rooms.iter().any(|r| r == room)
    }
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Seed for the role assigner's rng
    pub rng_seed: u64,
    /// Regeneration attempts after the first rejected draft
    pub speech_retry_budget: u32,
    /// Presence entries included in the alibi handed to the generator
    pub alibi_entries: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            rng_seed: 42,
            speech_retry_budget: 2,
            alibi_entries: 5,
        }
    }
}

fn default_rooms() -> Vec<String> {
    rooms::STANDARD.iter().map(|r| r.to_string()).collect()
}

fn default_vent_rooms() -> Vec<String> {
    // Storage, o2, and communications have no vent on the standard map.
    const VENTLESS: [&str; 3] = [rooms::STORAGE, rooms::O2, rooms::COMMUNICATIONS];
    rooms::STANDARD
        .iter()
        .filter(|r| !VENTLESS.contains(r))
        .map(|r| r.to_string())
        .collect()
}

/// Returns the default configuration as a TOML string.
pub fn default_config_toml() -> String {
    OverseerConfig::default()
        .to_toml()
        .unwrap_or_else(|_| String::new())
}

/// Errors that can occur while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading the config file
    IoError(std::io::Error),
    /// Error parsing TOML
    TomlError(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError(e) => Some(e),
            ConfigError::TomlError(e) => Some(e),
        }
    }
}

/// Error serializing configuration back to TOML.
#[derive(Debug)]
pub struct TomlSerializeError(pub toml::ser::Error);

impl std::fmt::Display for TomlSerializeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TOML serialize error: {}", self.0)
    }
}

impl std::error::Error for TomlSerializeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OverseerConfig::default();

        assert_eq!(config.rooms.len(), 14);
        assert_eq!(config.general.rng_seed, 42);
        assert_eq!(config.general.speech_retry_budget, 2);
        assert!(config.has_vent(rooms::ADMIN));
        assert!(!config.has_vent(rooms::STORAGE));
        assert!(!config.has_vent(rooms::O2));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = OverseerConfig::from_str(
            r#"
            [general]
            rng_seed = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.general.rng_seed, 7);
        assert_eq!(config.general.speech_retry_budget, 2);
        assert_eq!(config.rooms.len(), 14);
        assert_eq!(config.speech.xray_vision, -100);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = OverseerConfig::default();
        let toml = config.to_toml().unwrap();

        assert!(toml.contains("rng_seed"));
        assert!(toml.contains("xray_vision"));

        let parsed = OverseerConfig::from_str(&toml).unwrap();
        assert_eq!(parsed.general.rng_seed, config.general.rng_seed);
        assert_eq!(parsed.vent_rooms, config.vent_rooms);
    }

    #[test]
    fn test_default_config_toml_parses() {
        let toml = default_config_toml();
        assert!(OverseerConfig::from_str(&toml).is_ok());
    }
}
