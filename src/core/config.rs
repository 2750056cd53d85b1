//! Engine configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::streaming::window::MAX_WINDOW_RADIUS;
use crate::terrain::TerrainParams;

/// Runtime configuration for streaming, pacing and persistence.
///
/// Every field has a default, so a JSON file only needs to name the values it
/// overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Streaming window radius in chunks (window is (2R+1)² chunks)
    pub streaming_radius: i32,
    /// Simulation tick rate
    pub simulation_hz: f64,
    /// Pending-add drain rate
    pub drain_hz: f64,
    /// Max coordinates resolved per drain. None = take the whole list.
    pub drain_batch_limit: Option<usize>,
    /// Max GPU mesh uploads per rendered frame. None = unlimited.
    pub max_uploads_per_frame: Option<usize>,
    /// Directory holding `seed.txt` and the chunk files
    pub save_dir: PathBuf,
    /// LZ4-compress chunk payloads on save
    pub compress_chunks: bool,
    /// Accept headerless chunk blobs written by older builds
    pub legacy_compat: bool,
    /// Periods a fixed-rate loop may fall behind before resynchronising
    pub max_lag_periods: u32,
    /// Camera position used when a world scene starts
    pub initial_camera_position: [f32; 3],
    /// Terrain generation parameters
    pub terrain: TerrainParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            streaming_radius: 8,
            simulation_hz: 60.0,
            drain_hz: 16.0,
            drain_batch_limit: None,
            max_uploads_per_frame: None,
            save_dir: PathBuf::from("map"),
            compress_chunks: true,
            legacy_compat: true,
            max_lag_periods: 5,
            initial_camera_position: [8.0, 8.0, 270.0],
            terrain: TerrainParams::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serialize to pretty JSON
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reject values the loops cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(0..=MAX_WINDOW_RADIUS).contains(&self.streaming_radius) {
            return Err(Error::Config(format!(
                "streaming_radius must be in 0..={}, got {}",
                MAX_WINDOW_RADIUS, self.streaming_radius
            )));
        }
        for (name, hz) in [("simulation_hz", self.simulation_hz), ("drain_hz", self.drain_hz)] {
            if !(hz.is_finite() && hz > 0.0) {
                return Err(Error::Config(format!("{name} must be positive, got {hz}")));
            }
        }
        if self.drain_batch_limit == Some(0) {
            return Err(Error::Config("drain_batch_limit must be at least 1".into()));
        }
        if self.terrain.block_types == 0 {
            return Err(Error::Config("terrain.block_types must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.streaming_radius, 8);
        assert_eq!(config.simulation_hz, 60.0);
        assert_eq!(config.drain_hz, 16.0);
        assert_eq!(config.save_dir, PathBuf::from("map"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "streaming_radius": 3, "compress_chunks": false }"#)
            .expect("parse failed");
        assert_eq!(config.streaming_radius, 3);
        assert!(!config.compress_chunks);
        assert_eq!(config.drain_hz, 16.0);
    }

    #[test]
    fn test_json_round_trip() {
        let config = EngineConfig {
            drain_batch_limit: Some(32),
            ..Default::default()
        };
        let json = config.to_json_string().expect("serialize failed");
        let parsed = EngineConfig::from_json_str(&json).expect("parse failed");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "streaming_radius": -1 }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "streaming_radius": 1000000 }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "drain_hz": 0.0 }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "drain_batch_limit": 0 }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(EngineConfig::from_json_str("not json"), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().expect("failed to create temp dir");
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "save_dir": "worlds/alpha" }"#).expect("write failed");

        let config = EngineConfig::load(&path).expect("load failed");
        assert_eq!(config.save_dir, PathBuf::from("worlds/alpha"));
    }
}
