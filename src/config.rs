//! Tunable engine constants.
//!
//! None of the numbers below have a derivation; they were tuned by eye. They
//! live here so difficulty and pacing can be changed without touching the
//! animation or mission code. All of them can be overridden from a TOML file,
//! missing keys keep their defaults.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::builder::MISSION_TARGETS;

/// A constant that would leave a scene unable to run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("field of view must lie in (0, 180) degrees, got {0}")]
    FieldOfView(f32),
    #[error("clip planes must satisfy 0 < znear < zfar, got {znear}..{zfar}")]
    ClipPlanes { znear: f32, zfar: f32 },
    #[error("travel increment must be positive, got {0}")]
    TravelIncrement(f32),
    #[error("proximity threshold {threshold} must lie beyond the start depth {start}")]
    ProximityThreshold { threshold: f32, start: f32 },
    #[error("ring target {index} is out of range, there are {count} targets")]
    RingTarget { index: usize, count: usize },
}

/// Perspective parameters shared by both scenes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fovy_degrees: 75.0,
            znear: 0.1,
            zfar: 1000.0,
        }
    }
}

/// Pacing of the guided mission.
///
/// Rates are in radians per second so the scene looks the same at any frame
/// rate. `travel_increment` is applied once per frame while traveling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    /// Distance the target moves toward the camera per frame.
    pub travel_increment: f32,
    /// Target depth at which traveling turns into the challenge.
    pub proximity_threshold: f32,
    /// Target depth every target starts from.
    pub start_depth: f32,
    /// Points granted for a correct first answer.
    pub reward: u32,
    pub target_spin: f32,
    pub ring_spin: f32,
    pub starfield_drift: f32,
    /// Index of the one target that shows its ring.
    pub ring_target: usize,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            travel_increment: 0.12,
            proximity_threshold: 2.0,
            start_depth: -50.0,
            reward: 500,
            target_spin: 0.18,
            ring_spin: 0.06,
            starfield_drift: 0.006,
            ring_target: 4,
        }
    }
}

impl MissionConfig {
    /// Approach progress in `[0, 100]` for a target at `depth`.
    pub fn progress_at(&self, depth: f32) -> f32 {
        let span = self.proximity_threshold - self.start_depth;
        if span <= 0.0 {
            return 100.0;
        }
        (100.0 * (depth - self.start_depth) / span).clamp(0.0, 100.0)
    }
}

/// Pacing of the free orbit explorer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExploreConfig {
    pub body_spin: f32,
    pub bob_amplitude: f32,
    /// Angular frequency of the bobbing in radians per second.
    pub bob_frequency: f32,
    pub starfield_drift: f32,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            body_spin: 0.6,
            bob_amplitude: 0.2,
            bob_frequency: 1.0,
            starfield_drift: 0.03,
        }
    }
}

/// Every tuned constant of the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub camera: CameraConfig,
    pub mission: MissionConfig,
    pub explore: ExploreConfig,
}

impl EngineConfig {
    /// Reject constants with which the camera or the mission cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let camera = &self.camera;
        if !(camera.fovy_degrees > 0.0 && camera.fovy_degrees < 180.0) {
            return Err(ConfigError::FieldOfView(camera.fovy_degrees));
        }
        if !(camera.znear > 0.0 && camera.zfar > camera.znear) {
            return Err(ConfigError::ClipPlanes {
                znear: camera.znear,
                zfar: camera.zfar,
            });
        }
        let mission = &self.mission;
        if !(mission.travel_increment > 0.0 && mission.travel_increment.is_finite()) {
            return Err(ConfigError::TravelIncrement(mission.travel_increment));
        }
        if !(mission.proximity_threshold > mission.start_depth) {
            return Err(ConfigError::ProximityThreshold {
                threshold: mission.proximity_threshold,
                start: mission.start_depth,
            });
        }
        if mission.ring_target >= MISSION_TARGETS.len() {
            return Err(ConfigError::RingTarget {
                index: mission.ring_target,
                count: MISSION_TARGETS.len(),
            });
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let config = Self::from_toml_str(&source)
            .with_context(|| format!("invalid config {}", path.display()))?;
        log::info!("Loaded engine config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [mission]
            travel_increment = 0.5
            reward = 100
            "#,
        )
        .unwrap();
        assert_eq!(config.mission.travel_increment, 0.5);
        assert_eq!(config.mission.reward, 100);
        assert_eq!(config.mission.proximity_threshold, 2.0);
        assert_eq!(config.camera, CameraConfig::default());
    }

    fn rejected(source: &str) -> ConfigError {
        let err = EngineConfig::from_toml_str(source).unwrap_err();
        err.downcast::<ConfigError>().unwrap()
    }

    #[test]
    fn defaults_are_valid() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn stalled_travel_is_rejected() {
        assert_eq!(
            rejected("[mission]\ntravel_increment = 0.0"),
            ConfigError::TravelIncrement(0.0)
        );
        assert_eq!(
            rejected("[mission]\ntravel_increment = -0.5"),
            ConfigError::TravelIncrement(-0.5)
        );
    }

    #[test]
    fn threshold_before_start_is_rejected() {
        assert_eq!(
            rejected("[mission]\nproximity_threshold = -60.0"),
            ConfigError::ProximityThreshold {
                threshold: -60.0,
                start: -50.0
            }
        );
        assert!(matches!(
            rejected("[mission]\nstart_depth = 2.0"),
            ConfigError::ProximityThreshold { .. }
        ));
    }

    #[test]
    fn ring_target_must_exist() {
        assert_eq!(
            rejected("[mission]\nring_target = 5"),
            ConfigError::RingTarget { index: 5, count: 5 }
        );
    }

    #[test]
    fn broken_camera_is_rejected() {
        assert_eq!(
            rejected("[camera]\nfovy_degrees = 0.0"),
            ConfigError::FieldOfView(0.0)
        );
        assert!(matches!(
            rejected("[camera]\nznear = 10.0\nzfar = 5.0"),
            ConfigError::ClipPlanes { .. }
        ));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = EngineConfig::load("/nonexistent/orbit.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/orbit.toml"));
    }

    #[test]
    fn progress_is_clamped() {
        let mission = MissionConfig::default();
        assert_eq!(mission.progress_at(-50.0), 0.0);
        assert_eq!(mission.progress_at(-60.0), 0.0);
        assert_eq!(mission.progress_at(2.0), 100.0);
        assert_eq!(mission.progress_at(10.0), 100.0);
        assert!((mission.progress_at(-24.0) - 50.0).abs() < 1e-4);
    }
}
