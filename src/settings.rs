//! Game settings and preferences
//!
//! Persisted separately from scores as a small JSON file. The speed
//! multiplier is the one setting the simulation reads - fresh each frame,
//! so mid-run changes take effect immediately.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Speed multiplier bounds and button step
pub const MIN_SPEED: f32 = 0.5;
pub const MAX_SPEED: f32 = 5.0;
pub const SPEED_STEP: f32 = 0.5;

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Simulation speed multiplier; scales both the tick rate and the
    /// frame catch-up cap
    pub speed: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self { speed: 1.0 }
    }
}

impl Settings {
    /// Clamp-set the speed multiplier
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
    }

    /// One step faster (the "Fast" button)
    pub fn faster(&mut self) {
        self.set_speed(self.speed + SPEED_STEP);
    }

    /// One step slower (the "Slow" button)
    pub fn slower(&mut self) {
        self.set_speed(self.speed - SPEED_STEP);
    }

    /// Load settings from a JSON file; any failure falls back to defaults.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("loaded settings from {}", path.display());
                    settings
                }
                Err(err) => {
                    log::warn!("settings file {} unreadable ({err})", path.display());
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("using default settings");
                Self::default()
            }
        }
    }

    /// Save settings to a JSON file.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        log::info!("settings saved to {}", path.display());
        Ok(())
    }
}
