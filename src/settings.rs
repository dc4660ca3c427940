//! Control settings
//!
//! Tunables of the control handlers: follow placement, the attack-talk roll,
//! and the pet-name rules. Loaded from `assets/config/control.ron` when the
//! file exists, defaults otherwise.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;
use std::fs;
use std::path::{Path, PathBuf};

/// Default path of the settings file.
pub const CONTROL_SETTINGS_PATH: &str = "assets/config/control.ron";

#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    /// Distance kept from the controller while following, in yards
    pub follow_distance: f32,
    /// Angle around the controller while following, in radians
    pub follow_angle: f32,
    /// Chance (0.0..=1.0) that a summoned companion voices its attack cue
    pub attack_talk_chance: f32,
    /// Happiness lost when the owner abandons a companion
    pub abandon_happiness_penalty: i32,
    pub min_pet_name_length: usize,
    pub max_pet_name_length: usize,
    /// Names no companion may take, compared case-insensitively
    pub reserved_names: Vec<String>,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            follow_distance: 1.0,
            follow_angle: FRAC_PI_2,
            attack_talk_chance: 0.1,
            abandon_happiness_penalty: 50_000,
            min_pet_name_length: 2,
            max_pet_name_length: 12,
            reserved_names: Vec::new(),
        }
    }
}

impl ControlSettings {
    fn settings_path() -> PathBuf {
        PathBuf::from(CONTROL_SETTINGS_PATH)
    }

    /// Parse settings from RON text
    pub fn from_ron_str(contents: &str) -> Result<Self, String> {
        let settings: ControlSettings =
            ron::from_str(contents).map_err(|e| format!("Failed to parse control settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Sanity-check loaded values
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.attack_talk_chance) {
            return Err(format!(
                "attack_talk_chance {} is outside 0.0..=1.0",
                self.attack_talk_chance
            ));
        }
        if self.min_pet_name_length == 0 || self.min_pet_name_length > self.max_pet_name_length {
            return Err(format!(
                "invalid pet name length bounds {}..={}",
                self.min_pet_name_length, self.max_pet_name_length
            ));
        }
        if self.follow_distance < 0.0 {
            return Err("follow_distance must not be negative".to_string());
        }
        Ok(())
    }

    /// Whether `name` is on the reserved list
    pub fn is_reserved(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        self.reserved_names
            .iter()
            .any(|reserved| reserved.to_lowercase() == lowered)
    }

    /// Load settings from `path`, or return defaults if it is missing or broken
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(contents) => match Self::from_ron_str(&contents) {
                    Ok(settings) => {
                        info!("Loaded control settings from {:?}", path);
                        settings
                    }
                    Err(e) => {
                        warn!("{}", e);
                        Self::default()
                    }
                },
                Err(e) => {
                    warn!("Failed to read control settings file: {}", e);
                    Self::default()
                }
            }
        } else {
            info!("No control settings file found, using defaults");
            Self::default()
        }
    }

    pub fn load() -> Self {
        Self::load_from(&Self::settings_path())
    }
}
