//! Persistent Policy Settings
//!
//! Handles saving/loading the tunable policy values to disk.
//!
//! # Storage Locations
//! - Linux: `~/.config/heron/policy.json`
//! - Windows: `%APPDATA%\heron\policy.json`
//! - macOS: `~/Library/Application Support/heron/policy.json`

use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use heron_system::ConfigStore;

use crate::volume::{
    FM_ATTENUATION_DEFAULT_DB, FM_ATTENUATION_KEY, HEADSET_ATTENUATION_DEFAULT_DB,
    HEADSET_ATTENUATION_KEY, SPEAKER_ATTENUATION_DEFAULT_DB, SPEAKER_ATTENUATION_KEY,
};

fn default_speaker_attenuation() -> f32 {
    SPEAKER_ATTENUATION_DEFAULT_DB
}

fn default_headset_attenuation() -> f32 {
    HEADSET_ATTENUATION_DEFAULT_DB
}

fn default_fm_attenuation() -> f32 {
    FM_ATTENUATION_DEFAULT_DB
}

/// Root settings structure
///
/// The attenuation values correct for loudness differences between output
/// devices; the speaker default of 6 dB prevents distortion on small
/// hardware speakers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicySettings {
    /// Extra attenuation applied when routing to the loudspeaker (dB)
    #[serde(default = "default_speaker_attenuation")]
    pub speaker_attenuation_db: f32,

    /// Extra attenuation applied when routing to a wired headset or
    /// headphone (dB)
    #[serde(default = "default_headset_attenuation")]
    pub headset_attenuation_db: f32,

    /// Extra attenuation applied to FM radio audio (dB)
    #[serde(default = "default_fm_attenuation")]
    pub fm_attenuation_db: f32,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            speaker_attenuation_db: SPEAKER_ATTENUATION_DEFAULT_DB,
            headset_attenuation_db: HEADSET_ATTENUATION_DEFAULT_DB,
            fm_attenuation_db: FM_ATTENUATION_DEFAULT_DB,
        }
    }
}

impl PolicySettings {
    /// Load settings from disk, or return default if missing/corrupt
    pub fn load() -> Self {
        let path = Self::get_config_path();

        if let Some(path) = path {
            if path.exists() {
                match fs::File::open(&path) {
                    Ok(file) => match serde_json::from_reader(file) {
                        Ok(settings) => {
                            info!("Policy settings loaded from {:?}", path);
                            return settings;
                        }
                        Err(e) => {
                            error!("Failed to parse policy settings file: {}", e);
                        }
                    },
                    Err(e) => {
                        error!("Failed to open policy settings file: {}", e);
                    }
                }
            }
        }

        info!("Using default policy settings");
        Self::default()
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<(), String> {
        let path = Self::get_config_path().ok_or("Could not determine config path")?;

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let file = fs::File::create(&path).map_err(|e| e.to_string())?;
        serde_json::to_writer_pretty(file, self).map_err(|e| e.to_string())?;

        info!("Policy settings saved to {:?}", path);
        Ok(())
    }

    /// Get the platform-specific configuration file path
    fn get_config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "heron", "heron")
            .map(|proj| proj.config_dir().join("policy.json"))
    }
}

impl ConfigStore for PolicySettings {
    fn get(&self, key: &str, default: &str) -> String {
        match key {
            SPEAKER_ATTENUATION_KEY => self.speaker_attenuation_db.to_string(),
            HEADSET_ATTENUATION_KEY => self.headset_attenuation_db.to_string(),
            FM_ATTENUATION_KEY => self.fm_attenuation_db.to_string(),
            _ => default.to_string(),
        }
    }
}
