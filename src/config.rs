//! Configuration for game layouts and decompiler output
//!
//! A configuration file is plain TOML; every key is optional and falls back to
//! the layout of the PC release:
//!
//! ```toml
//! [layout]
//! base = "dr2_data.wad"
//! locale = "dr2_data_us.wad"
//! base_alt = "dr2_data_keyboard.wad"
//! locale_alt = "dr2_data_keyboard_us.wad"
//! script_dir = "Dr2/data/us/script"
//!
//! [decompile]
//! structural_breaks = true
//! resolve_strings = true
//! ```

use crate::assets::Role;
use crate::error::{Result, ShslError};
use crate::script::DecompileOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: GameLayout,
    pub decompile: DecompileOptions,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.layout.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Archive file names of a game installation, relative to its directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameLayout {
    pub base: String,
    pub locale: String,
    pub base_alt: String,
    pub locale_alt: String,

    /// Directory holding the event scripts, inside the locale archive
    pub script_dir: String,
}

impl Default for GameLayout {
    fn default() -> Self {
        Self {
            base: "dr2_data.wad".to_string(),
            locale: "dr2_data_us.wad".to_string(),
            base_alt: "dr2_data_keyboard.wad".to_string(),
            locale_alt: "dr2_data_keyboard_us.wad".to_string(),
            script_dir: "Dr2/data/us/script".to_string(),
        }
    }
}

impl GameLayout {
    /// Archive file name for a role
    pub fn file_name(&self, role: Role) -> &str {
        match role {
            Role::Base => &self.base,
            Role::Locale => &self.locale,
            Role::BaseAlt => &self.base_alt,
            Role::LocaleAlt => &self.locale_alt,
        }
    }

    /// Archive paths inside `game_dir`, in priority order
    pub fn role_paths(&self, game_dir: &Path) -> Vec<(Role, PathBuf)> {
        Role::PRIORITY
            .iter()
            .map(|&role| (role, game_dir.join(self.file_name(role))))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        for role in Role::PRIORITY {
            if self.file_name(role).trim().is_empty() {
                return Err(ShslError::Config(format!(
                    "no archive file name given for role {}",
                    role
                )));
            }
        }
        Ok(())
    }
}
