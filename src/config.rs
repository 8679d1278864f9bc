use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::document::chunking::{DEFAULT_BLOCK_THRESHOLD, DEFAULT_WORD_BUDGET};
use crate::document::style::{Rgb, Style, StyleSheet};
use crate::provider::GenerationParams;

/// Settings for docbridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunking: ChunkingSettings,
    /// Base run style per role (`response`, `prompt`)
    pub styles: StyleSheet,
    /// Default generation parameters
    pub generation: GenerationParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Word budget of a Markdown chunk
    pub word_budget: usize,
    /// Blocks per structural chunk
    pub block_threshold: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        ChunkingSettings {
            word_budget: DEFAULT_WORD_BUDGET,
            block_threshold: DEFAULT_BLOCK_THRESHOLD,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        let response = Style::default()
            .with_font("Arial")
            .with_size(12.0)
            .with_color(Rgb(0x1E, 0x1E, 0x1E));
        let prompt = response.clone().with_bold(true);

        Settings {
            chunking: ChunkingSettings::default(),
            styles: StyleSheet::new()
                .with_role(StyleSheet::RESPONSE, response)
                .with_role(StyleSheet::PROMPT, prompt),
            generation: GenerationParams::default(),
        }
    }
}

impl Settings {
    /// Load settings from the config directory
    pub fn load() -> Result<Self> {
        match Self::get_config_path() {
            Some(config_path) => Self::load_from(&config_path),
            None => Ok(Settings::default()),
        }
    }

    /// Load settings from `path`, or defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Save settings to the config directory
    pub fn save(&self) -> Result<()> {
        if let Some(config_path) = Self::get_config_path() {
            self.save_to(&config_path)?;
        }

        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the settings file
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("docbridge").join("config.toml"))
    }

    /// Initialize default settings file
    pub fn init_default() -> Result<Option<PathBuf>> {
        let settings = Settings::default();
        settings.save()?;
        Ok(Self::get_config_path())
    }
}
