//! User preferences.
//!
//! Preferences are a single struct read at session start and written back at teardown. Stored
//! files are merged over the defaults, so a file written by an older version that lacks newer
//! keys still loads.

use crate::constants::DEFAULT_COLLECTION;
use crate::{SolaceError, SolaceResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

const FONT_SIZE_RANGE: std::ops::RangeInclusive<u32> = 10..=40;
const REPEAT_COUNT_RANGE: std::ops::RangeInclusive<u32> = 1..=10;
const TTS_FACTOR_RANGE: std::ops::RangeInclusive<f32> = 0.5..=2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Reading font size in points.
    pub font_size: u32,
    /// How many times a recital verse is played back to back.
    pub repeat_count: u32,
    /// Memorization collection shown in the recital tab.
    pub current_collection: String,
    pub repeat_mode: bool,
    pub dark_mode: bool,
    /// Speech rate multiplier.
    pub tts_rate: f32,
    /// Speech pitch multiplier.
    pub tts_pitch: f32,
    /// Voice name; empty selects the platform default.
    pub tts_voice: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            font_size: 16,
            repeat_count: 3,
            current_collection: DEFAULT_COLLECTION.to_owned(),
            repeat_mode: true,
            dark_mode: false,
            tts_rate: 1.0,
            tts_pitch: 1.0,
            tts_voice: String::new(),
        }
    }
}

impl Preferences {
    /// Loads preferences from `path`.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `SolaceError::FileRead` if the file exists but cannot be read,
    /// `SolaceError::YamlDeserialization` if it is not valid YAML, and
    /// `SolaceError::InvalidInput` if a stored value is out of range.
    pub fn load(path: &Path) -> SolaceResult<Self> {
        if !path.exists() {
            tracing::debug!("no preferences at {}; using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| SolaceError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        let prefs: Preferences =
            serde_yaml::from_str(&raw).map_err(SolaceError::YamlDeserialization)?;
        prefs.validate()?;
        Ok(prefs)
    }

    /// Writes preferences to `path`, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> SolaceResult<()> {
        self.validate()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(SolaceError::CreateDir)?;
        }

        let yaml = serde_yaml::to_string(self).map_err(SolaceError::YamlSerialization)?;
        std::fs::write(path, yaml).map_err(|source| SolaceError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("saved preferences to {}", path.display());
        Ok(())
    }

    /// Checks that every value is within its supported range.
    pub fn validate(&self) -> SolaceResult<()> {
        if !FONT_SIZE_RANGE.contains(&self.font_size) {
            return Err(SolaceError::InvalidInput(format!(
                "font size {} is outside {}..={}",
                self.font_size,
                FONT_SIZE_RANGE.start(),
                FONT_SIZE_RANGE.end()
            )));
        }
        if !REPEAT_COUNT_RANGE.contains(&self.repeat_count) {
            return Err(SolaceError::InvalidInput(format!(
                "repeat count {} is outside {}..={}",
                self.repeat_count,
                REPEAT_COUNT_RANGE.start(),
                REPEAT_COUNT_RANGE.end()
            )));
        }
        for (name, value) in [("tts rate", self.tts_rate), ("tts pitch", self.tts_pitch)] {
            if !TTS_FACTOR_RANGE.contains(&value) {
                return Err(SolaceError::InvalidInput(format!(
                    "{} {} is outside 0.5..=2.0",
                    name, value
                )));
            }
        }
        if self.current_collection.trim().is_empty() {
            return Err(SolaceError::InvalidInput(
                "current collection cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let prefs = Preferences::load(&temp_dir.path().join("preferences.yaml")).unwrap();
        assert_eq!(prefs, Preferences::default());
        assert_eq!(prefs.current_collection, "awana-recital");
    }

    #[test]
    fn stored_values_are_merged_over_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("preferences.yaml");
        fs::write(&path, "font_size: 20\ndark_mode: true\n").expect("should write");

        let prefs = Preferences::load(&path).unwrap();
        assert_eq!(prefs.font_size, 20);
        assert!(prefs.dark_mode);
        assert_eq!(prefs.repeat_count, 3);
        assert_eq!(prefs.tts_rate, 1.0);
    }

    #[test]
    fn save_creates_parent_and_reloads() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("nested").join("preferences.yaml");

        let prefs = Preferences {
            repeat_count: 5,
            tts_voice: "Yuna".into(),
            ..Preferences::default()
        };
        prefs.save(&path).expect("save should succeed");

        assert_eq!(Preferences::load(&path).unwrap(), prefs);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let prefs = Preferences {
            tts_pitch: 3.0,
            ..Preferences::default()
        };
        assert!(matches!(prefs.validate(), Err(SolaceError::InvalidInput(_))));

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("preferences.yaml");
        fs::write(&path, "repeat_count: 0\n").expect("should write");
        assert!(matches!(
            Preferences::load(&path),
            Err(SolaceError::InvalidInput(_))
        ));
    }

    #[test]
    fn invalid_yaml_is_reported() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("preferences.yaml");
        fs::write(&path, "font_size: [[[").expect("should write");
        assert!(matches!(
            Preferences::load(&path),
            Err(SolaceError::YamlDeserialization(_))
        ));
    }
}
