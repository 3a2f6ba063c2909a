//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the core explicitly.
//! Environment variables are read by the binaries only, never by library code.

use crate::constants::{COMFORT_DATA_FILENAME, DEFAULT_CONTENT_DIR, DEFAULT_TAG};
use crate::engine::ScoringConfig;
use crate::{SolaceError, SolaceResult, Tag};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    content_dir: PathBuf,
    preferences_path: PathBuf,
    scoring: ScoringConfig,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `SolaceError::InvalidInput` if `content_dir` is not a directory.
    pub fn new(
        content_dir: PathBuf,
        preferences_path: PathBuf,
        scoring: ScoringConfig,
    ) -> SolaceResult<Self> {
        if !content_dir.is_dir() {
            return Err(SolaceError::InvalidInput(format!(
                "content directory {} does not exist",
                content_dir.display()
            )));
        }

        Ok(Self {
            content_dir,
            preferences_path,
            scoring,
        })
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    pub fn preferences_path(&self) -> &Path {
        &self.preferences_path
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }
}

/// Scoring configuration from optional overrides.
///
/// `compact` selects the four-verse variant; an empty or missing tag uses `comfort`.
pub fn scoring_from_values(
    compact: bool,
    default_tag: Option<String>,
) -> SolaceResult<ScoringConfig> {
    let tag = default_tag
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_TAG.to_string());
    let tag = Tag::new(tag)?;

    Ok(if compact {
        ScoringConfig::compact(tag)
    } else {
        ScoringConfig::standard(tag)
    })
}

/// Resolve the content directory without reading environment variables.
///
/// If `override_dir` is provided it must contain the comfort content file. Otherwise this looks
/// for `data/` relative to the current working directory and then walks up from
/// `CARGO_MANIFEST_DIR`.
pub fn resolve_content_dir(override_dir: Option<PathBuf>) -> SolaceResult<PathBuf> {
    fn looks_like_content_dir(path: &Path) -> bool {
        path.join(COMFORT_DATA_FILENAME).is_file()
    }

    if let Some(content_dir) = override_dir {
        if content_dir.is_dir() && looks_like_content_dir(&content_dir) {
            return Ok(content_dir);
        }
        return Err(SolaceError::InvalidInput(format!(
            "content directory override {} does not contain {}",
            content_dir.display(),
            COMFORT_DATA_FILENAME
        )));
    }

    let cwd_relative = PathBuf::from(DEFAULT_CONTENT_DIR);
    if looks_like_content_dir(&cwd_relative) {
        return Ok(cwd_relative);
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    for ancestor in manifest_dir.ancestors() {
        let candidate = ancestor.join(DEFAULT_CONTENT_DIR);
        if looks_like_content_dir(&candidate) {
            return Ok(candidate);
        }
    }

    Err(SolaceError::InvalidInput(format!(
        "could not locate a {}/ directory containing {}",
        DEFAULT_CONTENT_DIR, COMFORT_DATA_FILENAME
    )))
}
