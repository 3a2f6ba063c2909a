//! Themed reading lists.

use crate::constants::THEMES_FILENAME;
use crate::content::read_json_file;
use crate::{SolaceError, SolaceResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeChapter {
    pub book: u32,
    pub chapter: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    /// Book ids belonging to the theme.
    #[serde(default)]
    pub books: Vec<u32>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chapters: Vec<ThemeChapter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl Theme {
    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self
                .keywords
                .iter()
                .any(|k| k.to_lowercase().contains(needle))
    }
}

#[derive(Deserialize)]
struct RawThemes {
    themes: Vec<Theme>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeCatalog {
    themes: Vec<Theme>,
}

impl ThemeCatalog {
    pub fn load(content_dir: &Path) -> SolaceResult<Self> {
        let raw: RawThemes = read_json_file(&content_dir.join(THEMES_FILENAME))?;
        tracing::info!("loaded {} themes", raw.themes.len());
        Ok(Self::from_themes(raw.themes))
    }

    pub fn from_themes(themes: Vec<Theme>) -> Self {
        Self { themes }
    }

    pub fn themes(&self) -> &[Theme] {
        &self.themes
    }

    pub fn find(&self, theme_id: &str) -> SolaceResult<&Theme> {
        self.themes
            .iter()
            .find(|t| t.id == theme_id)
            .ok_or_else(|| SolaceError::NotFound {
                kind: "theme",
                id: theme_id.to_owned(),
            })
    }

    /// Case-insensitive search over name, description and keywords. A blank keyword matches all.
    pub fn search(&self, keyword: &str) -> Vec<&Theme> {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return self.themes.iter().collect();
        }
        self.themes.iter().filter(|t| t.matches(&needle)).collect()
    }
}
