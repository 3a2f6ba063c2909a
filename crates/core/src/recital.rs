//! Memorization collections and recital playback bookkeeping.
//!
//! Audio playback itself belongs to the device layer; this module resolves which file to play
//! and counts repeats.

use crate::constants::{AUDIO_DIR, COLLECTIONS_FILENAME, DEFAULT_COLLECTION};
use crate::content::read_json_file;
use crate::preferences::Preferences;
use crate::validation::validate_path_segment;
use crate::{SolaceError, SolaceResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Collections that ship their own audio folder. Everything else uses the default recital audio.
const COLLECTIONS_WITH_OWN_AUDIO: [&str; 2] = ["wheel-of-gospel", "special-recital"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecitalBook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapters: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecitalVerse {
    pub verse: u32,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english: Option<String>,
}

/// A passage to memorize. `id` is the book id used in audio file names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub book: RecitalBook,
    pub chapter: u32,
    pub verses: Vec<RecitalVerse>,
}

impl Passage {
    /// Key distinguishing repeated passages within one collection.
    pub fn unique_key(&self, index: usize) -> String {
        format!("{}-{}-{}", self.id, self.chapter, index)
    }

    /// Display reference, built from book and chapter when the content has none.
    pub fn display_reference(&self) -> String {
        match &self.reference {
            Some(reference) => reference.clone(),
            None => format!("{} {}", self.book.name, self.chapter),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num: Option<u32>,
    pub name: String,
    pub passages: Vec<Passage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    items: Vec<Collection>,
}

impl Collections {
    /// Loads `all_passages.json`, rejecting collection ids that cannot name an audio folder.
    pub fn load(content_dir: &Path) -> SolaceResult<Self> {
        let items: Vec<Collection> = read_json_file(&content_dir.join(COLLECTIONS_FILENAME))?;
        for collection in &items {
            validate_path_segment(&collection.id, "collection id")?;
        }
        tracing::info!("loaded {} recital collections", items.len());
        Ok(Self { items })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Collection> {
        self.items.iter()
    }

    pub fn find(&self, collection_id: &str) -> SolaceResult<&Collection> {
        self.items
            .iter()
            .find(|c| c.id == collection_id)
            .ok_or_else(|| SolaceError::NotFound {
                kind: "collection",
                id: collection_id.to_owned(),
            })
    }

    /// The collection selected in the preferences, or the first one if it no longer exists.
    pub fn current(&self, prefs: &Preferences) -> Option<&Collection> {
        self.find(&prefs.current_collection)
            .ok()
            .or_else(|| self.items.first())
    }
}

/// Audio folder for a collection.
pub fn audio_folder(collection_id: &str) -> &str {
    COLLECTIONS_WITH_OWN_AUDIO
        .iter()
        .find(|&&id| id == collection_id)
        .copied()
        .unwrap_or(DEFAULT_COLLECTION)
}

/// Relative path of the recording for one verse of a passage.
///
/// # Errors
///
/// Returns `SolaceError::NotFound` if the passage does not contain `verse`.
pub fn audio_path(collection_id: &str, passage: &Passage, verse: u32) -> SolaceResult<PathBuf> {
    if !passage.verses.iter().any(|v| v.verse == verse) {
        return Err(SolaceError::NotFound {
            kind: "verse",
            id: format!("{}:{}", passage.display_reference(), verse),
        });
    }

    Ok(PathBuf::from(AUDIO_DIR)
        .join(audio_folder(collection_id))
        .join(format!("{}-{}-{}.mp3", passage.id, passage.chapter, verse)))
}

/// What the player should do when a recording ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// Rewind and play again; `repeat` is the zero-based repeat now starting.
    Replay { repeat: u32 },
    Done,
}

/// Counts back-to-back plays of one recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatCounter {
    repeat_count: u32,
    current: u32,
    playing: bool,
}

impl RepeatCounter {
    pub fn new(repeat_count: u32) -> Self {
        Self {
            repeat_count: repeat_count.max(1),
            current: 0,
            playing: false,
        }
    }

    /// Plays once when repeat mode is off.
    pub fn from_preferences(prefs: &Preferences) -> Self {
        if prefs.repeat_mode {
            Self::new(prefs.repeat_count)
        } else {
            Self::new(1)
        }
    }

    pub fn start(&mut self) {
        self.current = 0;
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.current = 0;
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn current_repeat(&self) -> u32 {
        self.current
    }

    /// Called when a recording finishes.
    pub fn on_ended(&mut self) -> Playback {
        if !self.playing {
            return Playback::Done;
        }
        let next = self.current + 1;
        if next < self.repeat_count {
            self.current = next;
            Playback::Replay { repeat: next }
        } else {
            self.stop();
            Playback::Done
        }
    }

    /// Progress label such as `2/3`.
    pub fn label(&self) -> String {
        format!("{}/{}", self.current + 1, self.repeat_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PASSAGES: &str = r#"[
        { "id": "awana-recital", "num": 1, "name": "Awana", "passages": [
            { "id": 43, "reference": "John 3:16", "book": { "name": "요한복음" }, "chapter": 3,
              "verses": [ { "verse": 16, "content": "For God so loved the world" } ] }
        ] },
        { "id": "wheel-of-gospel", "name": "Wheel", "passages": [
            { "id": 45, "book": { "name": "로마서" }, "chapter": 3,
              "verses": [ { "verse": 23, "content": "All have sinned" } ] }
        ] }
    ]"#;

    fn load() -> Collections {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join(COLLECTIONS_FILENAME), PASSAGES).expect("should write");
        Collections::load(temp_dir.path()).unwrap()
    }

    #[test]
    fn audio_path_uses_collection_folder() {
        let collections = load();
        let wheel = collections.find("wheel-of-gospel").unwrap();
        let path = audio_path(&wheel.id, &wheel.passages[0], 23).unwrap();
        assert_eq!(path, PathBuf::from("audio/wheel-of-gospel/45-3-23.mp3"));

        let awana = collections.find("awana-recital").unwrap();
        let path = audio_path("something-else", &awana.passages[0], 16).unwrap();
        assert_eq!(path, PathBuf::from("audio/awana-recital/43-3-16.mp3"));
    }

    #[test]
    fn audio_path_rejects_verse_outside_passage() {
        let collections = load();
        let awana = collections.find("awana-recital").unwrap();
        assert!(matches!(
            audio_path(&awana.id, &awana.passages[0], 17),
            Err(SolaceError::NotFound { kind: "verse", .. })
        ));
    }

    #[test]
    fn current_collection_falls_back_to_first() {
        let collections = load();
        let prefs = Preferences {
            current_collection: "retired".into(),
            ..Preferences::default()
        };
        assert_eq!(collections.current(&prefs).unwrap().id, "awana-recital");

        let prefs = Preferences {
            current_collection: "wheel-of-gospel".into(),
            ..Preferences::default()
        };
        assert_eq!(collections.current(&prefs).unwrap().id, "wheel-of-gospel");
    }

    #[test]
    fn rejects_unsafe_collection_id() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(
            temp_dir.path().join(COLLECTIONS_FILENAME),
            r#"[ { "id": "../up", "name": "Bad", "passages": [] } ]"#,
        )
        .expect("should write");
        assert!(matches!(
            Collections::load(temp_dir.path()),
            Err(SolaceError::InvalidInput(_))
        ));
    }

    #[test]
    fn passage_keys_and_references() {
        let collections = load();
        let wheel = collections.find("wheel-of-gospel").unwrap();
        assert_eq!(wheel.passages[0].unique_key(2), "45-3-2");
        assert_eq!(wheel.passages[0].display_reference(), "로마서 3");
    }

    #[test]
    fn repeat_counter_replays_until_count() {
        let mut counter = RepeatCounter::new(3);
        counter.start();
        assert_eq!(counter.label(), "1/3");
        assert_eq!(counter.on_ended(), Playback::Replay { repeat: 1 });
        assert_eq!(counter.on_ended(), Playback::Replay { repeat: 2 });
        assert_eq!(counter.label(), "3/3");
        assert_eq!(counter.on_ended(), Playback::Done);
        assert!(!counter.is_playing());
        assert_eq!(counter.current_repeat(), 0);
    }

    #[test]
    fn repeat_mode_off_plays_once() {
        let prefs = Preferences {
            repeat_mode: false,
            repeat_count: 5,
            ..Preferences::default()
        };
        let mut counter = RepeatCounter::from_preferences(&prefs);
        counter.start();
        assert_eq!(counter.on_ended(), Playback::Done);
    }

    #[test]
    fn stop_resets_progress() {
        let mut counter = RepeatCounter::new(4);
        counter.start();
        counter.on_ended();
        counter.stop();
        assert_eq!(counter.current_repeat(), 0);
        assert_eq!(counter.on_ended(), Playback::Done);
    }
}
