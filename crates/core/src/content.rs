//! Static content for the comfort questionnaire.
//!
//! Content is a single JSON document loaded once per process and then shared read-only:
//!
//! ```text
//! {
//!   "questions": [ { "id": 1, "question": "...", "options": [ ... ] } ],
//!   "flow": [ { "fixed": {..} }, { "by_category": { "negative": {..} } } ],   // optional
//!   "verses": [ { "id": 1, "reference": "Psalm 23:1", "text": "...", "tags": ["peace"] } ],
//!   "tagDescriptions": { "peace": "Peace" },
//!   "encouragementMessages": { "default": { "message": "...", "closing": "..." } }
//! }
//! ```
//!
//! When `flow` is present it defines the branching question sequence; otherwise every entry of
//! `questions` becomes a fixed step in order.

use crate::constants::{
    COMFORT_DATA_FILENAME, DEFAULT_MESSAGE_KEY, FALLBACK_CLOSING, FALLBACK_MESSAGE,
};
use crate::{NonEmptyText, SolaceError, SolaceResult, Tag};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ============================================================================
// DATA MODEL
// ============================================================================

/// Coarse mood of an answer, used only to pick branch questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Positive,
    Negative,
    Neutral,
}

impl Category {
    /// Key used for this category in branch tables.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Positive => "positive",
            Category::Negative => "negative",
            Category::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selectable answer to a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    pub text: NonEmptyText,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Finer-grained emotion label, also accepted as `type`.
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    #[serde(rename = "question")]
    pub prompt: NonEmptyText,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub options: Vec<AnswerOption>,
}

impl Question {
    /// Looks up an offered option by id.
    pub fn option(&self, option_id: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

/// A verse as used by the recommendation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verse {
    pub id: u32,
    pub reference: NonEmptyText,
    pub text: NonEmptyText,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Verse {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.as_str() == tag)
    }
}

/// Message shown under the recommended verses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encouragement {
    pub message: String,
    pub closing: String,
}

/// A step of the question sequence.
///
/// Branch tables are keyed by the category or emotion label recorded earlier in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStep {
    Fixed(Question),
    ByCategory(BTreeMap<String, Question>),
    ByEmotion(BTreeMap<String, Question>),
}

impl FlowStep {
    /// Picks the question for this step, or `None` when the branch table has no entry for the
    /// recorded key.
    pub fn resolve(&self, category: Option<Category>, emotion: Option<&str>) -> Option<&Question> {
        match self {
            FlowStep::Fixed(question) => Some(question),
            FlowStep::ByCategory(table) => category.and_then(|c| table.get(c.as_str())),
            FlowStep::ByEmotion(table) => emotion.and_then(|e| table.get(e)),
        }
    }

    fn questions(&self) -> Vec<&Question> {
        match self {
            FlowStep::Fixed(question) => vec![question],
            FlowStep::ByCategory(table) | FlowStep::ByEmotion(table) => table.values().collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawComfortContent {
    #[serde(default)]
    questions: Vec<Question>,
    #[serde(default)]
    flow: Option<Vec<FlowStep>>,
    #[serde(default)]
    verses: Vec<Verse>,
    #[serde(default)]
    tag_descriptions: BTreeMap<String, String>,
    #[serde(default)]
    encouragement_messages: BTreeMap<String, Encouragement>,
}

/// Validated questionnaire content.
#[derive(Debug, Clone, PartialEq)]
pub struct ComfortContent {
    steps: Vec<FlowStep>,
    verses: Vec<Verse>,
    tag_descriptions: BTreeMap<String, String>,
    encouragement_messages: BTreeMap<String, Encouragement>,
}

impl ComfortContent {
    /// Builds content from already-parsed parts.
    ///
    /// # Errors
    ///
    /// Returns `SolaceError::InvalidInput` if there are no steps, a question offers no options,
    /// option ids repeat within a question, or verse ids repeat.
    pub fn new(
        steps: Vec<FlowStep>,
        verses: Vec<Verse>,
        tag_descriptions: BTreeMap<String, String>,
        encouragement_messages: BTreeMap<String, Encouragement>,
    ) -> SolaceResult<Self> {
        if steps.is_empty() {
            return Err(SolaceError::InvalidInput(
                "content defines no questions".into(),
            ));
        }

        for (index, step) in steps.iter().enumerate() {
            let questions = step.questions();
            if questions.is_empty() {
                return Err(SolaceError::InvalidInput(format!(
                    "step {} has an empty branch table",
                    index
                )));
            }
            for question in questions {
                if question.options.is_empty() {
                    return Err(SolaceError::InvalidInput(format!(
                        "question {} has no options",
                        question.id
                    )));
                }
                let mut seen = HashSet::new();
                for option in &question.options {
                    if !seen.insert(option.id.as_str()) {
                        return Err(SolaceError::InvalidInput(format!(
                            "question {} repeats option id {:?}",
                            question.id, option.id
                        )));
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        for verse in &verses {
            if !seen.insert(verse.id) {
                return Err(SolaceError::InvalidInput(format!(
                    "verse id {} appears more than once",
                    verse.id
                )));
            }
        }

        Ok(Self {
            steps,
            verses,
            tag_descriptions,
            encouragement_messages,
        })
    }

    /// Parses and validates content from a JSON document.
    pub fn from_json_str(json: &str) -> SolaceResult<Self> {
        let raw: RawComfortContent =
            serde_json::from_str(json).map_err(SolaceError::Deserialization)?;

        let steps = match raw.flow {
            Some(flow) => flow,
            None => raw.questions.into_iter().map(FlowStep::Fixed).collect(),
        };

        Self::new(
            steps,
            raw.verses,
            raw.tag_descriptions,
            raw.encouragement_messages,
        )
    }

    pub fn steps(&self) -> &[FlowStep] {
        &self.steps
    }

    pub fn verses(&self) -> &[Verse] {
        &self.verses
    }

    /// Human-readable label for a tag, falling back to the tag itself.
    pub fn describe_tag<'a>(&'a self, tag: &'a Tag) -> &'a str {
        self.tag_descriptions
            .get(tag.as_str())
            .map(String::as_str)
            .unwrap_or(tag.as_str())
    }

    /// Encouragement for the given primary tag.
    ///
    /// Falls back to the `default` entry and then to a built-in message, so this never fails.
    pub fn encouragement_for(&self, primary_tag: Option<&Tag>) -> Encouragement {
        primary_tag
            .and_then(|tag| self.encouragement_messages.get(tag.as_str()))
            .or_else(|| self.encouragement_messages.get(DEFAULT_MESSAGE_KEY))
            .cloned()
            .unwrap_or_else(|| Encouragement {
                message: FALLBACK_MESSAGE.to_owned(),
                closing: FALLBACK_CLOSING.to_owned(),
            })
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Reads and deserialises a JSON file.
pub(crate) fn read_json_file<T: DeserializeOwned>(path: &Path) -> SolaceResult<T> {
    let raw = std::fs::read_to_string(path).map_err(|source| SolaceError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(SolaceError::Deserialization)
}

/// Anything that can produce questionnaire content.
pub trait ContentSource {
    fn load(&self) -> SolaceResult<ComfortContent>;
}

/// Loads content from a JSON file on disk.
#[derive(Clone, Debug)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Source for the standard content file inside `content_dir`.
    pub fn in_dir(content_dir: &Path) -> Self {
        Self::new(content_dir.join(COMFORT_DATA_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ContentSource for JsonFileSource {
    fn load(&self) -> SolaceResult<ComfortContent> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| SolaceError::FileRead {
            path: self.path.clone(),
            source,
        })?;
        let content = ComfortContent::from_json_str(&raw)?;
        tracing::info!(
            "loaded comfort content from {}: {} steps, {} verses",
            self.path.display(),
            content.steps().len(),
            content.verses().len()
        );
        Ok(content)
    }
}

/// Availability of the content the engine depends on.
#[derive(Clone, Debug, Default)]
pub enum ContentGate {
    #[default]
    Pending,
    Ready(Arc<ComfortContent>),
}

impl ContentGate {
    /// Loads content once; later calls return the already-loaded content.
    pub fn load_from(&mut self, source: &dyn ContentSource) -> SolaceResult<Arc<ComfortContent>> {
        if let ContentGate::Ready(content) = self {
            return Ok(Arc::clone(content));
        }
        let content = Arc::new(source.load()?);
        *self = ContentGate::Ready(Arc::clone(&content));
        Ok(content)
    }

    /// Returns the content, or `SolaceError::DataNotReady` while it is still pending.
    pub fn ready(&self) -> SolaceResult<Arc<ComfortContent>> {
        match self {
            ContentGate::Ready(content) => Ok(Arc::clone(content)),
            ContentGate::Pending => Err(SolaceError::DataNotReady),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn tag(s: &str) -> Tag {
        Tag::new(s).unwrap()
    }

    pub fn verse(id: u32, tags: &[&str]) -> Verse {
        Verse {
            id,
            reference: NonEmptyText::new(format!("Ref {}", id)).unwrap(),
            text: NonEmptyText::new(format!("Verse text {}", id)).unwrap(),
            tags: tags.iter().map(|t| tag(t)).collect(),
        }
    }

    pub fn option(id: &str, tags: &[&str], category: Option<Category>) -> AnswerOption {
        AnswerOption {
            id: id.to_owned(),
            text: NonEmptyText::new(format!("Option {}", id)).unwrap(),
            tags: tags.iter().map(|t| tag(t)).collect(),
            category,
            emotion: None,
        }
    }

    pub fn question(id: u32, options: Vec<AnswerOption>) -> Question {
        Question {
            id,
            prompt: NonEmptyText::new(format!("Question {}", id)).unwrap(),
            kind: None,
            options,
        }
    }
}
