//! # Solace Core
//!
//! Core logic for the Solace comfort and scripture companion.
//!
//! This crate contains pure data operations over bundled content:
//! - The branching questionnaire session that collects tags from the user's answers
//! - The recommendation engine that scores verses against those tags
//! - Bible reading, memorization collections and theme lists
//! - Preference persistence
//!
//! **No front-end concerns**: terminal input, audio output and speech belong in the binaries.

pub mod bible;
pub mod config;
pub mod constants;
pub mod content;
pub mod engine;
pub mod error;
pub mod flow;
pub mod preferences;
pub mod recital;
pub mod themes;
pub mod validation;

pub use solace_types::{NonEmptyText, Tag, TextError};

pub use config::CoreConfig;
pub use content::{ComfortContent, ContentGate, ContentSource, JsonFileSource};
pub use engine::{Recommendation, ScoringConfig};
pub use error::{SolaceError, SolaceResult};
pub use flow::{ComfortSession, FlowState, Transition};
pub use preferences::Preferences;
