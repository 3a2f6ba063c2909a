//! Constants used throughout the Solace core crate.
//!
//! File names and defaults live here so the loaders, the CLI and the runner agree on them.

/// Default directory holding the static content files.
pub const DEFAULT_CONTENT_DIR: &str = "data";

/// Default location of the stored user preferences.
pub const DEFAULT_PREFERENCES_FILE: &str = "preferences.yaml";

/// Filename of the comfort questionnaire content.
pub const COMFORT_DATA_FILENAME: &str = "comfort-verses.json";

/// Filename of the Bible book index.
pub const BIBLE_INDEX_FILENAME: &str = "bible.json";

/// Directory containing one plain-text file per chapter.
pub const CHAPTER_TEXT_DIR: &str = "biblerhv";

/// Filename of the memorization collections.
pub const COLLECTIONS_FILENAME: &str = "all_passages.json";

/// Filename of the theme catalog.
pub const THEMES_FILENAME: &str = "themes.json";

/// Directory containing recital audio, one folder per collection.
pub const AUDIO_DIR: &str = "audio";

/// Tag used to pad results when too few verses match.
pub const DEFAULT_TAG: &str = "comfort";

/// Key of the encouragement message used when no tag-specific message exists.
pub const DEFAULT_MESSAGE_KEY: &str = "default";

/// Number of top-scored verses eligible for random selection.
pub const DEFAULT_CANDIDATE_POOL_SIZE: usize = 10;

/// Number of verses shown to the user.
pub const DEFAULT_OUTPUT_SIZE: usize = 5;

/// Pool and output size of the compact variant.
pub const COMPACT_POOL_SIZE: usize = 4;

/// Number of tags summarised on the result screen.
pub const DISPLAYED_TAG_COUNT: usize = 3;

/// Built-in encouragement used when the content has neither a keyed nor a default message.
pub const FALLBACK_MESSAGE: &str =
    "You did well today. God knows everything you carry and is always with you.";

/// Closing line paired with [`FALLBACK_MESSAGE`].
pub const FALLBACK_CLOSING: &str = "Have a peaceful night";

/// Collection selected for a fresh install.
pub const DEFAULT_COLLECTION: &str = "awana-recital";
