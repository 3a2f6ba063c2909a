use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use solace_core::{
    bible::{load_chapter, BibleIndex},
    config::{resolve_content_dir, scoring_from_values},
    constants::{DEFAULT_PREFERENCES_FILE, DISPLAYED_TAG_COUNT},
    engine,
    recital::{audio_path, Collections},
    themes::ThemeCatalog,
    ContentSource, JsonFileSource, Preferences, SolaceError, Tag,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "solace")]
#[command(about = "Solace comfort verses and scripture CLI")]
struct Cli {
    /// Directory containing the bundled content files
    #[arg(long, global = true, env = "SOLACE_CONTENT_DIR")]
    content_dir: Option<PathBuf>,
    /// Preferences file
    #[arg(
        long,
        global = true,
        env = "SOLACE_PREFERENCES",
        default_value = DEFAULT_PREFERENCES_FILE
    )]
    preferences: PathBuf,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend verses for a set of tags
    Recommend {
        /// Tags (comma-separated, repeats raise a tag's rank)
        tags: String,
        /// Seed for a reproducible selection
        #[arg(long)]
        seed: Option<u64>,
        /// Use the four-verse variant
        #[arg(long)]
        compact: bool,
    },
    /// List the books of the Bible
    Books,
    /// Print one chapter
    Chapter {
        /// Book id
        book: u32,
        /// Chapter number
        chapter: u32,
    },
    /// List memorization collections
    Collections,
    /// Print the audio file for a recital verse
    Audio {
        /// Collection id
        collection: String,
        /// Passage index within the collection (as listed by `collections`)
        passage: usize,
        /// Verse number
        verse: u32,
    },
    /// List or search reading themes
    Themes {
        /// Keyword matched against name, description and keywords
        #[arg(long)]
        search: Option<String>,
    },
    /// Show or update preferences
    Prefs {
        #[arg(long)]
        font_size: Option<u32>,
        #[arg(long)]
        repeat_count: Option<u32>,
        #[arg(long)]
        dark_mode: Option<bool>,
        /// Current memorization collection
        #[arg(long)]
        collection: Option<String>,
    },
}

fn parse_tags(raw: &str) -> Result<Vec<Tag>, SolaceError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Tag::new(s).map_err(SolaceError::from))
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'solace --help' for commands");
        return Ok(());
    };

    let content_dir = || resolve_content_dir(cli.content_dir.clone());

    match command {
        Commands::Recommend {
            tags,
            seed,
            compact,
        } => {
            let tags = parse_tags(&tags)?;
            let content = JsonFileSource::in_dir(&content_dir()?).load()?;
            let scoring = scoring_from_values(compact, None)?;
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };

            let result = engine::score(&tags, content.verses(), &scoring, &mut rng);
            let described: Vec<&str> = result
                .top_tags(DISPLAYED_TAG_COUNT)
                .iter()
                .map(|t| content.describe_tag(t))
                .collect();
            println!("Feelings: {}", described.join(", "));
            println!();
            if result.is_empty() {
                println!("No verses found.");
            }
            for verse in result.verses() {
                println!("{}\n  {}", verse.reference, verse.text);
            }
            let encouragement = content.encouragement_for(result.primary_tag());
            println!();
            println!("{}\n{}", encouragement.message, encouragement.closing);
        }
        Commands::Books => {
            let index = BibleIndex::load(&content_dir()?)?;
            for book in index.books() {
                match &book.english {
                    Some(english) => println!(
                        "{:>3}  {} ({}), {} chapters",
                        book.id, book.name, english, book.chapters
                    ),
                    None => println!("{:>3}  {}, {} chapters", book.id, book.name, book.chapters),
                }
            }
        }
        Commands::Chapter { book, chapter } => {
            let content_dir = content_dir()?;
            let index = BibleIndex::load(&content_dir)?;
            let book = index.find(book)?;
            println!("{} {}", book.name, chapter);
            for verse in load_chapter(&content_dir, book, chapter)? {
                println!("{:>3} {}", verse.number, verse.content);
            }
        }
        Commands::Collections => {
            let collections = Collections::load(&content_dir()?)?;
            for collection in collections.iter() {
                println!("{} ({})", collection.name, collection.id);
                for (i, passage) in collection.passages.iter().enumerate() {
                    println!(
                        "  [{}] {} ({} verses)",
                        i,
                        passage.display_reference(),
                        passage.verses.len()
                    );
                }
            }
        }
        Commands::Audio {
            collection,
            passage,
            verse,
        } => {
            let content_dir = content_dir()?;
            let collections = Collections::load(&content_dir)?;
            let collection = collections.find(&collection)?;
            let passage = collection.passages.get(passage).ok_or(SolaceError::NotFound {
                kind: "passage",
                id: passage.to_string(),
            })?;
            let path = audio_path(&collection.id, passage, verse)?;
            println!("{}", content_dir.join(path).display());
        }
        Commands::Themes { search } => {
            let catalog = ThemeCatalog::load(&content_dir()?)?;
            let themes = match search.as_deref() {
                Some(keyword) => catalog.search(keyword),
                None => catalog.themes().iter().collect(),
            };
            if themes.is_empty() {
                println!("No themes found.");
            }
            for theme in themes {
                println!("{} ({}): {}", theme.name, theme.id, theme.description);
            }
        }
        Commands::Prefs {
            font_size,
            repeat_count,
            dark_mode,
            collection,
        } => {
            let mut prefs = Preferences::load(&cli.preferences)?;
            let changed = font_size.is_some()
                || repeat_count.is_some()
                || dark_mode.is_some()
                || collection.is_some();
            if let Some(font_size) = font_size {
                prefs.font_size = font_size;
            }
            if let Some(repeat_count) = repeat_count {
                prefs.repeat_count = repeat_count;
            }
            if let Some(dark_mode) = dark_mode {
                prefs.dark_mode = dark_mode;
            }
            if let Some(collection) = collection {
                prefs.current_collection = collection;
            }
            if changed {
                prefs.save(&cli.preferences)?;
                println!("Saved preferences to {}", cli.preferences.display());
            }
            println!(
                "font size: {}\nrepeat: {} (x{})\ndark mode: {}\ncollection: {}",
                prefs.font_size,
                if prefs.repeat_mode { "on" } else { "off" },
                prefs.repeat_count,
                prefs.dark_mode,
                prefs.current_collection
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tags_skips_blanks_and_keeps_repeats() {
        let tags = parse_tags("sorrow, ,comfort,sorrow").unwrap();
        let names: Vec<&str> = tags.iter().map(Tag::as_str).collect();
        assert_eq!(names, vec!["sorrow", "comfort", "sorrow"]);
    }

    #[test]
    fn parse_tags_rejects_inner_whitespace() {
        assert!(parse_tags("deep sorrow").is_err());
    }

    #[test]
    fn cli_parses_recommend() {
        let cli =
            Cli::try_parse_from(["solace", "recommend", "fear,peace", "--seed", "7"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Recommend {
                seed: Some(7),
                compact: false,
                ..
            })
        ));
    }
}
