//! Bible reader helpers.
//!
//! The book index is a JSON file listing each testament's books and chapter counts. Chapter text
//! is stored one file per chapter, one verse per line:
//!
//! ```text
//! <content_dir>/biblerhv/<book-id>-<chapter>.txt
//! ```

use crate::constants::{BIBLE_INDEX_FILENAME, CHAPTER_TEXT_DIR};
use crate::content::read_json_file;
use crate::validation::validate_ordinal;
use crate::{NonEmptyText, SolaceError, SolaceResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: u32,
    pub name: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english: Option<String>,
    pub chapters: u32,
}

#[derive(Deserialize)]
struct RawTestaments {
    #[serde(alias = "구약", default)]
    old_testament: Vec<Book>,
    #[serde(alias = "신약", default)]
    new_testament: Vec<Book>,
}

#[derive(Deserialize)]
struct RawBibleIndex {
    #[serde(alias = "성경")]
    bible: RawTestaments,
}

/// Books of both testaments in canonical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibleIndex {
    old_testament: Vec<Book>,
    new_testament: Vec<Book>,
}

impl BibleIndex {
    /// Loads `bible.json` from the content directory.
    pub fn load(content_dir: &Path) -> SolaceResult<Self> {
        let raw: RawBibleIndex = read_json_file(&content_dir.join(BIBLE_INDEX_FILENAME))?;
        let index = Self {
            old_testament: raw.bible.old_testament,
            new_testament: raw.bible.new_testament,
        };
        tracing::info!(
            "loaded bible index: {} old testament, {} new testament books",
            index.old_testament.len(),
            index.new_testament.len()
        );
        Ok(index)
    }

    pub fn old_testament(&self) -> &[Book] {
        &self.old_testament
    }

    pub fn new_testament(&self) -> &[Book] {
        &self.new_testament
    }

    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.old_testament.iter().chain(self.new_testament.iter())
    }

    pub fn find(&self, book_id: u32) -> SolaceResult<&Book> {
        self.books()
            .find(|b| b.id == book_id)
            .ok_or_else(|| SolaceError::NotFound {
                kind: "book",
                id: book_id.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterVerse {
    pub number: u32,
    pub content: String,
}

/// Splits chapter text into verses: every non-blank line is one verse, numbered from 1.
pub fn parse_chapter_text(text: &str) -> Vec<ChapterVerse> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .zip(1..)
        .map(|(line, number)| ChapterVerse {
            number,
            content: line.to_owned(),
        })
        .collect()
}

pub fn chapter_path(content_dir: &Path, book_id: u32, chapter: u32) -> PathBuf {
    content_dir
        .join(CHAPTER_TEXT_DIR)
        .join(format!("{}-{}.txt", book_id, chapter))
}

/// Reads and parses one chapter of `book`.
///
/// # Errors
///
/// Returns `SolaceError::InvalidInput` if `chapter` is outside the book, and
/// `SolaceError::FileRead` if the chapter file is missing.
pub fn load_chapter(
    content_dir: &Path,
    book: &Book,
    chapter: u32,
) -> SolaceResult<Vec<ChapterVerse>> {
    validate_ordinal(chapter, book.chapters, "chapter")?;
    let path = chapter_path(content_dir, book.id, chapter);
    let text = std::fs::read_to_string(&path).map_err(|source| SolaceError::FileRead {
        path: path.clone(),
        source,
    })?;
    Ok(parse_chapter_text(&text))
}

/// Position within a book for previous/next chapter navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterCursor {
    book: Book,
    chapter: u32,
}

impl ChapterCursor {
    pub fn new(book: Book, chapter: u32) -> SolaceResult<Self> {
        validate_ordinal(chapter, book.chapters, "chapter")?;
        Ok(Self { book, chapter })
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn chapter(&self) -> u32 {
        self.chapter
    }

    /// Moves to the previous chapter; returns `false` at the first chapter.
    pub fn previous(&mut self) -> bool {
        if self.chapter > 1 {
            self.chapter -= 1;
            true
        } else {
            false
        }
    }

    /// Moves to the next chapter; returns `false` at the last chapter.
    pub fn next(&mut self) -> bool {
        if self.chapter < self.book.chapters {
            self.chapter += 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn jonah() -> Book {
        Book {
            id: 32,
            name: NonEmptyText::new("요나").unwrap(),
            english: Some("Jonah".into()),
            chapters: 4,
        }
    }

    #[test]
    fn parse_skips_blank_lines_and_numbers_from_one() {
        let text = "  In the beginning  \n\n\r\nAnd the earth\n   \nLet there be light\n";
        let verses = parse_chapter_text(text);
        assert_eq!(verses.len(), 3);
        assert_eq!(verses[0].number, 1);
        assert_eq!(verses[0].content, "In the beginning");
        assert_eq!(verses[2].number, 3);
        assert_eq!(verses[2].content, "Let there be light");
    }

    #[test]
    fn index_accepts_korean_keys() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(
            temp_dir.path().join(BIBLE_INDEX_FILENAME),
            r#"{ "성경": {
                "구약": [ { "id": 1, "name": "창세기", "chapters": 50 } ],
                "신약": [ { "id": 40, "name": "마태복음", "english": "Matthew", "chapters": 28 } ]
            } }"#,
        )
        .expect("should write index");

        let index = BibleIndex::load(temp_dir.path()).unwrap();
        assert_eq!(index.old_testament().len(), 1);
        assert_eq!(index.find(40).unwrap().english.as_deref(), Some("Matthew"));
        assert_eq!(index.books().count(), 2);
        assert!(matches!(
            index.find(99),
            Err(SolaceError::NotFound { kind: "book", .. })
        ));
    }

    #[test]
    fn load_chapter_reads_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = chapter_path(temp_dir.path(), 32, 2);
        fs::create_dir_all(path.parent().unwrap()).expect("should create dir");
        fs::write(&path, "first\nsecond\n").expect("should write chapter");

        let verses = load_chapter(temp_dir.path(), &jonah(), 2).unwrap();
        assert_eq!(verses.len(), 2);
        assert!(path.ends_with("biblerhv/32-2.txt"));
    }

    #[test]
    fn load_chapter_rejects_out_of_range_and_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        assert!(matches!(
            load_chapter(temp_dir.path(), &jonah(), 5),
            Err(SolaceError::InvalidInput(_))
        ));
        assert!(matches!(
            load_chapter(temp_dir.path(), &jonah(), 1),
            Err(SolaceError::FileRead { .. })
        ));
    }

    #[test]
    fn cursor_stays_within_book() {
        let mut cursor = ChapterCursor::new(jonah(), 1).unwrap();
        assert!(!cursor.previous());
        assert!(cursor.next());
        assert!(cursor.next());
        assert!(cursor.next());
        assert_eq!(cursor.chapter(), 4);
        assert!(!cursor.next());
        assert!(cursor.previous());
        assert_eq!(cursor.chapter(), 3);
        assert!(ChapterCursor::new(jonah(), 0).is_err());
    }
}
