//! Input validation utilities.
//!
//! Identifiers from content files and the command line end up inside relative paths (audio
//! folders, chapter files). They are checked here before any path is built.

use crate::{SolaceError, SolaceResult};

/// Validates that an identifier is safe to embed as a single path segment.
///
/// - Rejects empty or whitespace-only strings
/// - Bounds the length to avoid pathological inputs
/// - Restricts characters to ASCII alphanumerics, `-` and `_`, which rules out `..` and
///   separators
///
/// # Errors
///
/// Returns `SolaceError::InvalidInput` naming `what` if the identifier is invalid.
pub fn validate_path_segment(value: &str, what: &str) -> SolaceResult<()> {
    const MAX_SEGMENT_LEN: usize = 64;

    if value.trim().is_empty() {
        return Err(SolaceError::InvalidInput(format!("{} cannot be empty", what)));
    }

    if value.len() > MAX_SEGMENT_LEN {
        return Err(SolaceError::InvalidInput(format!(
            "{} exceeds maximum length of {} characters",
            what, MAX_SEGMENT_LEN
        )));
    }

    let ok = value
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'-' | b'_'));

    if !ok {
        return Err(SolaceError::InvalidInput(format!(
            "{} contains invalid characters (only alphanumeric, '-', '_' allowed)",
            what
        )));
    }

    Ok(())
}

/// Validates a one-based chapter or verse number against an upper bound.
pub fn validate_ordinal(value: u32, max: u32, what: &str) -> SolaceResult<()> {
    if value == 0 || value > max {
        return Err(SolaceError::InvalidInput(format!(
            "{} {} is outside 1..={}",
            what, value, max
        )));
    }
    Ok(())
}
