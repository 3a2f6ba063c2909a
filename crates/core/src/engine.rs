//! Tag-matching recommendation engine.
//!
//! Answers contribute tags; the engine ranks the distinct tags by how often they were chosen and
//! scores every verse by the tags it carries:
//!
//! ```text
//! score(verse) = Σ (distinct_tags - position(tag)) * occurrences(tag)   for tags the verse has
//! ```
//!
//! Verses scoring zero are discarded, the best `candidate_pool_size` form the candidate pool, and
//! a random `output_size` subset of the pool is shown. If the pool is too small the result is
//! padded with verses carrying the default tag.
//!
//! Scoring is deterministic. Only the final draw uses the caller's random source, so the pool can
//! be kept and redrawn with [`reshuffle`] without scoring again.

use crate::constants::{COMPACT_POOL_SIZE, DEFAULT_CANDIDATE_POOL_SIZE, DEFAULT_OUTPUT_SIZE};
use crate::content::Verse;
use crate::{SolaceError, SolaceResult, Tag};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Sizes and fallback tag used when scoring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoringConfig {
    candidate_pool_size: usize,
    output_size: usize,
    default_tag: Tag,
}

impl ScoringConfig {
    /// Creates a scoring configuration.
    ///
    /// # Errors
    ///
    /// Returns `SolaceError::InvalidInput` if either size is zero.
    pub fn new(
        candidate_pool_size: usize,
        output_size: usize,
        default_tag: Tag,
    ) -> SolaceResult<Self> {
        if candidate_pool_size == 0 {
            return Err(SolaceError::InvalidInput(
                "candidate pool size must be at least 1".into(),
            ));
        }
        if output_size == 0 {
            return Err(SolaceError::InvalidInput(
                "output size must be at least 1".into(),
            ));
        }
        Ok(Self {
            candidate_pool_size,
            output_size,
            default_tag,
        })
    }

    /// Pool of 10, five shown.
    pub fn standard(default_tag: Tag) -> Self {
        Self {
            candidate_pool_size: DEFAULT_CANDIDATE_POOL_SIZE,
            output_size: DEFAULT_OUTPUT_SIZE,
            default_tag,
        }
    }

    /// Pool of four, all four shown.
    pub fn compact(default_tag: Tag) -> Self {
        Self {
            candidate_pool_size: COMPACT_POOL_SIZE,
            output_size: COMPACT_POOL_SIZE,
            default_tag,
        }
    }

    pub fn candidate_pool_size(&self) -> usize {
        self.candidate_pool_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    pub fn default_tag(&self) -> &Tag {
        &self.default_tag
    }
}

// ============================================================================
// TAG RANKING
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankedTag {
    pub tag: Tag,
    pub count: usize,
}

/// Distinct tags ordered by descending occurrence count.
///
/// Ties keep the order in which the tags were first seen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagRanking {
    entries: Vec<RankedTag>,
}

impl TagRanking {
    pub fn entries(&self) -> &[RankedTag] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The ordered distinct tags.
    pub fn tags(&self) -> Vec<Tag> {
        self.entries.iter().map(|e| e.tag.clone()).collect()
    }

    /// Occurrence count of a tag, or zero if it was never chosen.
    pub fn count(&self, tag: &str) -> usize {
        self.entries
            .iter()
            .find(|e| e.tag.as_str() == tag)
            .map_or(0, |e| e.count)
    }
}

/// Counts tag occurrences and orders the distinct tags.
pub fn rank_tags(tags: &[Tag]) -> TagRanking {
    let mut entries: Vec<RankedTag> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for tag in tags {
        match positions.get(tag.as_str()) {
            Some(&index) => entries[index].count += 1,
            None => {
                positions.insert(tag.as_str(), entries.len());
                entries.push(RankedTag {
                    tag: tag.clone(),
                    count: 1,
                });
            }
        }
    }

    // Stable sort: equal counts stay in first-seen order.
    entries.sort_by(|a, b| b.count.cmp(&a.count));

    TagRanking { entries }
}

/// Weighted-frequency score of a verse against a ranking.
pub fn score_verse(verse: &Verse, ranking: &TagRanking) -> u64 {
    let distinct = ranking.len();
    ranking
        .entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| verse.has_tag(entry.tag.as_str()))
        .map(|(position, entry)| ((distinct - position) * entry.count) as u64)
        .sum()
}

// ============================================================================
// CANDIDATE POOL
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct ScoredVerse {
    pub verse: Verse,
    pub score: u64,
}

/// Verses eligible for the random draw, plus the default-tagged verses used for padding.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CandidatePool {
    candidates: Vec<ScoredVerse>,
    fallback: Vec<Verse>,
}

impl CandidatePool {
    /// Scores `verses` against `ranking` and keeps the best `config.candidate_pool_size()`.
    ///
    /// Equal scores keep the order of `verses`.
    pub fn build(ranking: &TagRanking, verses: &[Verse], config: &ScoringConfig) -> Self {
        let mut candidates: Vec<ScoredVerse> = verses
            .iter()
            .map(|verse| ScoredVerse {
                score: score_verse(verse, ranking),
                verse: verse.clone(),
            })
            .filter(|scored| scored.score > 0)
            .collect();
        candidates.sort_by(|a, b| b.score.cmp(&a.score));
        candidates.truncate(config.candidate_pool_size);

        let fallback = if candidates.len() < config.output_size {
            let taken: HashSet<u32> = candidates.iter().map(|c| c.verse.id).collect();
            verses
                .iter()
                .filter(|v| v.has_tag(config.default_tag.as_str()) && !taken.contains(&v.id))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        Self {
            candidates,
            fallback,
        }
    }

    /// Candidates in rank order.
    pub fn candidates(&self) -> &[ScoredVerse] {
        &self.candidates
    }

    /// Default-tagged verses available for padding.
    pub fn fallback(&self) -> &[Verse] {
        &self.fallback
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty() && self.fallback.is_empty()
    }

    fn draw<R: Rng + ?Sized>(&self, output_size: usize, rng: &mut R) -> Vec<Verse> {
        let mut picks: Vec<&Verse> = self.candidates.iter().map(|c| &c.verse).collect();
        picks.shuffle(rng);
        picks.truncate(output_size);

        if picks.len() < output_size {
            let chosen: HashSet<u32> = picks.iter().map(|v| v.id).collect();
            let mut padding: Vec<&Verse> = self
                .fallback
                .iter()
                .filter(|v| !chosen.contains(&v.id))
                .collect();
            padding.shuffle(rng);
            let missing = output_size - picks.len();
            picks.extend(padding.into_iter().take(missing));
        }

        picks.into_iter().cloned().collect()
    }
}

// ============================================================================
// RECOMMENDATION
// ============================================================================

/// Result of scoring one questionnaire.
#[derive(Clone, Debug, PartialEq)]
pub struct Recommendation {
    verses: Vec<Verse>,
    ranking: TagRanking,
    display_tags: Vec<Tag>,
    pool: CandidatePool,
}

impl Recommendation {
    /// The drawn verses, at most `output_size` of them.
    pub fn verses(&self) -> &[Verse] {
        &self.verses
    }

    pub fn ranking(&self) -> &TagRanking {
        &self.ranking
    }

    /// Ordered distinct tags collected from the answers.
    pub fn ordered_tags(&self) -> Vec<Tag> {
        self.ranking.tags()
    }

    /// Tags for display; the default tag stands in when no tags were collected.
    pub fn display_tags(&self) -> &[Tag] {
        &self.display_tags
    }

    pub fn top_tags(&self, n: usize) -> &[Tag] {
        &self.display_tags[..n.min(self.display_tags.len())]
    }

    /// Highest-ranked collected tag, used to pick the encouragement message.
    ///
    /// `None` when no tags were collected; the default tag only stands in for display.
    pub fn primary_tag(&self) -> Option<&Tag> {
        self.ranking.entries().first().map(|e| &e.tag)
    }

    pub fn pool(&self) -> &CandidatePool {
        &self.pool
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    /// Draws a fresh subset from the same pool.
    pub fn redraw<R: Rng + ?Sized>(&mut self, output_size: usize, rng: &mut R) {
        self.verses = reshuffle(&self.pool, output_size, rng);
    }
}

/// Scores `verses` against the collected `tags` and draws the displayed selection.
///
/// An empty result is not an error: it means there were no matches and no default-tagged
/// verses to fall back on.
pub fn score<R: Rng + ?Sized>(
    tags: &[Tag],
    verses: &[Verse],
    config: &ScoringConfig,
    rng: &mut R,
) -> Recommendation {
    let ranking = rank_tags(tags);
    let pool = CandidatePool::build(&ranking, verses, config);
    let selected = pool.draw(config.output_size, rng);

    tracing::debug!(
        tags = tags.len(),
        distinct = ranking.len(),
        candidates = pool.candidates().len(),
        fallback = pool.fallback().len(),
        selected = selected.len(),
        "scored verses"
    );

    let display_tags = if ranking.is_empty() {
        vec![config.default_tag.clone()]
    } else {
        ranking.tags()
    };

    Recommendation {
        verses: selected,
        ranking,
        display_tags,
        pool,
    }
}

/// Draws a new selection from an existing pool without scoring again.
pub fn reshuffle<R: Rng + ?Sized>(
    pool: &CandidatePool,
    output_size: usize,
    rng: &mut R,
) -> Vec<Verse> {
    pool.draw(output_size, rng)
}
