use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use super::normalizer::{normalize_aggressive, normalize_basic, normalize_standard};
use super::similarity::{Algorithm, SimilarityAlgorithm};

pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.85;

/// Alternatives scoring at least this fraction of the threshold are kept.
const ALTERNATIVE_FLOOR: f64 = 0.9;
const MAX_ALTERNATIVES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Normalized,
    NormalizedAggressive,
    Fuzzy,
    None,
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchType::Exact => "exact",
            MatchType::Normalized => "normalized",
            MatchType::NormalizedAggressive => "normalized_aggressive",
            MatchType::Fuzzy => "fuzzy",
            MatchType::None => "none",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alternative {
    pub title: String,
    pub score: f64,
    pub row: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub matched: bool,
    pub score: f64,
    pub match_type: MatchType,
    pub original_filename: String,
    pub matched_title: String,
    pub matched_row: Option<u32>,
    pub alternatives: Vec<Alternative>,
}

impl MatchResult {
    fn hit(filename: &str, candidate: &TitleCandidate, score: f64, match_type: MatchType) -> Self {
        Self {
            matched: true,
            score,
            match_type,
            original_filename: filename.to_string(),
            matched_title: candidate.title().to_string(),
            matched_row: Some(candidate.row),
            alternatives: Vec::new(),
        }
    }
}

/// One spreadsheet title keyed by its basic-normalized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleCandidate {
    pub key: String,
    pub row: u32,
    pub original: Option<String>,
}

impl TitleCandidate {
    /// The original title when known, otherwise the key itself.
    pub fn title(&self) -> &str {
        self.original.as_deref().unwrap_or(&self.key)
    }
}

/// Spreadsheet titles in row-insertion order.
///
/// Iteration order is insertion order, which is what breaks ties in the
/// fuzzy tier. Re-inserting a key updates its row in place.
#[derive(Debug, Clone, Default)]
pub struct TitleCandidates {
    entries: Vec<TitleCandidate>,
    index: HashMap<String, usize>,
}

impl TitleCandidates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(title, row)` pairs, keying each by `normalize_basic(title)`.
    pub fn from_titles<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        let mut candidates = Self::new();
        for (title, row) in titles {
            let title = title.as_ref();
            let key = normalize_basic(title);
            candidates.insert(key.clone(), row);
            candidates.set_original(&key, title);
        }
        candidates
    }

    pub fn insert(&mut self, key: impl Into<String>, row: u32) {
        let key = key.into();
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].row = row,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push(TitleCandidate {
                    key,
                    row,
                    original: None,
                });
            }
        }
    }

    /// Attach the un-normalized title to an existing key. Returns false if the key is unknown.
    pub fn set_original(&mut self, key: &str, original: impl Into<String>) -> bool {
        match self.index.get(key) {
            Some(&pos) => {
                self.entries[pos].original = Some(original.into());
                true
            }
            None => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&TitleCandidate> {
        self.index.get(key).map(|&pos| &self.entries[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &TitleCandidate> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Matches filenames to spreadsheet titles with a four-tier cascade:
///
/// 1. basic-normalized key lookup (score 1.0)
/// 2. standard-normalized equality (0.95)
/// 3. aggressive-normalized equality (0.90)
/// 4. fuzzy similarity of aggressive forms, accepted at or above the threshold
pub struct FuzzyMatcher {
    threshold: f64,
    fuzzy_enabled: bool,
    algorithm: Box<dyn SimilarityAlgorithm>,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}

impl fmt::Debug for FuzzyMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuzzyMatcher")
            .field("threshold", &self.threshold)
            .field("fuzzy_enabled", &self.fuzzy_enabled)
            .field("algorithm", &self.algorithm.name())
            .finish()
    }
}

impl FuzzyMatcher {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            fuzzy_enabled: true,
            algorithm: Algorithm::default().build(),
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm.build();
        self
    }

    /// Turning fuzzy matching off stops the cascade after tier 3.
    pub fn with_fuzzy(mut self, enabled: bool) -> Self {
        self.fuzzy_enabled = enabled;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn algorithm_name(&self) -> &'static str {
        self.algorithm.name()
    }

    /// Raw backend score, shared with the duplicate detector.
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        self.algorithm.similarity(a, b)
    }

    pub fn find_best_match(&self, filename: &str, candidates: &TitleCandidates) -> MatchResult {
        let basic = normalize_basic(filename);
        if let Some(candidate) = candidates.get(&basic) {
            return MatchResult::hit(filename, candidate, 1.0, MatchType::Exact);
        }

        let standard = normalize_standard(filename);
        if let Some(candidate) = candidates
            .iter()
            .find(|c| normalize_standard(c.title()) == standard)
        {
            return MatchResult::hit(filename, candidate, 0.95, MatchType::Normalized);
        }

        let aggressive = normalize_aggressive(filename);
        if let Some(candidate) = candidates
            .iter()
            .find(|c| normalize_aggressive(c.title()) == aggressive)
        {
            return MatchResult::hit(filename, candidate, 0.90, MatchType::NormalizedAggressive);
        }

        if !self.fuzzy_enabled {
            return self.miss(filename, 0.0, Vec::new());
        }

        let mut best: Option<(&TitleCandidate, f64)> = None;
        let mut alternatives: Vec<Alternative> = Vec::new();

        for candidate in candidates.iter() {
            let score = self.similarity(&aggressive, &normalize_aggressive(candidate.title()));

            // Strict comparison: the first candidate reaching a score keeps it.
            if score > best.map_or(0.0, |(_, s)| s) {
                best = Some((candidate, score));
            }

            if score >= self.threshold * ALTERNATIVE_FLOOR {
                alternatives.push(Alternative {
                    title: candidate.title().to_string(),
                    score,
                    row: candidate.row,
                });
            }
        }

        // Stable sort keeps iteration order among equal scores.
        alternatives.sort_by(|a, b| b.score.total_cmp(&a.score));
        alternatives.truncate(MAX_ALTERNATIVES);

        match best {
            Some((candidate, score)) if score >= self.threshold => {
                debug!(
                    "Fuzzy match {:.3}: '{}' -> '{}'",
                    score,
                    filename,
                    candidate.title()
                );
                let mut result = MatchResult::hit(filename, candidate, score, MatchType::Fuzzy);
                result.alternatives = alternatives;
                result
            }
            Some((_, score)) => self.miss(filename, score, alternatives),
            None => self.miss(filename, 0.0, alternatives),
        }
    }

    pub fn batch_find_matches<S: AsRef<str>>(
        &self,
        filenames: &[S],
        candidates: &TitleCandidates,
    ) -> Vec<MatchResult> {
        filenames
            .iter()
            .map(|name| self.find_best_match(name.as_ref(), candidates))
            .collect()
    }

    fn miss(&self, filename: &str, score: f64, alternatives: Vec<Alternative>) -> MatchResult {
        MatchResult {
            matched: false,
            score,
            match_type: MatchType::None,
            original_filename: filename.to_string(),
            matched_title: String::new(),
            matched_row: None,
            alternatives,
        }
    }
}
