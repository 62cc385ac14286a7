use serde::{Deserialize, Serialize};
use strsim::normalized_levenshtein;

/// String similarity backend.
///
/// Callers only see scores in `[0, 1]`; which implementation produced them is
/// decided once, when the matcher is built.
pub trait SimilarityAlgorithm: Send + Sync {
    fn name(&self) -> &'static str;

    /// Raw score for two non-empty strings.
    fn compare(&self, a: &str, b: &str) -> f64;

    /// Score in `[0, 1]`. Empty input always scores 0.
    fn similarity(&self, a: &str, b: &str) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        self.compare(a, b).clamp(0.0, 1.0)
    }
}

/// Which backend to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    #[default]
    TokenSortRatio,
    EditDistance,
}

impl Algorithm {
    pub fn build(self) -> Box<dyn SimilarityAlgorithm> {
        match self {
            Algorithm::TokenSortRatio => Box::new(TokenSortRatio),
            Algorithm::EditDistance => Box::new(EditDistanceRatio),
        }
    }
}

/// Token-order-insensitive indel ratio: `2 * LCS / (len(a) + len(b))` over
/// whitespace tokens sorted and rejoined.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSortRatio;

impl SimilarityAlgorithm for TokenSortRatio {
    fn name(&self) -> &'static str {
        "token_sort_ratio"
    }

    fn compare(&self, a: &str, b: &str) -> f64 {
        indel_ratio(&sort_tokens(a), &sort_tokens(b))
    }
}

/// Fallback backend: normalized Levenshtein distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditDistanceRatio;

impl SimilarityAlgorithm for EditDistanceRatio {
    fn name(&self) -> &'static str {
        "edit_distance"
    }

    fn compare(&self, a: &str, b: &str) -> f64 {
        normalized_levenshtein(a, b)
    }
}

fn sort_tokens(text: &str) -> String {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn indel_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }
    (2 * lcs_len(&a, &b)) as f64 / total as f64
}

/// Longest common subsequence length, two-row DP.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
