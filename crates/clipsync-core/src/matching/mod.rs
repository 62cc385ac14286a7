pub mod matcher;
pub mod normalizer;
pub mod similarity;

pub use matcher::{
    Alternative, FuzzyMatcher, MatchResult, MatchType, TitleCandidate, TitleCandidates,
    DEFAULT_MATCH_THRESHOLD,
};
pub use normalizer::{
    extract_core_title, normalize_aggressive, normalize_basic, normalize_standard,
    remove_channel_suffix, NormalizedForms,
};
pub use similarity::{Algorithm, SimilarityAlgorithm};
