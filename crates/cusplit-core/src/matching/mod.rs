//! Record-to-roster matching.

mod engine;
pub mod similarity;

pub use engine::MatchingEngine;
pub use similarity::{name_similarity, normalize, token_sort_ratio};
