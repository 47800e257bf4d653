//! Name normalization and similarity scores.

use rapidfuzz::distance::indel;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Strip accents, upper-case and trim: `"Nicolò "` -> `"NICOLO"`.
pub fn normalize(value: &str) -> String {
    value
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_uppercase()
        .trim()
        .to_string()
}

/// Lower-case, non-alphanumerics to spaces, tokens sorted and re-joined.
fn sorted_tokens(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();
    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// InDel similarity of two strings, 0-100; 0 when either side is empty.
pub fn ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let score = indel::normalized_similarity(a.chars(), b.chars()) * 100.0;
    score.round() as u8
}

/// Similarity after sorting tokens, insensitive to word order.
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Similarity with all whitespace and punctuation removed.
pub fn compact_ratio(a: &str, b: &str) -> u8 {
    let compact = |value: &str| -> String {
        value
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase()
    };
    ratio(&compact(a), &compact(b))
}

/// Score two full names by token-sort ratio.
///
/// With `compact` the score is raised to the whitespace-free ratio when that
/// is higher, so split and joined compound surnames agree. The compact ratio
/// depends on word order.
pub fn name_similarity(a: &str, b: &str, compact: bool) -> u8 {
    let sorted = token_sort_ratio(a, b);
    if compact {
        sorted.max(compact_ratio(a, b))
    } else {
        sorted
    }
}
