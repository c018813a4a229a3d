//! Lexical title similarity used to find related contexts.
//!
//! Two titles are related when their significant tokens overlap:
//!
//! 1. Lower-case and split on whitespace.
//! 2. Drop tokens of two characters or fewer and stop words.
//! 3. Related iff the token sets intersect and the titles differ.

use std::collections::HashSet;

/// Words ignored when comparing titles.
pub const STOP_WORDS: &[&str] = &["the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for"];

/// Significant tokens of a title.
pub fn significant_tokens(title: &str) -> HashSet<String> {
    title
        .to_lowercase()
        .split_whitespace()
        .filter(|t| t.chars().count() > 2 && !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Whether two titles share a significant token without being the same title.
///
/// Equality is checked case-insensitively.
pub fn titles_related(a: &str, b: &str) -> bool {
    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();
    if a_lower.trim() == b_lower.trim() {
        return false;
    }
    let a_tokens = significant_tokens(&a_lower);
    let b_tokens = significant_tokens(&b_lower);
    !a_tokens.is_disjoint(&b_tokens)
}
