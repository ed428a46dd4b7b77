//! Textual and numeric similarity kernels
//!
//! The mention/label similarity is a blend of three normalized edit ratios
//! (character, token-sort, token-set), averaging the top two so that two
//! coinciding low ratios cannot drown a high one: for "universal" vs
//! "universal picture" the character and token-sort ratios agree at ~0.66
//! while the token-set ratio is 1.0.

use std::collections::BTreeSet;

use strsim::normalized_levenshtein;

/// Character-level ratio over lowercased input.
fn char_ratio(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b)
}

fn sorted_tokens(s: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens
}

/// Ratio after sorting whitespace tokens, order-insensitive.
fn token_sort_ratio(a: &str, b: &str) -> f64 {
    normalized_levenshtein(&sorted_tokens(a).join(" "), &sorted_tokens(b).join(" "))
}

/// Set-based ratio: compare the shared-token core against each side's
/// core-plus-remainder, duplication-insensitive.
fn token_set_ratio(a: &str, b: &str) -> f64 {
    let set_a: BTreeSet<&str> = a.split_whitespace().collect();
    let set_b: BTreeSet<&str> = b.split_whitespace().collect();

    let common: Vec<&str> = set_a.intersection(&set_b).copied().collect();
    let only_a: Vec<&str> = set_a.difference(&set_b).copied().collect();
    let only_b: Vec<&str> = set_b.difference(&set_a).copied().collect();

    let core = common.join(" ");
    let core_a = join_nonempty(&core, &only_a.join(" "));
    let core_b = join_nonempty(&core, &only_b.join(" "));

    normalized_levenshtein(&core, &core_a)
        .max(normalized_levenshtein(&core, &core_b))
        .max(normalized_levenshtein(&core_a, &core_b))
}

fn join_nonempty(left: &str, right: &str) -> String {
    match (left.is_empty(), right.is_empty()) {
        (true, _) => right.to_string(),
        (_, true) => left.to_string(),
        _ => format!("{left} {right}"),
    }
}

/// Blended similarity of two strings in [0, 1], case-insensitive: the mean
/// of the top two of {char ratio, token-sort ratio, token-set ratio}.
pub fn blended_similarity(s1: &str, s2: &str) -> f64 {
    let a = s1.to_lowercase();
    let b = s2.to_lowercase();
    let mut ratios = [
        char_ratio(&a, &b),
        token_sort_ratio(&a, &b),
        token_set_ratio(&a, &b),
    ];
    ratios.sort_by(|x, y| y.partial_cmp(x).unwrap_or(std::cmp::Ordering::Equal));
    (ratios[0] + ratios[1]) / 2.0
}

/// Similarity of two magnitudes in [0, 1]: `1 − |a−b| / (|a|+|b|+1e−4)`.
pub fn magnitude_similarity(a: f64, b: f64) -> f64 {
    1.0 - (a - b).abs() / (a.abs() + b.abs() + 1e-4)
}

/// Lenient float parsing: trims whitespace and strips thousands commas.
pub fn parse_float(s: &str) -> Option<f64> {
    s.trim().replace(',', "").parse::<f64>().ok()
}

// ============================================================================
// TESTS
// ============================================================================
