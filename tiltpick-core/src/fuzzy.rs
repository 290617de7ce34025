//! Fuzzy string similarity for pairing metadata filenames with files on disk.
#![allow(clippy::cast_precision_loss)]
//!
//! All scores are in the range `0.0..=100.0`. Comparison is character based,
//! case sensitive, and performs no preprocessing: punctuation and separators
//! count like any other character. Tokens are whitespace separated.
//!
//! The base measure is the normalized Indel similarity
//! `200 * lcs(a, b) / (len(a) + len(b))`, with the longest common subsequence
//! computed by `rapidfuzz`. [`wratio`] combines the plain, partial and
//! token-based variants the same way for every query, weighting the partial
//! variants down when the two strings differ greatly in length.

use rapidfuzz::distance::lcs_seq;
use std::collections::BTreeSet;

const UNBASE_SCALE: f64 = 0.95;

/// Length of the longest common subsequence of two character slices.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    lcs_seq::similarity(a.iter().copied(), b.iter().copied())
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

/// Normalized Indel similarity of two strings.
#[must_use]
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Best [`ratio`] of the shorter string against every alignment of it over
/// the longer one, including alignments hanging off either end.
#[must_use]
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let n = short.len();
    let mut best = 0.0f64;
    // Window start ranges over [1 - n, long.len()), clipped to the long string.
    for start in 0..(long.len() + n - 1) {
        let lo = start.saturating_sub(n - 1);
        let hi = (start + 1).min(long.len());
        if lo >= hi {
            continue;
        }
        let score = ratio_chars(&short, &long[lo..hi]);
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}

fn sorted_tokens(s: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens
}

/// [`ratio`] after sorting the whitespace-separated tokens of both strings.
#[must_use]
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a).join(" "), &sorted_tokens(b).join(" "))
}

fn join_nonempty(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Token-set similarity: shared tokens are compared against the shared
/// tokens plus each side's remainder.
#[must_use]
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let set_a: BTreeSet<&str> = a.split_whitespace().collect();
    let set_b: BTreeSet<&str> = b.split_whitespace().collect();
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let intersect: Vec<&str> = set_a.intersection(&set_b).copied().collect();
    let diff_ab: Vec<&str> = set_a.difference(&set_b).copied().collect();
    let diff_ba: Vec<&str> = set_b.difference(&set_a).copied().collect();

    if !intersect.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 100.0;
    }

    let sect = intersect.join(" ");
    let ab = diff_ab.join(" ");
    let ba = diff_ba.join(" ");
    let mut best = ratio(&ab, &ba);
    if !sect.is_empty() {
        let sect_ab = join_nonempty(&[&sect, &ab]);
        let sect_ba = join_nonempty(&[&sect, &ba]);
        best = best.max(ratio(&sect, &sect_ab)).max(ratio(&sect, &sect_ba));
    }
    best
}

fn partial_token_ratio(a: &str, b: &str) -> f64 {
    let tokens_a = sorted_tokens(a);
    let tokens_b = sorted_tokens(b);
    let set_a: BTreeSet<&str> = tokens_a.iter().copied().collect();
    let set_b: BTreeSet<&str> = tokens_b.iter().copied().collect();
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }
    if set_a.intersection(&set_b).next().is_some() {
        return 100.0;
    }

    let sorted = partial_ratio(&tokens_a.join(" "), &tokens_b.join(" "));
    let diff_ab: Vec<&str> = set_a.into_iter().collect();
    let diff_ba: Vec<&str> = set_b.into_iter().collect();
    if diff_ab.len() == tokens_a.len() && diff_ba.len() == tokens_b.len() {
        return sorted;
    }
    sorted.max(partial_ratio(&diff_ab.join(" "), &diff_ba.join(" ")))
}

/// Weighted ratio: the best of the plain, partial and token-based scores,
/// with partial matches discounted by how different the lengths are.
#[must_use]
pub fn wratio(a: &str, b: &str) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }

    let len_ratio = len_a.max(len_b) as f64 / len_a.min(len_b) as f64;
    let end_ratio = ratio(a, b);

    if len_ratio < 1.5 {
        let token = token_sort_ratio(a, b).max(token_set_ratio(a, b));
        return end_ratio.max(token * UNBASE_SCALE);
    }

    let partial_scale = if len_ratio < 8.0 { 0.9 } else { 0.6 };
    let end_ratio = end_ratio.max(partial_ratio(a, b) * partial_scale);
    end_ratio.max(partial_token_ratio(a, b) * UNBASE_SCALE * partial_scale)
}

/// Returns the index and [`wratio`] score of the best-scoring choice.
///
/// Ties go to the earliest choice. Returns `None` only when `choices` is
/// empty; there is no minimum score.
#[must_use]
pub fn extract_one<S: AsRef<str>>(query: &str, choices: &[S]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, choice) in choices.iter().enumerate() {
        let score = wratio(query, choice.as_ref());
        if best.is_none_or(|(_, b)| score > b) {
            best = Some((idx, score));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ratio_basics() {
        assert_relative_eq!(ratio("tilt_003", "tilt_003"), 100.0);
        assert_relative_eq!(ratio("abc", "xyz"), 0.0);
        // lcs = 7 over 16 chars
        assert_relative_eq!(ratio("tilt_003", "tilt_001"), 87.5);
        assert_relative_eq!(ratio("", ""), 100.0);
    }

    #[test]
    fn test_lcs_len() {
        let chars = |s: &str| s.chars().collect::<Vec<_>>();
        assert_eq!(lcs_len(&chars("tilt_003"), &chars("tilt_001")), 7);
        assert_eq!(lcs_len(&chars("abcde"), &chars("ace")), 3);
        assert_eq!(lcs_len(&chars(""), &chars("abc")), 0);
    }

    #[test]
    fn test_ratio_is_case_sensitive() {
        assert!(ratio("TILT", "tilt") < 1.0);
    }

    #[test]
    fn test_partial_ratio_substring() {
        assert_relative_eq!(partial_ratio("003", "tilt_003"), 100.0);
        assert_relative_eq!(partial_ratio("tilt_003", "003"), 100.0);
        assert_relative_eq!(partial_ratio("", "abc"), 0.0);
        assert!(partial_ratio("009", "tilt_003") < 100.0);
    }

    #[test]
    fn test_token_ratios() {
        assert_relative_eq!(token_sort_ratio("b a", "a b"), 100.0);
        assert_relative_eq!(token_set_ratio("a b", "a b c"), 100.0);
        assert_relative_eq!(token_set_ratio("", "a"), 0.0);
    }

    #[test]
    fn test_wratio_empty() {
        assert_relative_eq!(wratio("", "tilt"), 0.0);
        assert_relative_eq!(wratio("tilt", ""), 0.0);
    }

    #[test]
    fn test_wratio_prefers_exact() {
        let exact = wratio("TS_01_003_3.0", "TS_01_003_3.0");
        let near = wratio("TS_01_003_3.0", "TS_01_004_6.0");
        assert_relative_eq!(exact, 100.0);
        assert!(near < exact);
    }

    #[test]
    fn test_extract_one_best_match() {
        let choices = ["tilt_001", "tilt_002", "tilt_003"];
        let (idx, score) = extract_one("tilt_003", &choices).unwrap();
        assert_eq!(idx, 2);
        assert_relative_eq!(score, 100.0);
    }

    #[test]
    fn test_extract_one_tie_goes_to_first() {
        let choices = ["same", "same"];
        assert_eq!(extract_one("same", &choices).map(|(i, _)| i), Some(0));
    }

    #[test]
    fn test_extract_one_empty() {
        let choices: [&str; 0] = [];
        assert!(extract_one("tilt", &choices).is_none());
    }
}
