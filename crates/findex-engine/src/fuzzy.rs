//! Bit-parallel approximate string matching.
//!
//! Wu-Manber style bitap over `char` indices: one u64 state word per
//! tolerated error level, advanced once per text character, so a scan
//! costs O(text_len * max_errors) regardless of pattern alignment.
//! Patterns longer than 64 chars are split into chunks matched
//! independently with their scores averaged.
//!
//! Scoring combines three monotonic factors: edit-error ratio, distance
//! of the match start from the beginning of the text, and fragmentation
//! of the matched character runs. An exact contiguous substring scores
//! exactly 0 wherever it occurs.

use std::collections::HashMap;

/// Maximum chunk width; one bit per pattern char in a u64 state word.
const MAX_CHUNK: usize = 64;

/// Divisor turning match-start distance into a score penalty.
const LOCATION_DENOM: f64 = 20_000.0;

/// Penalty added per disjoint matched range beyond the first.
const FRAGMENT_PENALTY: f64 = 0.02;

/// A successful approximate match.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyMatch {
    /// Normalized score in [0, threshold]; 0 is a perfect match
    pub score: f64,
    /// Inclusive character-index ranges where pattern chars aligned
    pub ranges: Vec<(usize, usize)>,
}

struct Chunk {
    chars: Vec<char>,
    masks: HashMap<char, u64>,
    max_errors: usize,
}

/// A compiled search pattern with a fixed tolerance threshold.
pub struct Pattern {
    chunks: Vec<Chunk>,
    threshold: f64,
}

impl Pattern {
    /// Compile `pattern` against tolerance `threshold` in (0, 1].
    ///
    /// Matching is case-insensitive. An empty (or whitespace-only)
    /// pattern compiles to a matcher that never matches.
    pub fn new(pattern: &str, threshold: f64) -> Self {
        let chars: Vec<char> = pattern.trim().chars().map(fold_case).collect();

        let chunks = chars
            .chunks(MAX_CHUNK)
            .map(|chunk| {
                let mut masks: HashMap<char, u64> = HashMap::new();
                for (i, &c) in chunk.iter().enumerate() {
                    *masks.entry(c).or_insert(0) |= 1u64 << i;
                }
                Chunk {
                    chars: chunk.to_vec(),
                    masks,
                    max_errors: (threshold * chunk.len() as f64).floor() as usize,
                }
            })
            .collect();

        Self { chunks, threshold }
    }

    /// Whether this pattern can ever match (false for empty patterns).
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Search `text` for the best approximate occurrence.
    ///
    /// Returns `None` when the pattern is empty, the text is empty, or
    /// no alignment scores at or below the threshold.
    pub fn find_in(&self, text: &str) -> Option<FuzzyMatch> {
        if self.chunks.is_empty() {
            return None;
        }

        let text: Vec<char> = text.chars().map(fold_case).collect();
        if text.is_empty() {
            return None;
        }

        let mut total = 0.0;
        let mut ranges: Vec<(usize, usize)> = Vec::new();

        for chunk in &self.chunks {
            match chunk.best_match(&text) {
                Some((score, chunk_ranges)) => {
                    total += score;
                    ranges.extend(chunk_ranges);
                }
                // A chunk with no alignment contributes the worst score
                None => total += 1.0,
            }
        }

        let score = total / self.chunks.len() as f64;
        if score > self.threshold {
            return None;
        }

        ranges.sort_unstable();
        Some(FuzzyMatch {
            score,
            ranges: merge_ranges(ranges),
        })
    }
}

impl Chunk {
    /// Run the bitap scan and return the lowest-scoring alignment.
    fn best_match(&self, text: &[char]) -> Option<(f64, Vec<(usize, usize)>)> {
        let m = self.chars.len();
        let accept = 1u64 << (m - 1);

        // state[d] holds the shift-and word for alignments with d errors
        let mut state = vec![0u64; self.max_errors + 1];
        let mut best: Option<(usize, usize)> = None; // (errors, end index)

        'scan: for (j, &c) in text.iter().enumerate() {
            let mask = self.masks.get(&c).copied().unwrap_or(0);

            let mut prev_below = state[0];
            state[0] = ((state[0] << 1) | 1) & mask;

            for d in 1..=self.max_errors {
                let prev_here = state[d];
                // match | substitution | insertion | deletion
                state[d] = (((state[d] << 1) | 1) & mask)
                    | ((prev_below << 1) | 1)
                    | ((state[d - 1] << 1) | 1)
                    | prev_below;
                prev_below = prev_here;
            }

            // Only the smallest error level matters at a given end
            // position; extra errors cost 1/m while the start shifts by
            // at most 1/LOCATION_DENOM.
            if let Some(d) = state.iter().position(|word| word & accept != 0) {
                let better = match best {
                    Some((errors, end)) => self.score_at(d, j) < self.score_at(errors, end),
                    None => true,
                };
                if better {
                    best = Some((d, j));
                }
                if d == 0 {
                    // Exact substring; nothing can score lower
                    break 'scan;
                }
            }
        }

        let (errors, end) = best?;
        let start = (end + 1).saturating_sub(m + errors);
        let ranges = self.matched_ranges(text, start, end);

        let score = if errors == 0 {
            0.0
        } else {
            self.score_at(errors, end) + FRAGMENT_PENALTY * ranges.len().saturating_sub(1) as f64
        };

        Some((score, ranges))
    }

    /// Error-ratio plus start-distance penalty for a match ending at `end`.
    fn score_at(&self, errors: usize, end: usize) -> f64 {
        let m = self.chars.len();
        let start = (end + 1).saturating_sub(m + errors);
        errors as f64 / m as f64 + start as f64 / LOCATION_DENOM
    }

    /// Positions inside the winning alignment window whose text char
    /// occurs in the pattern, coalesced into inclusive runs.
    fn matched_ranges(&self, text: &[char], start: usize, end: usize) -> Vec<(usize, usize)> {
        let mut ranges = Vec::new();
        let mut run: Option<(usize, usize)> = None;

        for (i, &c) in text.iter().enumerate().take(end + 1).skip(start) {
            if self.masks.contains_key(&c) {
                run = match run {
                    Some((s, _)) => Some((s, i)),
                    None => Some((i, i)),
                };
            } else if let Some(r) = run.take() {
                ranges.push(r);
            }
        }
        if let Some(r) = run {
            ranges.push(r);
        }

        ranges
    }
}

fn fold_case(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn merge_ranges(ranges: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        match merged.last_mut() {
            Some((_, last_end)) if start <= *last_end + 1 => {
                *last_end = (*last_end).max(end);
            }
            _ => merged.push((start, end)),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_substring_scores_zero() {
        let pattern = Pattern::new("report", 0.4);
        let hit = pattern.find_in("report.txt").unwrap();
        assert_eq!(hit.score, 0.0);
        assert_eq!(hit.ranges, vec![(0, 5)]);
    }

    #[test]
    fn test_exact_substring_scores_zero_anywhere() {
        let pattern = Pattern::new("invoice", 0.4);
        let hit = pattern
            .find_in("quarterly statement and invoice for march")
            .unwrap();
        assert_eq!(hit.score, 0.0);
    }

    #[test]
    fn test_single_substitution_matches() {
        // "invoise" vs "invoice": one substitution
        let pattern = Pattern::new("invoise", 0.4);
        let hit = pattern.find_in("invoice_march.txt").unwrap();
        assert!(hit.score > 0.0);
        assert!(hit.score <= 0.4);
    }

    #[test]
    fn test_insertion_and_deletion_match() {
        let pattern = Pattern::new("report", 0.4);
        assert!(pattern.find_in("reprot summary").is_some()); // transposed
        assert!(pattern.find_in("reort only").is_some()); // deletion
        assert!(pattern.find_in("repoort only").is_some()); // insertion
    }

    #[test]
    fn test_unrelated_text_does_not_match() {
        let pattern = Pattern::new("invoise", 0.4);
        assert!(pattern.find_in("unrelated meeting notes").is_none());
    }

    #[test]
    fn test_empty_pattern_never_matches() {
        let pattern = Pattern::new("", 0.4);
        assert!(pattern.is_empty());
        assert!(pattern.find_in("anything").is_none());

        let blank = Pattern::new("   ", 0.4);
        assert!(blank.find_in("anything").is_none());
    }

    #[test]
    fn test_empty_text_never_matches() {
        let pattern = Pattern::new("report", 0.4);
        assert!(pattern.find_in("").is_none());
    }

    #[test]
    fn test_case_insensitive() {
        let pattern = Pattern::new("README", 0.4);
        let hit = pattern.find_in("readme.md").unwrap();
        assert_eq!(hit.score, 0.0);
    }

    #[test]
    fn test_earlier_match_scores_better() {
        let pattern = Pattern::new("budget", 0.4);
        let early = pattern.find_in("budgex planning for the year").unwrap();
        let late = pattern
            .find_in("planning for the fiscal year with one budgex")
            .unwrap();
        assert!(early.score < late.score);
    }

    #[test]
    fn test_more_errors_score_worse() {
        let one = Pattern::new("invoice", 0.6).find_in("invoise").unwrap();
        let two = Pattern::new("invoice", 0.6).find_in("invvise").unwrap();
        assert!(one.score < two.score);
    }

    #[test]
    fn test_error_budget_scales_with_pattern_length() {
        // Two errors in a 4-char pattern exceed floor(0.4 * 4) = 1
        assert!(Pattern::new("abcd", 0.4).find_in("axyd").is_none());
        // Two errors in a 10-char pattern fit floor(0.4 * 10) = 4
        assert!(Pattern::new("abcdefghij", 0.4)
            .find_in("abxdefgxij")
            .is_some());
    }

    #[test]
    fn test_deterministic() {
        let pattern = Pattern::new("meeting", 0.4);
        let a = pattern.find_in("meting notes from tuesday").unwrap();
        let b = pattern.find_in("meting notes from tuesday").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_long_pattern_chunks() {
        let long: String = "abcdefghij".repeat(8); // 80 chars, two chunks
        let pattern = Pattern::new(&long, 0.4);
        let hit = pattern.find_in(&long).unwrap();
        assert_eq!(hit.score, 0.0);
    }

    #[test]
    fn test_long_text_matches_in_bounded_window() {
        let mut text = "x".repeat(500);
        text.push_str("checkpoint");
        text.push_str(&"y".repeat(500));

        let pattern = Pattern::new("checkpoint", 0.4);
        let hit = pattern.find_in(&text).unwrap();
        assert_eq!(hit.score, 0.0);
        assert_eq!(hit.ranges, vec![(500, 509)]);
    }

    #[test]
    fn test_merge_ranges() {
        assert_eq!(
            merge_ranges(vec![(0, 2), (3, 5), (8, 9)]),
            vec![(0, 5), (8, 9)]
        );
    }
}
