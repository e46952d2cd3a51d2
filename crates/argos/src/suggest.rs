//! "Did you mean" suggestions for unknown switches and domains.
//!
//! Distance is Damerau-Levenshtein in the optimal-string-alignment variant:
//! substitutions, insertions, deletions, and adjacent transpositions each
//! count as one edit.

/// Damerau-Levenshtein distance (optimal string alignment).
#[must_use]
pub fn damerau_levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    // Three rolling rows: i-2, i-1, i.
    let mut prev2: Vec<usize> = vec![0; n + 1];
    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);

            if i > 1
                && j > 1
                && a_chars[i - 1] == b_chars[j - 2]
                && a_chars[i - 2] == b_chars[j - 1]
            {
                curr[j] = curr[j].min(prev2[j - 2] + 1);
            }
        }
        std::mem::swap(&mut prev2, &mut prev);
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Ranks `candidates` by edit distance to `word`, keeping those within
/// `max_distance`. Ties keep candidate order; the comparison is
/// case-insensitive.
#[must_use]
pub fn rank_candidates<'a, I>(word: &str, candidates: I, max_distance: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let word_lower = word.to_lowercase();

    let mut ranked: Vec<(usize, String)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let dist = damerau_levenshtein(&word_lower, &candidate.to_lowercase());
            (dist <= max_distance).then(|| (dist, candidate.to_string()))
        })
        .collect();

    ranked.sort_by_key(|(dist, _)| *dist);
    ranked.dedup_by(|a, b| a.1 == b.1);
    ranked.into_iter().map(|(_, candidate)| candidate).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical() {
        assert_eq!(damerau_levenshtein("hello", "hello"), 0);
    }

    #[test]
    fn test_substitution() {
        assert_eq!(damerau_levenshtein("hello", "hallo"), 1);
    }

    #[test]
    fn test_insertion_deletion() {
        assert_eq!(damerau_levenshtein("hello", "helllo"), 1);
        assert_eq!(damerau_levenshtein("hello", "helo"), 1);
    }

    #[test]
    fn test_transposition_is_one_edit() {
        assert_eq!(damerau_levenshtein("ab", "ba"), 1);
        assert_eq!(damerau_levenshtein("verbose", "verbsoe"), 1);
    }

    #[test]
    fn test_empty() {
        assert_eq!(damerau_levenshtein("", "abc"), 3);
        assert_eq!(damerau_levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_rank_filters_and_orders() {
        let candidates = ["verbose", "version", "quiet"];
        let ranked = rank_candidates("verbsoe", candidates, 2);
        assert_eq!(ranked[0], "verbose");
        assert!(!ranked.contains(&"quiet".to_string()));
    }

    #[test]
    fn test_rank_case_insensitive() {
        let ranked = rank_candidates("DEPLOY", ["deploy", "destroy"], 2);
        assert_eq!(ranked[0], "deploy");
    }

    #[test]
    fn test_rank_respects_max_distance() {
        assert!(rank_candidates("xyzzy", ["deploy", "status"], 2).is_empty());
    }
}
