//! Fuzzy matching of mistyped input against command paths.
//!
//! Used for the "did you mean" hint when a line resolves to nothing.

/// Score of a fuzzy match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MatchScore(pub i32);

/// Match `pattern` as a case-insensitive subsequence of `text`.
///
/// Whitespace in the pattern is ignored, so `"sh sw"` matches `"show switch"`.
///
/// # Scoring
///
/// - +1 per matched character
/// - +8 when the previous pattern character matched the previous text character
/// - +6 when the character starts a token of `text`
/// - +15 when `text` starts with the first pattern character
///
/// # Examples
///
/// ```
/// use ctl_console::core::subsequence_score;
///
/// assert!(subsequence_score("shsw", "show switch").is_some());
/// assert!(subsequence_score("xyz", "show switch").is_none());
/// ```
pub fn subsequence_score(pattern: &str, text: &str) -> Option<MatchScore> {
    let pattern: Vec<char> = pattern
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    if pattern.is_empty() {
        return None;
    }

    let mut score = 0i32;
    let mut next = 0usize;
    let mut prev_matched = false;
    let mut prev_char: Option<char> = None;

    for (i, ch) in text.chars().flat_map(char::to_lowercase).enumerate() {
        if next < pattern.len() && ch == pattern[next] {
            score += 1;
            if prev_matched {
                score += 8;
            }
            if prev_char.is_none_or(char::is_whitespace) {
                score += 6;
            }
            if i == 0 {
                score += 15;
            }
            next += 1;
            prev_matched = true;
        } else {
            prev_matched = false;
        }
        prev_char = Some(ch);
    }

    (next == pattern.len()).then_some(MatchScore(score))
}

/// The best-scoring candidate for `pattern`, ties broken alphabetically.
pub fn best_match<'a>(
    pattern: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Option<&'a str> {
    candidates
        .into_iter()
        .filter_map(|c| subsequence_score(pattern, c).map(|s| (c, s)))
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(c, _)| c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_scores() {
        let score = subsequence_score("exit", "exit").unwrap();
        assert!(score.0 > 4);
    }

    #[test]
    fn test_no_match() {
        assert!(subsequence_score("xyz", "show host").is_none());
        assert!(subsequence_score("exits", "exit").is_none());
        assert!(subsequence_score("", "exit").is_none());
        assert!(subsequence_score("   ", "exit").is_none());
    }

    #[test]
    fn test_case_insensitive() {
        assert!(subsequence_score("SHOW", "show").is_some());
        assert!(subsequence_score("show", "SHOW").is_some());
    }

    #[test]
    fn test_token_start_bonus() {
        let aligned = subsequence_score("sh", "show host").unwrap();
        let scattered = subsequence_score("sh", "ssh").unwrap();
        assert!(aligned > scattered);
    }

    #[test]
    fn test_best_match_prefers_shorter_on_tie() {
        let paths = ["exit", "help", "show", "show host", "show switch"];
        assert_eq!(best_match("shw", paths), Some("show"));
        assert_eq!(best_match("shost", paths), Some("show host"));
        assert_eq!(best_match("qqq", paths), None);
    }

    #[test]
    fn test_best_match_ties_alphabetical() {
        assert_eq!(best_match("a", ["ab", "aa"]), Some("aa"));
    }
}
