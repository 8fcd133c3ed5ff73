//! Token Scanner
//!
//! Pure recognition pass: given raw text, produces the ordered set of token
//! spans for all four token classes. No I/O, no mutation of shared state
//! beyond an invocation counter.
//!
//! Recognition runs in fixed precedence: emoticons claim their ranges first,
//! then mentions, hashtags, and URLs. Later classes never match inside a
//! range already claimed by an earlier class, so an emoticon whose code looks
//! like a link is never reclassified.

use std::sync::atomic::{AtomicU64, Ordering};

use regex::Regex;

use super::models::{TokenKind, TokenSpan};

/// Emoticon codes: bracketed, non-greedy, no embedded whitespace.
/// An unmatched `[` yields no span.
const EMOTICON_PATTERN: &str = r"\[\S+?\]";

/// Mentions: `@` followed by 1-26 word or hyphen characters.
/// `\w` is Unicode here, so CJK names match.
const MENTION_PATTERN: &str = r"@[\w-]{1,26}";

/// Hashtags: a `#...#` pair enclosing printable/CJK characters, `#` excluded.
const HASHTAG_PATTERN: &str = r"#[[[:print:]\p{Han}]--#]+#";

/// URLs: an `http://`-prefixed run of URL-safe characters that does not end
/// in trailing punctuation.
const URL_PATTERN: &str = r"http://[-a-zA-Z0-9+&@#/%?=~_|!:,.;]*[a-zA-Z0-9+&@#/%=~_|]";

// =============================================================================
// Scanner
// =============================================================================

/// Recognizes markup token spans in plain text.
///
/// Patterns are compiled once at construction. `scan` is safe to call from
/// any thread.
pub struct TokenScanner {
    emoticon: Regex,
    mention: Regex,
    hashtag: Regex,
    url: Regex,
    scans: AtomicU64,
}

impl TokenScanner {
    /// Creates a scanner with the four token patterns compiled.
    pub fn new() -> Self {
        Self {
            emoticon: Regex::new(EMOTICON_PATTERN).expect("hard-coded emoticon pattern"),
            mention: Regex::new(MENTION_PATTERN).expect("hard-coded mention pattern"),
            hashtag: Regex::new(HASHTAG_PATTERN).expect("hard-coded hashtag pattern"),
            url: Regex::new(URL_PATTERN).expect("hard-coded url pattern"),
            scans: AtomicU64::new(0),
        }
    }

    /// Scans `text` and returns all recognized spans, ordered by start
    /// offset, non-overlapping, without duplicates.
    pub fn scan(&self, text: &str) -> Vec<TokenSpan> {
        self.scans.fetch_add(1, Ordering::Relaxed);

        if text.is_empty() {
            return Vec::new();
        }

        let mut claimed: Vec<(usize, usize)> = Vec::new();
        let mut spans: Vec<TokenSpan> = Vec::new();

        // Precedence order: each class only sees ranges the previous classes
        // left unclaimed.
        let passes: [(&Regex, TokenKind); 4] = [
            (&self.emoticon, TokenKind::Emoticon),
            (&self.mention, TokenKind::Mention),
            (&self.hashtag, TokenKind::Hashtag),
            (&self.url, TokenKind::Url),
        ];

        for (pattern, kind) in passes {
            for m in pattern.find_iter(text) {
                if overlaps_claimed(&claimed, m.start(), m.end()) {
                    continue;
                }
                claimed.push((m.start(), m.end()));
                spans.push(TokenSpan {
                    start: m.start(),
                    end: m.end(),
                    kind,
                    raw: m.as_str().to_string(),
                });
            }
        }

        spans.sort_by_key(|s| s.start);
        spans
    }

    /// Number of times `scan` has been invoked on this scanner.
    pub fn scan_count(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }
}

impl Default for TokenScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks whether `[start, end)` intersects any already-claimed range.
fn overlaps_claimed(claimed: &[(usize, usize)], start: usize, end: usize) -> bool {
    claimed.iter().any(|&(s, e)| start < e && s < end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(spans: &[TokenSpan]) -> Vec<TokenKind> {
        spans.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_scan_empty_text() {
        let scanner = TokenScanner::new();
        assert!(scanner.scan("").is_empty());
    }

    #[test]
    fn test_scan_recognizes_all_four_classes() {
        let scanner = TokenScanner::new();
        let spans = scanner.scan("hello [smile] @bob check #news# http://x.test/a");

        assert_eq!(
            kinds(&spans),
            vec![
                TokenKind::Emoticon,
                TokenKind::Mention,
                TokenKind::Hashtag,
                TokenKind::Url
            ]
        );
        assert_eq!(spans[0].raw, "[smile]");
        assert_eq!(spans[1].raw, "@bob");
        assert_eq!(spans[2].raw, "#news#");
        assert_eq!(spans[3].raw, "http://x.test/a");
    }

    #[test]
    fn test_scan_is_idempotent() {
        let scanner = TokenScanner::new();
        let text = "hi [wave] @alice #topic# http://a.test";
        assert_eq!(scanner.scan(text), scanner.scan(text));
    }

    #[test]
    fn test_scan_spans_are_ordered_and_disjoint() {
        let scanner = TokenScanner::new();
        let spans = scanner.scan("@a [x] #b# http://c.test @d");

        for pair in spans.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn test_unclosed_emoticon_bracket_yields_no_span() {
        let scanner = TokenScanner::new();
        assert!(scanner.scan("[nope").is_empty());
    }

    #[test]
    fn test_emoticon_rejects_embedded_whitespace() {
        let scanner = TokenScanner::new();
        assert!(scanner.scan("[not an emoticon]").is_empty());
    }

    #[test]
    fn test_adjacent_emoticons_both_match() {
        let scanner = TokenScanner::new();
        let spans = scanner.scan("[a][b]");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].raw, "[a]");
        assert_eq!(spans[1].raw, "[b]");
    }

    #[test]
    fn test_url_inside_emoticon_span_is_not_reclassified() {
        let scanner = TokenScanner::new();
        let spans = scanner.scan("see [http://x.test] now");

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, TokenKind::Emoticon);
        assert_eq!(spans[0].raw, "[http://x.test]");
    }

    #[test]
    fn test_mention_length_is_capped() {
        let scanner = TokenScanner::new();
        let name: String = "x".repeat(30);
        let spans = scanner.scan(&format!("@{}", name));

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].raw.len(), 27); // '@' + 26 chars
    }

    #[test]
    fn test_hashtag_matches_cjk() {
        let scanner = TokenScanner::new();
        let spans = scanner.scan("看 #话题# 了");

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, TokenKind::Hashtag);
        assert_eq!(spans[0].raw, "#话题#");
    }

    #[test]
    fn test_hashtag_stops_at_inner_hash() {
        let scanner = TokenScanner::new();
        let spans = scanner.scan("#a#b#");

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].raw, "#a#");
    }

    #[test]
    fn test_url_excludes_trailing_punctuation() {
        let scanner = TokenScanner::new();
        let spans = scanner.scan("go http://x.test/a. now");

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].raw, "http://x.test/a");
    }

    #[test]
    fn test_scan_count_increments() {
        let scanner = TokenScanner::new();
        assert_eq!(scanner.scan_count(), 0);
        scanner.scan("a");
        scanner.scan("b");
        assert_eq!(scanner.scan_count(), 2);
    }
}
