/// Characters of the previous chapter carried into the next generation prompt.
pub const CONTINUITY_EXCERPT_CHARS: usize = 500;

/// Number of whitespace-delimited, non-empty tokens.
pub fn word_count(content: &str) -> i32 {
    content.split_whitespace().count().try_into().unwrap_or(i32::MAX)
}

/// First `CONTINUITY_EXCERPT_CHARS` characters followed by "...".
///
/// Counts chars rather than bytes so multi-byte text is never split mid-codepoint.
pub fn continuity_excerpt(content: &str) -> String {
    let mut excerpt: String = content.chars().take(CONTINUITY_EXCERPT_CHARS).collect();
    excerpt.push_str("...");
    excerpt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_tokens_across_any_whitespace() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   \n\t "), 0);
        assert_eq!(word_count("one"), 1);
        assert_eq!(word_count("  She  looked\nup.\tThen   left. "), 5);
    }

    #[test]
    fn excerpt_is_capped_and_suffixed() {
        let long = "a".repeat(800);
        let excerpt = continuity_excerpt(&long);
        assert_eq!(excerpt.len(), CONTINUITY_EXCERPT_CHARS + 3);
        assert!(excerpt.ends_with("..."));

        assert_eq!(continuity_excerpt("short"), "short...");
    }

    #[test]
    fn excerpt_respects_char_boundaries() {
        let text = "é".repeat(600);
        let excerpt = continuity_excerpt(&text);
        assert_eq!(excerpt.chars().count(), CONTINUITY_EXCERPT_CHARS + 3);
    }
}
