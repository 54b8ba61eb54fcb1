//! Simple vs. advanced free-text classification.
//!
//! A free-text value that uses no advanced query-string syntax can be
//! handed to the backend's lenient "simple" parser as-is. Anything with
//! mid-word wildcards (or an escaped `?`) must go through the strict
//! parser instead, after escaping every reserved character that is not
//! part of our own query language.

use std::sync::LazyLock;

use regex::Regex;

/// Advanced syntax marker: an escaped `?`, or a wildcard followed by
/// non-space characters. A word-final wildcard like `mumin*` stays
/// simple.
static NON_SIMPLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\\?|[*?]\S+").expect("static pattern"));

/// A `-` that starts a word, which the strict parser reads as negation.
static WORD_NEGATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s+)-(\S+)").expect("static pattern"));

/// Placeholder guarding word-leading hyphens during escaping.
const NEGATION_MARK: &str = "\u{0}";

/// True if the text can be handled by the lenient query parser.
pub fn is_simple(text: &str) -> bool {
    !NON_SIMPLE.is_match(text)
}

/// Escapes text for the strict query-string parser.
///
/// Reserved characters that are not part of our query language are
/// escaped so they match literally; `\?` is unescaped so it acts as a
/// wildcard; a word-leading `-` keeps its negation meaning while inner
/// hyphens are escaped; `<` and `>` cannot be escaped at all and are
/// stripped.
pub fn escape_advanced(text: &str) -> String {
    let mut out = text.replace("\\?", "?");

    for ch in ['=', '&', '!', '{', '}', '[', ']', '^', ':', '/'] {
        out = out.replace(ch, &format!("\\{ch}"));
    }

    out = WORD_NEGATION
        .replace_all(&out, format!("${{1}}{NEGATION_MARK}${{2}}"))
        .into_owned();
    out = out.replace('-', "\\-");
    out = out.replace(NEGATION_MARK, "-");

    out.replace(['<', '>'], "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_simple() {
        assert!(is_simple("det osynliga barnet"));
        assert!(is_simple("mumin* "));
        assert!(is_simple("mumin*"));
    }

    #[test]
    fn wildcards_followed_by_text_are_advanced() {
        assert!(!is_simple("mumin*trollet"));
        assert!(!is_simple("tr?ll"));
        assert!(!is_simple(r"what\?"));
        assert!(!is_simple("*foo"));
    }

    #[test]
    fn reserved_characters_are_escaped() {
        assert_eq!(escape_advanced("a=b"), r"a\=b");
        assert_eq!(escape_advanced("a:b/c"), r"a\:b\/c");
        assert_eq!(escape_advanced("x[1]"), r"x\[1\]");
    }

    #[test]
    fn escaped_question_mark_becomes_a_wildcard() {
        assert_eq!(escape_advanced(r"tr\?ll"), "tr?ll");
    }

    #[test]
    fn word_leading_hyphen_stays_negation() {
        assert_eq!(escape_advanced("-foo"), "-foo");
        assert_eq!(escape_advanced("bar -foo"), "bar -foo");
        assert_eq!(escape_advanced("foo-bar"), r"foo\-bar");
        assert_eq!(escape_advanced("-foo-bar"), r"-foo\-bar");
    }

    #[test]
    fn angle_brackets_are_stripped() {
        assert_eq!(escape_advanced("a<b>c"), "abc");
    }
}
