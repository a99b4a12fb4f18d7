//! core::pattern
//!
//! Shell-style glob patterns for selecting tags.
//!
//! Patterns support `*` (any run of characters, including `/`), `?` (any
//! single character) and bracket classes `[...]`, negated with `[!...]`.
//! Matching is case-sensitive and covers the whole tag name. A `[` without a
//! closing `]` matches itself.
//!
//! A pattern is compiled once into an anchored regular expression and can
//! then be matched against any number of tag names.

use regex::Regex;

use super::types::TypeError;

/// A compiled tag glob.
///
/// # Example
///
/// ```
/// use tagtrail::core::pattern::TagPattern;
///
/// let pattern = TagPattern::new("rel-*").unwrap();
/// assert!(pattern.matches("rel-1"));
/// assert!(!pattern.matches("foo-2"));
///
/// let digits = TagPattern::new("v[0-9].?").unwrap();
/// assert!(digits.matches("v1.x"));
/// assert!(!digits.matches("va.x"));
/// ```
#[derive(Debug, Clone)]
pub struct TagPattern {
    raw: String,
    regex: Regex,
}

impl TagPattern {
    /// Pattern used when nothing else is configured.
    pub const DEFAULT: &'static str = "rel-*";

    /// Compile a glob pattern.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPattern` if the pattern is empty or contains
    /// a malformed bracket class (e.g. a reversed range like `[z-a]`).
    pub fn new(pattern: impl Into<String>) -> Result<Self, TypeError> {
        let raw = pattern.into();
        if raw.is_empty() {
            return Err(TypeError::InvalidPattern("pattern cannot be empty".into()));
        }
        let regex = Regex::new(&translate(&raw))
            .map_err(|e| TypeError::InvalidPattern(format!("{raw}: {e}")))?;
        Ok(Self { raw, regex })
    }

    /// Check whether a tag name matches this pattern.
    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for TagPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for TagPattern {}

impl std::str::FromStr for TagPattern {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for TagPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Translate a glob into an anchored regular expression.
fn translate(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let n = chars.len();
    let mut out = String::from("^(?s:");
    let mut i = 0;

    while i < n {
        let c = chars[i];
        i += 1;
        match c {
            '*' => {
                while i < n && chars[i] == '*' {
                    i += 1;
                }
                out.push_str(".*");
            }
            '?' => out.push('.'),
            '[' => {
                // Find the closing bracket; a leading '!' or ']' belongs to the class.
                let mut j = i;
                if j < n && chars[j] == '!' {
                    j += 1;
                }
                if j < n && chars[j] == ']' {
                    j += 1;
                }
                while j < n && chars[j] != ']' {
                    j += 1;
                }

                if j >= n {
                    out.push_str("\\[");
                    continue;
                }

                let mut body = &chars[i..j];
                i = j + 1;

                out.push('[');
                if body.first() == Some(&'!') {
                    out.push('^');
                    body = &body[1..];
                }
                for &ch in body {
                    match ch {
                        '-' => out.push('-'),
                        '\\' | '[' | ']' | '^' | '&' | '~' => {
                            out.push('\\');
                            out.push(ch);
                        }
                        _ => out.push(ch),
                    }
                }
                out.push(']');
            }
            _ => out.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
        }
    }

    out.push_str(")$");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, name: &str) -> bool {
        TagPattern::new(pattern).unwrap().matches(name)
    }

    #[test]
    fn star_matches_suffix() {
        assert!(matches("rel-*", "rel-1"));
        assert!(matches("rel-*", "rel-"));
        assert!(matches("rel-*", "rel-0.1/hotfix"));
        assert!(!matches("rel-*", "foo-2"));
        assert!(!matches("rel-*", "xrel-1"));
    }

    #[test]
    fn whole_name_is_matched() {
        assert!(!matches("rel", "rel-1"));
        assert!(matches("*1", "rel-1"));
        assert!(!matches("*1", "rel-10"));
    }

    #[test]
    fn question_mark_matches_one_char() {
        assert!(matches("v?", "v1"));
        assert!(!matches("v?", "v10"));
        assert!(!matches("v?", "v"));
    }

    #[test]
    fn bracket_classes() {
        assert!(matches("v[0-9]", "v7"));
        assert!(!matches("v[0-9]", "vx"));
        assert!(matches("v[!0-9]", "vx"));
        assert!(!matches("v[!0-9]", "v7"));
        assert!(matches("v[]x]", "v]"));
    }

    #[test]
    fn unclosed_bracket_is_literal() {
        assert!(matches("v[1", "v[1"));
        assert!(!matches("v[1", "v1"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        assert!(matches("v1.2", "v1.2"));
        assert!(!matches("v1.2", "v1x2"));
        assert!(matches("a+b(c)", "a+b(c)"));
    }

    #[test]
    fn case_sensitive() {
        assert!(!matches("REL-*", "rel-1"));
    }

    #[test]
    fn empty_pattern_rejected() {
        assert!(TagPattern::new("").is_err());
    }

    #[test]
    fn reversed_range_rejected() {
        assert!(TagPattern::new("v[z-a]").is_err());
    }

    #[test]
    fn default_is_rel_star() {
        let pattern = TagPattern::new(TagPattern::DEFAULT).unwrap();
        assert_eq!(pattern.as_str(), "rel-*");
        assert!(pattern.matches("rel-0.1"));
    }

    #[test]
    fn parse_from_str() {
        let pattern: TagPattern = "v*".parse().unwrap();
        assert_eq!(pattern.to_string(), "v*");
    }
}
