//! core::describe
//!
//! Parsing of the compact "nearest tag" descriptor produced by
//! `git describe --tags`.
//!
//! The descriptor is either a bare tag name (the commit is the tagged commit)
//! or `<tag>-<N>-g<abbrev>`, where `N` counts the commits since the tag and
//! `abbrev` is an abbreviated object name of at least seven lowercase hex
//! digits. Tag names may contain hyphen-digit groups of their own, so only
//! the trailing `-<N>-g<hex>` group is treated as the suffix.

use serde::Serialize;

use super::types::{TagName, TypeError};

/// Minimum length of the abbreviated object name in a describe suffix.
const MIN_ABBREV_LEN: usize = 7;

/// Where a commit sits relative to its nearest matching tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DescribeOutcome {
    /// The commit is the tagged commit.
    Direct {
        /// The tag on the commit
        tag: TagName,
    },

    /// The commit descends from the tagged commit.
    Distance {
        /// The nearest matching tag
        base_tag: TagName,
        /// Commits since the tag
        count: u64,
    },
}

impl DescribeOutcome {
    /// The tag this outcome refers to.
    pub fn tag(&self) -> &TagName {
        match self {
            DescribeOutcome::Direct { tag } => tag,
            DescribeOutcome::Distance { base_tag, .. } => base_tag,
        }
    }

    /// Commits since the tag (zero for a direct tag).
    pub fn count(&self) -> u64 {
        match self {
            DescribeOutcome::Direct { .. } => 0,
            DescribeOutcome::Distance { count, .. } => *count,
        }
    }
}

impl std::fmt::Display for DescribeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DescribeOutcome::Direct { tag } => write!(f, "{}", tag),
            DescribeOutcome::Distance { base_tag, count } => {
                write!(f, "{} (+{})", base_tag, count)
            }
        }
    }
}

/// Parse a describe descriptor.
///
/// Surrounding whitespace is ignored. The tag portion is as long as
/// possible, so `rel-2-5-7-1-gabc1234` is one commit past `rel-2-5-7`.
///
/// # Errors
///
/// Returns a [`TypeError`] if the descriptor is empty or its tag portion is
/// not a valid tag name.
///
/// # Example
///
/// ```
/// use tagtrail::core::describe::{parse_describe_output, DescribeOutcome};
/// use tagtrail::core::types::TagName;
///
/// let outcome = parse_describe_output("v1.2.3-4-gabcdef0").unwrap();
/// assert_eq!(
///     outcome,
///     DescribeOutcome::Distance { base_tag: TagName::new("v1.2.3").unwrap(), count: 4 }
/// );
///
/// let direct = parse_describe_output("v1.2.3").unwrap();
/// assert_eq!(direct, DescribeOutcome::Direct { tag: TagName::new("v1.2.3").unwrap() });
/// ```
pub fn parse_describe_output(raw: &str) -> Result<DescribeOutcome, TypeError> {
    let raw = raw.trim();

    if let Some((base, count)) = split_distance_suffix(raw) {
        return Ok(DescribeOutcome::Distance {
            base_tag: TagName::new(base)?,
            count,
        });
    }

    Ok(DescribeOutcome::Direct {
        tag: TagName::new(raw)?,
    })
}

/// Split `<tag>-<N>-g<hex>` into `(tag, N)`.
fn split_distance_suffix(raw: &str) -> Option<(&str, u64)> {
    let (rest, abbrev) = raw.rsplit_once('-')?;
    let hex = abbrev.strip_prefix('g')?;
    if hex.len() < MIN_ABBREV_LEN || !hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    {
        return None;
    }

    let (base, digits) = rest.rsplit_once('-')?;
    if base.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let count = digits.parse().ok()?;
    Some((base, count))
}
