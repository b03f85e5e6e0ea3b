//! Matching git refs against `refPattern` values.
//!
//! A pattern is a regular expression in one of two forms:
//!
//! - **Short** (`env/.*`, `v[0-9]+`): tried against branches as
//!   `refs/heads/<pattern>` and then tags as `refs/tags/<pattern>`. The short
//!   name of a match is the ref without that prefix.
//! - **Full** (`refs/pull/[0-9]+/head`): starts with `refs/` and is matched
//!   against the whole ref. The short name of a match is the ref itself.
//!
//! Both forms are anchored at both ends. The pattern is wrapped in a group
//! first, so alternations such as `dev|prod` anchor as a whole.

use regex::Regex;

use crate::core::TargetError;

const HEADS_PREFIX: &str = "refs/heads/";
const TAGS_PREFIX: &str = "refs/tags/";

/// A compiled ref pattern.
///
/// # Examples
///
/// ```
/// use targetgen_cli::targets::RefMatcher;
///
/// let matcher = RefMatcher::new("env/.*")?;
/// assert_eq!(matcher.matches("refs/heads/env/dev").as_deref(), Some("env/dev"));
/// assert_eq!(matcher.matches("refs/heads/main"), None);
/// # Ok::<(), targetgen_cli::core::TargetError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RefMatcher {
    pattern: String,
    kind: MatcherKind,
}

#[derive(Debug, Clone)]
enum MatcherKind {
    Full(Regex),
    Short {
        heads: Regex,
        tags: Regex,
    },
}

fn compile(pattern: &str, anchored: &str) -> Result<Regex, TargetError> {
    Regex::new(anchored).map_err(|e| TargetError::PatternError {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

impl RefMatcher {
    /// Compile `pattern`.
    pub fn new(pattern: &str) -> Result<Self, TargetError> {
        let kind = if pattern.starts_with("refs/") {
            MatcherKind::Full(compile(pattern, &format!("^(?:{pattern})$"))?)
        } else {
            MatcherKind::Short {
                heads: compile(pattern, &format!("^{}(?:{pattern})$", regex::escape(HEADS_PREFIX)))?,
                tags: compile(pattern, &format!("^{}(?:{pattern})$", regex::escape(TAGS_PREFIX)))?,
            }
        };

        Ok(Self {
            pattern: pattern.to_string(),
            kind,
        })
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Match a full ref name, returning its short name on success.
    #[must_use]
    pub fn matches(&self, git_ref: &str) -> Option<String> {
        match &self.kind {
            MatcherKind::Full(re) => re.is_match(git_ref).then(|| git_ref.to_string()),
            MatcherKind::Short {
                heads,
                tags,
            } => {
                if heads.is_match(git_ref) {
                    git_ref.strip_prefix(HEADS_PREFIX).map(ToString::to_string)
                } else if tags.is_match(git_ref) {
                    git_ref.strip_prefix(TAGS_PREFIX).map(ToString::to_string)
                } else {
                    None
                }
            }
        }
    }
}

/// One-shot form of [`RefMatcher`]: `(matched, short_name)`.
///
/// `short_name` is empty when nothing matched.
pub fn match_ref(git_ref: &str, pattern: &str) -> Result<(bool, String), TargetError> {
    let matcher = RefMatcher::new(pattern)?;
    Ok(match matcher.matches(git_ref) {
        Some(short) => (true, short),
        None => (false, String::new()),
    })
}
