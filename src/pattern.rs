//! PDS identifier patterns.
//!
//! An [`IdPattern`] is the user-supplied partial product identifier, e.g.
//! `HRL0000CA5C*`. It is validated up front (before any network activity) and
//! compiled to a case-insensitive matcher so catalog results can be checked
//! against it locally.
//!
//! Wildcards follow simple glob semantics:
//! - `*` matches any run of characters (including none)
//! - `?` matches exactly one character

use std::fmt;

use regex::Regex;
use thiserror::Error;

/// Errors raised while validating an identifier pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The pattern is empty or whitespace only.
    #[error("identifier pattern is empty\n  Suggestion: pass a PDS ID such as --ids 'HRL0000CA5C*'")]
    Empty,

    /// The pattern contains a character that cannot appear in a PDS identifier.
    #[error(
        "identifier pattern '{pattern}' contains invalid character {found:?}\n  Suggestion: use letters, digits, '_', '-', '.', ':' and the wildcards '*' or '?'"
    )]
    InvalidCharacter {
        /// The offending pattern.
        pattern: String,
        /// The first invalid character.
        found: char,
    },

    /// The pattern is made of wildcards only and would match the whole catalog.
    #[error(
        "identifier pattern '{pattern}' has no literal characters\n  Suggestion: include at least part of the PDS ID"
    )]
    NoLiteral {
        /// The offending pattern.
        pattern: String,
    },
}

/// A compiled glob expression, matched case-insensitively against whole strings.
#[derive(Debug, Clone)]
pub struct Glob {
    source: String,
    regex: Regex,
}

impl Glob {
    /// Compiles a glob expression.
    ///
    /// # Errors
    ///
    /// Returns the underlying regex error if the translated expression is
    /// rejected (e.g. it exceeds the regex size limit).
    pub fn new(glob: &str) -> Result<Self, regex::Error> {
        let mut expr = String::with_capacity(glob.len() * 2 + 6);
        expr.push_str("(?is)^");
        let mut buf = [0u8; 4];
        for ch in glob.chars() {
            match ch {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                other => expr.push_str(&regex::escape(other.encode_utf8(&mut buf))),
            }
        }
        expr.push('$');
        Ok(Self {
            source: glob.to_string(),
            regex: Regex::new(&expr)?,
        })
    }

    /// Returns true when `candidate` matches the whole glob.
    #[must_use]
    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }

    /// Returns the glob as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// A validated PDS identifier pattern.
#[derive(Debug, Clone)]
pub struct IdPattern {
    glob: Glob,
}

impl IdPattern {
    /// Validates and compiles a user-supplied identifier pattern.
    ///
    /// Surrounding whitespace is trimmed. The pattern must be non-empty, may
    /// only contain `A-Z a-z 0-9 _ - . :` plus the wildcards `*` and `?`, and
    /// must contain at least one literal character.
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] describing the first violated rule.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let pattern = raw.trim();
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }

        if let Some(found) = pattern.chars().find(|c| !is_allowed(*c)) {
            return Err(PatternError::InvalidCharacter {
                pattern: pattern.to_string(),
                found,
            });
        }

        if pattern.chars().all(is_wildcard) {
            return Err(PatternError::NoLiteral {
                pattern: pattern.to_string(),
            });
        }

        // Allowed characters are all ASCII, so the translated regex is always valid.
        let glob = Glob::new(pattern).map_err(|_| PatternError::InvalidCharacter {
            pattern: pattern.to_string(),
            found: '\0',
        })?;
        Ok(Self { glob })
    }

    /// Returns the pattern as sent to the catalog.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.glob.as_str()
    }

    /// Returns true when a catalog identifier matches this pattern.
    #[must_use]
    pub fn matches(&self, pds_id: &str) -> bool {
        self.glob.is_match(pds_id)
    }
}

impl fmt::Display for IdPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_wildcard(c: char) -> bool {
    matches!(c, '*' | '?')
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':') || is_wildcard(c)
}
