//! Prompt markers: the textual patterns watched for in process output.

use std::fmt;

use regex::Regex;

/// A marker matched against buffered process output.
///
/// Plain substrings cover the common case (`"Password:"`, `"senha:"`);
/// regex is available for prompts whose wording varies. End-of-stream and
/// timeout are not markers: they are implicit sentinel outcomes handled by
/// the automaton itself.
#[derive(Clone)]
pub enum Marker {
    /// Match an exact substring.
    Substring(String),
    /// Match a regular expression.
    Regex(CompiledRegex),
}

impl Marker {
    /// Create a substring marker.
    #[must_use]
    pub fn substring(s: impl Into<String>) -> Self {
        Self::Substring(s.into())
    }

    /// Create a regex marker.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regex.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(pattern)?;
        Ok(Self::Regex(CompiledRegex {
            pattern: pattern.to_string(),
            regex,
        }))
    }

    /// The marker's source text, for display.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Substring(s) => s,
            Self::Regex(r) => &r.pattern,
        }
    }

    /// Find the first occurrence of this marker in `text`.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<MarkerMatch> {
        match self {
            Self::Substring(s) => text.find(s.as_str()).map(|pos| MarkerMatch {
                start: pos,
                end: pos + s.len(),
            }),
            Self::Regex(r) => r.regex.find(text).map(|m| MarkerMatch {
                start: m.start(),
                end: m.end(),
            }),
        }
    }
}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Substring(s) => write!(f, "Substring({s:?})"),
            Self::Regex(r) => write!(f, "Regex({:?})", r.pattern),
        }
    }
}

impl From<&str> for Marker {
    fn from(s: &str) -> Self {
        Self::Substring(s.to_string())
    }
}

impl From<String> for Marker {
    fn from(s: String) -> Self {
        Self::Substring(s)
    }
}

/// A compiled regular expression with its source pattern.
#[derive(Clone)]
pub struct CompiledRegex {
    pattern: String,
    regex: Regex,
}

impl CompiledRegex {
    /// The source pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// Position of a marker occurrence within the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerMatch {
    /// Start byte offset of the match.
    pub start: usize,
    /// End byte offset of the match.
    pub end: usize,
}

impl MarkerMatch {
    /// Slice the matched text out of the original input.
    #[must_use]
    pub fn as_str<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}
