//! Secret values supplied to a session, kept out of logs and summaries.

use std::fmt;

/// Replacement text used when a secret is scrubbed from output.
pub const REDACTED: &str = "[REDACTED]";

/// A secret injected in response to a prompt.
///
/// The value is supplied per invocation and never persisted by the
/// automaton. `Debug` and `Display` are intentionally opaque; anything
/// destined for a log or a human-readable summary should pass through
/// [`Secret::redact`] first.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw value, for writing to the process input.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Check if the secret is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replace every occurrence of the secret in `text` with
    /// [`REDACTED`].
    ///
    /// PTYs echo injected input back into the output stream unless the
    /// prompting program disables echo, so logged output must always be
    /// scrubbed.
    #[must_use]
    pub fn redact(&self, text: &str) -> String {
        if self.0.is_empty() || !text.contains(self.0.as_str()) {
            return text.to_string();
        }
        text.replace(self.0.as_str(), REDACTED)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}
