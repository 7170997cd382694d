use std::fmt;
use thiserror::Error;

/// A token could not be turned into the requested type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}: {reason}")]
pub struct ConversionError {
    expected: &'static str,
    reason: String,
}

impl ConversionError {
    pub fn new(expected: &'static str, reason: impl fmt::Display) -> Self {
        Self {
            expected,
            reason: reason.to_string(),
        }
    }

    /// Name of the type the token was converted into.
    pub fn expected(&self) -> &str {
        self.expected
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Errors recorded while matching tokens to entries.
///
/// `UnrecognizedKey` is only a diagnostic. Every other variant is attached to
/// the entry it concerns and fails the parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unrecognised commandline argument: {key}")]
    UnrecognizedKey { key: String },

    #[error("Invalid argument, could not convert \"{raw}\" for {keys} ({help}): {source}")]
    Conversion {
        raw: String,
        keys: String,
        help: String,
        source: ConversionError,
    },

    #[error("No value provided for: {key}")]
    MissingValue { key: String },

    #[error("No (implicit) value provided for: {key}")]
    MissingImplicitValue { key: String },

    #[error("Argument missing: {keys} ({help})")]
    MissingArgument { keys: String, help: String },
}

/// Every entry error of a failed parse, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseErrors(Vec<ParseError>);

impl ParseErrors {
    pub(crate) fn new(errors: Vec<ParseError>) -> Self {
        Self(errors)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParseError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[ParseError] {
        &self.0
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParseErrors {
    type Item = &'a ParseError;
    type IntoIter = std::slice::Iter<'a, ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
