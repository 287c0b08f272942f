//! Textual call expressions shared by filters and mappers: `name(arg, ...)`.

use std::fmt;
use std::str::FromStr;

use crate::error::{ModelError, Result};

/// A parsed `name(arg1, arg2, ...)` expression.
///
/// The name is one or more ASCII letters or digits. Arguments are the text
/// between the outermost parentheses, split on commas and trimmed, so
/// regular expressions without commas pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Call {
    name: String,
    args: Vec<String>,
}

impl Call {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Parses a call expression.
    ///
    /// # Examples
    ///
    /// ```
    /// use elr_model::Call;
    ///
    /// let call = Call::parse("matches(patient_state, AZ|CA)").unwrap();
    /// assert_eq!(call.name(), "matches");
    /// assert_eq!(call.args(), ["patient_state", "AZ|CA"]);
    /// assert!(Call::parse("allowAll()").unwrap().args().is_empty());
    /// assert!(Call::parse("bad name()").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let malformed = || ModelError::MalformedCall(text.to_string());
        let trimmed = text.trim();
        let open = trimmed.find('(').ok_or_else(malformed)?;
        let inner = trimmed[open + 1..]
            .strip_suffix(')')
            .ok_or_else(malformed)?;
        let name = trimmed[..open].trim();
        if name.is_empty() || !name.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            return Err(malformed());
        }
        let args = if inner.trim().is_empty() {
            Vec::new()
        } else {
            inner.split(',').map(|arg| arg.trim().to_string()).collect()
        };
        Ok(Self::new(name, args))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl FromStr for Call {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args.join(", "))
    }
}
