//! Child name value object
//!
//! Names come straight from a form field, so they are sanitized before use:
//! anything other than letters, spaces, hyphens and apostrophes is dropped,
//! whitespace is collapsed and every word is title-cased.
//!
//! # Examples
//!
//! ```
//! use domain::ChildName;
//!
//! let name = ChildName::new("  mary-jane  o'brien!! ").unwrap();
//! assert_eq!(name.as_str(), "Mary-Jane O'Brien");
//!
//! assert!(ChildName::new("1234").is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::DomainError;

/// Maximum length of a child name, in characters
pub const MAX_CHILD_NAME_CHARS: u64 = 40;

/// A sanitized, title-cased child name (1-40 characters)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
#[serde(try_from = "String", into = "String")]
pub struct ChildName {
    #[validate(length(min = 1, max = 40))]
    value: String,
}

impl ChildName {
    /// Sanitize and validate a raw name
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidChildName`] if nothing usable remains
    /// after sanitizing or the result exceeds 40 characters.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let candidate = Self {
            value: sanitize(raw.as_ref()),
        };

        candidate.validate().map_err(|_| {
            if candidate.value.is_empty() {
                DomainError::InvalidChildName("name must contain at least one letter".to_string())
            } else {
                DomainError::InvalidChildName(format!(
                    "name must be at most {MAX_CHILD_NAME_CHARS} characters"
                ))
            }
        })?;

        Ok(candidate)
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

fn sanitize(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_alphabetic() || c.is_whitespace() || *c == '-' || *c == '\'')
        .collect();

    let collapsed = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    title_case(collapsed.trim_matches(|c| c == '-' || c == '\'' || c == ' '))
}

/// Upper-case every letter that follows a non-letter, lower-case the rest
fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut previous_is_letter = false;
    for c in input.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                push_mapped(&mut out, c, c.to_lowercase());
            } else {
                push_mapped(&mut out, c, c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }
    out
}

/// Push the case mapping of `c`, or `c` itself when the mapping would
/// introduce anything other than letters (e.g. combining marks)
fn push_mapped(out: &mut String, c: char, mapped: impl Iterator<Item = char> + Clone) {
    if mapped.clone().all(char::is_alphabetic) {
        out.extend(mapped);
    } else {
        out.push(c);
    }
}

impl fmt::Display for ChildName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl TryFrom<String> for ChildName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChildName> for String {
    fn from(name: ChildName) -> Self {
        name.value
    }
}
