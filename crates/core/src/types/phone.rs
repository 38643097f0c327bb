//! Contact phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains a non-digit character.
    #[error("phone number must contain only digits")]
    NonDigit,
    /// The input has the wrong number of digits.
    #[error("phone number must have between {min} and {max} digits")]
    WrongLength {
        /// Minimum accepted digit count.
        min: usize,
        /// Maximum accepted digit count.
        max: usize,
    },
}

/// A WhatsApp-reachable phone number.
///
/// Listings carry the seller's number in national format with area code,
/// e.g. `81988880000`. The number is stored digits-only so it can be
/// dropped straight into a `wa.me`-style deep link.
///
/// ## Constraints
///
/// - Digits only (no `+`, spaces, or punctuation)
/// - 11 or 12 digits
///
/// ## Examples
///
/// ```
/// use carlot_core::Phone;
///
/// assert!(Phone::parse("81988880000").is_ok());
/// assert!(Phone::parse("081900000000").is_ok());
///
/// assert!(Phone::parse("").is_err());            // empty
/// assert!(Phone::parse("8198888").is_err());     // too short
/// assert!(Phone::parse("+5581988880000").is_err()); // non-digit
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Minimum number of digits.
    pub const MIN_DIGITS: usize = 11;
    /// Maximum number of digits.
    pub const MAX_DIGITS: usize = 12;

    /// Parse a `Phone` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains a non-digit
    /// character, or has fewer than 11 or more than 12 digits.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        if s.is_empty() {
            return Err(PhoneError::Empty);
        }

        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneError::NonDigit);
        }

        if s.len() < Self::MIN_DIGITS || s.len() > Self::MAX_DIGITS {
            return Err(PhoneError::WrongLength {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the number as a digits-only string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Phone` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
