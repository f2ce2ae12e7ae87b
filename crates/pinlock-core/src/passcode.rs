//! Passcode values
//!
//! A passcode is a non-empty string of ASCII digits. Its contents are wiped
//! from memory on drop and never printed by `Debug`.

use std::fmt;

use zeroize::Zeroizing;

use crate::error::PasscodeError;

/// Check whether a character is an acceptable passcode sign
pub fn is_sign(c: char) -> bool {
    c.is_ascii_digit()
}

/// A complete digits-only passcode
#[derive(Clone, PartialEq, Eq)]
pub struct Passcode(Zeroizing<String>);

impl Passcode {
    /// Parse a passcode from a string of digits
    pub fn parse(digits: &str) -> Result<Self, PasscodeError> {
        if digits.is_empty() {
            return Err(PasscodeError::Empty);
        }

        if let Some(c) = digits.chars().find(|c| !is_sign(*c)) {
            return Err(PasscodeError::NonDigit(c));
        }

        Ok(Self(Zeroizing::new(digits.to_owned())))
    }

    /// Build a passcode from already validated signs
    pub(crate) fn from_signs(signs: &[char]) -> Self {
        Self(Zeroizing::new(signs.iter().collect()))
    }

    /// The digits as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The digits as bytes (for hashing)
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Number of digits
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Passcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Passcode(<{} digits>)", self.len())
    }
}
