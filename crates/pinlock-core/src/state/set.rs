//! Set passcode state

use crate::passcode::Passcode;
use crate::text;

use super::{ConfirmPasscodeState, Transition};

/// Collects a new passcode and hands it to a confirm state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetPasscodeState {
    title: String,
    description: String,
}

impl SetPasscodeState {
    /// First-time setup
    pub fn new() -> Self {
        Self::with_text(text::SET_TITLE, text::SET_DESCRIPTION)
    }

    /// Replacement of an existing passcode
    pub fn for_new() -> Self {
        Self::with_text(text::SET_TITLE, "")
    }

    /// Retry after the confirmation did not match
    pub fn mismatch() -> Self {
        Self::with_text(text::MISMATCH_TITLE, text::MISMATCH_DESCRIPTION)
    }

    pub fn with_text(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_cancellable_action(&self) -> bool {
        true
    }

    pub fn is_biometric_allowed(&self) -> bool {
        false
    }

    /// Any complete entry moves on to confirmation
    pub fn accept(&self, entered: Passcode) -> Transition {
        Transition::move_to(ConfirmPasscodeState::new(entered))
    }
}

impl Default for SetPasscodeState {
    fn default() -> Self {
        Self::new()
    }
}
