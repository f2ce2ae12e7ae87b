//! Confirm passcode state

use crate::passcode::Passcode;
use crate::text;

use super::{SetPasscodeState, StorageEffect, Transition};

/// Holds the passcode from the set step until it is typed again
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPasscodeState {
    expected: Passcode,
    title: String,
    description: String,
}

impl ConfirmPasscodeState {
    pub fn new(expected: Passcode) -> Self {
        Self {
            expected,
            title: text::CONFIRM_TITLE.to_owned(),
            description: String::new(),
        }
    }

    /// Confirm state that also shows the "enter again" hint
    pub fn with_description(expected: Passcode) -> Self {
        Self {
            description: text::CONFIRM_DESCRIPTION.to_owned(),
            ..Self::new(expected)
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

    /// Save on match; start over from a mismatch set state otherwise
    pub fn accept(&self, entered: Passcode) -> Transition {
        if entered == self.expected {
            Transition::succeed().with_effect(StorageEffect::Save(entered))
        } else {
            Transition::fail().then_move_to(SetPasscodeState::mismatch())
        }
    }
}
