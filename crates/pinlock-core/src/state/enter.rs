//! Enter passcode state

use crate::passcode::Passcode;
use crate::repository::PasscodeRepository;
use crate::text;

use super::{StorageEffect, Transition};

/// Verifies an entry against the stored passcode
///
/// The same state drives the remove flow: when `remove_on_success` is set, a
/// verified entry also deletes the stored passcode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnterPasscodeState {
    allow_cancellation: bool,
    remove_on_success: bool,
}

impl EnterPasscodeState {
    pub fn new(allow_cancellation: bool) -> Self {
        Self {
            allow_cancellation,
            remove_on_success: false,
        }
    }

    /// State used to remove the stored passcode
    pub fn for_removal() -> Self {
        Self {
            allow_cancellation: true,
            remove_on_success: true,
        }
    }

    pub fn title(&self) -> &str {
        text::ENTER_TITLE
    }

    pub fn description(&self) -> &str {
        text::ENTER_DESCRIPTION
    }

    pub fn is_cancellable_action(&self) -> bool {
        self.allow_cancellation
    }

    pub fn is_biometric_allowed(&self) -> bool {
        true
    }

    pub fn removes_passcode(&self) -> bool {
        self.remove_on_success
    }

    pub fn accept<R>(&self, entered: &Passcode, repository: &R) -> Transition
    where
        R: PasscodeRepository + ?Sized,
    {
        let matched = match repository.verify_passcode(entered) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::error!("Passcode verification failed: {}", e);
                false
            }
        };

        if matched {
            self.on_match()
        } else {
            Transition::fail()
        }
    }

    /// Transition once the user is known to hold the passcode
    pub(crate) fn on_match(&self) -> Transition {
        if self.remove_on_success {
            Transition::succeed().with_effect(StorageEffect::Delete)
        } else {
            Transition::succeed()
        }
    }
}
