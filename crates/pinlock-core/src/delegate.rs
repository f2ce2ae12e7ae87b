//! Delegate notifications
//!
//! The presentation layer implements [`LockDelegate`] to redraw placeholders,
//! shake on failure, or dismiss on success. All methods default to no-ops.

use crate::state::{PasscodeState, StateKind};

/// Receiver of lock notifications
pub trait LockDelegate {
    /// A completed entry (or biometric match) was accepted
    fn did_succeed(&mut self) {}

    /// A completed entry was rejected
    fn did_fail(&mut self) {}

    /// The lock adopted a new state
    fn did_change_state(&mut self, _state: &PasscodeState) {}

    /// A sign was appended at `index`
    fn added_sign_at_index(&mut self, _index: usize) {}

    /// The sign at `index` was removed
    fn removed_sign_at_index(&mut self, _index: usize) {}

    /// A full entry was typed, before it is judged
    fn passcode_entered(&mut self, _passcode: &str) {}

    /// First key press after a failed attempt, before that key is handled
    fn input_after_failure(&mut self) {}

    /// The user asked for passcode recovery
    fn forgot_passcode(&mut self) {}
}

/// Notification as a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockEvent {
    Succeeded,
    Failed,
    StateChanged(StateKind),
    SignAdded(usize),
    SignRemoved(usize),
    PasscodeEntered(String),
    InputAfterFailure,
    ForgotPasscode,
}

/// Delegate that records every notification in order
///
/// Entered passcodes are kept in clear; use for tests and diagnostics only.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<LockEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[LockEvent] {
        &self.events
    }

    /// Drain the recorded events
    pub fn take(&mut self) -> Vec<LockEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn count(&self, event: &LockEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn last(&self) -> Option<&LockEvent> {
        self.events.last()
    }
}

impl LockDelegate for EventLog {
    fn did_succeed(&mut self) {
        self.events.push(LockEvent::Succeeded);
    }

    fn did_fail(&mut self) {
        self.events.push(LockEvent::Failed);
    }

    fn did_change_state(&mut self, state: &PasscodeState) {
        self.events.push(LockEvent::StateChanged(state.kind()));
    }

    fn added_sign_at_index(&mut self, index: usize) {
        self.events.push(LockEvent::SignAdded(index));
    }

    fn removed_sign_at_index(&mut self, index: usize) {
        self.events.push(LockEvent::SignRemoved(index));
    }

    fn passcode_entered(&mut self, passcode: &str) {
        self.events.push(LockEvent::PasscodeEntered(passcode.to_owned()));
    }

    fn input_after_failure(&mut self) {
        self.events.push(LockEvent::InputAfterFailure);
    }

    fn forgot_passcode(&mut self) {
        self.events.push(LockEvent::ForgotPasscode);
    }
}
