//! Biometric authentication hooks
//!
//! The lock never talks to a platform biometric API directly. It is handed a
//! [`BiometricAuthenticator`] that performs the prompt (Touch ID, Face ID,
//! Windows Hello, fprintd, ...) and reports a single terminal outcome.
//! Anything other than [`BiometricOutcome::Success`] makes the lock fall back
//! to manual passcode entry without notifying its delegate.

use std::collections::VecDeque;

/// Terminal result of a biometric prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiometricOutcome {
    /// The user was recognized
    Success,
    /// The user was not recognized
    Failure,
    /// The user or the platform dismissed the prompt
    Cancelled,
    /// No biometric hardware, or nothing enrolled
    Unavailable,
}

/// Platform biometric capability
pub trait BiometricAuthenticator {
    /// Prompt the user and return the outcome
    fn authenticate(&mut self, reason: &str) -> BiometricOutcome;
}

/// Authenticator for platforms without biometric support
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBiometrics;

impl BiometricAuthenticator for NoBiometrics {
    fn authenticate(&mut self, _reason: &str) -> BiometricOutcome {
        BiometricOutcome::Unavailable
    }
}

/// Authenticator that replays queued outcomes
///
/// Once the queue is exhausted every prompt reports `Unavailable`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBiometrics {
    outcomes: VecDeque<BiometricOutcome>,
    reasons: Vec<String>,
}

impl ScriptedBiometrics {
    pub fn new(outcomes: impl IntoIterator<Item = BiometricOutcome>) -> Self {
        Self {
            outcomes: outcomes.into_iter().collect(),
            reasons: Vec::new(),
        }
    }

    /// Queue another outcome
    pub fn push(&mut self, outcome: BiometricOutcome) {
        self.outcomes.push_back(outcome);
    }

    /// Number of prompts shown so far
    pub fn prompts(&self) -> usize {
        self.reasons.len()
    }

    /// Reasons passed to each prompt, in order
    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }
}

impl BiometricAuthenticator for ScriptedBiometrics {
    fn authenticate(&mut self, reason: &str) -> BiometricOutcome {
        self.reasons.push(reason.to_owned());
        self.outcomes
            .pop_front()
            .unwrap_or(BiometricOutcome::Unavailable)
    }
}
