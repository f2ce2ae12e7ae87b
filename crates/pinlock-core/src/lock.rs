//! Passcode lock orchestrator
//!
//! [`PasscodeLock`] owns the active state, the entry buffer, the repository,
//! and the optional biometric authenticator. Every operation runs to
//! completion on the calling thread; delegate notifications are delivered
//! synchronously before the operation returns.
//!
//! The delegate is held weakly. Dropping it silences the lock without
//! affecting its behavior.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use zeroize::{Zeroize, Zeroizing};

use crate::biometric::{BiometricAuthenticator, BiometricOutcome};
use crate::config::LockConfig;
use crate::delegate::LockDelegate;
use crate::error::Result;
use crate::passcode::{is_sign, Passcode};
use crate::repository::PasscodeRepository;
use crate::state::{Outcome, PasscodeState, StorageEffect, Transition};

/// Passcode state machine
pub struct PasscodeLock<R: PasscodeRepository> {
    /// Static policy
    config: LockConfig,
    /// Passcode storage
    repository: R,
    /// Active state
    state: PasscodeState,
    /// Signs typed since the last completed entry
    signs: Zeroizing<Vec<char>>,
    /// Notification receiver
    delegate: Option<Weak<RefCell<dyn LockDelegate>>>,
    /// Platform biometric prompt
    biometrics: Option<Box<dyn BiometricAuthenticator>>,
    /// Cleared when the app goes to the background
    should_try_biometrics: bool,
    /// Set by a failed attempt, cleared by the next key press
    failed_last_attempt: bool,
}

impl<R: PasscodeRepository> PasscodeLock<R> {
    /// Create a lock in the given state (or [`LockMode`](crate::LockMode))
    pub fn new(initial: impl Into<PasscodeState>, config: LockConfig, repository: R) -> Result<Self> {
        config.validate()?;

        let signs = Zeroizing::new(Vec::with_capacity(config.passcode_length));

        Ok(Self {
            config,
            repository,
            state: initial.into(),
            signs,
            delegate: None,
            biometrics: None,
            should_try_biometrics: true,
            failed_last_attempt: false,
        })
    }

    /// Install a biometric authenticator
    pub fn with_biometrics(mut self, biometrics: impl BiometricAuthenticator + 'static) -> Self {
        self.biometrics = Some(Box::new(biometrics));
        self
    }

    /// Register the delegate (held weakly)
    pub fn set_delegate<D: LockDelegate + 'static>(&mut self, delegate: &Rc<RefCell<D>>) {
        let shared: Rc<RefCell<dyn LockDelegate>> = delegate.clone();
        self.delegate = Some(Rc::downgrade(&shared));
    }

    pub fn clear_delegate(&mut self) {
        self.delegate = None;
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    pub fn state(&self) -> &PasscodeState {
        &self.state
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn into_repository(self) -> R {
        self.repository
    }

    pub fn passcode_length(&self) -> usize {
        self.config.passcode_length
    }

    /// Number of signs typed so far
    pub fn entered_len(&self) -> usize {
        self.signs.len()
    }

    /// Biometrics are allowed by both the policy and the active state
    pub fn is_biometric_allowed(&self) -> bool {
        self.config.biometrics_allowed && self.state.is_biometric_allowed()
    }

    /// Append a digit; judge the entry once it is complete
    pub fn add_sign(&mut self, sign: char) {
        if !is_sign(sign) {
            tracing::warn!("Ignoring non-digit sign");
            return;
        }

        self.consume_failure_flag();

        self.signs.push(sign);
        let index = self.signs.len() - 1;
        self.notify(|d| d.added_sign_at_index(index));

        if self.signs.len() >= self.config.passcode_length {
            let entered = Passcode::from_signs(&self.signs);
            self.signs.zeroize();

            self.notify(|d| d.passcode_entered(entered.as_str()));

            let transition = self.state.accept(entered, &self.repository);
            self.apply(transition);
        }
    }

    /// Remove the last digit, if any
    pub fn remove_sign(&mut self) {
        self.consume_failure_flag();

        if self.signs.pop().is_some() {
            let index = self.signs.len();
            self.notify(|d| d.removed_sign_at_index(index));
        }
    }

    /// Remove every digit, notifying each removal from the last one down
    pub fn remove_all_signs(&mut self) {
        while !self.signs.is_empty() {
            self.remove_sign();
        }
    }

    /// Forward a passcode recovery request to the delegate
    pub fn forgot_passcode(&mut self) {
        self.consume_failure_flag();
        self.notify(|d| d.forgot_passcode());
    }

    /// Drop the partial entry without per-digit notifications
    pub fn clean(&mut self) {
        self.signs.zeroize();
    }

    /// Replace the active state
    pub fn change_state_to(&mut self, state: impl Into<PasscodeState>) {
        self.state = state.into();
        tracing::debug!(kind = ?self.state.kind(), "Passcode lock changed state");

        self.notify(|d| d.did_change_state(&self.state));
    }

    /// Prompt for biometrics if the policy and the state allow it
    pub fn authenticate_with_biometrics(&mut self) {
        if !self.is_biometric_allowed() {
            tracing::debug!("Biometric authentication not allowed in this state");
            return;
        }

        let reason = self.config.biometric_reason().to_owned();
        let Some(biometrics) = self.biometrics.as_mut() else {
            tracing::debug!("No biometric authenticator installed");
            return;
        };

        let outcome = biometrics.authenticate(&reason);
        self.handle_biometric_outcome(outcome);
    }

    /// React to the terminal result of a biometric prompt
    ///
    /// Platforms that finish the prompt asynchronously call this on the
    /// thread that drives the lock. Only `Success` has an effect.
    pub fn handle_biometric_outcome(&mut self, outcome: BiometricOutcome) {
        if outcome != BiometricOutcome::Success {
            tracing::debug!(?outcome, "Biometric authentication did not succeed");
            return;
        }

        // The state may have changed while the prompt was up
        if !self.is_biometric_allowed() {
            return;
        }

        if let Some(transition) = self.state.biometric_transition() {
            self.clean();
            self.apply(transition);
        }
    }

    /// The lock became visible
    pub fn on_appear(&mut self) {
        if self.should_try_biometrics {
            self.request_biometrics_if_immediate();
        }
    }

    /// The app returned to the foreground
    pub fn on_foreground(&mut self) {
        self.request_biometrics_if_immediate();
    }

    /// The app moved to the background
    pub fn on_background(&mut self) {
        self.should_try_biometrics = false;
    }

    fn request_biometrics_if_immediate(&mut self) {
        if self.config.request_biometrics_immediately && self.is_biometric_allowed() {
            self.authenticate_with_biometrics();
        }
    }

    /// Apply a transition: storage effect, then state change, then outcome
    fn apply(&mut self, transition: Transition) {
        let Transition {
            effect,
            next_state,
            outcome,
        } = transition;

        if let Some(effect) = effect {
            let result = match &effect {
                StorageEffect::Save(passcode) => self.repository.save_passcode(passcode),
                StorageEffect::Delete => self.repository.delete_passcode(),
            };

            if let Err(e) = result {
                tracing::error!("Passcode storage update failed: {}", e);
                self.report_failure();
                return;
            }
        }

        if let Some(state) = next_state {
            self.change_state_to(state);
        }

        match outcome {
            Some(Outcome::Succeeded) => self.notify(|d| d.did_succeed()),
            Some(Outcome::Failed) => self.report_failure(),
            None => {}
        }
    }

    fn report_failure(&mut self) {
        self.failed_last_attempt = true;
        self.notify(|d| d.did_fail());
    }

    fn consume_failure_flag(&mut self) {
        if std::mem::take(&mut self.failed_last_attempt) {
            self.notify(|d| d.input_after_failure());
        }
    }

    fn notify(&self, f: impl FnOnce(&mut dyn LockDelegate)) {
        let Some(delegate) = self.delegate.as_ref().and_then(Weak::upgrade) else {
            return;
        };

        // A delegate borrowed by its owner cannot be re-entered
        match delegate.try_borrow_mut() {
            Ok(mut delegate) => f(&mut *delegate),
            Err(_) => tracing::warn!("Lock delegate is busy; dropping notification"),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegate::{EventLog, LockEvent};
    use crate::repository::MemoryRepository;
    use crate::state::LockMode;

    fn lock_with_log(mode: LockMode) -> (PasscodeLock<MemoryRepository>, Rc<RefCell<EventLog>>) {
        let repository = MemoryRepository::with_passcode(Passcode::parse("1234").unwrap());
        let mut lock = PasscodeLock::new(mode, LockConfig::default(), repository).unwrap();
        let log = Rc::new(RefCell::new(EventLog::new()));
        lock.set_delegate(&log);
        (lock, log)
    }

    #[test]
    fn test_zero_length_config_rejected() {
        let config = LockConfig::with_passcode_length(0);
        assert!(PasscodeLock::new(LockMode::EnterPasscode, config, MemoryRepository::new()).is_err());
    }

    #[test]
    fn test_oversized_length_rejected() {
        for length in [crate::config::MAX_PASSCODE_LENGTH + 1, usize::MAX] {
            let config = LockConfig::with_passcode_length(length);
            let result = PasscodeLock::new(LockMode::EnterPasscode, config, MemoryRepository::new());
            assert!(matches!(
                result,
                Err(crate::error::LockError::Config(
                    crate::error::ConfigError::InvalidPasscodeLength(_)
                ))
            ));
        }

        let config = LockConfig::with_passcode_length(crate::config::MAX_PASSCODE_LENGTH);
        let lock = PasscodeLock::new(LockMode::EnterPasscode, config, MemoryRepository::new());
        assert!(lock.is_ok());
    }

    #[test]
    fn test_non_digit_sign_ignored() {
        let (mut lock, log) = lock_with_log(LockMode::EnterPasscode);
        lock.add_sign('x');
        lock.add_sign(' ');
        assert_eq!(lock.entered_len(), 0);
        assert!(log.borrow().events().is_empty());
    }

    #[test]
    fn test_remove_sign_on_empty_buffer() {
        let (mut lock, log) = lock_with_log(LockMode::EnterPasscode);
        lock.remove_sign();
        assert_eq!(lock.entered_len(), 0);
        assert!(log.borrow().events().is_empty());
    }

    #[test]
    fn test_add_then_remove_indices() {
        let (mut lock, log) = lock_with_log(LockMode::EnterPasscode);
        lock.add_sign('1');
        lock.add_sign('2');
        lock.remove_sign();
        lock.remove_sign();

        assert_eq!(
            log.borrow().events(),
            [
                LockEvent::SignAdded(0),
                LockEvent::SignAdded(1),
                LockEvent::SignRemoved(1),
                LockEvent::SignRemoved(0),
            ]
        );
    }

    #[test]
    fn test_clean_is_silent() {
        let (mut lock, log) = lock_with_log(LockMode::EnterPasscode);
        lock.add_sign('1');
        lock.add_sign('2');
        log.borrow_mut().take();

        lock.clean();
        assert_eq!(lock.entered_len(), 0);
        assert!(log.borrow().events().is_empty());
    }

    #[test]
    fn test_success_clears_buffer() {
        struct Recorder {
            seen: Vec<&'static str>,
        }
        impl LockDelegate for Recorder {
            fn did_succeed(&mut self) {
                self.seen.push("succeeded");
            }
        }

        let repository = MemoryRepository::with_passcode(Passcode::parse("12").unwrap());
        let config = LockConfig::with_passcode_length(2);
        let mut lock = PasscodeLock::new(LockMode::EnterPasscode, config, repository).unwrap();
        let recorder = Rc::new(RefCell::new(Recorder { seen: Vec::new() }));
        lock.set_delegate(&recorder);

        lock.add_sign('1');
        lock.add_sign('2');

        assert_eq!(recorder.borrow().seen, ["succeeded"]);
        assert_eq!(lock.entered_len(), 0);
    }

    #[test]
    fn test_dropped_delegate_is_skipped() {
        let (mut lock, log) = lock_with_log(LockMode::EnterPasscode);
        drop(log);

        for sign in "1234".chars() {
            lock.add_sign(sign);
        }
        assert_eq!(lock.entered_len(), 0);
    }

    #[test]
    fn test_change_state_notifies() {
        let (mut lock, log) = lock_with_log(LockMode::EnterPasscode);
        lock.change_state_to(LockMode::SetPasscode);

        assert_eq!(lock.state().kind(), crate::state::StateKind::Set);
        assert_eq!(
            log.borrow().events(),
            [LockEvent::StateChanged(crate::state::StateKind::Set)]
        );
    }

    #[test]
    fn test_remove_all_signs_notifies_each() {
        let (mut lock, log) = lock_with_log(LockMode::EnterPasscode);
        lock.add_sign('1');
        lock.add_sign('2');
        lock.add_sign('3');
        log.borrow_mut().take();

        lock.remove_all_signs();

        assert_eq!(lock.entered_len(), 0);
        assert_eq!(
            log.borrow().events(),
            [
                LockEvent::SignRemoved(2),
                LockEvent::SignRemoved(1),
                LockEvent::SignRemoved(0),
            ]
        );

        // Nothing to remove
        lock.remove_all_signs();
        assert_eq!(log.borrow().events().len(), 3);
    }

    #[test]
    fn test_first_input_after_failure_reported_once() {
        let (mut lock, log) = lock_with_log(LockMode::EnterPasscode);
        for sign in "0000".chars() {
            lock.add_sign(sign);
        }
        log.borrow_mut().take();

        lock.add_sign('1');
        lock.add_sign('2');

        assert_eq!(
            log.borrow().events(),
            [
                LockEvent::InputAfterFailure,
                LockEvent::SignAdded(0),
                LockEvent::SignAdded(1),
            ]
        );
    }

    #[test]
    fn test_remove_after_failure_reports_input() {
        let (mut lock, log) = lock_with_log(LockMode::EnterPasscode);
        for sign in "0000".chars() {
            lock.add_sign(sign);
        }
        log.borrow_mut().take();

        // Buffer is already empty, the key press still counts
        lock.remove_sign();
        lock.remove_sign();

        assert_eq!(log.borrow().events(), [LockEvent::InputAfterFailure]);
    }

    #[test]
    fn test_no_input_after_failure_without_failure() {
        let (mut lock, log) = lock_with_log(LockMode::EnterPasscode);
        for sign in "1234".chars() {
            lock.add_sign(sign);
        }
        lock.add_sign('5');
        lock.forgot_passcode();

        assert_eq!(log.borrow().count(&LockEvent::InputAfterFailure), 0);
    }

    #[test]
    fn test_forgot_passcode() {
        let (mut lock, log) = lock_with_log(LockMode::EnterPasscode);
        lock.forgot_passcode();
        assert_eq!(log.borrow().events(), [LockEvent::ForgotPasscode]);

        for sign in "9999".chars() {
            lock.add_sign(sign);
        }
        log.borrow_mut().take();

        lock.forgot_passcode();
        assert_eq!(
            log.borrow().events(),
            [LockEvent::InputAfterFailure, LockEvent::ForgotPasscode]
        );
        assert_eq!(lock.state().kind(), crate::state::StateKind::Enter);
    }

    #[test]
    fn test_busy_delegate_is_skipped() {
        let (mut lock, log) = lock_with_log(LockMode::EnterPasscode);

        {
            let _held = log.borrow();
            lock.add_sign('1');
        }
        assert_eq!(lock.entered_len(), 1);
        assert!(log.borrow().events().is_empty());

        lock.add_sign('2');
        assert_eq!(log.borrow().events(), [LockEvent::SignAdded(1)]);
    }
}
