//! Lock states and transitions
//!
//! A lock is always in exactly one [`PasscodeState`]. When an entry is
//! complete the state inspects it and answers with a [`Transition`] value;
//! states never mutate themselves or the repository. The lock applies the
//! transition in a fixed order: storage effect, then state change, then
//! outcome notification.

mod confirm;
mod enter;
mod set;

pub use confirm::ConfirmPasscodeState;
pub use enter::EnterPasscodeState;
pub use set::SetPasscodeState;

use crate::passcode::Passcode;
use crate::repository::PasscodeRepository;

/// Discriminant of a [`PasscodeState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Enter,
    Set,
    Confirm,
}

/// The active interaction mode of a lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasscodeState {
    /// Verify the stored passcode (unlock, or remove when configured so)
    Enter(EnterPasscodeState),
    /// Collect a new passcode
    Set(SetPasscodeState),
    /// Re-enter the passcode collected by `Set`
    Confirm(ConfirmPasscodeState),
}

impl PasscodeState {
    pub fn kind(&self) -> StateKind {
        match self {
            PasscodeState::Enter(_) => StateKind::Enter,
            PasscodeState::Set(_) => StateKind::Set,
            PasscodeState::Confirm(_) => StateKind::Confirm,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            PasscodeState::Enter(state) => state.title(),
            PasscodeState::Set(state) => state.title(),
            PasscodeState::Confirm(state) => state.title(),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            PasscodeState::Enter(state) => state.description(),
            PasscodeState::Set(state) => state.description(),
            PasscodeState::Confirm(state) => state.description(),
        }
    }

    /// Whether the user may back out of this state
    pub fn is_cancellable_action(&self) -> bool {
        match self {
            PasscodeState::Enter(state) => state.is_cancellable_action(),
            PasscodeState::Set(state) => state.is_cancellable_action(),
            PasscodeState::Confirm(state) => state.is_cancellable_action(),
        }
    }

    /// Whether this state accepts biometric authentication
    pub fn is_biometric_allowed(&self) -> bool {
        match self {
            PasscodeState::Enter(state) => state.is_biometric_allowed(),
            PasscodeState::Set(state) => state.is_biometric_allowed(),
            PasscodeState::Confirm(state) => state.is_biometric_allowed(),
        }
    }

    /// Decide what a completed entry does
    pub fn accept<R>(&self, entered: Passcode, repository: &R) -> Transition
    where
        R: PasscodeRepository + ?Sized,
    {
        match self {
            PasscodeState::Enter(state) => state.accept(&entered, repository),
            PasscodeState::Set(state) => state.accept(entered),
            PasscodeState::Confirm(state) => state.accept(entered),
        }
    }

    /// Transition for a successful biometric match, if this state takes one
    pub fn biometric_transition(&self) -> Option<Transition> {
        match self {
            PasscodeState::Enter(state) if state.is_biometric_allowed() => {
                Some(state.on_match())
            }
            _ => None,
        }
    }
}

impl From<EnterPasscodeState> for PasscodeState {
    fn from(state: EnterPasscodeState) -> Self {
        PasscodeState::Enter(state)
    }
}

impl From<SetPasscodeState> for PasscodeState {
    fn from(state: SetPasscodeState) -> Self {
        PasscodeState::Set(state)
    }
}

impl From<ConfirmPasscodeState> for PasscodeState {
    fn from(state: ConfirmPasscodeState) -> Self {
        PasscodeState::Confirm(state)
    }
}

/// Entry points offered to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    /// Unlock with the stored passcode
    EnterPasscode,
    /// Choose a passcode for the first time
    SetPasscode,
    /// Choose a replacement passcode
    ChangePasscode,
    /// Verify the stored passcode, then delete it
    RemovePasscode,
}

impl LockMode {
    pub fn initial_state(self) -> PasscodeState {
        match self {
            LockMode::EnterPasscode => EnterPasscodeState::new(false).into(),
            LockMode::SetPasscode => SetPasscodeState::new().into(),
            LockMode::ChangePasscode => SetPasscodeState::for_new().into(),
            LockMode::RemovePasscode => EnterPasscodeState::for_removal().into(),
        }
    }
}

impl From<LockMode> for PasscodeState {
    fn from(mode: LockMode) -> Self {
        mode.initial_state()
    }
}

/// Result reported to the delegate after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
}

/// Repository mutation requested by a state
#[derive(Debug, PartialEq, Eq)]
pub enum StorageEffect {
    Save(Passcode),
    Delete,
}

/// What a completed entry does to the lock
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Transition {
    pub effect: Option<StorageEffect>,
    pub next_state: Option<PasscodeState>,
    pub outcome: Option<Outcome>,
}

impl Transition {
    /// No effect, no state change, no notification
    pub fn stay() -> Self {
        Self::default()
    }

    pub fn succeed() -> Self {
        Self {
            outcome: Some(Outcome::Succeeded),
            ..Self::default()
        }
    }

    pub fn fail() -> Self {
        Self {
            outcome: Some(Outcome::Failed),
            ..Self::default()
        }
    }

    pub fn move_to(state: impl Into<PasscodeState>) -> Self {
        Self::stay().then_move_to(state)
    }

    pub fn then_move_to(mut self, state: impl Into<PasscodeState>) -> Self {
        self.next_state = Some(state.into());
        self
    }

    pub fn with_effect(mut self, effect: StorageEffect) -> Self {
        self.effect = Some(effect);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LockMode::EnterPasscode, StateKind::Enter, false, true)]
    #[case(LockMode::SetPasscode, StateKind::Set, true, false)]
    #[case(LockMode::ChangePasscode, StateKind::Set, true, false)]
    #[case(LockMode::RemovePasscode, StateKind::Enter, true, true)]
    fn test_mode_initial_state(
        #[case] mode: LockMode,
        #[case] kind: StateKind,
        #[case] cancellable: bool,
        #[case] biometric: bool,
    ) {
        let state = mode.initial_state();
        assert_eq!(state.kind(), kind);
        assert_eq!(state.is_cancellable_action(), cancellable);
        assert_eq!(state.is_biometric_allowed(), biometric);
        assert!(!state.title().is_empty());
    }

    #[test]
    fn test_change_mode_has_no_description() {
        assert!(LockMode::ChangePasscode.initial_state().description().is_empty());
        assert!(!LockMode::SetPasscode.initial_state().description().is_empty());
    }

    #[test]
    fn test_biometric_transition_only_in_enter() {
        assert_eq!(
            LockMode::EnterPasscode.initial_state().biometric_transition(),
            Some(Transition::succeed())
        );
        assert_eq!(
            LockMode::RemovePasscode.initial_state().biometric_transition(),
            Some(Transition::succeed().with_effect(StorageEffect::Delete))
        );
        assert!(LockMode::SetPasscode.initial_state().biometric_transition().is_none());
    }

    #[test]
    fn test_transition_builders() {
        let transition = Transition::fail().then_move_to(SetPasscodeState::mismatch());
        assert_eq!(transition.outcome, Some(Outcome::Failed));
        assert_eq!(
            transition.next_state.map(|s| s.kind()),
            Some(StateKind::Set)
        );
        assert!(transition.effect.is_none());
        assert_eq!(Transition::stay(), Transition::default());
    }
}
