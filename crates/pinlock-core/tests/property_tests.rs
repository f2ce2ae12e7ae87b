//! Property-based tests for pinlock-core using proptest
//!
//! These tests verify invariants of the lock that should hold for every
//! passcode length and every sequence of inputs.

use std::cell::RefCell;
use std::rc::Rc;

use pinlock_core::{
    EventLog, LockConfig, LockEvent, LockMode, MemoryRepository, Passcode, PasscodeLock,
    PasscodeRepository, StateKind,
};
use proptest::prelude::*;

// ============================================
// Strategies
// ============================================

/// Passcode length and a matching passcode
fn arb_length_and_passcode() -> impl Strategy<Value = (usize, String)> {
    (1usize..=12).prop_flat_map(|len| {
        let digits = prop::collection::vec(0u8..10, len)
            .prop_map(|ds| ds.into_iter().map(|d| char::from(b'0' + d)).collect::<String>());
        (Just(len), digits)
    })
}

#[derive(Debug, Clone)]
enum Input {
    Add(char),
    Remove,
}

fn arb_input() -> impl Strategy<Value = Input> {
    prop_oneof![
        3 => (0u8..10).prop_map(|d| Input::Add(char::from(b'0' + d))),
        1 => Just(Input::Remove),
    ]
}

fn enter_lock(
    length: usize,
    stored: &str,
) -> (PasscodeLock<MemoryRepository>, Rc<RefCell<EventLog>>) {
    let repository = MemoryRepository::with_passcode(Passcode::parse(stored).unwrap());
    let config = LockConfig::with_passcode_length(length);
    let mut lock = PasscodeLock::new(LockMode::EnterPasscode, config, repository).unwrap();
    let log = Rc::new(RefCell::new(EventLog::new()));
    lock.set_delegate(&log);
    (lock, log)
}

fn is_outcome(event: &LockEvent) -> bool {
    matches!(event, LockEvent::Succeeded | LockEvent::Failed)
}

// ============================================
// Properties
// ============================================

proptest! {
    /// Typing the stored passcode succeeds exactly once and empties the buffer
    #[test]
    fn prop_correct_entry_succeeds_once((length, digits) in arb_length_and_passcode()) {
        let (mut lock, log) = enter_lock(length, &digits);

        for sign in digits.chars() {
            lock.add_sign(sign);
        }

        let log = log.borrow();
        prop_assert_eq!(log.count(&LockEvent::Succeeded), 1);
        prop_assert_eq!(log.count(&LockEvent::Failed), 0);
        prop_assert_eq!(lock.entered_len(), 0);
    }

    /// Without reaching the passcode length, no entry is ever judged
    #[test]
    fn prop_partial_entries_never_judged(
        (length, digits) in arb_length_and_passcode(),
        inputs in prop::collection::vec(arb_input(), 0..64),
    ) {
        let (mut lock, log) = enter_lock(length, &digits);

        for input in inputs {
            match input {
                Input::Add(sign) => {
                    // Skip any sign that would complete the entry
                    if lock.entered_len() + 1 < length {
                        lock.add_sign(sign);
                    }
                }
                Input::Remove => lock.remove_sign(),
            }
            prop_assert!(lock.entered_len() < length);
        }

        let log = log.borrow();
        prop_assert!(!log.events().iter().any(is_outcome));
        prop_assert!(!log.events().iter().any(|e| matches!(e, LockEvent::PasscodeEntered(_))));
    }

    /// The buffer never exceeds the passcode length and is empty after every judged entry
    #[test]
    fn prop_buffer_cleared_after_each_attempt(
        (length, digits) in arb_length_and_passcode(),
        inputs in prop::collection::vec(arb_input(), 0..128),
    ) {
        let (mut lock, log) = enter_lock(length, &digits);

        for input in inputs {
            let before = log.borrow().events().iter().filter(|e| is_outcome(e)).count();
            match input {
                Input::Add(sign) => lock.add_sign(sign),
                Input::Remove => lock.remove_sign(),
            }
            let after = log.borrow().events().iter().filter(|e| is_outcome(e)).count();

            prop_assert!(lock.entered_len() < length);
            if after > before {
                prop_assert_eq!(lock.entered_len(), 0);
            }
        }
        prop_assert_eq!(lock.state().kind(), StateKind::Enter);
    }

    /// One PasscodeEntered per completed buffer, carrying exactly what was typed
    #[test]
    fn prop_passcode_entered_matches_typed(
        (length, stored) in arb_length_and_passcode(),
        typed in prop::collection::vec(0u8..10, 0..48),
    ) {
        let (mut lock, log) = enter_lock(length, &stored);
        let typed: String = typed.into_iter().map(|d| char::from(b'0' + d)).collect();

        for sign in typed.chars() {
            lock.add_sign(sign);
        }

        let entered: Vec<String> = log
            .borrow()
            .events()
            .iter()
            .filter_map(|e| match e {
                LockEvent::PasscodeEntered(p) => Some(p.clone()),
                _ => None,
            })
            .collect();

        let expected: Vec<String> = typed
            .as_bytes()
            .chunks_exact(length)
            .map(|chunk| String::from_utf8(chunk.to_vec()).unwrap())
            .collect();

        prop_assert_eq!(entered, expected);
        prop_assert_eq!(lock.entered_len(), typed.len() % length);
    }

    /// A mismatched confirmation never touches the stored passcode
    #[test]
    fn prop_confirm_mismatch_keeps_store(
        (length, first) in arb_length_and_passcode(),
        second_seed in any::<u64>(),
    ) {
        let stored = "0".repeat(length);
        let repository = MemoryRepository::with_passcode(Passcode::parse(&stored).unwrap());
        let config = LockConfig::with_passcode_length(length);
        let mut lock = PasscodeLock::new(LockMode::SetPasscode, config, repository).unwrap();

        // Derive a second entry that differs from the first in its last digit
        let mut second: Vec<char> = first.chars().collect();
        let last = second[length - 1].to_digit(10).unwrap() as u64;
        let shifted = (last + 1 + second_seed % 9) % 10;
        second[length - 1] = char::from_digit(shifted as u32, 10).unwrap();

        for sign in first.chars().chain(second.into_iter()) {
            lock.add_sign(sign);
        }

        prop_assert_eq!(lock.state().kind(), StateKind::Set);
        prop_assert!(lock.repository().verify_passcode(&Passcode::parse(&stored).unwrap()).unwrap());
    }
}
