#![no_main]

use std::cell::RefCell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pinlock_core::{
    BiometricOutcome, EventLog, LockConfig, LockEvent, LockMode, MemoryRepository, Passcode,
    PasscodeLock, ScriptedBiometrics,
};

#[derive(Debug, Arbitrary)]
enum Op {
    Sign(char),
    Remove,
    RemoveAll,
    Forgot,
    Clean,
    Biometric(bool),
    Foreground,
    Background,
}

#[derive(Debug, Arbitrary)]
struct Input {
    length: u8,
    mode: u8,
    biometrics_allowed: bool,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let length = (input.length % 8) as usize + 1;
    let mode = match input.mode % 4 {
        0 => LockMode::EnterPasscode,
        1 => LockMode::SetPasscode,
        2 => LockMode::ChangePasscode,
        _ => LockMode::RemovePasscode,
    };

    let config = LockConfig {
        passcode_length: length,
        biometrics_allowed: input.biometrics_allowed,
        request_biometrics_immediately: true,
        biometric_reason: None,
    };
    let stored = Passcode::parse(&"7".repeat(length)).unwrap();
    let mut lock = PasscodeLock::new(mode, config, MemoryRepository::with_passcode(stored))
        .unwrap()
        .with_biometrics(ScriptedBiometrics::default());
    let log = Rc::new(RefCell::new(EventLog::new()));
    lock.set_delegate(&log);

    for op in input.ops {
        let outcomes_before = outcome_count(&log.borrow());
        let clears = matches!(op, Op::RemoveAll);
        match op {
            Op::Sign(c) => lock.add_sign(c),
            Op::Remove => lock.remove_sign(),
            Op::RemoveAll => lock.remove_all_signs(),
            Op::Forgot => lock.forgot_passcode(),
            Op::Clean => lock.clean(),
            Op::Biometric(ok) => lock.handle_biometric_outcome(if ok {
                BiometricOutcome::Success
            } else {
                BiometricOutcome::Failure
            }),
            Op::Foreground => lock.on_foreground(),
            Op::Background => lock.on_background(),
        }

        // The buffer never holds a complete entry
        assert!(lock.entered_len() < length);

        if clears {
            assert_eq!(lock.entered_len(), 0);
        }

        // Any judged attempt leaves the buffer empty
        if outcome_count(&log.borrow()) > outcomes_before {
            assert_eq!(lock.entered_len(), 0);
        }
    }
});

fn outcome_count(log: &EventLog) -> usize {
    log.events()
        .iter()
        .filter(|e| matches!(e, LockEvent::Succeeded | LockEvent::Failed))
        .count()
}
