//! Pinlock - numeric passcode lock
//!
//! This crate provides the passcode state machine and its collaborators:
//! - Passcode entry accumulation and the enter / set / confirm states
//! - Passcode storage (in-memory and Argon2id-hashed file storage)
//! - Lock configuration
//! - Optional biometric authentication hooks
//! - Delegate notifications for the presentation layer
//!
//! # Flow
//!
//! The presentation layer forwards every typed digit to
//! [`PasscodeLock::add_sign`]. Once the configured number of digits has been
//! entered, the active [`PasscodeState`] decides whether the attempt
//! succeeded, failed, or moves the lock into a new state. Every outcome is
//! reported through a [`LockDelegate`].

pub mod biometric;
pub mod config;
pub mod delegate;
pub mod error;
pub mod lock;
pub mod passcode;
pub mod repository;
pub mod state;
pub mod text;

pub use biometric::{BiometricAuthenticator, BiometricOutcome, NoBiometrics, ScriptedBiometrics};
pub use config::{LockConfig, DEFAULT_PASSCODE_LENGTH, MAX_PASSCODE_LENGTH};
pub use delegate::{EventLog, LockDelegate, LockEvent};
pub use error::{ConfigError, LockError, PasscodeError, RepositoryError, Result};
pub use lock::PasscodeLock;
pub use passcode::{is_sign, Passcode};
pub use repository::{FileRepository, MemoryRepository, PasscodeRepository};
pub use state::{
    ConfirmPasscodeState, EnterPasscodeState, LockMode, Outcome, PasscodeState,
    SetPasscodeState, StateKind, StorageEffect, Transition,
};
