//! Passcode storage
//!
//! The lock only ever sees the [`PasscodeRepository`] contract. How the
//! passcode is kept (hashed file, keychain, secure element) is up to the
//! implementation; there is a single passcode per repository.

mod file;
mod memory;

pub use file::FileRepository;
pub use memory::MemoryRepository;

use crate::error::RepositoryError;
use crate::passcode::Passcode;

/// Persists and verifies the stored passcode
pub trait PasscodeRepository {
    /// Whether a passcode is currently stored
    fn has_passcode(&self) -> bool;

    /// Store a passcode, replacing any previous one
    fn save_passcode(&mut self, passcode: &Passcode) -> Result<(), RepositoryError>;

    /// Remove the stored passcode (no-op if none is stored)
    fn delete_passcode(&mut self) -> Result<(), RepositoryError>;

    /// Compare an entry with the stored passcode
    ///
    /// Returns `Ok(false)` when nothing is stored.
    fn verify_passcode(&self, passcode: &Passcode) -> Result<bool, RepositoryError>;
}

impl<R: PasscodeRepository + ?Sized> PasscodeRepository for Box<R> {
    fn has_passcode(&self) -> bool {
        (**self).has_passcode()
    }

    fn save_passcode(&mut self, passcode: &Passcode) -> Result<(), RepositoryError> {
        (**self).save_passcode(passcode)
    }

    fn delete_passcode(&mut self) -> Result<(), RepositoryError> {
        (**self).delete_passcode()
    }

    fn verify_passcode(&self, passcode: &Passcode) -> Result<bool, RepositoryError> {
        (**self).verify_passcode(passcode)
    }
}
