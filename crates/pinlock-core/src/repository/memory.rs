//! In-memory passcode storage

use crate::error::RepositoryError;
use crate::passcode::Passcode;

use super::PasscodeRepository;

/// Repository that keeps the passcode in process memory only
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    passcode: Option<Passcode>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_passcode(passcode: Passcode) -> Self {
        Self {
            passcode: Some(passcode),
        }
    }

    /// The stored passcode, if any
    pub fn passcode(&self) -> Option<&Passcode> {
        self.passcode.as_ref()
    }
}

impl PasscodeRepository for MemoryRepository {
    fn has_passcode(&self) -> bool {
        self.passcode.is_some()
    }

    fn save_passcode(&mut self, passcode: &Passcode) -> Result<(), RepositoryError> {
        self.passcode = Some(passcode.clone());
        Ok(())
    }

    fn delete_passcode(&mut self) -> Result<(), RepositoryError> {
        self.passcode = None;
        Ok(())
    }

    fn verify_passcode(&self, passcode: &Passcode) -> Result<bool, RepositoryError> {
        Ok(self.passcode.as_ref() == Some(passcode))
    }
}
