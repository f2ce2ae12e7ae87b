//! File-backed passcode storage
//!
//! Only an Argon2id hash of the passcode is written to disk. The record is
//! JSON, replaced atomically on every save and readable by the owner only.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RepositoryError;
use crate::passcode::Passcode;

use super::PasscodeRepository;

/// Current record format version
const RECORD_VERSION: u32 = 1;

/// Data directory name
const STORAGE_DIR_NAME: &str = "pinlock";

/// Record file name
const STORAGE_FILE_NAME: &str = "passcode.json";

/// Passcode record format (persisted to disk)
#[derive(Serialize, Deserialize)]
struct PasscodeRecord {
    /// Argon2id PHC string of the passcode
    hash: String,
    /// Version for future migrations
    version: u32,
    /// When the passcode was last set
    updated_at: DateTime<Utc>,
}

/// Repository storing a hashed passcode in a single file
pub struct FileRepository {
    /// Path to the record file
    path: PathBuf,
    /// Currently stored record
    record: Option<PasscodeRecord>,
}

impl FileRepository {
    /// Open the repository at the default location
    pub fn open_default() -> Result<Self, RepositoryError> {
        Self::open(Self::default_path())
    }

    /// Open (or prepare) the repository at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let record = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let record: PasscodeRecord = serde_json::from_str(&contents).map_err(|e| {
                RepositoryError::Corrupted(format!("Failed to parse passcode record: {}", e))
            })?;

            if record.version > RECORD_VERSION {
                return Err(RepositoryError::Corrupted(format!(
                    "Unsupported record version {}",
                    record.version
                )));
            }
            Some(record)
        } else {
            None
        };

        Ok(Self { path, record })
    }

    /// Get the default record path
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(STORAGE_DIR_NAME)
            .join(STORAGE_FILE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the stored passcode was last set
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.record.as_ref().map(|r| r.updated_at)
    }

    /// Write a record to file
    fn write_record(&self, record: &PasscodeRecord) -> Result<(), RepositoryError> {
        let contents = serde_json::to_string_pretty(record)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically; the rename is the last fallible step
        let temp_path = self.path.with_extension("json.tmp");
        let result = write_private(&temp_path, contents.as_bytes())
            .and_then(|()| fs::rename(&temp_path, &self.path));

        if let Err(e) = result {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove {:?}: {}", temp_path, cleanup);
                }
            }
            return Err(e.into());
        }

        Ok(())
    }
}

/// Write `contents` to a file only the owner can read (Unix)
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;

    // `mode` only applies to new files; a stale temp file keeps its own
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(contents)?;
    file.sync_all()
}

impl PasscodeRepository for FileRepository {
    fn has_passcode(&self) -> bool {
        self.record.is_some()
    }

    fn save_passcode(&mut self, passcode: &Passcode) -> Result<(), RepositoryError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(passcode.as_bytes(), &salt)
            .map_err(|e| RepositoryError::Crypto(format!("Failed to hash passcode: {}", e)))?
            .to_string();

        let record = PasscodeRecord {
            hash,
            version: RECORD_VERSION,
            updated_at: Utc::now(),
        };

        self.write_record(&record)?;
        self.record = Some(record);
        tracing::debug!("Stored passcode hash at {:?}", self.path);

        Ok(())
    }

    fn delete_passcode(&mut self) -> Result<(), RepositoryError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        self.record = None;
        tracing::debug!("Removed passcode record at {:?}", self.path);
        Ok(())
    }

    fn verify_passcode(&self, passcode: &Passcode) -> Result<bool, RepositoryError> {
        let Some(record) = &self.record else {
            return Ok(false);
        };

        let parsed_hash = PasswordHash::new(&record.hash)
            .map_err(|e| RepositoryError::Corrupted(format!("Invalid stored hash: {}", e)))?;

        // Constant-time comparison inside the verifier
        Ok(Argon2::default()
            .verify_password(passcode.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
