//! Display text for the lock states

pub const ENTER_TITLE: &str = "Enter Passcode";
pub const ENTER_DESCRIPTION: &str = "Enter your passcode to proceed.";

pub const SET_TITLE: &str = "Enter a New Passcode";
pub const SET_DESCRIPTION: &str = "Enter a passcode to protect this device.";

pub const CONFIRM_TITLE: &str = "Confirm Passcode";
pub const CONFIRM_DESCRIPTION: &str = "Enter the passcode again.";

pub const MISMATCH_TITLE: &str = "Try Again";
pub const MISMATCH_DESCRIPTION: &str = "Passcodes didn't match.";

/// Prompt shown by the platform biometric dialog when none is configured
pub const BIOMETRIC_REASON: &str = "Authentication required to proceed";
