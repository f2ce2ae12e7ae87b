//! Pinlock CLI - set, change, remove, and verify a device passcode
//!
//! On a terminal, keys are read in raw mode so digits are never echoed:
//! Backspace removes the last digit, Delete or Ctrl-U clears the entry,
//! `b` asks for biometric authentication, `f` prints recovery help, and Esc
//! or `q` cancels where allowed. Piped input is read one line at a time with
//! `-` for Backspace and `*` for Delete.

use std::cell::RefCell;
use std::io;
use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::terminal::disable_raw_mode;
use crossterm::tty::IsTty;
use pinlock_core::{
    FileRepository, LockConfig, LockMode, NoBiometrics, PasscodeLock, PasscodeRepository,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod session;

use session::{run_session, LineKeys, RawKeys, SessionEnd, TerminalPresenter};

/// Pinlock - numeric passcode lock
#[derive(Parser)]
#[command(name = "pinlock")]
#[command(about = "Set, change, remove, and verify a numeric passcode")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the lock configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the passcode store
    #[arg(long)]
    store: Option<PathBuf>,

    /// Override the configured passcode length
    #[arg(long)]
    length: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether a passcode is set
    Status,

    /// Choose a passcode for the first time
    Set,

    /// Verify the current passcode, then choose a new one
    Change,

    /// Verify the current passcode, then delete it
    Remove,

    /// Verify the current passcode
    Verify,
}

fn main() -> ExitCode {
    // Restore the terminal if a raw-mode session panics
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        original_hook(panic_info);
    }));

    // Logs go to stderr so they never mix with the lock display
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pinlock=info")))
        .init();

    match run(Cli::parse()) {
        Ok(SessionEnd::Succeeded) => ExitCode::SUCCESS,
        Ok(end) => {
            info!("Session ended without success: {:?}", end);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<SessionEnd> {
    let mut config = match &cli.config {
        Some(path) => LockConfig::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => LockConfig::load_default().context("Failed to load default config")?,
    };
    if let Some(length) = cli.length {
        config.passcode_length = length;
    }
    config.validate()?;

    let store = cli.store.unwrap_or_else(FileRepository::default_path);
    let repository = FileRepository::open(&store)
        .with_context(|| format!("Failed to open passcode store {:?}", store))?;

    match cli.command {
        Commands::Status => {
            show_status(&repository, &config);
            Ok(SessionEnd::Succeeded)
        }
        Commands::Set => {
            if repository.has_passcode() {
                bail!("A passcode is already set - use `pinlock change` to replace it");
            }
            let (end, _) = drive(LockMode::SetPasscode, config, repository)?;
            Ok(end)
        }
        Commands::Change => {
            require_passcode(&repository)?;
            let (end, repository) = drive(LockMode::EnterPasscode, config.clone(), repository)?;
            if end != SessionEnd::Succeeded {
                return Ok(end);
            }
            let (end, _) = drive(LockMode::ChangePasscode, config, repository)?;
            Ok(end)
        }
        Commands::Remove => {
            require_passcode(&repository)?;
            let (end, _) = drive(LockMode::RemovePasscode, config, repository)?;
            Ok(end)
        }
        Commands::Verify => {
            require_passcode(&repository)?;
            let (end, _) = drive(LockMode::EnterPasscode, config, repository)?;
            Ok(end)
        }
    }
}

/// Run one interactive session and hand the repository back
fn drive<R: PasscodeRepository>(
    mode: LockMode,
    config: LockConfig,
    repository: R,
) -> Result<(SessionEnd, R)> {
    let length = config.passcode_length;
    let mut lock = PasscodeLock::new(mode, config, repository)?.with_biometrics(NoBiometrics);
    let presenter = Rc::new(RefCell::new(TerminalPresenter::new(io::stdout(), length)));

    let stdin = io::stdin();
    let end = if stdin.is_tty() {
        run_session(&mut lock, &presenter, RawKeys::enable()?)?
    } else {
        run_session(&mut lock, &presenter, LineKeys::new(stdin.lock()))?
    };
    info!("{:?} session finished: {:?}", mode, end);

    Ok((end, lock.into_repository()))
}

fn require_passcode(repository: &FileRepository) -> Result<()> {
    if !repository.has_passcode() {
        bail!("No passcode is set - run `pinlock set` first");
    }
    Ok(())
}

fn show_status(repository: &FileRepository, config: &LockConfig) {
    println!("Store:            {}", repository.path().display());
    println!(
        "Passcode set:     {}",
        if repository.has_passcode() { "yes" } else { "no" }
    );
    if let Some(updated_at) = repository.updated_at() {
        println!("Last changed:     {}", updated_at.to_rfc3339());
    }
    println!("Passcode length:  {}", config.passcode_length);
    println!(
        "Biometrics:       {}",
        if config.biometrics_allowed { "allowed" } else { "off" }
    );
}
