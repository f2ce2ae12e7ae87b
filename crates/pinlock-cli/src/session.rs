//! Terminal passcode session
//!
//! Keys come from a [`KeySource`]: [`RawKeys`] reads an interactive terminal
//! in raw mode so digits are never echoed, [`LineKeys`] reads piped input
//! line by line. The [`TerminalPresenter`] is the lock's delegate and renders
//! progress.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use pinlock_core::{LockDelegate, PasscodeLock, PasscodeRepository, PasscodeState};

/// Key that removes the last digit
pub const REMOVE_KEY: char = '-';
/// Key that clears the whole entry
pub const REMOVE_ALL_KEY: char = '*';
/// Key that requests biometric authentication
pub const BIOMETRIC_KEY: char = 'b';
/// Key that asks for passcode recovery
pub const FORGOT_KEY: char = 'f';
/// Key that cancels a cancellable session
pub const CANCEL_KEY: char = 'q';

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Succeeded,
    Cancelled,
    Interrupted,
    EndOfInput,
}

/// One user action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKey {
    Sign(char),
    Remove,
    RemoveAll,
    Biometric,
    Forgot,
    Cancel,
    Interrupt,
}

/// Map a typed character to an action
pub fn key_from_char(c: char) -> Option<SessionKey> {
    match c {
        REMOVE_KEY => Some(SessionKey::Remove),
        REMOVE_ALL_KEY => Some(SessionKey::RemoveAll),
        BIOMETRIC_KEY => Some(SessionKey::Biometric),
        FORGOT_KEY => Some(SessionKey::Forgot),
        CANCEL_KEY => Some(SessionKey::Cancel),
        c if c.is_whitespace() => None,
        c => Some(SessionKey::Sign(c)),
    }
}

/// Map a terminal key event to an action
pub fn key_from_event(key: KeyEvent) -> Option<SessionKey> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('d') => Some(SessionKey::Interrupt),
            KeyCode::Char('u') => Some(SessionKey::RemoveAll),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Backspace => Some(SessionKey::Remove),
        KeyCode::Delete => Some(SessionKey::RemoveAll),
        KeyCode::Esc => Some(SessionKey::Cancel),
        KeyCode::Char(c) => key_from_char(c),
        _ => None,
    }
}

/// Source of user actions
pub trait KeySource {
    /// Next action, or `None` once input is exhausted
    fn next_key(&mut self) -> Result<Option<SessionKey>>;

    /// Line terminator the presenter should use
    fn line_ending(&self) -> &'static str {
        "\n"
    }
}

/// Keys from buffered input, one line at a time
pub struct LineKeys<I> {
    input: I,
    pending: VecDeque<char>,
}

impl<I: BufRead> LineKeys<I> {
    pub fn new(input: I) -> Self {
        Self {
            input,
            pending: VecDeque::new(),
        }
    }
}

impl<I: BufRead> KeySource for LineKeys<I> {
    fn next_key(&mut self) -> Result<Option<SessionKey>> {
        loop {
            while let Some(c) = self.pending.pop_front() {
                if let Some(key) = key_from_char(c) {
                    return Ok(Some(key));
                }
            }

            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .context("Failed to read input")?;
            if read == 0 {
                return Ok(None);
            }
            self.pending.extend(line.chars());
        }
    }
}

/// Keys from the terminal in raw mode; restores the terminal on drop
pub struct RawKeys {
    _private: (),
}

impl RawKeys {
    pub fn enable() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw terminal mode")?;
        Ok(Self { _private: () })
    }
}

impl Drop for RawKeys {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            tracing::warn!("Failed to restore terminal mode: {}", e);
        }
    }
}

impl KeySource for RawKeys {
    fn next_key(&mut self) -> Result<Option<SessionKey>> {
        loop {
            if let Event::Key(key) = event::read().context("Failed to read terminal event")? {
                if let Some(key) = key_from_event(key) {
                    return Ok(Some(key));
                }
            }
        }
    }

    // Raw mode disables output post-processing
    fn line_ending(&self) -> &'static str {
        "\r\n"
    }
}

/// Delegate that renders the lock to a writer
pub struct TerminalPresenter<W: Write> {
    out: W,
    line_ending: &'static str,
    passcode_length: usize,
    filled: usize,
    succeeded: bool,
    failures: u32,
    forgot_requests: u32,
    write_error: Option<io::Error>,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W, passcode_length: usize) -> Self {
        Self {
            out,
            line_ending: "\n",
            passcode_length,
            filled: 0,
            succeeded: false,
            failures: 0,
            forgot_requests: 0,
            write_error: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn forgot_requests(&self) -> u32 {
        self.forgot_requests
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn set_line_ending(&mut self, line_ending: &'static str) {
        self.line_ending = line_ending;
    }

    /// First write error since the last call
    pub fn take_write_error(&mut self) -> Option<io::Error> {
        self.write_error.take()
    }

    /// Print the header for a state
    pub fn show_state(&mut self, state: &PasscodeState) {
        self.line(state.title());
        if !state.description().is_empty() {
            self.line(state.description());
        }
        self.filled = 0;
    }

    fn render_placeholders(&mut self) {
        let dots: Vec<&str> = (0..self.passcode_length)
            .map(|i| if i < self.filled { "●" } else { "○" })
            .collect();
        self.line(&format!("[ {} ]", dots.join(" ")));
    }

    /// Write one line, keeping the first failure for the session loop
    fn line(&mut self, text: &str) {
        if self.write_error.is_some() {
            return;
        }
        let result = write!(self.out, "{}{}", text, self.line_ending).and_then(|()| self.out.flush());
        if let Err(e) = result {
            self.write_error = Some(e);
        }
    }
}

impl<W: Write> LockDelegate for TerminalPresenter<W> {
    fn did_succeed(&mut self) {
        self.succeeded = true;
        self.filled = 0;
        self.line("✓ Accepted");
    }

    fn did_fail(&mut self) {
        self.failures += 1;
        self.filled = 0;
        self.line("✗ Incorrect passcode");
    }

    fn did_change_state(&mut self, state: &PasscodeState) {
        self.show_state(state);
    }

    fn added_sign_at_index(&mut self, index: usize) {
        self.filled = index + 1;
        self.render_placeholders();
    }

    fn removed_sign_at_index(&mut self, index: usize) {
        self.filled = index;
        self.render_placeholders();
    }

    fn input_after_failure(&mut self) {
        self.render_placeholders();
    }

    fn forgot_passcode(&mut self) {
        self.forgot_requests += 1;
        self.line("To recover, remove the passcode store and run `pinlock set`.");
    }
}

/// Drive `lock` from `keys` until it succeeds, is cancelled, or input ends
pub fn run_session<R, W, K>(
    lock: &mut PasscodeLock<R>,
    presenter: &Rc<RefCell<TerminalPresenter<W>>>,
    mut keys: K,
) -> Result<SessionEnd>
where
    R: PasscodeRepository,
    W: Write + 'static,
    K: KeySource,
{
    presenter.borrow_mut().set_line_ending(keys.line_ending());
    lock.set_delegate(presenter);
    presenter.borrow_mut().show_state(lock.state());
    lock.on_appear();

    let end = loop {
        check_output(presenter)?;
        if presenter.borrow().succeeded() {
            break SessionEnd::Succeeded;
        }

        let Some(key) = keys.next_key()? else {
            break SessionEnd::EndOfInput;
        };

        match key {
            SessionKey::Sign(sign) => lock.add_sign(sign),
            SessionKey::Remove => lock.remove_sign(),
            SessionKey::RemoveAll => lock.remove_all_signs(),
            SessionKey::Biometric => lock.authenticate_with_biometrics(),
            SessionKey::Forgot => lock.forgot_passcode(),
            SessionKey::Cancel => {
                if lock.state().is_cancellable_action() {
                    break SessionEnd::Cancelled;
                }
                tracing::warn!("This step cannot be cancelled");
            }
            SessionKey::Interrupt => break SessionEnd::Interrupted,
        }
    };

    lock.clean();
    Ok(end)
}

fn check_output<W: Write>(presenter: &Rc<RefCell<TerminalPresenter<W>>>) -> Result<()> {
    match presenter.borrow_mut().take_write_error() {
        Some(e) => Err(e).context("Failed to write to the terminal"),
        None => Ok(()),
    }
}
