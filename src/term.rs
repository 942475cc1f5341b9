//! Terminal interaction: questions, hidden input, and progress spinners.

use anyhow::{bail, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use crate::error::ConfigError;

/// What the commit flow needs from the person at the keyboard.
pub trait Console {
    /// Ask a question and return the trimmed answer line.
    fn prompt_input(&self, prompt: &str) -> Result<String>;

    /// Read a secret without echoing it. `Ok(None)` when input is not interactive.
    /// Cancelling at the prompt is a `ConfigError::Cancelled`.
    fn prompt_secret(&self, prompt: &str) -> Result<Option<String>>;
}

/// `Console` on the process's stdin/stdout.
pub struct StdConsole;

impl Console for StdConsole {
    fn prompt_input(&self, prompt: &str) -> Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;

        let mut buf = String::new();
        if io::stdin().read_line(&mut buf)? == 0 {
            bail!("stdin closed while waiting for an answer");
        }
        Ok(buf.trim().to_string())
    }

    fn prompt_secret(&self, prompt: &str) -> Result<Option<String>> {
        if !io::stdin().is_terminal() {
            return Ok(None);
        }

        eprint!("{prompt}");
        io::stderr().flush()?;

        terminal::enable_raw_mode()?;
        let read = read_hidden_line();
        terminal::disable_raw_mode()?;
        eprintln!();

        match read? {
            Some(secret) => Ok(Some(secret)),
            None => Err(ConfigError::Cancelled.into()),
        }
    }
}

/// Collect key presses until Enter. Esc or Ctrl-C cancels with `Ok(None)`.
fn read_hidden_line() -> Result<Option<String>> {
    let mut secret = String::new();

    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Enter => return Ok(Some(secret)),
            KeyCode::Esc => return Ok(None),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(None),
            KeyCode::Backspace => {
                secret.pop();
            }
            KeyCode::Char(c) => secret.push(c),
            _ => {}
        }
    }
}

/// A stderr spinner for blocking network calls. Hidden when stderr is not a terminal.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
