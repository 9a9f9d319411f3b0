//! Terminal interaction used by login: visible prompts, hidden password
//! entry, and user-facing notices.

use std::io::{self, BufRead, Write};

pub trait Console: Send + Sync {
    /// Prompt and read one line with echo on, without the line terminator
    fn read_line(&self, prompt: &str) -> io::Result<String>;

    /// Prompt and read one line with terminal echo disabled
    fn read_secret(&self, prompt: &str) -> io::Result<String>;

    /// Show a progress or guidance message to the user
    fn notice(&self, message: &str);
}

/// Console on the process's stdin/stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalConsole;

impl Console for TerminalConsole {
    fn read_line(&self, prompt: &str) -> io::Result<String> {
        let mut stderr = io::stderr();
        write!(stderr, "{}", prompt)?;
        stderr.flush()?;

        let mut input = String::new();
        let read = io::stdin().lock().read_line(&mut input)?;
        if read == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
        }
        Ok(input.trim_end_matches(['\r', '\n']).to_string())
    }

    fn read_secret(&self, prompt: &str) -> io::Result<String> {
        rpassword::prompt_password(prompt)
    }

    fn notice(&self, message: &str) {
        eprintln!("{}", message);
    }
}
