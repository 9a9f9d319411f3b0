use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::console::Console;
use crate::error::{AuthError, Result};

/// Where a set of credentials came from. Decides whether the email may be
/// carried over to the next login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialOrigin {
    /// Passed in by the caller of `authenticate`
    Caller,
    /// Read from the per-user credentials file
    File,
    /// Typed at the interactive prompt
    Prompt,
}

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    password: String,
    pub origin: CredentialOrigin,
}

impl Credentials {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        origin: CredentialOrigin,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            origin,
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("origin", &self.origin)
            .finish()
    }
}

/// Process-scoped record of whether the credentials-file hint was shown.
/// Share one instance (via `Arc`) between every source in the process.
#[derive(Debug, Default)]
pub struct PromptHint {
    shown: AtomicBool,
}

impl PromptHint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true exactly once: the first time it is called
    pub fn take(&self) -> bool {
        !self.shown.swap(true, Ordering::SeqCst)
    }

    pub fn was_shown(&self) -> bool {
        self.shown.load(Ordering::SeqCst)
    }
}

/// Supplies an email/password pair for one login attempt.
pub trait CredentialProvider: Send + Sync {
    /// `retained_email` is the address typed at the previous attempt, if any,
    /// offered so the user is not asked for it twice.
    fn acquire(&self, retained_email: Option<&str>) -> Result<Credentials>;
}

impl<T: CredentialProvider + ?Sized> CredentialProvider for Arc<T> {
    fn acquire(&self, retained_email: Option<&str>) -> Result<Credentials> {
        (**self).acquire(retained_email)
    }
}

/// Credentials file first, interactive prompt otherwise.
pub struct CredentialSource {
    credentials_path: PathBuf,
    console: Arc<dyn Console>,
    hint: Arc<PromptHint>,
}

impl CredentialSource {
    pub fn new(
        credentials_path: PathBuf,
        console: Arc<dyn Console>,
        hint: Arc<PromptHint>,
    ) -> Self {
        Self {
            credentials_path,
            console,
            hint,
        }
    }

    /// Read the two-line credentials file. `Ok(None)` when it does not exist.
    pub fn read_file(path: &Path) -> Result<Option<Credentials>> {
        if !path.is_file() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path).map_err(|source| AuthError::CredentialsIo {
            path: path.to_path_buf(),
            source,
        })?;

        let lines: Vec<&str> = contents.lines().collect();
        if lines.len() < 2 {
            return Err(AuthError::MalformedCredentialsFile {
                path: path.to_path_buf(),
                lines: lines.len(),
            });
        }

        debug!(path = %path.display(), "Using credentials file");
        Ok(Some(Credentials::new(
            lines[0].trim_end(),
            lines[1].trim_end(),
            CredentialOrigin::File,
        )))
    }

    fn prompt(&self, retained_email: Option<&str>) -> Result<Credentials> {
        if self.hint.take() {
            self.console.notice(&format!(
                "Tip: put your email and password on two lines in {} to skip this prompt.",
                self.credentials_path.display()
            ));
        }

        let email = match retained_email {
            Some(previous) if !previous.is_empty() => {
                let input = self
                    .console
                    .read_line(&format!("Email Address [{}]: ", previous))
                    .map_err(AuthError::Prompt)?;
                let input = input.trim();
                if input.is_empty() {
                    previous.to_string()
                } else {
                    input.to_string()
                }
            }
            _ => self
                .console
                .read_line("Email Address: ")
                .map_err(AuthError::Prompt)?
                .trim()
                .to_string(),
        };

        let password = self
            .console
            .read_secret("Password: ")
            .map_err(AuthError::Prompt)?;

        Ok(Credentials::new(email, password, CredentialOrigin::Prompt))
    }
}

impl CredentialProvider for CredentialSource {
    fn acquire(&self, retained_email: Option<&str>) -> Result<Credentials> {
        match Self::read_file(&self.credentials_path)? {
            Some(credentials) => Ok(credentials),
            None => self.prompt(retained_email),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
