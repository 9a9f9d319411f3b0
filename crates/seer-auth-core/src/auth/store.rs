use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use super::{Environment, Session};

/// Result of a best-effort persistence attempt. A skipped write is never an
/// error for the caller; the session simply isn't cached for next time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Persisted,
    Skipped(String),
}

/// Per-environment slot for the session cookie between process runs.
pub trait SessionStore: Send + Sync {
    /// Persisted session, or an empty one if nothing usable is stored
    fn read(&self, environment: Environment) -> Session;

    fn write(&self, environment: Environment, session: &Session) -> PersistOutcome;

    /// Remove the slot; no-op when nothing is stored
    fn remove(&self, environment: Environment);
}

impl<T: SessionStore + ?Sized> SessionStore for std::sync::Arc<T> {
    fn read(&self, environment: Environment) -> Session {
        (**self).read(environment)
    }

    fn write(&self, environment: Environment, session: &Session) -> PersistOutcome {
        (**self).write(environment, session)
    }

    fn remove(&self, environment: Environment) {
        (**self).remove(environment)
    }
}

/// JSON files under a per-user directory, one per environment.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn session_path(&self, environment: Environment) -> PathBuf {
        self.dir.join(environment.slot_name())
    }

    /// Write to a sibling temp file and rename it over the target, so a
    /// concurrent reader sees either the old or the new content.
    fn write_atomic(&self, path: &Path, contents: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp_path = self
            .dir
            .join(format!(".{}.{}.tmp", file_name, std::process::id()));

        let result = (|| -> std::io::Result<()> {
            let mut file = std::fs::File::create(&tmp_path)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
            }

            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
            std::fs::rename(&tmp_path, path)
        })();

        if result.is_err() {
            let _ = std::fs::remove_file(&tmp_path);
        }
        result
    }
}

impl SessionStore for FileSessionStore {
    fn read(&self, environment: Environment) -> Session {
        let path = self.session_path(environment);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(_) => return Session::new(),
        };

        match serde_json::from_str::<Session>(contents.trim()) {
            Ok(session) => {
                debug!(path = %path.display(), %environment, "Session loaded");
                session
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unparsable session file");
                Session::new()
            }
        }
    }

    fn write(&self, environment: Environment, session: &Session) -> PersistOutcome {
        let path = self.session_path(environment);
        let contents = match serde_json::to_string(session) {
            Ok(contents) => contents,
            Err(e) => return PersistOutcome::Skipped(e.to_string()),
        };

        match self.write_atomic(&path, &contents) {
            Ok(()) => {
                debug!(path = %path.display(), %environment, "Session saved");
                PersistOutcome::Persisted
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to save session");
                PersistOutcome::Skipped(e.to_string())
            }
        }
    }

    fn remove(&self, environment: Environment) {
        let path = self.session_path(environment);
        match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), %environment, "Session removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove session"),
        }
    }
}

/// In-memory store, for tests and for embedding without touching disk.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<Environment, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a session already stored for `environment`
    pub fn with_session(environment: Environment, session: Session) -> Self {
        let store = Self::new();
        store.write(environment, &session);
        store
    }

    pub fn contains(&self, environment: Environment) -> bool {
        self.sessions
            .lock()
            .map(|sessions| sessions.contains_key(&environment))
            .unwrap_or(false)
    }
}

impl SessionStore for MemorySessionStore {
    fn read(&self, environment: Environment) -> Session {
        self.sessions
            .lock()
            .ok()
            .and_then(|sessions| sessions.get(&environment).cloned())
            .unwrap_or_default()
    }

    fn write(&self, environment: Environment, session: &Session) -> PersistOutcome {
        match self.sessions.lock() {
            Ok(mut sessions) => {
                sessions.insert(environment, session.clone());
                PersistOutcome::Persisted
            }
            Err(e) => PersistOutcome::Skipped(e.to_string()),
        }
    }

    fn remove(&self, environment: Environment) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.remove(&environment);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
