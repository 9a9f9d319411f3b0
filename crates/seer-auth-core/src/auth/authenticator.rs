//! Login/verify/retry state machine.
//!
//! `authenticate` first tries the persisted session. If the service doesn't
//! accept it, up to [`MAX_LOGIN_ATTEMPTS`] rounds of acquire credentials,
//! log in and verify follow. `verify` and `login` are single protocol steps
//! and never retry on their own.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::{
    CredentialOrigin, CredentialProvider, CredentialSource, Credentials, Environment,
    FileSessionStore, PromptHint, Session, SessionStore, VerifyResult,
};
use crate::api::{HttpTransport, Transport, TransportError};
use crate::config::AuthPaths;
use crate::console::{Console, TerminalConsole};
use crate::error::{AuthError, Result};

/// Login rounds allowed in one `authenticate` run
pub const MAX_LOGIN_ATTEMPTS: u32 = 3;

const LOGIN_PATH: &str = "/auth/login";
const VERIFY_PATH: &str = "/auth/verify";

const RETRY_NOTICE: &str = "Login error, please re-enter your email and password.";

const RESET_GUIDANCE: &str = "Login failed. Please check your email and password, \
or go to app.seermedical.com to reset your password.";

/// Credentials carried from one login attempt to the next.
///
/// After a failed attempt the password is always dropped. The email survives
/// only when the user just typed it. A caller-supplied email is offered as the
/// prompt default for the first round only.
#[derive(Debug, Clone, Default)]
pub struct AttemptState {
    attempt: u32,
    email: Option<String>,
    password: Option<String>,
    email_origin: Option<CredentialOrigin>,
}

impl AttemptState {
    /// Seed the first attempt with whatever the caller supplied
    pub fn new(email: Option<String>, password: Option<String>) -> Self {
        let email = email.filter(|e| !e.is_empty());
        let password = password.filter(|p| !p.is_empty());
        Self {
            attempt: 0,
            email_origin: email.as_ref().map(|_| CredentialOrigin::Caller),
            email,
            password,
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn begin_attempt(&mut self) {
        self.attempt = (self.attempt + 1).min(MAX_LOGIN_ATTEMPTS);
    }

    pub fn is_last_attempt(&self) -> bool {
        self.attempt >= MAX_LOGIN_ATTEMPTS
    }

    /// Both halves present, so no acquisition is needed this round
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.email, &self.password, self.email_origin) {
            (Some(email), Some(password), Some(origin)) => {
                Some(Credentials::new(email.clone(), password.clone(), origin))
            }
            _ => None,
        }
    }

    /// Email to offer as the prompt default: one typed last round, or the
    /// caller's on the first round
    pub fn retained_email(&self) -> Option<&str> {
        match self.email_origin {
            Some(CredentialOrigin::Prompt | CredentialOrigin::Caller) => self.email.as_deref(),
            _ => None,
        }
    }

    pub fn adopt(&mut self, credentials: &Credentials) {
        self.email = Some(credentials.email.clone()).filter(|e| !e.is_empty());
        self.password = Some(credentials.password().to_string()).filter(|p| !p.is_empty());
        self.email_origin = Some(credentials.origin);
    }

    /// State for the next round after a failed one
    pub fn after_failure(self) -> Self {
        let keep_email = matches!(self.email_origin, Some(CredentialOrigin::Prompt));
        Self {
            attempt: self.attempt,
            email: if keep_email { self.email } else { None },
            password: None,
            email_origin: if keep_email { self.email_origin } else { None },
        }
    }
}

/// Result of one verify round trip that reached the server.
enum VerifyOutcome {
    /// Active, with a replacement cookie if the server rolled the session
    Active(Option<Session>),
    Inactive,
}

pub struct SessionAuthenticator<T, S, C> {
    api_url: String,
    environment: Environment,
    transport: T,
    store: S,
    credentials: C,
    console: Arc<dyn Console>,
    session: Session,
}

impl SessionAuthenticator<HttpTransport, FileSessionStore, CredentialSource> {
    /// Authenticator on the real network, the per-user session directory and
    /// the terminal. `hint` should be shared by every authenticator in the
    /// process so the credentials-file tip appears only once.
    pub fn with_defaults(
        api_url: &str,
        environment: Environment,
        hint: Arc<PromptHint>,
    ) -> Result<Self> {
        let paths = AuthPaths::from_home()?;
        let console: Arc<dyn Console> = Arc::new(TerminalConsole);
        let credentials = CredentialSource::new(paths.credentials_file(), console.clone(), hint);
        Self::new(
            api_url,
            environment,
            HttpTransport::new()?,
            FileSessionStore::new(paths.session_dir()),
            credentials,
            console,
        )
    }
}

impl<T, S, C> SessionAuthenticator<T, S, C>
where
    T: Transport,
    S: SessionStore,
    C: CredentialProvider,
{
    pub fn new(
        api_url: &str,
        environment: Environment,
        transport: T,
        store: S,
        credentials: C,
        console: Arc<dyn Console>,
    ) -> Result<Self> {
        Ok(Self {
            api_url: validate_api_url(api_url)?,
            environment,
            transport,
            store,
            credentials,
            console,
            session: Session::new(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Current in-memory session (empty until authenticated)
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        !self.session.is_empty()
    }

    /// Load the persisted session for this environment into memory without
    /// contacting the service
    pub fn restore(&mut self) -> &Session {
        self.session = self.store.read(self.environment);
        &self.session
    }

    /// Establish an authenticated session, reusing the persisted one when the
    /// service still accepts it.
    pub async fn authenticate(
        &mut self,
        email: Option<String>,
        password: Option<String>,
    ) -> Result<Session> {
        self.restore();
        debug!(
            environment = %self.environment,
            has_session = !self.session.is_empty(),
            "Starting authentication"
        );

        let mut responded = false;
        let mut last_transport_error: Option<TransportError> = None;

        match self.check(&self.session).await {
            Ok(VerifyOutcome::Active(refreshed)) => return Ok(self.accept(refreshed)),
            Ok(VerifyOutcome::Inactive) => {
                // The server rejected the saved session; it is of no further use
                if !self.session.is_empty() {
                    responded = true;
                    self.clear_session();
                }
            }
            Err(e) => {
                // Unverified, not rejected: keep the saved slot
                warn!(error = %e, "Could not reach API to verify saved session");
                last_transport_error = Some(e);
            }
        }

        let mut state = AttemptState::new(email, password);
        loop {
            state.begin_attempt();

            let credentials = match state.credentials() {
                Some(credentials) => credentials,
                None => {
                    let credentials = self.credentials.acquire(state.retained_email())?;
                    state.adopt(&credentials);
                    credentials
                }
            };

            self.console.notice(&format!(
                "Logging in as {} (attempt {} of {})...",
                credentials.email,
                state.attempt(),
                MAX_LOGIN_ATTEMPTS
            ));

            let mut round_responded = false;
            match self.try_login(&credentials).await {
                Ok(session) => {
                    round_responded = true;
                    self.session = session;
                }
                Err(e) => {
                    warn!(error = %e, attempt = state.attempt(), "Login request failed");
                    self.session.clear();
                    last_transport_error = Some(e);
                }
            }

            match self.check(&self.session).await {
                Ok(VerifyOutcome::Active(refreshed)) => return Ok(self.accept(refreshed)),
                Ok(VerifyOutcome::Inactive) => {
                    if !self.session.is_empty() {
                        round_responded = true;
                    }
                }
                Err(e) => {
                    warn!(error = %e, attempt = state.attempt(), "Verify request failed");
                    last_transport_error = Some(e);
                }
            }

            // Only a server answer can invalidate what is on disk
            if round_responded {
                responded = true;
                self.clear_session();
            } else {
                self.session.clear();
            }

            if state.is_last_attempt() {
                self.console.notice(RESET_GUIDANCE);
                info!(attempts = state.attempt(), "Authentication failed");
                return Err(match (responded, last_transport_error) {
                    (false, Some(e)) => AuthError::Transport(e),
                    _ => AuthError::AuthenticationFailed,
                });
            }

            self.console.notice(RETRY_NOTICE);
            state = state.after_failure();
        }
    }

    /// Ask the service whether `session` is still accepted.
    /// An empty session is `Inactive` without any request.
    pub async fn verify(&self, session: &Session) -> VerifyResult {
        match self.check(session).await {
            Ok(VerifyOutcome::Active(_)) => VerifyResult::Active,
            Ok(VerifyOutcome::Inactive) => VerifyResult::Inactive,
            Err(e) => {
                warn!(error = %e, "Verify request failed");
                VerifyResult::Unreachable
            }
        }
    }

    /// Exchange credentials for a new session and persist it. A rejected
    /// login yields an empty session, not an error.
    pub async fn login(&mut self, credentials: &Credentials) -> Session {
        self.session = match self.try_login(credentials).await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Login request failed");
                Session::new()
            }
        };
        self.session.clone()
    }

    /// Forget the session for `environment`, on disk and in memory. Idempotent.
    pub fn destroy_session(&mut self, environment: Environment) {
        self.store.remove(environment);
        self.session.clear();
        debug!(%environment, "Session destroyed");
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn try_login(
        &self,
        credentials: &Credentials,
    ) -> std::result::Result<Session, TransportError> {
        let fields = [
            ("email", credentials.email.as_str()),
            ("password", credentials.password()),
        ];
        let response = self
            .transport
            .post_form(&self.endpoint(LOGIN_PATH), &fields)
            .await?;
        debug!(status = response.status, "Login response");

        if !response.is_ok() || response.cookies.is_empty() {
            return Ok(Session::new());
        }

        match Session::from_response_cookies(&response.cookies) {
            Some(session) => {
                self.store.write(self.environment, &session);
                Ok(session)
            }
            None => {
                debug!("Login response carried no session cookie");
                Ok(Session::new())
            }
        }
    }

    async fn check(
        &self,
        session: &Session,
    ) -> std::result::Result<VerifyOutcome, TransportError> {
        if session.is_empty() {
            return Ok(VerifyOutcome::Inactive);
        }

        let response = self.transport.get(&self.endpoint(VERIFY_PATH), session).await?;
        if !response.is_ok() {
            debug!(status = response.status, "API verify call returned non-OK status");
            return Ok(VerifyOutcome::Inactive);
        }

        if let Err(e) = active_session(response.body.as_ref()) {
            debug!(error = %e, "API verify call did not return an active session");
            return Ok(VerifyOutcome::Inactive);
        }

        Ok(VerifyOutcome::Active(session.refreshed_from(&response.cookies)))
    }

    /// Adopt a verified session and persist it so the next run can skip login
    fn accept(&mut self, refreshed: Option<Session>) -> Session {
        if let Some(session) = refreshed {
            self.session = session;
        }
        self.store.write(self.environment, &self.session);
        self.console.notice("Login successful");
        info!(environment = %self.environment, "Authenticated");
        self.session.clone()
    }

    fn clear_session(&mut self) {
        self.session.clear();
        self.store.remove(self.environment);
    }
}

fn active_session(body: Option<&Value>) -> Result<()> {
    let body = body.ok_or_else(|| AuthError::InvalidResponse("missing or non-JSON body".into()))?;
    match body.get("session").and_then(Value::as_str) {
        Some("active") => Ok(()),
        Some(other) => Err(AuthError::InvalidResponse(format!("session is '{}'", other))),
        None => Err(AuthError::InvalidResponse("no session field".into())),
    }
}

fn validate_api_url(api_url: &str) -> Result<String> {
    let invalid = |reason: &str| AuthError::InvalidApiUrl {
        url: api_url.to_string(),
        reason: reason.to_string(),
    };

    let parsed = reqwest::Url::parse(api_url.trim()).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if parsed.cannot_be_a_base() || parsed.host_str().is_none() {
        return Err(invalid("not a base URL"));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid("must not carry a query or fragment"));
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

// ============================================================================
// Tests
// ============================================================================
