use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Session cookie set by the production deployment
pub const PRODUCTION_COOKIE: &str = "seer.sid";

/// Session cookie set by the development deployment
pub const DEVELOPMENT_COOKIE: &str = "seer-dev.sid";

/// Cookie names recognized as session credentials, in selection priority order.
/// Production wins when a login response carries both.
const SESSION_COOKIE_PRIORITY: [&str; 2] = [PRODUCTION_COOKIE, DEVELOPMENT_COOKIE];

/// Which deployment of the Seer API a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl Environment {
    /// File name of the persisted session slot for this deployment
    pub fn slot_name(&self) -> &'static str {
        match self {
            Environment::Production => "cookie",
            Environment::Development => "cookie-dev",
        }
    }

    pub fn default_api_url(&self) -> &'static str {
        match self {
            Environment::Production => "https://api.seermedical.com/api",
            Environment::Development => "https://api-dev.seermedical.com/api",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

/// Opaque session credential: cookie name to cookie value.
///
/// An empty session means "not logged in". Persisted as a plain JSON object,
/// e.g. `{"seer.sid":"abc"}`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session {
    cookies: BTreeMap<String, String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a session holding a single cookie
    pub fn with_cookie(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut cookies = BTreeMap::new();
        cookies.insert(name.into(), value.into());
        Self { cookies }
    }

    /// Pick the session cookie out of a login/verify response.
    ///
    /// Only recognized session cookie names are considered; the production
    /// cookie takes priority over the development one. Returns `None` when
    /// the response carried no session cookie at all.
    pub fn from_response_cookies(cookies: &[(String, String)]) -> Option<Self> {
        SESSION_COOKIE_PRIORITY.iter().find_map(|name| {
            cookies
                .iter()
                .find(|(cookie_name, value)| cookie_name == name && !value.is_empty())
                .map(|(cookie_name, value)| Self::with_cookie(cookie_name.clone(), value.clone()))
        })
    }

    /// Replacement for this session from a rolled `Set-Cookie`.
    ///
    /// Only cookies already held by the session are taken, so a verify
    /// response can never switch the session to another deployment's cookie.
    pub fn refreshed_from(&self, cookies: &[(String, String)]) -> Option<Self> {
        let mut refreshed = self.clone();
        let mut changed = false;
        for (name, value) in cookies {
            if value.is_empty() {
                continue;
            }
            if let Some(current) = refreshed.cookies.get_mut(name) {
                if current != value {
                    *current = value.clone();
                    changed = true;
                }
            }
        }
        changed.then_some(refreshed)
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cookies.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as a `Cookie` request header value (`a=1; b=2`)
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// Cookie values are bearer credentials; keep them out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.cookies.keys().map(|k| (k, "<redacted>")))
            .finish()
    }
}

/// Outcome of asking the remote service whether a session is still accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyResult {
    Active,
    Inactive,
    /// No HTTP response was obtained at all
    Unreachable,
}

// ============================================================================
// Tests
// ============================================================================
