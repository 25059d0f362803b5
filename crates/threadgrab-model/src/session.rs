use crate::ModelError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// A saved, logged-in browser session (`auth.json`).
///
/// This is the storage-state format written by browser automation tools
/// after an interactive login. It is read-only here. Only the cookies are
/// used; per-origin `localStorage` entries are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageState {
    #[serde(default)]
    pub cookies: Vec<SessionCookie>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// Unix seconds; -1 marks a session cookie.
    #[serde(default = "session_expiry")]
    pub expires: f64,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

fn default_path() -> String {
    "/".to_string()
}

fn session_expiry() -> f64 {
    -1.0
}

impl StorageState {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ModelError::SessionIo {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ModelError::SessionParse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Cookies that haven't expired yet.
    pub fn live_cookies(&self) -> impl Iterator<Item = &SessionCookie> {
        let now = unix_now();
        self.cookies.iter().filter(move |c| !c.is_expired_at(now))
    }

    /// Cookies a browser would send to `host` for `path`.
    pub fn cookies_for<'a>(
        &'a self,
        host: &'a str,
        path: &'a str,
    ) -> impl Iterator<Item = &'a SessionCookie> + 'a {
        self.live_cookies()
            .filter(move |c| c.matches_host(host) && path.starts_with(c.path.as_str()))
    }

    /// `Cookie:` header value for a request to `host` + `path`, if any cookie applies.
    pub fn cookie_header(&self, host: &str, path: &str) -> Option<String> {
        let pairs: Vec<String> = self
            .cookies_for(host, path)
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }
}

impl SessionCookie {
    /// Session cookies (negative `expires`) never expire here.
    pub fn is_expired_at(&self, unix_secs: f64) -> bool {
        self.expires >= 0.0 && self.expires <= unix_secs
    }

    /// Domain matching: a bare domain matches only itself, a dot-prefixed
    /// one also matches its subdomains.
    pub fn matches_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        let domain = self.domain.to_ascii_lowercase();
        match domain.strip_prefix('.') {
            Some(parent) => host == parent || host.ends_with(&format!(".{parent}")),
            None => host == domain,
        }
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
