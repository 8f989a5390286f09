//! Outbound HTTP safety helpers (redirect policy, URL checks, error redaction).

use crate::error::HttpToolsError;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectPolicy {
    /// Do not follow redirects; the 3xx response is returned as-is.
    None,
    /// Follow at most this many redirects.
    Limited(usize),
}

impl RedirectPolicy {
    #[must_use]
    pub fn from_max_redirects(max: usize) -> Self {
        if max == 0 {
            RedirectPolicy::None
        } else {
            RedirectPolicy::Limited(max)
        }
    }

    #[must_use]
    pub fn to_reqwest(self) -> reqwest::redirect::Policy {
        match self {
            RedirectPolicy::None => reqwest::redirect::Policy::none(),
            RedirectPolicy::Limited(n) => reqwest::redirect::Policy::limited(n),
        }
    }
}

/// Reject anything that is not an absolute `http(s)` URL with a host.
///
/// # Errors
///
/// Returns an error for unsupported schemes or a missing host.
pub fn check_url(url: &Url) -> Result<(), HttpToolsError> {
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(HttpToolsError::Config(format!(
            "Outbound HTTP blocked: unsupported URL scheme '{scheme}'"
        )));
    }
    if url.host_str().is_none() {
        return Err(HttpToolsError::Config(
            "Outbound HTTP blocked: missing URL host".to_string(),
        ));
    }
    Ok(())
}

#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    // Best-effort: drop credentials + query + fragment.
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}
