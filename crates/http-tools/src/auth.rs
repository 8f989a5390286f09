//! Authentication for outbound tool calls.
//!
//! [`AuthConfig`] is the resolved, closed set of auth modes. [`AuthResolver`] validates it once at
//! configuration time and turns it into ready-to-attach headers (plus, for query API keys, one
//! query pair), so no auth problem can surface in the middle of a request.

use crate::error::{HttpToolsError, Result};
use crate::secret::SecretString;
use base64::Engine as _;
use indexmap::IndexMap;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Where an API key is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Header,
    Query,
}

/// Resolved auth configuration: exactly one secret bundle, matching the mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthConfig {
    None,
    Basic {
        username: SecretString,
        password: SecretString,
    },
    Bearer {
        token: SecretString,
    },
    ApiKey {
        name: String,
        location: ApiKeyLocation,
        value: SecretString,
    },
    Custom {
        headers: IndexMap<String, SecretString>,
    },
}

impl AuthConfig {
    #[must_use]
    pub fn mode_name(&self) -> &'static str {
        match self {
            AuthConfig::None => "none",
            AuthConfig::Basic { .. } => "basic",
            AuthConfig::Bearer { .. } => "bearer",
            AuthConfig::ApiKey { .. } => "apiKey",
            AuthConfig::Custom { .. } => "custom",
        }
    }
}

/// Pre-built auth material for one runtime configuration.
#[derive(Debug, Clone)]
pub struct AuthResolver {
    headers: HeaderMap,
    query: Option<(String, SecretString)>,
}

impl AuthResolver {
    /// Validate `config` and build its headers / query pair.
    ///
    /// # Errors
    ///
    /// Returns [`HttpToolsError::AuthConfiguration`] if a required secret is empty, or if a header
    /// name/value cannot be sent over HTTP (e.g. it contains a newline).
    pub fn new(config: &AuthConfig) -> Result<Self> {
        Ok(Self {
            headers: headers_for(config)?,
            query: query_param_for(config)?,
        })
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The API key to append to the query string, if the key lives there.
    #[must_use]
    pub fn query_param(&self) -> Option<(&str, &str)> {
        self.query
            .as_ref()
            .map(|(name, value)| (name.as_str(), value.expose()))
    }
}

/// Build the auth headers for `config`.
///
/// # Errors
///
/// See [`AuthResolver::new`].
pub fn headers_for(config: &AuthConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    match config {
        AuthConfig::None => {}
        AuthConfig::Basic { username, password } => {
            require(username, "basic", "username")?;
            require(password, "basic", "password")?;
            let raw = Zeroizing::new(format!("{}:{}", username.expose(), password.expose()));
            let encoded = Zeroizing::new(base64::engine::general_purpose::STANDARD.encode(raw.as_bytes()));
            let value = Zeroizing::new(format!("Basic {}", encoded.as_str()));
            headers.insert(AUTHORIZATION, sensitive_value(&value)?);
        }
        AuthConfig::Bearer { token } => {
            require(token, "bearer", "token")?;
            let value = Zeroizing::new(format!("Bearer {}", token.expose()));
            headers.insert(AUTHORIZATION, sensitive_value(&value)?);
        }
        AuthConfig::ApiKey {
            name,
            location,
            value,
        } => {
            if name.trim().is_empty() {
                return Err(HttpToolsError::AuthConfiguration(
                    "mode 'apiKey' requires a non-empty key name".to_string(),
                ));
            }
            require(value, "apiKey", "key value")?;
            if *location == ApiKeyLocation::Header {
                headers.insert(header_name(name)?, sensitive_value(value.expose())?);
            }
        }
        AuthConfig::Custom { headers: custom } => {
            if custom.is_empty() {
                return Err(HttpToolsError::AuthConfiguration(
                    "mode 'custom' requires at least one header".to_string(),
                ));
            }
            for (name, value) in custom {
                headers.insert(header_name(name)?, sensitive_value(value.expose())?);
            }
        }
    }
    Ok(headers)
}

/// The `(name, value)` query pair for API keys configured with `location: query`.
///
/// # Errors
///
/// Returns [`HttpToolsError::AuthConfiguration`] if the key name or value is empty.
pub fn query_param_for(config: &AuthConfig) -> Result<Option<(String, SecretString)>> {
    match config {
        AuthConfig::ApiKey {
            name,
            location: ApiKeyLocation::Query,
            value,
        } => {
            if name.trim().is_empty() {
                return Err(HttpToolsError::AuthConfiguration(
                    "mode 'apiKey' requires a non-empty key name".to_string(),
                ));
            }
            require(value, "apiKey", "key value")?;
            Ok(Some((name.clone(), value.clone())))
        }
        _ => Ok(None),
    }
}

fn require(secret: &SecretString, mode: &str, field: &str) -> Result<()> {
    if secret.is_empty() {
        return Err(HttpToolsError::AuthConfiguration(format!(
            "mode '{mode}' requires a non-empty {field}"
        )));
    }
    Ok(())
}

fn header_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| {
        HttpToolsError::AuthConfiguration(format!("invalid auth header name '{name}'"))
    })
}

fn sensitive_value(value: &str) -> Result<HeaderValue> {
    let mut v = HeaderValue::from_str(value).map_err(|_| {
        HttpToolsError::AuthConfiguration(
            "auth header value contains characters that cannot be sent in a header".to_string(),
        )
    })?;
    v.set_sensitive(true);
    Ok(v)
}
