//! Runtime configuration for tool execution.
//!
//! These are the as-written (YAML/JSON) shapes. [`AuthSettings::resolve`] is the point where the
//! flat auth block is checked and narrowed into an [`AuthConfig`].

use crate::auth::{ApiKeyLocation, AuthConfig};
use crate::error::{HttpToolsError, Result};
use crate::secret::SecretString;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Resolved connection settings shared by every call.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeConfig {
    /// Base URL tool paths are appended to. When unset, callers fall back to the spec's server.
    pub base_url: Option<String>,
    pub auth: AuthSettings,
    pub network: NetworkConfig,
    /// Headers sent on every request. Header parameters, auth and `Content-Type` override them.
    pub default_headers: IndexMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthMode {
    #[default]
    None,
    Basic,
    Bearer,
    ApiKey,
    Custom,
}

/// Flat auth block as it appears in configuration files.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthSettings {
    pub mode: AuthMode,
    pub username: Option<SecretString>,
    pub password: Option<SecretString>,
    pub token: Option<SecretString>,
    pub key_name: Option<String>,
    pub key_location: Option<ApiKeyLocation>,
    pub key_value: Option<SecretString>,
    pub headers: IndexMap<String, SecretString>,
}

impl AuthSettings {
    /// Narrow into the closed [`AuthConfig`] enum.
    ///
    /// # Errors
    ///
    /// Returns [`HttpToolsError::AuthConfiguration`] when the mode's secrets are missing or empty,
    /// or when secrets belonging to a different mode are also set.
    pub fn resolve(&self) -> Result<AuthConfig> {
        self.reject_foreign_fields()?;
        match self.mode {
            AuthMode::None => Ok(AuthConfig::None),
            AuthMode::Basic => Ok(AuthConfig::Basic {
                username: required_secret(self.username.as_ref(), "basic", "username")?,
                password: required_secret(self.password.as_ref(), "basic", "password")?,
            }),
            AuthMode::Bearer => Ok(AuthConfig::Bearer {
                token: required_secret(self.token.as_ref(), "bearer", "token")?,
            }),
            AuthMode::ApiKey => {
                let name = self
                    .key_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| missing("apiKey", "keyName"))?;
                Ok(AuthConfig::ApiKey {
                    name: name.to_string(),
                    location: self.key_location.unwrap_or(ApiKeyLocation::Header),
                    value: required_secret(self.key_value.as_ref(), "apiKey", "keyValue")?,
                })
            }
            AuthMode::Custom => {
                if self.headers.is_empty() {
                    return Err(missing("custom", "headers"));
                }
                Ok(AuthConfig::Custom {
                    headers: self.headers.clone(),
                })
            }
        }
    }

    fn reject_foreign_fields(&self) -> Result<()> {
        let set: [(&str, bool, AuthMode); 7] = [
            ("username", self.username.is_some(), AuthMode::Basic),
            ("password", self.password.is_some(), AuthMode::Basic),
            ("token", self.token.is_some(), AuthMode::Bearer),
            ("keyName", self.key_name.is_some(), AuthMode::ApiKey),
            ("keyLocation", self.key_location.is_some(), AuthMode::ApiKey),
            ("keyValue", self.key_value.is_some(), AuthMode::ApiKey),
            ("headers", !self.headers.is_empty(), AuthMode::Custom),
        ];
        let foreign: Vec<&str> = set
            .iter()
            .filter(|(_, present, owner)| *present && *owner != self.mode)
            .map(|(field, _, _)| *field)
            .collect();
        if foreign.is_empty() {
            Ok(())
        } else {
            Err(HttpToolsError::AuthConfiguration(format!(
                "auth mode '{}' does not use field(s): {}",
                mode_label(self.mode),
                foreign.join(", ")
            )))
        }
    }
}

fn mode_label(mode: AuthMode) -> &'static str {
    match mode {
        AuthMode::None => "none",
        AuthMode::Basic => "basic",
        AuthMode::Bearer => "bearer",
        AuthMode::ApiKey => "apiKey",
        AuthMode::Custom => "custom",
    }
}

fn missing(mode: &str, field: &str) -> HttpToolsError {
    HttpToolsError::AuthConfiguration(format!("auth mode '{mode}' requires '{field}'"))
}

fn required_secret(value: Option<&SecretString>, mode: &str, field: &str) -> Result<SecretString> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.clone()),
        _ => Err(missing(mode, field)),
    }
}

/// Network tuning for the outbound client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkConfig {
    /// `0` disables the connect timeout.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout. `0` disables it.
    pub timeout_secs: u64,
    /// `0` means redirects are not followed.
    pub max_redirects: usize,
    pub proxy: Option<String>,
    pub max_response_bytes: Option<usize>,
    pub user_agent: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            timeout_secs: 30,
            max_redirects: 10,
            proxy: None,
            max_response_bytes: None,
            user_agent: None,
        }
    }
}

impl NetworkConfig {
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        non_zero_secs(self.timeout_secs)
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
