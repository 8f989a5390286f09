//! Error types for `specbridge-http-tools`.

use thiserror::Error;

/// Stable, caller-visible classification of a failure.
///
/// The string form is what surfaces to tool callers, so it must not change between releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedSpecification,
    MissingPaths,
    MalformedOperation,
    NameCollisionUnresolved,
    UnknownTool,
    AuthConfiguration,
    Transport,
    UnexpectedArgument,
    MissingArgument,
    InvalidArguments,
    Configuration,
    SpecSource,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::UnsupportedSpecification => "UnsupportedSpecification",
            ErrorKind::MissingPaths => "MissingPathsError",
            ErrorKind::MalformedOperation => "MalformedOperation",
            ErrorKind::NameCollisionUnresolved => "NameCollisionUnresolved",
            ErrorKind::UnknownTool => "UnknownToolError",
            ErrorKind::AuthConfiguration => "AuthConfigurationError",
            ErrorKind::Transport => "TransportError",
            ErrorKind::UnexpectedArgument => "UnexpectedArgumentError",
            ErrorKind::MissingArgument => "MissingArgumentError",
            ErrorKind::InvalidArguments => "InvalidArgumentsError",
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::SpecSource => "SpecSourceError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for tool execution and runtime configuration.
#[derive(Debug, Error)]
pub enum HttpToolsError {
    /// No tool with this name is registered.
    #[error("Tool not found: {0}")]
    UnknownTool(String),

    /// The auth mode is missing its secrets (or they are empty).
    #[error("auth configuration error: {0}")]
    AuthConfiguration(String),

    /// Network / timeout failure. The message is already redacted.
    #[error("http transport error: {0}")]
    Transport(String),

    /// Arguments left over after path/query/header routing on a call that sends no body.
    #[error("tool '{tool}' does not accept argument(s): {}", names.join(", "))]
    UnexpectedArguments { tool: String, names: Vec<String> },

    /// A path placeholder had no matching argument.
    #[error("tool '{tool}' is missing required argument '{name}'")]
    MissingArgument { tool: String, name: String },

    /// Arguments were not a JSON object (or null).
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Invalid runtime configuration (base URL, proxy, client settings).
    #[error("config error: {0}")]
    Config(String),

    /// Response handling failure (e.g. body over the configured size cap).
    #[error("http error: {0}")]
    Http(String),
}

impl HttpToolsError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            HttpToolsError::UnknownTool(_) => ErrorKind::UnknownTool,
            HttpToolsError::AuthConfiguration(_) => ErrorKind::AuthConfiguration,
            HttpToolsError::Transport(_) | HttpToolsError::Http(_) => ErrorKind::Transport,
            HttpToolsError::UnexpectedArguments { .. } => ErrorKind::UnexpectedArgument,
            HttpToolsError::MissingArgument { .. } => ErrorKind::MissingArgument,
            HttpToolsError::InvalidArguments(_) => ErrorKind::InvalidArguments,
            HttpToolsError::Config(_) => ErrorKind::Configuration,
        }
    }
}

impl From<reqwest::Error> for HttpToolsError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(crate::safety::sanitize_reqwest_error(&value))
    }
}

/// Result type alias for HTTP tool operations.
pub type Result<T> = std::result::Result<T, HttpToolsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_follow_taxonomy() {
        assert_eq!(
            HttpToolsError::UnknownTool("x".into()).kind().as_str(),
            "UnknownToolError"
        );
        assert_eq!(
            HttpToolsError::Transport("boom".into()).kind().to_string(),
            "TransportError"
        );
    }

    #[test]
    fn unexpected_arguments_message_lists_names() {
        let err = HttpToolsError::UnexpectedArguments {
            tool: "listPets".into(),
            names: vec!["a".into(), "b".into()],
        };
        assert_eq!(
            err.to_string(),
            "tool 'listPets' does not accept argument(s): a, b"
        );
    }
}
