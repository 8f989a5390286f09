//! Error types for `specbridge-openapi-tools`.

use specbridge_http_tools::error::ErrorKind;
use thiserror::Error;

/// Main error type for spec loading and compilation.
#[derive(Error, Debug)]
pub enum OpenApiToolsError {
    /// The document has neither an `openapi` nor a `swagger` key.
    #[error("unsupported specification: {0}")]
    UnsupportedSpecification(String),

    /// `paths` is absent, not a map, or empty.
    #[error("specification has no paths")]
    MissingPaths,

    /// One operation could not be compiled. Compilation skips it and carries on.
    #[error("malformed operation {method} {path}: {reason}")]
    MalformedOperation {
        method: String,
        path: String,
        reason: String,
    },

    /// A unique name could not be produced, or an override renamed onto an existing tool.
    #[error("tool name collision: {0}")]
    NameCollisionUnresolved(String),

    /// Invalid configuration (override policy, base URL).
    #[error("configuration error: {0}")]
    Config(String),

    /// A `$ref` that cannot be followed.
    #[error("unresolved $ref '{reference}': {reason}")]
    Reference { reference: String, reason: String },

    #[error("failed to fetch spec from '{url}': {message}")]
    SpecFetch { url: String, message: String },

    #[error("failed to read spec file '{path}': {source}")]
    SpecReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse spec from '{location}': {source}")]
    SpecParse {
        location: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("spec hash mismatch for '{location}': expected {expected}, got {actual}")]
    SpecHashMismatch {
        location: String,
        expected: String,
        actual: String,
    },

    /// JSON (de)serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OpenApiToolsError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            OpenApiToolsError::UnsupportedSpecification(_) => ErrorKind::UnsupportedSpecification,
            OpenApiToolsError::MissingPaths => ErrorKind::MissingPaths,
            OpenApiToolsError::MalformedOperation { .. }
            | OpenApiToolsError::Reference { .. }
            | OpenApiToolsError::Json(_) => ErrorKind::MalformedOperation,
            OpenApiToolsError::NameCollisionUnresolved(_) => ErrorKind::NameCollisionUnresolved,
            OpenApiToolsError::Config(_) => ErrorKind::Configuration,
            OpenApiToolsError::SpecFetch { .. }
            | OpenApiToolsError::SpecReadFile { .. }
            | OpenApiToolsError::SpecParse { .. }
            | OpenApiToolsError::SpecHashMismatch { .. } => ErrorKind::SpecSource,
        }
    }
}

/// Result type alias for spec loading and compilation.
pub type Result<T> = std::result::Result<T, OpenApiToolsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_taxonomy_names() {
        assert_eq!(
            OpenApiToolsError::MissingPaths.kind().as_str(),
            "MissingPathsError"
        );
        assert_eq!(
            OpenApiToolsError::UnsupportedSpecification("x".into())
                .kind()
                .as_str(),
            "UnsupportedSpecification"
        );
        let fetch = OpenApiToolsError::SpecFetch {
            url: "https://example.com/spec.yaml".into(),
            message: "HTTP 404".into(),
        };
        assert_eq!(fetch.kind().as_str(), ErrorKind::SpecSource.as_str());
        let broken = OpenApiToolsError::Reference {
            reference: "#/x".into(),
            reason: "missing".into(),
        };
        assert_eq!(broken.kind(), ErrorKind::MalformedOperation);
    }
}
