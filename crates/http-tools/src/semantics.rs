//! HTTP semantics helpers.
//!
//! Two questions are answered from RFC 9110-style method semantics: does a request with this
//! method carry a body, and which MCP `ToolAnnotations` describe it.

use reqwest::Method;
use rmcp::model::ToolAnnotations;

/// Create/update-style verbs send the leftover arguments as a JSON body. Everything else never
/// sends a body.
#[must_use]
pub fn carries_body(method: &Method) -> bool {
    method == Method::POST || method == Method::PUT || method == Method::PATCH
}

/// Generate MCP tool annotations based on HTTP method semantics.
///
/// Notes:
/// - `openWorldHint` is always set to `true` for HTTP tools (they interact with an external system).
/// - For unknown/extension methods, we only set `openWorldHint` and leave the other hints unset.
#[must_use]
pub fn annotations_for_method(method: &Method, title: Option<String>) -> ToolAnnotations {
    let open_world_hint = Some(true);

    let (read_only_hint, destructive_hint, idempotent_hint) =
        if method == Method::GET || method == Method::HEAD || method == Method::OPTIONS {
            (Some(true), Some(false), Some(true))
        } else if method == Method::POST {
            (Some(false), Some(false), Some(false))
        } else if method == Method::PUT || method == Method::DELETE {
            (Some(false), Some(true), Some(true))
        } else if method == Method::PATCH {
            // PATCH may or may not be idempotent; do not guess.
            (Some(false), Some(true), None)
        } else {
            (None, None, None)
        };

    ToolAnnotations {
        title,
        read_only_hint,
        destructive_hint,
        idempotent_hint,
        open_world_hint,
    }
}
