//! Tool model, registry, auth and request execution for spec-derived HTTP tools.
//!
//! This crate is intended to be used by:
//! - `specbridge-openapi-tools` (compiles `OpenAPI` / Swagger documents into [`tool::ToolDefinition`]s)
//! - the `specbridge` binary (wires configuration, registry and executor together)
//!
//! It intentionally knows nothing about specification formats.

pub mod auth;
pub mod config;
pub mod error;
pub mod registry;
pub mod runtime;
pub mod safety;
pub mod schema;
pub mod secret;
pub mod semantics;
pub mod tool;
pub mod transport;
