//! Compiles `OpenAPI` v3 and Swagger v2 documents into invocable HTTP tools.
//!
//! This crate is intended to be used by:
//! - the `specbridge` binary (load a spec, compile it, register the tools)
//! - embedders that own their own transport and only need the compiled [`ToolDefinition`]s
//!
//! Execution lives in `specbridge-http-tools`; nothing here performs a tool call.
//!
//! [`ToolDefinition`]: specbridge_http_tools::tool::ToolDefinition

pub mod adapter;
pub mod compiler;
pub mod config;
pub mod error;
pub mod loader;
pub mod naming;
pub mod overrides;
pub mod resolver;
pub mod translate;

pub use compiler::{CompiledSpec, compile, compile_into, resolve_server_url};
