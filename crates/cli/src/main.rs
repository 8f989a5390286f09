//! `specbridge`: compile an API description into tools, then list or call them.

mod config;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use specbridge_http_tools::registry::ToolRegistry;
use specbridge_http_tools::runtime::ToolExecutor;
use specbridge_http_tools::transport::ReqwestTransport;
use specbridge_openapi_tools::compiler::argument_locations;
use specbridge_openapi_tools::loader::load_spec;
use specbridge_openapi_tools::{CompiledSpec, compile_into, resolve_server_url};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(Parser)]
#[command(name = "specbridge")]
#[command(about = "Turn an OpenAPI / Swagger document into callable tools")]
#[command(version)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "SPECBRIDGE_CONFIG")]
    config: PathBuf,

    /// Overrides `server.baseUrl` from the configuration file
    #[arg(long, env = "SPECBRIDGE_BASE_URL")]
    base_url: Option<String>,

    /// Default log filter when `RUST_LOG` is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// List compiled tools
    List {
        /// Print MCP tool descriptors as JSON
        #[arg(long)]
        json: bool,
    },
    /// Call one tool and print the result
    Call {
        tool: String,
        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

fn setup_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::registry().with(filter);

    // stdout carries listings and results; logs go to stderr.
    match format {
        LogFormat::Json => subscriber
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => subscriber
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(&cli.log_level, cli.log_format);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut cfg = config::load_config(&cli.config)?;
    if let Some(base_url) = cli.base_url {
        cfg.server.base_url = Some(base_url);
    }

    let transport = ReqwestTransport::new(&cfg.server.network).context("build HTTP client")?;
    let loaded = load_spec(&cfg.source, &transport)
        .await
        .context("load spec")?;
    info!(spec = %loaded.location, hash = %loaded.hash, "Spec loaded");

    let registry = Arc::new(ToolRegistry::new());
    let compiled =
        compile_into(&registry, &loaded.document, &cfg.overrides).context("compile spec")?;

    match cli.command {
        Command::List { json } => {
            list_tools(&compiled, &registry, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Call { tool, args } => {
            let arguments: Value =
                serde_json::from_str(&args).context("parse --args as JSON")?;
            if cfg.server.base_url.is_none() {
                let server = compiled
                    .default_base_url
                    .as_deref()
                    .context("no baseUrl configured and the spec declares no server")?;
                cfg.server.base_url = Some(resolve_server_url(server, &cfg.source.spec)?);
            }

            let executor = ToolExecutor::new(registry, &cfg.server).context("configure runtime")?;
            let result = executor.call_tool(&tool, arguments).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if result.is_error == Some(true) {
                Ok(ExitCode::FAILURE)
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

fn list_tools(compiled: &CompiledSpec, registry: &ToolRegistry, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&registry.list_tools())?);
        return Ok(());
    }
    for tool in &compiled.tools {
        println!(
            "{}\t{} {}",
            tool.name, tool.meta.http_method, tool.meta.path_template
        );
        if let Some(description) = &tool.description {
            println!("    {description}");
        }
        for (arg, location) in argument_locations(tool) {
            let required = if tool.input_schema.required.iter().any(|r| r == arg) {
                " (required)"
            } else {
                ""
            };
            println!("    --{arg} [{location}]{required}");
        }
    }
    Ok(())
}
