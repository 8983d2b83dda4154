use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use http::Method;
use serde_json::{json, Value};
use std::io::{self, Write};
use std::path::PathBuf;

use crate::dispatch::{allow_header, DispatchError, Dispatched, MethodRouter};
use crate::route_table::RouteTable;

/// Command-line interface for silkrouter route tables
#[derive(Parser, Debug)]
#[command(name = "silkrouter")]
#[command(about = "Check and query silkrouter route tables", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register every route in a table and report conflicts
    Check {
        /// Route table file (YAML, TOML or JSON)
        #[arg(short, long, env = "SILK_ROUTES")]
        routes: PathBuf,
    },
    /// Resolve request paths against a route table
    Resolve {
        /// Route table file (YAML, TOML or JSON)
        #[arg(short, long, env = "SILK_ROUTES")]
        routes: PathBuf,

        /// HTTP method to dispatch with
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Decoded request paths, without query strings
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Print the radix tree built from a route table
    Tree {
        /// Route table file (YAML, TOML or JSON)
        #[arg(short, long, env = "SILK_ROUTES")]
        routes: PathBuf,
    },
}

/// Parse the process arguments and run the selected command
///
/// # Errors
///
/// Returns an error if:
/// - The route table cannot be read or parsed
/// - A route in the table is rejected by the router
/// - The `--method` value is not a valid HTTP method
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(&cli, &mut out)
}

/// Run `cli`, writing command output to `out`
pub fn execute(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    match &cli.command {
        Commands::Check { routes } => {
            let table = RouteTable::load(routes)?;
            let router = table.build_router()?;
            writeln!(
                out,
                "{}: {} routes, {} patterns OK",
                routes.display(),
                table.routes.len(),
                router.len()
            )?;
            Ok(())
        }
        Commands::Resolve {
            routes,
            method,
            paths,
        } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("Invalid HTTP method '{method}'"))?;
            let router = RouteTable::load(routes)?.build_router()?;
            for path in paths {
                let line = resolve_line(&router, &method, path);
                writeln!(out, "{line}")?;
            }
            Ok(())
        }
        Commands::Tree { routes } => {
            let router = RouteTable::load(routes)?.build_router()?;
            write!(out, "{}", router.router().tree_dump())?;
            Ok(())
        }
    }
}

pub(super) fn resolve_line(router: &MethodRouter<String>, method: &Method, path: &str) -> Value {
    match router.dispatch(method, path) {
        Ok(Dispatched::Handler {
            handler, params, ..
        }) => json!({
            "path": path,
            "handler": handler,
            "params": params,
        }),
        Ok(Dispatched::Options { allow }) => json!({
            "path": path,
            "status": 200,
            "allow": allow_header(&allow),
        }),
        Err(e @ DispatchError::NotFound(_)) => json!({
            "path": path,
            "status": e.status().as_u16(),
        }),
        Err(e @ DispatchError::MethodNotAllowed { .. }) => json!({
            "path": path,
            "status": e.status().as_u16(),
            "allow": e.allow_header(),
        }),
    }
}

