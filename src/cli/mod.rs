//! # CLI Module
//!
//! Command-line tooling for route tables (see [`crate::route_table`]).
//!
//! ## Commands
//!
//! ### `check`
//!
//! Load a route table and register every route, failing on the first
//! rejected pattern:
//!
//! ```bash
//! silkrouter check --routes routes.yaml
//! ```
//!
//! ### `resolve`
//!
//! Resolve one or more paths and print one JSON object per path:
//!
//! ```bash
//! silkrouter resolve --routes routes.yaml --method DELETE /project/12 /nope
//! {"handler":"project_delete","params":{"id":12},"path":"/project/12"}
//! {"path":"/nope","status":404}
//! ```
//!
//! ### `tree`
//!
//! Print the radix tree built from a route table:
//!
//! ```bash
//! silkrouter tree --routes routes.yaml
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use silkrouter::cli::run_cli;
//!
//! run_cli()?;
//! ```

mod commands;


pub use commands::{execute, run_cli, Cli, Commands};
