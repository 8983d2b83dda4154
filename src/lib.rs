//! # silkrouter
//!
//! **silkrouter** maps request paths to handlers with a radix tree. Route
//! patterns mix literal text with typed placeholders such as `{id:int}`;
//! a successful lookup returns the handler together with the converted
//! parameters.
//!
//! ## Architecture
//!
//! - **[`path`]** - Pattern compiler and the convertors behind type tags
//! - **[`router`]** - Radix tree insertion and backtracking lookup
//! - **[`dispatch`]** - Per-method handlers with `HEAD`/`OPTIONS`/405 handling
//! - **[`route_table`]** - Route tables loaded from YAML, TOML or JSON
//! - **[`runtime_config`]** - Environment-driven router settings
//! - **[`logging`]** - `tracing` subscriber setup for binaries
//! - **[`cli`]** - The `silkrouter` command line tool
//!
//! ## Quick Start
//!
//! ```rust
//! use silkrouter::{ParamValue, Router};
//!
//! let mut router = Router::new();
//! router.register("/", "index").unwrap();
//! router.register("/student/{name}/{age:int}", "student").unwrap();
//!
//! let matched = router.resolve("/student/ada/36").unwrap();
//! assert_eq!(*matched.handler(), "student");
//! assert_eq!(matched.params.get("name"), Some(&ParamValue::from("ada")));
//! assert_eq!(matched.params.get_int("age"), Some(36));
//! ```
//!
//! ## Matching rules
//!
//! - A literal segment always wins over a placeholder at the same position,
//!   whichever was registered first.
//! - When a branch dead-ends the lookup backtracks and tries the next
//!   candidate, so `/a/{x}/b/{y}/end` and `/a/{x}/{z}/{w}` can coexist.
//! - Two placeholders at the same position must agree on name and type.
//! - A rejected registration leaves the router unchanged.
//!
//! ## Custom convertors
//!
//! ```rust
//! use silkrouter::path::{register_convertor, RegexConvertor};
//! use silkrouter::Router;
//!
//! register_convertor("lib_doc_hex", RegexConvertor::new("lib_doc_hex", "[0-9a-f]+").unwrap());
//!
//! let mut router = Router::new();
//! router.register("/blob/{sha:lib_doc_hex}", "blob").unwrap();
//! assert!(router.resolve("/blob/c0ffee").is_ok());
//! assert!(router.resolve("/blob/latte").is_err());
//! ```

pub mod cli;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod path;
pub mod route_table;
pub mod router;
pub mod runtime_config;

pub use dispatch::{DispatchError, Dispatched, MethodRouter};
pub use error::{NotFound, RouteError};
pub use path::{compile_path, register_convertor, CompiledPath, Convertor, ParamValue};
pub use route_table::RouteTable;
pub use router::{PathParams, Route, RouteMatch, Router};
pub use runtime_config::RouterConfig;
