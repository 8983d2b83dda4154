//! # Router Module
//!
//! The router module maps concrete request paths to registered handlers using
//! a compressed-prefix (radix) tree.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling route patterns such as `/order/{id:int}` at registration time
//! - Storing them in a radix tree whose edges are literal runs or capture slots
//! - Matching incoming request paths and converting captured parameters
//!
//! ## Architecture
//!
//! The router uses a two-phase approach:
//!
//! 1. **Registration**: Each pattern is compiled by [`crate::path`] into a
//!    normalized form plus typed convertors, then inserted into the tree,
//!    splitting shared prefixes. Conflicts are reported here, never later.
//!
//! 2. **Matching**: For each incoming request, the tree is walked with an
//!    explicit stack. Static edges are tried before capture slots, so
//!    `/project/top` wins over `/project/{id}` for the path `/project/top`.
//!
//! ## Example
//!
//! ```rust
//! use silkrouter::router::Router;
//!
//! let mut router = Router::new();
//! router.register("/hi/{name}", "greet").unwrap();
//! router.register("/order/{id:int}", "order").unwrap();
//!
//! let matched = router.resolve("/order/123").unwrap();
//! assert_eq!(*matched.handler(), "order");
//! assert_eq!(matched.params.get_int("id"), Some(123));
//!
//! let matched = router.resolve("/hi/Jack").unwrap();
//! assert_eq!(matched.params.get_str("name"), Some("Jack"));
//! ```
//!
//! ## Performance
//!
//! Lookup cost is proportional to the path length times the branching factor
//! at each depth. At most one static child can match at a given position and
//! each node has at most one capture slot, which keeps branching small.

mod core;
mod radix;
#[cfg(test)]
mod tests;
#[cfg(test)]
mod performance_tests;

pub use core::{PathParams, ParamVec, Route, RouteMatch, Router, MAX_INLINE_PARAMS};
