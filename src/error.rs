//! Error types for route registration and lookup.
//!
//! Every [`RouteError`] is raised while routes are being registered, never
//! while a request is being resolved. The only lookup-time outcome is
//! [`NotFound`], which is an expected result rather than a failure.

use http::StatusCode;
use std::fmt;

/// Route registration error
///
/// Returned by [`Router::register`](crate::router::Router::register) and the
/// path compiler when a pattern cannot be added to the routing tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The pattern references a type tag with no registered convertor
    UnknownConvertor {
        /// The offending tag, e.g. `uuid` in `{id:uuid}`
        tag: String,
    },
    /// Two different parameter shapes would occupy the same capture slot
    ///
    /// At any tree position there is at most one parameter node. Registering
    /// `/users/{id}` and then `/users/{user_id}` is ambiguous.
    ConflictingParameter {
        /// Normalized pattern prefix leading up to the capture slot
        position: String,
        /// Parameter already occupying the slot
        existing: String,
        /// Parameter that was being inserted
        incoming: String,
    },
    /// The same normalized pattern was registered twice
    DuplicateRoute {
        /// Normalized pattern
        pattern: String,
    },
    /// The raw pattern is malformed
    InvalidPattern {
        /// The raw pattern as given
        pattern: String,
        /// Human readable reason
        reason: &'static str,
    },
    /// A parameter name occurs more than once in a single pattern
    DuplicateParameter {
        /// The raw pattern as given
        pattern: String,
        /// The repeated name
        name: String,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::UnknownConvertor { tag } => {
                write!(f, "Unknown path param convertor '{tag}'")
            }
            RouteError::ConflictingParameter {
                position,
                existing,
                incoming,
            } => {
                write!(
                    f,
                    "Conflicting path parameter at '{position}': '{{{incoming}}}' would share \
                    a capture slot with already registered '{{{existing}}}'"
                )
            }
            RouteError::DuplicateRoute { pattern } => {
                write!(f, "Handler already registered for path '{pattern}'")
            }
            RouteError::InvalidPattern { pattern, reason } => {
                write!(f, "Invalid route pattern '{pattern}': {reason}")
            }
            RouteError::DuplicateParameter { pattern, name } => {
                write!(
                    f,
                    "Path parameter '{name}' appears more than once in '{pattern}'"
                )
            }
        }
    }
}

impl std::error::Error for RouteError {}

/// No registered route matches the requested path
///
/// This is a normal, frequent outcome. The dispatch layer usually answers it
/// with a 404.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFound {
    /// The path that failed to resolve
    pub path: String,
}

impl NotFound {
    pub(crate) fn new(path: &str) -> Self {
        Self {
            path: path.to_owned(),
        }
    }

    /// HTTP status the caller should answer with
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::NOT_FOUND
    }
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No route matches path '{}'", self.path)
    }
}

impl std::error::Error for NotFound {}
