//! # Dispatch Module
//!
//! Per-method handler selection on top of the path router.
//!
//! The radix tree only knows about paths. [`MethodRouter`] stores one
//! [`Endpoint`] per path pattern, and each endpoint maps HTTP methods to
//! handlers. Dispatch distinguishes three outcomes a server layer needs:
//!
//! - a handler was found → [`Dispatched::Handler`]
//! - the path exists but the method is not allowed → 405 with an `Allow` list
//! - `OPTIONS` on an existing path with no explicit handler →
//!   [`Dispatched::Options`] carrying the `Allow` list
//!
//! An endpoint that allows `GET` also answers `HEAD` with the `GET` handler.
//!
//! ```rust
//! use http::Method;
//! use silkrouter::dispatch::{Dispatched, MethodRouter};
//!
//! let mut router = MethodRouter::new();
//! router.get("/users/{id:int}", "get_user").unwrap();
//! router.delete("/users/{id:int}", "delete_user").unwrap();
//!
//! match router.dispatch(&Method::GET, "/users/7").unwrap() {
//!     Dispatched::Handler { handler, params, .. } => {
//!         assert_eq!(*handler, "get_user");
//!         assert_eq!(params.get_int("id"), Some(7));
//!     }
//!     Dispatched::Options { .. } => unreachable!(),
//! }
//!
//! let err = router.dispatch(&Method::POST, "/users/7").unwrap_err();
//! assert_eq!(err.allow_header().as_deref(), Some("GET, HEAD, DELETE"));
//! ```

use http::{Method, StatusCode};
use smallvec::SmallVec;
use std::fmt;
use tracing::debug;

use crate::error::{NotFound, RouteError};
use crate::path::ConvertorRegistry;
use crate::router::{PathParams, Router};
use crate::runtime_config::RouterConfig;

/// Order in which methods are listed in an `Allow` header
const ALLOW_ORDER: [Method; 7] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// Methods registered by [`MethodRouter::any`]
pub const ANY_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
];

type MethodHandlers<H> = SmallVec<[(Method, H); 4]>;

/// Handlers for one path pattern, keyed by method
#[derive(Debug, Clone)]
pub struct Endpoint<H> {
    handlers: MethodHandlers<H>,
}

impl<H> Endpoint<H> {
    /// Add all of `incoming`, or nothing when one of its methods is taken
    fn merge(&mut self, incoming: MethodHandlers<H>) -> Result<(), Method> {
        if let Some((method, _)) = incoming
            .iter()
            .find(|(m, _)| self.handlers.iter().any(|(registered, _)| registered == m))
        {
            return Err(method.clone());
        }
        self.handlers.extend(incoming);
        Ok(())
    }

    /// Handler for `method`; `HEAD` falls back to `GET`
    #[must_use]
    pub fn handler(&self, method: &Method) -> Option<&H> {
        let lookup = |m: &Method| {
            self.handlers
                .iter()
                .find(|(registered, _)| registered == m)
                .map(|(_, h)| h)
        };
        lookup(method).or_else(|| {
            if *method == Method::HEAD {
                lookup(&Method::GET)
            } else {
                None
            }
        })
    }

    /// Allowed methods, in `Allow` header order
    #[must_use]
    pub fn allow(&self) -> Vec<Method> {
        let mut allow: Vec<Method> = ALLOW_ORDER
            .iter()
            .filter(|m| self.handler(m).is_some())
            .cloned()
            .collect();
        // Extension methods go last, in registration order
        allow.extend(
            self.handlers
                .iter()
                .map(|(m, _)| m)
                .filter(|m| !ALLOW_ORDER.contains(m))
                .cloned(),
        );
        allow
    }
}

/// Outcome of a successful dispatch
#[derive(Debug)]
pub enum Dispatched<'r, H> {
    /// A handler is registered for the method
    Handler {
        /// The handler to invoke
        handler: &'r H,
        /// Converted path parameters
        params: PathParams,
        /// The normalized pattern that matched, e.g. `/users/{id}`.
        /// Shared by every method registered on the endpoint.
        pattern: &'r str,
    },
    /// `OPTIONS` request answered from the allowed method list
    Options {
        /// Methods allowed on the matched path
        allow: Vec<Method>,
    },
}

/// Dispatch failure, mapped to an HTTP status by the server layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No route matches the path (404)
    NotFound(NotFound),
    /// The path matches but the method is not allowed (405)
    MethodNotAllowed {
        /// The requested path
        path: String,
        /// The rejected method
        method: Method,
        /// Methods that are allowed on the path
        allow: Vec<Method>,
    },
}

impl DispatchError {
    /// HTTP status the caller should answer with
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::NotFound(nf) => nf.status(),
            DispatchError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// Value for the `Allow` response header, when there is one
    #[must_use]
    pub fn allow_header(&self) -> Option<String> {
        match self {
            DispatchError::NotFound(_) => None,
            DispatchError::MethodNotAllowed { allow, .. } => Some(allow_header(allow)),
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::NotFound(nf) => fmt::Display::fmt(nf, f),
            DispatchError::MethodNotAllowed {
                path,
                method,
                allow,
            } => write!(
                f,
                "Method {method} not allowed for '{path}' (allowed: {})",
                allow_header(allow)
            ),
        }
    }
}

impl std::error::Error for DispatchError {}

impl From<NotFound> for DispatchError {
    fn from(nf: NotFound) -> Self {
        DispatchError::NotFound(nf)
    }
}

/// Render methods as an `Allow` header value
#[must_use]
pub fn allow_header(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Path router with per-method handlers
#[derive(Debug)]
pub struct MethodRouter<H> {
    router: Router<Endpoint<H>>,
}

impl<H> MethodRouter<H> {
    /// An empty router using the process-wide convertor registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            router: Router::new(),
        }
    }

    /// An empty router with explicit runtime settings
    #[must_use]
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            router: Router::with_config(config),
        }
    }

    /// Compile patterns against `registry` instead of the process-wide one
    #[must_use]
    pub fn with_registry(self, registry: ConvertorRegistry) -> Self {
        Self {
            router: self.router.with_registry(registry),
        }
    }

    /// Register `handler` for `method` on `pattern`
    ///
    /// Registering a method that is already present on the same normalized
    /// pattern fails with `DuplicateRoute`.
    pub fn on_method(&mut self, method: Method, pattern: &str, handler: H) -> Result<(), RouteError> {
        let mut handlers = MethodHandlers::new();
        handlers.push((method, handler));
        self.register_handlers(pattern, handlers)
    }

    /// Register all of `handlers` on `pattern` or none of them
    fn register_handlers(
        &mut self,
        pattern: &str,
        handlers: MethodHandlers<H>,
    ) -> Result<(), RouteError> {
        let duplicate = |method: &Method| RouteError::DuplicateRoute {
            pattern: format!("{method} {pattern}"),
        };
        if let Some(method) = handlers
            .iter()
            .enumerate()
            .find_map(|(i, (m, _))| handlers[..i].iter().any(|(p, _)| p == m).then_some(m))
        {
            return Err(duplicate(method));
        }
        let methods: Vec<Method> = handlers.iter().map(|(m, _)| m.clone()).collect();

        self.router.upsert(
            pattern,
            handlers,
            |handlers| Endpoint { handlers },
            |endpoint, handlers| endpoint.merge(handlers).map_err(|m| duplicate(&m)),
        )?;
        debug!(methods = ?methods, pattern, "Registered endpoint methods");
        Ok(())
    }

    /// Register `handler` for GET
    pub fn get(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.on_method(Method::GET, pattern, handler)
    }

    /// Register `handler` for POST
    pub fn post(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.on_method(Method::POST, pattern, handler)
    }

    /// Register `handler` for PUT
    pub fn put(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.on_method(Method::PUT, pattern, handler)
    }

    /// Register `handler` for PATCH
    pub fn patch(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.on_method(Method::PATCH, pattern, handler)
    }

    /// Register `handler` for DELETE
    pub fn delete(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.on_method(Method::DELETE, pattern, handler)
    }

    /// Resolve `path` and pick the handler for `method`
    pub fn dispatch<'r>(
        &'r self,
        method: &Method,
        path: &str,
    ) -> Result<Dispatched<'r, H>, DispatchError> {
        let matched = self.router.resolve(path)?;
        let endpoint = matched.handler();

        if let Some(handler) = endpoint.handler(method) {
            return Ok(Dispatched::Handler {
                handler,
                params: matched.params,
                pattern: matched.route.normalized(),
            });
        }

        let allow = endpoint.allow();
        if *method == Method::OPTIONS {
            return Ok(Dispatched::Options { allow });
        }
        Err(DispatchError::MethodNotAllowed {
            path: path.to_owned(),
            method: method.clone(),
            allow,
        })
    }

    /// The underlying path router
    #[must_use]
    pub fn router(&self) -> &Router<Endpoint<H>> {
        &self.router
    }

    /// Number of registered path patterns
    #[must_use]
    pub fn len(&self) -> usize {
        self.router.len()
    }

    /// True when nothing has been registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.router.is_empty()
    }
}

impl<H: Clone> MethodRouter<H> {
    /// Register `handler` for every method in `methods`
    ///
    /// Either every method is registered or, on error, none is.
    pub fn on(&mut self, methods: &[Method], pattern: &str, handler: H) -> Result<(), RouteError> {
        if methods.is_empty() {
            return Ok(());
        }
        let handlers = methods
            .iter()
            .map(|m| (m.clone(), handler.clone()))
            .collect();
        self.register_handlers(pattern, handlers)
    }

    /// Register `handler` for GET, POST, PUT, PATCH and DELETE
    pub fn any(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.on(&ANY_METHODS, pattern, handler)
    }
}

impl<H> Default for MethodRouter<H> {
    fn default() -> Self {
        Self::new()
    }
}
