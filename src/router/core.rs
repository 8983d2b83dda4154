//! Router core module - hot path for request routing.
//!
//! Registration happens once at startup through `&mut Router`; every lookup
//! afterwards goes through `&Router` and never mutates the tree, so a built
//! router can be shared across threads behind an `Arc` without locking.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

use super::radix::RadixTree;
use crate::error::{NotFound, RouteError};
use crate::path::{
    compile_path, compile_path_with, CompiledPath, Convertor, ConvertorRegistry, ParamValue,
    PathSegment,
};
use crate::runtime_config::RouterConfig;

/// Maximum number of path parameters before heap allocation.
/// Most REST APIs have ≤4 path params (e.g., /users/{id}/posts/{postId}).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names use `Arc<str>` because they come from the route tree, which is
/// fixed after startup; cloning one is a refcount bump.
pub type ParamVec = SmallVec<[(Arc<str>, ParamValue); MAX_INLINE_PARAMS]>;

/// A registered pattern together with its handler
///
/// Routes are immutable once built and are owned by the tree node at which
/// their pattern terminates.
pub struct Route<H> {
    pub(crate) compiled: CompiledPath,
    pub(crate) handler: H,
}

impl<H> Route<H> {
    /// Compile `pattern` against the process-wide convertor registry
    pub fn new(pattern: &str, handler: H) -> Result<Self, RouteError> {
        Ok(Self {
            compiled: compile_path(pattern)?,
            handler,
        })
    }

    /// Compile `pattern` against an explicit registry
    pub fn with_registry(
        pattern: &str,
        handler: H,
        registry: &ConvertorRegistry,
    ) -> Result<Self, RouteError> {
        Ok(Self {
            compiled: compile_path_with(pattern, registry)?,
            handler,
        })
    }

    /// The pattern as registered, e.g. `/order/{id:int}`
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.compiled.pattern
    }

    /// The pattern with types stripped, e.g. `/order/{id}`
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.compiled.normalized
    }

    /// The handler reference this route dispatches to
    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Parameter names in declaration order
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.compiled.param_names()
    }

    /// Convertor bound to parameter `name`
    #[must_use]
    pub fn convertor(&self, name: &str) -> Option<&Arc<dyn Convertor>> {
        self.compiled.convertor(name)
    }
}

impl<H: fmt::Debug> fmt::Debug for Route<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("compiled", &self.compiled)
            .field("handler", &self.handler)
            .finish()
    }
}

/// Converted path parameters, in the order they appear in the pattern
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(ParamVec);

impl PathParams {
    /// An empty parameter set
    #[must_use]
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    pub(crate) fn push(&mut self, name: Arc<str>, value: ParamValue) {
        self.0.push((name, value));
    }

    /// Get a path parameter by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
    }

    /// Get a string parameter by name
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    /// Get an integer parameter by name
    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ParamValue::as_int)
    }

    /// `(name, value)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_ref(), v))
    }

    /// Number of parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the matched route has no parameters
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert to a JSON object
    /// Note: This allocates - use get() in hot paths instead
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        self.0
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    ParamValue::Str(s) => Value::String(s.clone()),
                    ParamValue::Int(i) => Value::from(*i),
                };
                (k.to_string(), value)
            })
            .collect()
    }
}

impl Serialize for PathParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k.as_ref(), v)?;
        }
        map.end()
    }
}

/// Result of successfully matching a request path to a route
#[derive(Debug)]
pub struct RouteMatch<'r, H> {
    /// The matched route
    pub route: &'r Route<H>,
    /// Path parameters extracted from the URL (e.g., `{id}` → `{"id": 123}`)
    pub params: PathParams,
}

impl<'r, H> RouteMatch<'r, H> {
    /// The handler of the matched route
    #[must_use]
    pub fn handler(&self) -> &'r H {
        &self.route.handler
    }
}

/// Router that maps request paths to handlers using a radix tree
///
/// ```rust
/// use silkrouter::Router;
///
/// let mut router = Router::new();
/// router.register("/project/top", "top").unwrap();
/// router.register("/project/{id:int}", "detail").unwrap();
///
/// assert_eq!(*router.resolve("/project/top").unwrap().handler(), "top");
///
/// let matched = router.resolve("/project/12").unwrap();
/// assert_eq!(*matched.handler(), "detail");
/// assert_eq!(matched.params.get_int("id"), Some(12));
///
/// assert!(router.resolve("/project/another").is_err());
/// ```
#[derive(Debug)]
pub struct Router<H> {
    tree: RadixTree<H>,
    /// `None` means the process-wide registry at registration time
    registry: Option<Arc<ConvertorRegistry>>,
    config: RouterConfig,
}

impl<H> Router<H> {
    /// An empty router using the process-wide convertor registry
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    /// An empty router with explicit runtime settings
    #[must_use]
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            tree: RadixTree::new(),
            registry: None,
            config,
        }
    }

    /// Compile patterns against `registry` instead of the process-wide one
    #[must_use]
    pub fn with_registry(mut self, registry: ConvertorRegistry) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    /// Runtime settings in effect
    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    fn compile(&self, pattern: &str) -> Result<CompiledPath, RouteError> {
        let compiled = match &self.registry {
            Some(registry) => compile_path_with(pattern, registry),
            None => compile_path(pattern),
        };
        compiled
            .and_then(|c| self.check_length(&c).map(|()| c))
            .inspect_err(|e| warn!(pattern, error = %e, "Rejected route pattern"))
    }

    /// Reject patterns whose shortest match is already longer than
    /// `max_path_len`, since `resolve` would never reach them.
    fn check_length(&self, compiled: &CompiledPath) -> Result<(), RouteError> {
        // Every capture consumes at least one byte
        let shortest: usize = compiled
            .segments
            .iter()
            .map(|segment| match segment {
                PathSegment::Static(text) => text.len(),
                PathSegment::Param { .. } => 1,
            })
            .sum();
        if shortest > self.config.max_path_len {
            return Err(RouteError::InvalidPattern {
                pattern: compiled.pattern.clone(),
                reason: "route path is longer than the maximum path length",
            });
        }
        Ok(())
    }

    /// Register `handler` for `pattern`
    ///
    /// # Errors
    ///
    /// `UnknownConvertor`, `InvalidPattern` and `DuplicateParameter` from the
    /// path compiler; `ConflictingParameter` and `DuplicateRoute` from the tree.
    pub fn register(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        let compiled = self.compile(pattern)?;
        self.add_route(Route { compiled, handler })
    }

    /// Insert an already compiled route
    pub fn add_route(&mut self, route: Route<H>) -> Result<(), RouteError> {
        let pattern = route.pattern().to_owned();
        let normalized = route.normalized().to_owned();
        let params: Vec<&str> = route.param_names().collect();
        debug!(pattern = %pattern, normalized = %normalized, params = ?params, "Registering route");

        self.check_length(&route.compiled)
            .and_then(|()| self.tree.insert(route))
            .inspect_err(|e| {
                warn!(pattern = %pattern, error = %e, "Route registration failed");
            })
    }

    /// Register `pattern`, or update the handler already registered for it.
    ///
    /// `value` is handed to `insert` to build the handler of a new route, or
    /// to `update` together with the existing handler when the normalized
    /// pattern is already present.
    pub fn upsert<V>(
        &mut self,
        pattern: &str,
        value: V,
        insert: impl FnOnce(V) -> H,
        update: impl FnOnce(&mut H, V) -> Result<(), RouteError>,
    ) -> Result<(), RouteError> {
        let compiled = self.compile(pattern)?;
        match self.tree.check(&compiled) {
            Ok(()) => self.add_route(Route {
                compiled,
                handler: insert(value),
            }),
            Err(RouteError::DuplicateRoute { pattern }) => match self.tree.find_mut(&compiled) {
                Some(route) => {
                    debug!(pattern = %pattern, "Updating existing route");
                    update(&mut route.handler, value)
                }
                None => Err(RouteError::DuplicateRoute { pattern }),
            },
            Err(e) => Err(e),
        }
    }

    /// Resolve a decoded request path (no query string) to a route
    ///
    /// # Errors
    ///
    /// [`NotFound`] when no registered pattern matches the whole path.
    ///
    /// # Panics
    ///
    /// When a convertor rejects a value its own `match_prefix` accepted.
    #[allow(clippy::panic)]
    pub fn resolve<'r>(&'r self, path: &str) -> Result<RouteMatch<'r, H>, NotFound> {
        if path.len() > self.config.max_path_len {
            trace!(path_len = path.len(), max = self.config.max_path_len, "Path too long");
            return Err(NotFound::new(path));
        }

        let Some((route, captures)) = self.tree.search(path) else {
            trace!(path, "No route matched");
            return Err(NotFound::new(path));
        };

        let mut params = PathParams::new();
        for capture in captures {
            let raw = &path[capture.start..capture.end];
            match capture.convertor.convert(raw) {
                Ok(value) => params.push(Arc::clone(capture.name), value),
                Err(e) => {
                    error!(
                        path,
                        pattern = route.pattern(),
                        param = capture.name.as_ref(),
                        error = %e,
                        "Convertor accepted a value it cannot convert"
                    );
                    panic!("broken convertor '{}': {e}", capture.convertor.name());
                }
            }
        }

        trace!(path, pattern = route.pattern(), "Route matched");
        Ok(RouteMatch { route, params })
    }

    /// Number of registered routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// True when no route has been registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.len() == 0
    }

    /// Every registered route, in tree order
    #[must_use]
    pub fn routes(&self) -> Vec<&Route<H>> {
        self.tree.routes()
    }

    /// Indented rendering of the radix tree, for debugging
    #[must_use]
    pub fn tree_dump(&self) -> String {
        self.tree.dump()
    }

    /// Log a summary of the routing table
    pub fn dump_routes(&self) {
        let routes = self.routes();
        let routes_summary: Vec<&str> = routes.iter().take(10).map(|r| r.pattern()).collect();
        info!(
            routes_count = routes.len(),
            routes_summary = ?routes_summary,
            routing_algorithm = "radix_tree",
            "Routing table loaded"
        );
    }
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self::new()
    }
}
