//! Path parameter convertors.
//!
//! A convertor does two jobs: it claims the longest valid prefix of the
//! remaining request path for a capture slot, and later turns that captured
//! text into a typed [`ParamValue`]. Matching is the only place a capture may
//! be rejected; conversion of a matched capture must always succeed.

use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// The remaining path does not start with a value the convertor accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamNotMatched;

impl fmt::Display for ParamNotMatched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("path parameter not matched")
    }
}

impl std::error::Error for ParamNotMatched {}

/// A matched capture could not be converted
///
/// Seeing this means a convertor's `match_prefix` accepted text that its
/// `convert` rejects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertError {
    /// Name of the convertor that failed
    pub convertor: String,
    /// The captured text
    pub value: String,
    /// Why conversion failed
    pub reason: String,
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "convertor '{}' failed to convert '{}': {}",
            self.convertor, self.value, self.reason
        )
    }
}

impl std::error::Error for ConvertError {}

/// Typed value of a path parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Identity conversion (`{name}` / `{name:str}`)
    Str(String),
    /// Base-10 integer (`{id:int}`)
    Int(i64),
}

impl ParamValue {
    /// Borrow the value as text if it is a string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            ParamValue::Int(_) => None,
        }
    }

    /// The value as an integer if it is one
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            ParamValue::Str(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Int(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_owned())
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

/// Capability object bound to a parameter slot in the routing tree.
///
/// Two convertors are considered the same shape when their [`name`](Self::name)
/// is equal, so a custom convertor must use a name no other convertor uses.
pub trait Convertor: Send + Sync + fmt::Debug {
    /// Stable identifier, used in conflict detection and diagnostics
    fn name(&self) -> &str;

    /// Claim the maximal valid prefix of `path`.
    ///
    /// Returns [`ParamNotMatched`] when that prefix would be empty.
    fn match_prefix<'p>(&self, path: &'p str) -> Result<&'p str, ParamNotMatched>;

    /// Convert a value previously returned by [`match_prefix`](Self::match_prefix).
    fn convert(&self, value: &str) -> Result<ParamValue, ConvertError>;
}

static RAW_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new("^[^/]+").expect("valid raw regex"));
static INT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new("^[0-9]+").expect("valid int regex"));

/// Matches any run of characters up to the next `/`, identity conversion
#[derive(Debug, Clone, Copy, Default)]
pub struct RawConvertor;

impl Convertor for RawConvertor {
    fn name(&self) -> &str {
        "str"
    }

    fn match_prefix<'p>(&self, path: &'p str) -> Result<&'p str, ParamNotMatched> {
        RAW_REGEX
            .find(path)
            .map(|m| m.as_str())
            .ok_or(ParamNotMatched)
    }

    fn convert(&self, value: &str) -> Result<ParamValue, ConvertError> {
        Ok(ParamValue::Str(value.to_owned()))
    }
}

/// Matches a run of ASCII digits and converts it to `i64`
///
/// A digit run too large for `i64` is treated as not matched, so every
/// accepted capture is convertible.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerConvertor;

impl Convertor for IntegerConvertor {
    fn name(&self) -> &str {
        "int"
    }

    fn match_prefix<'p>(&self, path: &'p str) -> Result<&'p str, ParamNotMatched> {
        let digits = INT_REGEX.find(path).ok_or(ParamNotMatched)?.as_str();
        if digits.parse::<i64>().is_err() {
            return Err(ParamNotMatched);
        }
        Ok(digits)
    }

    fn convert(&self, value: &str) -> Result<ParamValue, ConvertError> {
        value
            .parse::<i64>()
            .map(ParamValue::Int)
            .map_err(|e| ConvertError {
                convertor: self.name().to_owned(),
                value: value.to_owned(),
                reason: e.to_string(),
            })
    }
}

/// A string convertor restricted by a user-supplied regular expression.
///
/// The expression is anchored at the start of the remaining path. It should
/// not be able to match `/` unless the capture is meant to span segments.
///
/// ```rust
/// use silkrouter::path::{register_convertor, RegexConvertor};
///
/// let slug = RegexConvertor::new("slug", "[a-z0-9]+(?:-[a-z0-9]+)*").unwrap();
/// register_convertor("slug", slug);
/// ```
#[derive(Debug, Clone)]
pub struct RegexConvertor {
    name: String,
    regex: Regex,
}

impl RegexConvertor {
    /// Compile `pattern` into an anchored convertor named `name`
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{pattern})"))?;
        Ok(Self {
            name: name.into(),
            regex,
        })
    }
}

impl Convertor for RegexConvertor {
    fn name(&self) -> &str {
        &self.name
    }

    fn match_prefix<'p>(&self, path: &'p str) -> Result<&'p str, ParamNotMatched> {
        match self.regex.find(path) {
            Some(m) if !m.as_str().is_empty() => Ok(m.as_str()),
            _ => Err(ParamNotMatched),
        }
    }

    fn convert(&self, value: &str) -> Result<ParamValue, ConvertError> {
        Ok(ParamValue::Str(value.to_owned()))
    }
}

/// Mapping from type tag (`int` in `{id:int}`) to convertor
#[derive(Clone, Default)]
pub struct ConvertorRegistry {
    convertors: HashMap<String, Arc<dyn Convertor>>,
}

impl ConvertorRegistry {
    /// Tag used when a placeholder has no explicit type
    pub const DEFAULT_TAG: &'static str = "str";

    /// An empty registry
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding the built-in `str` and `int` convertors
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(Self::DEFAULT_TAG, RawConvertor);
        registry.register("int", IntegerConvertor);
        registry
    }

    /// Register `convertor` under `tag`, returning any convertor it replaced
    pub fn register<C: Convertor + 'static>(
        &mut self,
        tag: &str,
        convertor: C,
    ) -> Option<Arc<dyn Convertor>> {
        self.register_arc(tag, Arc::new(convertor))
    }

    /// Register an already shared convertor under `tag`
    pub fn register_arc(
        &mut self,
        tag: &str,
        convertor: Arc<dyn Convertor>,
    ) -> Option<Arc<dyn Convertor>> {
        self.convertors.insert(tag.to_owned(), convertor)
    }

    /// Look up the convertor for `tag`
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<Arc<dyn Convertor>> {
        self.convertors.get(tag).map(Arc::clone)
    }

    /// Registered tags in sorted order
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.convertors.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl fmt::Debug for ConvertorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertorRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

static GLOBAL_REGISTRY: Lazy<ArcSwap<ConvertorRegistry>> =
    Lazy::new(|| ArcSwap::from_pointee(ConvertorRegistry::with_builtins()));

/// Snapshot of the process-wide convertor registry
#[must_use]
pub fn global_registry() -> Arc<ConvertorRegistry> {
    GLOBAL_REGISTRY.load_full()
}

/// Add a convertor to the process-wide registry.
///
/// Only patterns compiled after this call can use `tag`; routes that were
/// already compiled keep the convertors they were built with.
pub fn register_convertor<C: Convertor + 'static>(tag: &str, convertor: C) {
    let convertor: Arc<dyn Convertor> = Arc::new(convertor);
    GLOBAL_REGISTRY.rcu(|current| {
        let mut next = ConvertorRegistry::clone(current);
        next.register_arc(tag, Arc::clone(&convertor));
        next
    });
    info!(tag, convertor = convertor.name(), "Registered path convertor");
}
