//! Route pattern compilation.
//!
//! Turns `/student/{name:str}/{age:int}` into the normalized form
//! `/student/{name}/{age}` plus an ordered list of `(name, convertor)` pairs.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

use super::convertor::{global_registry, Convertor, ConvertorRegistry};
use crate::error::RouteError;

/// `{identifier}` or `{identifier:tag}`; the identifier may not start with a digit
static PARAM_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([^\d\W]\w*)(?::(\w+))?\}").expect("placeholder regex should be valid")
});

/// Ordered `(name, convertor)` pairs in declaration order
pub type ConvertorList = Vec<(Arc<str>, Arc<dyn Convertor>)>;

/// One piece of a compiled pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Literal text, matched verbatim
    Static(String),
    /// Capture slot
    Param {
        /// Index into [`CompiledPath::convertors`]
        index: usize,
        /// Registry tag the convertor was looked up under
        tag: Arc<str>,
    },
}

/// Output of [`compile_path`]
#[derive(Clone)]
pub struct CompiledPath {
    /// The pattern exactly as registered
    pub pattern: String,
    /// The pattern with every placeholder reduced to `{name}`
    pub normalized: String,
    /// Parameter convertors in the order the placeholders appear
    pub convertors: ConvertorList,
    /// Static runs and capture slots, in order
    pub segments: Vec<PathSegment>,
}

impl CompiledPath {
    /// Convertor bound to parameter `name`
    #[must_use]
    pub fn convertor(&self, name: &str) -> Option<&Arc<dyn Convertor>> {
        self.convertors
            .iter()
            .find(|(n, _)| n.as_ref() == name)
            .map(|(_, c)| c)
    }

    /// Parameter names in declaration order
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.convertors.iter().map(|(n, _)| n.as_ref())
    }
}

impl fmt::Debug for CompiledPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<(&str, &str)> = self
            .convertors
            .iter()
            .map(|(n, c)| (n.as_ref(), c.name()))
            .collect();
        f.debug_struct("CompiledPath")
            .field("pattern", &self.pattern)
            .field("normalized", &self.normalized)
            .field("params", &params)
            .finish()
    }
}

/// Compile `pattern` against the process-wide convertor registry
pub fn compile_path(pattern: &str) -> Result<CompiledPath, RouteError> {
    compile_path_with(pattern, &global_registry())
}

/// Compile `pattern` against an explicit registry
pub fn compile_path_with(
    pattern: &str,
    registry: &ConvertorRegistry,
) -> Result<CompiledPath, RouteError> {
    validate_pattern(pattern)?;

    let mut normalized = String::with_capacity(pattern.len());
    let mut convertors: ConvertorList = Vec::new();
    let mut segments = Vec::new();
    let mut idx = 0;

    for caps in PARAM_REGEX.captures_iter(pattern) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let name = name.as_str();
        let tag = caps
            .get(2)
            .map_or(ConvertorRegistry::DEFAULT_TAG, |m| m.as_str());

        let convertor = registry
            .get(tag)
            .ok_or_else(|| RouteError::UnknownConvertor {
                tag: tag.to_owned(),
            })?;

        if convertors.iter().any(|(n, _)| n.as_ref() == name) {
            return Err(RouteError::DuplicateParameter {
                pattern: pattern.to_owned(),
                name: name.to_owned(),
            });
        }

        let literal = &pattern[idx..whole.start()];
        if !literal.is_empty() {
            segments.push(PathSegment::Static(literal.to_owned()));
        }
        segments.push(PathSegment::Param {
            index: convertors.len(),
            tag: Arc::from(tag),
        });

        normalized.push_str(literal);
        normalized.push('{');
        normalized.push_str(name);
        normalized.push('}');
        convertors.push((Arc::from(name), convertor));

        idx = whole.end();
    }
    let tail = &pattern[idx..];
    if !tail.is_empty() {
        segments.push(PathSegment::Static(tail.to_owned()));
    }
    normalized.push_str(tail);

    Ok(CompiledPath {
        pattern: pattern.to_owned(),
        normalized,
        convertors,
        segments,
    })
}

fn validate_pattern(pattern: &str) -> Result<(), RouteError> {
    let invalid = |reason| RouteError::InvalidPattern {
        pattern: pattern.to_owned(),
        reason,
    };
    if !pattern.starts_with('/') {
        return Err(invalid("route path must start with '/'"));
    }
    if pattern.len() > 1 && pattern.ends_with('/') {
        return Err(invalid("route path must not end with '/'"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(compiled: &CompiledPath) -> Vec<(&str, &str)> {
        compiled
            .convertors
            .iter()
            .map(|(n, c)| (n.as_ref(), c.name()))
            .collect()
    }

    #[test]
    fn static_path_is_unchanged() {
        let compiled = compile_path("/path").unwrap();
        assert_eq!(compiled.normalized, "/path");
        assert!(compiled.convertors.is_empty());
    }

    #[test]
    fn default_and_explicit_str_normalize_identically() {
        let bare = compile_path("/hello/{name}").unwrap();
        let typed = compile_path("/hello/{name:str}").unwrap();
        assert_eq!(bare.normalized, "/hello/{name}");
        assert_eq!(typed.normalized, "/hello/{name}");
        assert_eq!(names(&bare), vec![("name", "str")]);
        assert_eq!(names(&typed), vec![("name", "str")]);
    }

    #[test]
    fn mixed_convertors_keep_declaration_order() {
        let compiled = compile_path("/student/{name:str}/{age:int}").unwrap();
        assert_eq!(compiled.normalized, "/student/{name}/{age}");
        assert_eq!(names(&compiled), vec![("name", "str"), ("age", "int")]);
        assert_eq!(
            compiled.param_names().collect::<Vec<_>>(),
            vec!["name", "age"]
        );
    }

    #[test]
    fn literal_text_around_placeholders_is_kept() {
        let compiled = compile_path("/archives/file.{suffix}").unwrap();
        assert_eq!(compiled.normalized, "/archives/file.{suffix}");
        assert_eq!(compiled.convertor("suffix").map(|c| c.name()), Some("str"));
    }

    #[test]
    fn unknown_tag_is_reported() {
        let err = compile_path("/x/{x:uuid}").unwrap_err();
        assert_eq!(
            err,
            RouteError::UnknownConvertor {
                tag: "uuid".to_string()
            }
        );
    }

    #[test]
    fn identifier_starting_with_digit_is_literal() {
        let compiled = compile_path("/x/{1abc}").unwrap();
        assert_eq!(compiled.normalized, "/x/{1abc}");
        assert!(compiled.convertors.is_empty());
        assert_eq!(
            compiled.segments,
            vec![PathSegment::Static("/x/{1abc}".to_string())]
        );
    }

    #[test]
    fn segments_alternate_static_and_param() {
        let compiled = compile_path("/a/{x}{y:int}.json").unwrap();
        assert_eq!(
            compiled.segments,
            vec![
                PathSegment::Static("/a/".to_string()),
                PathSegment::Param {
                    index: 0,
                    tag: Arc::from("str"),
                },
                PathSegment::Param {
                    index: 1,
                    tag: Arc::from("int"),
                },
                PathSegment::Static(".json".to_string()),
            ]
        );
    }

    #[test]
    fn pattern_must_start_with_slash() {
        assert!(matches!(
            compile_path("hello"),
            Err(RouteError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn pattern_must_not_end_with_slash() {
        assert!(matches!(
            compile_path("/hello/"),
            Err(RouteError::InvalidPattern { .. })
        ));
        assert!(compile_path("/").is_ok());
    }

    #[test]
    fn repeated_parameter_is_rejected() {
        let err = compile_path("/a/{id}/b/{id:int}").unwrap_err();
        assert_eq!(
            err,
            RouteError::DuplicateParameter {
                pattern: "/a/{id}/b/{id:int}".to_string(),
                name: "id".to_string()
            }
        );
    }

    #[test]
    fn compilation_is_deterministic() {
        let a = compile_path("/student/{name:str}/{age:int}").unwrap();
        let b = compile_path("/student/{name:str}/{age:int}").unwrap();
        assert_eq!(a.normalized, b.normalized);
        assert_eq!(names(&a), names(&b));
    }

    #[test]
    fn explicit_registry_is_used() {
        let registry = ConvertorRegistry::empty();
        assert!(matches!(
            compile_path_with("/x/{x}", &registry),
            Err(RouteError::UnknownConvertor { .. })
        ));
    }
}
