use silkrouter::path::{
    compile_path, compile_path_with, register_convertor, ConvertError, Convertor,
    ConvertorRegistry, ParamNotMatched, ParamValue, RegexConvertor,
};
use silkrouter::{RouteError, Router};

#[test]
fn test_static_pattern_has_no_params() {
    let compiled = compile_path("/path").unwrap();
    assert_eq!(compiled.normalized, "/path");
    assert!(compiled.convertors.is_empty());
}

#[test]
fn test_default_tag_is_raw_string() {
    let bare = compile_path("/hello/{name}").unwrap();
    let tagged = compile_path("/hello/{name:str}").unwrap();
    assert_eq!(bare.normalized, "/hello/{name}");
    assert_eq!(tagged.normalized, "/hello/{name}");
    assert_eq!(bare.convertor("name").unwrap().name(), "str");
    assert_eq!(tagged.convertor("name").unwrap().name(), "str");
}

#[test]
fn test_typed_params_keep_order() {
    let compiled = compile_path("/student/{name:str}/{age:int}").unwrap();
    assert_eq!(compiled.normalized, "/student/{name}/{age}");
    assert_eq!(compiled.param_names().collect::<Vec<_>>(), vec!["name", "age"]);
    assert_eq!(compiled.convertor("age").unwrap().name(), "int");
}

#[test]
fn test_unknown_tag_is_rejected() {
    let err = compile_path("/x/{x:uuid}").unwrap_err();
    assert_eq!(
        err,
        RouteError::UnknownConvertor {
            tag: "uuid".to_string()
        }
    );
    assert!(err.to_string().contains("uuid"));
}

/// Accepts lowercase words only and converts them to their length
#[derive(Debug)]
struct WordLength;

impl Convertor for WordLength {
    fn name(&self) -> &str {
        "wordlen"
    }

    fn match_prefix<'p>(&self, path: &'p str) -> Result<&'p str, ParamNotMatched> {
        let end = path
            .find(|c: char| !c.is_ascii_lowercase())
            .unwrap_or(path.len());
        if end == 0 {
            return Err(ParamNotMatched);
        }
        Ok(&path[..end])
    }

    fn convert(&self, value: &str) -> Result<ParamValue, ConvertError> {
        Ok(ParamValue::Int(value.len() as i64))
    }
}

#[test]
fn test_custom_convertor_in_router_registry() {
    let mut registry = ConvertorRegistry::with_builtins();
    registry.register("wordlen", WordLength);

    let compiled = compile_path_with("/w/{word:wordlen}", &registry).unwrap();
    assert_eq!(compiled.normalized, "/w/{word}");

    let mut router = Router::new().with_registry(registry);
    router.register("/w/{word:wordlen}", "word").unwrap();
    router.register("/w/{word:wordlen}/x", "word_x").unwrap();

    let matched = router.resolve("/w/hello").unwrap();
    assert_eq!(matched.params.get_int("word"), Some(5));
    assert!(router.resolve("/w/Hello").is_err());
    assert_eq!(*router.resolve("/w/ab/x").unwrap().handler(), "word_x");

    // Not visible through the process-wide registry
    assert!(compile_path("/w/{word:wordlen}").is_err());
}

#[test]
fn test_global_registration_before_compile() {
    register_convertor(
        "path_tests_slug",
        RegexConvertor::new("path_tests_slug", "[a-z0-9]+(?:-[a-z0-9]+)*").unwrap(),
    );

    let mut router = Router::new();
    router.register("/blog/{post:path_tests_slug}", "post").unwrap();
    let matched = router.resolve("/blog/hello-world-2").unwrap();
    assert_eq!(matched.params.get_str("post"), Some("hello-world-2"));
    assert!(router.resolve("/blog/Hello").is_err());
    assert!(router.resolve("/blog/-").is_err());
}

#[test]
fn test_integer_overflow_is_not_found() {
    let mut router = Router::new();
    router.register("/order/{id:int}", "order").unwrap();
    assert_eq!(
        router.resolve("/order/9223372036854775807").unwrap().params.get_int("id"),
        Some(i64::MAX)
    );
    assert!(router.resolve("/order/9223372036854775808").is_err());
}
