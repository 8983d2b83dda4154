use super::{Route, Router};
use crate::error::RouteError;
use crate::path::{
    ConvertError, Convertor, ConvertorRegistry, ParamNotMatched, ParamValue, RawConvertor,
    RegexConvertor,
};
use crate::runtime_config::RouterConfig;

fn router(patterns: &[&'static str]) -> Router<&'static str> {
    let mut router = Router::new();
    for &p in patterns {
        router.register(p, p).unwrap();
    }
    router
}

#[test]
fn test_root_path() {
    let router = router(&["/"]);
    let matched = router.resolve("/").unwrap();
    assert_eq!(*matched.handler(), "/");
    assert!(matched.params.is_empty());
}

#[test]
fn test_parameterized_path() {
    let router = router(&["/items/{id}"]);
    let matched = router.resolve("/items/123").unwrap();
    assert_eq!(matched.params.get("id"), Some(&ParamValue::Str("123".to_string())));
}

#[test]
fn test_nested_path() {
    let router = router(&["/a/{b}/c"]);
    let matched = router.resolve("/a/1/c").unwrap();
    assert_eq!(matched.params.get_str("b"), Some("1"));
    assert!(router.resolve("/a/1/d").is_err());
}

#[test]
fn test_static_beats_dynamic_regardless_of_order() {
    let dynamic_first = router(&["/project/{id}", "/project/top"]);
    let static_first = router(&["/project/top", "/project/{id}"]);
    for router in [&dynamic_first, &static_first] {
        assert_eq!(*router.resolve("/project/top").unwrap().handler(), "/project/top");
        assert_eq!(*router.resolve("/project/tops").unwrap().handler(), "/project/{id}");
    }
}

#[test]
fn test_dynamic_fallback_when_static_branch_dead_ends() {
    let router = router(&["/files/new/upload", "/files/{name}"]);
    let matched = router.resolve("/files/new").unwrap();
    assert_eq!(*matched.handler(), "/files/{name}");
    assert_eq!(matched.params.get_str("name"), Some("new"));
}

#[test]
fn test_params_follow_declaration_order() {
    let router = router(&["/student/{name:str}/{age:int}"]);
    let matched = router.resolve("/student/ann/7").unwrap();
    let names: Vec<&str> = matched.params.iter().map(|(k, _)| k).collect();
    assert_eq!(names, vec!["name", "age"]);
    assert_eq!(matched.params.get_int("age"), Some(7));
}

#[test]
fn test_max_path_len_is_enforced() {
    let mut router = Router::with_config(RouterConfig {
        max_path_len: 8,
        ..Default::default()
    });
    router.register("/{x}", "x").unwrap();
    assert!(router.resolve("/1234567").is_ok());
    assert!(router.resolve("/12345678").is_err());
}

#[test]
fn test_upsert_merges_into_existing_handler() {
    let mut router: Router<Vec<&str>> = Router::new();
    let insert = |m: &'static str| vec![m];
    let update = |methods: &mut Vec<&'static str>, m: &'static str| -> Result<(), RouteError> {
        methods.push(m);
        Ok(())
    };
    router.upsert("/x/{id:int}", "GET", insert, update).unwrap();
    router.upsert("/x/{id:int}", "POST", insert, update).unwrap();
    assert_eq!(router.len(), 1);
    assert_eq!(router.resolve("/x/1").unwrap().handler(), &vec!["GET", "POST"]);
}

#[test]
fn test_upsert_still_detects_conflicts() {
    let mut router: Router<()> = Router::new();
    router.upsert("/x/{id:int}", (), |()| (), |_, ()| Ok(())).unwrap();
    let err = router.upsert("/x/{id}", (), |()| (), |_, ()| Ok(())).unwrap_err();
    assert!(matches!(err, RouteError::ConflictingParameter { .. }));
}

#[test]
fn test_failed_registration_does_not_count() {
    let mut router = router(&["/a"]);
    assert!(router.register("/a", "again").is_err());
    assert!(router.register("/b/{x:nope}", "b").is_err());
    assert_eq!(router.len(), 1);
}

#[test]
fn test_static_longer_than_max_path_len_is_rejected() {
    let mut router = Router::new();
    let long = format!("/{}", "a".repeat(RouterConfig::default().max_path_len));
    let err = router.register(&long, "long").unwrap_err();
    assert!(matches!(err, RouteError::InvalidPattern { .. }));
    assert!(router.is_empty());

    let fits = format!("/{}", "a".repeat(RouterConfig::default().max_path_len - 1));
    router.register(&fits, "fits").unwrap();
    assert_eq!(*router.resolve(&fits).unwrap().handler(), "fits");
}

#[test]
fn test_shortest_match_counts_one_byte_per_capture() {
    let mut router = Router::with_config(RouterConfig {
        max_path_len: 6,
        ..Default::default()
    });
    router.register("/ab/{x}", "ok").unwrap();
    assert!(router.resolve("/ab/1").is_ok());
    assert!(matches!(
        router.register("/abc/{x}/{y}", "too_long"),
        Err(RouteError::InvalidPattern { .. })
    ));
    let route = Route::new("/abcdef", "prebuilt").unwrap();
    assert!(matches!(
        router.add_route(route),
        Err(RouteError::InvalidPattern { .. })
    ));
    assert_eq!(router.len(), 1);
}

#[test]
fn test_same_convertor_name_under_other_tag_conflicts() {
    let mut registry = ConvertorRegistry::with_builtins();
    registry.register("slug", RegexConvertor::new("str", "[a-z]+").unwrap());
    let mut router = Router::new().with_registry(registry);
    router.register("/u/{id}", "raw").unwrap();
    let err = router.register("/u/{id:slug}/x", "slug").unwrap_err();
    assert_eq!(
        err,
        RouteError::ConflictingParameter {
            position: "/u/".to_string(),
            existing: "id:str".to_string(),
            incoming: "id:slug".to_string(),
        }
    );
}

#[test]
fn test_same_tag_from_different_registries_shares_slot() {
    let mut registry = ConvertorRegistry::with_builtins();
    registry.register("str", RawConvertor);
    let mut router = Router::new().with_registry(registry);
    router.register("/u/{id}", "a").unwrap();
    router.add_route(Route::new("/u/{id}/x", "b").unwrap()).unwrap();
    assert_eq!(*router.resolve("/u/1/x").unwrap().handler(), "b");
}

/// Matches any digit run but refuses to convert odd numbers
#[derive(Debug)]
struct EvenOnly;

impl Convertor for EvenOnly {
    fn name(&self) -> &str {
        "even"
    }

    fn match_prefix<'p>(&self, path: &'p str) -> Result<&'p str, ParamNotMatched> {
        let end = path
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(path.len());
        if end == 0 {
            return Err(ParamNotMatched);
        }
        Ok(&path[..end])
    }

    fn convert(&self, value: &str) -> Result<ParamValue, ConvertError> {
        match value.parse::<i64>() {
            Ok(n) if n % 2 == 0 => Ok(ParamValue::Int(n)),
            _ => Err(ConvertError {
                convertor: "even".to_string(),
                value: value.to_string(),
                reason: "odd number".to_string(),
            }),
        }
    }
}

fn even_router() -> Router<&'static str> {
    let mut registry = ConvertorRegistry::with_builtins();
    registry.register("even", EvenOnly);
    let mut router = Router::new().with_registry(registry);
    router.register("/n/{n:even}", "even").unwrap();
    router
}

#[test]
fn test_convertible_capture_resolves() {
    let router = even_router();
    assert_eq!(router.resolve("/n/42").unwrap().params.get_int("n"), Some(42));
}

#[test]
#[should_panic(expected = "broken convertor")]
fn test_capture_that_fails_conversion_panics() {
    let router = even_router();
    let _matched = router.resolve("/n/7");
}
