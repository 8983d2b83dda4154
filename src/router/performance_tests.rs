// Performance-focused tests for router scalability
//
// These tests check that lookup cost tracks the path length rather than the
// number of registered routes.

use super::Router;
use std::time::Instant;

#[test]
fn test_router_performance_with_many_routes() {
    let mut router = Router::new();
    for i in 0..500 {
        router
            .register(&format!("/api/v1/resource{i}/{{id:int}}"), i)
            .unwrap();
    }
    assert_eq!(router.len(), 500);

    let start = Instant::now();
    for _ in 0..1000 {
        let matched = router.resolve("/api/v1/resource250/123").unwrap();
        assert_eq!(*matched.handler(), 250);
    }
    let duration = start.elapsed();

    // Generous bound so unoptimized test builds stay green
    assert!(
        duration.as_millis() < 500,
        "Router performance degraded: {}ms for 1000 lookups with 500 routes",
        duration.as_millis()
    );
}

#[test]
fn test_router_repeated_lookups_are_stable() {
    let mut router = Router::new();
    router.register("/api/users/{id:int}", "get_user").unwrap();
    router.register("/api/users/{id:int}/posts", "get_posts").unwrap();
    router
        .register("/api/users/{id:int}/posts/{post_id}", "get_post")
        .unwrap();

    for i in 0..100 {
        let matched = router.resolve(&format!("/api/users/{i}/posts")).unwrap();
        assert_eq!(*matched.handler(), "get_posts");
        assert_eq!(matched.params.get_int("id"), Some(i));
    }
}

#[test]
fn test_router_deep_static_chain() {
    let mut router = Router::new();
    let deep: String = (0..200).map(|i| format!("/s{i}")).collect();
    router.register(&deep, "deep").unwrap();
    assert_eq!(*router.resolve(&deep).unwrap().handler(), "deep");
}

#[test]
fn test_router_pathological_input_terminates() {
    let mut router = Router::new();
    router.register("/{a}/{b}/{c}/end", "abc").unwrap();
    router.register("/x/{b}/y", "xy").unwrap();

    let long: String = "/x".repeat(2000);
    assert!(router.resolve(&long).is_err());
}
