use httpmaker_http::{
    CacheProvider, FileCache, HeaderFilter, HttpMakerAsync, MakeRequest, MakerError, RetryPolicy,
};
use httpmaker_test_harness::mocks::Reply;
use httpmaker_test_harness::{cache_dir, init, TestHttpServer, UNREACHABLE_URL};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn maker_for(server: &TestHttpServer) -> HttpMakerAsync {
    HttpMakerAsync::builder()
        .base_url(server.url())
        .retry_policy(RetryPolicy::immediate(3))
        .build_async()
        .expect("Failed to build executor")
}

#[tokio::test]
async fn test_get_object_body() {
    init();
    let server = TestHttpServer::start().await;
    server
        .get_json("/users/1", &json!({"id": 1, "name": "Ada"}))
        .await;
    let maker = maker_for(&server);

    let response = maker.get("users/1").await.unwrap().unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.url(), server.url_for("users/1"));
    assert_eq!(response.body().get("name"), Some(&json!("Ada")));
    assert_eq!(response.header("content-type"), Some("application/json"));
}

#[tokio::test]
async fn test_array_body_is_wrapped() {
    init();
    let server = TestHttpServer::start().await;
    server.get_json("/items", &json!([1, 2, 3])).await;
    let maker = maker_for(&server);

    let response = maker.get("/items").await.unwrap().unwrap();

    assert_eq!(Value::Object(response.body().clone()), json!({"data": [1, 2, 3]}));
}

#[tokio::test]
async fn test_unsupported_content_type_yields_none() {
    init();
    let server = TestHttpServer::start().await;
    server
        .respond_raw("GET", "/plain", 200, Some("text/plain"), "hello")
        .await;
    let maker = maker_for(&server);

    assert!(maker.get("plain").await.unwrap().is_none());
    server.verify_received("/plain", 1).await;
}

#[tokio::test]
async fn test_error_status_keeps_body() {
    init();
    let server = TestHttpServer::start().await;
    server
        .respond_json("GET", "/missing", 404, &json!({"detail": "not here"}))
        .await;
    let maker = maker_for(&server);

    let response = maker.get("missing").await.unwrap().unwrap();

    assert_eq!(response.status(), 404);
    assert!(!response.is_success());
    assert_eq!(response.body().get("detail"), Some(&json!("not here")));
}

#[tokio::test]
async fn test_unparseable_json_becomes_error_body() {
    init();
    let server = TestHttpServer::start().await;
    server
        .respond_raw("GET", "/broken", 502, Some("application/json"), "{oops")
        .await;
    let maker = maker_for(&server);

    let response = maker.get("broken").await.unwrap().unwrap();

    assert_eq!(response.status(), 502);
    assert_eq!(response.body().get("error"), Some(&json!("{oops")));
}

#[tokio::test]
async fn test_post_sends_json_params_and_headers() {
    init();
    let server = TestHttpServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(query_param("dry_run", "true"))
        .and(header("x-api-key", "secret"))
        .and(header("x-trace", "call"))
        .and(body_json(json!({"sku": "A-1", "qty": 2})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 99})))
        .mount(server.inner())
        .await;

    let maker = HttpMakerAsync::builder()
        .base_url(server.url())
        .header("X-Api-Key", "secret")
        .header("X-Trace", "default")
        .build_async()
        .unwrap();

    let response = maker
        .make(
            MakeRequest::post("orders")
                .param("dry_run", "true")
                .header("x-trace", "call")
                .json(json!({"sku": "A-1", "qty": 2})),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(response.status(), 201);
    assert_eq!(response.body().get("id"), Some(&json!(99)));
}

#[tokio::test]
async fn test_every_method_reaches_server() {
    init();
    let server = TestHttpServer::start().await;
    for verb in ["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"] {
        server.respond_json(verb, "/any", 200, &json!({"verb": verb})).await;
    }
    server.respond_raw("HEAD", "/any", 200, None, "").await;
    let maker = maker_for(&server);

    for verb in ["get", "Post", "PUT", "delete", "patch", "options"] {
        let response = maker.make(MakeRequest::new(verb, "any")).await.unwrap().unwrap();
        assert_eq!(
            response.body().get("verb"),
            Some(&json!(verb.to_uppercase()))
        );
    }

    // Empty body with no content type parses as an error-shaped mapping.
    let head = maker.make(MakeRequest::head("any")).await.unwrap().unwrap();
    assert_eq!(head.status(), 200);
    assert_eq!(head.body().get("error"), Some(&json!("")));
}

#[tokio::test]
async fn test_unsupported_method_is_error() {
    init();
    let server = TestHttpServer::start().await;
    let maker = maker_for(&server);

    let err = maker.make(MakeRequest::new("TRACE", "x")).await.unwrap_err();

    assert!(matches!(err, MakerError::UnsupportedMethod(_)));
    assert!(server.received_requests().await.is_empty());
}

#[tokio::test]
async fn test_unreachable_host_without_wait() {
    init();
    let maker = HttpMakerAsync::builder()
        .base_url(UNREACHABLE_URL)
        .build_async()
        .unwrap();

    let response = maker
        .make(MakeRequest::get("anything").allow_retry_wait(false))
        .await
        .unwrap();

    assert!(response.is_none());
}

#[tokio::test]
async fn test_server_recovers_within_attempts() {
    init();
    let server = TestHttpServer::start().await;
    server
        .sequence(
            "/flaky",
            vec![
                Reply::new(200)
                    .set_body_json(json!({"ok": false}))
                    .set_delay(Duration::from_secs(2)),
                Reply::new(200).set_body_json(json!({"ok": true})),
            ],
        )
        .await;
    let maker = HttpMakerAsync::builder()
        .base_url(server.url())
        .retry_policy(RetryPolicy::immediate(3))
        .timeout(Duration::from_millis(300))
        .build_async()
        .unwrap();

    let response = maker.get("flaky").await.unwrap().unwrap();

    assert_eq!(response.body().get("ok"), Some(&json!(true)));
    server.verify_received("/flaky", 2).await;
}

#[tokio::test]
async fn test_timeouts_exhaust_attempts() {
    init();
    let server = TestHttpServer::start().await;
    Mock::given(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(server.inner())
        .await;
    let maker = HttpMakerAsync::builder()
        .base_url(server.url())
        .retry_policy(RetryPolicy::immediate(2))
        .timeout(Duration::from_millis(200))
        .build_async()
        .unwrap();

    assert!(maker.get("slow").await.unwrap().is_none());
    server.verify_received("/slow", 2).await;
}

#[tokio::test]
async fn test_file_cache_serves_second_call() {
    init();
    let server = TestHttpServer::start().await;
    server.get_json("/catalog", &json!({"items": ["a"]})).await;
    let dir = cache_dir();
    let cache = FileCache::new(dir.path())
        .unwrap()
        .with_header_filter(HeaderFilter::All);
    let maker = HttpMakerAsync::builder()
        .base_url(server.url())
        .cache(cache.clone())
        .build_async()
        .unwrap();

    let first = maker.get("catalog").await.unwrap().unwrap();
    let second = maker.get("catalog").await.unwrap().unwrap();

    server.verify_received("/catalog", 1).await;
    assert_eq!(first.body(), second.body());
    assert_eq!(second.header("content-type"), Some("application/json"));
    assert!(cache.path_for(&server.url_for("catalog")).is_file());

    assert!(maker.evict("catalog"));
    maker.get("catalog").await.unwrap().unwrap();
    server.verify_received("/catalog", 2).await;
}

#[tokio::test]
async fn test_cache_only_uses_expired_entry() {
    init();
    let server = TestHttpServer::start().await;
    server.get_json("/report", &json!({"rev": 2})).await;
    let dir = cache_dir();
    let cache = FileCache::new(dir.path()).unwrap().with_condition(|_| false);
    let maker = HttpMakerAsync::builder()
        .base_url(server.url())
        .cache(cache)
        .build_async()
        .unwrap();

    maker.get("report").await.unwrap().unwrap();
    // The condition rejects everything, so this goes back to the network.
    maker.get("report").await.unwrap().unwrap();
    server.verify_received("/report", 2).await;

    let cached = maker
        .make(MakeRequest::get("report").cache_only(true))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cached.body().get("rev"), Some(&json!(2)));
    server.verify_received("/report", 2).await;

    let stored = maker
        .cache()
        .unwrap()
        .get(&server.url_for("report"))
        .unwrap()
        .unwrap();
    assert!(stored.headers().is_empty());
}

#[tokio::test]
async fn test_query_params_cached_per_url() {
    init();
    let server = TestHttpServer::start().await;
    for page in ["1", "2"] {
        Mock::given(method("GET"))
            .and(path("/pages"))
            .and(query_param("page", page))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"page": page})))
            .mount(server.inner())
            .await;
    }
    let dir = cache_dir();
    let maker = HttpMakerAsync::builder()
        .base_url(server.url())
        .cache(FileCache::new(dir.path()).unwrap())
        .build_async()
        .unwrap();
    let page = |n: &str| MakeRequest::get("pages").param("page", n);

    let one = maker.make(page("1")).await.unwrap().unwrap();
    let two = maker.make(page("2")).await.unwrap().unwrap();
    let one_again = maker.make(page("1")).await.unwrap().unwrap();

    assert_eq!(one.url(), format!("{}?page=1", server.url_for("pages")));
    assert_eq!(one.body().get("page"), Some(&json!("1")));
    assert_eq!(two.body().get("page"), Some(&json!("2")));
    assert_eq!(one_again.body(), one.body());
    server.verify_received("/pages", 2).await;
}
