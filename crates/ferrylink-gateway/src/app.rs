use axum::middleware;
use axum::routing::{any, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    cors_middleware, index_handler, meta_handler, missing_target_handler, proxy_handler,
    resolve_handler, shorten_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    /// Builds the relay router.
    ///
    /// `OPTIONS` is answered by the CORS middleware before routing. Paths not
    /// matched below are direct proxy targets; wrong methods on the API
    /// routes get `405`.
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/", get(index_handler).fallback(missing_target_handler))
            .route("/d/{code}", any(resolve_handler))
            .route("/api/shorten", post(shorten_handler))
            .route("/api/meta", get(meta_handler))
            .fallback(proxy_handler)
            .layer(middleware::from_fn(cors_middleware))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::response::Response;
    use ferrylink_cache::MokaResponseCache;
    use ferrylink_core::config::DEFAULT_ALLOWED_HOSTS;
    use ferrylink_core::{AllowList, KvStore, RelayConfig, StorageError};
    use ferrylink_proxy::{build_client, MetadataResolver, ProxyEngine};
    use ferrylink_shortener::{RandomGenerator, ShortLinkRegistry};
    use ferrylink_storage::InMemoryKvStore;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn router() -> Router {
        router_with_store(InMemoryKvStore::new())
    }

    fn router_with_store(kv: impl KvStore) -> Router {
        let config = Arc::new(
            RelayConfig::builder()
                .allow_list(AllowList::new(
                    DEFAULT_ALLOWED_HOSTS.iter().copied().chain(["127.0.0.1"]),
                ))
                .build(),
        );
        let client = build_client(&config).unwrap();
        let state = AppState::builder()
            .shortener(Arc::new(ShortLinkRegistry::new(
                kv,
                RandomGenerator::new(),
                config.clone(),
            )))
            .engine(Arc::new(ProxyEngine::new(
                client.clone(),
                Arc::new(MokaResponseCache::new()),
                config.clone(),
            )))
            .resolver(Arc::new(MetadataResolver::new(client, config.clone())))
            .config(config)
            .build();
        App::router(state)
    }

    /// A store whose backend is always down.
    struct UnavailableStore;

    #[async_trait::async_trait]
    impl KvStore for UnavailableStore {
        async fn get(&self, _key: &str) -> ferrylink_core::kv::Result<Option<String>> {
            Err(StorageError::Unavailable("connection refused".into()))
        }

        async fn put(&self, _key: &str, _value: &str) -> ferrylink_core::kv::Result<()> {
            Err(StorageError::Unavailable("connection refused".into()))
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> Response {
        router.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn shorten_request(body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/shorten")
            .header(header::HOST, "relay.test")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    /// Query-string escaping for the characters found in test URLs.
    fn escape(url: &str) -> String {
        url.replace(':', "%3A").replace('/', "%2F")
    }

    #[tokio::test]
    async fn index_serves_html() {
        let response = send(&router(), get("/")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
    }

    #[tokio::test]
    async fn post_to_root_is_bad_request() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let response = send(&router(), request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({"error": "Missing target URL"}));
    }

    #[tokio::test]
    async fn preflight_on_any_path() {
        for uri in ["/", "/api/shorten", "/d/abc123", "/github.com/o/r"] {
            let request = Request::builder()
                .method(Method::OPTIONS)
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let response = send(&router(), request).await;

            assert_eq!(response.status(), StatusCode::NO_CONTENT);
            assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            assert_eq!(
                response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
                "GET, HEAD, POST, OPTIONS"
            );
        }
    }

    #[tokio::test]
    async fn shorten_is_idempotent() {
        let router = router();
        let url = "github.com/a/b/archive/refs/heads/main.zip";

        let first = send(&router, shorten_request(json!({ "url": url }))).await;
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let first = json_body(first).await;

        let code = first["code"].as_str().unwrap();
        assert_eq!(code.len(), 6);
        assert_eq!(
            first["long"],
            "https://github.com/a/b/archive/refs/heads/main.zip"
        );
        assert_eq!(first["short"], format!("http://relay.test/d/{code}"));

        let second = json_body(send(&router, shorten_request(json!({ "url": url }))).await).await;
        assert_eq!(second["code"], first["code"]);
    }

    #[tokio::test]
    async fn shorten_rejects_disallowed_host() {
        let response = send(
            &router(),
            shorten_request(json!({ "url": "https://example.com/file.zip" })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({"error": "Host not allowed"}));
    }

    #[tokio::test]
    async fn shorten_rejects_malformed_body() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/shorten")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = send(&router(), request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Invalid request body");
    }

    #[tokio::test]
    async fn shorten_storage_failure_is_internal_error() {
        let response = send(
            &router_with_store(UnavailableStore),
            shorten_request(json!({ "url": "github.com/a/b/archive/main.zip" })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            json_body(response).await,
            json!({"error": "Internal storage error"})
        );
    }

    #[tokio::test]
    async fn resolve_storage_failure_is_internal_error() {
        let response = send(&router_with_store(UnavailableStore), get("/d/abc123")).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({"error": "Internal storage error"})
        );
    }

    #[tokio::test]
    async fn wrong_method_on_api_routes() {
        let response = send(&router(), get("/api/shorten")).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/meta")
            .body(Body::empty())
            .unwrap();
        let response = send(&router(), request).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn unknown_code_is_not_found_page() {
        let response = send(&router(), get("/d/doesnotexist")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
    }

    #[tokio::test]
    async fn meta_for_disallowed_host() {
        let uri = format!("/api/meta?url={}", escape("https://example.com/x.zip"));
        let response = send(&router(), get(&uri)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({"error": "Failed to fetch metadata", "details": "Host not allowed"})
        );
    }

    #[tokio::test]
    async fn meta_without_url() {
        let response = send(&router(), get("/api/meta")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({"error": "Failed to fetch metadata", "details": "Invalid URL"})
        );
    }

    #[tokio::test]
    async fn meta_probes_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(206)
                    .insert_header("content-range", "bytes 0-0/1024")
                    .set_body_bytes(vec![0u8]),
            )
            .mount(&server)
            .await;

        let target = format!("{}/o/r/releases/download/v2/tool.zip", server.uri());
        let uri = format!("/api/meta?url={}", escape(&target));
        let response = send(&router(), get(&uri)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"name": "tool.zip", "size": 1024, "type": "Release", "ok": true})
        );
    }

    #[tokio::test]
    async fn short_link_and_direct_path_are_proxied() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/o/r/archive/main.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archive".to_vec()))
            .mount(&server)
            .await;

        let router = router();
        let target = format!("{}/o/r/archive/main.zip", server.uri());
        let created = json_body(send(&router, shorten_request(json!({ "url": target }))).await).await;
        let code = created["code"].as_str().unwrap();

        let via_link = send(&router, get(&format!("/d/{code}"))).await;
        assert_eq!(via_link.status(), StatusCode::OK);
        assert_eq!(via_link.headers()["x-cache-status"], "MISS");
        assert_eq!(
            via_link.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename*=UTF-8''main.zip"
        );
        let body = to_bytes(via_link.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"archive");

        let direct = send(&router, get(&format!("/{target}"))).await;
        assert_eq!(direct.status(), StatusCode::OK);
        assert_eq!(direct.headers()["x-served-by"], "ferrylink");
    }

    #[tokio::test]
    async fn direct_path_to_disallowed_host() {
        let response = send(&router(), get("/https://example.com/file.zip")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({"error": "Host not allowed"}));
    }
}
