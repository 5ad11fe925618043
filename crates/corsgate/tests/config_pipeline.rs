//! Configuration-driven pipelines.

use bytes::Bytes;
use corsgate::prelude::*;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};

const CONFIG: &str = r#"
[cors]
origin = ["http://www.example.com", "*.example.org"]
methods = ["GET", "POST", "PUT", "PATCH", "DELETE"]
credentials = true
cache = 86400

[cors.headers]
allow = ["Authorization", "If-Match", "If-Unmodified-Since"]
expose = ["Authorization", "Etag"]

[logging]
level = "warn,corsgate_middleware=debug"
format = "pretty"
"#;

fn load() -> CorsgateConfig {
    ConfigLoader::new()
        .with_string(CONFIG, "toml")
        .unwrap()
        .load()
        .unwrap()
}

fn preflight(origin: &str, method: &str, headers: &str) -> Request {
    http::Request::builder()
        .method(Method::OPTIONS)
        .uri("/api")
        .header("origin", origin)
        .header("access-control-request-method", method)
        .header("access-control-request-headers", headers)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

async fn run(cors: CorsMiddleware, request: Request) -> Response {
    Pipeline::builder()
        .stage(cors)
        .build()
        .process(MiddlewareContext::new(), request, |_ctx, _req| {
            Box::pin(async { Response::text(StatusCode::OK, "Success") })
        })
        .await
}

#[test]
fn test_logging_section_converts() {
    let log = load().logging.to_log_config();
    assert_eq!(log.level, "warn,corsgate_middleware=debug");
    assert!(!log.json_format);
}

#[tokio::test]
async fn test_preflight_from_config() {
    let cors = load().cors.build().unwrap();
    let response = run(cors, preflight("https://api.example.org", "PATCH", "If-Match")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "https://api.example.org");
    assert_eq!(headers["access-control-allow-methods"], "GET,POST,PUT,PATCH,DELETE");
    assert_eq!(headers["access-control-allow-headers"], "If-Match");
    assert_eq!(headers["access-control-allow-credentials"], "true");
    assert_eq!(headers["access-control-max-age"], "86400");
}

#[tokio::test]
async fn test_builder_from_config_accepts_error_handler() {
    let cors = load()
        .cors
        .to_builder()
        .error_handler(|_req: &Request, _res: Response, failure: &CorsFailure| {
            Response::text(StatusCode::FORBIDDEN, failure.context().to_string())
        })
        .build();

    let response = run(cors, preflight("http://www.foo.com", "GET", "Authorization")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let context: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(context["reason"], "origin_not_allowed");
    assert_eq!(context["origin"], "http://www.foo.com");
}
