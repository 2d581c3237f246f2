use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use regdiag::server::router::{DiagState, diag_router};
use tower::ServiceExt;

fn test_app() -> axum::Router {
    diag_router(DiagState::new(reqwest::Client::new()))
}

async fn get_body(resp: axum::response::Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    String::from_utf8(bytes.to_vec()).expect("response body was not utf-8")
}

#[tokio::test]
async fn root_reports_ok() {
    let resp = test_app()
        .oneshot(Request::get("/").body(Body::empty()).expect("build request"))
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = get_body(resp).await;
    assert!(body.contains(r#""status":"OK""#));
}

#[tokio::test]
async fn health_reports_the_configured_port() {
    let resp = test_app()
        .oneshot(
            Request::get("/health")
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = get_body(resp).await;
    assert!(body.contains(r#""status":"healthy""#));
    assert!(body.contains(r#""port""#));
}

#[tokio::test]
async fn debug_dumps_the_environment_and_detected_scheme() {
    let resp = test_app()
        .oneshot(
            Request::get("/debug")
                .header("x-forwarded-proto", "https")
                .header("x-forwarded-host", "api.example.pe")
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("x-proxy-handled").map(|v| v.as_bytes()),
        Some(&b"true"[..])
    );
    let body = get_body(resp).await;
    assert!(body.contains(r#""env_vars""#));
    assert!(body.contains(r#""scheme":"https""#));
}

#[tokio::test]
async fn debug_without_proxy_headers_reports_no_scheme() {
    let resp = test_app()
        .oneshot(
            Request::get("/debug")
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = get_body(resp).await;
    assert!(body.contains(r#""scheme":null"#));
}

#[tokio::test]
async fn unknown_routes_return_404() {
    let resp = test_app()
        .oneshot(
            Request::get("/api/notifications")
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
