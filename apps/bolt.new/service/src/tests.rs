use std::path::PathBuf;

use anyhow::Result;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, COOKIE};
use axum::http::{Request, StatusCode};
use bolt_app_state::UserAffordance;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::tempdir;
use tower::ServiceExt;

use crate::build_router;
use crate::config::{AuthProviderMode, Config};
use crate::{CACHE_DOCUMENT, CACHE_SHORT_LIVED, HTML_CONTENT_TYPE};

fn test_config(static_dir: PathBuf) -> Config {
    Config::for_tests(static_dir)
}

async fn read_json(response: axum::response::Response) -> Result<Value> {
    let bytes = response.into_body().collect().await?.to_bytes();
    let value = serde_json::from_slice::<Value>(&bytes)?;
    Ok(value)
}

async fn read_text(response: axum::response::Response) -> Result<String> {
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok(String::from_utf8(bytes.to_vec())?)
}

#[tokio::test]
async fn healthz_route_returns_ok() -> Result<()> {
    let app = build_router(test_config(std::env::temp_dir()));
    let request = Request::builder().uri("/healthz").body(Body::empty())?;
    let response = app.oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "bolt-web-service");
    assert_eq!(body["auth_provider"], "mock");
    Ok(())
}

#[tokio::test]
async fn readyz_reports_missing_static_dir() -> Result<()> {
    let static_dir = tempdir()?;
    let ready = build_router(test_config(static_dir.path().to_path_buf()))
        .oneshot(Request::builder().uri("/readyz").body(Body::empty())?)
        .await?;
    assert_eq!(ready.status(), StatusCode::OK);
    assert_eq!(read_json(ready).await?["status"], "ready");

    let missing = build_router(test_config(static_dir.path().join("missing")))
        .oneshot(Request::builder().uri("/readyz").body(Body::empty())?)
        .await?;
    assert_eq!(missing.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(read_json(missing).await?["status"], "not_ready");
    Ok(())
}

#[tokio::test]
async fn anonymous_request_renders_sign_in_branch() -> Result<()> {
    let app = build_router(test_config(std::env::temp_dir()));
    let request = Request::builder().uri("/").body(Body::empty())?;
    let response = app.oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).map(|value| value.as_bytes()),
        Some(HTML_CONTENT_TYPE.as_bytes())
    );
    assert_eq!(
        response.headers().get(CACHE_CONTROL).map(|value| value.as_bytes()),
        Some(CACHE_DOCUMENT.as_bytes())
    );
    assert!(response.headers().contains_key("x-request-id"));

    let html = read_text(response).await?;
    assert!(html.contains(r#"{"sessionId":null,"userId":null}"#));
    assert!(html.contains("data-branch=\"auth-prompts\""));
    assert!(html.contains("data-auth-slot=\"sign-up\""));
    assert!(!html.contains("bolt-user-menu"));
    Ok(())
}

#[tokio::test]
async fn session_cookie_renders_authenticated_branch() -> Result<()> {
    let app = build_router(test_config(std::env::temp_dir()));
    let request = Request::builder()
        .uri("/chat/abc")
        .header(COOKIE, "__session=token-s1")
        .body(Body::empty())?;
    let response = app.oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let html = read_text(response).await?;
    assert!(html.contains(r#"{"sessionId":"s1","userId":"u1"}"#));
    assert!(html.contains("data-branch=\"user-only\""));
    assert!(html.contains("aria-expanded=\"false\""));
    assert!(html.contains("data-route=\"/chat/abc\""));
    assert!(!html.contains("token-s1"));
    Ok(())
}

#[tokio::test]
async fn bearer_token_is_accepted() -> Result<()> {
    let app = build_router(test_config(std::env::temp_dir()));
    let request = Request::builder()
        .uri("/")
        .header(AUTHORIZATION, "Bearer token-s1")
        .body(Body::empty())?;
    let html = read_text(app.oneshot(request).await?).await?;
    assert!(html.contains(r#""sessionId":"s1""#));
    Ok(())
}

#[tokio::test]
async fn disabled_provider_degrades_to_anonymous() -> Result<()> {
    let mut config = test_config(std::env::temp_dir());
    config.auth_provider_mode = AuthProviderMode::Disabled;
    let app = build_router(config);

    let request = Request::builder()
        .uri("/")
        .header(COOKIE, "__session=token-s1")
        .body(Body::empty())?;
    let response = app.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let html = read_text(response).await?;
    assert!(html.contains(r#"{"sessionId":null,"userId":null}"#));
    Ok(())
}

#[tokio::test]
async fn provider_affordance_renders_provider_button() -> Result<()> {
    let mut config = test_config(std::env::temp_dir());
    config.user_affordance = UserAffordance::ProviderButton;
    let app = build_router(config);

    let request = Request::builder()
        .uri("/")
        .header(COOKIE, "__session=token-s1")
        .body(Body::empty())?;
    let html = read_text(app.oneshot(request).await?).await?;
    assert!(html.contains("data-auth-slot=\"user-button\""));
    assert!(!html.contains("bolt-user-menu-trigger"));
    Ok(())
}

#[tokio::test]
async fn api_paths_are_not_rendered_as_documents() -> Result<()> {
    let app = build_router(test_config(std::env::temp_dir()));
    let request = Request::builder().uri("/api/chat").body(Body::empty())?;
    let response = app.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn duplicate_script_bundles_are_attached_once() -> Result<()> {
    let mut config = test_config(std::env::temp_dir());
    config.script_bundles = vec![
        "/assets/bolt_web_shell.js".to_string(),
        "/assets/vendor.js".to_string(),
        "/assets/bolt_web_shell.js".to_string(),
    ];
    let app = build_router(config);

    let html = read_text(
        app.oneshot(Request::builder().uri("/").body(Body::empty())?)
            .await?,
    )
    .await?;
    assert_eq!(
        html.matches("data-bolt-bundle=\"/assets/bolt_web_shell.js\"").count(),
        1
    );
    let shell = html.find("data-bolt-bundle=\"/assets/bolt_web_shell.js\"");
    let vendor = html.find("data-bolt-bundle=\"/assets/vendor.js\"");
    assert!(matches!((shell, vendor), (Some(shell), Some(vendor)) if shell < vendor));
    Ok(())
}

#[tokio::test]
async fn static_assets_are_served_from_assets_dir() -> Result<()> {
    let static_dir = tempdir()?;
    std::fs::create_dir_all(static_dir.path().join("assets"))?;
    std::fs::write(static_dir.path().join("assets/index.css"), "body{}")?;
    std::fs::write(static_dir.path().join("favicon.svg"), "<svg/>")?;
    let app = build_router(test_config(static_dir.path().to_path_buf()));

    let css = app
        .clone()
        .oneshot(Request::builder().uri("/assets/index.css").body(Body::empty())?)
        .await?;
    assert_eq!(css.status(), StatusCode::OK);
    assert_eq!(
        css.headers().get(CACHE_CONTROL).map(|value| value.as_bytes()),
        Some(CACHE_SHORT_LIVED.as_bytes())
    );
    assert_eq!(read_text(css).await?, "body{}");

    let favicon = app
        .clone()
        .oneshot(Request::builder().uri("/favicon.svg").body(Body::empty())?)
        .await?;
    assert_eq!(favicon.status(), StatusCode::OK);
    assert_eq!(
        favicon.headers().get(CONTENT_TYPE).map(|value| value.as_bytes()),
        Some("image/svg+xml".as_bytes())
    );

    let missing = app
        .oneshot(Request::builder().uri("/assets/missing.js").body(Body::empty())?)
        .await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn static_asset_rejects_path_traversal_segments() -> Result<()> {
    let static_dir = tempdir()?;
    std::fs::write(static_dir.path().join("secret.txt"), "nope")?;
    let app = build_router(test_config(static_dir.path().to_path_buf()));

    let request = Request::builder()
        .uri("/assets/../secret.txt")
        .body(Body::empty())?;
    let response = app.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[test]
fn hashed_asset_detection() {
    assert!(crate::is_hashed_asset_path("bolt_web_shell-0a1b2c3d.js"));
    assert!(!crate::is_hashed_asset_path("bolt_web_shell.js"));
    assert!(!crate::is_hashed_asset_path("index-dark.css"));
}
