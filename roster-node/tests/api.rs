// SPDX-License-Identifier: MIT OR Apache-2.0

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use roster_auth::Authorizer;
use roster_auth::test_utils::{FailingStore, hq_store, setup_logging};
use roster_node::router;
use roster_store::UnitKind;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn app() -> Router {
    setup_logging();
    router(Authorizer::new(hq_store().await))
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn billet_in_hierarchy_has_access() {
    let (status, body) = send(
        app().await,
        post_json(
            "/api/permissions/billet",
            &json!({ "userBilletSlug": "hq-1-1:lead", "requiredPermission": "hq:lead" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "hasAccess": true }));
}

#[tokio::test]
async fn billet_outside_hierarchy_has_no_access() {
    let (status, body) = send(
        app().await,
        post_json(
            "/api/permissions/billet",
            &json!({ "userBilletSlug": "other-branch:lead", "requiredPermission": "hq:lead" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "hasAccess": false }));
}

#[tokio::test]
async fn positions_are_checked_in_their_own_hierarchy() {
    let app = app().await;

    let (status, body) = send(
        app.clone(),
        post_json(
            "/api/permissions/position",
            &json!({
                "userPositionSlug": "training:instructor",
                "requiredPermission": "training:lead"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "hasAccess": true }));

    // The billet "hq-1:lead" is below "hq:lead", but not as a position.
    let (_, body) = send(
        app,
        post_json(
            "/api/permissions/position",
            &json!({ "userPositionSlug": "hq-1:lead", "requiredPermission": "hq:lead" }),
        ),
    )
    .await;
    assert_eq!(body, json!({ "hasAccess": false }));
}

#[tokio::test]
async fn unknown_required_slug_only_admits_itself() {
    let app = app().await;

    let (_, body) = send(
        app.clone(),
        post_json(
            "/api/permissions/billet",
            &json!({ "userBilletSlug": "ghost:lead", "requiredPermission": "ghost:lead" }),
        ),
    )
    .await;
    assert_eq!(body, json!({ "hasAccess": true }));

    let (_, body) = send(
        app,
        post_json(
            "/api/permissions/billet",
            &json!({ "userBilletSlug": "hq:lead", "requiredPermission": "ghost:lead" }),
        ),
    )
    .await;
    assert_eq!(body, json!({ "hasAccess": false }));
}

#[tokio::test]
async fn unknown_required_slugs_do_not_grow_the_cache() {
    let authorizer = Authorizer::new(hq_store().await);
    let app = router(authorizer.clone());

    for i in 0..1000 {
        let (status, body) = send(
            app.clone(),
            post_json(
                "/api/permissions/billet",
                &json!({ "userBilletSlug": "hq:lead", "requiredPermission": format!("junk-{i}") }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "hasAccess": false }));
    }
    assert!(authorizer.cache().is_empty(UnitKind::Billet).await);

    // Existing roots are still cached.
    send(
        app,
        post_json(
            "/api/permissions/billet",
            &json!({ "userBilletSlug": "hq-1:lead", "requiredPermission": "hq:lead" }),
        ),
    )
    .await;
    assert_eq!(authorizer.cache().len(UnitKind::Billet).await, 1);
}

#[tokio::test]
async fn malformed_requests_are_rejected() {
    let app = app().await;
    let bad_bodies = [
        json!({ "requiredPermission": "hq:lead" }),
        json!({ "userBilletSlug": "hq-1:lead" }),
        json!({ "userBilletSlug": "", "requiredPermission": "hq:lead" }),
        json!({ "userBilletSlug": 12, "requiredPermission": "hq:lead" }),
        json!(["hq-1:lead", "hq:lead"]),
        // Fields of the other endpoint.
        json!({ "userPositionSlug": "hq-1:lead", "requiredPermission": "hq:lead" }),
    ];

    for bad_body in bad_bodies {
        let (status, body) = send(
            app.clone(),
            post_json("/api/permissions/billet", &bad_body),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {bad_body}");
        assert_eq!(body, json!({ "error": "Missing required fields" }));
    }

    let request = Request::post("/api/permissions/position")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn store_failures_do_not_leak() {
    let app = router(Authorizer::new(FailingStore));

    let response = app
        .oneshot(post_json(
            "/api/permissions/billet",
            &json!({ "userBilletSlug": "hq-1:lead", "requiredPermission": "hq:lead" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(body, r#"{"error":"Internal server error"}"#);
    assert!(!body.contains("10.0.0.7"));
}

#[tokio::test]
async fn health() {
    let response = app()
        .await
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}
