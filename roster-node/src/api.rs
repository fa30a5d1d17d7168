// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP endpoints checking whether a caller's unit is part of a required unit's hierarchy.
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use roster_auth::Authorizer;
use roster_store::{HierarchyStore, Slug, UnitKind};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Build the router of the node.
pub fn router<S>(authorizer: Authorizer<S>) -> Router
where
    S: HierarchyStore + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/api/permissions/billet", post(check_billet::<S>))
        .route("/api/permissions/position", post(check_position::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(authorizer)
}

#[derive(Debug)]
pub enum ApiError {
    /// The body was not an object holding both non-empty fields.
    MissingFields,

    /// Anything failed while checking, details are only logged.
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::MissingFields => (StatusCode::BAD_REQUEST, "Missing required fields"),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BilletCheck {
    #[serde(default)]
    user_billet_slug: Option<String>,
    #[serde(default)]
    required_permission: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionCheck {
    #[serde(default)]
    user_position_slug: Option<String>,
    #[serde(default)]
    required_permission: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    has_access: bool,
}

async fn health() -> &'static str {
    "ok"
}

async fn check_billet<S>(
    State(authorizer): State<Authorizer<S>>,
    body: Result<Json<BilletCheck>, JsonRejection>,
) -> Result<Json<CheckResponse>, ApiError>
where
    S: HierarchyStore + Clone + Send + Sync + 'static,
{
    let Json(body) = body.map_err(rejected)?;
    check(
        &authorizer,
        UnitKind::Billet,
        body.user_billet_slug,
        body.required_permission,
    )
    .await
}

async fn check_position<S>(
    State(authorizer): State<Authorizer<S>>,
    body: Result<Json<PositionCheck>, JsonRejection>,
) -> Result<Json<CheckResponse>, ApiError>
where
    S: HierarchyStore + Clone + Send + Sync + 'static,
{
    let Json(body) = body.map_err(rejected)?;
    check(
        &authorizer,
        UnitKind::Position,
        body.user_position_slug,
        body.required_permission,
    )
    .await
}

fn rejected(rejection: JsonRejection) -> ApiError {
    debug!(%rejection, "malformed permission check");
    ApiError::MissingFields
}

fn required_field(value: Option<String>) -> Result<Slug, ApiError> {
    match value {
        Some(value) if !value.is_empty() => Ok(Slug::from(value)),
        _ => Err(ApiError::MissingFields),
    }
}

async fn check<S>(
    authorizer: &Authorizer<S>,
    kind: UnitKind,
    caller: Option<String>,
    required: Option<String>,
) -> Result<Json<CheckResponse>, ApiError>
where
    S: HierarchyStore + Sync,
{
    let caller = required_field(caller)?;
    let required = required_field(required)?;

    let has_access = authorizer
        .check_membership(kind, &caller, &required)
        .await
        .map_err(|err| {
            error!(%kind, %caller, %required, "permission check failed: {err}");
            ApiError::Internal
        })?;

    Ok(Json(CheckResponse { has_access }))
}
