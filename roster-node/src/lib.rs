// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP service answering hierarchy permission checks for billets and department positions.
//!
//! Both endpoints take the slug of the caller's own unit and the slug of the unit a permission is
//! bound to, and answer whether the caller is that unit or one of its transitive subordinates:
//!
//! - `POST /api/permissions/billet` with `{ "userBilletSlug", "requiredPermission" }`
//! - `POST /api/permissions/position` with `{ "userPositionSlug", "requiredPermission" }`
//!
//! The response is `{ "hasAccess": bool }`.
pub mod api;
pub mod config;

pub use api::router;
pub use config::{AuthorizationConfig, Config};
