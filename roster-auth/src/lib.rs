// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authorisation for the roster, based on rank tiers, scopes and the billet and
//! department-position hierarchies.
//!
//! A protected operation declares a list of required [`PermissionDescriptor`]s. The
//! [`Authorizer`] grants access when the [`CallerContext`] satisfies _any_ of them:
//!
//! - `tier:<tier>` is satisfied by callers of at least that [`RankTier`].
//! - `scope:<name>` is satisfied by callers holding exactly that scope.
//! - `billet:<slug>` and `position:<slug>` are satisfied by callers whose own unit of that kind is
//!   the named unit or one of its transitive subordinates.
//!
//! Hierarchy chains are resolved by walking the store (see [`resolver`]) and kept in a
//! [`ClosureCache`]. Every structural change to a hierarchy has to go through [`Organisation`],
//! which invalidates the cached chains of the changed kind.
mod authorizer;
mod cache;
mod caller;
mod config;
mod descriptor;
pub mod graph;
mod organisation;
mod rank;
pub mod resolver;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use authorizer::{AuthError, Authorizer};
pub use cache::{ClosureCache, DEFAULT_MAX_ENTRIES};
pub use caller::CallerContext;
pub use config::AuthorizerConfig;
pub use descriptor::{DescriptorError, PermissionDescriptor};
pub use graph::AuditReport;
pub use organisation::{Organisation, OrganisationError};
pub use rank::{RankTier, UnknownRankTier};
pub use resolver::{CyclePolicy, HierarchyChain, MissingRootPolicy, ResolveError, Resolver};
