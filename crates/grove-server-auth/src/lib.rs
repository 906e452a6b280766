// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Store-tree access control for Grove.
//!
//! This crate is pure: it owns no I/O. It provides:
//!
//! - **Tree model**: [`OrgNode`], [`NodeId`] and the precomputed
//!   [`AncestryIndex`], published once per process through an
//!   [`AncestryCell`]
//! - **Access decisions**: [`AccessGuard`] allows a caller its home node and
//!   everything beneath it
//! - **Listing plans**: [`plan_personnel_query`] resolves visibility, scope
//!   and paging before any store is touched
//! - **Sessions**: [`SessionSigner`] issues and verifies HS256 bearer tokens
//!   carrying an [`Identity`]
//! - **Credentials**: Argon2 password hashing

pub mod ancestry;
pub mod error;
pub mod guard;
pub mod identity;
pub mod middleware;
pub mod node;
pub mod password;
pub mod person;
pub mod query;
pub mod testing;
pub mod token;
pub mod types;
pub mod visibility;

pub use ancestry::{AncestryCell, AncestryIndex, IndexState};
pub use error::{AuthError, TokenRejection};
pub use guard::{AccessGuard, Decision};
pub use identity::Identity;
pub use middleware::{authenticate, extract_bearer_token};
pub use node::{OrgNode, StoreSummary};
pub use password::{hash_password, verify_password, verify_unknown_user};
pub use person::{NewPerson, Person};
pub use query::{
	plan_personnel_query, Page, PageLimits, PersonnelPlan, PersonnelQuery, DEFAULT_PAGE_LIMIT,
	MAX_PAGE_LIMIT,
};
pub use token::{SessionSigner, DEFAULT_TOKEN_EXPIRY_SECS};
pub use types::{NodeId, NodeKind, Role, VisibilityType};
pub use visibility::{resolve_visibility, EffectiveVisibility};
