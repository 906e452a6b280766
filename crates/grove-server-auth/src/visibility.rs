// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Effective visibility for personnel listings.
//!
//! | caller   | requested  | effective          |
//! |----------|------------|--------------------|
//! | manager  | manager    | managers only      |
//! | employee | manager    | `Unauthorized`     |
//! | any      | employee   | employees only     |
//! | manager  | (none)     | all roles          |
//! | employee | (none)     | employees only     |
//! | any      | all        | all roles          |
//!
//! An employee asking for `all` explicitly sees managers too, which is
//! looser than that employee's default.

use serde::Serialize;
use tracing::instrument;

use crate::error::AuthError;
use crate::types::{Role, VisibilityType};

/// Role filter actually applied to a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveVisibility {
	Only(Role),
	All,
}

impl EffectiveVisibility {
	/// The role to filter on, or `None` for every role.
	pub fn role_filter(&self) -> Option<Role> {
		match self {
			EffectiveVisibility::Only(role) => Some(*role),
			EffectiveVisibility::All => None,
		}
	}
}

/// Reconcile the caller's role with the requested visibility.
#[instrument(level = "debug")]
pub fn resolve_visibility(
	caller: Role,
	requested: Option<VisibilityType>,
) -> Result<EffectiveVisibility, AuthError> {
	match (requested, caller) {
		(Some(VisibilityType::Manager), Role::Manager) => {
			Ok(EffectiveVisibility::Only(Role::Manager))
		}
		(Some(VisibilityType::Manager), Role::Employee) => Err(AuthError::Unauthorized(
			"employees cannot list managers".to_string(),
		)),
		(Some(VisibilityType::Employee), _) => Ok(EffectiveVisibility::Only(Role::Employee)),
		(Some(VisibilityType::All), _) => Ok(EffectiveVisibility::All),
		(None, Role::Manager) => Ok(EffectiveVisibility::All),
		(None, Role::Employee) => Ok(EffectiveVisibility::Only(Role::Employee)),
	}
}
