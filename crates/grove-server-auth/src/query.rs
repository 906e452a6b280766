// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Planning of personnel listings.
//!
//! Planning is pure: it resolves visibility, validates and authorizes the
//! target node, expands the scope and clamps the page window. The resulting
//! [`PersonnelPlan`] is handed to a store, which is the only latent step.
//!
//! Checks run in a fixed order so that each failure is reported before any
//! later work happens:
//!
//! 1. visibility (`Unauthorized`)
//! 2. target presence and format (`MissingIdentifier`, `MalformedIdentifier`)
//! 3. target existence (`NotFound`)
//! 4. subtree access (`Forbidden`)

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::ancestry::AncestryIndex;
use crate::error::AuthError;
use crate::guard::AccessGuard;
use crate::identity::Identity;
use crate::types::{NodeId, Role, VisibilityType};
use crate::visibility::{resolve_visibility, EffectiveVisibility};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Hard cap on page size, whatever the caller or configuration asks for.
pub const MAX_PAGE_LIMIT: u32 = 1000;

// =============================================================================
// Page Limits
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
	pub default_limit: u32,
	pub max_limit: u32,
}

impl Default for PageLimits {
	fn default() -> Self {
		Self {
			default_limit: DEFAULT_PAGE_LIMIT,
			max_limit: MAX_PAGE_LIMIT,
		}
	}
}

impl PageLimits {
	pub fn new(default_limit: u32, max_limit: u32) -> Self {
		Self {
			default_limit,
			max_limit,
		}
	}

	/// Effective page size for a requested limit.
	pub fn clamp(&self, requested: Option<u32>) -> u32 {
		let cap = self.max_limit.min(MAX_PAGE_LIMIT);
		requested.unwrap_or(self.default_limit).min(cap)
	}
}

// =============================================================================
// Query
// =============================================================================

/// A personnel listing request as it arrives from a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonnelQuery {
	pub target: Option<String>,
	#[serde(rename = "type")]
	pub visibility: Option<VisibilityType>,
	#[serde(default)]
	pub include_descendants: bool,
	pub limit: Option<u32>,
	pub offset: Option<u32>,
}

impl PersonnelQuery {
	pub fn for_node(target: impl Into<String>) -> Self {
		Self {
			target: Some(target.into()),
			..Default::default()
		}
	}

	pub fn with_visibility(mut self, visibility: VisibilityType) -> Self {
		self.visibility = Some(visibility);
		self
	}

	pub fn with_descendants(mut self) -> Self {
		self.include_descendants = true;
		self
	}

	pub fn with_page(mut self, limit: u32, offset: u32) -> Self {
		self.limit = Some(limit);
		self.offset = Some(offset);
		self
	}
}

/// A fully authorized listing, ready for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonnelPlan {
	pub target: NodeId,
	/// The target first, then its descendants when requested.
	pub node_ids: Vec<NodeId>,
	pub visibility: EffectiveVisibility,
	pub limit: u32,
	pub offset: u32,
}

impl PersonnelPlan {
	pub fn role_filter(&self) -> Option<Role> {
		self.visibility.role_filter()
	}
}

/// Resolve, authorize and scope a listing for `identity`.
#[instrument(
	level = "debug",
	skip(identity, query, index, limits),
	fields(username = %identity.username, role = %identity.role)
)]
pub fn plan_personnel_query(
	identity: &Identity,
	query: &PersonnelQuery,
	index: &AncestryIndex,
	limits: &PageLimits,
) -> Result<PersonnelPlan, AuthError> {
	let visibility = resolve_visibility(identity.role, query.visibility)?;

	let raw_target = query
		.target
		.as_deref()
		.ok_or(AuthError::MissingIdentifier("storeId"))?;
	let target = NodeId::parse(raw_target)?;

	AccessGuard::new(index).enforce_existing(&identity.home_node_id, &target)?;

	let mut node_ids = vec![target];
	if query.include_descendants {
		node_ids.extend(index.descendants_of(&target));
	}

	tracing::debug!(
		target_node = %target,
		scope = node_ids.len(),
		?visibility,
		"personnel query planned"
	);

	Ok(PersonnelPlan {
		target,
		node_ids,
		visibility,
		limit: limits.clamp(query.limit),
		offset: query.offset.unwrap_or(0),
	})
}

// =============================================================================
// Pages
// =============================================================================

/// One window of an ordered listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
	pub items: Vec<T>,
	pub limit: u32,
	pub offset: u32,
	/// Inferred from a full page, so it may be true when nothing follows.
	pub has_more: bool,
}

impl<T> Page<T> {
	pub fn new(items: Vec<T>, limit: u32, offset: u32) -> Self {
		let has_more = limit > 0 && items.len() as u64 >= u64::from(limit);
		Self {
			items,
			limit,
			offset,
			has_more,
		}
	}

	pub fn empty(limit: u32, offset: u32) -> Self {
		Self {
			items: Vec::new(),
			limit,
			offset,
			has_more: false,
		}
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}
