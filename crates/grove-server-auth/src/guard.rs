// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subtree access decisions.
//!
//! A caller may act on its home node and every node beneath it, and on
//! nothing else. The same rule gates reads (the scope root of a listing) and
//! writes (the node a new person is assigned to).

use tracing::{debug, instrument};

use crate::ancestry::AncestryIndex;
use crate::error::AuthError;
use crate::types::NodeId;

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
	Allow,
	Deny,
}

impl Decision {
	pub fn is_allowed(&self) -> bool {
		matches!(self, Decision::Allow)
	}
}

/// Pure access decisions against a borrowed [`AncestryIndex`].
#[derive(Debug, Clone, Copy)]
pub struct AccessGuard<'a> {
	index: &'a AncestryIndex,
}

impl<'a> AccessGuard<'a> {
	pub fn new(index: &'a AncestryIndex) -> Self {
		Self { index }
	}

	/// Allow iff `home` is `target` or one of its ancestors.
	#[instrument(level = "debug", skip_all, fields(home = %home, target_node = %target))]
	pub fn decide(&self, home: &NodeId, target: &NodeId) -> Decision {
		let decision = if self.index.is_ancestor_or_self(home, target) {
			Decision::Allow
		} else {
			Decision::Deny
		};
		debug!(?decision, "access decision");
		decision
	}

	/// Decide on identifiers taken straight from a request.
	///
	/// An absent id is [`AuthError::MissingIdentifier`] and an unparseable one
	/// is [`AuthError::MalformedIdentifier`]; neither is an access decision.
	pub fn authorize(
		&self,
		home: Option<&str>,
		target: Option<&str>,
	) -> Result<Decision, AuthError> {
		let home = home.ok_or(AuthError::MissingIdentifier("home node"))?;
		let target = target.ok_or(AuthError::MissingIdentifier("target node"))?;
		let home = NodeId::parse(home)?;
		let target = NodeId::parse(target)?;
		Ok(self.decide(&home, &target))
	}

	/// Like [`AccessGuard::decide`], but a denial is [`AuthError::Forbidden`].
	pub fn enforce(&self, home: &NodeId, target: &NodeId) -> Result<(), AuthError> {
		if self.decide(home, target).is_allowed() {
			Ok(())
		} else {
			Err(AuthError::Forbidden(target.to_string()))
		}
	}

	/// Enforce access to a node that must exist in the tree.
	///
	/// An unknown target is [`AuthError::NotFound`] rather than an empty
	/// scope, and is reported before the subtree check.
	pub fn enforce_existing(&self, home: &NodeId, target: &NodeId) -> Result<(), AuthError> {
		if !self.index.exists(target) {
			return Err(AuthError::NotFound(target.to_string()));
		}
		self.enforce(home, target)
	}
}
