// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Store-tree node records.

use serde::{Deserialize, Serialize};

use crate::types::{NodeId, NodeKind};

/// One node of the store tree.
///
/// `ancestor_ids` runs from the root down to the parent and never contains
/// the node itself. The root has no parent and an empty chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgNode {
	pub id: NodeId,
	pub display_name: String,
	pub kind: NodeKind,
	pub parent_id: Option<NodeId>,
	pub ancestor_ids: Vec<NodeId>,
}

impl OrgNode {
	/// Create the root of a tree.
	pub fn root(id: NodeId, display_name: impl Into<String>, kind: NodeKind) -> Self {
		Self {
			id,
			display_name: display_name.into(),
			kind,
			parent_id: None,
			ancestor_ids: Vec::new(),
		}
	}

	/// Create a child of `parent`, deriving the ancestor chain from it.
	pub fn child_of(
		parent: &OrgNode,
		id: NodeId,
		display_name: impl Into<String>,
		kind: NodeKind,
	) -> Self {
		let mut ancestor_ids = parent.ancestor_ids.clone();
		ancestor_ids.push(parent.id);
		Self {
			id,
			display_name: display_name.into(),
			kind,
			parent_id: Some(parent.id),
			ancestor_ids,
		}
	}

	pub fn is_root(&self) -> bool {
		self.parent_id.is_none()
	}

	/// Returns true if the chain ends at the declared parent.
	pub fn chain_is_consistent(&self) -> bool {
		self.ancestor_ids.last().copied() == self.parent_id
	}

	pub fn summary(&self) -> StoreSummary {
		StoreSummary {
			id: self.id,
			display_name: self.display_name.clone(),
			kind: self.kind,
		}
	}
}

/// Public view of a node, as returned when listing a caller's stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSummary {
	pub id: NodeId,
	pub display_name: String,
	pub kind: NodeKind,
}
