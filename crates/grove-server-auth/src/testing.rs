// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Store-tree fixtures shared by tests across the workspace.

use crate::ancestry::AncestryIndex;
use crate::node::OrgNode;
use crate::types::{NodeId, NodeKind};

/// Deterministic node id whose last byte is `n`.
pub fn node_id(n: u8) -> NodeId {
	let mut bytes = [0u8; 12];
	bytes[11] = n;
	NodeId::new(bytes)
}

/// Root `R` with children `C1` and `C2`; `C1` has a child `C1a`.
#[derive(Debug, Clone)]
pub struct SampleTree {
	pub root: OrgNode,
	pub c1: OrgNode,
	pub c2: OrgNode,
	pub c1a: OrgNode,
}

impl SampleTree {
	pub fn new() -> Self {
		let root = OrgNode::root(node_id(1), "R", NodeKind::Office);
		let c1 = OrgNode::child_of(&root, node_id(2), "C1", NodeKind::Office);
		let c2 = OrgNode::child_of(&root, node_id(3), "C2", NodeKind::Store);
		let c1a = OrgNode::child_of(&c1, node_id(4), "C1a", NodeKind::Store);
		Self { root, c1, c2, c1a }
	}

	pub fn nodes(&self) -> Vec<OrgNode> {
		vec![
			self.root.clone(),
			self.c1.clone(),
			self.c2.clone(),
			self.c1a.clone(),
		]
	}

	pub fn index(&self) -> AncestryIndex {
		AncestryIndex::build(self.nodes()).unwrap()
	}
}

impl Default for SampleTree {
	fn default() -> Self {
		Self::new()
	}
}
