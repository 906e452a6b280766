// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Precomputed ancestry for the store tree.
//!
//! The tree is loaded once per process and never mutated afterwards. Building
//! the index stores, for every node, the set of ids on its path to the root
//! (itself included), so that subtree membership is a single set lookup and
//! descendant enumeration is one scan over the node map.
//!
//! [`AncestryCell`] holds the built index for the lifetime of the process.
//! The first successful [`AncestryCell::initialize`] wins; later calls fail
//! with [`AuthError::AlreadyInitialized`] and reads before initialization fail
//! with [`AuthError::NotInitialized`].

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};
use tracing::{debug, instrument};

use crate::error::AuthError;
use crate::node::OrgNode;
use crate::types::NodeId;

// =============================================================================
// Index
// =============================================================================

/// Immutable ancestry index over a complete node snapshot.
#[derive(Debug, Clone, Default)]
pub struct AncestryIndex {
	nodes: HashMap<NodeId, OrgNode>,
	ancestry: HashMap<NodeId, HashSet<NodeId>>,
}

impl AncestryIndex {
	/// Build the index from every node of the tree.
	///
	/// A snapshot containing the same id twice is rejected with
	/// [`AuthError::DuplicateNode`]. A non-empty snapshot must have exactly one
	/// root, and every other node's chain must be its parent's chain followed
	/// by the parent; anything else is [`AuthError::InconsistentTree`].
	#[instrument(level = "debug", skip(nodes))]
	pub fn build(nodes: impl IntoIterator<Item = OrgNode>) -> Result<Self, AuthError> {
		let mut index = AncestryIndex::default();

		for node in nodes {
			if index.nodes.contains_key(&node.id) {
				return Err(AuthError::DuplicateNode(node.id.to_string()));
			}
			index.nodes.insert(node.id, node);
		}

		let mut roots = 0usize;
		for node in index.nodes.values() {
			check_chain(&index.nodes, node)?;
			if node.is_root() {
				roots += 1;
			}
		}
		if !index.nodes.is_empty() && roots != 1 {
			return Err(AuthError::InconsistentTree(format!(
				"expected exactly one root, found {roots}"
			)));
		}

		for node in index.nodes.values() {
			let mut set: HashSet<NodeId> = node.ancestor_ids.iter().copied().collect();
			set.insert(node.id);
			index.ancestry.insert(node.id, set);
		}

		debug!(nodes = index.nodes.len(), "ancestry index built");
		Ok(index)
	}

	/// Returns true if `candidate` is `node` or lies on its path to the root.
	///
	/// An unknown `node` has no ancestry and yields false.
	pub fn is_ancestor_or_self(&self, candidate: &NodeId, node: &NodeId) -> bool {
		self.ancestry
			.get(node)
			.is_some_and(|set| set.contains(candidate))
	}

	/// Every indexed node strictly below `node`, in no particular order.
	pub fn descendants_of(&self, node: &NodeId) -> Vec<NodeId> {
		self.ancestry
			.iter()
			.filter(|(id, set)| *id != node && set.contains(node))
			.map(|(id, _)| *id)
			.collect()
	}

	pub fn exists(&self, node: &NodeId) -> bool {
		self.nodes.contains_key(node)
	}

	pub fn get(&self, node: &NodeId) -> Option<&OrgNode> {
		self.nodes.get(node)
	}

	pub fn nodes(&self) -> impl Iterator<Item = &OrgNode> {
		self.nodes.values()
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}

fn check_chain(nodes: &HashMap<NodeId, OrgNode>, node: &OrgNode) -> Result<(), AuthError> {
	if !node.chain_is_consistent() {
		return Err(AuthError::InconsistentTree(format!(
			"node {} has a chain that does not end at its parent",
			node.id
		)));
	}

	let Some(parent_id) = node.parent_id else {
		return Ok(());
	};
	let parent = nodes.get(&parent_id).ok_or_else(|| {
		AuthError::InconsistentTree(format!("node {} has unknown parent {parent_id}", node.id))
	})?;

	let expected = parent.ancestor_ids.iter().chain(std::iter::once(&parent.id));
	if !node.ancestor_ids.iter().eq(expected) {
		return Err(AuthError::InconsistentTree(format!(
			"node {} has a chain that differs from its parent's",
			node.id
		)));
	}
	Ok(())
}

// =============================================================================
// Lifecycle
// =============================================================================

/// Lifecycle of an [`AncestryCell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
	Uninitialized,
	Ready,
}

/// Write-once holder for the process's [`AncestryIndex`].
///
/// Reads after initialization are lock-free clones of an `Arc`.
#[derive(Debug, Default)]
pub struct AncestryCell {
	inner: OnceLock<Arc<AncestryIndex>>,
}

impl AncestryCell {
	pub const fn new() -> Self {
		Self {
			inner: OnceLock::new(),
		}
	}

	/// Build the index and publish it.
	///
	/// When two callers race, exactly one publishes and the other receives
	/// [`AuthError::AlreadyInitialized`].
	pub fn initialize(
		&self,
		nodes: impl IntoIterator<Item = OrgNode>,
	) -> Result<Arc<AncestryIndex>, AuthError> {
		if self.inner.get().is_some() {
			return Err(AuthError::AlreadyInitialized);
		}

		let index = Arc::new(AncestryIndex::build(nodes)?);
		self.inner
			.set(Arc::clone(&index))
			.map_err(|_| AuthError::AlreadyInitialized)?;

		Ok(index)
	}

	pub fn get(&self) -> Result<Arc<AncestryIndex>, AuthError> {
		self.inner.get().cloned().ok_or(AuthError::NotInitialized)
	}

	pub fn state(&self) -> IndexState {
		if self.inner.get().is_some() {
			IndexState::Ready
		} else {
			IndexState::Uninitialized
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{node_id, SampleTree};
	use crate::types::NodeKind;

	mod literal_tree {
		use super::*;

		#[test]
		fn child_is_ancestor_of_grandchild() {
			let tree = SampleTree::new();
			let index = tree.index();
			assert!(index.is_ancestor_or_self(&tree.c1.id, &tree.c1a.id));
			assert!(index.is_ancestor_or_self(&tree.root.id, &tree.c1a.id));
		}

		#[test]
		fn siblings_are_not_ancestors() {
			let tree = SampleTree::new();
			let index = tree.index();
			assert!(!index.is_ancestor_or_self(&tree.c1.id, &tree.c2.id));
			assert!(!index.is_ancestor_or_self(&tree.c2.id, &tree.c1a.id));
		}

		#[test]
		fn descendants_of_root_are_everything_else() {
			let tree = SampleTree::new();
			let index = tree.index();
			let mut descendants = index.descendants_of(&tree.root.id);
			descendants.sort();
			let mut expected = vec![tree.c1.id, tree.c2.id, tree.c1a.id];
			expected.sort();
			assert_eq!(descendants, expected);
		}

		#[test]
		fn leaf_has_no_descendants() {
			let tree = SampleTree::new();
			assert!(tree.index().descendants_of(&tree.c1a.id).is_empty());
		}

		#[test]
		fn unknown_node_is_never_contained() {
			let tree = SampleTree::new();
			let index = tree.index();
			let unknown = node_id(200);
			assert!(!index.is_ancestor_or_self(&tree.root.id, &unknown));
			assert!(!index.is_ancestor_or_self(&unknown, &unknown));
			assert!(index.descendants_of(&unknown).is_empty());
			assert!(!index.exists(&unknown));
		}

		#[test]
		fn grandchild_ancestry_is_exactly_its_chain() {
			let tree = SampleTree::new();
			let index = tree.index();
			let holders: Vec<_> = tree
				.nodes()
				.into_iter()
				.filter(|n| index.is_ancestor_or_self(&n.id, &tree.c1a.id))
				.map(|n| n.id)
				.collect();
			assert_eq!(holders.len(), 3);
			assert!(holders.contains(&tree.c1a.id));
			assert!(holders.contains(&tree.c1.id));
			assert!(holders.contains(&tree.root.id));
		}
	}

	mod build {
		use super::*;

		#[test]
		fn duplicate_id_is_rejected() {
			let root = OrgNode::root(node_id(1), "Root", NodeKind::Office);
			let dup = OrgNode::root(node_id(1), "Other Root", NodeKind::Office);
			let result = AncestryIndex::build(vec![root, dup]);
			assert!(matches!(result, Err(AuthError::DuplicateNode(_))));
		}

		#[test]
		fn chain_that_skips_the_parent_is_rejected() {
			let tree = SampleTree::new();
			let mut stray = OrgNode::child_of(&tree.c1, node_id(9), "Stray", NodeKind::Store);
			stray.ancestor_ids = vec![tree.c2.id];
			let mut nodes = tree.nodes();
			nodes.push(stray);
			let result = AncestryIndex::build(nodes);
			assert!(matches!(result, Err(AuthError::InconsistentTree(_))));
		}

		#[test]
		fn chain_through_a_sibling_is_rejected() {
			let tree = SampleTree::new();
			let mut stray = OrgNode::child_of(&tree.c1, node_id(9), "Stray", NodeKind::Store);
			stray.ancestor_ids = vec![tree.c2.id, tree.c1.id];
			let mut nodes = tree.nodes();
			nodes.push(stray);
			let result = AncestryIndex::build(nodes);
			assert!(matches!(result, Err(AuthError::InconsistentTree(_))));
		}

		#[test]
		fn unknown_parent_is_rejected() {
			let tree = SampleTree::new();
			let nodes: Vec<_> = tree.nodes().into_iter().filter(|n| n.id != tree.c1.id).collect();
			let result = AncestryIndex::build(nodes);
			assert!(matches!(result, Err(AuthError::InconsistentTree(_))));
		}

		#[test]
		fn second_root_is_rejected() {
			let tree = SampleTree::new();
			let mut nodes = tree.nodes();
			nodes.push(OrgNode::root(node_id(9), "Other Root", NodeKind::Office));
			let result = AncestryIndex::build(nodes);
			assert!(matches!(result, Err(AuthError::InconsistentTree(_))));
		}

		#[test]
		fn empty_snapshot_builds_empty_index() {
			let index = AncestryIndex::build(Vec::new()).unwrap();
			assert!(index.is_empty());
		}

		#[test]
		fn get_returns_node_record() {
			let tree = SampleTree::new();
			let index = tree.index();
			assert_eq!(index.get(&tree.c2.id).unwrap().display_name, "C2");
			assert_eq!(index.len(), 4);
		}
	}

	mod lifecycle {
		use super::*;

		#[test]
		fn get_before_initialize_fails() {
			let cell = AncestryCell::new();
			assert_eq!(cell.state(), IndexState::Uninitialized);
			assert!(matches!(cell.get(), Err(AuthError::NotInitialized)));
		}

		#[test]
		fn second_initialize_fails() {
			let tree = SampleTree::new();
			let cell = AncestryCell::new();
			cell.initialize(tree.nodes()).unwrap();
			assert_eq!(cell.state(), IndexState::Ready);

			let result = cell.initialize(tree.nodes());
			assert!(matches!(result, Err(AuthError::AlreadyInitialized)));
			assert_eq!(cell.get().unwrap().len(), 4);
		}

		#[test]
		fn failed_build_leaves_cell_uninitialized() {
			let root = OrgNode::root(node_id(1), "Root", NodeKind::Office);
			let cell = AncestryCell::new();
			let result = cell.initialize(vec![root.clone(), root]);
			assert!(matches!(result, Err(AuthError::DuplicateNode(_))));
			assert_eq!(cell.state(), IndexState::Uninitialized);
		}

		#[test]
		fn concurrent_initialize_has_one_winner() {
			let cell = Arc::new(AncestryCell::new());
			let handles: Vec<_> = (0..8)
				.map(|_| {
					let cell = Arc::clone(&cell);
					std::thread::spawn(move || cell.initialize(SampleTree::new().nodes()).is_ok())
				})
				.collect();

			let winners = handles
				.into_iter()
				.map(|h| h.join().unwrap())
				.filter(|ok| *ok)
				.count();
			assert_eq!(winners, 1);
			assert_eq!(cell.state(), IndexState::Ready);
		}
	}

	mod property_tests {
		use super::*;
		use proptest::prelude::*;

		/// A random tree: node `i` hangs off `parents[i - 1] % i`.
		fn arb_tree() -> impl Strategy<Value = Vec<OrgNode>> {
			prop::collection::vec(any::<usize>(), 0..40).prop_map(|parents| {
				let mut nodes = vec![OrgNode::root(node_id(0), "Root", NodeKind::Office)];
				for (i, pick) in parents.iter().enumerate() {
					let idx = i + 1;
					let parent = nodes[pick % idx].clone();
					nodes.push(OrgNode::child_of(
						&parent,
						node_id(idx as u8),
						format!("Node {idx}"),
						NodeKind::Store,
					));
				}
				nodes
			})
		}

		proptest! {
			#[test]
			fn every_node_is_its_own_ancestor(nodes in arb_tree()) {
				let index = AncestryIndex::build(nodes.clone()).unwrap();
				for node in &nodes {
					prop_assert!(index.is_ancestor_or_self(&node.id, &node.id));
				}
			}

			#[test]
			fn ancestry_is_never_symmetric(nodes in arb_tree()) {
				let index = AncestryIndex::build(nodes.clone()).unwrap();
				for node in &nodes {
					for ancestor in &node.ancestor_ids {
						prop_assert!(index.is_ancestor_or_self(ancestor, &node.id));
						prop_assert!(!index.is_ancestor_or_self(&node.id, ancestor));
					}
				}
			}

			#[test]
			fn descendants_match_ancestry(nodes in arb_tree()) {
				let index = AncestryIndex::build(nodes.clone()).unwrap();
				for root in &nodes {
					let descendants: HashSet<NodeId> =
						index.descendants_of(&root.id).into_iter().collect();
					let expected: HashSet<NodeId> = nodes
						.iter()
						.filter(|x| x.id != root.id && index.is_ancestor_or_self(&root.id, &x.id))
						.map(|x| x.id)
						.collect();
					prop_assert_eq!(descendants, expected);
				}
			}
		}
	}
}
