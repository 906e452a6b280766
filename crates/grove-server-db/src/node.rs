// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Store-tree node repository.
//!
//! Nodes are written once by an import and read in bulk at startup to build
//! the ancestry index. Ancestor chains are stored as a JSON array of ids.

use async_trait::async_trait;
use grove_server_auth::{NodeId, NodeKind, OrgNode};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePool, QueryBuilder, Row, Sqlite};

use crate::error::DbError;

#[async_trait]
pub trait NodeStore: Send + Sync {
	async fn fetch_all(&self) -> Result<Vec<OrgNode>, DbError>;
	async fn fetch_by_ids(&self, ids: &[NodeId]) -> Result<Vec<OrgNode>, DbError>;
	async fn insert_nodes(&self, nodes: &[OrgNode]) -> Result<(), DbError>;
}

/// Repository for store-tree nodes.
#[derive(Clone)]
pub struct NodeRepository {
	pool: SqlitePool,
}

impl NodeRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Fetch every node of the tree.
	#[tracing::instrument(skip(self))]
	pub async fn fetch_all(&self) -> Result<Vec<OrgNode>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, display_name, kind, parent_id, ancestor_ids
			FROM store_nodes
			ORDER BY id ASC
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		let nodes = rows
			.iter()
			.map(row_to_node)
			.collect::<Result<Vec<_>, _>>()?;

		tracing::debug!(count = nodes.len(), "store nodes loaded");
		Ok(nodes)
	}

	/// Fetch the nodes with the given ids, ordered by display name.
	///
	/// Unknown ids are skipped.
	#[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
	pub async fn fetch_by_ids(&self, ids: &[NodeId]) -> Result<Vec<OrgNode>, DbError> {
		if ids.is_empty() {
			return Ok(Vec::new());
		}

		let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
			"SELECT id, display_name, kind, parent_id, ancestor_ids FROM store_nodes WHERE id IN (",
		);
		let mut separated = query.separated(", ");
		for id in ids {
			separated.push_bind(id.to_string());
		}
		separated.push_unseparated(")");
		query.push(" ORDER BY display_name ASC, id ASC");

		let rows = query.build().fetch_all(&self.pool).await?;
		rows.iter().map(row_to_node).collect()
	}

	/// Insert nodes in one transaction.
	///
	/// # Errors
	/// Returns `DbError::Conflict` if any id already exists; nothing is
	/// written in that case.
	#[tracing::instrument(skip(self, nodes), fields(count = nodes.len()))]
	pub async fn insert_nodes(&self, nodes: &[OrgNode]) -> Result<(), DbError> {
		let mut tx = self.pool.begin().await?;

		for node in nodes {
			let ancestor_ids = serde_json::to_string(&node.ancestor_ids)?;
			sqlx::query(
				r#"
				INSERT INTO store_nodes (id, display_name, kind, parent_id, ancestor_ids)
				VALUES (?, ?, ?, ?, ?)
				"#,
			)
			.bind(node.id.to_string())
			.bind(&node.display_name)
			.bind(node.kind.to_string())
			.bind(node.parent_id.map(|p| p.to_string()))
			.bind(ancestor_ids)
			.execute(&mut *tx)
			.await
			.map_err(|e| match e {
				sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
					DbError::Conflict(format!("Store node {} already exists", node.id))
				}
				_ => DbError::Sqlx(e),
			})?;
		}

		tx.commit().await?;
		tracing::debug!(count = nodes.len(), "store nodes inserted");
		Ok(())
	}
}

#[async_trait]
impl NodeStore for NodeRepository {
	async fn fetch_all(&self) -> Result<Vec<OrgNode>, DbError> {
		self.fetch_all().await
	}

	async fn fetch_by_ids(&self, ids: &[NodeId]) -> Result<Vec<OrgNode>, DbError> {
		self.fetch_by_ids(ids).await
	}

	async fn insert_nodes(&self, nodes: &[OrgNode]) -> Result<(), DbError> {
		self.insert_nodes(nodes).await
	}
}

fn row_to_node(row: &sqlx::sqlite::SqliteRow) -> Result<OrgNode, DbError> {
	let id: String = row.get("id");
	let kind: String = row.get("kind");
	let parent_id: Option<String> = row.get("parent_id");
	let ancestor_ids: String = row.get("ancestor_ids");

	Ok(OrgNode {
		id: NodeId::parse(&id).map_err(|e| DbError::Internal(format!("Invalid node ID: {e}")))?,
		display_name: row.get("display_name"),
		kind: kind
			.parse::<NodeKind>()
			.map_err(|e| DbError::Internal(format!("Invalid node kind: {e}")))?,
		parent_id: parent_id
			.map(|p| NodeId::parse(&p))
			.transpose()
			.map_err(|e| DbError::Internal(format!("Invalid parent ID: {e}")))?,
		ancestor_ids: serde_json::from_str(&ancestor_ids)?,
	})
}

// =============================================================================
// Tree Import
// =============================================================================

/// A nested store tree as written in an import document.
///
/// Nodes without an `id` are assigned a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeDocument {
	#[serde(default)]
	pub id: Option<NodeId>,
	pub display_name: String,
	pub kind: NodeKind,
	#[serde(default)]
	pub children: Vec<TreeDocument>,
}

/// Flatten a nested tree into node rows, parents before children.
pub fn flatten_tree(document: &TreeDocument) -> Vec<OrgNode> {
	let mut nodes = Vec::new();
	flatten_into(document, None, &mut nodes);
	nodes
}

fn flatten_into(document: &TreeDocument, parent: Option<&OrgNode>, out: &mut Vec<OrgNode>) {
	let id = document.id.unwrap_or_else(NodeId::generate);
	let node = match parent {
		Some(parent) => OrgNode::child_of(parent, id, document.display_name.clone(), document.kind),
		None => OrgNode::root(id, document.display_name.clone(), document.kind),
	};
	out.push(node.clone());
	for child in &document.children {
		flatten_into(child, Some(&node), out);
	}
}

/// Flatten and insert a tree document.
#[tracing::instrument(skip(store, document), fields(root = %document.display_name))]
pub async fn import_tree(
	store: &dyn NodeStore,
	document: &TreeDocument,
) -> Result<Vec<OrgNode>, DbError> {
	let nodes = flatten_tree(document);
	store.insert_nodes(&nodes).await?;
	tracing::info!(count = nodes.len(), "store tree imported");
	Ok(nodes)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_migrated_test_pool;
	use grove_server_auth::testing::{node_id, SampleTree};

	fn sample_document() -> TreeDocument {
		serde_json::from_value(serde_json::json!({
			"id": "000000000000000000000001",
			"displayName": "Head Office",
			"kind": "OFFICE",
			"children": [
				{
					"displayName": "North",
					"kind": "OFFICE",
					"children": [
						{ "displayName": "Store 1", "kind": "STORE" },
						{ "displayName": "Store 2", "kind": "STORE" }
					]
				},
				{ "displayName": "Outlet", "kind": "STORE" }
			]
		}))
		.unwrap()
	}

	mod flatten {
		use super::*;

		#[test]
		fn parents_come_before_children() {
			let nodes = flatten_tree(&sample_document());
			assert_eq!(nodes.len(), 5);
			assert!(nodes[0].is_root());
			assert_eq!(nodes[0].id, node_id(1));
			for (i, node) in nodes.iter().enumerate() {
				if let Some(parent) = node.parent_id {
					let parent_pos = nodes.iter().position(|n| n.id == parent).unwrap();
					assert!(parent_pos < i);
				}
			}
		}

		#[test]
		fn chains_are_computed() {
			let nodes = flatten_tree(&sample_document());
			let store = nodes.iter().find(|n| n.display_name == "Store 2").unwrap();
			let north = nodes.iter().find(|n| n.display_name == "North").unwrap();
			assert_eq!(store.ancestor_ids, vec![node_id(1), north.id]);
			assert!(nodes.iter().all(|n| n.chain_is_consistent()));
		}
	}

	mod repository {
		use super::*;

		#[tokio::test]
		async fn insert_then_fetch_all() {
			let pool = create_migrated_test_pool().await;
			let repo = NodeRepository::new(pool);
			let tree = SampleTree::new();

			repo.insert_nodes(&tree.nodes()).await.unwrap();
			let mut nodes = repo.fetch_all().await.unwrap();
			nodes.sort_by_key(|n| n.id);

			assert_eq!(nodes, tree.nodes());
		}

		#[tokio::test]
		async fn fetch_by_ids_skips_unknown() {
			let pool = create_migrated_test_pool().await;
			let repo = NodeRepository::new(pool);
			let tree = SampleTree::new();
			repo.insert_nodes(&tree.nodes()).await.unwrap();

			let nodes = repo
				.fetch_by_ids(&[tree.c2.id, tree.c1a.id, node_id(99)])
				.await
				.unwrap();
			let names: Vec<_> = nodes.iter().map(|n| n.display_name.as_str()).collect();
			assert_eq!(names, vec!["C1a", "C2"]);
		}

		#[tokio::test]
		async fn fetch_by_no_ids_is_empty() {
			let pool = create_migrated_test_pool().await;
			let repo = NodeRepository::new(pool);
			assert!(repo.fetch_by_ids(&[]).await.unwrap().is_empty());
		}

		#[tokio::test]
		async fn duplicate_insert_is_conflict_and_atomic() {
			let pool = create_migrated_test_pool().await;
			let repo = NodeRepository::new(pool);
			let tree = SampleTree::new();
			repo.insert_nodes(&[tree.root.clone()]).await.unwrap();

			let result = repo.insert_nodes(&[tree.c1.clone(), tree.root.clone()]).await;
			assert!(matches!(result, Err(DbError::Conflict(_))));
			assert_eq!(repo.fetch_all().await.unwrap().len(), 1);
		}

		#[tokio::test]
		async fn import_tree_round_trips_through_store() {
			let pool = create_migrated_test_pool().await;
			let repo = NodeRepository::new(pool);

			let imported = import_tree(&repo, &sample_document()).await.unwrap();
			let stored = repo.fetch_all().await.unwrap();
			assert_eq!(stored.len(), imported.len());
		}
	}
}
