// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::Utc;
use grove_server_auth::{NodeId, Person, Role};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

use crate::migrations::run_migrations;

/// Single-connection in-memory pool, so every query sees the same database.
pub async fn create_test_pool() -> SqlitePool {
	SqlitePoolOptions::new()
		.max_connections(1)
		.connect("sqlite::memory:")
		.await
		.unwrap()
}

pub async fn create_migrated_test_pool() -> SqlitePool {
	let pool = create_test_pool().await;
	run_migrations(&pool).await.unwrap();
	pool
}

/// Insert a person directly, skipping password hashing.
///
/// The stored hash never verifies.
pub async fn insert_person(
	pool: &SqlitePool,
	username: &str,
	role: Role,
	home_node_id: NodeId,
) -> Person {
	let person = Person {
		id: Uuid::new_v4().to_string(),
		username: username.to_string(),
		display_name: username.to_string(),
		role,
		home_node_id,
	};

	sqlx::query(
		r#"
		INSERT INTO personnel (id, username, display_name, password_hash, role, home_node_id, created_at)
		VALUES (?, ?, ?, 'unusable', ?, ?, ?)
		"#,
	)
	.bind(&person.id)
	.bind(&person.username)
	.bind(&person.display_name)
	.bind(person.role.to_string())
	.bind(person.home_node_id.to_string())
	.bind(Utc::now().to_rfc3339())
	.execute(pool)
	.await
	.unwrap();

	person
}
