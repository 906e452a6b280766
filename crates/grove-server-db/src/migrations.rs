// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Schema setup. Every statement is idempotent, so running the migrations
//! against an existing database is a no-op.

use sqlx::sqlite::SqlitePool;

use crate::error::DbError;

const MIGRATIONS: &[(&str, &str)] = &[
	(
		"001_create_store_nodes",
		include_str!("../migrations/001_create_store_nodes.sql"),
	),
	(
		"002_create_personnel",
		include_str!("../migrations/002_create_personnel.sql"),
	),
];

#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	for (name, sql) in MIGRATIONS {
		for stmt in sql.split(';').filter(|s| !s.trim().is_empty()) {
			sqlx::query(stmt).execute(pool).await?;
		}
		tracing::debug!(migration = %name, "migration applied");
	}
	Ok(())
}
