// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{
	SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::str::FromStr;
use std::time::Duration;

use crate::error::DbError;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the Grove database.
///
/// File databases are created if missing and run in WAL mode, so readers
/// never block the importer.
///
/// # Errors
/// - `DbError::Internal` if `database_url` is not a `sqlite:` url
/// - `DbError::Sqlx` if the url does not parse or the database cannot be opened
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool, DbError> {
	if !database_url.starts_with("sqlite:") {
		return Err(DbError::Internal(format!(
			"unsupported database url '{database_url}', expected sqlite:"
		)));
	}

	let options = SqliteConnectOptions::from_str(database_url)?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.busy_timeout(BUSY_TIMEOUT)
		.create_if_missing(true);

	let pool = SqlitePoolOptions::new()
		.max_connections(max_connections.max(1))
		.connect_with(options)
		.await?;

	tracing::debug!(max_connections, "database pool created");
	Ok(pool)
}
