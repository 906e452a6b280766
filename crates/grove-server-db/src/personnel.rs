// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Personnel repository.
//!
//! Pages are ordered by `username ASC, id ASC`. The id tiebreak keeps the
//! order total, so consecutive windows at a fixed page size neither repeat
//! nor skip records while the table is unchanged.

use async_trait::async_trait;
use chrono::Utc;
use grove_server_auth::{
	hash_password, verify_password, verify_unknown_user, NewPerson, NodeId, Person, Role,
};
use sqlx::{sqlite::SqlitePool, QueryBuilder, Row, Sqlite};
use uuid::Uuid;

use crate::error::DbError;

#[async_trait]
pub trait PersonnelStore: Send + Sync {
	async fn fetch_personnel_page(
		&self,
		node_ids: &[NodeId],
		role: Option<Role>,
		limit: u32,
		offset: u32,
	) -> Result<Vec<Person>, DbError>;
	async fn create_personnel(&self, attrs: &NewPerson) -> Result<Person, DbError>;
	async fn verify_credentials(
		&self,
		username: &str,
		password: &str,
	) -> Result<Option<Person>, DbError>;
}

/// Repository for personnel records.
#[derive(Clone)]
pub struct PersonnelRepository {
	pool: SqlitePool,
}

impl PersonnelRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Fetch one page of personnel assigned to any of `node_ids`.
	///
	/// # Arguments
	/// * `node_ids` - Scope; an empty scope yields an empty page
	/// * `role` - Only this role, or every role when `None`
	/// * `limit` - Page size; zero yields an empty page
	/// * `offset` - Records to skip
	#[tracing::instrument(skip(self, node_ids), fields(scope = node_ids.len(), role = ?role))]
	pub async fn fetch_personnel_page(
		&self,
		node_ids: &[NodeId],
		role: Option<Role>,
		limit: u32,
		offset: u32,
	) -> Result<Vec<Person>, DbError> {
		if node_ids.is_empty() || limit == 0 {
			return Ok(Vec::new());
		}

		let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
			"SELECT id, username, display_name, role, home_node_id FROM personnel WHERE home_node_id IN (",
		);
		let mut separated = query.separated(", ");
		for id in node_ids {
			separated.push_bind(id.to_string());
		}
		separated.push_unseparated(")");

		if let Some(role) = role {
			query.push(" AND role = ").push_bind(role.to_string());
		}

		query
			.push(" ORDER BY username ASC, id ASC LIMIT ")
			.push_bind(i64::from(limit))
			.push(" OFFSET ")
			.push_bind(i64::from(offset));

		let rows = query.build().fetch_all(&self.pool).await?;
		let people = rows
			.iter()
			.map(row_to_person)
			.collect::<Result<Vec<_>, _>>()?;

		tracing::debug!(count = people.len(), "personnel page fetched");
		Ok(people)
	}

	/// Create a person, hashing the supplied password.
	///
	/// # Errors
	/// Returns `DbError::Conflict` if the username is taken.
	#[tracing::instrument(skip(self, attrs), fields(username = %attrs.username, home_node_id = %attrs.home_node_id))]
	pub async fn create_personnel(&self, attrs: &NewPerson) -> Result<Person, DbError> {
		let password = attrs.password.clone();
		let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
			.await
			.map_err(|e| DbError::Internal(format!("Password hashing task failed: {e}")))?
			.map_err(|e| DbError::Internal(e.to_string()))?;

		let person = Person {
			id: Uuid::new_v4().to_string(),
			username: attrs.username.clone(),
			display_name: attrs.display_name.clone(),
			role: attrs.role,
			home_node_id: attrs.home_node_id,
		};

		sqlx::query(
			r#"
			INSERT INTO personnel (id, username, display_name, password_hash, role, home_node_id, created_at)
			VALUES (?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(&person.id)
		.bind(&person.username)
		.bind(&person.display_name)
		.bind(password_hash)
		.bind(person.role.to_string())
		.bind(person.home_node_id.to_string())
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
				DbError::Conflict("Username must be unique".to_string())
			}
			_ => DbError::Sqlx(e),
		})?;

		tracing::debug!(person_id = %person.id, "person created");
		Ok(person)
	}

	/// Look up a person by username and check their password.
	///
	/// # Returns
	/// `None` if the username is unknown or the password does not match. Both
	/// cases run one Argon2 verification.
	#[tracing::instrument(skip(self, password), fields(username = %username))]
	pub async fn verify_credentials(
		&self,
		username: &str,
		password: &str,
	) -> Result<Option<Person>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, username, display_name, role, home_node_id, password_hash
			FROM personnel
			WHERE username = ?
			"#,
		)
		.bind(username)
		.fetch_optional(&self.pool)
		.await?;

		let password = password.to_string();
		let Some(row) = row else {
			tokio::task::spawn_blocking(move || verify_unknown_user(&password))
				.await
				.map_err(verification_failed)?;
			return Ok(None);
		};

		let hash: String = row.get("password_hash");
		let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
			.await
			.map_err(verification_failed)?;

		if !matches {
			return Ok(None);
		}

		row_to_person(&row).map(Some)
	}
}

fn verification_failed(e: tokio::task::JoinError) -> DbError {
	DbError::Internal(format!("Password verification task failed: {e}"))
}

#[async_trait]
impl PersonnelStore for PersonnelRepository {
	async fn fetch_personnel_page(
		&self,
		node_ids: &[NodeId],
		role: Option<Role>,
		limit: u32,
		offset: u32,
	) -> Result<Vec<Person>, DbError> {
		self.fetch_personnel_page(node_ids, role, limit, offset)
			.await
	}

	async fn create_personnel(&self, attrs: &NewPerson) -> Result<Person, DbError> {
		self.create_personnel(attrs).await
	}

	async fn verify_credentials(
		&self,
		username: &str,
		password: &str,
	) -> Result<Option<Person>, DbError> {
		self.verify_credentials(username, password).await
	}
}

fn row_to_person(row: &sqlx::sqlite::SqliteRow) -> Result<Person, DbError> {
	let role: String = row.get("role");
	let home_node_id: String = row.get("home_node_id");

	Ok(Person {
		id: row.get("id"),
		username: row.get("username"),
		display_name: row.get("display_name"),
		role: role
			.parse::<Role>()
			.map_err(|e| DbError::Internal(format!("Invalid role: {e}")))?,
		home_node_id: NodeId::parse(&home_node_id)
			.map_err(|e| DbError::Internal(format!("Invalid home node ID: {e}")))?,
	})
}
