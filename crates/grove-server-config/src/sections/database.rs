// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Store-tree and personnel database.

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_URL: &str = "sqlite:./grove.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Database configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
	/// A `sqlite:` URL; file databases are created on first open.
	pub url: String,
	pub max_connections: u32,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			url: DEFAULT_URL.to_string(),
			max_connections: DEFAULT_MAX_CONNECTIONS,
		}
	}
}

/// Database configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
	#[serde(default)]
	pub max_connections: Option<u32>,
}

impl DatabaseConfigLayer {
	pub fn merge(&mut self, other: DatabaseConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
		if other.max_connections.is_some() {
			self.max_connections = other.max_connections;
		}
	}

	/// Resolve the section.
	///
	/// # Errors
	/// `ConfigError::Validation` if the url is not a `sqlite:` url or the
	/// pool would have no connections.
	pub fn finalize(self) -> Result<DatabaseConfig, ConfigError> {
		let url = self.url.unwrap_or_else(|| DEFAULT_URL.to_string());
		if !url.starts_with("sqlite:") {
			return Err(ConfigError::Validation(format!(
				"database.url must be a sqlite: url, got '{url}'"
			)));
		}

		let max_connections = self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS);
		if max_connections == 0 {
			return Err(ConfigError::Validation(
				"database.max_connections must be at least 1".to_string(),
			));
		}

		Ok(DatabaseConfig {
			url,
			max_connections,
		})
	}
}
