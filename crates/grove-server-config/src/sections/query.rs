// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Personnel query paging configuration.

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_LIMIT: u32 = 100;
const HARD_MAX_LIMIT: u32 = 1000;

/// Paging configuration (runtime, fully resolved).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfig {
	pub default_limit: u32,
	pub max_limit: u32,
}

impl Default for QueryConfig {
	fn default() -> Self {
		Self {
			default_limit: DEFAULT_LIMIT,
			max_limit: HARD_MAX_LIMIT,
		}
	}
}

/// Paging configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryConfigLayer {
	#[serde(default)]
	pub default_limit: Option<u32>,
	#[serde(default)]
	pub max_limit: Option<u32>,
}

impl QueryConfigLayer {
	pub fn merge(&mut self, other: QueryConfigLayer) {
		if other.default_limit.is_some() {
			self.default_limit = other.default_limit;
		}
		if other.max_limit.is_some() {
			self.max_limit = other.max_limit;
		}
	}

	/// Resolve the section.
	///
	/// # Errors
	/// `ConfigError::Validation` if `max_limit` exceeds 1000 or
	/// `default_limit` is zero or above `max_limit`.
	pub fn finalize(self) -> Result<QueryConfig, ConfigError> {
		let max_limit = self.max_limit.unwrap_or(HARD_MAX_LIMIT);
		let default_limit = self.default_limit.unwrap_or(DEFAULT_LIMIT.min(max_limit));

		if max_limit > HARD_MAX_LIMIT {
			return Err(ConfigError::Validation(format!(
				"query.max_limit must not exceed {HARD_MAX_LIMIT}, got {max_limit}"
			)));
		}
		if default_limit == 0 || default_limit > max_limit {
			return Err(ConfigError::Validation(format!(
				"query.default_limit must be between 1 and {max_limit}, got {default_limit}"
			)));
		}

		Ok(QueryConfig {
			default_limit,
			max_limit,
		})
	}
}
