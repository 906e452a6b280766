// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session authentication configuration.
//!
//! The token secret never comes from a config file; it is loaded from
//! `GROVE_SERVER_TOKEN_SECRET` or `GROVE_SERVER_TOKEN_SECRET_FILE` and handed
//! to [`AuthConfigLayer::finalize`].

use serde::Deserialize;

use crate::error::ConfigError;
use crate::secret::SecretString;

const DEFAULT_TOKEN_EXPIRY_SECS: u64 = 7200;

/// Authentication configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct AuthConfig {
	pub token_secret: SecretString,
	pub token_expiry_secs: u64,
	pub environment: String,
}

/// Authentication configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfigLayer {
	#[serde(default)]
	pub token_expiry_secs: Option<u64>,
	#[serde(default)]
	pub environment: Option<String>,
}

impl AuthConfigLayer {
	pub fn merge(&mut self, other: AuthConfigLayer) {
		if other.token_expiry_secs.is_some() {
			self.token_expiry_secs = other.token_expiry_secs;
		}
		if other.environment.is_some() {
			self.environment = other.environment;
		}
	}

	/// Resolve the section.
	///
	/// # Errors
	/// `ConfigError::Validation` if the secret is missing or empty, or the
	/// expiry is zero.
	pub fn finalize(self, token_secret: Option<SecretString>) -> Result<AuthConfig, ConfigError> {
		let token_secret = token_secret.filter(|s| !s.is_empty()).ok_or_else(|| {
			ConfigError::Validation(
				"GROVE_SERVER_TOKEN_SECRET (or GROVE_SERVER_TOKEN_SECRET_FILE) must be set"
					.to_string(),
			)
		})?;

		let token_expiry_secs = self.token_expiry_secs.unwrap_or(DEFAULT_TOKEN_EXPIRY_SECS);
		if token_expiry_secs == 0 {
			return Err(ConfigError::Validation(
				"auth.token_expiry_secs must be greater than zero".to_string(),
			));
		}

		Ok(AuthConfig {
			token_secret,
			token_expiry_secs,
			environment: self
				.environment
				.unwrap_or_else(|| "development".to_string()),
		})
	}
}
