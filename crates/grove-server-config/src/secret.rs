// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret strings and their environment loading.
//!
//! A [`SecretString`] prints as `[REDACTED]` through both `Debug` and
//! `Display`, is zeroized on drop and only yields its value via
//! [`SecretString::expose`].

use std::fmt;
use std::path::PathBuf;
use zeroize::Zeroize;

use crate::error::ConfigError;

/// The redaction placeholder used in all output.
pub const REDACTED: &str = "[REDACTED]";

#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretString(String);

impl SecretString {
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	pub fn expose(&self) -> &str {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SecretString(\"{REDACTED}\")")
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

/// Load a secret from `VAR_FILE` (a path whose contents are the secret) or,
/// failing that, from `VAR` itself.
///
/// One trailing newline is stripped from file contents. Returns `None` when
/// neither variable is set.
pub fn load_secret_env(var: &str) -> Result<Option<SecretString>, ConfigError> {
	let file_var = format!("{var}_FILE");

	if let Ok(path_str) = std::env::var(&file_var) {
		if path_str.is_empty() {
			return Err(ConfigError::Secret(format!("{file_var} is set but empty")));
		}

		let path = PathBuf::from(&path_str);
		let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileRead {
			path: path.clone(),
			source: e,
		})?;

		let secret = content.strip_suffix('\n').unwrap_or(&content).to_string();
		return Ok(Some(SecretString::new(secret)));
	}

	match std::env::var(var) {
		Ok(value) if !value.is_empty() => Ok(Some(SecretString::new(value))),
		_ => Ok(None),
	}
}
