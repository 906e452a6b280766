// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Password hashing for personnel credentials.
//!
//! Hashes are Argon2id PHC strings. Test builds of this crate use minimal
//! parameters; those MUST NOT be used in production.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::sync::OnceLock;
#[cfg(test)]
use argon2::{Algorithm, Params, Version};

use crate::error::AuthError;

#[inline]
fn argon2_instance() -> Argon2<'static> {
	#[cfg(test)]
	{
		// Memory: 1 MiB, iterations: 1, parallelism: 1
		let params = Params::new(1024, 1, 1, None).expect("valid Argon2 params for tests");
		Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
	}

	#[cfg(not(test))]
	{
		Argon2::default()
	}
}

/// Hash a plaintext password for storage.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
	let salt = SaltString::generate(&mut OsRng);
	argon2_instance()
		.hash_password(password.as_bytes(), &salt)
		.map(|hash| hash.to_string())
		.map_err(|e| AuthError::Internal(format!("password hashing failed: {e}")))
}

/// Check a plaintext password against a stored hash.
///
/// An unparseable stored hash never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
	let parsed = match PasswordHash::new(hash) {
		Ok(h) => h,
		Err(_) => return false,
	};
	argon2_instance()
		.verify_password(password.as_bytes(), &parsed)
		.is_ok()
}

/// Spend one verification on a password for a username that does not exist,
/// so unknown users cost the same as a wrong password.
pub fn verify_unknown_user(password: &str) {
	let _ = verify_password(password, placeholder_hash());
}

fn placeholder_hash() -> &'static str {
	static PLACEHOLDER: OnceLock<String> = OnceLock::new();
	PLACEHOLDER.get_or_init(|| hash_password("grove-unknown-user").unwrap_or_default())
}
