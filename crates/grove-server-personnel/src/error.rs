// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Conversion of persistence failures into the access-control taxonomy.

use grove_server_auth::AuthError;
use grove_server_db::DbError;

pub type Result<T> = std::result::Result<T, AuthError>;

/// Map a store failure onto an [`AuthError`].
///
/// Only uniqueness conflicts are caller-visible; every other failure is an
/// internal store error.
pub fn from_db(err: DbError) -> AuthError {
	match err {
		DbError::Conflict(msg) => AuthError::DuplicateIdentity(msg),
		other => AuthError::Store(other.to_string()),
	}
}
