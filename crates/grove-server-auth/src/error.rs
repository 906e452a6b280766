// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authentication and authorization error types.

use std::fmt;
use thiserror::Error;

/// Why a session could not be authenticated.
///
/// Every variant surfaces to the caller as [`AuthError::Unauthenticated`];
/// the distinction exists for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
	/// No bearer token was supplied.
	Missing,
	/// The token could not be decoded.
	Malformed,
	/// The token signature did not verify against the process secret.
	BadSignature,
	/// The token verified but its expiry is in the past.
	Expired,
	/// The token verified but its claims are unusable.
	InvalidClaims,
	/// Username or password did not match a stored person.
	InvalidCredentials,
}

impl fmt::Display for TokenRejection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TokenRejection::Missing => write!(f, "missing token"),
			TokenRejection::Malformed => write!(f, "malformed token"),
			TokenRejection::BadSignature => write!(f, "bad signature"),
			TokenRejection::Expired => write!(f, "token expired"),
			TokenRejection::InvalidClaims => write!(f, "invalid claims"),
			TokenRejection::InvalidCredentials => write!(f, "invalid credentials"),
		}
	}
}

/// Errors that can occur during authentication, authorization and personnel
/// queries.
#[derive(Debug, Error)]
pub enum AuthError {
	// =========================================================================
	// Authentication Errors
	// =========================================================================
	/// The session token is missing, invalid or expired.
	#[error("authentication required ({0})")]
	Unauthenticated(TokenRejection),

	// =========================================================================
	// Request Errors
	// =========================================================================
	/// A required node identifier was absent from the request.
	#[error("missing identifier: {0}")]
	MissingIdentifier(&'static str),

	/// A node identifier did not parse.
	#[error("malformed identifier: {0}")]
	MalformedIdentifier(String),

	// =========================================================================
	// Authorization Errors
	// =========================================================================
	/// The requested visibility exceeds the caller's role.
	#[error("unauthorized: {0}")]
	Unauthorized(String),

	/// The target node is outside the caller's subtree.
	#[error("forbidden: node {0} is outside the caller's subtree")]
	Forbidden(String),

	/// The target node is not part of the store tree.
	#[error("node not found: {0}")]
	NotFound(String),

	/// A person with this username already exists.
	#[error("username already taken: {0}")]
	DuplicateIdentity(String),

	// =========================================================================
	// Index Lifecycle Errors
	// =========================================================================
	/// The ancestry index was queried before it was built.
	#[error("ancestry index not initialized")]
	NotInitialized,

	/// The ancestry index was built twice.
	#[error("ancestry index already initialized")]
	AlreadyInitialized,

	/// The node snapshot contained the same id twice.
	#[error("duplicate node id in store tree: {0}")]
	DuplicateNode(String),

	/// A node's parent or ancestor chain does not match the rest of the tree.
	#[error("inconsistent store tree: {0}")]
	InconsistentTree(String),

	// =========================================================================
	// Infrastructure Errors
	// =========================================================================
	/// The persistence layer failed.
	#[error("store error: {0}")]
	Store(String),

	/// Configuration error.
	#[error("configuration error: {0}")]
	Configuration(String),

	/// Internal error.
	#[error("internal error: {0}")]
	Internal(String),
}

impl AuthError {
	/// Returns true if this error should be logged at error level.
	pub fn is_internal(&self) -> bool {
		matches!(
			self,
			AuthError::Store(_)
				| AuthError::Configuration(_)
				| AuthError::Internal(_)
				| AuthError::NotInitialized
				| AuthError::AlreadyInitialized
				| AuthError::DuplicateNode(_)
				| AuthError::InconsistentTree(_)
		)
	}

	/// Returns the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			// 401 Unauthorized
			AuthError::Unauthenticated(_) => 401,

			// 400 Bad Request
			AuthError::MissingIdentifier(_) | AuthError::MalformedIdentifier(_) => 400,

			// 403 Forbidden
			AuthError::Unauthorized(_) | AuthError::Forbidden(_) => 403,

			// 404 Not Found
			AuthError::NotFound(_) => 404,

			// 409 Conflict
			AuthError::DuplicateIdentity(_) => 409,

			// 500 Internal Server Error
			AuthError::NotInitialized
			| AuthError::AlreadyInitialized
			| AuthError::DuplicateNode(_)
			| AuthError::InconsistentTree(_)
			| AuthError::Store(_)
			| AuthError::Configuration(_)
			| AuthError::Internal(_) => 500,
		}
	}
}
