// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request authentication.
//!
//! One bearer token per request. A missing, malformed, forged or expired
//! token rejects the whole request before any access check or query runs.

use tracing::instrument;

use crate::error::{AuthError, TokenRejection};
use crate::identity::Identity;
use crate::token::SessionSigner;

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer_token(header: Option<&str>) -> Option<&str> {
	header?
		.strip_prefix("Bearer ")
		.map(str::trim)
		.filter(|token| !token.is_empty())
}

/// Authenticate a request from its `Authorization` header value.
#[instrument(skip_all)]
pub fn authenticate(header: Option<&str>, signer: &SessionSigner) -> Result<Identity, AuthError> {
	let token =
		extract_bearer_token(header).ok_or(AuthError::Unauthenticated(TokenRejection::Missing))?;
	signer.verify(token)
}
