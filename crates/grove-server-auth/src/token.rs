// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session token issue and verification.
//!
//! Tokens are compact HS256 JWTs carrying the three [`Identity`] claims plus
//! `iat` and `exp`. Expiry is enforced with no leeway.
//!
//! Verification failures all surface as [`AuthError::Unauthenticated`]; the
//! attached [`TokenRejection`] tells an expired token apart from a forged
//! one in logs and tests.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument, warn};

use crate::error::{AuthError, TokenRejection};
use crate::identity::Identity;
use crate::types::{NodeId, Role};

/// Default session lifetime in seconds (two hours).
pub const DEFAULT_TOKEN_EXPIRY_SECS: u64 = 7200;

/// Claims encoded into a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionClaims {
	username: String,
	role: String,
	home_node_id: String,
	/// Issued at (seconds since epoch).
	iat: i64,
	/// Expiration (seconds since epoch).
	exp: i64,
}

impl SessionClaims {
	fn into_identity(self) -> Result<Identity, TokenRejection> {
		if self.username.is_empty() {
			return Err(TokenRejection::InvalidClaims);
		}
		let role: Role = self
			.role
			.parse()
			.map_err(|_| TokenRejection::InvalidClaims)?;
		let home_node_id =
			NodeId::parse(&self.home_node_id).map_err(|_| TokenRejection::InvalidClaims)?;
		Ok(Identity::new(self.username, role, home_node_id))
	}
}

/// Signs and verifies session tokens with the process secret.
#[derive(Clone)]
pub struct SessionSigner {
	encoding_key: EncodingKey,
	decoding_key: DecodingKey,
	validation: Validation,
	expiry: Duration,
}

impl fmt::Debug for SessionSigner {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SessionSigner")
			.field("secret", &"[REDACTED]")
			.field("expiry", &self.expiry)
			.finish()
	}
}

impl SessionSigner {
	/// Create a signer from the shared secret and session lifetime.
	///
	/// An empty secret is a [`AuthError::Configuration`] error.
	pub fn new(secret: &[u8], expiry: std::time::Duration) -> Result<Self, AuthError> {
		if secret.is_empty() {
			return Err(AuthError::Configuration(
				"session token secret must not be empty".to_string(),
			));
		}
		let expiry = Duration::from_std(expiry)
			.map_err(|e| AuthError::Configuration(format!("invalid token expiry: {e}")))?;

		let mut validation = Validation::new(Algorithm::HS256);
		validation.leeway = 0;

		Ok(Self {
			encoding_key: EncodingKey::from_secret(secret),
			decoding_key: DecodingKey::from_secret(secret),
			validation,
			expiry,
		})
	}

	/// Issue a token for `identity`, valid from now.
	pub fn issue(&self, identity: &Identity) -> Result<String, AuthError> {
		self.issue_at(identity, Utc::now())
	}

	/// Issue a token as if it had been issued at `issued_at`.
	#[instrument(skip(self, identity), fields(username = %identity.username))]
	pub fn issue_at(
		&self,
		identity: &Identity,
		issued_at: DateTime<Utc>,
	) -> Result<String, AuthError> {
		let claims = SessionClaims {
			username: identity.username.clone(),
			role: identity.role.to_string(),
			home_node_id: identity.home_node_id.to_string(),
			iat: issued_at.timestamp(),
			exp: (issued_at + self.expiry).timestamp(),
		};

		let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
			.map_err(|e| AuthError::Internal(format!("failed to sign session token: {e}")))?;

		debug!(exp = claims.exp, "issued session token");
		Ok(token)
	}

	/// Verify a token and return the caller it names.
	#[instrument(skip_all)]
	pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
		let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
			.map_err(|e| {
				let rejection = rejection_for(e.kind());
				warn!(reason = %rejection, "session token rejected");
				AuthError::Unauthenticated(rejection)
			})?;

		data.claims.into_identity().map_err(|rejection| {
			warn!(reason = %rejection, "session token rejected");
			AuthError::Unauthenticated(rejection)
		})
	}
}

fn rejection_for(kind: &ErrorKind) -> TokenRejection {
	match kind {
		ErrorKind::ExpiredSignature => TokenRejection::Expired,
		ErrorKind::InvalidSignature => TokenRejection::BadSignature,
		ErrorKind::MissingRequiredClaim(_) | ErrorKind::ImmatureSignature => {
			TokenRejection::InvalidClaims
		}
		_ => TokenRejection::Malformed,
	}
}
