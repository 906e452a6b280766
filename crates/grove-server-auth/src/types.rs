// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions for the store tree and its personnel.
//!
//! - **[`NodeId`]**: 12-byte identifier of a store-tree node, written as 24
//!   hex characters on the wire and in storage
//! - **[`NodeKind`]**: whether a node is an administrative office or a store
//! - **[`Role`]**: the two personnel roles
//! - **[`VisibilityType`]**: the role filter a caller may request when listing
//!   personnel

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuthError;

// =============================================================================
// Node Identifiers
// =============================================================================

/// Number of raw bytes in a [`NodeId`].
pub const NODE_ID_BYTES: usize = 12;

/// Unique identifier for a node in the store tree.
///
/// Parsing accepts exactly 24 hex characters in either case; formatting is
/// always lowercase, so two ids that parse equal also print equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId([u8; NODE_ID_BYTES]);

impl NodeId {
	/// Create an id from raw bytes.
	pub fn new(bytes: [u8; NODE_ID_BYTES]) -> Self {
		Self(bytes)
	}

	/// Generate a new random id.
	pub fn generate() -> Self {
		Self(rand::random())
	}

	/// Parse a 24-character hex identifier.
	pub fn parse(raw: &str) -> Result<Self, AuthError> {
		if raw.len() != NODE_ID_BYTES * 2 {
			return Err(AuthError::MalformedIdentifier(raw.to_string()));
		}
		let mut bytes = [0u8; NODE_ID_BYTES];
		hex::decode_to_slice(raw, &mut bytes)
			.map_err(|_| AuthError::MalformedIdentifier(raw.to_string()))?;
		Ok(Self(bytes))
	}

}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&hex::encode(self.0))
	}
}

impl FromStr for NodeId {
	type Err = AuthError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl TryFrom<String> for NodeId {
	type Error = AuthError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(&value)
	}
}

impl From<NodeId> for String {
	fn from(id: NodeId) -> Self {
		id.to_string()
	}
}

// =============================================================================
// Node Kinds
// =============================================================================

/// What a node in the store tree represents.
///
/// Stores are leaves in practice, but nothing here enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeKind {
	/// Regional or administrative office.
	Office,
	/// A single store.
	Store,
}

impl NodeKind {
	pub fn all() -> &'static [NodeKind] {
		&[NodeKind::Office, NodeKind::Store]
	}
}

impl fmt::Display for NodeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			NodeKind::Office => write!(f, "OFFICE"),
			NodeKind::Store => write!(f, "STORE"),
		}
	}
}

impl FromStr for NodeKind {
	type Err = AuthError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"OFFICE" => Ok(NodeKind::Office),
			"STORE" => Ok(NodeKind::Store),
			other => Err(AuthError::Internal(format!("unknown node kind '{other}'"))),
		}
	}
}

// =============================================================================
// Roles
// =============================================================================

/// Role held by a member of personnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	Manager,
	Employee,
}

impl Role {
	pub fn all() -> &'static [Role] {
		&[Role::Manager, Role::Employee]
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Role::Manager => write!(f, "manager"),
			Role::Employee => write!(f, "employee"),
		}
	}
}

impl FromStr for Role {
	type Err = AuthError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"manager" => Ok(Role::Manager),
			"employee" => Ok(Role::Employee),
			other => Err(AuthError::Internal(format!("unknown role '{other}'"))),
		}
	}
}

// =============================================================================
// Visibility
// =============================================================================

/// Role filter requested for a personnel listing.
///
/// An absent request is modelled as `Option::None` at the call site rather
/// than as a variant, so the resolver has to decide it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityType {
	Manager,
	Employee,
	All,
}

impl fmt::Display for VisibilityType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			VisibilityType::Manager => write!(f, "manager"),
			VisibilityType::Employee => write!(f, "employee"),
			VisibilityType::All => write!(f, "all"),
		}
	}
}

impl FromStr for VisibilityType {
	type Err = AuthError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"manager" => Ok(VisibilityType::Manager),
			"employee" => Ok(VisibilityType::Employee),
			"all" => Ok(VisibilityType::All),
			other => Err(AuthError::Internal(format!(
				"unknown visibility type '{other}'"
			))),
		}
	}
}
