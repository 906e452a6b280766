// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Personnel records.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identity::Identity;
use crate::types::{NodeId, Role};

/// A member of personnel assigned to one node of the store tree.
///
/// `id` is the record's unique key in the persistence layer and breaks ties
/// when paging by username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
	pub id: String,
	pub username: String,
	pub display_name: String,
	pub role: Role,
	pub home_node_id: NodeId,
}

impl Person {
	/// The claims a session for this person carries.
	pub fn identity(&self) -> Identity {
		Identity::new(self.username.clone(), self.role, self.home_node_id)
	}
}

/// Attributes for creating a person.
///
/// The password is plaintext here and hashed by the store before insert.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPerson {
	pub username: String,
	pub display_name: String,
	pub password: String,
	pub role: Role,
	pub home_node_id: NodeId,
}

impl fmt::Debug for NewPerson {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("NewPerson")
			.field("username", &self.username)
			.field("display_name", &self.display_name)
			.field("password", &"[REDACTED]")
			.field("role", &self.role)
			.field("home_node_id", &self.home_node_id)
			.finish()
	}
}
