// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The authenticated caller.

use serde::{Deserialize, Serialize};

use crate::types::{NodeId, Role};

/// Claims of an authenticated caller, produced per request by verifying a
/// session token and never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	pub username: String,
	pub role: Role,
	pub home_node_id: NodeId,
}

impl Identity {
	pub fn new(username: impl Into<String>, role: Role, home_node_id: NodeId) -> Self {
		Self {
			username: username.into(),
			role,
			home_node_id,
		}
	}
}
