// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite persistence for Grove.
//!
//! Provides the store traits consumed by the personnel service together with
//! their SQLite repositories, pool creation and schema migrations.

pub mod error;
pub mod migrations;
pub mod node;
pub mod personnel;
pub mod pool;
pub mod testing;

pub use error::{DbError, Result};
pub use migrations::run_migrations;
pub use node::{flatten_tree, import_tree, NodeRepository, NodeStore, TreeDocument};
pub use personnel::{PersonnelRepository, PersonnelStore};
pub use pool::create_pool;
