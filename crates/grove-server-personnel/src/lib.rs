// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Personnel service for Grove.
//!
//! Wires the pure access-control crate to the SQLite stores: bootstrap of the
//! ancestry index, personnel listing and creation, accessible stores and
//! login.

pub mod error;
pub mod service;

pub use error::{from_db, Result};
pub use service::PersonnelService;
