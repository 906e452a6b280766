// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Grove server binary.
//!
//! Drives the personnel operations end to end against the configured
//! database. Results are printed as JSON on stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use grove_server_auth::{AuthError, Role, VisibilityType};
use grove_server_config::{LoggingConfig, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Grove - hierarchical store access control
#[derive(Parser, Debug)]
#[command(name = "grove-server", version, about, long_about = None)]
struct Args {
	/// Path to custom configuration file
	#[arg(short, long, env = "GROVE_SERVER_CONFIG")]
	config: Option<PathBuf>,

	/// Output logs as JSON
	#[arg(long)]
	json_logs: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Import a nested store tree from a JSON document
	ImportTree {
		/// Path to the tree document
		file: PathBuf,
	},
	/// Create a person at a store node
	CreateUser {
		/// Session token of the creating manager (omit to act as the local operator)
		#[arg(long, env = "GROVE_TOKEN")]
		token: Option<String>,
		#[arg(long)]
		username: String,
		/// Display name (defaults to the username)
		#[arg(long)]
		display_name: Option<String>,
		#[arg(long, env = "GROVE_USER_PASSWORD")]
		password: String,
		#[arg(long, default_value = "employee")]
		role: Role,
		/// Home node id
		#[arg(long)]
		store: String,
	},
	/// Exchange credentials for a session token
	Login {
		#[arg(long)]
		username: String,
		#[arg(long, env = "GROVE_USER_PASSWORD")]
		password: String,
	},
	/// List personnel at a store node
	Personnel {
		#[arg(long, env = "GROVE_TOKEN")]
		token: String,
		/// Target node id
		#[arg(long)]
		store: String,
		/// Visibility type: manager, employee or all
		#[arg(long = "type")]
		visibility: Option<VisibilityType>,
		/// Include personnel of every node beneath the target
		#[arg(long)]
		include_descendants: bool,
		#[arg(long)]
		limit: Option<u32>,
		#[arg(long)]
		offset: Option<u32>,
	},
	/// List the stores the caller may access
	Stores {
		#[arg(long, env = "GROVE_TOKEN")]
		token: String,
	},
}

fn load_config(path: Option<&PathBuf>) -> Result<ServerConfig> {
	let config = match path {
		Some(path) => grove_server_config::load_config_with_file(path),
		None => grove_server_config::load_config(),
	};
	config.context("failed to load configuration")
}

fn init_tracing(logging: &LoggingConfig, json: bool) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| logging.level.clone().into());

	let registry = tracing_subscriber::registry().with(filter);
	if json {
		registry
			.with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
			.init();
	} else {
		registry
			.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
			.init();
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	let config = load_config(args.config.as_ref())?;
	init_tracing(&config.logging, args.json_logs);

	tracing::info!(
		database = %config.database.url,
		environment = %config.auth.environment,
		"starting grove-server"
	);

	if let Err(err) = commands::run(&config, args.command).await {
		report_failure(&err);
		return Err(err);
	}
	Ok(())
}

/// Log a failed command and return the status it maps to.
fn report_failure(err: &anyhow::Error) -> u16 {
	match err.downcast_ref::<AuthError>() {
		Some(auth) if !auth.is_internal() => {
			let status = auth.status_code();
			tracing::warn!(status, error = %auth, "command rejected");
			status
		}
		Some(auth) => {
			let status = auth.status_code();
			tracing::error!(status, error = %auth, "command failed");
			status
		}
		None => {
			tracing::error!(error = ?err, "command failed");
			500
		}
	}
}
