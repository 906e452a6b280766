// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for the Grove server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`GROVE_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use grove_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Database at {}", config.database.url);
//! ```

pub mod error;
pub mod layer;
pub mod secret;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use secret::{load_secret_env, SecretString};
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Environment variable holding the session signing secret.
pub const TOKEN_SECRET_ENV: &str = "GROVE_SERVER_TOKEN_SECRET";

const MIN_PRODUCTION_SECRET_BYTES: usize = 32;

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
	pub database: DatabaseConfig,
	pub auth: AuthConfig,
	pub query: QueryConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`GROVE_SERVER_*`)
/// 2. Config file (`/etc/grove/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let token_secret = load_secret_env(TOKEN_SECRET_ENV)?;
	finalize_with_secret(layer, token_secret)
}

fn finalize_with_secret(
	layer: ServerConfigLayer,
	token_secret: Option<SecretString>,
) -> Result<ServerConfig, ConfigError> {
	let database = layer.database.unwrap_or_default().finalize()?;
	let auth = layer.auth.unwrap_or_default().finalize(token_secret)?;
	let query = layer.query.unwrap_or_default().finalize()?;
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&auth)?;

	info!(
		database = %database.url,
		environment = %auth.environment,
		token_expiry_secs = auth.token_expiry_secs,
		default_limit = query.default_limit,
		max_limit = query.max_limit,
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		database,
		auth,
		query,
		logging,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(auth: &AuthConfig) -> Result<(), ConfigError> {
	if auth.environment == "production"
		&& auth.token_secret.expose().len() < MIN_PRODUCTION_SECRET_BYTES
	{
		return Err(ConfigError::Validation(format!(
			"{TOKEN_SECRET_ENV} must be at least {MIN_PRODUCTION_SECRET_BYTES} bytes when \
			 GROVE_SERVER_ENV=production"
		)));
	}

	Ok(())
}
