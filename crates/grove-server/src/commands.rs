// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subcommand handlers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use grove_server_auth::{
	AuthError, Identity, NewPerson, NodeId, PageLimits, PersonnelQuery, Role, SessionSigner,
};
use grove_server_config::ServerConfig;
use grove_server_db::{
	create_pool, import_tree, run_migrations, NodeRepository, PersonnelRepository, TreeDocument,
};
use grove_server_personnel::PersonnelService;
use serde::Serialize;
use tracing::{info, warn};

use crate::Command;

pub(crate) async fn run(config: &ServerConfig, command: Command) -> Result<()> {
	let pool = create_pool(&config.database.url, config.database.max_connections)
		.await
		.context("failed to open database")?;
	run_migrations(&pool)
		.await
		.context("failed to run migrations")?;

	let nodes = Arc::new(NodeRepository::new(pool.clone()));
	let personnel = PersonnelRepository::new(pool);

	match command {
		Command::ImportTree { file } => {
			let raw = std::fs::read_to_string(&file)
				.with_context(|| format!("failed to read {}", file.display()))?;
			let document: TreeDocument =
				serde_json::from_str(&raw).context("invalid tree document")?;
			let imported = import_tree(nodes.as_ref(), &document).await?;
			let summaries: Vec<_> = imported.iter().map(|n| n.summary()).collect();
			print_json(&summaries)
		}
		Command::CreateUser {
			token,
			username,
			display_name,
			password,
			role,
			store,
		} => {
			let service = open_service(config, nodes, personnel).await?;
			let caller = match token {
				Some(token) => service.authenticate(Some(&bearer(&token)))?,
				None => local_operator(&service)?,
			};
			let attrs = NewPerson {
				display_name: display_name.unwrap_or_else(|| username.clone()),
				username,
				password,
				role,
				home_node_id: NodeId::parse(&store)?,
			};
			let person = service.create_personnel(&caller, &attrs).await?;
			print_json(&person)
		}
		Command::Login { username, password } => {
			let service = open_service(config, nodes, personnel).await?;
			let token = service.login(&username, &password).await?;
			print_json(&serde_json::json!({ "token": token }))
		}
		Command::Personnel {
			token,
			store,
			visibility,
			include_descendants,
			limit,
			offset,
		} => {
			let service = open_service(config, nodes, personnel).await?;
			let caller = service.authenticate(Some(&bearer(&token)))?;
			let query = PersonnelQuery {
				target: Some(store),
				visibility,
				include_descendants,
				limit,
				offset,
			};
			let page = service.list_personnel(&caller, &query).await?;
			print_json(&page)
		}
		Command::Stores { token } => {
			let service = open_service(config, nodes, personnel).await?;
			let caller = service.authenticate(Some(&bearer(&token)))?;
			let stores = service.accessible_stores(&caller).await?;
			print_json(&serde_json::json!({ "stores": stores }))
		}
	}
}

/// Build the service and publish the store tree it reads.
async fn open_service(
	config: &ServerConfig,
	nodes: Arc<NodeRepository>,
	personnel: PersonnelRepository,
) -> Result<PersonnelService> {
	let signer = SessionSigner::new(
		config.auth.token_secret.expose().as_bytes(),
		Duration::from_secs(config.auth.token_expiry_secs),
	)?;
	let limits = PageLimits::new(config.query.default_limit, config.query.max_limit);

	let service = PersonnelService::new(nodes, Arc::new(personnel), signer, limits);
	service.bootstrap().await?;
	Ok(service)
}

/// A manager at the tree root, for seeding personnel from the host.
fn local_operator(service: &PersonnelService) -> Result<Identity> {
	let root = service
		.root_node()?
		.ok_or_else(|| AuthError::Configuration("store tree has no root".to_string()))?;
	warn!(root = %root, "acting as local operator without a session token");
	Ok(Identity::new("local-operator", Role::Manager, root))
}

fn bearer(token: &str) -> String {
	format!("Bearer {token}")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	info!("command completed");
	Ok(())
}
