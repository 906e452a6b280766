// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Personnel operations over the store tree.
//!
//! Every operation that touches the tree reads the process's published
//! [`AncestryIndex`]; none of them runs before [`PersonnelService::bootstrap`].
//! Authorization and scope are settled in memory before any store is queried.

use std::sync::Arc;

use grove_server_auth::{
	authenticate, plan_personnel_query, AccessGuard, AncestryCell, AncestryIndex, AuthError,
	Identity, IndexState, NewPerson, NodeId, Page, PageLimits, Person, PersonnelQuery, SessionSigner,
	StoreSummary, TokenRejection,
};
use grove_server_db::{NodeStore, PersonnelStore};
use tracing::{debug, info, instrument, warn};

use crate::error::{from_db, Result};

#[derive(Clone)]
pub struct PersonnelService {
	nodes: Arc<dyn NodeStore>,
	personnel: Arc<dyn PersonnelStore>,
	index: Arc<AncestryCell>,
	signer: SessionSigner,
	limits: PageLimits,
}

impl PersonnelService {
	pub fn new(
		nodes: Arc<dyn NodeStore>,
		personnel: Arc<dyn PersonnelStore>,
		signer: SessionSigner,
		limits: PageLimits,
	) -> Self {
		Self {
			nodes,
			personnel,
			index: Arc::new(AncestryCell::new()),
			signer,
			limits,
		}
	}

	/// The tree's root, if the published tree has any nodes.
	pub fn root_node(&self) -> Result<Option<NodeId>> {
		let index = self.index.get()?;
		let root = index.nodes().find(|n| n.is_root()).map(|n| n.id);
		Ok(root)
	}

	/// Load every node and publish the ancestry index.
	///
	/// # Errors
	/// - `AuthError::Configuration` if the store holds no nodes
	/// - `AuthError::AlreadyInitialized` on a second call
	/// - `AuthError::DuplicateNode` if two rows share an id
	/// - `AuthError::InconsistentTree` if the stored chains disagree
	#[instrument(skip(self))]
	pub async fn bootstrap(&self) -> Result<Arc<AncestryIndex>> {
		if self.index.state() == IndexState::Ready {
			return Err(AuthError::AlreadyInitialized);
		}

		let nodes = self.nodes.fetch_all().await.map_err(from_db)?;
		if nodes.is_empty() {
			return Err(AuthError::Configuration("No store nodes found".to_string()));
		}

		let index = self.index.initialize(nodes)?;
		info!(nodes = index.len(), "ancestry index published");
		Ok(index)
	}

	/// List one page of personnel visible to `identity`.
	#[instrument(skip(self, identity, query), fields(username = %identity.username))]
	pub async fn list_personnel(
		&self,
		identity: &Identity,
		query: &PersonnelQuery,
	) -> Result<Page<Person>> {
		let index = self.index.get()?;
		let plan = plan_personnel_query(identity, query, &index, &self.limits)?;

		if plan.limit == 0 {
			return Ok(Page::empty(plan.limit, plan.offset));
		}

		let items = self
			.personnel
			.fetch_personnel_page(&plan.node_ids, plan.role_filter(), plan.limit, plan.offset)
			.await
			.map_err(from_db)?;

		debug!(
			target_node = %plan.target,
			returned = items.len(),
			limit = plan.limit,
			offset = plan.offset,
			"personnel page fetched"
		);
		Ok(Page::new(items, plan.limit, plan.offset))
	}

	/// Create a person at a node within the caller's authority.
	///
	/// # Errors
	/// - `AuthError::NotFound` if the home node does not exist
	/// - `AuthError::Forbidden` if it lies outside the caller's subtree
	/// - `AuthError::DuplicateIdentity` if the username is taken
	#[instrument(
		skip(self, identity, attrs),
		fields(username = %identity.username, new_username = %attrs.username)
	)]
	pub async fn create_personnel(&self, identity: &Identity, attrs: &NewPerson) -> Result<Person> {
		if attrs.username.trim().is_empty() {
			return Err(AuthError::MissingIdentifier("username"));
		}

		let index = self.index.get()?;
		AccessGuard::new(&index).enforce_existing(&identity.home_node_id, &attrs.home_node_id)?;

		let person = self
			.personnel
			.create_personnel(attrs)
			.await
			.map_err(from_db)?;

		info!(person_id = %person.id, home_node = %person.home_node_id, "person created");
		Ok(person)
	}

	/// The caller's home node and every node beneath it, by display name.
	#[instrument(skip(self, identity), fields(username = %identity.username))]
	pub async fn accessible_stores(&self, identity: &Identity) -> Result<Vec<StoreSummary>> {
		let index = self.index.get()?;
		let home = identity.home_node_id;
		if !index.exists(&home) {
			return Err(AuthError::NotFound(home.to_string()));
		}

		let mut ids = vec![home];
		ids.extend(index.descendants_of(&home));

		let mut stores: Vec<StoreSummary> = self
			.nodes
			.fetch_by_ids(&ids)
			.await
			.map_err(from_db)?
			.iter()
			.map(|node| node.summary())
			.collect();
		stores.sort_by(|a, b| {
			a.display_name
				.cmp(&b.display_name)
				.then_with(|| a.id.cmp(&b.id))
		});

		Ok(stores)
	}

	/// Exchange credentials for a session token.
	///
	/// An unknown username and a wrong password are indistinguishable.
	#[instrument(skip(self, password))]
	pub async fn login(&self, username: &str, password: &str) -> Result<String> {
		let person = self
			.personnel
			.verify_credentials(username, password)
			.await
			.map_err(from_db)?;

		let Some(person) = person else {
			warn!("login rejected");
			return Err(AuthError::Unauthenticated(
				TokenRejection::InvalidCredentials,
			));
		};

		let token = self.signer.issue(&person.identity())?;
		info!(role = %person.role, home_node = %person.home_node_id, "session issued");
		Ok(token)
	}

	/// Resolve the caller from an `Authorization` header value.
	pub fn authenticate(&self, header: Option<&str>) -> Result<Identity> {
		authenticate(header, &self.signer)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use grove_server_auth::testing::{node_id, SampleTree};
	use grove_server_auth::{NodeKind, OrgNode, Role, VisibilityType};
	use grove_server_db::testing::{create_migrated_test_pool, insert_person};
	use grove_server_db::{NodeRepository, PersonnelRepository};
	use sqlx::SqlitePool;
	use std::collections::HashSet;
	use std::time::Duration;

	fn signer() -> SessionSigner {
		SessionSigner::new(b"personnel-service-secret", Duration::from_secs(300)).unwrap()
	}

	fn service_for(pool: &SqlitePool) -> PersonnelService {
		PersonnelService::new(
			Arc::new(NodeRepository::new(pool.clone())),
			Arc::new(PersonnelRepository::new(pool.clone())),
			signer(),
			PageLimits::default(),
		)
	}

	/// Sample tree with one manager and two employees at every node.
	async fn fixture() -> (PersonnelService, SqlitePool, SampleTree) {
		let pool = create_migrated_test_pool().await;
		let tree = SampleTree::new();
		NodeRepository::new(pool.clone())
			.insert_nodes(&tree.nodes())
			.await
			.unwrap();

		for node in tree.nodes() {
			let name = node.display_name.to_lowercase();
			insert_person(&pool, &format!("{name}-manager"), Role::Manager, node.id).await;
			insert_person(&pool, &format!("{name}-emp1"), Role::Employee, node.id).await;
			insert_person(&pool, &format!("{name}-emp2"), Role::Employee, node.id).await;
		}

		let service = service_for(&pool);
		service.bootstrap().await.unwrap();
		(service, pool, tree)
	}

	fn usernames(page: &Page<Person>) -> Vec<&str> {
		page.items.iter().map(|p| p.username.as_str()).collect()
	}

	mod bootstrap {
		use super::*;

		#[tokio::test]
		async fn empty_store_is_a_startup_error() {
			let pool = create_migrated_test_pool().await;
			let service = service_for(&pool);

			let result = service.bootstrap().await;
			assert!(
				matches!(result, Err(AuthError::Configuration(ref msg)) if msg == "No store nodes found")
			);
			assert!(matches!(service.root_node(), Err(AuthError::NotInitialized)));
		}

		#[tokio::test]
		async fn second_bootstrap_is_rejected() {
			let (service, _pool, _tree) = fixture().await;
			assert!(service.root_node().is_ok());
			assert!(matches!(
				service.bootstrap().await,
				Err(AuthError::AlreadyInitialized)
			));
		}

		#[tokio::test]
		async fn stored_tree_with_two_roots_fails_to_publish() {
			let pool = create_migrated_test_pool().await;
			let nodes = vec![
				OrgNode::root(node_id(1), "East", NodeKind::Office),
				OrgNode::root(node_id(2), "West", NodeKind::Office),
			];
			NodeRepository::new(pool.clone())
				.insert_nodes(&nodes)
				.await
				.unwrap();
			let service = service_for(&pool);

			assert!(matches!(
				service.bootstrap().await,
				Err(AuthError::InconsistentTree(_))
			));
			assert!(matches!(service.root_node(), Err(AuthError::NotInitialized)));
		}

		#[tokio::test]
		async fn root_node_is_the_tree_root() {
			let (service, _pool, tree) = fixture().await;
			assert_eq!(service.root_node().unwrap(), Some(tree.root.id));
		}

		#[tokio::test]
		async fn queries_before_bootstrap_are_rejected() {
			let pool = create_migrated_test_pool().await;
			let service = service_for(&pool);
			let identity = Identity::new("r-manager", Role::Manager, node_id(1));

			let result = service
				.list_personnel(&identity, &PersonnelQuery::for_node(node_id(1).to_string()))
				.await;
			assert!(matches!(result, Err(AuthError::NotInitialized)));
			assert!(matches!(
				service.accessible_stores(&identity).await,
				Err(AuthError::NotInitialized)
			));
		}
	}

	mod list {
		use super::*;

		#[tokio::test]
		async fn sibling_subtree_is_forbidden() {
			let (service, _pool, tree) = fixture().await;
			let caller = Identity::new("c1-manager", Role::Manager, tree.c1.id);

			let result = service
				.list_personnel(&caller, &PersonnelQuery::for_node(tree.c2.id.to_string()))
				.await;
			assert!(matches!(result, Err(AuthError::Forbidden(_))));
		}

		#[tokio::test]
		async fn root_caller_sees_only_exact_node_without_descendants() {
			let (service, _pool, tree) = fixture().await;
			let caller = Identity::new("r-manager", Role::Manager, tree.root.id);

			let page = service
				.list_personnel(&caller, &PersonnelQuery::for_node(tree.c1a.id.to_string()))
				.await
				.unwrap();
			assert_eq!(
				usernames(&page),
				vec!["c1a-emp1", "c1a-emp2", "c1a-manager"]
			);
			assert!(page.items.iter().all(|p| p.home_node_id == tree.c1a.id));
		}

		#[tokio::test]
		async fn descendants_widen_the_scope() {
			let (service, _pool, tree) = fixture().await;
			let caller = Identity::new("r-manager", Role::Manager, tree.root.id);

			let page = service
				.list_personnel(
					&caller,
					&PersonnelQuery::for_node(tree.c1.id.to_string()).with_descendants(),
				)
				.await
				.unwrap();
			let homes: HashSet<_> = page.items.iter().map(|p| p.home_node_id).collect();
			assert_eq!(homes, HashSet::from([tree.c1.id, tree.c1a.id]));
			assert_eq!(page.len(), 6);
		}

		#[tokio::test]
		async fn employee_default_hides_managers() {
			let (service, _pool, tree) = fixture().await;
			let caller = Identity::new("c1-emp1", Role::Employee, tree.c1.id);

			let page = service
				.list_personnel(&caller, &PersonnelQuery::for_node(tree.c1.id.to_string()))
				.await
				.unwrap();
			assert_eq!(usernames(&page), vec!["c1-emp1", "c1-emp2"]);
		}

		#[tokio::test]
		async fn employee_requesting_managers_is_unauthorized() {
			let (service, _pool, tree) = fixture().await;
			let caller = Identity::new("c1-emp1", Role::Employee, tree.c1.id);

			let result = service
				.list_personnel(
					&caller,
					&PersonnelQuery::for_node(tree.c1.id.to_string())
						.with_visibility(VisibilityType::Manager),
				)
				.await;
			assert!(matches!(result, Err(AuthError::Unauthorized(_))));
		}

		#[tokio::test]
		async fn unknown_target_is_not_found() {
			let (service, _pool, tree) = fixture().await;
			let caller = Identity::new("r-manager", Role::Manager, tree.root.id);

			let result = service
				.list_personnel(&caller, &PersonnelQuery::for_node(node_id(99).to_string()))
				.await;
			assert!(matches!(result, Err(AuthError::NotFound(_))));
		}

		#[tokio::test]
		async fn missing_and_malformed_targets() {
			let (service, _pool, tree) = fixture().await;
			let caller = Identity::new("r-manager", Role::Manager, tree.root.id);

			let missing = service
				.list_personnel(&caller, &PersonnelQuery::default())
				.await;
			assert!(matches!(missing, Err(AuthError::MissingIdentifier(_))));

			let malformed = service
				.list_personnel(&caller, &PersonnelQuery::for_node("not-an-id"))
				.await;
			assert!(matches!(malformed, Err(AuthError::MalformedIdentifier(_))));
		}

		#[tokio::test]
		async fn zero_limit_is_an_empty_page() {
			let (service, _pool, tree) = fixture().await;
			let caller = Identity::new("r-manager", Role::Manager, tree.root.id);

			let page = service
				.list_personnel(
					&caller,
					&PersonnelQuery::for_node(tree.root.id.to_string()).with_page(0, 0),
				)
				.await
				.unwrap();
			assert!(page.is_empty());
			assert!(!page.has_more);
		}

		#[tokio::test]
		async fn windows_walk_the_whole_scope() {
			let (service, _pool, tree) = fixture().await;
			let caller = Identity::new("r-manager", Role::Manager, tree.root.id);
			let base = PersonnelQuery::for_node(tree.root.id.to_string()).with_descendants();

			let mut seen = Vec::new();
			let mut offset = 0;
			loop {
				let page = service
					.list_personnel(&caller, &base.clone().with_page(5, offset))
					.await
					.unwrap();
				seen.extend(page.items.iter().map(|p| p.username.clone()));
				if !page.has_more {
					break;
				}
				offset += 5;
			}

			assert_eq!(seen.len(), 12);
			let unique: HashSet<_> = seen.iter().collect();
			assert_eq!(unique.len(), 12);
			let mut sorted = seen.clone();
			sorted.sort();
			assert_eq!(seen, sorted);
		}
	}

	mod properties {
		use super::*;

		async fn scope_of(
			service: &PersonnelService,
			caller: &Identity,
			query: PersonnelQuery,
		) -> HashSet<String> {
			service
				.list_personnel(caller, &query.with_page(1000, 0))
				.await
				.unwrap()
				.items
				.into_iter()
				.map(|p| p.id)
				.collect()
		}

		#[tokio::test]
		async fn all_is_a_superset_of_every_narrower_visibility() {
			let (service, _pool, tree) = fixture().await;
			for node in tree.nodes() {
				let manager = Identity::new("r-manager", Role::Manager, tree.root.id);
				let target = node.id.to_string();

				let all = scope_of(
					&service,
					&manager,
					PersonnelQuery::for_node(&target).with_visibility(VisibilityType::All),
				)
				.await;
				for narrow in [VisibilityType::Manager, VisibilityType::Employee] {
					let subset = scope_of(
						&service,
						&manager,
						PersonnelQuery::for_node(&target).with_visibility(narrow),
					)
					.await;
					assert!(subset.is_subset(&all));
				}
			}
		}

		#[tokio::test]
		async fn including_descendants_never_shrinks_the_result() {
			let (service, _pool, tree) = fixture().await;
			let caller = Identity::new("r-manager", Role::Manager, tree.root.id);
			for node in tree.nodes() {
				let target = node.id.to_string();
				let exact = scope_of(&service, &caller, PersonnelQuery::for_node(&target)).await;
				let wide = scope_of(
					&service,
					&caller,
					PersonnelQuery::for_node(&target).with_descendants(),
				)
				.await;
				assert!(exact.is_subset(&wide));
			}
		}

		#[tokio::test]
		async fn results_stay_inside_the_callers_subtree() {
			let (service, _pool, tree) = fixture().await;
			let index = tree.index();
			for home in tree.nodes() {
				let caller = Identity::new("caller", Role::Manager, home.id);
				for target in tree.nodes() {
					let query = PersonnelQuery::for_node(target.id.to_string())
						.with_descendants()
						.with_page(1000, 0);
					match service.list_personnel(&caller, &query).await {
						Ok(page) => {
							for person in &page.items {
								assert!(index.is_ancestor_or_self(&home.id, &person.home_node_id));
							}
						}
						Err(err) => {
							assert!(matches!(err, AuthError::Forbidden(_)));
							assert!(!index.is_ancestor_or_self(&home.id, &target.id));
						}
					}
				}
			}
		}
	}

	mod create {
		use super::*;

		fn new_person(username: &str, home: grove_server_auth::NodeId) -> NewPerson {
			NewPerson {
				username: username.to_string(),
				display_name: "New Hire".to_string(),
				password: "s3cret-pass".to_string(),
				role: Role::Employee,
				home_node_id: home,
			}
		}

		#[tokio::test]
		async fn manager_creates_inside_subtree() {
			let (service, _pool, tree) = fixture().await;
			let caller = Identity::new("c1-manager", Role::Manager, tree.c1.id);

			let person = service
				.create_personnel(&caller, &new_person("newbie", tree.c1a.id))
				.await
				.unwrap();
			assert_eq!(person.home_node_id, tree.c1a.id);

			let page = service
				.list_personnel(&caller, &PersonnelQuery::for_node(tree.c1a.id.to_string()))
				.await
				.unwrap();
			assert!(usernames(&page).contains(&"newbie"));
		}

		#[tokio::test]
		async fn outside_subtree_is_forbidden() {
			let (service, _pool, tree) = fixture().await;
			let caller = Identity::new("c1-manager", Role::Manager, tree.c1.id);

			let result = service
				.create_personnel(&caller, &new_person("stray", tree.c2.id))
				.await;
			assert!(matches!(result, Err(AuthError::Forbidden(_))));
		}

		#[tokio::test]
		async fn unknown_home_is_not_found() {
			let (service, _pool, tree) = fixture().await;
			let caller = Identity::new("r-manager", Role::Manager, tree.root.id);

			let result = service
				.create_personnel(&caller, &new_person("ghost", node_id(77)))
				.await;
			assert!(matches!(result, Err(AuthError::NotFound(_))));
		}

		#[tokio::test]
		async fn taken_username_is_duplicate_identity() {
			let (service, _pool, tree) = fixture().await;
			let caller = Identity::new("r-manager", Role::Manager, tree.root.id);

			let result = service
				.create_personnel(&caller, &new_person("c2-emp1", tree.c2.id))
				.await;
			assert!(matches!(result, Err(AuthError::DuplicateIdentity(_))));
		}

		#[tokio::test]
		async fn blank_username_is_rejected() {
			let (service, _pool, tree) = fixture().await;
			let caller = Identity::new("r-manager", Role::Manager, tree.root.id);

			let result = service
				.create_personnel(&caller, &new_person("  ", tree.c2.id))
				.await;
			assert!(matches!(result, Err(AuthError::MissingIdentifier(_))));
		}
	}

	mod stores {
		use super::*;

		#[tokio::test]
		async fn home_and_descendants_sorted_by_name() {
			let (service, _pool, tree) = fixture().await;
			let caller = Identity::new("c1-emp1", Role::Employee, tree.c1.id);

			let stores = service.accessible_stores(&caller).await.unwrap();
			let names: Vec<_> = stores.iter().map(|s| s.display_name.as_str()).collect();
			assert_eq!(names, vec!["C1", "C1a"]);
			assert_eq!(stores[1].kind, NodeKind::Store);
		}

		#[tokio::test]
		async fn root_sees_every_node() {
			let (service, _pool, tree) = fixture().await;
			let caller = Identity::new("r-manager", Role::Manager, tree.root.id);

			let stores = service.accessible_stores(&caller).await.unwrap();
			assert_eq!(stores.len(), 4);
		}

		#[tokio::test]
		async fn unknown_home_is_not_found() {
			let (service, _pool, _tree) = fixture().await;
			let caller = Identity::new("ghost", Role::Manager, node_id(50));

			assert!(matches!(
				service.accessible_stores(&caller).await,
				Err(AuthError::NotFound(_))
			));
		}

		#[tokio::test]
		async fn leaf_sees_only_itself() {
			let pool = create_migrated_test_pool().await;
			let root = OrgNode::root(node_id(1), "Only", NodeKind::Store);
			NodeRepository::new(pool.clone())
				.insert_nodes(&[root.clone()])
				.await
				.unwrap();
			let service = service_for(&pool);
			service.bootstrap().await.unwrap();

			let caller = Identity::new("solo", Role::Employee, root.id);
			let stores = service.accessible_stores(&caller).await.unwrap();
			assert_eq!(stores, vec![root.summary()]);
		}
	}

	mod session {
		use super::*;

		#[tokio::test]
		async fn login_issues_a_token_for_the_persons_identity() {
			let (service, _pool, tree) = fixture().await;
			let manager = Identity::new("r-manager", Role::Manager, tree.root.id);
			service
				.create_personnel(
					&manager,
					&NewPerson {
						username: "dana".to_string(),
						display_name: "Dana".to_string(),
						password: "correct horse".to_string(),
						role: Role::Manager,
						home_node_id: tree.c2.id,
					},
				)
				.await
				.unwrap();

			let token = service.login("dana", "correct horse").await.unwrap();
			let identity = service
				.authenticate(Some(&format!("Bearer {token}")))
				.unwrap();
			assert_eq!(identity, Identity::new("dana", Role::Manager, tree.c2.id));

			let wrong = service.login("dana", "battery staple").await;
			assert!(matches!(
				wrong,
				Err(AuthError::Unauthenticated(TokenRejection::InvalidCredentials))
			));
		}

		#[tokio::test]
		async fn unknown_user_cannot_log_in() {
			let (service, _pool, _tree) = fixture().await;
			let result = service.login("nobody", "whatever").await;
			assert!(matches!(
				result,
				Err(AuthError::Unauthenticated(TokenRejection::InvalidCredentials))
			));
		}

		#[tokio::test]
		async fn missing_header_is_unauthenticated() {
			let (service, _pool, _tree) = fixture().await;
			assert!(matches!(
				service.authenticate(None),
				Err(AuthError::Unauthenticated(TokenRejection::Missing))
			));
		}
	}
}
