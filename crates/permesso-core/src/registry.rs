//! Provider registration and the selection policy.
//!
//! Hosts register every backend they ship into a [`ProviderRegistry`] during
//! startup, then hand it to [`PermissionService::initialize`]. The service
//! picks exactly one active provider: a `Main` provider wins outright, the
//! persisted `defaultProvider` identifier is honored among `Optional` ones,
//! and the built-in vanilla provider backstops an empty registry. The choice
//! is written back to the config file so it survives restarts.

use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::ConfigStore;
use crate::prelude::*;
use crate::vanilla::{self, VanillaProvider};

/// Insertion-ordered collection of candidate providers, keyed by identifier.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
	providers: IndexMap<Box<str>, Arc<dyn PermissionProvider>>,
}

impl ProviderRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a candidate. Identifiers must be unique.
	pub fn register(&mut self, provider: Arc<dyn PermissionProvider>) -> PermResult<()> {
		let id: Box<str> = provider.identifier().into();
		if self.providers.contains_key(&id) {
			return Err(Error::DuplicateProvider(id));
		}
		info!(provider = %id, name = provider.name(), "registered permission provider");
		self.providers.insert(id, provider);
		Ok(())
	}

	/// Registers the provider a fallible constructor yields. A construction
	/// failure excludes the candidate and is logged, not propagated.
	pub fn register_with<F>(&mut self, ctor: F)
	where
		F: FnOnce() -> PermResult<Arc<dyn PermissionProvider>>,
	{
		match ctor() {
			Ok(provider) => {
				if let Err(e) = self.register(provider) {
					error!(error = %e, "cannot register permission provider");
				}
			}
			Err(e) => error!(error = %e, "permission provider construction failed, skipping"),
		}
	}

	pub fn get(&self, identifier: &str) -> Option<Arc<dyn PermissionProvider>> {
		self.providers.get(identifier).cloned()
	}

	pub fn identifiers(&self) -> impl Iterator<Item = &str> {
		self.providers.keys().map(AsRef::as_ref)
	}

	pub fn is_empty(&self) -> bool {
		self.providers.is_empty()
	}

	fn iter(&self) -> impl Iterator<Item = &Arc<dyn PermissionProvider>> {
		self.providers.values()
	}
}

#[derive(Debug)]
struct ActiveSet {
	providers: IndexMap<Box<str>, Arc<dyn PermissionProvider>>,
	active: Arc<dyn PermissionProvider>,
}

/// Owns the selection outcome and hands out the active provider.
#[derive(Debug)]
pub struct PermissionService {
	initialized: AtomicBool,
	inner: RwLock<Option<ActiveSet>>,
	ledger: Arc<dyn OperatorLedger>,
	store: ConfigStore,
}

impl PermissionService {
	pub fn new(store: ConfigStore, ledger: Arc<dyn OperatorLedger>) -> Self {
		Self { initialized: AtomicBool::new(false), inner: RwLock::new(None), ledger, store }
	}

	/// Runs selection once. Later calls are no-ops; use
	/// [`reload`](Self::reload) to re-select deliberately.
	pub fn initialize(&self, registry: &ProviderRegistry) {
		if self.initialized.swap(true, Ordering::SeqCst) {
			debug!("permission service already initialized, ignoring");
			return;
		}
		self.select(registry);
	}

	/// Re-reads the config file and re-runs selection against the registry.
	pub fn reload(&self, registry: &ProviderRegistry) {
		self.initialized.store(true, Ordering::SeqCst);
		self.select(registry);
	}

	/// The provider selection policy.
	fn select(&self, registry: &ProviderRegistry) {
		let mut config = self.store.load();

		// tentative pick: the persisted identifier, if it is still registered
		let mut selected = config
			.default_provider
			.as_deref()
			.and_then(|id| registry.get(id));

		let mut main_seen = false;
		for provider in registry.iter() {
			match provider.priority() {
				Priority::Main => {
					if main_seen {
						warn!(
							provider = provider.identifier(),
							"multiple main permission providers registered, keeping the first"
						);
						continue;
					}
					main_seen = true;
					match &selected {
						Some(current) if current.priority() == Priority::Main => {}
						_ => selected = Some(provider.clone()),
					}
				}
				Priority::Optional => {
					let replace = match &selected {
						None => true,
						Some(current) => current.priority() == Priority::Fallback,
					};
					if replace {
						selected = Some(provider.clone());
					}
				}
				Priority::Fallback => {}
			}
		}

		let mut providers: IndexMap<Box<str>, Arc<dyn PermissionProvider>> = registry
			.iter()
			.map(|p| (Box::from(p.identifier()), p.clone()))
			.collect();

		let active = match selected {
			Some(provider) => provider,
			None => {
				let fallback: Arc<dyn PermissionProvider> =
					Arc::new(VanillaProvider::new(self.ledger.clone(), &config));
				providers.insert(vanilla::PROVIDER_ID.into(), fallback.clone());
				fallback
			}
		};

		let previous = config.default_provider.clone();
		if let Some(previous) = previous.as_deref() {
			if !previous.is_empty() && previous != active.identifier() {
				warn!(
					previous = previous,
					selected = active.identifier(),
					"configured permission provider replaced"
				);
			}
		}

		config.default_provider = Some(active.identifier().into());
		config.available_providers = Some(format!(
			"Available providers: {}",
			providers.keys().map(AsRef::as_ref).collect::<Vec<_>>().join(", ")
		));
		self.store.save(&config);

		info!(provider = active.identifier(), name = active.name(), "permission provider selected");
		*self.inner.write() = Some(ActiveSet { providers, active });
	}

	/// The selected provider, if selection has run.
	pub fn active(&self) -> Option<Arc<dyn PermissionProvider>> {
		self.inner.read().as_ref().map(|set| set.active.clone())
	}

	/// A specific provider by identifier, whether or not it is active.
	pub fn by_id(&self, identifier: &str) -> Option<Arc<dyn PermissionProvider>> {
		self.inner.read().as_ref().and_then(|set| set.providers.get(identifier).cloned())
	}

	pub fn operator_ledger(&self) -> Arc<dyn OperatorLedger> {
		self.ledger.clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use indexmap::IndexMap as Map;
	use permesso_types::context::MemoryOperatorLedger;

	#[derive(Debug)]
	struct StubProvider {
		id: &'static str,
		priority: Priority,
	}

	#[async_trait]
	impl PermissionProvider for StubProvider {
		fn name(&self) -> &str {
			self.id
		}

		fn identifier(&self) -> &str {
			self.id
		}

		fn priority(&self) -> Priority {
			self.priority
		}

		fn capabilities(&self) -> Capabilities {
			Capabilities::default()
		}

		async fn check(
			&self,
			_user: &UserContext,
			_permission: &str,
		) -> PermResult<PermissionValue> {
			Ok(PermissionValue::Default)
		}

		async fn list(
			&self,
			_user: &UserContext,
			_parent: Option<&str>,
			_world: Option<&str>,
			_filter: PermissionValue,
		) -> PermResult<Vec<Box<str>>> {
			Ok(Vec::new())
		}

		async fn list_non_inherited(
			&self,
			_user: &UserContext,
			_parent: Option<&str>,
			_world: Option<&str>,
			_filter: PermissionValue,
		) -> PermResult<Vec<Box<str>>> {
			Ok(Vec::new())
		}

		async fn get_all(
			&self,
			_user: &UserContext,
			_parent: Option<&str>,
			_world: Option<&str>,
		) -> PermResult<Map<Box<str>, PermissionValue>> {
			Ok(Map::new())
		}

		async fn get_all_non_inherited(
			&self,
			_user: &UserContext,
			_parent: Option<&str>,
			_world: Option<&str>,
		) -> PermResult<Map<Box<str>, PermissionValue>> {
			Ok(Map::new())
		}
	}

	fn stub(id: &'static str, priority: Priority) -> Arc<dyn PermissionProvider> {
		Arc::new(StubProvider { id, priority })
	}

	fn service() -> PermissionService {
		PermissionService::new(ConfigStore::ephemeral(), Arc::new(MemoryOperatorLedger::new()))
	}

	#[test]
	fn empty_registry_falls_back_to_vanilla() {
		let svc = service();
		svc.initialize(&ProviderRegistry::new());

		let active = svc.active().unwrap();
		assert_eq!(active.identifier(), "vanilla");
		assert_eq!(active.priority(), Priority::Fallback);
		assert!(svc.by_id("vanilla").is_some());
	}

	#[test]
	fn main_beats_optional() {
		let mut registry = ProviderRegistry::new();
		registry.register(stub("sidecar", Priority::Optional)).unwrap();
		registry.register(stub("dedicated", Priority::Main)).unwrap();

		let svc = service();
		svc.initialize(&registry);
		assert_eq!(svc.active().unwrap().identifier(), "dedicated");
	}

	#[test]
	fn first_main_wins_over_second() {
		let mut registry = ProviderRegistry::new();
		registry.register(stub("first", Priority::Main)).unwrap();
		registry.register(stub("second", Priority::Main)).unwrap();

		let svc = service();
		svc.initialize(&registry);
		assert_eq!(svc.active().unwrap().identifier(), "first");
	}

	#[test]
	fn persisted_identifier_is_honored() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("permissions.json");
		std::fs::write(&path, r#"{"defaultProvider": "second"}"#).unwrap();

		let mut registry = ProviderRegistry::new();
		registry.register(stub("first", Priority::Optional)).unwrap();
		registry.register(stub("second", Priority::Optional)).unwrap();

		let svc =
			PermissionService::new(ConfigStore::new(&path), Arc::new(MemoryOperatorLedger::new()));
		svc.initialize(&registry);
		assert_eq!(svc.active().unwrap().identifier(), "second");
	}

	#[test]
	fn main_overrides_persisted_optional() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("permissions.json");
		std::fs::write(&path, r#"{"defaultProvider": "sidecar"}"#).unwrap();

		let mut registry = ProviderRegistry::new();
		registry.register(stub("sidecar", Priority::Optional)).unwrap();
		registry.register(stub("dedicated", Priority::Main)).unwrap();

		let svc =
			PermissionService::new(ConfigStore::new(&path), Arc::new(MemoryOperatorLedger::new()));
		svc.initialize(&registry);
		assert_eq!(svc.active().unwrap().identifier(), "dedicated");
	}

	#[test]
	fn selection_is_persisted() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("permissions.json");

		let mut registry = ProviderRegistry::new();
		registry.register(stub("sidecar", Priority::Optional)).unwrap();

		let store = ConfigStore::new(&path);
		let svc = PermissionService::new(store.clone(), Arc::new(MemoryOperatorLedger::new()));
		svc.initialize(&registry);

		let saved = store.load();
		assert_eq!(saved.default_provider.as_deref(), Some("sidecar"));
		assert!(saved.available_providers.as_deref().unwrap().contains("sidecar"));
	}

	#[test]
	fn initialize_runs_once() {
		let mut first = ProviderRegistry::new();
		first.register(stub("first", Priority::Optional)).unwrap();
		let mut second = ProviderRegistry::new();
		second.register(stub("second", Priority::Main)).unwrap();

		let svc = service();
		svc.initialize(&first);
		svc.initialize(&second);
		assert_eq!(svc.active().unwrap().identifier(), "first");

		svc.reload(&second);
		assert_eq!(svc.active().unwrap().identifier(), "second");
	}

	#[test]
	fn duplicate_registration_rejected() {
		let mut registry = ProviderRegistry::new();
		registry.register(stub("twin", Priority::Optional)).unwrap();
		assert!(matches!(
			registry.register(stub("twin", Priority::Optional)),
			Err(Error::DuplicateProvider(_))
		));
	}

	#[test]
	fn failed_construction_is_excluded() {
		let mut registry = ProviderRegistry::new();
		registry.register_with(|| Err(Error::ProviderConstruction("no database".into())));
		assert!(registry.is_empty());

		registry.register_with(|| Ok(stub("late", Priority::Optional)));
		assert_eq!(registry.identifiers().collect::<Vec<_>>(), vec!["late"]);
	}
}

// vim: ts=4
