//! Built-in operator-level-tiered fallback provider.
//!
//! No external permission system required: permissions are five flat
//! `key -> bool` maps from the config file, one per operator level. Level N
//! sees the union of levels 0..N with higher levels overriding. Groups exist
//! only as the emulated `operator-level-{1..4}` pseudo-groups; adding or
//! removing one mutates the actor's operator level through the host's
//! [`OperatorLedger`].

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use permesso_types::resolve::{self, PermissionMap};

use crate::config::PermissionsConfig;
use crate::prelude::*;

pub const PROVIDER_ID: &str = "vanilla";

const OPERATOR_PREFIX: &str = "operator-level-";

#[derive(Debug, Default)]
struct LevelMaps {
	/// Cumulative maps: index N = defaults merged upward through level N
	effective: [PermissionMap; 5],
	/// Own entries per level, backing the non-inherited group variants
	own: [PermissionMap; 5],
}

#[derive(Debug)]
pub struct VanillaProvider {
	ledger: Arc<dyn OperatorLedger>,
	maps: RwLock<LevelMaps>,
}

impl VanillaProvider {
	pub fn new(ledger: Arc<dyn OperatorLedger>, config: &PermissionsConfig) -> Self {
		let provider = Self { ledger, maps: RwLock::new(LevelMaps::default()) };
		provider.set_config(config);
		provider
	}

	/// Rebuilds the level maps from a (re)loaded config.
	pub fn set_config(&self, config: &PermissionsConfig) {
		let mut maps = LevelMaps::default();

		let mut cumulative = PermissionMap::new();
		for level in 0..=4u8 {
			let own: PermissionMap =
				config.level_map(level).iter().map(|(k, v)| (k.clone(), *v)).collect();
			for (key, value) in &own {
				cumulative.insert(key.clone(), *value);
			}
			maps.effective[level as usize] = cumulative.clone();
			maps.own[level as usize] = own;
		}

		*self.maps.write() = maps;
	}

	fn level_index(level: u8) -> usize {
		usize::from(level.min(4))
	}

	/// Pseudo-group name -> operator level; anything else is the default map.
	fn group_level(group: &str) -> usize {
		group
			.strip_prefix(OPERATOR_PREFIX)
			.and_then(|suffix| suffix.parse::<u8>().ok())
			.filter(|level| (1..=4).contains(level))
			.map_or(0, usize::from)
	}

	fn listed(map: &PermissionMap, parent: Option<&str>, filter: PermissionValue) -> Vec<Box<str>> {
		match parent {
			Some(parent) => resolve::list_children(map, parent, filter),
			None => resolve::list(map, filter),
		}
	}

	fn mapped(
		map: &PermissionMap,
		parent: Option<&str>,
	) -> IndexMap<Box<str>, PermissionValue> {
		match parent {
			Some(parent) => resolve::get_all_children(map, parent),
			None => resolve::get_all(map),
		}
	}
}

#[async_trait]
impl PermissionProvider for VanillaProvider {
	fn name(&self) -> &str {
		"Vanilla"
	}

	fn identifier(&self) -> &str {
		PROVIDER_ID
	}

	fn priority(&self) -> Priority {
		Priority::Fallback
	}

	fn capabilities(&self) -> Capabilities {
		Capabilities { groups: true, offline_checks: true, ..Capabilities::default() }
	}

	async fn check(&self, user: &UserContext, permission: &str) -> PermResult<PermissionValue> {
		let maps = self.maps.read();
		Ok(resolve::check(&maps.effective[Self::level_index(user.operator_level)], permission))
	}

	async fn list(
		&self,
		user: &UserContext,
		parent: Option<&str>,
		_world: Option<&str>,
		filter: PermissionValue,
	) -> PermResult<Vec<Box<str>>> {
		let maps = self.maps.read();
		Ok(Self::listed(&maps.effective[Self::level_index(user.operator_level)], parent, filter))
	}

	async fn list_non_inherited(
		&self,
		_user: &UserContext,
		_parent: Option<&str>,
		_world: Option<&str>,
		_filter: PermissionValue,
	) -> PermResult<Vec<Box<str>>> {
		// every vanilla record comes from a level map, none are user-owned
		Ok(Vec::new())
	}

	async fn get_all(
		&self,
		user: &UserContext,
		parent: Option<&str>,
		_world: Option<&str>,
	) -> PermResult<IndexMap<Box<str>, PermissionValue>> {
		let maps = self.maps.read();
		Ok(Self::mapped(&maps.effective[Self::level_index(user.operator_level)], parent))
	}

	async fn get_all_non_inherited(
		&self,
		_user: &UserContext,
		_parent: Option<&str>,
		_world: Option<&str>,
	) -> PermResult<IndexMap<Box<str>, PermissionValue>> {
		Ok(IndexMap::new())
	}

	async fn get_groups(
		&self,
		user: &UserContext,
		_world: Option<&str>,
	) -> PermResult<Vec<Box<str>>> {
		let mut groups: Vec<Box<str>> = vec!["default".into()];
		for level in 1..=user.operator_level.min(4) {
			groups.push(format!("{}{}", OPERATOR_PREFIX, level).into());
		}
		Ok(groups)
	}

	async fn add_group(
		&self,
		user: &UserContext,
		_world: Option<&str>,
		group: &str,
		_duration: Option<Duration>,
	) -> PermResult<()> {
		if !user.actor.supports_persistence() {
			return Ok(());
		}
		if let Some(suffix) = group.strip_prefix(OPERATOR_PREFIX) {
			if let Ok(level) = suffix.parse::<u8>() {
				self.ledger.grant(&user.actor, level.clamp(1, 4));
			}
		}
		Ok(())
	}

	async fn remove_group(
		&self,
		user: &UserContext,
		_world: Option<&str>,
		group: &str,
	) -> PermResult<()> {
		if !user.actor.supports_persistence() {
			return Ok(());
		}
		if let Some(suffix) = group.strip_prefix(OPERATOR_PREFIX) {
			if let Ok(level) = suffix.parse::<u8>() {
				self.ledger.revoke_if(&user.actor, level.clamp(1, 4));
			}
		}
		Ok(())
	}

	async fn check_group(
		&self,
		group: &str,
		_world: Option<&str>,
		permission: &str,
	) -> PermResult<PermissionValue> {
		let maps = self.maps.read();
		Ok(resolve::check(&maps.effective[Self::group_level(group)], permission))
	}

	async fn list_group(
		&self,
		group: &str,
		parent: Option<&str>,
		_world: Option<&str>,
		filter: PermissionValue,
	) -> PermResult<Vec<Box<str>>> {
		let maps = self.maps.read();
		Ok(Self::listed(&maps.effective[Self::group_level(group)], parent, filter))
	}

	async fn list_group_non_inherited(
		&self,
		group: &str,
		parent: Option<&str>,
		_world: Option<&str>,
		filter: PermissionValue,
	) -> PermResult<Vec<Box<str>>> {
		let maps = self.maps.read();
		Ok(Self::listed(&maps.own[Self::group_level(group)], parent, filter))
	}

	async fn get_all_group(
		&self,
		group: &str,
		parent: Option<&str>,
		_world: Option<&str>,
	) -> PermResult<IndexMap<Box<str>, PermissionValue>> {
		let maps = self.maps.read();
		Ok(Self::mapped(&maps.effective[Self::group_level(group)], parent))
	}

	async fn get_all_group_non_inherited(
		&self,
		group: &str,
		parent: Option<&str>,
		_world: Option<&str>,
	) -> PermResult<IndexMap<Box<str>, PermissionValue>> {
		let maps = self.maps.read();
		Ok(Self::mapped(&maps.own[Self::group_level(group)], parent))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use permesso_types::context::MemoryOperatorLedger;
	use uuid::Uuid;

	fn config() -> PermissionsConfig {
		let mut config = PermissionsConfig::default();
		config.default_permissions.insert("chat.talk".into(), true);
		config.default_permissions.insert("home.teleport".into(), true);
		config.level1_permissions.insert("command.kick".into(), true);
		config.level2_permissions.insert("command.ban".into(), true);
		config.level2_permissions.insert("home.teleport".into(), false);
		config.level4_permissions.insert("command.stop".into(), true);
		config
	}

	fn provider() -> VanillaProvider {
		VanillaProvider::new(Arc::new(MemoryOperatorLedger::new()), &config())
	}

	fn user(level: u8) -> UserContext {
		UserContext::new(Actor::Player { uuid: Uuid::new_v4(), name: "alice".into() }, level)
	}

	#[tokio::test]
	async fn levels_merge_upward() {
		let p = provider();

		assert_eq!(p.check(&user(0), "chat.talk").await.unwrap(), PermissionValue::Allow);
		assert_eq!(p.check(&user(0), "command.kick").await.unwrap(), PermissionValue::Default);
		assert_eq!(p.check(&user(1), "command.kick").await.unwrap(), PermissionValue::Allow);
		assert_eq!(p.check(&user(2), "command.kick").await.unwrap(), PermissionValue::Allow);
		assert_eq!(p.check(&user(4), "command.stop").await.unwrap(), PermissionValue::Allow);
		assert_eq!(p.check(&user(3), "command.stop").await.unwrap(), PermissionValue::Default);
	}

	#[tokio::test]
	async fn higher_level_overrides_lower_entry() {
		let p = provider();

		assert_eq!(p.check(&user(1), "home.teleport").await.unwrap(), PermissionValue::Allow);
		assert_eq!(p.check(&user(2), "home.teleport").await.unwrap(), PermissionValue::Deny);
	}

	#[tokio::test]
	async fn pseudo_groups_reported_up_to_level() {
		let p = provider();
		let groups = p.get_groups(&user(2), None).await.unwrap();
		let names: Vec<&str> = groups.iter().map(AsRef::as_ref).collect();
		assert_eq!(names, vec!["default", "operator-level-1", "operator-level-2"]);
	}

	#[tokio::test]
	async fn group_queries_select_by_pseudo_group_name() {
		let p = provider();

		assert_eq!(
			p.check_group("operator-level-2", None, "command.ban").await.unwrap(),
			PermissionValue::Allow
		);
		assert_eq!(
			p.check_group("operator-level-1", None, "command.ban").await.unwrap(),
			PermissionValue::Default
		);
		// unknown groups fall back to the default map
		assert_eq!(
			p.check_group("vip", None, "chat.talk").await.unwrap(),
			PermissionValue::Allow
		);
	}

	#[tokio::test]
	async fn non_inherited_group_variants_use_own_entries() {
		let p = provider();

		let own = p
			.list_group_non_inherited("operator-level-2", None, None, PermissionValue::Default)
			.await
			.unwrap();
		let names: Vec<&str> = own.iter().map(AsRef::as_ref).collect();
		assert_eq!(names, vec!["command.ban", "home.teleport"]);
	}

	#[tokio::test]
	async fn add_group_mutates_ledger_clamped() {
		let ledger = Arc::new(MemoryOperatorLedger::new());
		let p = VanillaProvider::new(ledger.clone(), &config());
		let u = user(0);

		p.add_group(&u, None, "operator-level-9", None).await.unwrap();
		assert_eq!(ledger.level(&u.actor), 4);

		p.remove_group(&u, None, "operator-level-3").await.unwrap();
		assert_eq!(ledger.level(&u.actor), 4);

		p.remove_group(&u, None, "operator-level-4").await.unwrap();
		assert_eq!(ledger.level(&u.actor), 0);
	}

	#[tokio::test]
	async fn console_and_foreign_groups_are_no_ops() {
		let ledger = Arc::new(MemoryOperatorLedger::new());
		let p = VanillaProvider::new(ledger.clone(), &config());

		let console = UserContext::console();
		p.add_group(&console, None, "operator-level-2", None).await.unwrap();
		assert_eq!(ledger.level(&console.actor), 0);

		let u = user(0);
		p.add_group(&u, None, "vip", None).await.unwrap();
		assert_eq!(ledger.level(&u.actor), 0);
	}

	#[tokio::test]
	async fn wildcard_checks_work_over_level_maps() {
		let p = provider();
		assert_eq!(p.check(&user(1), "command.*").await.unwrap(), PermissionValue::Allow);
		assert_eq!(p.check(&user(0), "command.*").await.unwrap(), PermissionValue::Default);
	}

	#[tokio::test]
	async fn set_is_unsupported() {
		let p = provider();
		assert!(matches!(
			p.set(&user(4), None, "a.b", PermissionValue::Allow, None).await,
			Err(Error::Unsupported(_))
		));
	}
}

// vim: ts=4
