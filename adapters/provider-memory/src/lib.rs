//! In-memory permission provider.
//!
//! Full-featured reference backend: per-subject records, group inheritance,
//! timed records and memberships, and per-world scoping, all held in a
//! process-local store. Suitable for tests, single-process tools, and as a
//! template for persistent backends.
//!
//! Expiry is evaluated lazily on read; expired records simply stop matching.
//! Group relations are walked depth-first with a cycle guard, and the first
//! occurrence of a key along the walk wins, so a subject's own record always
//! shadows an inherited one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::time::Duration;
use uuid::Uuid;

use permesso_types::context::UserContext;
use permesso_types::prelude::*;
use permesso_types::provider::{Capabilities, PermissionProvider, Priority};
use permesso_types::resolve::{self, PermissionMap};

#[derive(Debug, Clone)]
struct PermRecord {
	key: Box<str>,
	value: bool,
	world: Option<Box<str>>,
	expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct Membership {
	group: Box<str>,
	world: Option<Box<str>>,
	expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
struct SubjectRecords {
	records: Vec<PermRecord>,
	memberships: Vec<Membership>,
}

#[derive(Debug, Default)]
struct State {
	users: IndexMap<Uuid, SubjectRecords>,
	groups: IndexMap<Box<str>, SubjectRecords>,
}

fn live(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
	expires_at.is_none_or(|at| at > now)
}

/// Global records always apply; world-bound records only within their world.
fn world_matches(record_world: Option<&str>, query_world: Option<&str>) -> bool {
	match record_world {
		None => true,
		Some(w) => query_world == Some(w),
	}
}

fn expiry(duration: Option<Duration>) -> Option<DateTime<Utc>> {
	duration
		.and_then(|d| chrono::Duration::from_std(d).ok())
		.map(|d| Utc::now() + d)
}

impl SubjectRecords {
	/// Own live records in insertion order, filtered by world.
	fn own_map(&self, world: Option<&str>, now: DateTime<Utc>) -> PermissionMap {
		let mut map = PermissionMap::new();
		for record in &self.records {
			if live(record.expires_at, now) && world_matches(record.world.as_deref(), world) {
				map.entry(record.key.clone()).or_insert(record.value);
			}
		}
		map
	}

	fn live_groups(&self, world: Option<&str>, now: DateTime<Utc>) -> Vec<Box<str>> {
		self.memberships
			.iter()
			.filter(|m| live(m.expires_at, now) && world_matches(m.world.as_deref(), world))
			.map(|m| m.group.clone())
			.collect()
	}

	fn upsert_record(
		&mut self,
		key: &str,
		value: bool,
		world: Option<&str>,
		expires_at: Option<DateTime<Utc>>,
	) {
		self.records.retain(|r| !(r.key.as_ref() == key && r.world.as_deref() == world));
		self.records.push(PermRecord {
			key: key.into(),
			value,
			world: world.map(Into::into),
			expires_at,
		});
	}

	fn remove_record(&mut self, key: &str, world: Option<&str>) {
		self.records.retain(|r| !(r.key.as_ref() == key && r.world.as_deref() == world));
	}
}

impl State {
	/// Merges a group's records into `map`, then its parent groups, depth
	/// first. Earlier insertions win; `visited` breaks membership cycles.
	fn merge_group(
		&self,
		group: &str,
		world: Option<&str>,
		now: DateTime<Utc>,
		map: &mut PermissionMap,
		visited: &mut HashSet<Box<str>>,
	) {
		if !visited.insert(group.into()) {
			return;
		}
		let Some(subject) = self.groups.get(group) else {
			return;
		};
		for (key, value) in subject.own_map(world, now) {
			map.entry(key).or_insert(value);
		}
		for parent in subject.live_groups(world, now) {
			self.merge_group(&parent, world, now, map, visited);
		}
	}

	/// Effective record set for a user: own records first, then each group's
	/// records in membership order, recursively.
	fn user_map(&self, uuid: Uuid, world: Option<&str>, now: DateTime<Utc>) -> PermissionMap {
		let mut map = PermissionMap::new();
		let mut visited = HashSet::new();
		if let Some(subject) = self.users.get(&uuid) {
			map = subject.own_map(world, now);
			for group in subject.live_groups(world, now) {
				self.merge_group(&group, world, now, &mut map, &mut visited);
			}
		}
		map
	}

	fn group_map(&self, group: &str, world: Option<&str>, now: DateTime<Utc>) -> PermissionMap {
		let mut map = PermissionMap::new();
		let mut visited = HashSet::new();
		self.merge_group(group, world, now, &mut map, &mut visited);
		map
	}

	fn user_own_map(&self, uuid: Uuid, world: Option<&str>, now: DateTime<Utc>) -> PermissionMap {
		self.users.get(&uuid).map(|s| s.own_map(world, now)).unwrap_or_default()
	}

	fn group_own_map(&self, group: &str, world: Option<&str>, now: DateTime<Utc>) -> PermissionMap {
		self.groups.get(group).map(|s| s.own_map(world, now)).unwrap_or_default()
	}
}

/// Process-local permission backend.
#[derive(Debug)]
pub struct MemoryProvider {
	name: Box<str>,
	identifier: Box<str>,
	priority: Priority,
	state: RwLock<State>,
}

impl Default for MemoryProvider {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryProvider {
	pub fn new() -> Self {
		Self {
			name: "Memory".into(),
			identifier: "memory".into(),
			priority: Priority::Optional,
			state: RwLock::new(State::default()),
		}
	}

	pub fn with_identifier(mut self, identifier: impl Into<Box<str>>) -> Self {
		self.identifier = identifier.into();
		self
	}

	pub fn with_priority(mut self, priority: Priority) -> Self {
		self.priority = priority;
		self
	}

	/// Upserts a record on a group. `Default` deletes, like the user-level
	/// [`set`](PermissionProvider::set).
	pub fn set_group_permission(
		&self,
		group: &str,
		world: Option<&str>,
		permission: &str,
		value: PermissionValue,
		duration: Option<Duration>,
	) -> PermResult<()> {
		if !resolve::is_valid_key(permission) {
			return Err(Error::InvalidKey(permission.into()));
		}
		let mut state = self.state.write();
		let subject = state.groups.entry(group.into()).or_default();
		match value {
			PermissionValue::Default => subject.remove_record(permission, world),
			PermissionValue::Allow => {
				subject.upsert_record(permission, true, world, expiry(duration));
			}
			PermissionValue::Deny => {
				subject.upsert_record(permission, false, world, expiry(duration));
			}
		}
		Ok(())
	}

	/// Makes `child` inherit from `parent`.
	pub fn add_group_parent(&self, child: &str, parent: &str) {
		let mut state = self.state.write();
		let subject = state.groups.entry(child.into()).or_default();
		if !subject.memberships.iter().any(|m| m.group.as_ref() == parent && m.world.is_none()) {
			subject.memberships.push(Membership {
				group: parent.into(),
				world: None,
				expires_at: None,
			});
		}
	}

	pub fn remove_group_parent(&self, child: &str, parent: &str) {
		let mut state = self.state.write();
		if let Some(subject) = state.groups.get_mut(child) {
			subject.memberships.retain(|m| m.group.as_ref() != parent);
		}
	}
}

#[async_trait]
impl PermissionProvider for MemoryProvider {
	fn name(&self) -> &str {
		&self.name
	}

	fn identifier(&self) -> &str {
		&self.identifier
	}

	fn priority(&self) -> Priority {
		self.priority
	}

	fn capabilities(&self) -> Capabilities {
		Capabilities {
			groups: true,
			timed_permissions: true,
			timed_groups: true,
			per_world_permissions: true,
			per_world_groups: true,
			offline_checks: true,
			dynamic_changes: true,
		}
	}

	async fn check(&self, user: &UserContext, permission: &str) -> PermResult<PermissionValue> {
		let map = self.state.read().user_map(user.actor.uuid(), user.world(), Utc::now());
		Ok(resolve::check(&map, permission))
	}

	async fn list(
		&self,
		user: &UserContext,
		parent: Option<&str>,
		world: Option<&str>,
		filter: PermissionValue,
	) -> PermResult<Vec<Box<str>>> {
		let map = self.state.read().user_map(user.actor.uuid(), world, Utc::now());
		Ok(listed(&map, parent, filter))
	}

	async fn list_non_inherited(
		&self,
		user: &UserContext,
		parent: Option<&str>,
		world: Option<&str>,
		filter: PermissionValue,
	) -> PermResult<Vec<Box<str>>> {
		let map = self.state.read().user_own_map(user.actor.uuid(), world, Utc::now());
		Ok(listed(&map, parent, filter))
	}

	async fn get_all(
		&self,
		user: &UserContext,
		parent: Option<&str>,
		world: Option<&str>,
	) -> PermResult<IndexMap<Box<str>, PermissionValue>> {
		let map = self.state.read().user_map(user.actor.uuid(), world, Utc::now());
		Ok(mapped(&map, parent))
	}

	async fn get_all_non_inherited(
		&self,
		user: &UserContext,
		parent: Option<&str>,
		world: Option<&str>,
	) -> PermResult<IndexMap<Box<str>, PermissionValue>> {
		let map = self.state.read().user_own_map(user.actor.uuid(), world, Utc::now());
		Ok(mapped(&map, parent))
	}

	async fn set(
		&self,
		user: &UserContext,
		world: Option<&str>,
		permission: &str,
		value: PermissionValue,
		duration: Option<Duration>,
	) -> PermResult<()> {
		if !user.actor.supports_persistence() {
			debug!(permission = permission, "console owns no records, ignoring set");
			return Ok(());
		}
		if !resolve::is_valid_key(permission) {
			return Err(Error::InvalidKey(permission.into()));
		}

		let mut state = self.state.write();
		let subject = state.users.entry(user.actor.uuid()).or_default();
		match value {
			PermissionValue::Default => subject.remove_record(permission, world),
			PermissionValue::Allow => {
				subject.upsert_record(permission, true, world, expiry(duration));
			}
			PermissionValue::Deny => {
				subject.upsert_record(permission, false, world, expiry(duration));
			}
		}
		Ok(())
	}

	async fn get_groups(
		&self,
		user: &UserContext,
		world: Option<&str>,
	) -> PermResult<Vec<Box<str>>> {
		let state = self.state.read();
		Ok(state
			.users
			.get(&user.actor.uuid())
			.map(|s| s.live_groups(world, Utc::now()))
			.unwrap_or_default())
	}

	async fn add_group(
		&self,
		user: &UserContext,
		world: Option<&str>,
		group: &str,
		duration: Option<Duration>,
	) -> PermResult<()> {
		if !user.actor.supports_persistence() {
			debug!(group = group, "console owns no records, ignoring add_group");
			return Ok(());
		}

		let mut state = self.state.write();
		let subject = state.users.entry(user.actor.uuid()).or_default();
		subject.memberships.retain(|m| {
			!(m.group.as_ref() == group && m.world.as_deref() == world)
		});
		subject.memberships.push(Membership {
			group: group.into(),
			world: world.map(Into::into),
			expires_at: expiry(duration),
		});
		Ok(())
	}

	async fn remove_group(
		&self,
		user: &UserContext,
		world: Option<&str>,
		group: &str,
	) -> PermResult<()> {
		let mut state = self.state.write();
		if let Some(subject) = state.users.get_mut(&user.actor.uuid()) {
			subject.memberships.retain(|m| {
				!(m.group.as_ref() == group && m.world.as_deref() == world)
			});
		}
		Ok(())
	}

	async fn check_group(
		&self,
		group: &str,
		world: Option<&str>,
		permission: &str,
	) -> PermResult<PermissionValue> {
		let map = self.state.read().group_map(group, world, Utc::now());
		Ok(resolve::check(&map, permission))
	}

	async fn list_group(
		&self,
		group: &str,
		parent: Option<&str>,
		world: Option<&str>,
		filter: PermissionValue,
	) -> PermResult<Vec<Box<str>>> {
		let map = self.state.read().group_map(group, world, Utc::now());
		Ok(listed(&map, parent, filter))
	}

	async fn list_group_non_inherited(
		&self,
		group: &str,
		parent: Option<&str>,
		world: Option<&str>,
		filter: PermissionValue,
	) -> PermResult<Vec<Box<str>>> {
		let map = self.state.read().group_own_map(group, world, Utc::now());
		Ok(listed(&map, parent, filter))
	}

	async fn get_all_group(
		&self,
		group: &str,
		parent: Option<&str>,
		world: Option<&str>,
	) -> PermResult<IndexMap<Box<str>, PermissionValue>> {
		let map = self.state.read().group_map(group, world, Utc::now());
		Ok(mapped(&map, parent))
	}

	async fn get_all_group_non_inherited(
		&self,
		group: &str,
		parent: Option<&str>,
		world: Option<&str>,
	) -> PermResult<IndexMap<Box<str>, PermissionValue>> {
		let map = self.state.read().group_own_map(group, world, Utc::now());
		Ok(mapped(&map, parent))
	}
}

fn listed(map: &PermissionMap, parent: Option<&str>, filter: PermissionValue) -> Vec<Box<str>> {
	match parent {
		Some(parent) => resolve::list_children(map, parent, filter),
		None => resolve::list(map, filter),
	}
}

fn mapped(map: &PermissionMap, parent: Option<&str>) -> IndexMap<Box<str>, PermissionValue> {
	match parent {
		Some(parent) => resolve::get_all_children(map, parent),
		None => resolve::get_all(map),
	}
}

// vim: ts=4
