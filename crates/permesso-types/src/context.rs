//! Actor context consumed by permission providers.
//!
//! The host translates whoever is asking (a connected player, a generic
//! entity, an offline identity looked up by UUID, or the console) into an
//! [`Actor`] plus operator level and optional world scope. Providers never
//! construct these themselves.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Debug;
use uuid::Uuid;

/// Display name of the console actor.
pub const CONSOLE_NAME: &str = "Console";

/// The subject on whose behalf a permission operation runs.
///
/// One tagged variant per context class; capability differences are exposed
/// through explicit accessors instead of nullable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
	/// A connected, authenticated player
	Player { uuid: Uuid, name: Box<str> },
	/// A non-player entity with a stable id
	Entity { uuid: Uuid, name: Box<str> },
	/// A known identity that is not currently connected
	Offline { uuid: Uuid, name: Box<str> },
	/// The server console
	Console,
}

impl Actor {
	/// Stable identity; the console uses the nil UUID.
	pub fn uuid(&self) -> Uuid {
		match self {
			Actor::Player { uuid, .. } | Actor::Entity { uuid, .. } | Actor::Offline { uuid, .. } => {
				*uuid
			}
			Actor::Console => Uuid::nil(),
		}
	}

	pub fn name(&self) -> &str {
		match self {
			Actor::Player { name, .. } | Actor::Entity { name, .. } | Actor::Offline { name, .. } => {
				name
			}
			Actor::Console => CONSOLE_NAME,
		}
	}

	pub fn is_console(&self) -> bool {
		matches!(self, Actor::Console)
	}

	/// True for actors currently present in a world.
	pub fn is_online(&self) -> bool {
		matches!(self, Actor::Player { .. } | Actor::Entity { .. })
	}

	/// Whether records may be attached to this actor at all. The console is
	/// anonymous and never owns records.
	pub fn supports_persistence(&self) -> bool {
		!self.is_console()
	}
}

/// Everything a provider needs to know about the caller: identity, operator
/// level, and the world the operation is scoped to (`None` = global only).
#[derive(Debug, Clone)]
pub struct UserContext {
	pub actor: Actor,
	pub operator_level: u8,
	pub world: Option<Box<str>>,
}

impl UserContext {
	pub fn new(actor: Actor, operator_level: u8) -> Self {
		Self { actor, operator_level, world: None }
	}

	pub fn with_world(mut self, world: impl Into<Box<str>>) -> Self {
		self.world = Some(world.into());
		self
	}

	/// Console context: nil identity, full operator level, global scope.
	pub fn console() -> Self {
		Self { actor: Actor::Console, operator_level: 4, world: None }
	}

	pub fn world(&self) -> Option<&str> {
		self.world.as_deref()
	}
}

/// Host-side tracking of operator levels.
///
/// The vanilla provider mutates operator levels through this seam when an
/// `operator-level-N` pseudo-group is added or removed; the host decides how
/// the level is actually stored.
pub trait OperatorLedger: Debug + Send + Sync {
	/// Current tracked level for the actor, 0 if untracked.
	fn level(&self, actor: &Actor) -> u8;

	/// Track the actor at the given level.
	fn grant(&self, actor: &Actor, level: u8);

	/// Stop tracking the actor, but only if it is tracked at exactly `level`.
	fn revoke_if(&self, actor: &Actor, level: u8);
}

/// In-memory ledger for standalone use and tests.
#[derive(Debug, Default)]
pub struct MemoryOperatorLedger {
	levels: RwLock<HashMap<Uuid, u8>>,
}

impl MemoryOperatorLedger {
	pub fn new() -> Self {
		Self::default()
	}
}

impl OperatorLedger for MemoryOperatorLedger {
	fn level(&self, actor: &Actor) -> u8 {
		self.levels.read().get(&actor.uuid()).copied().unwrap_or(0)
	}

	fn grant(&self, actor: &Actor, level: u8) {
		self.levels.write().insert(actor.uuid(), level);
	}

	fn revoke_if(&self, actor: &Actor, level: u8) {
		let mut levels = self.levels.write();
		if levels.get(&actor.uuid()) == Some(&level) {
			levels.remove(&actor.uuid());
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn console_capabilities() {
		let console = Actor::Console;
		assert!(console.is_console());
		assert!(!console.is_online());
		assert!(!console.supports_persistence());
		assert_eq!(console.uuid(), Uuid::nil());
		assert_eq!(console.name(), CONSOLE_NAME);
	}

	#[test]
	fn player_capabilities() {
		let player = Actor::Player { uuid: Uuid::new_v4(), name: "alice".into() };
		assert!(player.is_online());
		assert!(player.supports_persistence());
	}

	#[test]
	fn ledger_revoke_only_matching_level() {
		let ledger = MemoryOperatorLedger::new();
		let actor = Actor::Player { uuid: Uuid::new_v4(), name: "bob".into() };

		ledger.grant(&actor, 3);
		assert_eq!(ledger.level(&actor), 3);

		ledger.revoke_if(&actor, 2);
		assert_eq!(ledger.level(&actor), 3);

		ledger.revoke_if(&actor, 3);
		assert_eq!(ledger.level(&actor), 0);
	}

	#[test]
	fn world_scope() {
		let ctx = UserContext::new(
			Actor::Offline { uuid: Uuid::new_v4(), name: "carol".into() },
			0,
		)
		.with_world("nether");
		assert_eq!(ctx.world(), Some("nether"));
		assert_eq!(UserContext::console().world(), None);
	}
}

// vim: ts=4
