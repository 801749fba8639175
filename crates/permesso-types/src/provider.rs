//! The provider contract every permission backend implements.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

use crate::context::UserContext;
use crate::prelude::*;

/// Self-declared eligibility class used to break selection ties.
///
/// `Main` providers are dedicated permission systems and win over everything,
/// `Optional` ones bundle permissions as a side feature, `Fallback` is
/// reserved for the built-in provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
	#[serde(rename = "main")]
	Main,
	#[serde(rename = "optional")]
	Optional,
	#[serde(rename = "fallback")]
	Fallback,
}

/// Capability flags negotiated up front; callers must not invoke operations
/// a provider does not claim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
	pub groups: bool,
	pub timed_permissions: bool,
	pub timed_groups: bool,
	pub per_world_permissions: bool,
	pub per_world_groups: bool,
	pub offline_checks: bool,
	pub dynamic_changes: bool,
}

/// A pluggable permission backend.
///
/// Read operations must be side-effect-free and may be called concurrently.
/// `world` parameters widen the lookup to global plus that world's records;
/// `None` means global only. [`check`](Self::check) takes its world scope
/// from the context. List and map results are ordered most-to-least
/// significant: the subject's own records first, then each group's records
/// in group-priority order, recursively. `*_non_inherited` variants restrict
/// to records owned directly by the subject.
///
/// Operations outside a provider's declared capabilities have default
/// implementations that answer `Unsupported` (or the neutral value); a
/// backend only implements what it claims.
#[async_trait]
pub trait PermissionProvider: Debug + Send + Sync {
	/// Human-readable name ("LuckPerms")
	fn name(&self) -> &str;

	/// Stable identifier used for persisted selection ("luckperms")
	fn identifier(&self) -> &str;

	fn priority(&self) -> Priority;

	fn capabilities(&self) -> Capabilities;

	/// Resolves one permission for the subject.
	///
	/// A key ending in `.*` is a wildcard query aggregated over the children
	/// of the stripped base; anything else is an exact query generalized
	/// through ancestor wildcards on a miss.
	async fn check(&self, user: &UserContext, permission: &str) -> PermResult<PermissionValue>;

	/// Keys matching the value filter, optionally restricted to children of
	/// `parent` (parent prefix stripped from the results).
	async fn list(
		&self,
		user: &UserContext,
		parent: Option<&str>,
		world: Option<&str>,
		filter: PermissionValue,
	) -> PermResult<Vec<Box<str>>>;

	async fn list_non_inherited(
		&self,
		user: &UserContext,
		parent: Option<&str>,
		world: Option<&str>,
		filter: PermissionValue,
	) -> PermResult<Vec<Box<str>>>;

	async fn get_all(
		&self,
		user: &UserContext,
		parent: Option<&str>,
		world: Option<&str>,
	) -> PermResult<IndexMap<Box<str>, PermissionValue>>;

	async fn get_all_non_inherited(
		&self,
		user: &UserContext,
		parent: Option<&str>,
		world: Option<&str>,
	) -> PermResult<IndexMap<Box<str>, PermissionValue>>;

	/// Idempotent upsert; `PermissionValue::Default` deletes the record,
	/// `duration` bounds its lifetime (`None` = permanent).
	async fn set(
		&self,
		_user: &UserContext,
		_world: Option<&str>,
		_permission: &str,
		_value: PermissionValue,
		_duration: Option<Duration>,
	) -> PermResult<()> {
		Err(Error::Unsupported("set"))
	}

	/// Groups the subject belongs to, most to least significant.
	async fn get_groups(
		&self,
		_user: &UserContext,
		_world: Option<&str>,
	) -> PermResult<Vec<Box<str>>> {
		Ok(Vec::new())
	}

	async fn add_group(
		&self,
		_user: &UserContext,
		_world: Option<&str>,
		_group: &str,
		_duration: Option<Duration>,
	) -> PermResult<()> {
		Err(Error::Unsupported("add_group"))
	}

	async fn remove_group(
		&self,
		_user: &UserContext,
		_world: Option<&str>,
		_group: &str,
	) -> PermResult<()> {
		Err(Error::Unsupported("remove_group"))
	}

	async fn check_group(
		&self,
		_group: &str,
		_world: Option<&str>,
		_permission: &str,
	) -> PermResult<PermissionValue> {
		Ok(PermissionValue::Default)
	}

	async fn list_group(
		&self,
		_group: &str,
		_parent: Option<&str>,
		_world: Option<&str>,
		_filter: PermissionValue,
	) -> PermResult<Vec<Box<str>>> {
		Ok(Vec::new())
	}

	async fn list_group_non_inherited(
		&self,
		_group: &str,
		_parent: Option<&str>,
		_world: Option<&str>,
		_filter: PermissionValue,
	) -> PermResult<Vec<Box<str>>> {
		Ok(Vec::new())
	}

	async fn get_all_group(
		&self,
		_group: &str,
		_parent: Option<&str>,
		_world: Option<&str>,
	) -> PermResult<IndexMap<Box<str>, PermissionValue>> {
		Ok(IndexMap::new())
	}

	async fn get_all_group_non_inherited(
		&self,
		_group: &str,
		_parent: Option<&str>,
		_world: Option<&str>,
	) -> PermResult<IndexMap<Box<str>, PermissionValue>> {
		Ok(IndexMap::new())
	}
}

/// Checks a permission, collapsing errors and `Default` to the supplied
/// boolean. This is the never-throw boundary for callers gating features.
pub async fn check_or(
	provider: &dyn PermissionProvider,
	user: &UserContext,
	permission: &str,
	default: bool,
) -> bool {
	match provider.check(user, permission).await {
		Ok(value) => value.allow(default),
		Err(e) => {
			debug!(permission = permission, error = %e, "check failed, using default");
			default
		}
	}
}

/// Fire-and-forget upsert; a provider-side error is logged and swallowed.
pub async fn set_silently(
	provider: &dyn PermissionProvider,
	user: &UserContext,
	world: Option<&str>,
	permission: &str,
	value: PermissionValue,
	duration: Option<Duration>,
) {
	if let Err(e) = provider.set(user, world, permission, value, duration).await {
		warn!(permission = permission, error = %e, "set failed");
	}
}

/// Fire-and-forget group grant.
pub async fn add_group_silently(
	provider: &dyn PermissionProvider,
	user: &UserContext,
	world: Option<&str>,
	group: &str,
	duration: Option<Duration>,
) {
	if let Err(e) = provider.add_group(user, world, group, duration).await {
		warn!(group = group, error = %e, "add_group failed");
	}
}

/// Fire-and-forget group removal.
pub async fn remove_group_silently(
	provider: &dyn PermissionProvider,
	user: &UserContext,
	world: Option<&str>,
	group: &str,
) {
	if let Err(e) = provider.remove_group(user, world, group).await {
		warn!(group = group, error = %e, "remove_group failed");
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::Actor;
	use uuid::Uuid;

	#[derive(Debug)]
	struct FailingProvider;

	#[async_trait]
	impl PermissionProvider for FailingProvider {
		fn name(&self) -> &str {
			"Failing"
		}

		fn identifier(&self) -> &str {
			"failing"
		}

		fn priority(&self) -> Priority {
			Priority::Optional
		}

		fn capabilities(&self) -> Capabilities {
			Capabilities::default()
		}

		async fn check(
			&self,
			_user: &UserContext,
			_permission: &str,
		) -> PermResult<PermissionValue> {
			Err(Error::ProviderUnavailable("backend offline".into()))
		}

		async fn list(
			&self,
			_user: &UserContext,
			_parent: Option<&str>,
			_world: Option<&str>,
			_filter: PermissionValue,
		) -> PermResult<Vec<Box<str>>> {
			Err(Error::ProviderUnavailable("backend offline".into()))
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
		) -> PermResult<IndexMap<Box<str>, PermissionValue>> {
			Ok(IndexMap::new())
		}

		async fn get_all_non_inherited(
			&self,
			_user: &UserContext,
			_parent: Option<&str>,
			_world: Option<&str>,
		) -> PermResult<IndexMap<Box<str>, PermissionValue>> {
			Ok(IndexMap::new())
		}
	}

	fn user() -> UserContext {
		UserContext::new(Actor::Player { uuid: Uuid::new_v4(), name: "alice".into() }, 0)
	}

	#[tokio::test]
	async fn check_or_falls_back_on_error() {
		let provider = FailingProvider;
		assert!(check_or(&provider, &user(), "home.teleport", true).await);
		assert!(!check_or(&provider, &user(), "home.teleport", false).await);
	}

	#[tokio::test]
	async fn unsupported_defaults() {
		let provider = FailingProvider;
		let u = user();
		assert!(matches!(
			provider.set(&u, None, "a.b", PermissionValue::Allow, None).await,
			Err(Error::Unsupported("set"))
		));
		assert!(provider.get_groups(&u, None).await.unwrap().is_empty());
		assert_eq!(
			provider.check_group("vip", None, "a.b").await.unwrap(),
			PermissionValue::Default
		);
	}
}

// vim: ts=4
