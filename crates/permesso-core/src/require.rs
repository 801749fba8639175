//! Reusable permission gates for command and feature wiring.
//!
//! Hosts build a predicate once at registration time and evaluate it per
//! invocation. Predicates never fail: an unavailable service or a provider
//! error collapses to the supplied default.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::prelude::*;
use crate::registry::PermissionService;

/// Async gate over a caller context.
pub type PermissionPredicate =
	Box<dyn for<'a> Fn(&'a UserContext) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> + Send + Sync>;

/// Gate on a permission, answering `default` when the value is unset or the
/// check cannot be performed.
pub fn require(
	service: Arc<PermissionService>,
	permission: impl Into<Box<str>>,
	default: bool,
) -> PermissionPredicate {
	let permission = permission.into();
	Box::new(move |user| {
		let service = service.clone();
		let permission = permission.clone();
		Box::pin(async move {
			let Some(provider) = service.active() else {
				debug!(permission = %permission, "no active provider, using default");
				return default;
			};
			permesso_types::provider::check_or(provider.as_ref(), user, &permission, default).await
		})
	})
}

/// Gate on a permission with an operator-level fallback: an unset value
/// admits callers at or above `fallback_level`.
pub fn require_level(
	service: Arc<PermissionService>,
	permission: impl Into<Box<str>>,
	fallback_level: u8,
) -> PermissionPredicate {
	let permission = permission.into();
	Box::new(move |user| {
		let service = service.clone();
		let permission = permission.clone();
		Box::pin(async move {
			let default = user.operator_level >= fallback_level;
			let Some(provider) = service.active() else {
				debug!(permission = %permission, "no active provider, using operator level");
				return default;
			};
			permesso_types::provider::check_or(provider.as_ref(), user, &permission, default).await
		})
	})
}


// vim: ts=4
