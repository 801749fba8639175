//! Tri-state permission value and its algebra.

use serde::{Deserialize, Serialize};

/// Result of a permission lookup.
///
/// `Default` means the subject has no record for the key; whether that grants
/// access is decided by the caller through [`PermissionValue::allow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionValue {
	/// No record exists for the key
	#[serde(rename = "default")]
	Default,
	/// The permission is granted
	#[serde(rename = "allow")]
	Allow,
	/// The permission is explicitly negated
	#[serde(rename = "deny")]
	Deny,
}

impl PermissionValue {
	/// Collapse to a boolean, falling back to `default_if_unset` for `Default`.
	pub fn allow(self, default_if_unset: bool) -> bool {
		match self {
			PermissionValue::Allow => true,
			PermissionValue::Deny => false,
			PermissionValue::Default => default_if_unset,
		}
	}

	/// Filter predicate used when enumerating stored records.
	///
	/// `Allow` passes only true entries, `Deny` only false ones, `Default`
	/// passes everything.
	pub fn pass(self, candidate: bool) -> bool {
		match self {
			PermissionValue::Allow => candidate,
			PermissionValue::Deny => !candidate,
			PermissionValue::Default => true,
		}
	}

	pub fn of(value: bool) -> Self {
		if value { PermissionValue::Allow } else { PermissionValue::Deny }
	}

	/// Map an optional stored boolean; `None` means the key is unset.
	pub fn of_opt(value: Option<bool>) -> Self {
		match value {
			Some(v) => PermissionValue::of(v),
			None => PermissionValue::Default,
		}
	}
}

impl Default for PermissionValue {
	fn default() -> Self {
		PermissionValue::Default
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn allow_truth_table() {
		assert!(PermissionValue::Allow.allow(false));
		assert!(PermissionValue::Allow.allow(true));
		assert!(!PermissionValue::Deny.allow(true));
		assert!(!PermissionValue::Deny.allow(false));
		assert!(PermissionValue::Default.allow(true));
		assert!(!PermissionValue::Default.allow(false));
	}

	#[test]
	fn pass_filters_by_polarity() {
		assert!(PermissionValue::Allow.pass(true));
		assert!(!PermissionValue::Allow.pass(false));
		assert!(PermissionValue::Deny.pass(false));
		assert!(!PermissionValue::Deny.pass(true));
		assert!(PermissionValue::Default.pass(true));
		assert!(PermissionValue::Default.pass(false));
	}

	#[test]
	fn of_round_trip() {
		assert_eq!(PermissionValue::of(true), PermissionValue::Allow);
		assert_eq!(PermissionValue::of(false), PermissionValue::Deny);
		assert_eq!(PermissionValue::of_opt(None), PermissionValue::Default);
		assert_eq!(PermissionValue::of_opt(Some(true)), PermissionValue::Allow);
	}
}

// vim: ts=4
