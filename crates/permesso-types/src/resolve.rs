//! Wildcard / hierarchical key resolution over a flat record set.
//!
//! Permission keys are dot-delimited ("home.teleport"). A record set is an
//! ordered `key -> bool` map; insertion order is the significance order, so
//! resolution is deterministic for a fixed set. Two query modes exist:
//!
//! - wildcard queries end in `.*` and aggregate over the children of the
//!   stripped base key,
//! - exact queries look the key up directly and, on a miss, generalize by
//!   walking ancestor wildcards from the most specific one down to the top
//!   level (`a.b.c` misses -> try `a.b.*`, then `a.*`).
//!
//! Only `.*` is recognized as a wildcard suffix. `*` and `?` are reserved
//! query markers and must never appear in stored keys.

use indexmap::IndexMap;

use crate::value::PermissionValue;

/// Suffix marking a wildcard query.
pub const WILDCARD_SUFFIX: &str = ".*";

/// Ordered flat record set a provider resolves against.
pub type PermissionMap = IndexMap<Box<str>, bool>;

/// Validates a key for storage: non-empty segments, no reserved markers.
pub fn is_valid_key(key: &str) -> bool {
	!key.is_empty()
		&& key.split('.').all(|segment| {
			!segment.is_empty() && !segment.contains('*') && !segment.contains('?')
		})
}

/// Resolves a single permission against the record set.
///
/// Handles both query modes; see the module docs for the semantics.
pub fn check(map: &PermissionMap, permission: &str) -> PermissionValue {
	if let Some(base) = permission.strip_suffix(WILDCARD_SUFFIX) {
		check_children(map, base)
	} else {
		check_exact(map, permission)
	}
}

/// Aggregates over the children of `parent`: Allow if any child is true,
/// else Deny if any child is false, else Default.
pub fn check_children(map: &PermissionMap, parent: &str) -> PermissionValue {
	let prefix = format!("{}.", parent);
	let mut negated = false;

	for (key, value) in map {
		if key.starts_with(&prefix) && key.len() > prefix.len() {
			if *value {
				return PermissionValue::Allow;
			}
			negated = true;
		}
	}

	if negated { PermissionValue::Deny } else { PermissionValue::Default }
}

/// Exact lookup with ancestor-wildcard generalization.
///
/// Terminates within `segments(permission)` steps and never backtracks into
/// children.
pub fn check_exact(map: &PermissionMap, permission: &str) -> PermissionValue {
	if let Some(value) = map.get(permission) {
		return PermissionValue::of(*value);
	}

	let segments: Vec<&str> = permission.split('.').collect();
	for length in (1..segments.len()).rev() {
		let key = format!("{}.*", segments[..length].join("."));
		if let Some(value) = map.get(key.as_str()) {
			return PermissionValue::of(*value);
		}
	}

	PermissionValue::Default
}

/// Lists keys matching the value filter, in record-set order.
pub fn list(map: &PermissionMap, filter: PermissionValue) -> Vec<Box<str>> {
	map.iter()
		.filter(|(_, value)| filter.pass(**value))
		.map(|(key, _)| key.clone())
		.collect()
}

/// Lists children of `parent` matching the value filter, parent prefix
/// stripped, empty remainders skipped.
pub fn list_children(map: &PermissionMap, parent: &str, filter: PermissionValue) -> Vec<Box<str>> {
	let prefix = format!("{}.", parent);
	let mut out = Vec::new();

	for (key, value) in map {
		if key.starts_with(&prefix) && filter.pass(*value) {
			let child = &key[prefix.len()..];
			if !child.is_empty() {
				out.push(child.into());
			}
		}
	}

	out
}

/// All records as a key -> value mapping, in record-set order.
pub fn get_all(map: &PermissionMap) -> IndexMap<Box<str>, PermissionValue> {
	map.iter().map(|(key, value)| (key.clone(), PermissionValue::of(*value))).collect()
}

/// Children of `parent` as a mapping, parent prefix stripped.
pub fn get_all_children(map: &PermissionMap, parent: &str) -> IndexMap<Box<str>, PermissionValue> {
	let prefix = format!("{}.", parent);
	let mut out = IndexMap::new();

	for (key, value) in map {
		if key.starts_with(&prefix) && key.len() > prefix.len() {
			out.insert(key[prefix.len()..].into(), PermissionValue::of(*value));
		}
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	fn map(entries: &[(&str, bool)]) -> PermissionMap {
		entries.iter().map(|(k, v)| ((*k).into(), *v)).collect()
	}

	#[test]
	fn exact_hit() {
		let m = map(&[("home.teleport", true), ("home.set", false)]);
		assert_eq!(check(&m, "home.teleport"), PermissionValue::Allow);
		assert_eq!(check(&m, "home.set"), PermissionValue::Deny);
		assert_eq!(check(&m, "home.list"), PermissionValue::Default);
	}

	#[test]
	fn ancestor_wildcard_walk() {
		let m = map(&[("a.*", true)]);
		assert_eq!(check(&m, "a.b.c"), PermissionValue::Allow);

		// most specific ancestor wins
		let m = map(&[("a.*", true), ("a.b.*", false)]);
		assert_eq!(check(&m, "a.b.c"), PermissionValue::Deny);
		assert_eq!(check(&m, "a.x"), PermissionValue::Allow);
	}

	#[test]
	fn wildcard_does_not_match_itself() {
		// the walk starts at segments-1, never at the full key
		let m = map(&[("a.b.*", true)]);
		assert_eq!(check_exact(&m, "a.b"), PermissionValue::Default);
	}

	#[test]
	fn wildcard_query_aggregation() {
		let m = map(&[("a.b.c", true), ("a.b.d", false)]);
		assert_eq!(check(&m, "a.b.*"), PermissionValue::Allow);

		let m = map(&[("a.b.c", false)]);
		assert_eq!(check(&m, "a.b.*"), PermissionValue::Deny);

		let m = map(&[]);
		assert_eq!(check(&m, "a.b.*"), PermissionValue::Default);
	}

	#[test]
	fn children_strip_prefix_and_filter() {
		let m = map(&[("home.2", false), ("home.4", true), ("home.6", true), ("spawn", true)]);
		assert_eq!(list_children(&m, "home", PermissionValue::Allow), vec![
			Box::from("4"),
			Box::from("6")
		]);
		assert_eq!(list_children(&m, "home", PermissionValue::Deny), vec![Box::from("2")]);
		assert_eq!(list_children(&m, "home", PermissionValue::Default).len(), 3);
	}

	#[test]
	fn stored_key_validation() {
		assert!(is_valid_key("home.teleport"));
		assert!(is_valid_key("spawn"));
		assert!(!is_valid_key(""));
		assert!(!is_valid_key("home."));
		assert!(!is_valid_key(".home"));
		assert!(!is_valid_key("home.*"));
		assert!(!is_valid_key("home.?"));
	}

	#[test]
	fn get_all_preserves_order() {
		let m = map(&[("b", true), ("a", false)]);
		let all = get_all(&m);
		let keys: Vec<&str> = all.keys().map(AsRef::as_ref).collect();
		assert_eq!(keys, vec!["b", "a"]);
	}
}

// vim: ts=4
