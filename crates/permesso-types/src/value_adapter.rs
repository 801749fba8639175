//! Typed-value extraction from `key.value`-encoded permission children.
//!
//! Ranked settings are stored as Allow-valued children of a prefix
//! ("home.3", "home.5"); an adapter parses each child into a typed value and
//! the highest one wins. Parse failures are discarded, never surfaced.

use std::cmp::Ordering;
use std::time::Duration;

use crate::context::UserContext;
use crate::prelude::*;
use crate::provider::PermissionProvider;

/// Parses and orders the values encoded in permission children.
///
/// Both functions are pure; `parse` returns `None` for anything it cannot
/// interpret and `compare` is a total order ("greater" = wins).
pub trait ValueAdapter<V> {
	fn parse(&self, raw: &str) -> Option<V>;
	fn compare(&self, a: &V, b: &V) -> Ordering;
}

/// `i64` values in natural order.
#[derive(Debug, Clone, Copy)]
pub struct IntegerAdapter;

impl ValueAdapter<i64> for IntegerAdapter {
	fn parse(&self, raw: &str) -> Option<i64> {
		raw.parse().ok()
	}

	fn compare(&self, a: &i64, b: &i64) -> Ordering {
		a.cmp(b)
	}
}

/// `f64` values in natural order (NaN never parses).
#[derive(Debug, Clone, Copy)]
pub struct FloatAdapter;

impl ValueAdapter<f64> for FloatAdapter {
	fn parse(&self, raw: &str) -> Option<f64> {
		raw.parse().ok().filter(|v: &f64| !v.is_nan())
	}

	fn compare(&self, a: &f64, b: &f64) -> Ordering {
		a.total_cmp(b)
	}
}

/// Durations, either a bare integer (seconds) or concatenated
/// magnitude+unit tokens summed up ("1d12h" = 129600s).
///
/// Units: `c` = 100 years, `y` = year, `mo` = 30 days, `d` = day, `h` = hour,
/// `m` = minute, no unit = seconds. Magnitudes may be fractional.
#[derive(Debug, Clone, Copy)]
pub struct DurationAdapter;

const SECONDS_PER_YEAR: f64 = 31_556_926.0;

impl ValueAdapter<Duration> for DurationAdapter {
	fn parse(&self, raw: &str) -> Option<Duration> {
		let raw = raw.to_lowercase();

		if let Ok(seconds) = raw.parse::<u64>() {
			return Some(Duration::from_secs(seconds));
		}

		let mut total = 0.0f64;
		for token in tokenize(&raw) {
			let magnitude: String = token.chars().filter(|c| !c.is_ascii_lowercase()).collect();
			let unit: String = token.chars().filter(char::is_ascii_lowercase).collect();

			let magnitude: f64 = magnitude.parse().ok()?;
			let factor = match unit.as_str() {
				"c" => SECONDS_PER_YEAR * 100.0,
				"y" => SECONDS_PER_YEAR,
				"mo" => 2_592_000.0,
				"d" => 86_400.0,
				"h" => 3_600.0,
				"m" => 60.0,
				// unrecognized units read as seconds, like a bare magnitude
				_ => 1.0,
			};
			total += magnitude * factor;
		}

		if total.is_finite() && total >= 0.0 { Some(Duration::from_secs(total as u64)) } else { None }
	}

	fn compare(&self, a: &Duration, b: &Duration) -> Ordering {
		a.cmp(b)
	}
}

/// Splits "1d12h30m" into ["1d", "12h", "30m"]: a token ends where a letter
/// run ends.
fn tokenize(raw: &str) -> Vec<&str> {
	let mut tokens = Vec::new();
	let mut start = 0;
	let mut in_unit = false;

	for (idx, c) in raw.char_indices() {
		let is_letter = c.is_ascii_lowercase();
		if in_unit && !is_letter {
			tokens.push(&raw[start..idx]);
			start = idx;
		}
		in_unit = is_letter;
	}
	if start < raw.len() {
		tokens.push(&raw[start..]);
	}

	tokens
}

/// Picks the winning value out of the candidate pool; the default always
/// participates.
pub fn extremal_value<V>(
	candidates: impl IntoIterator<Item = V>,
	default: V,
	adapter: &impl ValueAdapter<V>,
) -> V {
	let mut best = default;
	for candidate in candidates {
		if adapter.compare(&candidate, &best) == Ordering::Greater {
			best = candidate;
		}
	}
	best
}

/// Reads a ranked setting from the Allow-valued children of `prefix`.
///
/// Children that fail to parse are skipped; a provider error degrades to the
/// default. Never fails toward the caller.
pub async fn get_as_value<V>(
	provider: &dyn PermissionProvider,
	user: &UserContext,
	prefix: &str,
	default: V,
	adapter: &impl ValueAdapter<V>,
) -> V {
	let children = match provider
		.list(user, Some(prefix), user.world(), PermissionValue::Allow)
		.await
	{
		Ok(children) => children,
		Err(e) => {
			debug!(prefix = prefix, error = %e, "value lookup failed, using default");
			Vec::new()
		}
	};

	extremal_value(children.iter().filter_map(|c| adapter.parse(c)), default, adapter)
}

/// Like [`get_as_value`], restricted to records set directly on the subject.
pub async fn get_as_value_non_inherited<V>(
	provider: &dyn PermissionProvider,
	user: &UserContext,
	prefix: &str,
	default: V,
	adapter: &impl ValueAdapter<V>,
) -> V {
	let children = match provider
		.list_non_inherited(user, Some(prefix), user.world(), PermissionValue::Allow)
		.await
	{
		Ok(children) => children,
		Err(e) => {
			debug!(prefix = prefix, error = %e, "value lookup failed, using default");
			Vec::new()
		}
	};

	extremal_value(children.iter().filter_map(|c| adapter.parse(c)), default, adapter)
}


// vim: ts=4
