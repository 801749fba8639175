//! Persisted configuration document.
//!
//! One JSON file holds the selected provider identifier, an informational
//! (regenerated) list of available providers, and the vanilla provider's
//! five level maps. A missing or unreadable file yields in-memory defaults;
//! configuration I/O is never fatal.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::path::PathBuf;

use crate::prelude::*;

/// Ordered `key -> bool` map as stored per operator level.
pub type LevelMap = IndexMap<Box<str>, bool>;

#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PermissionsConfig {
	/// Informational only; rewritten on every selection so admins can see
	/// what identifiers are valid for `defaultProvider`.
	pub available_providers: Option<String>,

	/// Identifier of the preferred provider, persisted across boots.
	pub default_provider: Option<Box<str>>,

	pub default_permissions: LevelMap,
	pub level1_permissions: LevelMap,
	pub level2_permissions: LevelMap,
	pub level3_permissions: LevelMap,
	pub level4_permissions: LevelMap,
}

impl PermissionsConfig {
	/// Own entries of the given operator level (0..=4; higher clamps to 4).
	pub fn level_map(&self, level: u8) -> &LevelMap {
		match level {
			0 => &self.default_permissions,
			1 => &self.level1_permissions,
			2 => &self.level2_permissions,
			3 => &self.level3_permissions,
			_ => &self.level4_permissions,
		}
	}
}

/// Loads and saves the configuration document at a fixed path.
///
/// The ephemeral variant backs isolated test instances and hosts that do
/// not want a config file at all.
#[derive(Debug, Clone)]
pub struct ConfigStore {
	path: Option<PathBuf>,
}

impl ConfigStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: Some(path.into()) }
	}

	/// In-memory only: `load` yields defaults, `save` is a no-op.
	pub fn ephemeral() -> Self {
		Self { path: None }
	}

	/// Reads the document, falling back to defaults on any failure.
	pub fn load(&self) -> PermissionsConfig {
		let Some(path) = self.path.as_ref() else {
			return PermissionsConfig::default();
		};

		if !path.exists() {
			debug!(path = %path.display(), "no permissions config yet, using defaults");
			return PermissionsConfig::default();
		}

		match std::fs::read_to_string(path) {
			Ok(raw) => match serde_json::from_str(&raw) {
				Ok(config) => config,
				Err(e) => {
					error!(path = %path.display(), error = %e, "malformed permissions config, using defaults");
					PermissionsConfig::default()
				}
			},
			Err(e) => {
				error!(path = %path.display(), error = %e, "cannot read permissions config, using defaults");
				PermissionsConfig::default()
			}
		}
	}

	/// Writes the document; failures are logged, never propagated.
	pub fn save(&self, config: &PermissionsConfig) {
		let Some(path) = self.path.as_ref() else {
			return;
		};

		let raw = match serde_json::to_string_pretty(config) {
			Ok(raw) => raw,
			Err(e) => {
				error!(error = %e, "cannot serialize permissions config");
				return;
			}
		};

		if let Err(e) = std::fs::write(path, raw) {
			error!(path = %path.display(), error = %e, "cannot write permissions config");
		}
	}
}


// vim: ts=4
