//! Error type shared by all Permesso crates.

use std::fmt;

pub type PermResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	/// Subject, group or record was not found by the backend
	NotFound,
	/// The stored key is malformed (empty, or contains a reserved marker)
	InvalidKey(Box<str>),
	/// Provider with this identifier is already registered
	DuplicateProvider(Box<str>),
	/// Provider construction failed; the provider is excluded from selection
	ProviderConstruction(Box<str>),
	/// The operation is not supported by the active provider
	Unsupported(&'static str),
	/// Backend is temporarily unable to answer (network, storage)
	ProviderUnavailable(Box<str>),
	/// Configuration document could not be read or written
	Config(String),

	// externals
	Io(std::io::Error),
	Json(String),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Error::NotFound => write!(f, "not found"),
			Error::InvalidKey(key) => write!(f, "invalid permission key: {}", key),
			Error::DuplicateProvider(id) => write!(f, "provider already registered: {}", id),
			Error::ProviderConstruction(msg) => write!(f, "provider construction failed: {}", msg),
			Error::Unsupported(op) => write!(f, "operation not supported: {}", op),
			Error::ProviderUnavailable(msg) => write!(f, "provider unavailable: {}", msg),
			Error::Config(msg) => write!(f, "config error: {}", msg),
			Error::Io(e) => write!(f, "io error: {}", e),
			Error::Json(msg) => write!(f, "json error: {}", msg),
		}
	}
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
	fn from(e: std::io::Error) -> Self {
		Error::Io(e)
	}
}

impl From<serde_json::Error> for Error {
	fn from(e: serde_json::Error) -> Self {
		Error::Json(e.to_string())
	}
}

// vim: ts=4
