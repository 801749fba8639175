pub use crate::error::{Error, PermResult};
pub use crate::value::PermissionValue;

pub use tracing::{debug, debug_span, error, error_span, info, info_span, warn, warn_span};

// vim: ts=4
