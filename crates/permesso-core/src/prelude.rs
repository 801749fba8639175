pub use permesso_types::context::{Actor, OperatorLedger, UserContext};
pub use permesso_types::error::{Error, PermResult};
pub use permesso_types::provider::{Capabilities, PermissionProvider, Priority};
pub use permesso_types::value::PermissionValue;

pub use tracing::{debug, debug_span, error, error_span, info, info_span, warn, warn_span};

// vim: ts=4
