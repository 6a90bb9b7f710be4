//! Record store scenario tests
//!
//! Organized into message handling against stub collaborators, multi-node
//! convergence over the in-memory broker, and ordering properties.

mod ordering_props;

use std::time::Duration;

/// Upper bound for a handler to react to one delivered message
pub(crate) const HANDLER_WAIT: Duration = Duration::from_secs(2);
