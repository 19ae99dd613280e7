//! Diagnostic side channel.
//!
//! Read operations report their failures here instead of returning them,
//! then continue with a degraded result. The production reporter turns each
//! report into a `tracing` event on the diagnostic stream (stderr).

use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::{ErrorKind, QueryError};

/// Sink for reported errors and informational notices.
pub trait Reporter: Send + Sync {
    /// Records one handled error.
    fn report(&self, error: &QueryError);

    /// Records an informational notice for the operator.
    fn notice(&self, message: &str);
}

/// Reporter that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, err: &QueryError) {
        match err.kind() {
            // Teardown failures are never escalated
            ErrorKind::Close => warn!(kind = %err.kind(), "{err}"),
            kind => error!(kind = %kind, "{err}"),
        }
    }

    fn notice(&self, message: &str) {
        info!("{message}");
    }
}

/// Cheap-to-clone handle to the active reporter.
#[derive(Clone)]
pub struct Diagnostics {
    reporter: Arc<dyn Reporter>,
}

impl Diagnostics {
    pub fn new(reporter: impl Reporter + 'static) -> Self {
        Self {
            reporter: Arc::new(reporter),
        }
    }

    /// Diagnostics backed by [`TracingReporter`].
    pub fn tracing() -> Self {
        Self::new(TracingReporter)
    }

    pub fn report(&self, error: &QueryError) {
        self.reporter.report(error);
    }

    pub fn notice(&self, message: &str) {
        self.reporter.notice(message);
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::tracing()
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics").finish_non_exhaustive()
    }
}
