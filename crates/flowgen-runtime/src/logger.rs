use std::fmt;
use std::sync::Arc;

const ROOT: &str = "flowgen";

/// Hierarchical named logger handed to artifacts by the host.
///
/// Events go through `tracing` tagged with `logger = <dotted name>`; the
/// subscriber installed by the host decides what is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logger {
    name: Arc<str>,
}

impl Logger {
    pub fn root() -> Self {
        Self { name: ROOT.into() }
    }

    /// A logger named `<parent>.<name>`.
    pub fn child(&self, name: &str) -> Self {
        Self {
            name: format!("{}.{name}", self.name).into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn debug(&self, message: impl fmt::Display) {
        tracing::debug!(logger = %self.name, "{message}");
    }

    pub fn info(&self, message: impl fmt::Display) {
        tracing::info!(logger = %self.name, "{message}");
    }

    pub fn warn(&self, message: impl fmt::Display) {
        tracing::warn!(logger = %self.name, "{message}");
    }

    pub fn error(&self, message: impl fmt::Display) {
        tracing::error!(logger = %self.name, "{message}");
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::root()
    }
}
