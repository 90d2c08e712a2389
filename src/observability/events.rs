//! Lifecycle events
//!
//! Boot and shutdown milestones are explicit and typed so every deployment
//! logs them under the same names.

use std::fmt;

/// Observable lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Process startup begins
    BootStart,
    /// Configuration loaded and environment overrides applied
    ConfigLoaded,
    /// Schema documents compiled
    SchemasLoaded,
    /// Every endpoint gate built
    GatesBuilt,
    /// Listener bound, ready to serve
    BootComplete,
    /// Boot aborted (FATAL)
    BootFailed,
    /// Shutdown signal received
    ShutdownStart,
    /// Server stopped accepting connections
    ShutdownComplete,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "BOOT_START",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemasLoaded => "SCHEMAS_LOADED",
            Event::GatesBuilt => "GATES_BUILT",
            Event::BootComplete => "BOOT_COMPLETE",
            Event::BootFailed => "BOOT_FAILED",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::BootFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::BootStart.as_str(), "BOOT_START");
        assert_eq!(Event::GatesBuilt.to_string(), "GATES_BUILT");
    }

    #[test]
    fn test_only_boot_failure_is_fatal() {
        assert!(Event::BootFailed.is_fatal());
        assert!(!Event::ShutdownComplete.is_fatal());
    }
}
