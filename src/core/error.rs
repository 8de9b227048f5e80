//! Error types for the engine.

use thiserror::Error;

/// Main error type for engine operations.
#[derive(Error, Debug)]
pub enum VitalsError {
    /// Invalid configuration, rejected at construction.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required host capability is absent.
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(&'static str),

    /// A collector failed while processing an event.
    #[error("Collector failure in {collector}: {message}")]
    Collector {
        /// Collector that failed.
        collector: &'static str,
        /// Failure description.
        message: String,
    },

    /// The component registry has no entry for the requested name.
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// A lazy target failed to resolve.
    #[error("Lazy load failed for {target}: {message}")]
    LazyLoad {
        /// Registered target id.
        target: String,
        /// Failure description.
        message: String,
    },

    /// A host optimization hook rejected an action.
    #[error("Optimization action {action} failed: {message}")]
    Optimization {
        /// Action tag that failed.
        action: &'static str,
        /// Failure description.
        message: String,
    },

    /// IO failure while reading configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration file.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, VitalsError>;

impl VitalsError {
    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new collector failure
    pub fn collector<S: Into<String>>(collector: &'static str, msg: S) -> Self {
        Self::Collector {
            collector,
            message: msg.into(),
        }
    }

    /// Creates a new lazy-load failure
    pub fn lazy_load<T: Into<String>, S: Into<String>>(target: T, msg: S) -> Self {
        Self::LazyLoad {
            target: target.into(),
            message: msg.into(),
        }
    }

    /// Creates a new optimization action failure
    pub fn optimization<S: Into<String>>(action: &'static str, msg: S) -> Self {
        Self::Optimization {
            action,
            message: msg.into(),
        }
    }

    /// Returns true if the engine keeps running after this error.
    ///
    /// Everything except a configuration error is absorbed: a missing
    /// capability deactivates one collector, a collector or optimization
    /// failure is logged and the rest of the engine continues.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }

    /// Returns the error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::CapabilityUnavailable(_) => "capability",
            Self::Collector { .. } => "collector",
            Self::ComponentNotFound(_) => "registry",
            Self::LazyLoad { .. } => "lazy_load",
            Self::Optimization { .. } => "optimization",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = VitalsError::config("bad budget");
        assert_eq!(err.to_string(), "Configuration error: bad budget");
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_error_recoverability() {
        assert!(!VitalsError::config("invalid").is_recoverable());
        assert!(VitalsError::collector("load", "handler panicked").is_recoverable());
        assert!(VitalsError::CapabilityUnavailable("frame callback").is_recoverable());
        assert!(VitalsError::optimization("optimize-memory", "hook rejected").is_recoverable());
    }

    #[test]
    fn test_lazy_load_error() {
        let err = VitalsError::lazy_load("sidebar", "factory rejected");
        assert_eq!(err.to_string(), "Lazy load failed for sidebar: factory rejected");
        assert_eq!(err.category(), "lazy_load");
    }
}
