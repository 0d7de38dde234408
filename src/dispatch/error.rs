//! Error taxonomy for the dispatch core.
//!
//! Every variant is recovered at the dispatcher boundary and rendered as a single
//! `ERROR: [<Kind>] <cause>` line (see `normalize`). None of them is fatal to the server.

use std::time::Duration;

use thiserror::Error;

use super::registry::Family;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("operation '{0}' is already registered")]
    DuplicateOperation(String),

    #[error("invalid argument '{param}' for '{operation}': {reason}")]
    InvalidArgument {
        operation: String,
        param: String,
        reason: String,
    },

    #[error("no {family} backend available (native: {native}, fallback: {fallback})")]
    NoBackendAvailable {
        family: Family,
        native: String,
        fallback: String,
    },

    #[error("{family} backend missing: {path}")]
    BackendMissing { family: Family, path: String },

    #[error("failed to launch '{program}': {source}")]
    LaunchFailure {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command timed out after {} seconds", .timeout.as_secs())]
    ExecutionTimeout { timeout: Duration },
}

impl DispatchError {
    /// Stable kind name used as the machine-greppable error tag.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::UnknownOperation(_) => "UnknownOperation",
            DispatchError::DuplicateOperation(_) => "DuplicateOperation",
            DispatchError::InvalidArgument { .. } => "InvalidArgument",
            DispatchError::NoBackendAvailable { .. } => "NoBackendAvailable",
            DispatchError::BackendMissing { .. } => "BackendMissing",
            DispatchError::LaunchFailure { .. } => "LaunchFailure",
            DispatchError::ExecutionTimeout { .. } => "ExecutionTimeout",
        }
    }

    pub(crate) fn invalid(
        operation: &str,
        param: &str,
        reason: impl Into<String>,
    ) -> DispatchError {
        DispatchError::InvalidArgument {
            operation: operation.to_string(),
            param: param.to_string(),
            reason: reason.into(),
        }
    }

    /// True when a launch failed because the executable does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DispatchError::LaunchFailure { source, .. }
                if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(
            DispatchError::UnknownOperation("x".into()).kind(),
            "UnknownOperation"
        );
        assert_eq!(
            DispatchError::ExecutionTimeout {
                timeout: Duration::from_secs(60)
            }
            .kind(),
            "ExecutionTimeout"
        );
    }

    #[test]
    fn timeout_message_carries_duration() {
        let err = DispatchError::ExecutionTimeout {
            timeout: Duration::from_secs(120),
        };
        assert_eq!(err.to_string(), "command timed out after 120 seconds");
    }

    #[test]
    fn not_found_detection() {
        let err = DispatchError::LaunchFailure {
            program: "/nope".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.is_not_found());
        let err = DispatchError::LaunchFailure {
            program: "/nope".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(!err.is_not_found());
    }
}
