//! Error taxonomy for identity assembly.
//!
//! Every variant is raised synchronously before an identity reaches the
//! provisioning stage; there is no partially assembled result.

use thiserror::Error;

/// Errors that abort an assembly run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    /// An optional nested object is partially specified or a field is malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A composed statement or identity breaks a structural rule.
    #[error("validation error: {0}")]
    Validation(String),

    /// A resource relies on the identity without a declared ordering edge.
    #[error("dependency error: {0}")]
    Dependency(String),
}

impl AssemblyError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn dependency(message: impl Into<String>) -> Self {
        Self::Dependency(message.into())
    }
}

/// Result type for assembly operations.
pub type AssemblyResult<T> = Result<T, AssemblyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_variant() {
        let err = AssemblyError::configuration("postgresqlConfig.secretArn is missing");
        assert_eq!(
            err.to_string(),
            "configuration error: postgresqlConfig.secretArn is missing"
        );
        let err = AssemblyError::validation("duplicate sid 'ECRImageAccess'");
        assert_eq!(err.to_string(), "validation error: duplicate sid 'ECRImageAccess'");
        let err = AssemblyError::dependency("runtime has no edge to role");
        assert_eq!(err.to_string(), "dependency error: runtime has no edge to role");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<AssemblyError>();
    }
}
