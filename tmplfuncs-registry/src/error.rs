//! Registration errors
//!
//! These are configuration errors: they surface while namespaces are built
//! at startup and are never produced once the function table exists.

use std::fmt;
use thiserror::Error;

/// A single registration or build failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("{namespace}: Empty alias for {method}")]
    EmptyAlias { namespace: String, method: String },

    #[error("{namespace}: Empty example for {method}")]
    EmptyExample { namespace: String, method: String },

    #[error("{namespace}: cannot derive a name for {path}; give it one with Method::with_name")]
    UnnamedMethod { namespace: String, path: String },

    #[error("namespace name must not be empty")]
    EmptyNamespaceName,

    #[error("registry is sealed: namespace constructors can no longer be registered")]
    Sealed,

    #[error("{namespace}: method {method} registered more than once")]
    DuplicateMethod { namespace: String, method: String },

    #[error("{namespace}: alias {alias} for {method} is already bound to {previous}")]
    DuplicateAlias {
        alias: String,
        namespace: String,
        method: String,
        previous: String,
    },

    #[error("namespace {0} registered more than once")]
    DuplicateNamespace(String),
}

/// Every failure collected while building the function table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegistrationErrors(pub Vec<RegistrationError>);

impl RegistrationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RegistrationError> {
        self.0.iter()
    }
}

impl fmt::Display for RegistrationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} registration error(s)", self.0.len())?;
        for err in &self.0 {
            write!(f, "\n  - {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for RegistrationErrors {}

impl From<RegistrationError> for RegistrationErrors {
    fn from(err: RegistrationError) -> Self {
        Self(vec![err])
    }
}

/// Invalid registry configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown collision policy '{0}' (expected 'overwrite' or 'reject')")]
    UnknownPolicy(String),

    #[error("invalid registry config: {0}")]
    Json(#[from] serde_json::Error),
}
