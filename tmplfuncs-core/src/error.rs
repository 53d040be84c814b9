//! Structured call errors
//!
//! A failed template function call never panics. It produces a `FuncError`
//! wrapped in `Value::Error`, which the template runtime renders or
//! propagates.

use serde::{Deserialize, Serialize};

/// Standard error codes (machine-readable)
pub mod codes {
    pub const UNDEFINED_NAMESPACE: &str = "UNDEFINED_NAMESPACE";
    pub const UNDEFINED_FUNC: &str = "UNDEFINED_FUNC";
    pub const RECEIVER_TYPE: &str = "RECEIVER_TYPE";
}

/// Structured error returned from a template function call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncError {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Suggestion for fixing the call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl FuncError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Builder: add suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    // ========== Common Error Constructors ==========

    pub fn undefined_namespace(name: &str) -> Self {
        Self::new(codes::UNDEFINED_NAMESPACE, format!("Unknown namespace: {}", name))
            .with_suggestion("Check the namespace name or its registration")
    }

    pub fn undefined_func(name: &str) -> Self {
        Self::new(codes::UNDEFINED_FUNC, format!("Unknown function: {}", name))
    }

    pub fn receiver_type(func: &str, expected: &str) -> Self {
        Self::new(
            codes::RECEIVER_TYPE,
            format!("{}() called on a receiver that is not {}", func, expected),
        )
        .with_suggestion("The namespace context factory returned an unexpected receiver")
    }
}

impl std::fmt::Display for FuncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for FuncError {}
