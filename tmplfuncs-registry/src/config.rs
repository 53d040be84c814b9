//! Registry configuration

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Environment variable holding the collision policy
pub const COLLISIONS_ENV: &str = "TMPLFUNCS_COLLISIONS";

/// What happens when a method name, alias, or namespace name is registered twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// The later registration silently replaces the earlier one
    #[default]
    Overwrite,
    /// Every collision is reported as a registration error
    Reject,
}

impl FromStr for CollisionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "reject" => Ok(Self::Reject),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Settings applied when the function table is assembled
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub collisions: CollisionPolicy,
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collisions(mut self, policy: CollisionPolicy) -> Self {
        self.collisions = policy;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.collisions == CollisionPolicy::Reject
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read overrides from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`, falling back to defaults for unset keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(policy) = lookup(COLLISIONS_ENV) {
            config.collisions = policy.parse()?;
        }
        Ok(config)
    }
}
