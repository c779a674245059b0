//! Deployment-level configuration for DaemonSet generation.

use crate::constants::DEFAULT_KERNEL_LABEL;
use crate::error::DaemonSetError;
use std::env;

/// Environment variable overriding the node kernel-version label.
pub const KERNEL_LABEL_ENV: &str = "KMM_KERNEL_LABEL";

/// Settings shared by every generated DaemonSet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonSetConfig {
    /// Node label holding the full kernel version; also set on module-loader
    /// DaemonSets and used in their node selector
    pub kernel_label: String,
}

impl Default for DaemonSetConfig {
    fn default() -> Self {
        Self {
            kernel_label: DEFAULT_KERNEL_LABEL.to_string(),
        }
    }
}

impl DaemonSetConfig {
    /// Creates a configuration using `kernel_label`, which must not be blank.
    pub fn new(kernel_label: impl Into<String>) -> Result<Self, DaemonSetError> {
        let kernel_label = kernel_label.into();
        if kernel_label.trim().is_empty() {
            return Err(DaemonSetError::InvalidConfig(
                "kernel label cannot be empty".to_string(),
            ));
        }
        Ok(Self { kernel_label })
    }

    /// Loads configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, DaemonSetError> {
        Self::from_var(env::var(KERNEL_LABEL_ENV))
    }

    fn from_var(value: Result<String, env::VarError>) -> Result<Self, DaemonSetError> {
        match value {
            Ok(label) => Self::new(label),
            Err(env::VarError::NotPresent) => Ok(Self::default()),
            Err(env::VarError::NotUnicode(_)) => Err(DaemonSetError::InvalidConfig(format!(
                "{KERNEL_LABEL_ENV} is not valid unicode"
            ))),
        }
    }
}
