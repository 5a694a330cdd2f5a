//! Pre-flight checks before starting a session.
//!
//! Validates that required configuration is available before starting a
//! session that would otherwise fail at its first model call.

use crate::config::LlmSettings;
use crate::error::{PodEchoError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// A reading session backed by the model API.
    Reflect,
    /// A reading session on the built-in offline services.
    Offline,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, llm: &LlmSettings) -> Result<()> {
    match operation {
        Operation::Reflect => check_api_key(&llm.api_key_env),
        Operation::Offline => Ok(()),
    }
}

/// Check that the configured API key variable is set.
fn check_api_key(var: &str) -> Result<()> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(PodEchoError::Config(format!(
            "{} is empty. Set it with: export {}='sk-...' or add it to a .env file",
            var, var
        ))),
        Err(_) => Err(PodEchoError::Config(format!(
            "{} not set. Set it with: export {}='sk-...' or add it to a .env file",
            var, var
        ))),
    }
}
