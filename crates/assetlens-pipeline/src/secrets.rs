//! Secret lookup

use crate::error::PipelineError;
use std::collections::HashMap;
use std::env;

/// Source of named secrets such as database credentials and API keys
pub trait SecretSource: Send + Sync {
    /// Value of a secret; missing or empty values are errors
    fn get(&self, name: &str) -> Result<String, PipelineError>;
}

/// Reads secrets from environment variables
///
/// Parameter paths map to variable names by dropping the leading `/`,
/// turning the remaining `/` and `-` into `_` and upper-casing:
/// `/operator/DB_PASSWORD` is read from `OPERATOR_DB_PASSWORD`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretSource;

impl EnvSecretSource {
    /// Environment variable consulted for a secret name
    pub fn variable_name(name: &str) -> String {
        name.trim_start_matches('/')
            .chars()
            .map(|c| match c {
                '/' | '-' | '.' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect()
    }
}

impl SecretSource for EnvSecretSource {
    fn get(&self, name: &str) -> Result<String, PipelineError> {
        let variable = Self::variable_name(name);
        match env::var(&variable) {
            Ok(value) if !value.is_empty() => Ok(value),
            Ok(_) => Err(PipelineError::Secret {
                name: name.to_string(),
                reason: format!("{} is empty", variable),
            }),
            Err(e) => Err(PipelineError::Secret {
                name: name.to_string(),
                reason: format!("{}: {}", variable, e),
            }),
        }
    }
}

impl SecretSource for HashMap<String, String> {
    fn get(&self, name: &str) -> Result<String, PipelineError> {
        HashMap::get(self, name)
            .filter(|v| !v.is_empty())
            .cloned()
            .ok_or_else(|| PipelineError::Secret {
                name: name.to_string(),
                reason: "Parameter not found".to_string(),
            })
    }
}
