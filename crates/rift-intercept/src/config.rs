//! Controller configuration loaded from YAML.
//!
//! ```yaml
//! assert_all_requests_are_fired: false
//! registry: ordered
//! passthru_prefixes:
//!   - http://localhost:8080
//! passthru_patterns:
//!   - 'https?://[a-z]+\.internal/'
//! ```

use crate::controller::PassthruRule;
use crate::registry::RegistryKind;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockConfig {
    /// Fail on exit when a registered stub was never called.
    #[serde(default = "default_true")]
    pub assert_all_requests_are_fired: bool,

    /// Literal URL prefixes allowed through when no stub matches.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub passthru_prefixes: Vec<String>,

    /// Regex URL prefixes allowed through when no stub matches.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub passthru_patterns: Vec<String>,

    #[serde(default)]
    pub registry: RegistryKind,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            assert_all_requests_are_fired: true,
            passthru_prefixes: Vec::new(),
            passthru_patterns: Vec::new(),
            registry: RegistryKind::default(),
        }
    }
}

impl MockConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, anyhow::Error> {
        let config: MockConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        for prefix in &self.passthru_prefixes {
            if prefix.is_empty() {
                anyhow::bail!("passthru_prefixes must not contain an empty prefix");
            }
        }
        self.compiled_patterns().map(|_| ())
    }

    fn compiled_patterns(&self) -> Result<Vec<Regex>, anyhow::Error> {
        self.passthru_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern)
                    .map_err(|e| anyhow::anyhow!("Invalid passthru pattern '{}': {}", pattern, e))
            })
            .collect()
    }

    /// Passthrough rules in declaration order, prefixes first.
    pub fn passthru_rules(&self) -> Result<Vec<PassthruRule>, anyhow::Error> {
        let mut rules: Vec<PassthruRule> = self
            .passthru_prefixes
            .iter()
            .map(PassthruRule::prefix)
            .collect();
        rules.extend(self.compiled_patterns()?.into_iter().map(PassthruRule::Pattern));
        Ok(rules)
    }
}
