//! Configuration loading and validation

use crate::{Config, Error, Result};
use std::fs;
use std::path::Path;

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
}

/// Detect configuration format from file extension
pub fn detect_format(path: &Path) -> Result<ConfigFormat> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(ConfigFormat::Json),
        Some(ext) => Err(Error::InvalidConfig(format!(
            "unsupported configuration format '.{}'",
            ext
        ))),
        None => Err(Error::InvalidConfig("No file extension found".to_string())),
    }
}

/// Load a configuration file. Missing sizing parameters are an error.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    match detect_format(path)? {
        ConfigFormat::Json => serde_json::from_str(&content).map_err(|e| {
            Error::InvalidConfig(format!("{}: {}", path.display(), e))
        }),
    }
}

/// Save a configuration file
pub fn save<P: AsRef<Path>>(config: &Config, path: P) -> Result<()> {
    let path = path.as_ref();

    let content = match detect_format(path)? {
        ConfigFormat::Json => serde_json::to_string_pretty(config)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?,
    };

    fs::write(path, content)?;
    Ok(())
}

/// Validation rule for a single sizing parameter
pub enum ValidationRule {
    Range { min: usize, max: usize },
    Custom(Box<dyn Fn(usize) -> Result<()> + Send + Sync>),
}

impl std::fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationRule::Range { min, max } => {
                write!(f, "Range {{ min: {}, max: {} }}", min, max)
            }
            ValidationRule::Custom(_) => write!(f, "Custom(<closure>)"),
        }
    }
}

/// Configuration validator
#[derive(Debug)]
pub struct ConfigValidator {
    /// Rules, checked in insertion order
    rules: Vec<(String, ValidationRule)>,
}

impl ConfigValidator {
    /// Create a validator with no rules
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a validation rule
    pub fn add_rule(&mut self, key: &str, rule: ValidationRule) {
        self.rules.push((key.to_string(), rule));
    }

    /// Validate configuration
    pub fn validate(&self, config: &Config) -> Result<()> {
        for (key, rule) in &self.rules {
            let value = config
                .field(key)
                .ok_or_else(|| Error::InvalidConfig(format!("Unknown key '{}'", key)))?;

            match rule {
                ValidationRule::Range { min, max } => {
                    if value < *min || value > *max {
                        return Err(Error::InvalidConfig(format!(
                            "'{}' must be between {} and {}, got {}",
                            key, min, max, value
                        )));
                    }
                }
                ValidationRule::Custom(validator) => validator(value)?,
            }
        }

        Ok(())
    }
}

/// Rules every run must satisfy: at least one buffer slot, one producer and
/// one consumer. `total_items` may be zero.
impl Default for ConfigValidator {
    fn default() -> Self {
        let mut validator = Self::new();
        let positive = || ValidationRule::Range {
            min: 1,
            max: usize::MAX,
        };

        validator.add_rule("max_buf_size", positive());
        validator.add_rule("num_producers", positive());
        validator.add_rule("num_consumers", positive());
        validator
    }
}

/// Validate with the default rules
pub fn validate(config: &Config) -> Result<()> {
    ConfigValidator::default().validate(config)
}
