use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{RamnetError, Result};
use crate::mapping::MAX_TUPLE_SIZE;
use crate::memory::Counter;

/// Shape and limits of a classifier, loadable from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Pattern length `L`
    pub input_bits: usize,
    /// Positions per RAM node `T` (1..=64)
    pub tuple_size: usize,
    /// Number of classes `C`
    pub classes: usize,
    /// Seed of the bit-tuple mapping
    pub seed: u64,
    /// Counter ceiling; counters stop growing once they reach it
    pub saturation: Counter,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            input_bits: 128,
            tuple_size: 16,
            classes: 10,
            seed: 0,
            saturation: Counter::MAX,
        }
    }
}

impl ClassifierConfig {
    pub fn new(input_bits: usize, tuple_size: usize, classes: usize, seed: u64) -> Self {
        Self {
            input_bits,
            tuple_size,
            classes,
            seed,
            ..Default::default()
        }
    }

    pub fn with_saturation(mut self, saturation: Counter) -> Self {
        self.saturation = saturation;
        self
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ClassifierConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    /// Environment variables are prefixed with RAMNET_
    /// Example: RAMNET_SEED=42
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: ClassifierConfig = toml::from_str(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        fn parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
            match std::env::var(name) {
                Ok(val) => val
                    .trim()
                    .parse()
                    .map(Some)
                    .map_err(|_| RamnetError::config(format!("Invalid {}", name))),
                Err(_) => Ok(None),
            }
        }

        if let Some(v) = parse("RAMNET_INPUT_BITS")? {
            self.input_bits = v;
        }
        if let Some(v) = parse("RAMNET_TUPLE_SIZE")? {
            self.tuple_size = v;
        }
        if let Some(v) = parse("RAMNET_CLASSES")? {
            self.classes = v;
        }
        if let Some(v) = parse("RAMNET_SEED")? {
            self.seed = v;
        }
        if let Some(v) = parse("RAMNET_SATURATION")? {
            self.saturation = v;
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.input_bits == 0 {
            return Err(RamnetError::config("input_bits must be > 0"));
        }
        if self.tuple_size == 0 || self.tuple_size > self.input_bits {
            return Err(RamnetError::config(
                "tuple_size must be in [1, input_bits]",
            ));
        }
        if self.tuple_size > MAX_TUPLE_SIZE {
            return Err(RamnetError::config(format!(
                "tuple_size must be <= {}",
                MAX_TUPLE_SIZE
            )));
        }
        if self.classes == 0 {
            return Err(RamnetError::config("classes must be > 0"));
        }
        if self.saturation == 0 {
            return Err(RamnetError::config("saturation must be >= 1"));
        }
        Ok(())
    }

    /// Export configuration to TOML string
    pub fn to_toml_string(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self
            .to_toml_string()
            .map_err(|e| RamnetError::config(format!("TOML serialization error: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_valid() {
        let config = ClassifierConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.input_bits, 128);
        assert_eq!(config.tuple_size, 16);
        assert_eq!(config.classes, 10);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClassifierConfig::default();
        config.tuple_size = 0;
        assert!(config.validate().is_err());

        config.tuple_size = 129;
        assert!(config.validate().is_err());

        let config = ClassifierConfig::new(256, 65, 2, 0);
        assert!(config.validate().is_err());

        let config = ClassifierConfig::new(16, 4, 0, 0);
        assert!(config.validate().is_err());

        let config = ClassifierConfig::default().with_saturation(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ClassifierConfig::new(64, 8, 4, 1234).with_saturation(255);
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("tuple_size = 8"));

        let tf = NamedTempFile::new().unwrap();
        config.save_to_file(tf.path()).unwrap();
        let loaded = ClassifierConfig::from_file(tf.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let mut tf = NamedTempFile::new().unwrap();
        writeln!(tf, "classes = 3\nseed = 9").unwrap();
        let loaded = ClassifierConfig::from_file(tf.path()).unwrap();
        assert_eq!(loaded.classes, 3);
        assert_eq!(loaded.seed, 9);
        assert_eq!(loaded.input_bits, 128);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let mut tf = NamedTempFile::new().unwrap();
        writeln!(tf, "classes = \"many\"").unwrap();
        assert!(matches!(
            ClassifierConfig::from_file(tf.path()),
            Err(RamnetError::TomlParse(_))
        ));

        let mut tf = NamedTempFile::new().unwrap();
        writeln!(tf, "classes = 0").unwrap();
        assert!(matches!(
            ClassifierConfig::from_file(tf.path()),
            Err(RamnetError::Config(_))
        ));
    }

    #[test]
    fn test_env_override() {
        let mut tf = NamedTempFile::new().unwrap();
        writeln!(tf, "seed = 1").unwrap();

        std::env::set_var("RAMNET_SEED", "77");
        let loaded = ClassifierConfig::from_file_with_env(tf.path());
        std::env::remove_var("RAMNET_SEED");

        assert_eq!(loaded.unwrap().seed, 77);
    }
}
