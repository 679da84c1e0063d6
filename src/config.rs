//! Configuration management for the codec

use crate::error::{Error, Result};
use crate::symbol::DIGITS_PER_BYTE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default RS interleave radix (136-digit payloads)
pub const DEFAULT_RADIX: usize = 34;

/// Default keystream seed
pub const DEFAULT_SEED: u64 = 1;

/// Default 5' primer
pub const DEFAULT_PRIMER_5: &str = "CCACGCGTACCGATAGCTTCAG";

/// Default 3' primer
pub const DEFAULT_PRIMER_3: &str = "GCAATTGACCCACGCATGTATC";

/// Main codec configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Number of interleaved RS rows; payloads are `4 * radix` digits
    pub radix: usize,

    /// Keystream seed (ignored at the reference payload width)
    pub seed: u64,

    /// VT target syndrome
    pub vt_syndrome: usize,

    /// Let the inner code fix a single substitution as well as an indel
    pub correct_substitutions: bool,

    /// Decode worker threads (0 = one per available core)
    pub workers: usize,

    /// Oligo text format
    pub oligo: OligoConfig,
}

/// Primers wrapped around every strand in the oligo file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OligoConfig {
    /// Prepended to every strand
    pub primer_5: String,

    /// Appended to every strand
    pub primer_3: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            radix: DEFAULT_RADIX,
            seed: DEFAULT_SEED,
            vt_syndrome: 0,
            correct_substitutions: true,
            workers: 0,
            oligo: OligoConfig::default(),
        }
    }
}

impl Default for OligoConfig {
    fn default() -> Self {
        Self {
            primer_5: DEFAULT_PRIMER_5.to_string(),
            primer_3: DEFAULT_PRIMER_3.to_string(),
        }
    }
}

impl CodecConfig {
    /// Load configuration from a file, with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!("Failed to read config file: {}", e))
        })?;

        let mut config: CodecConfig = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse config file: {}", e))
        })?;

        config.apply_env_overrides();

        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(radix) = std::env::var("DNA_LADDER_RADIX") {
            if let Ok(radix) = radix.trim().parse::<usize>() {
                self.radix = radix;
            }
        }

        if let Ok(seed) = std::env::var("DNA_LADDER_SEED") {
            if let Ok(seed) = seed.trim().parse::<u64>() {
                self.seed = seed;
            }
        }

        if let Ok(workers) = std::env::var("DNA_LADDER_WORKERS") {
            if let Ok(workers) = workers.trim().parse::<usize>() {
                self.workers = workers;
            }
        }
    }

    /// Defaults with environment overrides (no config file)
    pub fn from_env() -> Result<Self> {
        let mut config = CodecConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            Error::Config(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path.as_ref(), content).map_err(|e| {
            Error::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.radix == 0 {
            return Err(Error::InvalidConfig(
                "Radix must be greater than 0".to_string(),
            ));
        }

        for (name, primer) in [("5'", &self.oligo.primer_5), ("3'", &self.oligo.primer_3)] {
            if let Some(c) = primer.chars().find(|c| !matches!(c, 'A' | 'C' | 'G' | 'T')) {
                return Err(Error::InvalidConfig(format!(
                    "{} primer contains non-nucleotide character {:?}",
                    name, c
                )));
            }
        }

        Ok(())
    }

    /// Payload width in quaternary digits
    pub fn length_ary(&self) -> usize {
        DIGITS_PER_BYTE * self.radix
    }

    /// Worker thread count with 0 resolved to the available parallelism
    pub fn resolved_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism().map_or(1, |n| n.get())
        }
    }

    /// Default location of the config file
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dna-ladder")
            .join("config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CodecConfig::default();
        assert_eq!(config.radix, 34);
        assert_eq!(config.length_ary(), 136);
        assert_eq!(config.vt_syndrome, 0);
        assert!(config.correct_substitutions);
        assert!(config.validate().is_ok());
        assert!(config.resolved_workers() >= 1);
    }

    #[test]
    fn test_validate() {
        let mut config = CodecConfig::default();
        config.radix = 0;
        assert!(config.validate().is_err());

        let mut config = CodecConfig::default();
        config.oligo.primer_3 = "ACGU".to_string();
        assert!(config.validate().is_err());

        let mut config = CodecConfig::default();
        config.oligo.primer_5 = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = CodecConfig::default();
        config.radix = 16;
        config.workers = 3;
        config.oligo.primer_5 = "ACGT".to_string();
        config.save(&path).unwrap();

        let loaded = CodecConfig::load(&path).unwrap();
        assert_eq!(loaded.radix, 16);
        assert_eq!(loaded.oligo.primer_5, "ACGT");
        assert_eq!(loaded.oligo.primer_3, DEFAULT_PRIMER_3);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "radix": 8 }"#).unwrap();

        let loaded = CodecConfig::load(&path).unwrap();
        assert_eq!(loaded.radix, 8);
        assert_eq!(loaded.oligo, OligoConfig::default());
    }

    #[test]
    fn test_load_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(CodecConfig::load(&path).is_err());
        assert!(CodecConfig::load(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_env_override() {
        std::env::set_var("DNA_LADDER_SEED", " 77 ");
        let mut config = CodecConfig::default();
        config.apply_env_overrides();
        std::env::remove_var("DNA_LADDER_SEED");
        assert_eq!(config.seed, 77);
    }
}
