//! YAML configuration for the two command line tools. Command line flags win over file values.

use std::fs;
use std::path::Path;
use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::fingerprint::{FingerprintContext, FpType, Metric};

pub const DEFAULT_PROGRESS_INTERVAL: usize = 10_000;
pub const DEFAULT_BATCH_SIZE: usize = 4096;

fn read_yaml<T: for<'de> Deserialize<'de>>(filename: &Path) -> Result<T> {

    let serialized = fs::read_to_string(filename).map_err(|e| Error::io(filename, e))?;
    let deserialized: T = serde_yaml::from_str(&serialized)
        .map_err(|e| Error::Config(format!("{}: {}", filename.display(), e)))?;

    Ok(deserialized)
}

fn write_yaml<T: Serialize>(value: &T, filename: &Path) -> Result<()> {

    let serialized = serde_yaml::to_string(value)?;
    fs::write(filename, serialized).map_err(|e| Error::io(filename, e))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SampleConfig {
    pub count: Option<i64>,
    pub seed: Option<u64>,
    pub skip_blank_lines: bool,
}

impl Default for SampleConfig {
    fn default() -> Self {
        return Self {
            count: None,
            seed: None,
            skip_blank_lines: true,
        };
    }
}

impl SampleConfig {

    pub fn from_file<P: AsRef<Path>>(filename: P) -> Result<Self> {
        read_yaml(filename.as_ref())
    }

    pub fn to_file<P: AsRef<Path>>(&self, filename: P) -> Result<()> {
        write_yaml(self, filename.as_ref())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub top_count: Option<i64>,
    pub fp_type: FpType,
    pub metric: Metric,
    /// Identifiers between two progress log lines.
    pub progress_interval: usize,
    /// Worker threads for loading and scoring; 1 scores inline.
    pub threads: usize,
    /// Identifiers read ahead per parallel batch.
    pub batch_size: usize,
    pub skip_blank_lines: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        return Self {
            top_count: None,
            fp_type: FpType::Sim,
            metric: Metric::Tanimoto,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            threads: 1,
            batch_size: DEFAULT_BATCH_SIZE,
            skip_blank_lines: true,
        };
    }
}

impl SearchConfig {

    pub fn from_file<P: AsRef<Path>>(filename: P) -> Result<Self> {

        let config: Self = read_yaml(filename.as_ref())?;
        config.validate()?;

        Ok(config)
    }

    pub fn to_file<P: AsRef<Path>>(&self, filename: P) -> Result<()> {
        write_yaml(self, filename.as_ref())
    }

    pub fn validate(&self) -> Result<()> {

        if self.progress_interval == 0 {
            return Err(Error::Config("progress_interval must be at least 1".to_string()));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }
        if self.threads == 0 {
            return Err(Error::Config("threads must be at least 1".to_string()));
        }

        Ok(())
    }

    pub fn context(&self) -> FingerprintContext {
        FingerprintContext::new(self.fp_type, self.metric)
    }
}
