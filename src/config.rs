// Tue Jan 20 2026 - Alex

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How batches reach the partition pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StagingMode {
    /// Each pipeline reads its own partition from the source.
    #[default]
    Direct,
    /// Every source is read once into the object store before dispatch.
    Staged,
}

impl std::fmt::Display for StagingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StagingMode::Direct => write!(f, "direct"),
            StagingMode::Staged => write!(f, "staged"),
        }
    }
}

/// Columns the batch transformer turns into features and a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Mandatory numeric inputs; a row missing one is dropped.
    pub feature_columns: Vec<String>,
    /// Mandatory numeric target.
    pub target_column: String,
    /// Numeric inputs filled with `sentinel` when missing.
    pub optional_columns: Vec<String>,
    pub sentinel: f64,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            feature_columns: Vec::new(),
            target_column: "target".to_string(),
            optional_columns: Vec::new(),
            sentinel: -1.0,
        }
    }
}

impl SchemaConfig {
    pub fn new(target_column: &str) -> Self {
        Self {
            target_column: target_column.to_string(),
            ..Self::default()
        }
    }

    pub fn with_features(mut self, columns: &[&str]) -> Self {
        self.feature_columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_optional(mut self, columns: &[&str], sentinel: f64) -> Self {
        self.optional_columns = columns.iter().map(|c| c.to_string()).collect();
        self.sentinel = sentinel;
        self
    }

    /// Every column the transformer reads, in feature order, target last.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for column in self.feature_columns.iter()
            .chain(self.optional_columns.iter())
            .chain(std::iter::once(&self.target_column))
        {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
        columns
    }
}

/// Simulated hosts offered by the local placement service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub hosts: usize,
    pub slots_per_host: usize,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            hosts: 4,
            slots_per_host: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub staging_mode: StagingMode,
    /// Fraction of each partition used for training.
    pub split_ratio: f64,
    pub seed: u64,
    pub min_rows_per_partition: usize,
    pub worker_threads: usize,
    pub key_column: String,
    pub schema: SchemaConfig,
    pub placement: PlacementConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            staging_mode: StagingMode::Direct,
            split_ratio: 0.75,
            seed: 42,
            min_rows_per_partition: 4,
            worker_threads: num_cpus::get(),
            key_column: "partition".to_string(),
            schema: SchemaConfig::default(),
            placement: PlacementConfig::default(),
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_staging_mode(mut self, mode: StagingMode) -> Self {
        self.staging_mode = mode;
        self
    }

    pub fn with_split_ratio(mut self, ratio: f64) -> Self {
        self.split_ratio = ratio;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_min_rows(mut self, rows: usize) -> Self {
        self.min_rows_per_partition = rows;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    pub fn with_key_column(mut self, column: &str) -> Self {
        self.key_column = column.to_string();
        self
    }

    pub fn with_schema(mut self, schema: SchemaConfig) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_placement(mut self, hosts: usize, slots_per_host: usize) -> Self {
        self.placement = PlacementConfig { hosts, slots_per_host };
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.split_ratio > 0.0 && self.split_ratio < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "split_ratio must be in (0, 1), got {}", self.split_ratio
            )));
        }
        // Both sides of a split need at least one row.
        if self.min_rows_per_partition < 2 {
            return Err(ConfigError::Invalid("min_rows_per_partition must be at least 2".to_string()));
        }
        if self.worker_threads == 0 {
            return Err(ConfigError::Invalid("worker_threads must be greater than 0".to_string()));
        }
        if self.key_column.is_empty() {
            return Err(ConfigError::Invalid("key_column must be set".to_string()));
        }
        if self.schema.target_column.is_empty() {
            return Err(ConfigError::Invalid("schema.target_column must be set".to_string()));
        }
        if !self.schema.sentinel.is_finite() {
            return Err(ConfigError::Invalid("schema.sentinel must be finite".to_string()));
        }
        if self.staging_mode == StagingMode::Staged
            && (self.placement.hosts == 0 || self.placement.slots_per_host == 0)
        {
            return Err(ConfigError::Invalid("staged mode needs at least one host slot".to_string()));
        }
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let ext = path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match ext.to_lowercase().as_str() {
            "json" => {
                let contents = fs::read_to_string(path)?;
                let config: RunConfig = serde_json::from_str(&contents)?;
                config.validate()?;
                Ok(config)
            }
            _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
