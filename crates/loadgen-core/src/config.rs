//! Run configuration for the cafe load generator.
//!
//! A run is described by a single YAML document:
//!
//! - global run parameters (seed, start time, comment target, id modulus)
//! - arrival-gap samplers for articles and comments
//! - scoped sampler registries (global, per-partition template, per-category)
//! - categories with their comment weights
//! - partitions with their per-category cafe counts
//! - the output sinks to instantiate, by logical name

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::{CategoryId, PartitionId};

// ============================================================================
// Error Types
// ============================================================================

/// Error type for configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error reading configuration file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("id_modulus must be greater than zero")]
    ZeroModulus,

    /// Partition id is not a valid residue of the modulus
    #[error("Partition {partition} is out of range for id_modulus {modulus}")]
    PartitionOutOfRange { partition: PartitionId, modulus: u64 },

    #[error("Partition {0} is declared more than once")]
    DuplicatePartition(PartitionId),

    #[error("Category {0} is declared more than once")]
    DuplicateCategory(CategoryId),

    /// A partition cell references an undeclared category
    #[error("Partition {partition} references unknown category {category}")]
    UnknownCategory {
        partition: PartitionId,
        category: CategoryId,
    },

    #[error("Category {category} has invalid comment_weight {weight}")]
    InvalidWeight { category: CategoryId, weight: f64 },

    #[error("Configuration allocates no cafes")]
    NoCafes,

    /// Sampler parameters out of range
    #[error("Sampler '{key}' is invalid: {reason}")]
    InvalidSampler { key: String, reason: String },
}

// ============================================================================
// Sampler configuration
// ============================================================================

/// Sampler definition.
///
/// The `type` field selects the distribution; remaining fields are its
/// parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SamplerConfig {
    /// Always the same value
    Static {
        /// Scalar value (bool, number or string)
        value: serde_yaml::Value,
    },

    /// Uniform integers in a range
    IntRange {
        /// Minimum value (inclusive)
        min: i64,
        /// Maximum value (inclusive)
        max: i64,
    },

    /// Uniform floats in a range
    FloatRange {
        /// Minimum value (inclusive)
        min: f64,
        /// Maximum value (inclusive)
        max: f64,
    },

    /// Normally distributed floats
    Gaussian { mean: f64, std_dev: f64 },

    /// Poisson distributed integers
    Poisson { mean: f64 },

    /// Exponentially distributed floats with the given mean
    Exponential { mean: f64 },

    /// Boolean with configurable true probability
    WeightedBool {
        /// Probability of `true` (0.0 to 1.0)
        true_weight: f64,
    },

    /// Monotonic integer counter
    Counter {
        #[serde(default = "default_counter_start")]
        start: i64,
        #[serde(default = "default_counter_step")]
        step: i64,
    },

    /// Unique strings built from a pattern
    ///
    /// Supports `{partition}`, `{index}`, `{rand:N}` and `{uuid}`.
    /// Uniqueness comes from `{index}`, which is required.
    UniqueString { pattern: String },
}

fn default_counter_start() -> i64 {
    1
}

fn default_counter_step() -> i64 {
    1
}

impl SamplerConfig {
    /// Check the sampler parameters.
    pub fn validate(&self, key: &str) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::InvalidSampler {
                key: key.to_string(),
                reason: reason.to_string(),
            })
        };

        match self {
            SamplerConfig::Static { value } => match value {
                serde_yaml::Value::Bool(_)
                | serde_yaml::Value::Number(_)
                | serde_yaml::Value::String(_) => Ok(()),
                _ => invalid("static value must be a bool, number or string"),
            },
            SamplerConfig::IntRange { min, max } if min > max => invalid("min exceeds max"),
            SamplerConfig::FloatRange { min, max } if !min.is_finite() || !max.is_finite() => {
                invalid("min and max must be finite")
            }
            SamplerConfig::FloatRange { min, max } if !(min <= max) => {
                invalid("min exceeds max")
            }
            SamplerConfig::FloatRange { min, max } if !(max - min).is_finite() => {
                invalid("range is too wide")
            }
            SamplerConfig::Gaussian { mean, std_dev } if !mean.is_finite() || !(*std_dev >= 0.0) => {
                invalid("mean must be finite and std_dev non-negative")
            }
            SamplerConfig::Poisson { mean } | SamplerConfig::Exponential { mean }
                if !(*mean > 0.0) || !mean.is_finite() =>
            {
                invalid("mean must be positive")
            }
            SamplerConfig::WeightedBool { true_weight } if !(0.0..=1.0).contains(true_weight) => {
                invalid("true_weight must be within 0.0..=1.0")
            }
            SamplerConfig::Counter { step, .. } if *step == 0 => invalid("step must be non-zero"),
            SamplerConfig::UniqueString { pattern } if !pattern.contains("{index}") => {
                invalid("pattern must contain {index}")
            }
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Entities
// ============================================================================

/// Category ("cafe type") definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub id: CategoryId,

    /// Comment size factor; scales this category's cells in cafe selection
    #[serde(default = "default_comment_weight")]
    pub comment_weight: f64,

    /// Category-scoped samplers (e.g. `reply_count`)
    #[serde(default)]
    pub samplers: BTreeMap<String, SamplerConfig>,
}

fn default_comment_weight() -> f64 {
    1.0
}

/// Partition ("table") definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionConfig {
    /// Residue shared by every cafe id in this partition
    pub id: PartitionId,

    /// Cafe count per category
    #[serde(default)]
    pub cells: BTreeMap<CategoryId, u64>,

    /// Overrides for entries of the partition sampler template
    #[serde(default)]
    pub samplers: BTreeMap<String, SamplerConfig>,
}

/// Output sink to instantiate, selected by logical name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    /// Delimited load files
    Csv {
        #[serde(default = "default_delimiter")]
        delimiter: char,
        #[serde(default = "default_header")]
        header: bool,
        /// Text written for null fields
        #[serde(default)]
        null_token: String,
    },

    /// JSON lines
    Jsonl,
}

fn default_delimiter() -> char {
    ','
}

fn default_header() -> bool {
    true
}

impl SinkConfig {
    /// Logical name of the sink implementation.
    pub fn name(&self) -> &'static str {
        match self {
            SinkConfig::Csv { .. } => "csv",
            SinkConfig::Jsonl => "jsonl",
        }
    }
}

// ============================================================================
// Run configuration
// ============================================================================

/// Complete run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Base seed for every sampler and scheduler RNG
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Virtual time of the first events
    pub start_time: DateTime<Utc>,

    /// Total number of comments the run may produce
    pub target_comments: u64,

    /// Modulus M of the cafe id scheme
    pub id_modulus: u64,

    /// Slots per cafe auxiliary store before new entries replace old ones
    #[serde(default = "default_store_capacity")]
    pub cafe_store_capacity: usize,

    /// Gap between consecutive articles, in milliseconds
    pub article_gap: SamplerConfig,

    /// Gap between consecutive comments of one article, in milliseconds
    pub comment_gap: SamplerConfig,

    #[serde(default)]
    pub global_samplers: BTreeMap<String, SamplerConfig>,

    /// Template instantiated once per partition
    #[serde(default = "default_partition_samplers")]
    pub partition_samplers: BTreeMap<String, SamplerConfig>,

    pub categories: Vec<CategoryConfig>,

    pub partitions: Vec<PartitionConfig>,

    #[serde(default = "default_sinks")]
    pub sinks: Vec<SinkConfig>,
}

fn default_seed() -> u64 {
    42
}

fn default_store_capacity() -> usize {
    16
}

fn default_partition_samplers() -> BTreeMap<String, SamplerConfig> {
    let counter = SamplerConfig::Counter {
        start: default_counter_start(),
        step: default_counter_step(),
    };
    BTreeMap::from([
        ("ticket_no".to_string(), counter.clone()),
        ("comment_no".to_string(), counter),
        (
            "object_id".to_string(),
            SamplerConfig::UniqueString {
                pattern: "{partition}-{index}".to_string(),
            },
        ),
    ])
}

fn default_sinks() -> Vec<SinkConfig> {
    vec![SinkConfig::Csv {
        delimiter: default_delimiter(),
        header: default_header(),
        null_token: String::new(),
    }]
}

impl RunConfig {
    /// Load and validate a configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id_modulus == 0 {
            return Err(ConfigError::ZeroModulus);
        }

        let mut categories = BTreeSet::new();
        for category in &self.categories {
            if !categories.insert(category.id) {
                return Err(ConfigError::DuplicateCategory(category.id));
            }
            if !category.comment_weight.is_finite() || category.comment_weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    category: category.id,
                    weight: category.comment_weight,
                });
            }
            for (key, sampler) in &category.samplers {
                sampler.validate(key)?;
            }
        }

        let mut partitions = BTreeSet::new();
        for partition in &self.partitions {
            if u64::from(partition.id) >= self.id_modulus {
                return Err(ConfigError::PartitionOutOfRange {
                    partition: partition.id,
                    modulus: self.id_modulus,
                });
            }
            if !partitions.insert(partition.id) {
                return Err(ConfigError::DuplicatePartition(partition.id));
            }
            if let Some(category) = partition.cells.keys().find(|c| !categories.contains(c)) {
                return Err(ConfigError::UnknownCategory {
                    partition: partition.id,
                    category: *category,
                });
            }
            for (key, sampler) in &partition.samplers {
                sampler.validate(key)?;
            }
        }

        if self.total_cafes() == 0 {
            return Err(ConfigError::NoCafes);
        }

        self.article_gap.validate("article_gap")?;
        self.comment_gap.validate("comment_gap")?;
        for (key, sampler) in self.global_samplers.iter().chain(&self.partition_samplers) {
            sampler.validate(key)?;
        }

        Ok(())
    }

    /// Total number of cafes across all cells.
    pub fn total_cafes(&self) -> u64 {
        self.partitions
            .iter()
            .flat_map(|p| p.cells.values())
            .sum()
    }

    /// Get a category by id.
    pub fn category(&self, id: CategoryId) -> Option<&CategoryConfig> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Partition samplers for one partition: the template with the
    /// partition's overrides applied.
    pub fn samplers_for_partition(
        &self,
        partition: &PartitionConfig,
    ) -> BTreeMap<String, SamplerConfig> {
        let mut samplers = self.partition_samplers.clone();
        samplers.extend(partition.samplers.clone());
        samplers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
seed: 7
start_time: "2024-01-01T00:00:00Z"
target_comments: 1000
id_modulus: 5
article_gap: { type: exponential, mean: 60000 }
comment_gap: { type: poisson, mean: 3000 }
global_samplers:
  reply_probability: { type: weighted_bool, true_weight: 0.5 }
categories:
  - id: 0
    comment_weight: 2.0
    samplers:
      reply_count: { type: gaussian, mean: 4, std_dev: 1 }
  - id: 1
partitions:
  - id: 0
    cells: { 0: 3, 1: 2 }
  - id: 3
    cells: { 0: 1 }
    samplers:
      object_id: { type: unique_string, pattern: "p3-{index}" }
sinks:
  - type: csv
    delimiter: "|"
  - type: jsonl
"#
    }

    #[test]
    fn test_parse_config() {
        let config = RunConfig::from_yaml(sample_yaml()).unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.id_modulus, 5);
        assert_eq!(config.total_cafes(), 6);
        assert_eq!(config.cafe_store_capacity, 16);
        assert_eq!(config.category(1).unwrap().comment_weight, 1.0);
        assert_eq!(config.sinks.len(), 2);
        assert_eq!(
            config.sinks[0],
            SinkConfig::Csv {
                delimiter: '|',
                header: true,
                null_token: String::new()
            }
        );
        assert_eq!(config.sinks[1].name(), "jsonl");
    }

    #[test]
    fn test_partition_template_override() {
        let config = RunConfig::from_yaml(sample_yaml()).unwrap();

        let p0 = config.samplers_for_partition(&config.partitions[0]);
        assert_eq!(p0.len(), 3);
        assert!(matches!(
            p0.get("object_id"),
            Some(SamplerConfig::UniqueString { pattern }) if pattern == "{partition}-{index}"
        ));

        let p3 = config.samplers_for_partition(&config.partitions[1]);
        assert!(matches!(
            p3.get("object_id"),
            Some(SamplerConfig::UniqueString { pattern }) if pattern == "p3-{index}"
        ));
        assert!(matches!(
            p3.get("comment_no"),
            Some(SamplerConfig::Counter { start: 1, step: 1 })
        ));
    }

    #[test]
    fn test_partition_out_of_range() {
        let yaml = sample_yaml().replace("- id: 3", "- id: 5");
        let result = RunConfig::from_yaml(&yaml);
        assert!(matches!(
            result,
            Err(ConfigError::PartitionOutOfRange {
                partition: 5,
                modulus: 5
            })
        ));
    }

    #[test]
    fn test_unknown_category() {
        let yaml = sample_yaml().replace("cells: { 0: 1 }", "cells: { 9: 1 }");
        let result = RunConfig::from_yaml(&yaml);
        assert!(matches!(
            result,
            Err(ConfigError::UnknownCategory {
                partition: 3,
                category: 9
            })
        ));
    }

    #[test]
    fn test_no_cafes() {
        let yaml = sample_yaml()
            .replace("cells: { 0: 3, 1: 2 }", "cells: {}")
            .replace("cells: { 0: 1 }", "cells: { 0: 0 }");
        assert!(matches!(
            RunConfig::from_yaml(&yaml),
            Err(ConfigError::NoCafes)
        ));
    }

    #[test]
    fn test_invalid_sampler() {
        let yaml = sample_yaml().replace("true_weight: 0.5", "true_weight: 1.5");
        let result = RunConfig::from_yaml(&yaml);
        assert!(
            matches!(result, Err(ConfigError::InvalidSampler { ref key, .. }) if key == "reply_probability")
        );

        let unique = SamplerConfig::UniqueString {
            pattern: "no-index".to_string(),
        };
        assert!(unique.validate("object_id").is_err());
    }

    #[test]
    fn test_float_range_needs_finite_bounds() {
        let unbounded: SamplerConfig =
            serde_yaml::from_str("{ type: float_range, min: -.inf, max: 1.0 }").unwrap();
        assert!(unbounded.validate("gap").is_err());

        let too_wide = SamplerConfig::FloatRange {
            min: -f64::MAX,
            max: f64::MAX,
        };
        assert!(too_wide.validate("gap").is_err());

        let ok = SamplerConfig::FloatRange { min: -1.0, max: 1.0 };
        assert!(ok.validate("gap").is_ok());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("run.yaml");
        fs::write(&path, sample_yaml()).unwrap();

        let config = RunConfig::from_file(&path).unwrap();
        assert_eq!(config.partitions.len(), 2);

        let missing = RunConfig::from_file(dir.path().join("missing.yaml"));
        assert!(matches!(missing, Err(ConfigError::IoError(_))));
    }
}
