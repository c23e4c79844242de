//! Value samplers backing the scoped sample registries.
//!
//! A [`Sampler`] is built from a [`SamplerConfig`] and owns its own seeded
//! RNG. Draws go through `&self` so one sampler can be shared by several
//! schedulers; the RNG and any running index sit behind a mutex.

pub mod numeric;
pub mod pattern;
pub mod static_value;

use loadgen_core::SamplerConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Exp, Normal, Poisson};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Raw value drawn from a sampler.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SampleValue {
    /// Name of the value kind, used in type mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
        }
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get this value as an i64. Floats are rounded.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.is_finite() => Some(f.round() as i64),
            _ => None,
        }
    }

    /// Try to get this value as an f64. Integers widen.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get this value as a string.
    pub fn into_string(self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Error building a sampler from its configuration.
#[derive(Debug, thiserror::Error)]
#[error("Invalid parameters for sampler '{key}': {reason}")]
pub struct SamplerBuildError {
    pub key: String,
    pub reason: String,
}

/// Resolved distribution of a sampler.
#[derive(Debug)]
enum Distribution {
    Constant(SampleValue),
    IntRange { min: i64, max: i64 },
    FloatRange { min: f64, max: f64 },
    Gaussian(Normal<f64>),
    Poisson(Poisson<f64>),
    Exponential(Exp<f64>),
    Bool(f64),
    Counter { start: i64, step: i64 },
    UniqueString { pattern: String },
}

#[derive(Debug)]
struct SamplerState {
    rng: StdRng,
    /// Number of values drawn so far
    index: u64,
}

/// A seeded, shareable value source.
#[derive(Debug)]
pub struct Sampler {
    distribution: Distribution,
    /// Substituted for `{partition}` in unique string patterns
    scope_label: String,
    state: Mutex<SamplerState>,
}

impl Sampler {
    /// Build a sampler.
    ///
    /// `scope_label` names the registry scope (e.g. the partition id) and is
    /// only used by pattern placeholders; `seed` should already be mixed
    /// with the scope and key, see [`derive_seed`].
    pub fn from_config(
        key: &str,
        config: &SamplerConfig,
        scope_label: impl Into<String>,
        seed: u64,
    ) -> Result<Self, SamplerBuildError> {
        let build_error = |reason: String| SamplerBuildError {
            key: key.to_string(),
            reason,
        };

        let distribution = match config {
            SamplerConfig::Static { value } => {
                Distribution::Constant(static_value::yaml_to_sample_value(value).ok_or_else(
                    || build_error("static value must be a bool, number or string".to_string()),
                )?)
            }
            SamplerConfig::IntRange { min, max } => {
                if min > max {
                    return Err(build_error(format!("min {min} exceeds max {max}")));
                }
                Distribution::IntRange {
                    min: *min,
                    max: *max,
                }
            }
            SamplerConfig::FloatRange { min, max } => {
                if !(min <= max) {
                    return Err(build_error(format!("min {min} exceeds max {max}")));
                }
                Distribution::FloatRange {
                    min: *min,
                    max: *max,
                }
            }
            SamplerConfig::Gaussian { mean, std_dev } => Distribution::Gaussian(
                Normal::new(*mean, *std_dev).map_err(|e| build_error(e.to_string()))?,
            ),
            SamplerConfig::Poisson { mean } => Distribution::Poisson(
                Poisson::new(*mean).map_err(|e| build_error(e.to_string()))?,
            ),
            SamplerConfig::Exponential { mean } => {
                if !(*mean > 0.0) {
                    return Err(build_error(format!("mean {mean} must be positive")));
                }
                Distribution::Exponential(
                    Exp::new(1.0 / mean).map_err(|e| build_error(e.to_string()))?,
                )
            }
            SamplerConfig::WeightedBool { true_weight } => {
                if !(0.0..=1.0).contains(true_weight) {
                    return Err(build_error(format!(
                        "true_weight {true_weight} outside 0.0..=1.0"
                    )));
                }
                Distribution::Bool(*true_weight)
            }
            SamplerConfig::Counter { start, step } => Distribution::Counter {
                start: *start,
                step: *step,
            },
            SamplerConfig::UniqueString { pattern } => Distribution::UniqueString {
                pattern: pattern.clone(),
            },
        };

        Ok(Self {
            distribution,
            scope_label: scope_label.into(),
            state: Mutex::new(SamplerState {
                rng: StdRng::seed_from_u64(seed),
                index: 0,
            }),
        })
    }

    /// Draw the next value.
    pub fn next_value(&self) -> SampleValue {
        let mut state = self.lock();
        let index = state.index;
        state.index += 1;
        let rng = &mut state.rng;

        match &self.distribution {
            Distribution::Constant(value) => value.clone(),
            Distribution::IntRange { min, max } => numeric::int_range(rng, *min, *max),
            Distribution::FloatRange { min, max } => numeric::float_range(rng, *min, *max),
            Distribution::Gaussian(normal) => numeric::sample_float(rng, normal),
            Distribution::Poisson(poisson) => numeric::sample_count(rng, poisson),
            Distribution::Exponential(exp) => numeric::sample_float(rng, exp),
            Distribution::Bool(p) => SampleValue::Bool(rng.gen_bool(*p)),
            Distribution::Counter { start, step } => {
                numeric::counter(*start, *step, index)
            }
            Distribution::UniqueString { pattern } => {
                pattern::unique_string(pattern, rng, &self.scope_label, index)
            }
        }
    }

    /// Number of values drawn so far.
    pub fn draws(&self) -> u64 {
        self.lock().index
    }

    fn lock(&self) -> MutexGuard<'_, SamplerState> {
        // A panic mid-draw cannot leave the RNG in an invalid state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Mix the run seed with a registry scope and key into a sampler seed.
///
/// Each sampler gets an independent stream, so adding a sampler never
/// shifts the values drawn by another.
pub fn derive_seed(base_seed: u64, scope: &str, key: &str) -> u64 {
    let mut h: u64 = base_seed ^ 0xcbf2_9ce4_8422_2325;
    for b in scope.bytes().chain([0xff]).chain(key.bytes()) {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x0100_0000_01b3);
    }
    h = (h ^ (h >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    h ^ (h >> 31)
}
