//! Scoped sample registries and the facade the entities draw from.
//!
//! ```text
//! SampleContext
//!   ├── CafeAllocator
//!   ├── global registry          reply_probability, ...
//!   ├── partition registries     ticket_no, comment_no, object_id, ...
//!   └── category registries      reply_count, ...
//! ```

use crate::allocator::{Cafe, CafeAllocator};
use crate::error::{GenError, SampleError, SampleScope};
use crate::samplers::{derive_seed, SampleValue, Sampler};
use loadgen_core::{CategoryId, PartitionId, RunConfig, SamplerConfig};
use rand::Rng;
use std::collections::{BTreeMap, HashMap};

/// Samplers of one scope, by key.
#[derive(Debug)]
pub struct SampleRegistry {
    scope: SampleScope,
    samplers: HashMap<String, Sampler>,
}

impl SampleRegistry {
    /// Build every sampler of a scope.
    ///
    /// `label` is substituted for `{partition}` in unique string patterns.
    pub fn build(
        scope: SampleScope,
        configs: &BTreeMap<String, SamplerConfig>,
        base_seed: u64,
        label: &str,
    ) -> Result<Self, GenError> {
        let scope_name = scope.to_string();
        let samplers = configs
            .iter()
            .map(|(key, config)| {
                let seed = derive_seed(base_seed, &scope_name, key);
                Sampler::from_config(key, config, label, seed).map(|s| (key.clone(), s))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(Self { scope, samplers })
    }

    /// Get a sampler by key.
    pub fn get(&self, key: &str) -> Result<&Sampler, SampleError> {
        self.samplers
            .get(key)
            .ok_or_else(|| SampleError::KeyNotFound {
                scope: self.scope.clone(),
                key: key.to_string(),
            })
    }

    pub fn next_value(&self, key: &str) -> Result<SampleValue, SampleError> {
        Ok(self.get(key)?.next_value())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.samplers.contains_key(key)
    }

    pub fn scope(&self) -> &SampleScope {
        &self.scope
    }
}

/// Cafe allocator plus the global, per-partition and per-category
/// registries.
#[derive(Debug)]
pub struct SampleContext {
    allocator: CafeAllocator,
    global: SampleRegistry,
    partitions: HashMap<PartitionId, SampleRegistry>,
    categories: HashMap<CategoryId, SampleRegistry>,
}

impl SampleContext {
    /// Allocate cafes and build every registry described by the configuration.
    pub fn from_config(config: &RunConfig) -> Result<Self, GenError> {
        let allocator = CafeAllocator::from_config(config)?;

        let global = SampleRegistry::build(
            SampleScope::Global,
            &config.global_samplers,
            config.seed,
            "",
        )?;

        let partitions = config
            .partitions
            .iter()
            .map(|partition| {
                SampleRegistry::build(
                    SampleScope::Partition(partition.id),
                    &config.samplers_for_partition(partition),
                    config.seed,
                    &partition.id.to_string(),
                )
                .map(|registry| (partition.id, registry))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        let categories = config
            .categories
            .iter()
            .map(|category| {
                SampleRegistry::build(
                    SampleScope::Category(category.id),
                    &category.samplers,
                    config.seed,
                    &category.id.to_string(),
                )
                .map(|registry| (category.id, registry))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(Self {
            allocator,
            global,
            partitions,
            categories,
        })
    }

    pub fn allocator(&self) -> &CafeAllocator {
        &self.allocator
    }

    /// Draw a cafe through the allocator.
    pub fn choose_cafe<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&Cafe, GenError> {
        self.allocator.choose_cafe(rng)
    }

    /// Registry of a scope.
    pub fn registry(&self, scope: &SampleScope) -> Result<&SampleRegistry, SampleError> {
        let registry = match scope {
            SampleScope::Global => Some(&self.global),
            SampleScope::Partition(p) => self.partitions.get(p),
            SampleScope::Category(c) => self.categories.get(c),
        };
        registry.ok_or_else(|| SampleError::ScopeNotFound(scope.clone()))
    }

    pub fn next_value(&self, scope: &SampleScope, key: &str) -> Result<SampleValue, SampleError> {
        self.registry(scope)?.next_value(key)
    }

    pub fn next_int(&self, scope: &SampleScope, key: &str) -> Result<i64, SampleError> {
        self.typed(scope, key, "int", |v| v.as_i64())
    }

    pub fn next_float(&self, scope: &SampleScope, key: &str) -> Result<f64, SampleError> {
        self.typed(scope, key, "float", |v| v.as_f64())
    }

    pub fn next_bool(&self, scope: &SampleScope, key: &str) -> Result<bool, SampleError> {
        self.typed(scope, key, "bool", |v| v.as_bool())
    }

    pub fn next_string(&self, scope: &SampleScope, key: &str) -> Result<String, SampleError> {
        self.typed(scope, key, "text", SampleValue::into_string)
    }

    fn typed<T>(
        &self,
        scope: &SampleScope,
        key: &str,
        expected: &'static str,
        convert: impl FnOnce(SampleValue) -> Option<T>,
    ) -> Result<T, SampleError> {
        let value = self.next_value(scope, key)?;
        let actual = value.kind();
        convert(value).ok_or_else(|| SampleError::TypeMismatch {
            scope: scope.clone(),
            key: key.to_string(),
            expected,
            actual,
        })
    }
}
