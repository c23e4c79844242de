//! Cafe allocation across partitions and categories.
//!
//! Cafe ids follow a modular interleaving scheme: every id owned by
//! partition `p` satisfies `id % M == p`. Within one category the partitions
//! interleave, and each category starts above the largest id handed out to
//! the categories before it, so lower category ids always hold lower cafe
//! ids.
//!
//! ```text
//! M = 5, category 0: partition 0 x3, partition 3 x2
//!
//!   partition 0:  5 10 15
//!   partition 3:    8    13
//!
//! category 1 then starts above 15.
//! ```

use crate::error::GenError;
use crate::store::SyncObjectStore;
use crate::weighted::WeightedChoice;
use loadgen_core::{CafeId, CategoryId, PartitionId, RunConfig};
use rand::Rng;
use std::collections::HashMap;
use tracing::debug;

/// An allocated cafe.
#[derive(Debug)]
pub struct Cafe {
    pub id: CafeId,
    pub partition: PartitionId,
    pub category: CategoryId,
    /// Object ids of recent articles
    store: SyncObjectStore<String>,
}

impl Cafe {
    fn new(id: CafeId, partition: PartitionId, category: CategoryId) -> Self {
        Self {
            id,
            partition,
            category,
            store: SyncObjectStore::new(),
        }
    }

    /// Auxiliary per-cafe store.
    pub fn store(&self) -> &SyncObjectStore<String> {
        &self.store
    }
}

/// Contiguous id run of one (partition, category) cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellAllocation {
    pub category: CategoryId,
    pub partition: PartitionId,
    /// First id; the others follow at a stride of M
    pub start_id: CafeId,
    pub count: u64,
}

impl CellAllocation {
    /// Id of the slot at `index`.
    pub fn id_at(&self, index: u64, modulus: u64) -> CafeId {
        self.start_id + modulus * index
    }
}

#[derive(Debug)]
struct CategoryCells {
    /// Indices into `CafeAllocator::cells`
    cells: WeightedChoice<usize>,
}

/// Next id above `curr` congruent to `target` modulo `modulus`, skipping at
/// least one full stride.
pub fn next_id(curr: u64, target: u64, modulus: u64) -> u64 {
    let gap = (target % modulus + modulus - curr % modulus) % modulus;
    curr + modulus + gap
}

/// Allocates cafes once per run and serves weighted random selection.
#[derive(Debug)]
pub struct CafeAllocator {
    modulus: u64,
    cafes: Vec<Cafe>,
    lookup: HashMap<CafeId, usize>,
    cells: Vec<CellAllocation>,
    categories: WeightedChoice<CategoryCells>,
}

impl CafeAllocator {
    /// Allocate every cafe described by the configuration.
    pub fn from_config(config: &RunConfig) -> Result<Self, GenError> {
        let modulus = config.id_modulus;
        let mut categories: Vec<_> = config.categories.iter().collect();
        categories.sort_by_key(|c| c.id);

        let mut allocator = Self {
            modulus,
            cafes: Vec::with_capacity(config.total_cafes() as usize),
            lookup: HashMap::with_capacity(config.total_cafes() as usize),
            cells: Vec::new(),
            categories: WeightedChoice::new(),
        };

        let mut base = 0;
        for category in categories {
            let mut highest = base;
            let mut cells = WeightedChoice::new();

            for partition in &config.partitions {
                let count = partition.cells.get(&category.id).copied().unwrap_or(0);
                if count == 0 {
                    continue;
                }

                let target = u64::from(partition.id);
                let mut curr = base;
                let mut start_id = 0;
                for slot in 0..count {
                    curr = next_id(curr, target, modulus);
                    if slot == 0 {
                        start_id = curr;
                    }
                    allocator.register(Cafe::new(curr, partition.id, category.id));
                }
                highest = highest.max(curr);

                cells.add(category.comment_weight * count as f64, allocator.cells.len())?;
                allocator.cells.push(CellAllocation {
                    category: category.id,
                    partition: partition.id,
                    start_id,
                    count,
                });
            }

            if cells.total_weight() > 0.0 {
                debug!(
                    "Category {} holds {} cells with weight {}",
                    category.id,
                    cells.len(),
                    cells.total_weight()
                );
                allocator
                    .categories
                    .add(cells.total_weight(), CategoryCells { cells })?;
            }
            base = highest;
        }

        Ok(allocator)
    }

    fn register(&mut self, cafe: Cafe) {
        self.lookup.insert(cafe.id, self.cafes.len());
        self.cafes.push(cafe);
    }

    /// Draw a cafe: category first, then a partition cell, then a slot.
    pub fn choose_cafe<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&Cafe, GenError> {
        let category = self.categories.choose(rng)?;
        let cell = &self.cells[*category.cells.choose(rng)?];
        let slot = rng.gen_range(0..cell.count);
        self.resolve(cell.id_at(slot, self.modulus))
    }

    /// Look up a cafe by id.
    pub fn resolve(&self, id: CafeId) -> Result<&Cafe, GenError> {
        self.lookup
            .get(&id)
            .map(|&index| &self.cafes[index])
            .ok_or(GenError::UnknownCafe(id))
    }

    /// All cafes in allocation order.
    pub fn cafes(&self) -> &[Cafe] {
        &self.cafes
    }

    /// Per-cell allocation plan, in allocation order.
    pub fn plan(&self) -> &[CellAllocation] {
        &self.cells
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    pub fn len(&self) -> usize {
        self.cafes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cafes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeMap;

    fn config(yaml_cells: &str, modulus: u64) -> RunConfig {
        let yaml = format!(
            r#"
start_time: "2024-01-01T00:00:00Z"
target_comments: 10
id_modulus: {modulus}
article_gap: {{ type: static, value: 1000 }}
comment_gap: {{ type: static, value: 100 }}
categories:
  - id: 0
    comment_weight: 1.0
  - id: 1
    comment_weight: 3.0
partitions:
{yaml_cells}
"#
        );
        RunConfig::from_yaml(&yaml).unwrap()
    }

    #[test]
    fn test_next_id() {
        assert_eq!(next_id(0, 0, 5), 5);
        assert_eq!(next_id(0, 3, 5), 8);
        assert_eq!(next_id(8, 3, 5), 13);
        assert_eq!(next_id(13, 0, 5), 20);
        assert_eq!(next_id(7, 1, 4), 13);
    }

    #[test]
    fn test_two_partitions_one_cafe_each() {
        let config = config(
            "  - id: 0\n    cells: { 0: 1 }\n  - id: 3\n    cells: { 0: 1 }\n",
            5,
        );
        let allocator = CafeAllocator::from_config(&config).unwrap();

        let ids: Vec<_> = allocator.cafes().iter().map(|c| (c.id, c.partition)).collect();
        assert_eq!(ids, vec![(5, 0), (8, 3)]);
    }

    #[test]
    fn test_ids_identify_partition() {
        let config = config(
            "  - id: 0\n    cells: { 0: 7, 1: 2 }\n  - id: 2\n    cells: { 0: 3, 1: 5 }\n  - id: 5\n    cells: { 1: 4 }\n",
            6,
        );
        let allocator = CafeAllocator::from_config(&config).unwrap();
        assert_eq!(allocator.len(), 21);

        for cafe in allocator.cafes() {
            assert_eq!(cafe.id % 6, u64::from(cafe.partition));
            let resolved = allocator.resolve(cafe.id).unwrap();
            assert_eq!(resolved.partition, cafe.partition);
            assert_eq!(resolved.category, cafe.category);
        }

        for cell in allocator.plan() {
            for slot in 0..cell.count {
                let cafe = allocator.resolve(cell.id_at(slot, 6)).unwrap();
                assert_eq!((cafe.partition, cafe.category), (cell.partition, cell.category));
            }
        }
    }

    #[test]
    fn test_lower_categories_get_lower_ids() {
        let config = config(
            "  - id: 1\n    cells: { 0: 4, 1: 4 }\n  - id: 2\n    cells: { 0: 6, 1: 1 }\n",
            4,
        );
        let allocator = CafeAllocator::from_config(&config).unwrap();

        let max_cat0 = allocator
            .cafes()
            .iter()
            .filter(|c| c.category == 0)
            .map(|c| c.id)
            .max()
            .unwrap();
        let min_cat1 = allocator
            .cafes()
            .iter()
            .filter(|c| c.category == 1)
            .map(|c| c.id)
            .min()
            .unwrap();
        assert!(max_cat0 < min_cat1);
    }

    #[test]
    fn test_unknown_cafe() {
        let config = config("  - id: 0\n    cells: { 0: 1 }\n", 5);
        let allocator = CafeAllocator::from_config(&config).unwrap();
        assert!(matches!(allocator.resolve(6), Err(GenError::UnknownCafe(6))));
    }

    #[test]
    fn test_choose_follows_weights() {
        // category 0: 10 cafes x weight 1; category 1: 10 cafes x weight 3
        let config = config(
            "  - id: 0\n    cells: { 0: 10 }\n  - id: 1\n    cells: { 1: 10 }\n",
            2,
        );
        let allocator = CafeAllocator::from_config(&config).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let mut per_category: BTreeMap<CategoryId, u32> = BTreeMap::new();
        for _ in 0..4000 {
            let cafe = allocator.choose_cafe(&mut rng).unwrap();
            *per_category.entry(cafe.category).or_default() += 1;
        }
        let heavy = per_category[&1];
        assert!((2_800..3_200).contains(&heavy), "category 1 drawn {heavy} times");
    }

    #[test]
    fn test_zero_weight_category_is_skipped() {
        let mut config = config(
            "  - id: 0\n    cells: { 0: 2 }\n  - id: 1\n    cells: { 1: 2 }\n",
            2,
        );
        config.categories[1].comment_weight = 0.0;
        let allocator = CafeAllocator::from_config(&config).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(allocator.len(), 4);
        for _ in 0..100 {
            assert_eq!(allocator.choose_cafe(&mut rng).unwrap().category, 0);
        }
    }
}
