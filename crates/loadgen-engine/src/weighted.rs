//! Cumulative-distribution discrete sampler.

use rand::Rng;

/// Errors raised by [`WeightedChoice`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChoiceError {
    #[error("Weighted choice has no alternatives")]
    Empty,

    #[error("Weight {0} is not a finite non-negative number")]
    InvalidWeight(f64),

    /// Every alternative has weight zero
    #[error("Weighted choice has zero total weight")]
    ZeroTotal,
}

/// Picks among weighted alternatives.
///
/// Append-only. Each `add` recomputes the cumulative table and pins its last
/// entry to exactly 1.0 so floating-point drift can never leave a draw
/// unmatched.
#[derive(Debug, Clone)]
pub struct WeightedChoice<T> {
    values: Vec<T>,
    weights: Vec<f64>,
    cumulative: Vec<f64>,
    total: f64,
}

impl<T> Default for WeightedChoice<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WeightedChoice<T> {
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            weights: Vec::new(),
            cumulative: Vec::new(),
            total: 0.0,
        }
    }

    /// Append an alternative.
    pub fn add(&mut self, weight: f64, value: T) -> Result<(), ChoiceError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ChoiceError::InvalidWeight(weight));
        }

        self.values.push(value);
        self.weights.push(weight);
        self.total += weight;
        self.rebuild();
        Ok(())
    }

    fn rebuild(&mut self) {
        self.cumulative.clear();
        if self.total <= 0.0 {
            return;
        }

        let mut running = 0.0;
        for weight in &self.weights {
            running += weight;
            self.cumulative.push(running / self.total);
        }
        if let Some(last) = self.cumulative.last_mut() {
            *last = 1.0;
        }
    }

    /// Draw an alternative.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&T, ChoiceError> {
        let index = self.choose_index(rng)?;
        Ok(&self.values[index])
    }

    /// Draw the index of an alternative.
    pub fn choose_index<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<usize, ChoiceError> {
        let draw: f64 = rng.gen();
        self.index_for(draw)
    }

    /// Index of the first cumulative entry at or above `draw`.
    ///
    /// Zero-weight alternatives own an empty interval and are never returned.
    pub fn index_for(&self, draw: f64) -> Result<usize, ChoiceError> {
        if self.values.is_empty() {
            return Err(ChoiceError::Empty);
        }
        if self.cumulative.is_empty() {
            return Err(ChoiceError::ZeroTotal);
        }

        let positive = |i: &usize| self.weights[*i] > 0.0;
        let found = (0..self.cumulative.len())
            .filter(positive)
            .find(|&i| self.cumulative[i] >= draw)
            .or_else(|| (0..self.cumulative.len()).rev().find(positive));
        found.ok_or(ChoiceError::ZeroTotal)
    }

    /// Sum of all weights.
    pub fn total_weight(&self) -> f64 {
        self.total
    }

    /// Cumulative probability table.
    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Alternatives in insertion order.
    pub fn values(&self) -> &[T] {
        &self.values
    }
}
