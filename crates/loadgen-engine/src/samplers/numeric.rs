//! Numeric value samplers.

use super::SampleValue;
use rand::Rng;
use rand_distr::Distribution;

/// Draw a random integer in the given range (inclusive).
pub fn int_range<R: Rng>(rng: &mut R, min: i64, max: i64) -> SampleValue {
    SampleValue::Int(rng.gen_range(min..=max))
}

/// Draw a random float in the given range (inclusive).
pub fn float_range<R: Rng>(rng: &mut R, min: f64, max: f64) -> SampleValue {
    SampleValue::Float(rng.gen_range(min..=max))
}

/// Draw a float from a continuous distribution.
pub fn sample_float<R: Rng, D: Distribution<f64>>(rng: &mut R, dist: &D) -> SampleValue {
    SampleValue::Float(dist.sample(rng))
}

/// Draw a count from a discrete distribution that reports counts as floats.
pub fn sample_count<R: Rng, D: Distribution<f64>>(rng: &mut R, dist: &D) -> SampleValue {
    SampleValue::Int(dist.sample(rng) as i64)
}

/// Value of a counter after `index` previous draws.
pub fn counter(start: i64, step: i64, index: u64) -> SampleValue {
    SampleValue::Int(start.wrapping_add(step.wrapping_mul(index as i64)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::Poisson;

    #[test]
    fn test_int_range() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            match int_range(&mut rng, 10, 20) {
                SampleValue::Int(v) => assert!((10..=20).contains(&v)),
                other => panic!("Expected Int value, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_float_range() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            match float_range(&mut rng, 0.0, 100.0) {
                SampleValue::Float(v) => assert!((0.0..=100.0).contains(&v)),
                other => panic!("Expected Float value, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_poisson_count_is_non_negative() {
        let mut rng = StdRng::seed_from_u64(42);
        let poisson = Poisson::new(4.0).unwrap();

        let mut total = 0;
        for _ in 0..1000 {
            let v = sample_count(&mut rng, &poisson).as_i64().unwrap();
            assert!(v >= 0);
            total += v;
        }
        // Mean of 1000 draws stays close to lambda.
        let mean = total as f64 / 1000.0;
        assert!((3.0..5.0).contains(&mean), "mean {mean}");
    }

    #[test]
    fn test_counter() {
        assert_eq!(counter(1, 1, 0), SampleValue::Int(1));
        assert_eq!(counter(1, 1, 9), SampleValue::Int(10));
        assert_eq!(counter(100, -2, 3), SampleValue::Int(94));
    }
}
