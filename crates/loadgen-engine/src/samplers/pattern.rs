//! Unique string sampler.
//!
//! Supports placeholders:
//! - `{partition}` - label of the registry scope the sampler belongs to
//! - `{index}` - number of values drawn before this one
//! - `{uuid}` - random UUID drawn from the sampler's RNG
//! - `{rand:N}` - random N-digit number

use super::SampleValue;
use rand::Rng;
use uuid::Builder;

/// Build a string from a pattern with placeholders.
pub fn unique_string<R: Rng>(pattern: &str, rng: &mut R, scope: &str, index: u64) -> SampleValue {
    let mut result = pattern
        .replace("{partition}", scope)
        .replace("{index}", &index.to_string());

    while result.contains("{uuid}") {
        let uuid = Builder::from_random_bytes(rng.gen()).into_uuid();
        result = result.replacen("{uuid}", &uuid.to_string(), 1);
    }

    // Replace {rand:N} patterns
    let mut search_from = 0;
    while let Some(offset) = result[search_from..].find("{rand:") {
        let start = search_from + offset;
        let Some(len) = result[start..].find('}') else {
            break;
        };
        let end = start + len;
        match result[start + 6..end].parse::<usize>() {
            Ok(digits) => {
                let random_num = random_digits(rng, digits);
                result = format!("{}{}{}", &result[..start], random_num, &result[end + 1..]);
                search_from = start + random_num.len();
            }
            // Invalid format, leave it in place
            Err(_) => search_from = end + 1,
        }
    }

    SampleValue::Text(result)
}

/// Random number with exactly N digits.
fn random_digits<R: Rng>(rng: &mut R, digits: usize) -> String {
    if digits == 0 {
        return String::new();
    }

    let mut result = String::with_capacity(digits);

    // First digit should be 1-9 to avoid leading zeros
    result.push(char::from(b'0' + rng.gen_range(1..10u8)));
    for _ in 1..digits {
        result.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }

    result
}
