//! YAML scalar to [`SampleValue`] conversion for static samplers.

use super::SampleValue;
use serde_yaml::Value as YamlValue;

/// Convert a YAML scalar to a sample value.
///
/// Returns `None` for null, sequences and mappings; static samplers only
/// hold scalars.
pub fn yaml_to_sample_value(yaml: &YamlValue) -> Option<SampleValue> {
    match yaml {
        YamlValue::Bool(b) => Some(SampleValue::Bool(*b)),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(SampleValue::Int(i))
            } else {
                n.as_f64().map(SampleValue::Float)
            }
        }
        YamlValue::String(s) => Some(SampleValue::Text(s.clone())),
        YamlValue::Tagged(tagged) => yaml_to_sample_value(&tagged.value),
        YamlValue::Null | YamlValue::Sequence(_) | YamlValue::Mapping(_) => None,
    }
}
