//! Per-request feature rows.

use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::metadata::FeatureSpec;

/// A validated feature value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
    Float(f64),
    /// Missingness flag, always 0 or 1.
    Flag(u8),
}

impl FeatureValue {
    pub fn as_f64(self) -> f64 {
        match self {
            FeatureValue::Float(value) => value,
            FeatureValue::Flag(flag) => f64::from(flag),
        }
    }

    fn is_finite(self) -> bool {
        match self {
            FeatureValue::Float(value) => value.is_finite(),
            FeatureValue::Flag(_) => true,
        }
    }
}

impl Serialize for FeatureValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FeatureValue::Float(value) => serializer.serialize_f64(*value),
            FeatureValue::Flag(flag) => serializer.serialize_u8(*flag),
        }
    }
}

/// One slot per feature, in [`FeatureSpec`] order.
///
/// Serializes as a JSON object keyed by feature name with `null` for absent
/// values.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    names: Vec<String>,
    values: Vec<Option<FeatureValue>>,
}

impl FeatureRow {
    /// A row with every feature absent.
    pub fn empty(spec: &FeatureSpec) -> Self {
        Self {
            names: spec.names().to_vec(),
            values: vec![None; spec.len()],
        }
    }

    /// Set the value at a column position.
    pub fn set(&mut self, position: usize, value: Option<FeatureValue>) {
        if let Some(slot) = self.values.get_mut(position) {
            *slot = value;
        }
    }

    /// Value for a feature name, `None` when absent or unknown.
    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        let idx = self.names.iter().position(|candidate| candidate == name)?;
        self.values[idx]
    }

    pub fn values(&self) -> &[Option<FeatureValue>] {
        &self.values
    }

    /// Replace infinities and NaN with absence. Returns how many values were dropped.
    pub fn sanitize(&mut self) -> usize {
        let mut dropped = 0;
        for slot in &mut self.values {
            if slot.is_some_and(|value| !value.is_finite()) {
                *slot = None;
                dropped += 1;
            }
        }
        dropped
    }

    /// Dense model input with `NaN` for absent values.
    pub fn to_model_input(&self) -> Vec<f64> {
        self.values
            .iter()
            .map(|value| value.map(FeatureValue::as_f64).unwrap_or(f64::NAN))
            .collect()
    }
}

impl Serialize for FeatureRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.names.len()))?;
        for (name, value) in self.names.iter().zip(&self.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> FeatureSpec {
        FeatureSpec::new(vec!["a".into(), "b_miss".into(), "c".into()]).unwrap()
    }

    #[test]
    fn empty_row_is_all_absent() {
        let row = FeatureRow::empty(&spec());
        assert!(row.values().iter().all(Option::is_none));
        let input = row.to_model_input();
        assert_eq!(input.len(), 3);
        assert!(input.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn sanitize_drops_infinities_and_nan() {
        let mut row = FeatureRow::empty(&spec());
        row.set(0, Some(FeatureValue::Float(f64::INFINITY)));
        row.set(1, Some(FeatureValue::Flag(1)));
        row.set(2, Some(FeatureValue::Float(f64::NEG_INFINITY)));
        assert_eq!(row.sanitize(), 2);
        assert_eq!(row.get("a"), None);
        assert_eq!(row.get("b_miss"), Some(FeatureValue::Flag(1)));
        assert_eq!(row.get("c"), None);

        let mut nan = FeatureRow::empty(&spec());
        nan.set(0, Some(FeatureValue::Float(f64::NAN)));
        assert_eq!(nan.sanitize(), 1);
        assert_eq!(nan, FeatureRow::empty(&spec()));
    }

    #[test]
    fn serializes_in_feature_order_with_nulls() {
        let mut row = FeatureRow::empty(&spec());
        row.set(0, Some(FeatureValue::Float(1.5)));
        row.set(1, Some(FeatureValue::Flag(1)));
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"a":1.5,"b_miss":1,"c":null}"#);
    }

    #[test]
    fn flags_feed_the_model_as_floats() {
        let mut row = FeatureRow::empty(&spec());
        row.set(1, Some(FeatureValue::Flag(1)));
        row.set(2, Some(FeatureValue::Float(-2.0)));
        let input = row.to_model_input();
        assert!(input[0].is_nan());
        assert_eq!(&input[1..], &[1.0, -2.0]);
    }
}
