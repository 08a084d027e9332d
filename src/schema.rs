//! Request validation derived from the feature list.
//!
//! The schema is built once from [`FeatureSpec`] and turns a JSON request
//! body into a [`FeatureRow`]. Every field is optional. Names ending in
//! `_miss` only accept 0 or 1; everything else accepts any number. Keys that
//! are not features are ignored.

use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::metadata::{FeatureSpec, MISSINGNESS_SUFFIX, is_missingness_flag};
use crate::row::{FeatureRow, FeatureValue};

/// Accepted value type of a request field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Optional unconstrained float.
    Float,
    /// Optional integer restricted to {0, 1}.
    MissingFlag,
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    fn description(&self) -> String {
        match self.kind {
            FieldKind::Float => format!("Feature {}", self.name),
            FieldKind::MissingFlag => {
                let base = self
                    .name
                    .strip_suffix(MISSINGNESS_SUFFIX)
                    .unwrap_or(&self.name);
                format!("Missingness flag for {base}")
            }
        }
    }
}

/// A single constraint violation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// Location of the offending value, e.g. `["body", "koi_prad_miss"]`.
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

impl FieldError {
    fn field(name: &str, kind: &'static str, msg: impl Into<String>, input: &Value) -> Self {
        Self {
            loc: vec!["body".to_string(), name.to_string()],
            msg: msg.into(),
            kind,
            input: Some(input.clone()),
        }
    }

    fn body(kind: &'static str, msg: impl Into<String>) -> Self {
        Self {
            loc: vec!["body".to_string()],
            msg: msg.into(),
            kind,
            input: None,
        }
    }

    /// Field name for field-level errors.
    pub fn field_name(&self) -> Option<&str> {
        self.loc.get(1).map(String::as_str)
    }
}

/// Every violation found in one request body.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Request validation failed: {}", describe(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|err| format!("{}: {}", err.loc.join("."), err.msg))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Immutable validator for `/predict` bodies.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    spec: FeatureSpec,
    fields: Vec<FieldSpec>,
}

impl FeatureSchema {
    pub fn build(spec: &FeatureSpec) -> Self {
        let fields = spec
            .names()
            .iter()
            .map(|name| FieldSpec {
                name: name.clone(),
                kind: if is_missingness_flag(name) {
                    FieldKind::MissingFlag
                } else {
                    FieldKind::Float
                },
            })
            .collect();
        Self {
            spec: spec.clone(),
            fields,
        }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Parse and validate a raw request body.
    pub fn validate_bytes(&self, body: &[u8]) -> Result<FeatureRow, ValidationErrors> {
        let value: Value = serde_json::from_slice(body).map_err(|err| {
            ValidationErrors(vec![FieldError::body(
                "json_invalid",
                format!("JSON decode error: {err}"),
            )])
        })?;
        self.validate(&value)
    }

    /// Validate a decoded JSON body into a row in feature order.
    pub fn validate(&self, body: &Value) -> Result<FeatureRow, ValidationErrors> {
        let Some(object) = body.as_object() else {
            return Err(ValidationErrors(vec![FieldError::body(
                "model_attributes_type",
                "Input should be a valid dictionary or object",
            )]));
        };
        self.validate_object(object)
    }

    fn validate_object(&self, object: &Map<String, Value>) -> Result<FeatureRow, ValidationErrors> {
        let mut row = FeatureRow::empty(&self.spec);
        let mut errors = Vec::new();
        for (position, field) in self.fields.iter().enumerate() {
            let Some(raw) = object.get(&field.name) else {
                continue;
            };
            match check_field(field, raw) {
                Ok(value) => row.set(position, value),
                Err(err) => errors.push(err),
            }
        }
        if errors.is_empty() {
            Ok(row)
        } else {
            Err(ValidationErrors(errors))
        }
    }

    /// JSON-Schema style description of the request body.
    pub fn json_schema(&self, title: &str) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|field| {
                let schema = match field.kind {
                    FieldKind::Float => json!({
                        "type": "number",
                        "nullable": true,
                        "default": null,
                        "description": field.description(),
                    }),
                    FieldKind::MissingFlag => json!({
                        "type": "integer",
                        "minimum": 0,
                        "maximum": 1,
                        "nullable": true,
                        "default": null,
                        "description": field.description(),
                    }),
                };
                (field.name.clone(), schema)
            })
            .collect();
        json!({
            "title": title,
            "type": "object",
            "properties": properties,
        })
    }
}

fn check_field(field: &FieldSpec, raw: &Value) -> Result<Option<FeatureValue>, FieldError> {
    if raw.is_null() {
        return Ok(None);
    }
    match field.kind {
        FieldKind::Float => raw
            .as_f64()
            .map(|value| Some(FeatureValue::Float(value)))
            .ok_or_else(|| {
                FieldError::field(
                    &field.name,
                    "float_type",
                    "Input should be a valid number",
                    raw,
                )
            }),
        FieldKind::MissingFlag => check_flag(&field.name, raw).map(Some),
    }
}

fn check_flag(name: &str, raw: &Value) -> Result<FeatureValue, FieldError> {
    let Value::Number(number) = raw else {
        return Err(FieldError::field(
            name,
            "int_type",
            "Input should be a valid integer",
            raw,
        ));
    };
    let value: i128 = if let Some(v) = number.as_u64() {
        i128::from(v)
    } else if let Some(v) = number.as_i64() {
        i128::from(v)
    } else {
        match number.as_f64() {
            Some(v) if v.is_finite() && v.fract() == 0.0 => v as i128,
            _ => {
                return Err(FieldError::field(
                    name,
                    "int_from_float",
                    "Input should be a valid integer, got a number with a fractional part",
                    raw,
                ));
            }
        }
    };
    match value {
        0 => Ok(FeatureValue::Flag(0)),
        1 => Ok(FeatureValue::Flag(1)),
        v if v < 0 => Err(FieldError::field(
            name,
            "greater_than_equal",
            "Input should be greater than or equal to 0",
            raw,
        )),
        _ => Err(FieldError::field(
            name,
            "less_than_equal",
            "Input should be less than or equal to 1",
            raw,
        )),
    }
}
