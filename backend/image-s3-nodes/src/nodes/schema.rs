//! Declarative node schema and the parameter bag handed to `execute`.

use std::collections::HashMap;

use bytes::Bytes;
use serde::Serialize;

use crate::error::{NodeError, Result};
use crate::tensor::ImageTensor;

/// Value types the host can wire between nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParamKind {
    Image,
    Bytes,
    Int,
    String,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::Image => "IMAGE",
            ParamKind::Bytes => "BYTES",
            ParamKind::Int => "INT",
            ParamKind::String => "STRING",
        }
    }
}

/// Default value declared for an input
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Int(i64),
    String(&'static str),
}

/// One named input of a node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    /// Text inputs only: whether the host renders a multi-line editor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiline: Option<bool>,
}

impl InputSpec {
    pub fn required(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            default: None,
            multiline: None,
        }
    }

    pub fn int(name: &'static str, default: i64) -> Self {
        Self {
            name,
            kind: ParamKind::Int,
            default: Some(DefaultValue::Int(default)),
            multiline: None,
        }
    }

    pub fn string(name: &'static str, default: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::String,
            default: Some(DefaultValue::String(default)),
            multiline: Some(false),
        }
    }
}

/// Host-facing description of a node
#[derive(Debug, Clone, Serialize)]
pub struct NodeSchema {
    pub name: &'static str,
    pub category: &'static str,
    pub output_node: bool,
    pub inputs: Vec<InputSpec>,
    pub outputs: Vec<ParamKind>,
}

/// A single parameter value
#[derive(Debug, Clone)]
pub enum ParamValue {
    Image(ImageTensor),
    Bytes(Bytes),
    Int(i64),
    String(String),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Image(_) => ParamKind::Image,
            ParamValue::Bytes(_) => ParamKind::Bytes,
            ParamValue::Int(_) => ParamKind::Int,
            ParamValue::String(_) => ParamKind::String,
        }
    }
}

impl From<DefaultValue> for ParamValue {
    fn from(value: DefaultValue) -> Self {
        match value {
            DefaultValue::Int(v) => ParamValue::Int(v),
            DefaultValue::String(v) => ParamValue::String(v.to_string()),
        }
    }
}

/// Named parameters for one node invocation
#[derive(Debug, Clone, Default)]
pub struct NodeParams {
    values: HashMap<String, ParamValue>,
}

impl NodeParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Fill absent inputs from their declared defaults.
    ///
    /// Fails on the first input that is absent and has no default.
    pub fn apply_defaults(&mut self, inputs: &[InputSpec]) -> Result<()> {
        for input in inputs {
            if self.values.contains_key(input.name) {
                continue;
            }
            match &input.default {
                Some(default) => self.insert(input.name, default.clone().into()),
                None => return Err(NodeError::MissingParameter(input.name.to_string())),
            }
        }
        Ok(())
    }

    pub fn take(&mut self, name: &str) -> Result<ParamValue> {
        self.values
            .remove(name)
            .ok_or_else(|| NodeError::MissingParameter(name.to_string()))
    }

    pub fn take_image(&mut self, name: &str) -> Result<ImageTensor> {
        match self.take(name)? {
            ParamValue::Image(tensor) => Ok(tensor),
            other => Err(type_error(name, ParamKind::Image, &other)),
        }
    }

    pub fn take_string(&mut self, name: &str) -> Result<String> {
        match self.take(name)? {
            ParamValue::String(value) => Ok(value),
            other => Err(type_error(name, ParamKind::String, &other)),
        }
    }

    pub fn take_int(&mut self, name: &str) -> Result<i64> {
        match self.take(name)? {
            ParamValue::Int(value) => Ok(value),
            other => Err(type_error(name, ParamKind::Int, &other)),
        }
    }

    /// Take an integer that must fit a positive pixel dimension.
    pub fn take_dimension(&mut self, name: &str) -> Result<u32> {
        let value = self.take_int(name)?;
        match u32::try_from(value) {
            Ok(dimension) if dimension > 0 => Ok(dimension),
            _ => Err(NodeError::invalid_parameter(
                name,
                format!("expected a positive pixel size, got {value}"),
            )),
        }
    }
}

fn type_error(name: &str, expected: ParamKind, actual: &ParamValue) -> NodeError {
    NodeError::ParameterType {
        name: name.to_string(),
        expected: expected.as_str(),
        actual: actual.kind().as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> Vec<InputSpec> {
        vec![
            InputSpec::required("image", ParamKind::Image),
            InputSpec::int("resizing_width", 200),
            InputSpec::string("s3_bucket", "s3_bucket"),
        ]
    }

    #[test]
    fn test_apply_defaults_fills_missing_values() {
        let mut params = NodeParams::new().with(
            "image",
            ParamValue::Image(ImageTensor::zeros((1, 1, 1, 3))),
        );
        params.apply_defaults(&inputs()).unwrap();

        assert_eq!(params.take_int("resizing_width").unwrap(), 200);
        assert_eq!(params.take_string("s3_bucket").unwrap(), "s3_bucket");
    }

    #[test]
    fn test_apply_defaults_keeps_explicit_values() {
        let mut params = NodeParams::new()
            .with("image", ParamValue::Image(ImageTensor::zeros((1, 1, 1, 3))))
            .with("resizing_width", ParamValue::Int(64));
        params.apply_defaults(&inputs()).unwrap();

        assert_eq!(params.take_int("resizing_width").unwrap(), 64);
    }

    #[test]
    fn test_apply_defaults_reports_missing_required() {
        let mut params = NodeParams::new();
        let err = params.apply_defaults(&inputs()).unwrap_err();
        assert!(matches!(err, NodeError::MissingParameter(name) if name == "image"));
    }

    #[test]
    fn test_wrong_type_is_reported() {
        let mut params = NodeParams::new().with("s3_bucket", ParamValue::Int(3));
        let err = params.take_string("s3_bucket").unwrap_err();
        assert_eq!(
            err.to_string(),
            "parameter s3_bucket must be STRING, got INT"
        );
    }

    #[test]
    fn test_take_dimension_rejects_non_positive() {
        for bad in [0, -5, i64::from(u32::MAX) + 1] {
            let mut params = NodeParams::new().with("resizing_height", ParamValue::Int(bad));
            assert!(matches!(
                params.take_dimension("resizing_height"),
                Err(NodeError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_schema_serializes_for_host() {
        let json = serde_json::to_value(InputSpec::int("resizing_width", 200)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "resizing_width", "kind": "INT", "default": 200})
        );

        let json = serde_json::to_value(InputSpec::required("image", ParamKind::Image)).unwrap();
        assert_eq!(json, serde_json::json!({"name": "image", "kind": "IMAGE"}));
    }

    #[test]
    fn test_string_inputs_are_single_line() {
        let json = serde_json::to_value(InputSpec::string("object_key", "object_key")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "object_key",
                "kind": "STRING",
                "default": "object_key",
                "multiline": false
            })
        );
    }
}
