//! Input model for boundary specifications
//!
//! Boundary conditions are usually written by hand, either in code or in a
//! JSON configuration file. The accepted shapes are a closed set:
//!
//! - a keyword such as `"periodic"`, `"neumann"` or `"auto_periodic_dirichlet"`
//! - a mapping such as `{"value": 1.0}` or `{"type": "mixed", "value": 2.0, "const": 1.0}`
//! - a sequence, either one entry per axis or a `(low, high)` pair
//!
//! [`BoundaryData`] models exactly these shapes and (de)serializes untagged,
//! so a JSON string, object and array map onto the three variants.

use crate::axes::BoundarySet;
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Family selected by one of the `auto_periodic_*` sentinel keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoFamily {
    /// Vanishing derivative on non-periodic axes
    Neumann,
    /// Vanishing value on non-periodic axes
    Dirichlet,
    /// Vanishing curvature on non-periodic axes
    Curvature,
}

impl AutoFamily {
    /// Parse a sentinel keyword
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "natural" | "auto_periodic_neumann" => Some(AutoFamily::Neumann),
            "auto_periodic_dirichlet" => Some(AutoFamily::Dirichlet),
            "auto_periodic_curvature" => Some(AutoFamily::Curvature),
            _ => None,
        }
    }

    /// Keyword of the non-periodic condition used by this family
    pub fn keyword(&self) -> &'static str {
        match self {
            AutoFamily::Neumann => "neumann",
            AutoFamily::Dirichlet => "dirichlet",
            AutoFamily::Curvature => "curvature",
        }
    }

    /// Per-axis keywords for the given periodicity
    pub fn expand(&self, periodic: &[bool]) -> Vec<BoundaryData> {
        periodic
            .iter()
            .map(|&p| {
                let keyword = if p { PERIODIC } else { self.keyword() };
                BoundaryData::Keyword(keyword.to_string())
            })
            .collect()
    }
}

/// Keyword for periodic axes
pub const PERIODIC: &str = "periodic";

/// Returns `Some(flip_sign)` if `keyword` requests a periodic axis.
pub fn periodic_keyword(keyword: &str) -> Option<bool> {
    match keyword {
        "periodic" => Some(false),
        "anti-periodic" | "antiperiodic" => Some(true),
        _ => None,
    }
}

/// Boundary value given in data: a number or a nested list of numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueData {
    Scalar(f64),
    Nested(Vec<ValueData>),
}

impl ValueData {
    /// Convert to a dense array, checking that nested lists are rectangular
    pub fn to_array(&self) -> Result<ArrayD<f64>, String> {
        let mut shape = Vec::new();
        let mut level = self;
        while let ValueData::Nested(items) = level {
            shape.push(items.len());
            match items.first() {
                Some(first) => level = first,
                None => break,
            }
        }

        let mut flat = Vec::with_capacity(shape.iter().product());
        self.flatten_into(&shape, &mut flat)?;
        ArrayD::from_shape_vec(IxDyn(&shape), flat).map_err(|e| e.to_string())
    }

    fn flatten_into(&self, shape: &[usize], out: &mut Vec<f64>) -> Result<(), String> {
        match (self, shape.split_first()) {
            (ValueData::Scalar(v), None) => {
                out.push(*v);
                Ok(())
            }
            (ValueData::Nested(items), Some((&len, rest))) if items.len() == len => {
                for item in items {
                    item.flatten_into(rest, out)?;
                }
                Ok(())
            }
            _ => Err("nested value lists must be rectangular".to_string()),
        }
    }

    /// The scalar, if this is one
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            ValueData::Scalar(v) => Some(*v),
            ValueData::Nested(_) => None,
        }
    }
}

impl From<f64> for ValueData {
    fn from(v: f64) -> Self {
        ValueData::Scalar(v)
    }
}

impl From<Vec<f64>> for ValueData {
    fn from(values: Vec<f64>) -> Self {
        ValueData::Nested(values.into_iter().map(ValueData::Scalar).collect())
    }
}

impl From<Vec<Vec<f64>>> for ValueData {
    fn from(rows: Vec<Vec<f64>>) -> Self {
        ValueData::Nested(rows.into_iter().map(ValueData::from).collect())
    }
}

/// Mapping form of a single boundary condition
///
/// Either exactly one of `value`, `derivative`, `curvature` or `mixed` is
/// given, or `type` names the kind and `value` carries its data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionData {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ValueData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivative: Option<ValueData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curvature: Option<ValueData>,
    /// Coefficient `γ` of a mixed condition `∂ₙc + γc = β`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixed: Option<f64>,
    /// Constant `β` of a mixed condition
    #[serde(rename = "const", default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<ValueData>,
}

impl ConditionData {
    /// Dirichlet condition `{"value": v}`
    pub fn value(value: impl Into<ValueData>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    /// Neumann condition `{"derivative": d}`
    pub fn derivative(derivative: impl Into<ValueData>) -> Self {
        Self {
            derivative: Some(derivative.into()),
            ..Default::default()
        }
    }

    /// Curvature condition `{"curvature": c}`
    pub fn curvature(curvature: impl Into<ValueData>) -> Self {
        Self {
            curvature: Some(curvature.into()),
            ..Default::default()
        }
    }

    /// Mixed condition `{"mixed": γ, "const": β}`
    pub fn mixed(gamma: f64, constant: impl Into<ValueData>) -> Self {
        Self {
            mixed: Some(gamma),
            constant: Some(constant.into()),
            ..Default::default()
        }
    }

    /// Condition selected by `{"type": kind}`
    pub fn typed(kind: impl Into<String>, value: Option<ValueData>) -> Self {
        Self {
            kind: Some(kind.into()),
            value,
            ..Default::default()
        }
    }

    /// Returns `Some(flip_sign)` if the mapping requests a periodic axis.
    pub fn periodic(&self) -> Option<bool> {
        self.kind.as_deref().and_then(periodic_keyword)
    }
}

/// Boundary specification in one of the accepted shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoundaryData {
    Keyword(String),
    Sequence(Vec<BoundaryData>),
    Condition(ConditionData),
}

impl BoundaryData {
    /// Parse a specification from JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// The keyword, if this is one
    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            BoundaryData::Keyword(k) => Some(k),
            _ => None,
        }
    }
}

impl fmt::Display for BoundaryData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}

impl From<&str> for BoundaryData {
    fn from(keyword: &str) -> Self {
        BoundaryData::Keyword(keyword.to_string())
    }
}

impl From<String> for BoundaryData {
    fn from(keyword: String) -> Self {
        BoundaryData::Keyword(keyword)
    }
}

impl From<ConditionData> for BoundaryData {
    fn from(condition: ConditionData) -> Self {
        BoundaryData::Condition(condition)
    }
}

impl<T: Into<BoundaryData>> From<Vec<T>> for BoundaryData {
    fn from(items: Vec<T>) -> Self {
        BoundaryData::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<L: Into<BoundaryData>, H: Into<BoundaryData>> From<(L, H)> for BoundaryData {
    fn from((low, high): (L, H)) -> Self {
        BoundaryData::Sequence(vec![low.into(), high.into()])
    }
}

/// Everything [`BoundarySet::from_data`] accepts
#[derive(Debug, Clone)]
pub enum BoundaryInput {
    /// An already validated set, returned as-is
    Set(BoundarySet),
    /// Raw specification that still needs normalization
    Data(BoundaryData),
}

impl From<BoundarySet> for BoundaryInput {
    fn from(set: BoundarySet) -> Self {
        BoundaryInput::Set(set)
    }
}

impl From<BoundaryData> for BoundaryInput {
    fn from(data: BoundaryData) -> Self {
        BoundaryInput::Data(data)
    }
}

impl From<&str> for BoundaryInput {
    fn from(keyword: &str) -> Self {
        BoundaryInput::Data(keyword.into())
    }
}

impl From<String> for BoundaryInput {
    fn from(keyword: String) -> Self {
        BoundaryInput::Data(keyword.into())
    }
}

impl From<ConditionData> for BoundaryInput {
    fn from(condition: ConditionData) -> Self {
        BoundaryInput::Data(condition.into())
    }
}

impl From<Vec<BoundaryData>> for BoundaryInput {
    fn from(items: Vec<BoundaryData>) -> Self {
        BoundaryInput::Data(BoundaryData::Sequence(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shapes() {
        assert_eq!(
            BoundaryData::from_json(r#""periodic""#).unwrap(),
            BoundaryData::from("periodic")
        );
        assert_eq!(
            BoundaryData::from_json(r#"{"value": 1.5}"#).unwrap(),
            BoundaryData::from(ConditionData::value(1.5))
        );
        assert_eq!(
            BoundaryData::from_json(r#"[{"derivative": 0}, "dirichlet"]"#).unwrap(),
            BoundaryData::from((ConditionData::derivative(0.0), "dirichlet"))
        );
        assert_eq!(
            BoundaryData::from_json(r#"{"mixed": 2, "const": 1}"#).unwrap(),
            BoundaryData::from(ConditionData::mixed(2.0, 1.0))
        );
    }

    #[test]
    fn test_single_entry_array_is_a_sequence() {
        assert_eq!(
            BoundaryData::from_json(r#"["periodic"]"#).unwrap(),
            BoundaryData::Sequence(vec![BoundaryData::from("periodic")])
        );
    }

    #[test]
    fn test_unknown_mapping_key_is_rejected() {
        assert!(BoundaryData::from_json(r#"{"valeu": 1}"#).is_err());
    }

    #[test]
    fn test_value_to_array() {
        let scalar = ValueData::from(2.0).to_array().unwrap();
        assert_eq!(scalar.ndim(), 0);

        let matrix = ValueData::from(vec![vec![1.0, 2.0], vec![3.0, 4.0]])
            .to_array()
            .unwrap();
        assert_eq!(matrix.shape(), &[2, 2]);
        assert_eq!(matrix[[1, 0]], 3.0);

        let ragged = ValueData::Nested(vec![
            ValueData::from(vec![1.0, 2.0]),
            ValueData::from(vec![3.0]),
        ]);
        assert!(ragged.to_array().is_err());
    }

    #[test]
    fn test_auto_family_expansion() {
        let family = AutoFamily::from_keyword("natural").unwrap();
        assert_eq!(family, AutoFamily::Neumann);
        assert_eq!(
            family.expand(&[false, true]),
            vec![BoundaryData::from("neumann"), BoundaryData::from("periodic")]
        );
        assert!(AutoFamily::from_keyword("neumann").is_none());
    }

    #[test]
    fn test_display_round_trips_through_json() {
        let data = BoundaryData::from(vec!["periodic", "neumann"]);
        assert_eq!(data.to_string(), r#"["periodic","neumann"]"#);
    }
}
