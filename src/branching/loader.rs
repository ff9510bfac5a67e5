//! Expression and task result loading
//!
//! Branch expressions are stored as nested single-key objects:
//!
//! ```text
//! {"allConditionsMet": [
//!     {"isAtLeast": [{"stepIndex": 0}, 1]},
//!     {"isLessThan": [{"averageOf": {"stepIndex": [1, 2]}}, 100]}
//! ]}
//! ```
//!
//! Text input goes through `serde_json` / `serde_yaml`, which stop at their
//! default recursion limit (about 128 nested containers for JSON, so roughly
//! 64 levels of operators). Trees built in code, or converted with
//! `expression_from_value`, have no depth limit beyond memory.

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use super::ast::Expression;
use super::operators::{Operator, STEP_INDEX_TAG};
use super::value::{Scalar, StepSelector, TaskResults};
use crate::error::{BranchingError, EvalError};

/// Loads branch expressions and task results from JSON or YAML
pub struct BranchLoader;

impl BranchLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a branch expression from a `.json`, `.yaml` or `.yml` file
    pub fn load_branch<P: AsRef<Path>>(&self, path: P) -> Result<Expression, BranchingError> {
        match Self::read(path.as_ref())? {
            (FileFormat::Json, content) => Self::parse_json(&content),
            (FileFormat::Yaml, content) => Self::parse_yaml(&content),
        }
    }

    /// Load task results from a `.json`, `.yaml` or `.yml` file
    pub fn load_results<P: AsRef<Path>>(&self, path: P) -> Result<TaskResults, BranchingError> {
        match Self::read(path.as_ref())? {
            (FileFormat::Json, content) => Self::parse_results_json(&content),
            (FileFormat::Yaml, content) => Ok(serde_yaml::from_str(&content)?),
        }
    }

    /// Parse task results from a JSON object keyed by step index
    pub fn parse_results_json(content: &str) -> Result<TaskResults, BranchingError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse a branch expression from YAML (JSON is accepted too)
    pub fn parse_yaml(content: &str) -> Result<Expression, BranchingError> {
        let value: Value = serde_yaml::from_str(content)?;
        Ok(expression_from_value(&value)?)
    }

    /// Parse a branch expression from JSON
    pub fn parse_json(content: &str) -> Result<Expression, BranchingError> {
        let value: Value = serde_json::from_str(content)?;
        Ok(expression_from_value(&value)?)
    }

    fn read(path: &Path) -> Result<(FileFormat, String), BranchingError> {
        let format = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => FileFormat::Json,
            Some("yaml" | "yml") => FileFormat::Yaml,
            _ => {
                return Err(BranchingError::Config(format!(
                    "Unsupported file type: {}",
                    path.display()
                )))
            }
        };
        Ok((format, fs::read_to_string(path)?))
    }
}

enum FileFormat {
    Json,
    Yaml,
}

impl Default for BranchLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Build an expression tree from its object form
pub fn expression_from_value(value: &Value) -> Result<Expression, EvalError> {
    match value {
        Value::Bool(b) => Ok(Expression::Literal(Scalar::Bool(*b))),
        Value::Number(n) => n
            .as_f64()
            .map(|f| Expression::Literal(Scalar::Number(f)))
            .ok_or_else(|| EvalError::malformed(format!("number out of range: {}", n))),
        Value::String(s) => Ok(Expression::Literal(Scalar::String(s.clone()))),
        Value::Object(map) => tagged_from_map(map),
        Value::Null => Err(EvalError::malformed("null is not an expression")),
        Value::Array(_) => Err(EvalError::malformed(format!(
            "bare array is not an expression: {}",
            value
        ))),
    }
}

fn tagged_from_map(map: &Map<String, Value>) -> Result<Expression, EvalError> {
    let mut entries = map.iter();
    let (tag, payload) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        _ => {
            return Err(EvalError::malformed(format!(
                "expected an object with exactly one operator key, found {} keys",
                map.len()
            )))
        }
    };

    match Operator::from_tag(tag)? {
        Operator::StepIndex => step_selector(payload).map(Expression::Step),
        Operator::Compare(op) => match payload.as_array().map(Vec::as_slice) {
            Some([left, right]) => Ok(Expression::compare(
                op,
                expression_from_value(left)?,
                expression_from_value(right)?,
            )),
            _ => Err(EvalError::malformed(format!(
                "'{}' takes an array of exactly two operands",
                tag
            ))),
        },
        Operator::Logical(op) => {
            let items = payload.as_array().ok_or_else(|| {
                EvalError::malformed(format!("'{}' takes an array of conditions", tag))
            })?;
            let operands = items
                .iter()
                .map(expression_from_value)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Expression::Logical { op, operands })
        }
        Operator::Math(op) => Ok(Expression::math(op, expression_from_value(payload)?)),
    }
}

fn step_selector(payload: &Value) -> Result<StepSelector, EvalError> {
    let index = |v: &Value| {
        v.as_u64()
            .map(|i| i as usize)
            .ok_or_else(|| EvalError::malformed(format!("invalid step index: {}", v)))
    };
    match payload {
        Value::Array(items) => items
            .iter()
            .map(index)
            .collect::<Result<Vec<_>, _>>()
            .map(StepSelector::Many),
        other => index(other).map(StepSelector::Single),
    }
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Expression::Literal(value) => value.serialize(serializer),
            Expression::Step(selector) => single_entry(serializer, STEP_INDEX_TAG, selector),
            Expression::Compare { op, left, right } => {
                single_entry(serializer, op.tag(), &[left.as_ref(), right.as_ref()])
            }
            Expression::Logical { op, operands } => single_entry(serializer, op.tag(), operands),
            Expression::Math { op, operand } => {
                single_entry(serializer, op.tag(), operand.as_ref())
            }
        }
    }
}

fn single_entry<S, V>(serializer: S, tag: &str, payload: &V) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize + ?Sized,
{
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(tag, payload)?;
    map.end()
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        expression_from_value(&value).map_err(D::Error::custom)
    }
}
