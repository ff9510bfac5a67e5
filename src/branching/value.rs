//! Step outputs and the values that flow through the evaluator

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::EvalError;

/// A single scalar value: boolean, number or string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    String(String),
}

impl Scalar {
    /// Truthiness used by the logical operators
    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Bool(b) => *b,
            Scalar::Number(n) => *n != 0.0 && !n.is_nan(),
            Scalar::String(s) => !s.is_empty(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Short name of the scalar kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Scalar::Bool(_) => "boolean",
            Scalar::Number(_) => "number",
            Scalar::String(_) => "string",
        }
    }

    /// Structural equality; numbers compare within `f64::EPSILON`
    pub fn loosely_equals(&self, other: &Scalar) -> bool {
        match (self, other) {
            (Scalar::Number(a), Scalar::Number(b)) => a == b || (a - b).abs() < f64::EPSILON,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::String(a), Scalar::String(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(n)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(n as f64)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// The recorded output of one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepValue {
    Scalar(Scalar),
    Sequence(Vec<Scalar>),
}

impl From<Scalar> for StepValue {
    fn from(s: Scalar) -> Self {
        StepValue::Scalar(s)
    }
}

impl From<Vec<Scalar>> for StepValue {
    fn from(seq: Vec<Scalar>) -> Self {
        StepValue::Sequence(seq)
    }
}

/// One step index or an ordered list of them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepSelector {
    Single(usize),
    Many(Vec<usize>),
}

impl std::fmt::Display for StepSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepSelector::Single(i) => write!(f, "#{}", i),
            StepSelector::Many(indices) => {
                let joined: Vec<String> = indices.iter().map(|i| i.to_string()).collect();
                write!(f, "#[{}]", joined.join(","))
            }
        }
    }
}

/// A value held on the evaluator's operand stack
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Scalar(Scalar),
    Sequence(Vec<Scalar>),
    /// Raw step indices waiting for `stepIndex` to resolve them
    Steps(StepSelector),
}

impl Operand {
    pub fn kind(&self) -> &'static str {
        match self {
            Operand::Scalar(s) => s.kind(),
            Operand::Sequence(_) => "sequence",
            Operand::Steps(_) => "step reference",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Operand::Scalar(s) => s.is_truthy(),
            Operand::Sequence(_) | Operand::Steps(_) => true,
        }
    }
}

impl From<Scalar> for Operand {
    fn from(s: Scalar) -> Self {
        Operand::Scalar(s)
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Scalar(s) => write!(f, "{}", s),
            Operand::Sequence(seq) => {
                let joined: Vec<String> = seq.iter().map(|s| s.to_string()).collect();
                write!(f, "[{}]", joined.join(","))
            }
            Operand::Steps(sel) => write!(f, "{}", sel),
        }
    }
}

/// Step outputs keyed by step index, supplied per evaluation call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskResults {
    steps: BTreeMap<usize, StepValue>,
}

impl TaskResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the output of a step, replacing any previous value
    pub fn insert(&mut self, index: usize, value: impl Into<StepValue>) {
        self.steps.insert(index, value.into());
    }

    pub fn get(&self, index: usize) -> Option<&StepValue> {
        self.steps.get(&index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Resolve a single step to its scalar value.
    ///
    /// Sequence outputs resolve to their first element.
    pub fn resolve_one(&self, index: usize) -> Result<Scalar, EvalError> {
        match self.get(index) {
            None => Err(EvalError::MissingStepResult { index }),
            Some(StepValue::Scalar(s)) => Ok(s.clone()),
            Some(StepValue::Sequence(seq)) => seq
                .first()
                .cloned()
                .ok_or(EvalError::EmptyStepResult { index }),
        }
    }

    /// Resolve every index in order
    pub fn resolve_many(&self, indices: &[usize]) -> Result<Vec<Scalar>, EvalError> {
        indices.iter().map(|i| self.resolve_one(*i)).collect()
    }
}

impl<V: Into<StepValue>> FromIterator<(usize, V)> for TaskResults {
    fn from_iter<T: IntoIterator<Item = (usize, V)>>(iter: T) -> Self {
        Self {
            steps: iter.into_iter().map(|(i, v)| (i, v.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(Scalar::Bool(true).is_truthy());
        assert!(!Scalar::Bool(false).is_truthy());
        assert!(Scalar::Number(2.0).is_truthy());
        assert!(!Scalar::Number(0.0).is_truthy());
        assert!(!Scalar::Number(f64::NAN).is_truthy());
        assert!(Scalar::from("x").is_truthy());
        assert!(!Scalar::from("").is_truthy());
    }

    #[test]
    fn test_loose_equality() {
        assert!(Scalar::Number(0.1 + 0.2).loosely_equals(&Scalar::Number(0.3)));
        assert!(Scalar::from("a").loosely_equals(&Scalar::from("a")));
        assert!(!Scalar::Number(1.0).loosely_equals(&Scalar::Bool(true)));
        assert!(!Scalar::from("1").loosely_equals(&Scalar::Number(1.0)));
    }

    #[test]
    fn test_loose_equality_is_reflexive_for_infinities() {
        let inf = Scalar::Number(f64::INFINITY);
        assert!(inf.loosely_equals(&inf));
        assert!(!inf.loosely_equals(&Scalar::Number(f64::NEG_INFINITY)));
    }

    #[test]
    fn test_resolve_sequence_takes_first() {
        let results: TaskResults =
            [(0, vec![Scalar::Number(7.0), Scalar::Number(8.0)])].into_iter().collect();
        assert_eq!(results.resolve_one(0).unwrap(), Scalar::Number(7.0));
    }

    #[test]
    fn test_resolve_missing_step() {
        let results = TaskResults::new();
        match results.resolve_one(4) {
            Err(EvalError::MissingStepResult { index }) => assert_eq!(index, 4),
            other => panic!("Expected MissingStepResult, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_empty_sequence() {
        let mut results = TaskResults::new();
        results.insert(1, Vec::<Scalar>::new());
        assert!(matches!(
            results.resolve_one(1),
            Err(EvalError::EmptyStepResult { index: 1 })
        ));
    }

    #[test]
    fn test_resolve_many_keeps_order() {
        let mut results = TaskResults::new();
        results.insert(0, Scalar::Number(1.0));
        results.insert(1, Scalar::Number(2.0));
        results.insert(2, Scalar::Number(3.0));
        assert_eq!(
            results.resolve_many(&[2, 0]).unwrap(),
            vec![Scalar::Number(3.0), Scalar::Number(1.0)]
        );
    }

    #[test]
    fn test_deserialize_from_json_object() {
        let results: TaskResults =
            serde_json::from_value(json!({"0": 10, "1": [true, false], "2": "done"})).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results.get(0), Some(&StepValue::Scalar(Scalar::Number(10.0))));
        assert_eq!(results.resolve_one(1).unwrap(), Scalar::Bool(true));
        assert_eq!(results.resolve_one(2).unwrap(), Scalar::from("done"));
    }

    #[test]
    fn test_selector_display() {
        assert_eq!(StepSelector::Single(3).to_string(), "#3");
        assert_eq!(StepSelector::Many(vec![1, 2]).to_string(), "#[1,2]");
    }

    #[test]
    fn test_operand_truthiness() {
        assert!(Operand::Sequence(vec![]).is_truthy());
        assert!(Operand::Steps(StepSelector::Single(0)).is_truthy());
        assert!(!Operand::Scalar(Scalar::Bool(false)).is_truthy());
    }
}
