//! Labeled samples the versions are evaluated against

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::value::render_value;

/// Named arguments passed to a version callable
pub type NamedArgs = BTreeMap<String, Value>;

/// A single labeled test input and its expected output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Position in the owning set (0-based)
    pub index: usize,

    /// Positional arguments, in call order
    pub args: Vec<Value>,

    /// Named arguments
    #[serde(default)]
    pub kwargs: NamedArgs,

    /// The expected output
    pub ideal: Value,
}

impl Sample {
    /// 1-based case number used in reports and span names
    pub fn number(&self) -> usize {
        self.index + 1
    }

    /// Compact rendering of the positional arguments
    pub fn args_repr(&self) -> String {
        render_value(&self.args)
    }

    /// Compact rendering of the named arguments
    pub fn kwargs_repr(&self) -> String {
        render_value(&self.kwargs)
    }

    /// Compact rendering of the ideal value
    pub fn ideal_repr(&self) -> String {
        render_value(&self.ideal)
    }
}

/// Ordered collection of samples.
///
/// Insertion order is the canonical row order for every report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleSet {
    samples: Vec<Sample>,
}

impl SampleSet {
    /// Create an empty sample set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample. No shape validation is performed.
    pub fn add_sample(
        &mut self,
        ideal: impl Into<Value>,
        args: Vec<Value>,
        kwargs: NamedArgs,
    ) -> &mut Self {
        let index = self.samples.len();
        self.samples.push(Sample {
            index,
            args,
            kwargs,
            ideal: ideal.into(),
        });
        self
    }

    /// Owned-builder variant of [`SampleSet::add_sample`]
    pub fn with_sample(mut self, ideal: impl Into<Value>, args: Vec<Value>, kwargs: NamedArgs) -> Self {
        self.add_sample(ideal, args, kwargs);
        self
    }

    /// Shorthand for a sample with positional arguments only
    pub fn with_case(self, ideal: impl Into<Value>, args: Vec<Value>) -> Self {
        self.with_sample(ideal, args, NamedArgs::new())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }
}

impl<'a> IntoIterator for &'a SampleSet {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insertion_order_is_preserved() {
        let mut set = SampleSet::new();
        set.add_sample(4, vec![json!(2), json!(2)], NamedArgs::new())
            .add_sample(5, vec![json!(2), json!(3)], NamedArgs::new())
            .add_sample("x", vec![], NamedArgs::new());

        assert_eq!(set.len(), 3);
        let ideals: Vec<_> = set.iter().map(|s| s.ideal.clone()).collect();
        assert_eq!(ideals, vec![json!(4), json!(5), json!("x")]);
        let indices: Vec<_> = set.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_arbitrary_argument_shapes_accepted() {
        let mut kwargs = NamedArgs::new();
        kwargs.insert("mode".to_string(), json!({"strict": true}));
        let set = SampleSet::new()
            .with_sample(json!([1, 2]), vec![json!(null), json!([1, "a"])], kwargs)
            .with_case(json!(null), vec![]);

        let first = set.get(0).unwrap();
        assert_eq!(first.number(), 1);
        assert_eq!(first.args_repr(), r#"[null,[1,"a"]]"#);
        assert_eq!(first.kwargs_repr(), r#"{"mode":{"strict":true}}"#);
        assert!(set.get(1).unwrap().kwargs.is_empty());
    }
}
