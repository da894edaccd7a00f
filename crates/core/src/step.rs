//! Step bodies and the ordered output handed to the state engine.

use rustc_hash::FxHashMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value as Json;
use smallvec::SmallVec;

/// One single-key argument mapping, e.g. `{name: foo}`.
#[derive(Debug, Clone, PartialEq)]
pub struct StepArg {
    pub name: String,
    pub value: Json,
}

impl StepArg {
    pub fn new(name: impl Into<String>, value: impl Into<Json>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

impl Serialize for StepArg {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &self.value)?;
        map.end()
    }
}

/// `{operation: [{arg: value}, ...]}`. Argument order is chosen by the handler.
#[derive(Debug, Clone, PartialEq)]
pub struct StepBody {
    operation: String,
    args: SmallVec<[StepArg; 4]>,
}

impl StepBody {
    pub fn new(operation: impl Into<String>) -> Self {
        Self { operation: operation.into(), args: SmallVec::new() }
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<Json>) -> Self {
        self.push_arg(StepArg::new(name, value));
        self
    }

    pub fn push_arg(&mut self, arg: StepArg) {
        self.args.push(arg);
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn args(&self) -> &[StepArg] {
        &self.args
    }

    /// First argument with the given name.
    pub fn arg(&self, name: &str) -> Option<&Json> {
        self.args.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    pub fn to_json(&self) -> Json {
        let args = self
            .args
            .iter()
            .map(|a| {
                let mut m = serde_json::Map::new();
                m.insert(a.name.clone(), a.value.clone());
                Json::Object(m)
            })
            .collect();
        let mut body = serde_json::Map::new();
        body.insert(self.operation.clone(), Json::Array(args));
        Json::Object(body)
    }
}

struct Args<'a>(&'a [StepArg]);

impl Serialize for Args<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for arg in self.0 {
            seq.serialize_element(arg)?;
        }
        seq.end()
    }
}

impl Serialize for StepBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.operation, &Args(&self.args))?;
        map.end()
    }
}

/// Label → step body, iterated in first-insertion order.
///
/// Re-inserting an existing label replaces its body in place: the value comes
/// from the latest insert, the position from the first. The state engine reads
/// this order as execution order for steps without declared requisites.
///
/// Serializing through `serde` keeps the order; avoid `serde_json::to_value`
/// (its `Map` sorts keys) and serialize straight to text instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedOutput {
    steps: Vec<(String, StepBody)>,
    index: FxHashMap<String, usize>,
}

impl RenderedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a step. Returns the body it replaced, if the label was already present.
    pub fn insert(&mut self, label: String, body: StepBody) -> Option<StepBody> {
        if let Some(&pos) = self.index.get(&label) {
            return Some(std::mem::replace(&mut self.steps[pos].1, body));
        }
        self.index.insert(label.clone(), self.steps.len());
        self.steps.push((label, body));
        None
    }

    pub fn get(&self, label: &str) -> Option<&StepBody> {
        self.index.get(label).map(|&pos| &self.steps[pos].1)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StepBody)> + '_ {
        self.steps.iter().map(|(l, b)| (l.as_str(), b))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.steps.iter().map(|(l, _)| l.as_str())
    }
}

impl IntoIterator for RenderedOutput {
    type Item = (String, StepBody);
    type IntoIter = std::vec::IntoIter<(String, StepBody)>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

impl Serialize for RenderedOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.steps.len()))?;
        for (label, body) in self.steps.iter() {
            map.serialize_entry(label, body)?;
        }
        map.end()
    }
}
