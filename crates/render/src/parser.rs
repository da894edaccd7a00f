//! Multi-document YAML stream → manifest documents.

use std::io::Read;

use kubestate_core::{ManifestDocument, RenderError};
use serde::Deserialize;
use serde_json::Value as Json;

/// Lazy iterator over the non-empty documents of a YAML stream.
///
/// Yields at most one error, then stops.
pub struct Documents<'a> {
    inner: serde_yaml::Deserializer<'a>,
    next_index: usize,
    done: bool,
}

/// Split `text` into manifest documents. Empty documents (e.g. a trailing `---`) are skipped.
pub fn parse(text: &str) -> Documents<'_> {
    Documents { inner: serde_yaml::Deserializer::from_str(text), next_index: 0, done: false }
}

/// Read the whole stream first; document boundaries need not line up with read chunks.
pub fn parse_reader<R: Read>(mut reader: R) -> Result<Vec<ManifestDocument>, RenderError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse(&text).collect()
}

fn to_document(index: usize, de: serde_yaml::Deserializer<'_>) -> Result<Option<ManifestDocument>, RenderError> {
    let mut yaml = serde_yaml::Value::deserialize(de).map_err(|source| RenderError::Parse { doc: index, source })?;
    yaml.apply_merge().map_err(|source| RenderError::Parse { doc: index, source })?;
    let json: Json = serde_json::to_value(yaml).map_err(|source| RenderError::Convert { doc: index, source })?;
    if is_empty_document(&json) {
        return Ok(None);
    }
    ManifestDocument::from_value(index, json).map(Some)
}

/// Null, `false`, zero, and empty strings, sequences or mappings carry no object.
fn is_empty_document(v: &Json) -> bool {
    match v {
        Json::Null => true,
        Json::Bool(b) => !*b,
        Json::Number(n) => n.as_f64() == Some(0.0),
        Json::String(s) => s.is_empty(),
        Json::Array(a) => a.is_empty(),
        Json::Object(m) => m.is_empty(),
    }
}

impl Iterator for Documents<'_> {
    type Item = Result<ManifestDocument, RenderError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let de = match self.inner.next() {
                Some(de) => de,
                None => {
                    self.done = true;
                    break;
                }
            };
            let index = self.next_index;
            self.next_index += 1;
            match to_document(index, de) {
                Ok(Some(doc)) => return Some(Ok(doc)),
                Ok(None) => {
                    tracing::trace!(doc = index, "skipping empty document");
                    continue;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

impl std::iter::FusedIterator for Documents<'_> {}
