//! Kubestate core types: manifest documents, handler keys, steps and errors.

#![forbid(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

mod error;
mod step;

pub use error::RenderError;
pub use step::{RenderedOutput, StepArg, StepBody};

/// `(apiVersion, kind)`; identifies exactly one handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandlerKey {
    pub api_version: String,
    pub kind: String,
}

impl HandlerKey {
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self { api_version: api_version.into(), kind: kind.into() }
    }
}

impl fmt::Display for HandlerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.api_version, self.kind)
    }
}

/// Name of a JSON value's shape, for diagnostics.
pub fn shape_of(v: &Json) -> &'static str {
    match v {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "a sequence",
        Json::Object(_) => "a mapping",
    }
}

/// One resource object from a manifest stream.
///
/// The top level is always a mapping. Everything beyond `apiVersion`, `kind`
/// and `metadata.{name,namespace}` is opaque payload for handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestDocument {
    index: usize,
    raw: Json,
}

impl ManifestDocument {
    /// Wrap a parsed document found at `index` in its stream.
    pub fn from_value(index: usize, raw: Json) -> Result<Self, RenderError> {
        if !raw.is_object() {
            return Err(RenderError::NotAMapping { doc: index, found: shape_of(&raw) });
        }
        Ok(Self { index, raw })
    }

    /// Position in the stream, counting skipped empty documents.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn raw(&self) -> &Json {
        &self.raw
    }

    pub fn api_version(&self) -> Result<&str, RenderError> {
        self.required_str("apiVersion")
    }

    pub fn kind(&self) -> Result<&str, RenderError> {
        self.required_str("kind")
    }

    pub fn key(&self) -> Result<HandlerKey, RenderError> {
        Ok(HandlerKey::new(self.api_version()?, self.kind()?))
    }

    pub fn name(&self) -> Result<&str, RenderError> {
        self.required_str("metadata.name")
    }

    /// `metadata.namespace`; an empty string counts as absent.
    pub fn namespace(&self) -> Result<Option<&str>, RenderError> {
        Ok(self.str_at("metadata.namespace")?.filter(|ns| !ns.is_empty()))
    }

    /// Look up a string by dotted path (`metadata.name`). Missing or null is `None`.
    pub fn str_at(&self, path: &str) -> Result<Option<&str>, RenderError> {
        match self.value_at(path)? {
            None | Some(Json::Null) => Ok(None),
            Some(Json::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(self.invalid(path, "a string", other)),
        }
    }

    pub fn required_str(&self, path: &str) -> Result<&str, RenderError> {
        self.str_at(path)?
            .ok_or_else(|| RenderError::MissingField { doc: self.index, field: path.to_string() })
    }

    /// Walk a dotted path through nested mappings. A non-mapping on the way is an error.
    pub fn value_at(&self, path: &str) -> Result<Option<&Json>, RenderError> {
        let mut cur = &self.raw;
        let mut walked = 0usize;
        for seg in path.split('.') {
            let map = match cur {
                Json::Object(map) => map,
                other => return Err(self.invalid(&path[..walked.saturating_sub(1)], "a mapping", other)),
            };
            cur = match map.get(seg) {
                Some(v) => v,
                None => return Ok(None),
            };
            walked += seg.len() + 1;
        }
        Ok(Some(cur))
    }

    fn invalid(&self, field: &str, expected: &'static str, found: &Json) -> RenderError {
        RenderError::InvalidField {
            doc: self.index,
            field: field.to_string(),
            expected,
            found: shape_of(found),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Json) -> ManifestDocument {
        ManifestDocument::from_value(3, v).unwrap()
    }

    #[test]
    fn rejects_non_mapping_documents() {
        let err = ManifestDocument::from_value(1, json!(["a", "b"])).unwrap_err();
        assert!(err.is_parse_error());
        assert!(matches!(err, RenderError::NotAMapping { doc: 1, found: "a sequence" }));
        let err = ManifestDocument::from_value(0, json!("scalar")).unwrap_err();
        assert!(matches!(err, RenderError::NotAMapping { found: "a string", .. }));
    }

    #[test]
    fn extracts_identity_fields() {
        let d = doc(json!({
            "apiVersion": "v1",
            "kind": "ServiceAccount",
            "metadata": { "name": "foo", "namespace": "bar" },
            "secrets": [ { "name": "tok" } ]
        }));
        assert_eq!(d.key().unwrap(), HandlerKey::new("v1", "ServiceAccount"));
        assert_eq!(d.name().unwrap(), "foo");
        assert_eq!(d.namespace().unwrap(), Some("bar"));
        assert_eq!(d.index(), 3);
    }

    #[test]
    fn missing_and_empty_namespace_are_absent() {
        let d = doc(json!({ "metadata": { "name": "x" } }));
        assert_eq!(d.namespace().unwrap(), None);
        let d = doc(json!({ "metadata": { "name": "x", "namespace": "" } }));
        assert_eq!(d.namespace().unwrap(), None);
        let d = doc(json!({ "metadata": { "name": "x", "namespace": null } }));
        assert_eq!(d.namespace().unwrap(), None);
    }

    #[test]
    fn missing_name_is_reported_with_path() {
        let d = doc(json!({ "apiVersion": "v1", "kind": "ConfigMap", "metadata": {} }));
        let e = d.name().unwrap_err();
        assert!(matches!(&e, RenderError::MissingField { doc: 3, field } if field == "metadata.name"));
        assert!(e.to_string().contains("missing required field `metadata.name`"), "e={}", e);

        let d = doc(json!({ "apiVersion": "v1", "kind": "ConfigMap" }));
        assert!(matches!(d.name().unwrap_err(), RenderError::MissingField { .. }));
    }

    #[test]
    fn wrong_shapes_are_invalid_fields() {
        let d = doc(json!({ "apiVersion": 1, "metadata": "oops" }));
        let e = d.api_version().unwrap_err();
        assert!(matches!(&e, RenderError::InvalidField { field, expected: "a string", found: "a number", .. } if field == "apiVersion"));
        let e = d.name().unwrap_err();
        assert!(matches!(&e, RenderError::InvalidField { field, expected: "a mapping", .. } if field == "metadata"));
    }

    #[test]
    fn handler_key_display() {
        assert_eq!(HandlerKey::new("apps/v1", "Deployment").to_string(), "apps/v1/Deployment");
    }
}
