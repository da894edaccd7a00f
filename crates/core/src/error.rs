use crate::HandlerKey;

/// Every way a render call can fail. Any of these aborts the whole render.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("document {doc}: invalid YAML: {source}")]
    Parse {
        doc: usize,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("document {doc}: expected a mapping at top level, found {found}")]
    NotAMapping { doc: usize, found: &'static str },
    #[error("document {doc}: YAML cannot be represented as a manifest: {source}")]
    Convert {
        doc: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("no handler for {api_version}/{kind}")]
    UnsupportedResource { api_version: String, kind: String },
    #[error("document {doc}: missing required field `{field}`")]
    MissingField { doc: usize, field: String },
    #[error("document {doc}: field `{field}` must be {expected}, found {found}")]
    InvalidField {
        doc: usize,
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("document {doc}: {key} handler rejected object: {reason}")]
    Handler {
        doc: usize,
        key: HandlerKey,
        reason: String,
    },
    #[error("YAML payload too large (>{limit} bytes)")]
    InputTooLarge { limit: usize },
    #[error("document {doc}: YAML document too complex (>{limit} nodes)")]
    DocumentTooComplex { doc: usize, limit: usize },
    #[error("reading manifest stream: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// True for failures where the input itself is not a stream of mappings.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::NotAMapping { .. } | Self::Convert { .. })
    }

    /// Document index the error refers to, when there is one.
    pub fn document(&self) -> Option<usize> {
        match self {
            Self::Parse { doc, .. }
            | Self::NotAMapping { doc, .. }
            | Self::Convert { doc, .. }
            | Self::MissingField { doc, .. }
            | Self::InvalidField { doc, .. }
            | Self::Handler { doc, .. }
            | Self::DocumentTooComplex { doc, .. } => Some(*doc),
            Self::UnsupportedResource { .. } | Self::InputTooLarge { .. } | Self::Io(_) => None,
        }
    }
}
