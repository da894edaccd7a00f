//! Orchestration: parse → dispatch → name → convert → ordered output.

use std::io::Read;
use std::sync::Arc;
use std::time::Instant;

use kubestate_core::{ManifestDocument, RenderError, RenderedOutput, StepBody};
use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::limits::{node_budget_exceeded, RenderLimits};
use crate::namer::step_label;
use crate::parser::parse;
use crate::registry::Registry;

/// Renders manifest streams against a fixed registry. Cheap to clone; renders
/// only read the registry, so many may run concurrently.
#[derive(Debug, Clone)]
pub struct Renderer {
    registry: Arc<Registry>,
    limits: RenderLimits,
}

impl Renderer {
    /// Renderer with no size limits; see [`Renderer::with_limits`].
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry, limits: RenderLimits::unlimited() }
    }

    /// Renderer over the built-in handlers.
    pub fn with_builtins() -> Self {
        Self::new(Arc::new(Registry::with_builtins()))
    }

    pub fn with_limits(mut self, limits: RenderLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn limits(&self) -> RenderLimits {
        self.limits
    }

    /// Render every document of `text`, in order. Any error aborts the whole render.
    pub fn render(&self, text: &str) -> Result<RenderedOutput, RenderError> {
        let t0 = Instant::now();
        counter!("render_calls", 1u64);
        let res = self.render_all(text);
        match &res {
            Ok(out) => {
                histogram!("render_latency_ms", t0.elapsed().as_secs_f64() * 1000.0);
                counter!("render_ok", 1u64);
                counter!("render_steps_total", out.len() as u64);
                info!(steps = out.len(), bytes = text.len(), "manifest stream rendered");
            }
            Err(e) => {
                counter!("render_err", 1u64);
                warn!(error = %e, "manifest render failed");
            }
        }
        res
    }

    /// Read the full stream, then render it.
    pub fn render_reader<R: Read>(&self, mut reader: R) -> Result<RenderedOutput, RenderError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        self.render(&text)
    }

    /// Convert a single document into its `(label, body)` pair.
    pub fn step(&self, doc: &ManifestDocument) -> Result<(String, StepBody), RenderError> {
        let api_version = doc.api_version()?;
        let kind = doc.kind()?;
        let handler = self.registry.lookup(api_version, kind).ok_or_else(|| RenderError::UnsupportedResource {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
        })?;
        let label = step_label(api_version, kind, doc.name()?, doc.namespace()?);
        let body = handler.convert(doc)?;
        debug!(doc = doc.index(), label = %label, operation = body.operation(), "rendered step");
        Ok((label, body))
    }

    fn render_all(&self, text: &str) -> Result<RenderedOutput, RenderError> {
        if text.len() > self.limits.max_bytes {
            return Err(RenderError::InputTooLarge { limit: self.limits.max_bytes });
        }
        let mut out = RenderedOutput::new();
        for doc in parse(text) {
            let doc = doc?;
            if node_budget_exceeded(doc.raw(), self.limits.max_nodes) {
                return Err(RenderError::DocumentTooComplex { doc: doc.index(), limit: self.limits.max_nodes });
            }
            let (label, body) = self.step(&doc)?;
            // Same label twice: the later body wins, the earlier position is kept.
            if out.contains(&label) {
                counter!("render_duplicate_labels_total", 1u64);
                warn!(label = %label, doc = doc.index(), "duplicate step label; replacing earlier step in place");
            }
            out.insert(label, body);
        }
        Ok(out)
    }
}
