//! Kubestate render: turn a stream of Kubernetes manifests into ordered state steps.
//!
//! Handlers are looked up by `(apiVersion, kind)` in a [`Registry`] that is
//! populated once at startup and read-only afterwards. The [`Renderer`] never
//! special-cases a resource type; supporting a new one means registering a new
//! [`Handler`].

#![forbid(unsafe_code)]

pub mod builtins;
mod limits;
mod namer;
mod parser;
mod registry;
mod renderer;

pub use kubestate_core::{HandlerKey, ManifestDocument, RenderError, RenderedOutput, StepArg, StepBody};
pub use limits::RenderLimits;
pub use namer::step_label;
pub use parser::{parse, parse_reader, Documents};
pub use registry::{DuplicateHandler, FnHandler, Handler, Registry, RegistryBuilder};
pub use renderer::Renderer;
