//! Artifact emission (stage 7)

mod emitter;
mod graph_export;
mod source;

pub use emitter::{EmittedArtifacts, RegistryEmitter};
pub use graph_export::{GraphExportDocument, GraphStatistics, ServiceExport, ServiceMetadata};
pub use source::SourceBuilder;
