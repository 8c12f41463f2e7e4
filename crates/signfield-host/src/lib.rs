//! SignField Host Library
//!
//! The authoritative side of a SignField session: project state, renderer
//! dispatch, template persistence, background conversion and export.

pub mod convert;
pub mod export_task;
pub mod host;
pub mod project_io;
pub mod templates;

pub use convert::{
    ConvertError, ConvertOutcome, ConvertWorker, PendingConversion, SeedField, SourceConverter,
};
pub use export_task::{ExportError, ExportJob, ExportSummary, TargetInfo, WidgetWriter};
pub use host::{Host, HostEvent, PageMetrics, TEMPLATE_RELOAD_DEBOUNCE};
pub use project_io::{LoadedProject, ProjectIoError};
pub use templates::{
    starter_templates, DirTemplateStore, MemoryTemplateStore, TemplateStore, TemplateStoreError,
};
