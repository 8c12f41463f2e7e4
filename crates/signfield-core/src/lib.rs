//! SignField Core Library
//!
//! Platform-agnostic data structures and placement logic for the SignField
//! signature-field engine.

pub mod export;
pub mod field;
pub mod geom;
pub mod history;
pub mod naming;
pub mod protocol;
pub mod snap;
pub mod store;
pub mod template;
pub mod transform;

pub use export::{ExportPlan, PageBox, SkipReason, SkippedField, WidgetPlacement, MIN_WIDGET_PT};
pub use field::{Field, FieldId, FieldKind, FieldSummary, Project};
pub use geom::FieldRect;
pub use history::UndoRedoStack;
pub use protocol::{HostMessage, Projection, RendererMessage, MAX_SCALE, MIN_SCALE, ZOOM_STEP};
pub use snap::{grid_px, meets_min_draw_size, GuideSet, SnapEngine, SnapResult, GRID_PT, MIN_GRID_CELLS, SNAP_TOLERANCE_PX};
pub use store::FieldStore;
pub use template::{Template, TemplateItem, DEFAULT_TEMPLATE_GROUP};
pub use transform::PageTransform;
