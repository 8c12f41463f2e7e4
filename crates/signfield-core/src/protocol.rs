//! Typed host↔renderer message contract and the renderer-side projection.
//!
//! The host is the single authority over project state; the renderer is
//! presentation-only. Messages travel over a typed channel and serialize
//! as JSON with a `type` tag and camelCase keys, so any renderer embedding
//! (in-process or out) speaks the same wire format.
//!
//! Both sides handle messages synchronously to completion on their own
//! single-threaded loop: a renderer message is fully processed (store
//! mutated, history pushed, replies sent) before the next is accepted, so
//! two mutations can never interleave.

use crate::field::{Field, FieldId, FieldSummary};
use crate::geom::FieldRect;
use crate::template::Template;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Smallest zoom factor the projection will apply.
pub const MIN_SCALE: f64 = 0.5;
/// Largest zoom factor the projection will apply.
pub const MAX_SCALE: f64 = 4.0;
/// Multiplicative step for the zoom view commands.
pub const ZOOM_STEP: f64 = 1.25;

fn default_required() -> bool {
    true
}

/// Messages sent by the renderer to the authoritative host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RendererMessage {
    /// Reported after a render completes; keeps the host's notion of the
    /// visible page and the page count current.
    Meta { page: u32, num_pages: u32 },
    /// A draw gesture finished. `required` defaults to true when omitted.
    AddField {
        page: u32,
        rect: FieldRect,
        #[serde(default = "default_required")]
        required: bool,
        #[serde(default)]
        name: Option<String>,
    },
    /// A move/resize gesture finished.
    UpdateField { id: FieldId, page: u32, rect: FieldRect },
    DeleteField { id: FieldId, page: u32 },
    RenameField { id: FieldId, name: String, page: u32 },
    ToggleRequired { id: FieldId, page: u32 },
    /// Cursor position in document points; status display only, never
    /// persisted.
    MouseMove { pt: Point },
    SaveTemplate { template: Template },
    /// Resolved by id when present, otherwise by exact name.
    DeleteTemplate {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
    Undo,
    Redo,
}

/// Messages pushed by the host to the renderer.
///
/// Every push replaces the corresponding renderer cache wholesale; the
/// renderer must never merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostMessage {
    /// Authoritative field list for one page.
    SetFields { page: u32, fields: Vec<Field> },
    /// Cross-page index, sorted by (page, name).
    SetAddedFields { fields: Vec<FieldSummary> },
    /// Active template set.
    SetTemplates { templates: Vec<Template> },
    SetPage { page: u32 },
    ZoomIn,
    ZoomOut,
    ToggleGrid,
}

/// Renderer-side cache of host-pushed state.
///
/// Pure and framework-free so renderer embeddings and protocol tests share
/// one implementation of the replace-only contract. View state (zoom and
/// grid visibility) lives here because the view commands carry no payload;
/// the renderer owns the stepping.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// Page whose field list is cached.
    pub fields_page: u32,
    /// Fields for `fields_page`, exactly as last pushed.
    pub fields: Vec<Field>,
    /// Cross-page index, exactly as last pushed.
    pub added_fields: Vec<FieldSummary>,
    /// Active templates, exactly as last pushed.
    pub templates: Vec<Template>,
    /// Page the renderer should display.
    pub current_page: u32,
    /// Zoom factor, stepped by `zoomIn`/`zoomOut`.
    pub scale: f64,
    /// Whether the background grid is drawn.
    pub grid_visible: bool,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fields_page: 1,
            fields: Vec::new(),
            added_fields: Vec::new(),
            templates: Vec::new(),
            current_page: 1,
            scale: 1.0,
            grid_visible: true,
        }
    }
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one push, replacing the affected cache wholesale.
    pub fn apply(&mut self, msg: HostMessage) {
        match msg {
            HostMessage::SetFields { page, fields } => {
                self.fields_page = page;
                self.fields = fields;
            }
            HostMessage::SetAddedFields { fields } => self.added_fields = fields,
            HostMessage::SetTemplates { templates } => self.templates = templates,
            HostMessage::SetPage { page } => self.current_page = page,
            HostMessage::ZoomIn => self.scale = (self.scale * ZOOM_STEP).min(MAX_SCALE),
            HostMessage::ZoomOut => self.scale = (self.scale / ZOOM_STEP).max(MIN_SCALE),
            HostMessage::ToggleGrid => self.grid_visible = !self.grid_visible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderer_message_wire_format() {
        let msg = RendererMessage::AddField {
            page: 2,
            rect: FieldRect::new(50.0, 60.0, 120.0, 48.0),
            required: true,
            name: None,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"addField\""));
        assert!(json.contains("\"page\":2"));

        let meta = serde_json::to_string(&RendererMessage::Meta { page: 1, num_pages: 9 }).unwrap();
        assert!(meta.contains("\"type\":\"meta\""));
        assert!(meta.contains("\"numPages\":9"));

        let undo = serde_json::to_string(&RendererMessage::Undo).unwrap();
        assert_eq!(undo, "{\"type\":\"undo\"}");
    }

    #[test]
    fn test_add_field_required_defaults_to_true() {
        let json = r#"{"type":"addField","page":1,"rect":{"x":0.0,"y":0.0,"w":100.0,"h":50.0}}"#;
        let msg: RendererMessage = serde_json::from_str(json).unwrap();
        match msg {
            RendererMessage::AddField { required, name, .. } => {
                assert!(required);
                assert!(name.is_none());
            }
            other => panic!("expected addField, got {other:?}"),
        }
    }

    #[test]
    fn test_delete_template_accepts_id_or_name() {
        let by_id: RendererMessage =
            serde_json::from_str(r#"{"type":"deleteTemplate","id":"t-1"}"#).unwrap();
        let by_name: RendererMessage =
            serde_json::from_str(r#"{"type":"deleteTemplate","name":"Pair"}"#).unwrap();
        assert_eq!(
            by_id,
            RendererMessage::DeleteTemplate { id: Some("t-1".to_string()), name: None }
        );
        assert_eq!(
            by_name,
            RendererMessage::DeleteTemplate { id: None, name: Some("Pair".to_string()) }
        );
    }

    #[test]
    fn test_host_message_round_trip() {
        let field = Field::new("Signer", 3, FieldRect::new(10.0, 20.0, 100.0, 40.0), true);
        let msg = HostMessage::SetFields { page: 3, fields: vec![field] };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"setFields\""));
        let back: HostMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);

        let zoom = serde_json::to_string(&HostMessage::ZoomIn).unwrap();
        assert_eq!(zoom, "{\"type\":\"zoomIn\"}");
    }

    #[test]
    fn test_mouse_move_carries_point_fields() {
        let msg = RendererMessage::MouseMove { pt: Point::new(12.5, 700.0) };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"x\":12.5"));
        let back: RendererMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_projection_replaces_never_merges() {
        let mut projection = Projection::new();
        let a = Field::new("A", 1, FieldRect::new(0.0, 0.0, 50.0, 20.0), true);
        let b = Field::new("B", 1, FieldRect::new(60.0, 0.0, 50.0, 20.0), true);

        projection.apply(HostMessage::SetFields { page: 1, fields: vec![a.clone(), b] });
        assert_eq!(projection.fields.len(), 2);

        // a later push with one field wins outright
        projection.apply(HostMessage::SetFields { page: 1, fields: vec![a] });
        assert_eq!(projection.fields.len(), 1);
        assert_eq!(projection.fields_page, 1);
    }

    #[test]
    fn test_projection_zoom_steps_and_clamps() {
        let mut projection = Projection::new();
        for _ in 0..20 {
            projection.apply(HostMessage::ZoomIn);
        }
        assert!((projection.scale - MAX_SCALE).abs() < 1e-9);
        for _ in 0..40 {
            projection.apply(HostMessage::ZoomOut);
        }
        assert!((projection.scale - MIN_SCALE).abs() < 1e-9);
    }

    #[test]
    fn test_projection_view_commands() {
        let mut projection = Projection::new();
        projection.apply(HostMessage::SetPage { page: 4 });
        assert_eq!(projection.current_page, 4);
        assert!(projection.grid_visible);
        projection.apply(HostMessage::ToggleGrid);
        assert!(!projection.grid_visible);
    }
}
