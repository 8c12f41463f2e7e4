//! Field and project data model.

use crate::geom::FieldRect;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque unique identifier for a placed field.
///
/// Persisted as a plain string; legacy project files may carry fields with
/// no id at all or an empty one, which load as blank and are repaired.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    /// Generate a fresh random identifier.
    pub fn fresh() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// True when the identifier is missing or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FieldId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a placed field becomes at export time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Signature,
}

/// A placed signature field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Stable identity, immutable once assigned.
    #[serde(default)]
    pub id: FieldId,
    /// Display name, unique per project (case-insensitive).
    pub name: String,
    #[serde(default)]
    pub kind: FieldKind,
    /// 1-based page number.
    pub page: u32,
    /// Placement in document points, origin bottom-left.
    pub rect: FieldRect,
    /// Whether the exported widget is mandatory.
    #[serde(default)]
    pub required: bool,
}

impl Field {
    /// Create a field with a fresh id.
    pub fn new(name: impl Into<String>, page: u32, rect: FieldRect, required: bool) -> Self {
        Self {
            id: FieldId::fresh(),
            name: name.into(),
            kind: FieldKind::Signature,
            page,
            rect,
            required,
        }
    }

    pub fn with_rect(mut self, rect: FieldRect) -> Self {
        self.rect = rect;
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Row for the cross-page field index.
    pub fn summary(&self) -> FieldSummary {
        FieldSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            page: self.page,
        }
    }
}

/// Cross-page index row: just enough to list and jump to a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub id: FieldId,
    pub name: String,
    pub page: u32,
}

/// The whole editable state: document paths plus the placed fields.
///
/// Owned exclusively by the host. Replaced wholesale when a document is
/// opened or a project file is loaded; the renderer only ever sees
/// projections of it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Original source document, when the session began from a tagged source.
    #[serde(default)]
    pub source_document_path: Option<String>,
    /// Document the renderer displays and the exporter reads.
    #[serde(default)]
    pub renderable_document_path: Option<String>,
    /// Placed fields, in insertion order.
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize to the on-disk project format.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse the on-disk project format, repairing blank field ids.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut project: Project = serde_json::from_str(json)?;
        project.ensure_ids();
        Ok(project)
    }

    /// Assign fresh ids to fields whose id is missing or blank.
    ///
    /// "Missing" and "empty string" are treated uniformly: both get a new
    /// id, nothing else about the field changes.
    pub fn ensure_ids(&mut self) {
        for field in &mut self.fields {
            if field.id.is_blank() {
                field.id = FieldId::fresh();
            }
        }
    }
}
