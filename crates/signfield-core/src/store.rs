//! Authoritative field storage.
//!
//! The store owns the live `Project` and is the only writer of it. Every
//! mutation keeps the invariant that field names are unique within the
//! project, case-insensitively. Operations on unknown ids are no-ops that
//! report `false` rather than errors; gesture traffic routinely races a
//! deletion and must not fail loudly.

use crate::field::{Field, FieldId, FieldKind, FieldSummary, Project};
use crate::geom::FieldRect;
use crate::naming;
use std::collections::HashSet;

/// Mutable field list for the current project.
#[derive(Debug, Default)]
pub struct FieldStore {
    project: Project,
}

impl FieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing project (loaded from disk or restored from history).
    pub fn from_project(project: Project) -> Self {
        Self { project }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Replace the whole project. Used by undo/redo and project load.
    pub fn restore(&mut self, project: Project) {
        self.project = project;
    }

    /// Update the document paths without touching the fields.
    pub fn set_paths(&mut self, source: Option<String>, renderable: Option<String>) {
        self.project.source_document_path = source;
        self.project.renderable_document_path = renderable;
    }

    pub fn len(&self) -> usize {
        self.project.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.project.fields.is_empty()
    }

    pub fn contains(&self, id: &FieldId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &FieldId) -> Option<&Field> {
        self.position(id).map(|i| &self.project.fields[i])
    }

    /// Add a field, resolving the final name through the naming rule.
    ///
    /// A blank proposal synthesizes `Signature_{N+1}` from the current
    /// signature count; any proposal is then de-collided case-insensitively.
    /// Returns a copy of the created field. Never fails.
    pub fn add(
        &mut self,
        page: u32,
        rect: FieldRect,
        required: bool,
        proposed_name: Option<&str>,
    ) -> Field {
        let name = self.resolve_name(proposed_name, None);
        let field = Field::new(name, page, rect, required);
        self.project.fields.push(field.clone());
        field
    }

    /// Replace a field's geometry and page in place.
    pub fn update(&mut self, id: &FieldId, rect: FieldRect, page: u32) -> bool {
        let Some(i) = self.position(id) else {
            return false;
        };
        let updated = self.project.fields[i].clone().with_rect(rect).with_page(page);
        self.project.fields[i] = updated;
        true
    }

    /// Rename a field, excluding it from its own collision check.
    ///
    /// A name that is blank after trimming is ignored.
    pub fn rename(&mut self, id: &FieldId, new_name: &str) -> bool {
        if new_name.trim().is_empty() {
            return false;
        }
        let Some(i) = self.position(id) else {
            return false;
        };
        let resolved = self.resolve_name(Some(new_name), Some(id));
        let renamed = self.project.fields[i].clone().with_name(resolved);
        self.project.fields[i] = renamed;
        true
    }

    pub fn toggle_required(&mut self, id: &FieldId) -> bool {
        let Some(i) = self.position(id) else {
            return false;
        };
        let flipped = self.project.fields[i].required;
        let updated = self.project.fields[i].clone().with_required(!flipped);
        self.project.fields[i] = updated;
        true
    }

    /// Remove by id. Idempotent: removing an absent id reports `false`.
    pub fn remove(&mut self, id: &FieldId) -> bool {
        let Some(i) = self.position(id) else {
            return false;
        };
        self.project.fields.remove(i);
        true
    }

    /// Fields on one page, in insertion order.
    pub fn fields_on_page(&self, page: u32) -> Vec<Field> {
        self.project
            .fields
            .iter()
            .filter(|f| f.page == page)
            .cloned()
            .collect()
    }

    /// Cross-page index, sorted by (page, name).
    pub fn summaries(&self) -> Vec<FieldSummary> {
        let mut rows: Vec<FieldSummary> =
            self.project.fields.iter().map(Field::summary).collect();
        rows.sort_by(|a, b| a.page.cmp(&b.page).then_with(|| a.name.cmp(&b.name)));
        rows
    }

    fn position(&self, id: &FieldId) -> Option<usize> {
        self.project.fields.iter().position(|f| &f.id == id)
    }

    fn signature_count(&self) -> usize {
        self.project
            .fields
            .iter()
            .filter(|f| f.kind == FieldKind::Signature)
            .count()
    }

    fn taken_names(&self, exclude: Option<&FieldId>) -> HashSet<String> {
        self.project
            .fields
            .iter()
            .filter(|f| exclude != Some(&f.id))
            .map(|f| naming::name_key(&f.name))
            .collect()
    }

    fn resolve_name(&self, proposed: Option<&str>, exclude: Option<&FieldId>) -> String {
        let trimmed = proposed.unwrap_or("").trim();
        let base = if trimmed.is_empty() {
            naming::default_name(self.signature_count())
        } else {
            trimmed.to_string()
        };
        naming::resolve_unique(&base, &self.taken_names(exclude))
    }
}
