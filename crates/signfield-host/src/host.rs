//! Host-side dispatcher: the single authority over project state.
//!
//! The host owns the field store and the undo history. Renderer messages
//! are handled synchronously to completion: the store mutates, history is
//! pushed, and the affected projections are re-sent before the next
//! message is taken. The renderer never holds state the host didn't push.

use crate::convert::ConvertOutcome;
use crate::export_task::{ExportError, ExportJob, ExportSummary, WidgetWriter};
use crate::project_io::{self, ProjectIoError};
use crate::templates::TemplateStore;
use kurbo::{Point, Size};
use signfield_core::field::Project;
use signfield_core::history::UndoRedoStack;
use signfield_core::protocol::{HostMessage, RendererMessage, MAX_SCALE, MIN_SCALE, ZOOM_STEP};
use signfield_core::snap::{self, SnapEngine};
use signfield_core::store::FieldStore;
use signfield_core::template;
use signfield_core::transform::PageTransform;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

/// How long template-change notifications are coalesced before the
/// library is reloaded and re-pushed.
pub const TEMPLATE_RELOAD_DEBOUNCE: Duration = Duration::from_millis(250);

/// Per-page geometry of the open renderable document.
pub trait PageMetrics: Send {
    fn page_count(&self) -> u32;

    /// Page size in points, 1-based. `None` when out of range.
    fn page_size(&self, page: u32) -> Option<Size>;
}

/// Background outcomes surfaced by [`Host::poll_background`].
#[derive(Debug)]
pub enum HostEvent {
    ExportFinished(Result<ExportSummary, ExportError>),
    TemplatesReloaded,
}

/// Owns the project, dispatches renderer messages, pushes projections.
///
/// Single-threaded by contract: every method takes `&mut self` and runs on
/// the host loop. Background work (export, conversion) communicates
/// through polled channels, never by touching the host directly.
pub struct Host<T: TemplateStore> {
    store: FieldStore,
    history: UndoRedoStack,
    templates: T,
    /// Channel to the attached renderer, when one is present.
    renderer: Option<Sender<HostMessage>>,
    /// Geometry reader for the open renderable document.
    metrics: Option<Box<dyn PageMetrics>>,
    /// Staging directory for this session's document copies.
    session_dir: PathBuf,
    current_page: u32,
    num_pages: u32,
    /// Mirror of the renderer's zoom factor, stepped in lockstep with the
    /// view commands the host sends.
    scale: f64,
    grid_visible: bool,
    /// Last reported cursor position, in document points.
    cursor: Point,
    /// True when the project has mutations not yet written to disk.
    dirty: bool,
    export_job: Option<ExportJob>,
    snap: SnapEngine,
    reload_requested_at: Option<Instant>,
    reload_debounce: Duration,
}

impl<T: TemplateStore> Host<T> {
    pub fn new(templates: T) -> Self {
        Self {
            store: FieldStore::new(),
            history: UndoRedoStack::new(),
            templates,
            renderer: None,
            metrics: None,
            session_dir: project_io::new_session_dir(),
            current_page: 1,
            num_pages: 0,
            scale: 1.0,
            grid_visible: true,
            cursor: Point::ZERO,
            dirty: false,
            export_job: None,
            snap: SnapEngine::new(),
            reload_requested_at: None,
            reload_debounce: TEMPLATE_RELOAD_DEBOUNCE,
        }
    }

    // ------------------------------------------------------------------
    // Renderer attachment
    // ------------------------------------------------------------------

    /// Connect a renderer and push the full initial sync.
    ///
    /// A freshly attached renderer starts at the default view state, so
    /// the host's view mirrors reset with it.
    pub fn attach_renderer(&mut self, tx: Sender<HostMessage>) {
        self.renderer = Some(tx);
        self.scale = 1.0;
        self.grid_visible = true;
        self.push_templates();
        self.push_added_fields();
        self.send(HostMessage::SetPage {
            page: self.current_page,
        });
        self.push_fields();
    }

    pub fn detach_renderer(&mut self) {
        self.renderer = None;
    }

    // ------------------------------------------------------------------
    // Message dispatch
    // ------------------------------------------------------------------

    /// Handle one renderer message to completion.
    ///
    /// Project mutations are ignored while an export is running, so the
    /// written document always matches what the user saw when the export
    /// started. Unknown ids and otherwise invalid requests are dropped
    /// without touching the undo history.
    pub fn handle(&mut self, msg: RendererMessage) {
        if self.export_job.is_some() && mutates_project(&msg) {
            log::warn!("Ignoring {:?} while an export is running", msg);
            return;
        }
        match msg {
            RendererMessage::Meta { page, num_pages } => {
                // a render wipes the overlay, so the page's fields are
                // re-pushed even when the page did not change
                self.num_pages = num_pages;
                self.current_page = page;
                self.push_fields();
            }
            RendererMessage::MouseMove { pt } => self.cursor = pt,
            RendererMessage::AddField {
                page,
                rect,
                required,
                name,
            } => {
                // the creation gate is scale-invariant, so evaluate at 1.0
                if !snap::meets_min_draw_size(rect.size(), snap::grid_px(1.0)) {
                    log::debug!("Discarding draw below minimum size on page {}", page);
                    return;
                }
                self.snapshot();
                self.store.add(page, rect, required, name.as_deref());
                self.mutated();
            }
            RendererMessage::UpdateField { id, page, rect } => {
                if !self.store.contains(&id) {
                    log::debug!("Ignoring update of unknown field {}", id);
                    return;
                }
                self.snapshot();
                self.store.update(&id, rect, page);
                self.mutated();
            }
            RendererMessage::DeleteField { id, .. } => {
                if !self.store.contains(&id) {
                    log::debug!("Ignoring delete of unknown field {}", id);
                    return;
                }
                self.snapshot();
                self.store.remove(&id);
                self.mutated();
            }
            RendererMessage::RenameField { id, name, .. } => {
                if name.trim().is_empty() || !self.store.contains(&id) {
                    log::debug!("Ignoring rename of field {}", id);
                    return;
                }
                self.snapshot();
                self.store.rename(&id, &name);
                self.mutated();
            }
            RendererMessage::ToggleRequired { id, .. } => {
                if !self.store.contains(&id) {
                    log::debug!("Ignoring toggle of unknown field {}", id);
                    return;
                }
                self.snapshot();
                self.store.toggle_required(&id);
                self.mutated();
            }
            RendererMessage::SaveTemplate { mut template } => {
                template.name = template.name.trim().to_string();
                if template.name.is_empty() || template.items.is_empty() {
                    log::warn!("Refusing to save a template with no name or no items");
                    return;
                }
                template.repair();
                match self.templates.save(&template) {
                    Ok(()) => self.push_templates(),
                    Err(e) => log::error!("Failed to save template {}: {}", template.name, e),
                }
            }
            RendererMessage::DeleteTemplate { id, name } => {
                let result = match (id, name) {
                    (Some(id), _) => self.templates.delete_by_id(&id),
                    (None, Some(name)) => self.templates.delete_by_name(&name),
                    (None, None) => {
                        log::warn!("deleteTemplate carried neither id nor name");
                        return;
                    }
                };
                match result {
                    Ok(true) => self.push_templates(),
                    Ok(false) => log::debug!("deleteTemplate matched nothing"),
                    Err(e) => log::error!("Failed to delete template: {}", e),
                }
            }
            RendererMessage::Undo => self.undo(),
            RendererMessage::Redo => self.redo(),
        }
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn undo(&mut self) {
        if self.export_job.is_some() {
            return;
        }
        if let Some(previous) = self.history.undo(self.store.project()) {
            self.store.restore(previous);
            self.mutated();
        }
    }

    pub fn redo(&mut self) {
        if self.export_job.is_some() {
            return;
        }
        if let Some(next) = self.history.redo(self.store.project()) {
            self.store.restore(next);
            self.mutated();
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ------------------------------------------------------------------
    // Navigation and view
    // ------------------------------------------------------------------

    pub fn set_page(&mut self, page: u32) {
        let clamped = page.clamp(1, self.num_pages.max(1));
        if clamped == self.current_page {
            return;
        }
        self.current_page = clamped;
        self.send(HostMessage::SetPage { page: clamped });
        self.push_fields();
    }

    pub fn next_page(&mut self) {
        self.set_page(self.current_page.saturating_add(1));
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.current_page.saturating_sub(1));
    }

    pub fn zoom_in(&mut self) {
        self.scale = (self.scale * ZOOM_STEP).min(MAX_SCALE);
        self.send(HostMessage::ZoomIn);
    }

    pub fn zoom_out(&mut self) {
        self.scale = (self.scale / ZOOM_STEP).max(MIN_SCALE);
        self.send(HostMessage::ZoomOut);
    }

    pub fn toggle_grid(&mut self) {
        self.grid_visible = !self.grid_visible;
        self.send(HostMessage::ToggleGrid);
    }

    // ------------------------------------------------------------------
    // Project lifecycle
    // ------------------------------------------------------------------

    /// Start an empty project with no document.
    pub fn new_project(&mut self) {
        self.reset_session(Project::new());
    }

    /// Open a renderable document directly, with no pre-placed fields.
    pub fn open_renderable(&mut self, path: &Path) {
        let staged = project_io::stage_document(&self.session_dir, path);
        let mut project = Project::new();
        project.renderable_document_path = Some(staged.to_string_lossy().into_owned());
        self.reset_session(project);
    }

    /// Open the result of a source-document conversion.
    ///
    /// Tag-derived fields are seeded through the ordinary naming rule, so
    /// blank or colliding tag names come out unique. Seeding is part of
    /// opening, not an edit: the history starts empty below it.
    pub fn open_converted(&mut self, source: &Path, outcome: &ConvertOutcome) {
        let staged = project_io::stage_document(&self.session_dir, &outcome.renderable_path);
        let mut seeded = FieldStore::new();
        seeded.set_paths(
            Some(source.to_string_lossy().into_owned()),
            Some(staged.to_string_lossy().into_owned()),
        );
        for seed in &outcome.seed_fields {
            seeded.add(seed.page, seed.rect, seed.required, Some(&seed.name));
        }
        self.reset_session(seeded.project().clone());
    }

    /// Load a project file. Returns whether the recorded renderable
    /// document is still present for preview.
    pub fn load_project(&mut self, path: &Path) -> Result<bool, ProjectIoError> {
        let loaded = project_io::load_project(path)?;
        if !loaded.preview_available {
            log::warn!("Project {} has no renderable document on disk", path.display());
        }
        self.reset_session(loaded.project);
        Ok(loaded.preview_available)
    }

    /// Write the project file and clear the dirty flag.
    pub fn save_project(&mut self, path: &Path) -> Result<(), ProjectIoError> {
        project_io::save_project(path, self.store.project())?;
        self.dirty = false;
        Ok(())
    }

    /// Provide the geometry reader for the open renderable document.
    pub fn set_page_metrics(&mut self, metrics: Box<dyn PageMetrics>) {
        self.num_pages = metrics.page_count();
        self.metrics = Some(metrics);
    }

    fn reset_session(&mut self, project: Project) {
        self.store = FieldStore::from_project(project);
        self.history.clear();
        self.dirty = false;
        self.current_page = 1;
        self.num_pages = 0;
        self.metrics = None;
        self.send(HostMessage::SetPage { page: 1 });
        self.push_fields();
        self.push_added_fields();
    }

    // ------------------------------------------------------------------
    // Templates
    // ------------------------------------------------------------------

    /// The template library, as the picker should show it.
    pub fn template_list(&self) -> Vec<template::Template> {
        match self.templates.list() {
            Ok(templates) => templates,
            Err(e) => {
                log::error!("Failed to load templates: {}", e);
                Vec::new()
            }
        }
    }

    /// Place a template's fields at a drop anchor (pixel-space) on `page`.
    ///
    /// The whole application is one history snapshot. Returns the number of
    /// fields placed; 0 when the template is unknown, empty, or the page
    /// has no metrics.
    pub fn apply_template(
        &mut self,
        template_id: &str,
        page: u32,
        anchor_px: Point,
        scale: f64,
    ) -> usize {
        if self.export_job.is_some() {
            log::warn!("Ignoring template application while an export is running");
            return 0;
        }
        let Some(template) = self
            .template_list()
            .into_iter()
            .find(|t| t.id == template_id)
        else {
            log::warn!("Unknown template {}", template_id);
            return 0;
        };
        if template.items.is_empty() {
            return 0;
        }
        let Some(page_size) = self.metrics.as_ref().and_then(|m| m.page_size(page)) else {
            log::warn!("No page metrics for page {}; cannot apply template", page);
            return 0;
        };
        let transform = PageTransform::new(scale, page_size);
        self.snapshot();
        let created = template::apply(
            &template,
            page,
            anchor_px,
            &transform,
            &self.snap,
            &mut self.store,
        );
        self.mutated();
        created.len()
    }

    /// Record that the template library changed externally. The reload is
    /// debounced so bursts of file events coalesce into one re-push.
    pub fn notify_templates_changed(&mut self) {
        self.reload_requested_at = Some(Instant::now());
    }

    /// Override the reload debounce (tests use a short one).
    pub fn set_template_debounce(&mut self, debounce: Duration) {
        self.reload_debounce = debounce;
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Start a background export over a private copy of the field list.
    pub fn begin_export<W: WidgetWriter>(
        &mut self,
        writer: W,
        dest: &Path,
    ) -> Result<(), ExportError> {
        if self.export_job.is_some() {
            return Err(ExportError::AlreadyRunning);
        }
        let Some(source) = self.store.project().renderable_document_path.clone() else {
            return Err(ExportError::NoDocument);
        };
        let fields = self.store.project().fields.clone();
        log::info!(
            "Starting export of {} field(s) to {}",
            fields.len(),
            dest.display()
        );
        self.export_job = Some(ExportJob::spawn(
            writer,
            PathBuf::from(source),
            dest.to_path_buf(),
            fields,
        ));
        Ok(())
    }

    pub fn is_exporting(&self) -> bool {
        self.export_job.is_some()
    }

    /// Collect finished background work. Call once per host loop tick.
    pub fn poll_background(&mut self) -> Vec<HostEvent> {
        let mut events = Vec::new();

        let finished = self.export_job.as_ref().and_then(|job| job.poll());
        if let Some(outcome) = finished {
            self.export_job = None;
            events.push(HostEvent::ExportFinished(outcome));
        }

        if let Some(requested) = self.reload_requested_at {
            if requested.elapsed() >= self.reload_debounce {
                self.reload_requested_at = None;
                self.push_templates();
                events.push(HostEvent::TemplatesReloaded);
            }
        }
        events
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn store(&self) -> &FieldStore {
        &self.store
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn grid_visible(&self) -> bool {
        self.grid_visible
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn snapshot(&mut self) {
        self.history.before_mutation(self.store.project());
    }

    /// Mark dirty and re-push the projections a mutation invalidates.
    fn mutated(&mut self) {
        self.dirty = true;
        self.push_fields();
        self.push_added_fields();
    }

    fn push_fields(&mut self) {
        let fields = self.store.fields_on_page(self.current_page);
        self.send(HostMessage::SetFields {
            page: self.current_page,
            fields,
        });
    }

    fn push_added_fields(&mut self) {
        let fields = self.store.summaries();
        self.send(HostMessage::SetAddedFields { fields });
    }

    fn push_templates(&mut self) {
        match self.templates.list() {
            Ok(templates) => self.send(HostMessage::SetTemplates { templates }),
            Err(e) => log::error!("Failed to load templates: {}", e),
        }
    }

    fn send(&mut self, msg: HostMessage) {
        let Some(tx) = &self.renderer else {
            return;
        };
        if tx.send(msg).is_err() {
            log::warn!("Renderer channel closed; detaching");
            self.renderer = None;
        }
    }
}

/// True for messages that edit the project or its history.
fn mutates_project(msg: &RendererMessage) -> bool {
    matches!(
        msg,
        RendererMessage::AddField { .. }
            | RendererMessage::UpdateField { .. }
            | RendererMessage::DeleteField { .. }
            | RendererMessage::RenameField { .. }
            | RendererMessage::ToggleRequired { .. }
            | RendererMessage::Undo
            | RendererMessage::Redo
    )
}
