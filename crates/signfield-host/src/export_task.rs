//! Background export of placed fields into the target document.
//!
//! The pipeline is inspect, plan, write: read the target's page geometry
//! and existing form-field names, clamp and name every placed field
//! against them, then hand the plan to the document writer. The whole
//! pipeline runs on its own thread; the host polls the job handle.

use signfield_core::export::{self, SkippedField, WidgetPlacement};
use signfield_core::field::Field;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Export errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExportError {
    #[error("No renderable document is open")]
    NoDocument,
    #[error("An export is already running")]
    AlreadyRunning,
    #[error("Destination is not writable: {0}")]
    DestinationLocked(String),
    #[error("Failed to inspect target: {0}")]
    Inspect(String),
    #[error("Failed to write widgets: {0}")]
    Write(String),
}

/// What the writer found in the target document before writing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetInfo {
    /// Usable geometry per page, in document order.
    pub pages: Vec<export::PageBox>,
    /// Names already taken by the document's interactive form.
    pub existing_names: Vec<String>,
}

/// Bakes planned widgets into a document.
pub trait WidgetWriter: Send + 'static {
    /// Read the target's page geometry and existing form-field names.
    fn inspect(&mut self, source: &Path) -> Result<TargetInfo, ExportError>;

    /// Write the planned widgets, producing the document at `dest`.
    fn write(
        &mut self,
        source: &Path,
        dest: &Path,
        placements: &[WidgetPlacement],
    ) -> Result<(), ExportError>;
}

/// Outcome of a finished export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    /// Widgets actually written.
    pub placed: usize,
    /// Fields left out, with reasons.
    pub skipped: Vec<SkippedField>,
    pub dest: PathBuf,
}

/// Inspect, plan, write. Runs on the export thread.
pub fn run_export<W: WidgetWriter>(
    writer: &mut W,
    source: &Path,
    dest: &Path,
    fields: &[Field],
) -> Result<ExportSummary, ExportError> {
    let info = writer.inspect(source)?;
    let plan = export::plan(fields, &info.pages, &info.existing_names);
    writer.write(source, dest, &plan.placements)?;

    if !plan.skipped.is_empty() {
        log::warn!("Export skipped {} field(s)", plan.skipped.len());
    }
    log::info!(
        "Exported {} widget(s) to {}",
        plan.placements.len(),
        dest.display()
    );
    Ok(ExportSummary {
        placed: plan.placements.len(),
        skipped: plan.skipped,
        dest: dest.to_path_buf(),
    })
}

/// Handle to an in-flight export.
pub struct ExportJob {
    /// Channel to receive the outcome from the export thread.
    outcome_rx: Receiver<Result<ExportSummary, ExportError>>,
    /// Handle to the export thread.
    _thread: JoinHandle<()>,
}

impl ExportJob {
    /// Start an export over a private copy of the field list.
    pub fn spawn<W: WidgetWriter>(
        mut writer: W,
        source: PathBuf,
        dest: PathBuf,
        fields: Vec<Field>,
    ) -> Self {
        let (outcome_tx, outcome_rx) = channel();
        let handle = thread::spawn(move || {
            let outcome = run_export(&mut writer, &source, &dest, &fields);
            let _ = outcome_tx.send(outcome);
        });
        Self {
            outcome_rx,
            _thread: handle,
        }
    }

    /// Non-blocking check; `Some` exactly once, when the thread finishes.
    pub fn poll(&self) -> Option<Result<ExportSummary, ExportError>> {
        match self.outcome_rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(Err(ExportError::Write("export thread terminated".to_string())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Size;
    use signfield_core::export::PageBox;
    use signfield_core::geom::FieldRect;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Writer that records what it was asked to write.
    struct FakeWriter {
        info: TargetInfo,
        written: Arc<Mutex<Vec<WidgetPlacement>>>,
        fail_write: bool,
    }

    impl FakeWriter {
        fn letter(pages: usize) -> Self {
            Self {
                info: TargetInfo {
                    pages: vec![PageBox::new(Size::new(612.0, 792.0)); pages],
                    existing_names: vec![],
                },
                written: Arc::new(Mutex::new(Vec::new())),
                fail_write: false,
            }
        }
    }

    impl WidgetWriter for FakeWriter {
        fn inspect(&mut self, _source: &Path) -> Result<TargetInfo, ExportError> {
            Ok(self.info.clone())
        }

        fn write(
            &mut self,
            _source: &Path,
            _dest: &Path,
            placements: &[WidgetPlacement],
        ) -> Result<(), ExportError> {
            if self.fail_write {
                return Err(ExportError::DestinationLocked("held open".to_string()));
            }
            *self.written.lock().unwrap() = placements.to_vec();
            Ok(())
        }
    }

    #[test]
    fn test_run_export_clamps_and_summarizes() {
        let mut writer = FakeWriter::letter(1);
        let fields = vec![
            Field::new("Edge", 1, FieldRect::new(500.0, 500.0, 200.0, 100.0), true),
            Field::new("Lost", 3, FieldRect::new(10.0, 10.0, 50.0, 50.0), true),
        ];

        let summary = run_export(
            &mut writer,
            Path::new("/tmp/in.pdf"),
            Path::new("/tmp/out.pdf"),
            &fields,
        )
        .unwrap();

        assert_eq!(summary.placed, 1);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].name, "Lost");
        assert_eq!(summary.dest, PathBuf::from("/tmp/out.pdf"));

        let written = writer.written.lock().unwrap();
        assert!((written[0].rect.w - 112.0).abs() < 1e-9);
    }

    #[test]
    fn test_run_export_collides_against_document_names() {
        let mut writer = FakeWriter::letter(1);
        writer.info.existing_names = vec!["Signer".to_string()];
        let fields = vec![Field::new("Signer", 1, FieldRect::new(10.0, 10.0, 80.0, 40.0), true)];

        let summary = run_export(
            &mut writer,
            Path::new("/tmp/in.pdf"),
            Path::new("/tmp/out.pdf"),
            &fields,
        )
        .unwrap();

        assert_eq!(summary.placed, 1);
        let written = writer.written.lock().unwrap();
        assert_eq!(written[0].name, "Signer_1");
    }

    #[test]
    fn test_write_failure_propagates() {
        let mut writer = FakeWriter::letter(1);
        writer.fail_write = true;

        let result = run_export(
            &mut writer,
            Path::new("/tmp/in.pdf"),
            Path::new("/tmp/out.pdf"),
            &[],
        );
        assert!(matches!(result, Err(ExportError::DestinationLocked(_))));
    }

    #[test]
    fn test_job_polls_to_completion() {
        let writer = FakeWriter::letter(1);
        let written = writer.written.clone();
        let job = ExportJob::spawn(
            writer,
            PathBuf::from("/tmp/in.pdf"),
            PathBuf::from("/tmp/out.pdf"),
            vec![Field::new("Signer", 1, FieldRect::new(10.0, 10.0, 80.0, 40.0), false)],
        );

        let mut outcome = None;
        for _ in 0..200 {
            if let Some(o) = job.poll() {
                outcome = Some(o);
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        let summary = outcome.expect("export never finished").unwrap();
        assert_eq!(summary.placed, 1);
        assert!(!written.lock().unwrap()[0].required);
    }
}
