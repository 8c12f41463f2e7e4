//! Background conversion of tagged source documents.
//!
//! Converters turn a source document (typically a word-processing file
//! carrying placement tags) into a renderable document plus the fields the
//! tags describe. The conversion API is not reentrant with the UI thread,
//! so all requests funnel through one dedicated worker thread; each
//! request hands back a one-shot completion the caller waits on or polls.

use signfield_core::geom::FieldRect;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Conversion errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    #[error("Conversion failed: {0}")]
    Failed(String),
    #[error("Conversion worker is gone")]
    WorkerGone,
}

/// A field pre-placed by the converter from tags in the source document.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedField {
    pub name: String,
    /// 1-based page number.
    pub page: u32,
    /// Placement in document points, origin bottom-left.
    pub rect: FieldRect,
    pub required: bool,
}

/// What a successful conversion yields.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOutcome {
    /// Renderable document produced from the source.
    pub renderable_path: PathBuf,
    /// Fields derived from tags embedded in the source, in tag order.
    pub seed_fields: Vec<SeedField>,
}

/// Converts a tagged source document into a renderable one under `out_dir`.
pub trait SourceConverter: Send + 'static {
    fn convert(&mut self, source: &Path, out_dir: &Path)
        -> Result<ConvertOutcome, ConvertError>;
}

type ConvertResult = Result<ConvertOutcome, ConvertError>;

struct ConvertRequest {
    source: PathBuf,
    done_tx: Sender<ConvertResult>,
}

/// One-shot completion handle for a queued conversion.
pub struct PendingConversion {
    /// Taken once the outcome has been observed.
    rx: Option<Receiver<ConvertResult>>,
}

impl PendingConversion {
    /// Non-blocking check. Yields the outcome exactly once.
    pub fn poll(&mut self) -> Option<ConvertResult> {
        let rx = self.rx.as_ref()?;
        match rx.try_recv() {
            Ok(outcome) => {
                self.rx = None;
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.rx = None;
                Some(Err(ConvertError::WorkerGone))
            }
        }
    }

    /// Block until the conversion finishes.
    pub fn wait(mut self) -> ConvertResult {
        match self.rx.take() {
            Some(rx) => rx.recv().unwrap_or(Err(ConvertError::WorkerGone)),
            None => Err(ConvertError::WorkerGone),
        }
    }
}

/// Dedicated conversion thread.
///
/// Requests are processed strictly in order. The thread exits when the
/// worker is dropped.
pub struct ConvertWorker {
    /// Channel to send requests to the conversion thread.
    request_tx: Sender<ConvertRequest>,
    /// Handle to the conversion thread.
    _thread: JoinHandle<()>,
}

impl ConvertWorker {
    /// Spawn the worker. Renderable output lands under `out_dir`.
    pub fn spawn<C: SourceConverter>(mut converter: C, out_dir: PathBuf) -> Self {
        let (request_tx, request_rx) = channel::<ConvertRequest>();

        let handle = thread::spawn(move || {
            while let Ok(request) = request_rx.recv() {
                log::info!("Converting {}", request.source.display());
                let outcome = converter.convert(&request.source, &out_dir);
                if let Err(ref e) = outcome {
                    log::error!("Conversion of {} failed: {}", request.source.display(), e);
                }
                // the caller may have lost interest; that is not an error
                let _ = request.done_tx.send(outcome);
            }
        });

        Self {
            request_tx,
            _thread: handle,
        }
    }

    /// Queue a conversion and get its one-shot completion handle.
    pub fn request(&self, source: PathBuf) -> Result<PendingConversion, ConvertError> {
        let (done_tx, done_rx) = channel();
        self.request_tx
            .send(ConvertRequest { source, done_tx })
            .map_err(|_| ConvertError::WorkerGone)?;
        Ok(PendingConversion { rx: Some(done_rx) })
    }
}
