//! Project file persistence and session staging.

use signfield_core::field::Project;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Project file errors.
#[derive(Debug, Error)]
pub enum ProjectIoError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("File is locked: {0}")]
    Locked(String),
    #[error("IO error: {0}")]
    Io(String),
}

/// Permission failures get their own variant so the UI can tell the user
/// to close the file in the other application rather than show a raw
/// IO message.
fn write_error(path: &Path, e: io::Error) -> ProjectIoError {
    let msg = format!("Failed to write {}: {}", path.display(), e);
    if e.kind() == io::ErrorKind::PermissionDenied {
        ProjectIoError::Locked(msg)
    } else {
        ProjectIoError::Io(msg)
    }
}

/// A loaded project plus what the session can do with it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedProject {
    pub project: Project,
    /// False when the renderable document is missing or no longer on disk.
    /// The field list still loads; only preview and export are blocked.
    pub preview_available: bool,
}

/// Write a project file as pretty-printed JSON.
pub fn save_project(path: &Path, project: &Project) -> Result<(), ProjectIoError> {
    let json = project
        .to_json()
        .map_err(|e| ProjectIoError::Parse(e.to_string()))?;
    fs::write(path, json).map_err(|e| write_error(path, e))
}

/// Read a project file, repairing blank field ids.
pub fn load_project(path: &Path) -> Result<LoadedProject, ProjectIoError> {
    let json = fs::read_to_string(path)
        .map_err(|e| ProjectIoError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    let project = Project::from_json(&json)
        .map_err(|e| ProjectIoError::Parse(format!("Failed to parse {}: {}", path.display(), e)))?;
    let preview_available = project
        .renderable_document_path
        .as_deref()
        .is_some_and(|p| Path::new(p).exists());
    Ok(LoadedProject {
        project,
        preview_available,
    })
}

/// A fresh per-session staging directory under the system temp dir.
pub fn new_session_dir() -> PathBuf {
    std::env::temp_dir()
        .join("signfield")
        .join(Uuid::new_v4().to_string())
}

/// Copy a document into the session staging directory.
///
/// The session works against the staged copy so the user's file stays
/// untouched and movable while editing. When staging fails the original
/// path is returned and the session reads the user's file directly.
pub fn stage_document(session_dir: &Path, source: &Path) -> PathBuf {
    let Some(file_name) = source.file_name() else {
        return source.to_path_buf();
    };
    if let Err(e) = fs::create_dir_all(session_dir) {
        log::warn!(
            "Failed to create staging directory {}: {}",
            session_dir.display(),
            e
        );
        return source.to_path_buf();
    }
    let staged = session_dir.join(file_name);
    match fs::copy(source, &staged) {
        Ok(_) => {
            log::info!("Staged {} as {}", source.display(), staged.display());
            staged
        }
        Err(e) => {
            log::warn!("Failed to stage {}: {}", source.display(), e);
            source.to_path_buf()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signfield_core::field::Field;
    use signfield_core::geom::FieldRect;
    use tempfile::tempdir;

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contract.sfproj");

        let mut project = Project::new();
        project
            .fields
            .push(Field::new("Signer", 2, FieldRect::new(50.0, 60.0, 120.0, 48.0), true));
        save_project(&path, &project).unwrap();

        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded.project, project);
        // no renderable path recorded, so nothing to preview
        assert!(!loaded.preview_available);
    }

    #[test]
    fn test_preview_available_tracks_renderable_file() {
        let dir = tempdir().unwrap();
        let doc_path = dir.path().join("render.pdf");
        fs::write(&doc_path, b"%PDF-1.7").unwrap();

        let mut project = Project::new();
        project.renderable_document_path = Some(doc_path.to_string_lossy().into_owned());
        let proj_path = dir.path().join("p.sfproj");
        save_project(&proj_path, &project).unwrap();

        assert!(load_project(&proj_path).unwrap().preview_available);

        fs::remove_file(&doc_path).unwrap();
        assert!(!load_project(&proj_path).unwrap().preview_available);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.sfproj");
        fs::write(&path, "{ definitely not a project").unwrap();

        assert!(matches!(
            load_project(&path),
            Err(ProjectIoError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_project(&dir.path().join("absent.sfproj")),
            Err(ProjectIoError::Io(_))
        ));
    }

    #[test]
    fn test_permission_denied_maps_to_locked() {
        let path = Path::new("/tmp/held.sfproj");
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "held by another process");
        match write_error(path, denied) {
            ProjectIoError::Locked(msg) => assert!(msg.contains("held.sfproj")),
            other => panic!("expected Locked, got {other:?}"),
        }

        let full = io::Error::other("disk full");
        assert!(matches!(write_error(path, full), ProjectIoError::Io(_)));
    }

    #[test]
    fn test_stage_document_copies_into_session_dir() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("original.pdf");
        fs::write(&source, b"%PDF-1.7 content").unwrap();
        let session = dir.path().join("session");

        let staged = stage_document(&session, &source);
        assert_ne!(staged, source);
        assert_eq!(fs::read(&staged).unwrap(), b"%PDF-1.7 content");

        // the original remains usable and unmodified
        assert_eq!(fs::read(&source).unwrap(), b"%PDF-1.7 content");
    }

    #[test]
    fn test_stage_document_falls_back_to_source_on_failure() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("never-existed.pdf");
        let staged = stage_document(&dir.path().join("session"), &missing);
        assert_eq!(staged, missing);
    }
}
