//! Template persistence backends.

use signfield_core::naming;
use signfield_core::template::{Template, TemplateItem, DEFAULT_TEMPLATE_GROUP};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Template store errors.
#[derive(Debug, Error)]
pub enum TemplateStoreError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type for template store operations.
pub type TemplateStoreResult<T> = Result<T, TemplateStoreError>;

/// Trait for template persistence backends.
///
/// Deletion is id-first: the host resolves a delete request by id when one
/// is given and falls back to the exact display name otherwise. Both
/// deletions report whether anything was actually removed.
pub trait TemplateStore: Send {
    /// All stored templates, sorted by (group, name) case-insensitively.
    fn list(&self) -> TemplateStoreResult<Vec<Template>>;

    /// Insert or replace a template, keyed by its id.
    fn save(&mut self, template: &Template) -> TemplateStoreResult<()>;

    /// Delete the template with this id.
    fn delete_by_id(&mut self, id: &str) -> TemplateStoreResult<bool>;

    /// Delete every template whose name matches exactly.
    fn delete_by_name(&mut self, name: &str) -> TemplateStoreResult<bool>;
}

fn sort_templates(templates: &mut [Template]) {
    templates.sort_by(|a, b| {
        naming::name_key(&a.group)
            .cmp(&naming::name_key(&b.group))
            .then_with(|| naming::name_key(&a.name).cmp(&naming::name_key(&b.name)))
    });
}

/// The templates a fresh install starts with.
pub fn starter_templates() -> Vec<Template> {
    vec![
        Template::new(
            "Single signature",
            DEFAULT_TEMPLATE_GROUP,
            vec![TemplateItem::new("Signature", 144.0, 48.0)],
        ),
        Template::new(
            "Signer and witness",
            DEFAULT_TEMPLATE_GROUP,
            vec![
                TemplateItem::new("Signer", 144.0, 48.0),
                TemplateItem::new("Witness", 144.0, 48.0).with_offset(0.0, 72.0),
            ],
        ),
    ]
}

/// Directory-backed template store.
///
/// Stores one JSON file per template, named by the template id. Files that
/// fail to parse are skipped with a warning so one corrupt template cannot
/// take the whole library down.
pub struct DirTemplateStore {
    /// Base directory for template storage.
    base_path: PathBuf,
}

impl DirTemplateStore {
    /// Create a directory store over the given base directory.
    ///
    /// Creates the directory if it doesn't exist. Does not seed anything;
    /// see [`DirTemplateStore::seed_if_empty`].
    pub fn new(base_path: PathBuf) -> TemplateStoreResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                TemplateStoreError::Io(format!("Failed to create template directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create a store in the default location, seeding starters on first
    /// run.
    ///
    /// On Unix: `~/.local/share/signfield/templates/`
    /// On Windows: `%LOCALAPPDATA%\signfield\templates\`
    pub fn default_location() -> TemplateStoreResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| {
                TemplateStoreError::Io("Could not determine home directory".to_string())
            })?;
        let mut store = Self::new(base.join("signfield").join("templates"))?;
        store.seed_if_empty()?;
        Ok(store)
    }

    /// Write the starter templates when the directory holds none.
    pub fn seed_if_empty(&mut self) -> TemplateStoreResult<()> {
        if !self.list()?.is_empty() {
            return Ok(());
        }
        for template in starter_templates() {
            self.save(&template)?;
        }
        log::info!("Seeded starter templates in {}", self.base_path.display());
        Ok(())
    }

    /// Get the base path.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    /// Get the file path for a template id.
    fn template_path(&self, id: &str) -> PathBuf {
        // Sanitize the id to be safe for filenames
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_id))
    }

    /// Every parseable template file, paired with its path.
    fn read_all(&self) -> TemplateStoreResult<Vec<(PathBuf, Template)>> {
        if !self.base_path.exists() {
            return Ok(vec![]);
        }
        let entries = fs::read_dir(&self.base_path)
            .map_err(|e| TemplateStoreError::Io(format!("Failed to read directory: {}", e)))?;

        let mut templates = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                let json = match fs::read_to_string(&path) {
                    Ok(j) => j,
                    Err(e) => {
                        log::warn!("Skipping unreadable template {}: {}", path.display(), e);
                        continue;
                    }
                };
                match serde_json::from_str::<Template>(&json) {
                    Ok(mut template) => {
                        template.repair();
                        templates.push((path, template));
                    }
                    Err(e) => {
                        log::warn!("Skipping malformed template {}: {}", path.display(), e);
                    }
                }
            }
        }
        Ok(templates)
    }
}

impl TemplateStore for DirTemplateStore {
    fn list(&self) -> TemplateStoreResult<Vec<Template>> {
        let mut templates: Vec<Template> =
            self.read_all()?.into_iter().map(|(_, t)| t).collect();
        sort_templates(&mut templates);
        Ok(templates)
    }

    fn save(&mut self, template: &Template) -> TemplateStoreResult<()> {
        let json = serde_json::to_string_pretty(template)
            .map_err(|e| TemplateStoreError::Serialization(e.to_string()))?;
        let path = self.template_path(&template.id);
        fs::write(&path, json).map_err(|e| {
            TemplateStoreError::Io(format!("Failed to write {}: {}", path.display(), e))
        })
    }

    fn delete_by_id(&mut self, id: &str) -> TemplateStoreResult<bool> {
        // Hand-dropped files may be named anything, so match on content.
        let mut removed = false;
        for (path, template) in self.read_all()? {
            if template.id == id {
                fs::remove_file(&path).map_err(|e| {
                    TemplateStoreError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
                removed = true;
            }
        }
        Ok(removed)
    }

    fn delete_by_name(&mut self, name: &str) -> TemplateStoreResult<bool> {
        let mut removed = false;
        for (path, template) in self.read_all()? {
            if template.name == name {
                fs::remove_file(&path).map_err(|e| {
                    TemplateStoreError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
                removed = true;
            }
        }
        Ok(removed)
    }
}

/// In-memory template store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryTemplateStore {
    templates: Vec<Template>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with the starter templates.
    pub fn with_starters() -> Self {
        Self {
            templates: starter_templates(),
        }
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn list(&self) -> TemplateStoreResult<Vec<Template>> {
        let mut templates = self.templates.clone();
        sort_templates(&mut templates);
        Ok(templates)
    }

    fn save(&mut self, template: &Template) -> TemplateStoreResult<()> {
        match self.templates.iter_mut().find(|t| t.id == template.id) {
            Some(slot) => *slot = template.clone(),
            None => self.templates.push(template.clone()),
        }
        Ok(())
    }

    fn delete_by_id(&mut self, id: &str) -> TemplateStoreResult<bool> {
        let before = self.templates.len();
        self.templates.retain(|t| t.id != id);
        Ok(self.templates.len() < before)
    }

    fn delete_by_name(&mut self, name: &str) -> TemplateStoreResult<bool> {
        let before = self.templates.len();
        self.templates.retain(|t| t.name != name);
        Ok(self.templates.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_dir_store_save_list() {
        let dir = tempdir().unwrap();
        let mut store = DirTemplateStore::new(dir.path().to_path_buf()).unwrap();

        let template = Template::new("Pair", "Contracts", vec![TemplateItem::new("A", 100.0, 40.0)]);
        store.save(&template).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], template);
    }

    #[test]
    fn test_dir_store_save_overwrites_same_id() {
        let dir = tempdir().unwrap();
        let mut store = DirTemplateStore::new(dir.path().to_path_buf()).unwrap();

        let mut template = Template::new("Before", DEFAULT_TEMPLATE_GROUP, vec![]);
        store.save(&template).unwrap();
        template.name = "After".to_string();
        store.save(&template).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "After");
    }

    #[test]
    fn test_dir_store_delete_by_id_and_name() {
        let dir = tempdir().unwrap();
        let mut store = DirTemplateStore::new(dir.path().to_path_buf()).unwrap();

        let a = Template::new("Alpha", DEFAULT_TEMPLATE_GROUP, vec![]);
        let b = Template::new("Beta", DEFAULT_TEMPLATE_GROUP, vec![]);
        store.save(&a).unwrap();
        store.save(&b).unwrap();

        assert!(store.delete_by_id(&a.id).unwrap());
        assert!(!store.delete_by_id(&a.id).unwrap());
        assert!(store.delete_by_name("Beta").unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_dir_store_sanitizes_id_for_filename() {
        let dir = tempdir().unwrap();
        let mut store = DirTemplateStore::new(dir.path().to_path_buf()).unwrap();

        let mut template = Template::new("Odd", DEFAULT_TEMPLATE_GROUP, vec![]);
        template.id = "a/b:c*d".to_string();
        store.save(&template).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed[0].id, "a/b:c*d");
        assert!(store.delete_by_id("a/b:c*d").unwrap());
    }

    #[test]
    fn test_dir_store_skips_malformed_files() {
        let dir = tempdir().unwrap();
        let mut store = DirTemplateStore::new(dir.path().to_path_buf()).unwrap();

        store
            .save(&Template::new("Good", DEFAULT_TEMPLATE_GROUP, vec![]))
            .unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Good");
    }

    #[test]
    fn test_dir_store_repairs_blank_ids_on_read() {
        let dir = tempdir().unwrap();
        let store = DirTemplateStore::new(dir.path().to_path_buf()).unwrap();

        fs::write(
            dir.path().join("legacy.json"),
            r#"{"name": "Legacy", "items": []}"#,
        )
        .unwrap();

        let listed = store.list().unwrap();
        assert!(!listed[0].id.is_empty());
        assert_eq!(listed[0].group, DEFAULT_TEMPLATE_GROUP);
    }

    #[test]
    fn test_seed_if_empty_only_seeds_once() {
        let dir = tempdir().unwrap();
        let mut store = DirTemplateStore::new(dir.path().to_path_buf()).unwrap();

        store.seed_if_empty().unwrap();
        let seeded = store.list().unwrap();
        assert_eq!(seeded.len(), 2);

        // a second call must not duplicate or replace anything
        store.seed_if_empty().unwrap();
        assert_eq!(store.list().unwrap(), seeded);
    }

    #[test]
    fn test_starters_are_sorted_general_group() {
        let store = MemoryTemplateStore::with_starters();
        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|t| t.group == DEFAULT_TEMPLATE_GROUP));
        assert_eq!(listed[0].name, "Signer and witness");
        assert_eq!(listed[1].name, "Single signature");
    }

    #[test]
    fn test_memory_store_save_replaces_by_id() {
        let mut store = MemoryTemplateStore::new();
        let mut template = Template::new("One", DEFAULT_TEMPLATE_GROUP, vec![]);
        store.save(&template).unwrap();
        template.items.push(TemplateItem::new("Added", 80.0, 30.0));
        store.save(&template).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].items.len(), 1);
    }
}
