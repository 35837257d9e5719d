//! # Directory Class Data
//!
//! [`ClassDataHandler`] backed by a directory of class files.

use super::{ClassDataError, ClassDataHandler};
use crate::observability;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info, warn};

type Snapshot = Arc<HashMap<String, Arc<str>>>;

/// Class documents loaded from a directory
///
/// Readers clone an `Arc` to the current snapshot under a read lock. A reload builds
/// and validates a new snapshot without holding that lock and only takes the write
/// lock to swap the pointer, so a failed reload is never visible to readers.
pub struct DirectoryClassData {
    path: PathBuf,
    snapshot: RwLock<Snapshot>,
    // Serialises reloads; never held by readers
    reload_lock: Mutex<()>,
}

impl std::fmt::Debug for DirectoryClassData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let classes = self.class_names();
        f.debug_struct("DirectoryClassData")
            .field("path", &self.path)
            .field("classes", &classes)
            .finish()
    }
}

impl DirectoryClassData {
    /// Load and validate every class in `path`
    ///
    /// # Errors
    ///
    /// Fails when the directory cannot be read, contains no classes, or any class is
    /// not valid TOML. The controller refuses to start in that case.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, ClassDataError> {
        let path = path.into();
        let snapshot = load_snapshot(&path)?;

        info!(
            path = %path.display(),
            classes = snapshot.len(),
            "Loaded telegraf class data"
        );

        Ok(Self {
            path,
            snapshot: RwLock::new(snapshot),
            reload_lock: Mutex::new(()),
        })
    }

    /// Directory the classes are read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sorted names of the classes currently served
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .current()
            .map(|snapshot| snapshot.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    fn current(&self) -> Option<Snapshot> {
        match self.snapshot.read() {
            Ok(guard) => Some(Arc::clone(&guard)),
            Err(e) => {
                warn!("Class data lock poisoned on read: {}", e);
                None
            }
        }
    }
}

impl ClassDataHandler for DirectoryClassData {
    fn class_data(&self, class: &str) -> Option<Arc<str>> {
        self.current()
            .and_then(|snapshot| snapshot.get(class).map(Arc::clone))
    }

    fn reload(&self) -> Result<usize, ClassDataError> {
        let _reload_guard = self
            .reload_lock
            .lock()
            .map_err(|_poisoned| ClassDataError::LockPoisoned)?;

        let result = load_snapshot(&self.path);
        observability::metrics::increment_class_reloads(result.is_ok());

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Class data reload failed, continuing to serve previous classes"
                );
                return Err(e);
            }
        };

        let count = snapshot.len();
        {
            let mut current = self
                .snapshot
                .write()
                .map_err(|_poisoned| ClassDataError::LockPoisoned)?;
            *current = snapshot;
        }

        info!(path = %self.path.display(), classes = count, "Reloaded telegraf class data");
        Ok(count)
    }
}

/// Read and validate a complete snapshot of the class directory
fn load_snapshot(path: &Path) -> Result<Snapshot, ClassDataError> {
    let classes = read_class_data(path)?;
    validate(path, &classes)?;
    Ok(Arc::new(classes))
}

/// Read every regular file in `path`, keyed by file name
///
/// Symlinks are followed, so the `..data` links of a mounted ConfigMap resolve to the
/// real files while the timestamped data directory itself is skipped.
pub(crate) fn read_class_data(path: &Path) -> Result<HashMap<String, Arc<str>>, ClassDataError> {
    let load_error = |path: &Path, source| ClassDataError::Load {
        path: path.to_path_buf(),
        source,
    };

    let entries = std::fs::read_dir(path).map_err(|e| load_error(path, e))?;
    let mut classes = HashMap::new();

    for entry in entries {
        let entry = entry.map_err(|e| load_error(path, e))?;
        let file_path = entry.path();
        let metadata = std::fs::metadata(&file_path).map_err(|e| load_error(&file_path, e))?;

        if !metadata.is_file() {
            debug!(path = %file_path.display(), "Skipping non-regular class entry");
            continue;
        }

        let data = std::fs::read_to_string(&file_path).map_err(|e| load_error(&file_path, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        classes.insert(name, Arc::from(data));
    }

    Ok(classes)
}

/// Ensure the set is non-empty and that every class parses as TOML
pub(crate) fn validate(
    path: &Path,
    classes: &HashMap<String, Arc<str>>,
) -> Result<(), ClassDataError> {
    if classes.is_empty() {
        return Err(ClassDataError::Empty {
            path: path.to_path_buf(),
        });
    }

    // Sorted so the reported file is stable across runs
    let mut names: Vec<&String> = classes.keys().collect();
    names.sort();

    for name in names {
        let data = &classes[name];
        if let Err(source) = data.parse::<toml::Table>() {
            return Err(ClassDataError::Validation {
                class: name.clone(),
                source,
            });
        }
    }

    Ok(())
}
