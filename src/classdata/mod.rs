//! # Class Data
//!
//! Named baseline Telegraf configurations ("classes") selectable per pod.
//!
//! Classes are read from a directory where every regular file is one class, keyed by
//! its file name. The directory is usually a mounted ConfigMap. Every class must parse
//! as TOML on its own; a reload that fails validation leaves the previously served
//! classes untouched.

mod directory;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

pub use directory::DirectoryClassData;

/// Errors raised while loading or validating class data
#[derive(Debug, Error)]
pub enum ClassDataError {
    /// The class directory could not be listed or a class file could not be read
    #[error("failed to load class data from {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The directory contained no class files
    #[error("failed to validate class data, no classes found in {path}")]
    Empty { path: PathBuf },
    /// A class file is not syntactically valid TOML
    #[error("failed to validate class data for file: {class}, error: {source}")]
    Validation {
        class: String,
        #[source]
        source: toml::de::Error,
    },
    /// A thread panicked while holding the class data lock
    #[error("class data lock poisoned")]
    LockPoisoned,
}

/// Source of class documents shared by the webhook, the reconciler and the CLI
pub trait ClassDataHandler: Send + Sync + std::fmt::Debug {
    /// Look up the document for `class`; returns `None` when the class is unknown
    fn class_data(&self, class: &str) -> Option<Arc<str>>;

    /// Re-read and re-validate every class, replacing the served set only on success
    ///
    /// Returns the number of classes now being served.
    fn reload(&self) -> Result<usize, ClassDataError>;
}
