//! # Config Assembler
//!
//! Turns a class baseline plus a pod's annotations into the sidecar's `telegraf.conf`.
//!
//! - `overrides`: defaults layered with annotation values, collecting warnings
//! - `document`: TOML merge and serialization
//! - `duration`: Go style interval parsing and formatting

mod document;
pub mod duration;
mod overrides;

use thiserror::Error;

pub use document::build_document;
pub use overrides::{apply_overrides, OverrideSet};

/// Errors that prevent a configuration document from being built
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// The selected class is not loaded
    #[error("failed to get class data: {class}, class name doesn't exist")]
    ClassNotFound { class: String },
    /// The class document is not valid TOML
    #[error("failed to parse class data for {class}, error: {source}")]
    ClassParse {
        class: String,
        #[source]
        source: toml::de::Error,
    },
    /// The raw input annotation is not valid TOML
    #[error("failed to parse raw input annotation data, error: {0}")]
    RawInputParse(#[source] toml::de::Error),
    /// A section that must be a table has another type
    #[error("{origin} defines {key} as a {found}, expected a table")]
    NotATable {
        origin: String,
        key: String,
        found: &'static str,
    },
    /// The merged document could not be serialized
    #[error("failed to serialize final toml output, error: {0}")]
    Serialization(#[from] toml::ser::Error),
}
