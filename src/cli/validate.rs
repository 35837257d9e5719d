//! Validate command for class directories

use anyhow::{Context, Result};
use std::path::Path;
use telegraf_sidecar_controller::classdata::DirectoryClassData;

/// Load every class in `directory`, failing on the first invalid one
pub fn validate_classes_command(directory: &Path) -> Result<()> {
    println!("► validating classes in {}", directory.display());

    let classes = DirectoryClassData::new(directory)
        .with_context(|| format!("Class validation failed for {}", directory.display()))?;

    for name in classes.class_names() {
        println!("✔ {name}");
    }
    println!("✅ all classes are valid");

    Ok(())
}
