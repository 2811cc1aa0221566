//! Clean the output directory

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Remove the output directory if it exists
pub fn run(output_dir: &Path) -> Result<()> {
    if output_dir.exists() {
        fs::remove_dir_all(output_dir)
            .with_context(|| format!("failed to delete {:?}", output_dir))?;
        tracing::info!("Deleted: {:?}", output_dir);
    } else {
        tracing::debug!("Nothing to clean at {:?}", output_dir);
    }
    Ok(())
}
