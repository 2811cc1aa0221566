//! Build the site, optionally rebuilding on changes

use anyhow::{Context, Result};
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

use crate::generator::{BuildOptions, BuildReport};
use crate::Site;

/// Build the site once and log the summary
pub fn run(site: &Site, options: BuildOptions) -> Result<BuildReport> {
    tracing::info!(
        "Building {:?} into {:?}{}",
        site.input_dir,
        site.output_dir,
        if options.strict { " (strict)" } else { "" }
    );
    let report = site.build(options)?;

    if report.has_issues() {
        tracing::warn!("{} document(s) had issues:", report.issues.len());
        for issue in &report.issues {
            tracing::warn!("  {}", issue);
        }
    }
    Ok(report)
}

/// Watch the input directory and rebuild after each burst of changes.
/// Blocks until the watcher shuts down; `on_rebuild` runs after every
/// successful rebuild.
pub fn watch<F>(site: &Site, options: BuildOptions, mut on_rebuild: F) -> Result<()>
where
    F: FnMut(&BuildReport),
{
    let (tx, rx) = channel();
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    let input_dir = fs::canonicalize(&site.input_dir)
        .with_context(|| format!("cannot watch {:?}", site.input_dir))?;
    debouncer
        .watcher()
        .watch(&input_dir, RecursiveMode::Recursive)?;
    tracing::debug!("Watching: {:?}", input_dir);

    if let Some(config_path) = &site.config_path {
        let config_path = fs::canonicalize(config_path)?;
        if !config_path.starts_with(&input_dir) {
            debouncer
                .watcher()
                .watch(&config_path, RecursiveMode::NonRecursive)?;
            tracing::debug!("Watching: {:?}", config_path);
        }
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                // Created on the first build if it did not exist yet
                let output_dir = fs::canonicalize(&site.output_dir).ok();
                let changed: Vec<&PathBuf> = events
                    .iter()
                    .map(|e| &e.path)
                    .filter(|path| is_relevant(path, &input_dir, output_dir.as_deref()))
                    .collect();
                if changed.is_empty() {
                    continue;
                }
                for path in &changed {
                    tracing::info!("File changed: {}", path.display());
                }

                // Picks up edits to the configuration file too
                let result = site
                    .reload()
                    .map_err(anyhow::Error::from)
                    .and_then(|site| run(&site, options));
                match result {
                    Ok(report) => on_rebuild(&report),
                    Err(e) => tracing::error!("Rebuild failed: {:#}", e),
                }
            }
            Ok(Err(e)) => tracing::error!("Watch error: {:?}", e),
            Err(_) => break,
        }
    }

    Ok(())
}

/// Changes inside the output directory, hidden files and editor backups
/// never trigger a rebuild
fn is_relevant(path: &Path, input_dir: &Path, output_dir: Option<&Path>) -> bool {
    if output_dir.is_some_and(|out| path.starts_with(out)) {
        return false;
    }
    if path.to_string_lossy().ends_with('~') {
        return false;
    }
    // Outside the input directory only the config file is watched
    let Ok(relative) = path.strip_prefix(input_dir) else {
        return true;
    };
    !relative.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_relevant() {
        let site = Path::new("/site");
        let out = Path::new("/site/public");
        assert!(is_relevant(Path::new("/site/post.md"), site, Some(out)));
        assert!(is_relevant(Path::new("/site/_layouts/default.html"), site, Some(out)));
        assert!(!is_relevant(Path::new("/site/public/post/index.html"), site, Some(out)));
        assert!(!is_relevant(Path::new("/site/.git/HEAD"), site, Some(out)));
        assert!(!is_relevant(Path::new("/site/post.md~"), site, None));
    }

    #[test]
    fn test_is_relevant_under_hidden_ancestor() {
        let site = Path::new("/home/u/.sites/blog");
        assert!(is_relevant(Path::new("/home/u/.sites/blog/post.md"), site, None));
        assert!(!is_relevant(Path::new("/home/u/.sites/blog/.cache/x.md"), site, None));
        assert!(is_relevant(Path::new("/home/u/.sites/_config.yml"), site, None));
    }
}
