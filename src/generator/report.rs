//! Build summary

use std::fmt;

use crate::error::DocumentError;

/// Outcome of a build
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Documents discovered under the content root
    pub processed: usize,
    /// Pages written
    pub rendered: usize,
    /// Unreadable or malformed documents, and losers of slug or output conflicts
    pub skipped: usize,
    /// Documents that failed validation or rendering
    pub failed: usize,
    /// Every per-document issue, in load order
    pub issues: Vec<DocumentError>,
    /// Non-Markdown files copied
    pub assets: usize,
}

impl BuildReport {
    /// Record a per-document issue
    pub fn record(&mut self, issue: DocumentError) {
        if issue.is_skip() {
            self.skipped += 1;
            tracing::warn!("Skipped: {}", issue);
        } else {
            self.failed += 1;
            tracing::warn!("Failed: {}", issue);
        }
        self.issues.push(issue);
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed, {} rendered, {} skipped, {} failed",
            self.processed, self.rendered, self.skipped, self.failed
        )
    }
}
