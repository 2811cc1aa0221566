//! Slug and output path uniqueness

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::content::Slug;
use crate::error::{DocumentError, SlugConflict};

/// Accumulates slug and output path claims for one build. The first
/// claimant keeps the slug; everyone after it is recorded as a conflict.
///
/// Output paths are tracked as a tree: a file can be neither another
/// claimed file nor a directory some other claimed file lives under.
#[derive(Debug, Default)]
pub struct SlugRegistry {
    claims: BTreeMap<Slug, Vec<PathBuf>>,
    /// Output file → owner
    files: BTreeMap<PathBuf, PathBuf>,
    /// Output directory → owner of the first file below it
    dirs: BTreeMap<PathBuf, PathBuf>,
}

impl SlugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve an output file that is not a page (feed, copied asset).
    /// On a clash, returns the owner already holding the path.
    pub fn reserve(&mut self, output: &Path, owner: &Path) -> Result<(), PathBuf> {
        if let Some(occupant) = self.occupant(output) {
            return Err(occupant.clone());
        }
        self.occupy(output, owner);
        Ok(())
    }

    /// Claim `slug` and its output file for `source`
    pub fn claim(&mut self, slug: &Slug, output: &Path, source: &Path) -> Result<(), DocumentError> {
        if let Some(claimants) = self.claims.get_mut(slug) {
            claimants.push(source.to_path_buf());
            return Err(DocumentError::DuplicateSlug {
                path: source.to_path_buf(),
                slug: slug.to_string(),
                winner: claimants[0].clone(),
            });
        }

        if let Some(occupant) = self.occupant(output) {
            return Err(DocumentError::OutputConflict {
                path: source.to_path_buf(),
                output: output.to_path_buf(),
                owner: occupant.clone(),
            });
        }

        self.claims.insert(slug.clone(), vec![source.to_path_buf()]);
        self.occupy(output, source);
        Ok(())
    }

    /// Who already holds `output`, as the same file, as a directory, or as a
    /// file where `output` needs a directory
    fn occupant(&self, output: &Path) -> Option<&PathBuf> {
        self.files
            .get(output)
            .or_else(|| self.dirs.get(output))
            .or_else(|| output.ancestors().skip(1).find_map(|dir| self.files.get(dir)))
    }

    fn occupy(&mut self, output: &Path, owner: &Path) {
        self.files.insert(output.to_path_buf(), owner.to_path_buf());
        for dir in output.ancestors().skip(1) {
            if dir.as_os_str().is_empty() {
                continue;
            }
            self.dirs
                .entry(dir.to_path_buf())
                .or_insert_with(|| owner.to_path_buf());
        }
    }

    /// Slugs claimed more than once, ordered by slug
    pub fn conflicts(&self) -> Vec<SlugConflict> {
        self.claims
            .iter()
            .filter(|(_, paths)| paths.len() > 1)
            .map(|(slug, paths)| SlugConflict {
                slug: slug.to_string(),
                paths: paths.clone(),
            })
            .collect()
    }

    /// Number of distinct slugs claimed
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}
