//! Find Broad jars across the installation layouts seen in the wild.

use std::path::PathBuf;
use tracing::debug;

use crate::{BroadError, Result};

/// Subdirectories probed under each base directory, in search order
const CANDIDATE_SUBDIRS: &[&[&str]] = &[
    &[],
    &["..", "gatk"],
    &["dist"],
    &["GATK"],
    &["GATK", "dist"],
    &["muTect"],
    &["MuTect"],
    &["Picard-private", "dist"],
];

#[derive(Debug, Clone)]
pub struct ToolLocator {
    gatk_dir: PathBuf,
    picard_ref: PathBuf,
}

impl ToolLocator {
    pub fn new(gatk_dir: PathBuf, picard_ref: PathBuf) -> Self {
        Self { gatk_dir, picard_ref }
    }

    /// Candidate directories in search order, GATK base first
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        [&self.gatk_dir, &self.picard_ref]
            .iter()
            .flat_map(|base| {
                CANDIDATE_SUBDIRS
                    .iter()
                    .map(move |parts| parts.iter().fold(base.to_path_buf(), |p, part| p.join(part)))
            })
            .collect()
    }

    /// Locate `<name>.jar`, falling back to each alternate name in turn.
    ///
    /// The first existing file wins; jar contents are not checked.
    pub fn locate(&self, name: &str, alternates: &[&str]) -> Result<PathBuf> {
        let dirs = self.search_dirs();
        for check in std::iter::once(name).chain(alternates.iter().copied()) {
            let jar = format!("{}.jar", check);
            if let Some(found) = dirs.iter().map(|d| d.join(&jar)).find(|p| p.exists()) {
                debug!("Located {} at {}", check, found.display());
                return Ok(found);
            }
        }

        Err(BroadError::ToolNotFound {
            name: name.to_string(),
            picard_ref: self.picard_ref.clone(),
            gatk_dir: self.gatk_dir.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_search_dir_order() {
        let locator = ToolLocator::new(PathBuf::from("/g"), PathBuf::from("/p"));
        let dirs = locator.search_dirs();
        assert_eq!(dirs.len(), 16);
        assert_eq!(dirs[0], PathBuf::from("/g"));
        assert_eq!(dirs[1], PathBuf::from("/g/../gatk"));
        assert_eq!(dirs[7], PathBuf::from("/g/Picard-private/dist"));
        assert_eq!(dirs[8], PathBuf::from("/p"));
    }

    #[test]
    fn test_locate_in_dist_subdir() {
        let tmp = TempDir::new().unwrap();
        let jar = tmp.path().join("gatk/dist/GenomeAnalysisTK.jar");
        touch(&jar);

        let locator = ToolLocator::new(tmp.path().join("gatk"), tmp.path().join("picard"));
        assert_eq!(locator.locate("GenomeAnalysisTK", &[]).unwrap(), jar);
    }

    #[test]
    fn test_primary_name_beats_alternate() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("tools");
        touch(&base.join("GenomeAnalysisTKLite.jar"));
        touch(&base.join("GATK/dist/GenomeAnalysisTK.jar"));

        let locator = ToolLocator::new(base.clone(), base.clone());
        let found = locator
            .locate("GenomeAnalysisTK", &["GenomeAnalysisTKLite"])
            .unwrap();
        assert_eq!(found, base.join("GATK/dist/GenomeAnalysisTK.jar"));
    }

    #[test]
    fn test_alternate_used_when_primary_missing() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("tools");
        touch(&base.join("GenomeAnalysisTKLite.jar"));

        let locator = ToolLocator::new(base.clone(), base.clone());
        let found = locator
            .locate("GenomeAnalysisTK", &["GenomeAnalysisTKLite"])
            .unwrap();
        assert_eq!(found, base.join("GenomeAnalysisTKLite.jar"));
    }

    #[test]
    fn test_sibling_gatk_directory() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("gatk/GenomeAnalysisTK.jar"));
        fs::create_dir_all(tmp.path().join("picard")).unwrap();

        let picard = tmp.path().join("picard");
        let locator = ToolLocator::new(picard.clone(), picard);
        let found = locator.locate("GenomeAnalysisTK", &[]).unwrap();
        assert!(found.ends_with("gatk/GenomeAnalysisTK.jar"));
    }

    #[test]
    fn test_not_found_names_both_roots() {
        let locator = ToolLocator::new(
            PathBuf::from("/nowhere/gatk"),
            PathBuf::from("/nowhere/picard"),
        );
        let err = locator.locate("muTect", &[]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("muTect"));
        assert!(msg.contains("/nowhere/gatk"));
        assert!(msg.contains("/nowhere/picard"));
    }
}
