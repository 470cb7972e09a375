//! Project staging: lay out one throwaway Sphinx project per build.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::templates::TemplateSource;

/// Directory holding the sources inside a staged project
pub const SOURCE_DIR: &str = "source";
/// The single source document every build renders
pub const MASTER_DOC: &str = "index.rst";
/// Parent of the builder output directory
pub const BUILD_DIR: &str = "build";

/// Paths of a staged project rooted in a per-build directory.
#[derive(Debug, Clone)]
pub struct StagedProject {
    pub root: PathBuf,
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl StagedProject {
    pub fn master_doc(&self) -> PathBuf {
        self.source_dir.join(MASTER_DOC)
    }
}

/// Copy the templates into `root` and write `document` as the master doc.
///
/// The document is written after the templates, so a template that ships
/// its own `index.rst` is replaced.
pub fn stage_project(
    root: &Path,
    templates: &TemplateSource,
    document: &str,
    builder: &str,
) -> io::Result<StagedProject> {
    templates.stage_into(root)?;

    let project = StagedProject {
        root: root.to_path_buf(),
        source_dir: root.join(SOURCE_DIR),
        output_dir: root.join(BUILD_DIR).join(builder),
    };
    fs::create_dir_all(&project.source_dir)?;
    fs::write(project.master_doc(), document)?;
    Ok(project)
}

/// Recursively copy `src` into `dest`, returning the number of files copied.
pub(crate) fn copy_tree(src: &Path, dest: &Path) -> io::Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}
