//! Build configuration templates staged into every project.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use include_dir::{include_dir, Dir, DirEntry};

use crate::staging::copy_tree;

/// Default Sphinx project skeleton: `source/conf.py`, `Makefile`, `make.bat`.
static DEFAULT_TEMPLATES: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/templates");

/// Where the staged configuration files come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Templates compiled into the binary
    Embedded,
    /// A template tree on disk, copied verbatim
    Directory(PathBuf),
}

impl TemplateSource {
    pub fn from_dir(dir: Option<PathBuf>) -> Self {
        match dir {
            Some(dir) => Self::Directory(dir),
            None => Self::Embedded,
        }
    }

    /// Copy the template tree into `root`, returning the number of files written.
    pub fn stage_into(&self, root: &Path) -> io::Result<usize> {
        match self {
            TemplateSource::Embedded => {
                let mut written = Vec::new();
                write_embedded(&DEFAULT_TEMPLATES, root, true, &mut written)?;
                Ok(written.len())
            }
            TemplateSource::Directory(dir) => {
                if !dir.is_dir() {
                    return Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("template directory {} does not exist", dir.display()),
                    ));
                }
                copy_tree(dir, root)
            }
        }
    }
}

/// Write the built-in templates under `dest`, skipping files that already exist.
///
/// Returns the paths that were created.
pub fn write_default_templates(dest: &Path) -> io::Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    write_embedded(&DEFAULT_TEMPLATES, dest, false, &mut written)?;
    Ok(written)
}

fn write_embedded(
    dir: &Dir<'_>,
    dest: &Path,
    overwrite: bool,
    written: &mut Vec<PathBuf>,
) -> io::Result<()> {
    for entry in dir.entries() {
        match entry {
            DirEntry::Dir(sub) => {
                fs::create_dir_all(dest.join(sub.path()))?;
                write_embedded(sub, dest, overwrite, written)?;
            }
            DirEntry::File(file) => {
                let target = dest.join(file.path());
                if !overwrite && target.exists() {
                    continue;
                }
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&target, file.contents())?;
                written.push(target);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_embedded_templates_contain_sphinx_skeleton() {
        let dir = tempdir().unwrap();
        let count = TemplateSource::Embedded.stage_into(dir.path()).unwrap();
        assert_eq!(count, 3);
        assert!(dir.path().join("source/conf.py").is_file());
        assert!(dir.path().join("Makefile").is_file());
        assert!(dir.path().join("make.bat").is_file());
    }

    #[test]
    fn test_directory_templates_copied_verbatim() {
        let src = tempdir().unwrap();
        fs::create_dir_all(src.path().join("source")).unwrap();
        fs::write(src.path().join("source/conf.py"), "project = 'x'\n").unwrap();

        let dest = tempdir().unwrap();
        let source = TemplateSource::from_dir(Some(src.path().to_path_buf()));
        assert_eq!(source.stage_into(dest.path()).unwrap(), 1);
        assert_eq!(
            fs::read_to_string(dest.path().join("source/conf.py")).unwrap(),
            "project = 'x'\n"
        );
    }

    #[test]
    fn test_missing_template_dir_is_not_found() {
        let dest = tempdir().unwrap();
        let source = TemplateSource::Directory(dest.path().join("nope"));
        let err = source.stage_into(dest.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_write_default_templates_skips_existing() {
        let dest = tempdir().unwrap();
        fs::write(dest.path().join("Makefile"), "custom").unwrap();
        let written = write_default_templates(dest.path()).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(fs::read_to_string(dest.path().join("Makefile")).unwrap(), "custom");
    }
}
