//! Zip packaging of a rendered output tree.

use std::fs::File;
use std::io::{self, Cursor};
use std::path::Path;

use thiserror::Error;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("output directory {0} does not exist")]
    MissingOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to walk output tree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Compress everything under `dir` into an in-memory zip archive.
///
/// Entry names are relative to `dir` and use `/` separators. Entries are
/// sorted by name so identical trees give identical archives.
pub fn zip_dir(dir: &Path) -> Result<Vec<u8>, ArchiveError> {
    if !dir.is_dir() {
        return Err(ArchiveError::MissingOutput(dir.display().to_string()));
    }

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(dir)
            .map_err(io::Error::other)?;
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            writer.add_directory(format!("{name}/"), options)?;
        } else if entry.file_type().is_file() {
            writer.start_file(name, options)?;
            let mut file = File::open(entry.path())?;
            io::copy(&mut file, &mut writer)?;
        }
    }

    Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use tempfile::tempdir;
    use zip::ZipArchive;

    #[test]
    fn test_zip_dir_contains_tree() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("_static")).unwrap();
        fs::write(dir.path().join("index.html"), "<p>hi</p>").unwrap();
        fs::write(dir.path().join("_static/site.css"), "body{}").unwrap();

        let bytes = zip_dir(dir.path()).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["_static/", "_static/site.css", "index.html"]);

        let mut html = String::new();
        archive
            .by_name("index.html")
            .unwrap()
            .read_to_string(&mut html)
            .unwrap();
        assert_eq!(html, "<p>hi</p>");
    }

    #[test]
    fn test_zip_dir_missing_output() {
        let dir = tempdir().unwrap();
        let err = zip_dir(&dir.path().join("build/html")).unwrap_err();
        assert!(matches!(err, ArchiveError::MissingOutput(_)));
    }

    #[test]
    fn test_zip_dir_empty_tree_is_valid_archive() {
        let dir = tempdir().unwrap();
        let bytes = zip_dir(dir.path()).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
