//! Directory listing and filename splitting shared by every call site.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Regular files in `dir`, sorted by path so the batch order (and the order
/// of records in the results file) is deterministic.
pub fn list_regular_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Split a full path into (directory, stem, extension).
///
/// The directory keeps its trailing separator and defaults to `"./"` when the
/// path has no separator at all; in that case the whole input stays in the
/// stem. A dot before the last separator is not an extension separator. The
/// extension includes the leading dot.
pub fn split_path(full: &str) -> (String, String, String) {
    let mut dir = "./".to_string();
    let mut stem = full.to_string();
    let mut extension = String::new();

    if let Some(last_slash) = full.rfind('/') {
        dir = full[..=last_slash].to_string();
        match full.rfind('.') {
            Some(last_dot) if last_dot > last_slash => {
                stem = full[last_slash + 1..last_dot].to_string();
                extension = full[last_dot..].to_string();
            }
            _ => {
                stem = full[last_slash + 1..].to_string();
            }
        }
    }

    (dir, stem, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_a_regular_path() {
        let (dir, stem, ext) = split_path("/data/covers/book01.jpg");
        assert_eq!(dir, "/data/covers/");
        assert_eq!(stem, "book01");
        assert_eq!(ext, ".jpg");
    }

    #[test]
    fn no_separator_keeps_everything_in_the_stem() {
        let (dir, stem, ext) = split_path("book01.jpg");
        assert_eq!(dir, "./");
        assert_eq!(stem, "book01.jpg");
        assert_eq!(ext, "");
    }

    #[test]
    fn dot_before_last_separator_is_not_an_extension() {
        let (dir, stem, ext) = split_path("/data/v1.2/readme");
        assert_eq!(dir, "/data/v1.2/");
        assert_eq!(stem, "readme");
        assert_eq!(ext, "");
    }

    #[test]
    fn hidden_style_names_keep_the_leading_dot_extension() {
        let (dir, stem, ext) = split_path("covers/archive.tar.gz");
        assert_eq!(dir, "covers/");
        assert_eq!(stem, "archive.tar");
        assert_eq!(ext, ".gz");
    }
}
