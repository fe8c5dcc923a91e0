//! Helpers for inspecting output directories.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Every regular file below `dir`, sorted.
pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// True for writer temp files, `tmp.<pid>.<secs>.<usecs>.tmp`.
pub fn is_tmp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with("tmp.") && n.ends_with(".tmp"))
        .unwrap_or(false)
}

/// Writer temp files left below `dir`.
pub fn tmp_files_under(dir: &Path) -> Vec<PathBuf> {
    files_under(dir)
        .into_iter()
        .filter(|p| is_tmp_file(p))
        .collect()
}

/// File names (no directories) of every file below `dir`, sorted.
pub fn file_names_under(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = files_under(dir)
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_under_recurses() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("2013/20130602")).unwrap();
        std::fs::write(dir.path().join("2013/20130602/a.nc"), b"x").unwrap();
        std::fs::write(dir.path().join("tmp.1.2.000003.tmp"), b"x").unwrap();

        assert_eq!(files_under(dir.path()).len(), 2);
        assert_eq!(tmp_files_under(dir.path()).len(), 1);
        assert_eq!(
            file_names_under(dir.path()),
            vec!["a.nc".to_string(), "tmp.1.2.000003.tmp".to_string()]
        );
    }

    #[test]
    fn test_is_tmp_file() {
        assert!(is_tmp_file(Path::new("/x/tmp.123.456.000789.tmp")));
        assert!(!is_tmp_file(Path::new("/x/cfrad.20130602_030405.nc")));
    }
}
