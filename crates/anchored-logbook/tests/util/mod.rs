use std::{fs, path::Path};
use std::path::PathBuf;


/// A scratch directory unique to this process and test, recreated empty on every run.
pub fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("anchored-logbook-tests")
        .join(format!("{}-{test}", std::process::id()));

    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// The destination file's lines, without terminators.
pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_owned)
        .collect()
}
