//! Temporary file helpers for loader tests.
//!
//! Loaders take filesystem paths, so fixtures are written to real files that
//! are removed when the returned handle is dropped.

use std::io::Write;
use std::path::PathBuf;

/// Writes `contents` to a new temporary file ending in `suffix`.
///
/// The file is deleted when the returned `NamedTempFile` is dropped.
pub fn write_temp_file(contents: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("mortality_map_")
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temporary test file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temporary test file");
    file.flush().expect("Failed to flush temporary test file");
    file
}

/// Creates a temporary directory for test output.
///
/// The directory is automatically cleaned up when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}

/// A path inside a fresh temporary directory that does not exist.
///
/// The directory handle must be kept alive for as long as the path is used.
pub fn missing_path(name: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = temp_test_dir();
    let path = dir.path().join(name);
    (dir, path)
}
