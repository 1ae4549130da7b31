//! Common test fixtures for the GFS wind grid tests.

use std::path::Path;

/// A small isobaric stack: pressure levels in hPa, ordered as upstream sends them.
pub const SAMPLE_LEVELS: [u32; 3] = [500, 1000, 850];

/// Reference time used by synthetic messages: 2018-02-19 00Z.
pub const SAMPLE_REFERENCE: (u16, u8, u8, u8) = (2018, 2, 19, 0);

/// POSIX seconds of `SAMPLE_REFERENCE`.
pub const SAMPLE_REFERENCE_EPOCH: i64 = 1_518_998_400;

/// Creates a temporary directory for test output.
///
/// The directory is automatically cleaned up when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}

/// Names of the entries directly under `dir`, sorted.
pub fn dir_listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to list directory")
        .map(|entry| {
            entry
                .expect("Failed to read directory entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_listing() {
        let dir = temp_test_dir();
        std::fs::write(dir.path().join("b.dat"), "").unwrap();
        std::fs::write(dir.path().join("a.dat"), "").unwrap();
        assert_eq!(dir_listing(dir.path()), vec!["a.dat", "b.dat"]);
    }
}
