use std::fs::File;
use std::path::Path;

/// Extension (compared case-insensitively) that marks a file as a zip container.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Returns true when the file name says the file should be a zip container.
pub fn is_archive_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION))
}

/// Structural validity check for a file on disk.
///
/// Files that are not named as archives are always valid. Archives are valid
/// when the end-of-central-directory record can be located and the entry table
/// read back. Entry CRCs are not checked.
pub fn is_valid_archive(path: &Path) -> bool {
    if !is_archive_path(path) {
        return true;
    }

    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            tracing::debug!(path = %path.display(), "Cannot open archive for validation: {}", err);
            return false;
        }
    };

    match zip::ZipArchive::new(file) {
        Ok(_) => true,
        Err(err) => {
            tracing::debug!(path = %path.display(), "Archive failed validation: {}", err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, data) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_archive_path_detection() {
        assert!(is_archive_path(Path::new("dlc/DLCIndex.zip")));
        assert!(is_archive_path(Path::new("dlc/UPPER.ZIP")));
        assert!(!is_archive_path(Path::new("dlc/asset.pvr")));
        assert!(!is_archive_path(Path::new("dlc/zip")));
    }

    #[test]
    fn test_well_formed_zip_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.zip");
        write_zip(&path, &[("index.xml", &b"<Root/>"[..])]);

        assert!(is_valid_archive(&path));
    }

    #[test]
    fn test_truncated_zip_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.zip");
        write_zip(&path, &[("index.xml", &b"<Root><IndexFile index=\"a:b.zip\"/></Root>"[..])]);

        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        assert!(!is_valid_archive(&path));
    }

    #[test]
    fn test_garbage_with_zip_extension_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.zip");
        std::fs::write(&path, b"<html>404 Not Found</html>").unwrap();

        assert!(!is_valid_archive(&path));
    }

    #[test]
    fn test_non_archive_files_are_always_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("texture.pvr");
        std::fs::write(&path, b"not an archive at all").unwrap();

        assert!(is_valid_archive(&path));
    }

    #[test]
    fn test_missing_archive_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_valid_archive(&dir.path().join("missing.zip")));
    }
}
