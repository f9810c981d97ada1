// file: src/archive/mod.rs
// version: 1.0.0
// guid: fd132d0e-fd03-41ad-8053-5e179f16613b

//! Locating and inspecting built collection tarballs

use crate::error::RunnerError;
use crate::Result;
use flate2::read::GzDecoder;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Find the single file in `directory` matching `pattern`.
///
/// Zero matches is `ArchiveNotFound`, several is `AmbiguousArchive`. Only the
/// file name part is matched; the pattern may not contain path separators.
pub fn find_archive(directory: &Path, pattern: &str) -> Result<PathBuf> {
    let full_pattern = directory.join(pattern).to_string_lossy().into_owned();
    let escaped_dir = glob::Pattern::escape(&directory.to_string_lossy());
    let glob_pattern = format!("{}/{}", escaped_dir.trim_end_matches('/'), pattern);

    let paths = glob::glob(&glob_pattern).map_err(|e| {
        RunnerError::validation(format!("Invalid archive pattern {:?}: {}", pattern, e))
    })?;

    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| RunnerError::Io(e.into()))?;
        if path.is_file() {
            matches.push(path);
        }
    }
    matches.sort();

    match matches.len() {
        0 => Err(RunnerError::ArchiveNotFound(full_pattern)),
        1 => {
            let archive = matches.remove(0);
            debug!("Archive found: {}", archive.display());
            Ok(archive)
        }
        _ => Err(RunnerError::AmbiguousArchive {
            pattern: full_pattern,
            matches: matches
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
        }),
    }
}

/// List the entry names of a gzip-compressed tarball in archive order
pub fn list_entries(path: &Path) -> Result<Vec<String>> {
    let corrupt = |e: std::io::Error| RunnerError::CorruptArchive {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let file = File::open(path)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));

    let mut names = Vec::new();
    for entry in archive.entries().map_err(corrupt)? {
        let entry = entry.map_err(corrupt)?;
        let name = entry.path().map_err(corrupt)?;
        names.push(name.to_string_lossy().into_owned());
    }

    ensure_clean_end(archive, path)?;
    Ok(names)
}

// The tar reader stops quietly when the stream ends on a header boundary, so
// a gzip stream cut short there would otherwise list as a valid archive.
fn ensure_clean_end(archive: tar::Archive<GzDecoder<File>>, path: &Path) -> Result<()> {
    let mut rest = archive.into_inner();
    std::io::copy(&mut rest, &mut std::io::sink()).map_err(|e| RunnerError::CorruptArchive {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::fs;
    use tempfile::TempDir;

    fn write_tarball(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_find_archive_single_match() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("x-1.0.0.tar.gz");
        fs::write(&archive, b"").unwrap();
        fs::write(temp_dir.path().join("y-1.0.0.tar.gz"), b"").unwrap();

        let found = find_archive(temp_dir.path(), "x*.tar.gz").unwrap();
        assert_eq!(found, archive);
    }

    #[test]
    fn test_find_archive_none() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("y-1.0.0.tar.gz"), b"").unwrap();

        let result = find_archive(temp_dir.path(), "x*.tar.gz");
        assert!(matches!(result, Err(RunnerError::ArchiveNotFound(_))));
    }

    #[test]
    fn test_find_archive_ambiguous() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("x-1.0.0.tar.gz"), b"").unwrap();
        fs::write(temp_dir.path().join("x-1.0.1.tar.gz"), b"").unwrap();

        match find_archive(temp_dir.path(), "x*.tar.gz") {
            Err(RunnerError::AmbiguousArchive { matches, .. }) => assert_eq!(matches.len(), 2),
            other => panic!("expected ambiguous match, got {:?}", other),
        }
    }

    #[test]
    fn test_find_archive_ignores_directories() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("x-dir.tar.gz")).unwrap();
        fs::write(temp_dir.path().join("x-1.0.0.tar.gz"), b"").unwrap();

        assert!(find_archive(temp_dir.path(), "x*.tar.gz").is_ok());
    }

    #[test]
    fn test_list_entries_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("x.tar.gz");
        write_tarball(&archive, &[("a.txt", &b"alpha"[..]), ("b/c.txt", &b"charlie"[..])]);

        let names = list_entries(&archive).unwrap();
        assert_eq!(names, vec!["a.txt", "b/c.txt"]);
    }

    #[test]
    fn test_list_entries_empty_archive() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("empty.tar.gz");
        write_tarball(&archive, &[]);

        assert!(list_entries(&archive).unwrap().is_empty());
    }

    #[test]
    fn test_list_entries_truncated() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("x.tar.gz");
        let payload: Vec<u8> = (0..64 * 1024).map(|i| (i * 31 % 251) as u8).collect();
        write_tarball(&archive, &[("a.txt", &b"alpha"[..]), ("b/c.txt", payload.as_slice())]);

        let bytes = fs::read(&archive).unwrap();
        let truncated = temp_dir.path().join("truncated.tar.gz");
        fs::write(&truncated, &bytes[..bytes.len() / 2]).unwrap();

        assert!(matches!(
            list_entries(&truncated),
            Err(RunnerError::CorruptArchive { .. })
        ));
    }

    #[test]
    fn test_list_entries_not_gzip() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("x.tar.gz");
        fs::write(&archive, b"this is not a gzip stream").unwrap();

        assert!(matches!(
            list_entries(&archive),
            Err(RunnerError::CorruptArchive { .. })
        ));
    }
}
