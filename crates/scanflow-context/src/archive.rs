//! Build context archiving
//!
//! The archive is written to an anonymous temp file first: the context size
//! is unknown up front, and spooling to disk lets the upload read it back as
//! one sequential stream instead of holding the whole archive in memory.

use crate::error::{ContextError, Result};
use crate::ignore::{IgnoreRuleSet, posix_path};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::{Seek, SeekFrom};
use std::path::Path;
use tar::Builder;
use tracing::{debug, warn};

const MAX_CONTEXT_SIZE: u64 = 500 * 1024 * 1024; // 500MB

/// Counters tracked while walking the context tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextStats {
    pub files_included: u64,
    pub bytes_included: u64,
    pub files_excluded: u64,
    pub bytes_excluded: u64,
}

/// A finished, rewound context archive ready for sequential upload.
pub struct ContextArchive {
    file: File,
    size: u64,
}

impl ContextArchive {
    /// Compressed size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Hand the spool file off to the uploader. Position is at the start.
    pub fn into_file(self) -> File {
        self.file
    }
}

pub struct ContextArchiver;

impl ContextArchiver {
    /// Walk `context_root` in lexical order and archive everything the
    /// ignore rules keep. Excluded directories are not descended into.
    pub fn archive(context_root: &Path) -> Result<(ContextArchive, ContextStats)> {
        if !context_root.is_dir() {
            return Err(ContextError::ContextNotFound(context_root.to_path_buf()));
        }

        debug!(root = %context_root.display(), "Creating build context");
        let rules = IgnoreRuleSet::load(context_root)?;

        let spool = tempfile::tempfile()?;
        let encoder = GzEncoder::new(spool, Compression::default());
        let mut tar = Builder::new(encoder);

        let mut stats = ContextStats::default();
        add_dir(&mut tar, context_root, Path::new(""), &rules, &mut stats)?;

        let encoder = tar.into_inner()?;
        let mut file = encoder.finish()?;
        let size = file.metadata()?.len();
        file.seek(SeekFrom::Start(0))?;

        if size > MAX_CONTEXT_SIZE {
            warn!(
                size_mb = size / 1024 / 1024,
                "Build context is very large; consider adding ignore patterns"
            );
        }

        debug!(
            size,
            included = stats.files_included,
            excluded = stats.files_excluded,
            "Build context created"
        );
        Ok((ContextArchive { file, size }, stats))
    }
}

fn add_dir(
    tar: &mut Builder<GzEncoder<File>>,
    dir: &Path,
    rel_dir: &Path,
    rules: &IgnoreRuleSet,
    stats: &mut ContextStats,
) -> Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let rel = rel_dir.join(entry.file_name());
        let file_type = entry.file_type()?;

        if rules.matches(&rel) {
            if file_type.is_dir() {
                debug!(path = %rel.display(), "Skipping directory");
            } else {
                stats.files_excluded += 1;
                stats.bytes_excluded += entry.metadata()?.len();
            }
            continue;
        }

        // entry names are always POSIX-relative to the context root
        let name = posix_path(&rel);
        if file_type.is_dir() {
            tar.append_path_with_name(&path, &name)?;
            add_dir(tar, &path, &rel, rules, stats)?;
        } else {
            tar.append_path_with_name(&path, &name)?;
            if file_type.is_file() {
                stats.files_included += 1;
                stats.bytes_included += entry.metadata()?.len();
            }
        }
    }
    Ok(())
}

/// Human-readable size, e.g. `2.4 MB`.
pub fn format_size(size: u64) -> String {
    const UNIT: u64 = 1024;
    if size < UNIT {
        return format!("{} B", size);
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = size / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    format!("{:.1} {}B", size as f64 / div as f64, b"KMGTPE"[exp] as char)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::collections::BTreeSet;
    use std::io::Read;
    use tempfile::tempdir;

    fn entry_names(archive: ContextArchive) -> BTreeSet<String> {
        let mut raw = Vec::new();
        GzDecoder::new(archive.into_file())
            .read_to_end(&mut raw)
            .unwrap();

        let mut tar = tar::Archive::new(raw.as_slice());
        tar.entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().display().to_string())
            .collect()
    }

    #[test]
    fn test_archive_filters_hidden_caches_and_patterns() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("Dockerfile"), "FROM alpine").unwrap();
        fs::write(root.join(".env"), "SECRET=1").unwrap();
        fs::write(root.join(".gitignore"), "build/\n").unwrap();

        fs::create_dir(root.join("src")).unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {}").unwrap();

        fs::create_dir(root.join("build")).unwrap();
        fs::write(root.join("build/output.txt"), "artifact").unwrap();

        fs::create_dir(root.join("node_modules")).unwrap();
        fs::write(root.join("node_modules/lib.js"), "module.exports = {}").unwrap();

        let (archive, stats) = ContextArchiver::archive(root).unwrap();
        let names = entry_names(archive);

        assert!(names.contains("Dockerfile"));
        assert!(names.contains("src"));
        assert!(names.contains("src/main.rs"));

        assert!(!names.contains(".env"));
        assert!(!names.contains(".gitignore"));
        assert!(!names.iter().any(|n| n.starts_with("build")));
        assert!(!names.contains("build/output.txt"));
        assert!(!names.iter().any(|n| n.starts_with("node_modules")));

        assert_eq!(stats.files_included, 2);
        // .env and .gitignore are counted; skipped directories are not descended
        assert_eq!(stats.files_excluded, 2);
    }

    #[test]
    fn test_archive_preserves_contents_and_modes() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("Dockerfile"), "FROM alpine\nRUN echo test").unwrap();

        let (archive, _) = ContextArchiver::archive(root).unwrap();

        let extract_dir = tempdir().unwrap();
        let mut raw = Vec::new();
        GzDecoder::new(archive.into_file())
            .read_to_end(&mut raw)
            .unwrap();
        tar::Archive::new(raw.as_slice())
            .unpack(extract_dir.path())
            .unwrap();

        let restored = fs::read_to_string(extract_dir.path().join("Dockerfile")).unwrap();
        assert_eq!(restored, "FROM alpine\nRUN echo test");
    }

    #[test]
    fn test_archive_is_rewound_for_sequential_read() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "a").unwrap();

        let (archive, _) = ContextArchiver::archive(temp_dir.path()).unwrap();
        let size = archive.size();
        assert!(size > 0);

        let mut raw = Vec::new();
        archive.into_file().read_to_end(&mut raw).unwrap();
        assert_eq!(raw.len() as u64, size);
    }

    #[test]
    fn test_missing_context_directory() {
        let result = ContextArchiver::archive(Path::new("/no/such/context"));
        assert!(matches!(result, Err(ContextError::ContextNotFound(_))));
    }

    #[test]
    fn test_stats_count_bytes() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("kept.txt"), "12345").unwrap();
        fs::write(root.join(".dropped"), "1234567890").unwrap();

        let (_, stats) = ContextArchiver::archive(root).unwrap();
        assert_eq!(stats.bytes_included, 5);
        assert_eq!(stats.bytes_excluded, 10);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
