//! Gzipped tarball of a module directory.

use super::ignore::IgnoreRules;
use super::{ArchiveArtifact, Archiver};
use crate::error::ArchiveError;
use flate2::{Compression, write::GzEncoder};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tar::HeaderMode;
use walkdir::WalkDir;

/// Packs a directory into a temp `.tar.gz`, applying `.terraformignore`
/// and dereferencing symlinks
#[derive(Debug, Clone, Copy, Default)]
pub struct SlugArchiver;

impl Archiver for SlugArchiver {
    fn pack(&self, directory: &Path) -> Result<ArchiveArtifact, ArchiveError> {
        if !directory.is_dir() {
            return Err(ArchiveError::Pack {
                directory: directory.to_path_buf(),
                reason: "not a directory".to_string(),
            });
        }

        let temp = tempfile::Builder::new()
            .prefix("slug")
            .suffix(".tar.gz")
            .tempfile()
            .map_err(|source| ArchiveError::Io {
                operation: "create",
                path: std::env::temp_dir(),
                source,
            })?;
        let (file, path) = temp.into_parts();

        // The temp path is dropped (and removed) if packing fails
        let uncompressed_size = write_slug(directory, file).map_err(|e| ArchiveError::Pack {
            directory: directory.to_path_buf(),
            reason: e.to_string(),
        })?;

        log::debug!(
            "Packed {} into {} ({uncompressed_size} bytes)",
            directory.display(),
            path.display()
        );

        Ok(ArchiveArtifact::new(path, uncompressed_size))
    }
}

fn write_slug(root: &Path, file: File) -> io::Result<u64> {
    let rules = IgnoreRules::load(root)?;
    let counter = CountingWriter::new(GzEncoder::new(file, Compression::default()));
    let mut tar = tar::Builder::new(counter);
    tar.follow_symlinks(true);

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| match entry.path().strip_prefix(root) {
            Ok(relative) if relative.as_os_str().is_empty() => true,
            Ok(relative) => !rules.is_excluded(relative, entry.file_type().is_dir()),
            Err(_) => false,
        });

    for entry in walker {
        let entry = entry.map_err(io::Error::other)?;
        let path = entry.path();
        let relative = match path.strip_prefix(root) {
            Ok(relative) if !relative.as_os_str().is_empty() => relative,
            _ => continue,
        };

        let metadata = std::fs::metadata(path)?;
        let mut header = tar::Header::new_gnu();
        header.set_metadata_in_mode(&metadata, HeaderMode::Deterministic);

        if metadata.is_dir() {
            tar.append_data(&mut header, relative, &mut io::empty())?;
        } else if metadata.is_file() {
            let mut source = File::open(path)?;
            tar.append_data(&mut header, relative, &mut source)?;
        } else {
            log::debug!("Skipping special file {}", path.display());
        }
    }

    let counter = tar.into_inner()?;
    let size = counter.count;
    let mut file = counter.inner.finish()?;
    file.flush()?;
    file.sync_all()?;
    Ok(size)
}

/// Counts the bytes written through it
struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.count += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
