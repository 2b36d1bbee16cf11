//! Module archives and their temp-file lifetime.

mod ignore;
mod slug;

pub use ignore::{IGNORE_FILE, IgnoreRules};
pub use slug::SlugArchiver;

use crate::error::ArchiveError;
use std::path::Path;
use tempfile::TempPath;

/// Packs a module directory into a temporary archive file
pub trait Archiver {
    /// Pack `directory` into a new temp file
    fn pack(&self, directory: &Path) -> Result<ArchiveArtifact, ArchiveError>;
}

impl<A: Archiver + ?Sized> Archiver for &A {
    fn pack(&self, directory: &Path) -> Result<ArchiveArtifact, ArchiveError> {
        (**self).pack(directory)
    }
}

/// A packed archive on disk.
///
/// The file is removed exactly once: by [`ArchiveArtifact::cleanup`], or on
/// drop if cleanup was never called.
#[derive(Debug)]
pub struct ArchiveArtifact {
    path: TempPath,
    uncompressed_size: u64,
}

impl ArchiveArtifact {
    /// Take ownership of the temp file at `path`
    pub fn new(path: TempPath, uncompressed_size: u64) -> Self {
        Self {
            path,
            uncompressed_size,
        }
    }

    /// Location of the archive
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total bytes before compression
    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    /// Size of the compressed file on disk
    pub fn compressed_size(&self) -> Result<u64, ArchiveError> {
        std::fs::metadata(self.path())
            .map(|metadata| metadata.len())
            .map_err(|source| ArchiveError::Io {
                operation: "stat",
                path: self.path().to_path_buf(),
                source,
            })
    }

    /// Delete the archive now
    pub fn cleanup(self) -> Result<(), ArchiveError> {
        let path = self.path.to_path_buf();
        self.path.close().map_err(|source| ArchiveError::Io {
            operation: "remove",
            path,
            source,
        })
    }
}
