//! Paired artifact files for a persisted index.

use std::fs;
use std::path::Path;

use quarry_core::{Error, Passage, Result};
use serde::{Deserialize, Serialize};

/// Passage list written next to the vector artifact.
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct MetadataArtifact {
    /// Format version identifier
    pub version: u32,
    /// Passages in id order
    pub passages: Vec<Passage>,
}

impl MetadataArtifact {
    /// Artifact format version
    pub const VERSION: u32 = 1;

    pub fn encode(passages: &[Passage]) -> Result<Vec<u8>> {
        #[derive(Serialize)]
        struct Borrowed<'meta> {
            version: u32,
            passages: &'meta [Passage],
        }

        Ok(serde_json::to_vec(&Borrowed {
            version: Self::VERSION,
            passages,
        })?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Vec<Passage>> {
        let artifact: Self = serde_json::from_slice(bytes)
            .map_err(|error| Error::PersistenceCorrupt(format!("Unreadable metadata: {error}")))?;
        if artifact.version != Self::VERSION {
            return Err(Error::PersistenceCorrupt(format!(
                "Unsupported metadata format version {}",
                artifact.version
            )));
        }
        Ok(artifact.passages)
    }
}

/// Create the parent directory of `path` if it is missing.
///
/// # Errors
/// Returns an error if the directory cannot be created
pub(super) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|error| {
            Error::Other(format!(
                "Failed to create index directory {}: {error}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}

/// Write `data` to a temporary sibling of `path`, then rename it into place.
///
/// Readers never observe a half-written artifact.
///
/// # Errors
/// Returns an error if writing or renaming fails
pub(super) fn write_replacing(path: &Path, data: &[u8]) -> Result<()> {
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");

    fs::write(&staging, data).map_err(|error| {
        Error::Other(format!(
            "Failed to write {}: {error}",
            Path::new(&staging).display()
        ))
    })?;
    fs::rename(&staging, path).map_err(|error| {
        Error::Other(format!("Failed to move index artifact into {}: {error}", path.display()))
    })?;
    Ok(())
}
