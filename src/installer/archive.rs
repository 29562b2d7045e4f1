// ABOUTME: Gzip-compressed tar extraction for release, job, and package archives
// ABOUTME: Unpacks entries on a blocking thread and reports entry and byte counts

use flate2::read::GzDecoder;
use std::fs::File;
use std::io;
use std::path::Path;
use tar::Archive;
use tracing::{debug, info};

use super::error::{ArchiveError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionStats {
    pub entries: usize,
    pub bytes: u64,
}

/// Extract a `.tgz` archive into `destination`, creating it if needed.
///
/// Entries that would escape `destination` are skipped by `tar`.
pub async fn extract_archive(archive: &Path, destination: &Path) -> Result<ExtractionStats> {
    if !archive.is_file() {
        return Err(ArchiveError::Missing {
            path: archive.to_path_buf(),
        }
        .into());
    }

    info!(
        "Extracting {} into {}",
        archive.display(),
        destination.display()
    );

    let archive_path = archive.to_path_buf();
    let destination_path = destination.to_path_buf();

    let stats = tokio::task::spawn_blocking(move || unpack(&archive_path, &destination_path))
        .await?
        .map_err(|e| ArchiveError::Extraction {
            archive: archive.to_path_buf(),
            destination: destination.to_path_buf(),
            source: e,
        })?;

    debug!(
        "Extracted {} entries ({} bytes) from {}",
        stats.entries,
        stats.bytes,
        archive.display()
    );

    Ok(stats)
}

fn unpack(archive_path: &Path, destination: &Path) -> io::Result<ExtractionStats> {
    std::fs::create_dir_all(destination)?;

    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(true);

    let mut stats = ExtractionStats::default();
    for entry in archive.entries()? {
        let mut entry = entry?;
        let size = entry.header().size().unwrap_or(0);

        if entry.unpack_in(destination)? {
            stats.entries += 1;
            stats.bytes += size;
        } else {
            debug!("Skipped archive entry outside destination: {:?}", entry.path()?);
        }
    }

    Ok(stats)
}
