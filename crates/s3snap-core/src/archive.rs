//! gzip-compressed tar archives of a single folder.
//!
//! The archive holds one top-level entry named after the folder's base name,
//! so extracting into `dir` recreates `dir/<base name>/...`.

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tar::{Archive, Builder};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, SnapError};

/// Compress `source_dir` recursively into a `.tar.gz` at `output_file`.
///
/// Symlinks are archived as links. A partially written archive is removed
/// when compression fails.
pub fn compress(source_dir: &Path, output_file: &Path) -> Result<()> {
    if !source_dir.is_dir() {
        return Err(SnapError::SourceNotFound(source_dir.display().to_string()));
    }
    // Resolve `.` and trailing separators so the entry gets a real name.
    let source = source_dir.canonicalize()?;
    let base = source.file_name().ok_or_else(|| {
        SnapError::Config(format!(
            "cannot archive {}: folder has no base name",
            source.display()
        ))
    })?;

    let result = write_archive(&source, Path::new(base), output_file);
    if result.is_err() && output_file.exists() {
        if let Err(e) = std::fs::remove_file(output_file) {
            debug!("could not remove partial archive {}: {e}", output_file.display());
        }
    }
    result?;

    debug!(
        "compressed {} into {}",
        source.display(),
        output_file.display()
    );
    Ok(())
}

fn write_archive(source: &Path, entry_name: &Path, output_file: &Path) -> Result<()> {
    let archive_err = |e| archive_error(output_file, e);

    let file = File::create(output_file).map_err(archive_err)?;
    // The archive may be written inside the folder it archives.
    let own_path = output_file.canonicalize().map_err(archive_err)?;

    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut builder = Builder::new(encoder);
    builder.follow_symlinks(false);

    for entry in WalkDir::new(source).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| archive_err(e.into()))?;
        let path = entry.path();
        if path == own_path.as_path() {
            debug!("skipping the archive itself: {}", path.display());
            continue;
        }
        let rel = path.strip_prefix(source).unwrap_or(path);
        let name = entry_name.join(rel);
        if entry.file_type().is_dir() {
            builder.append_dir(&name, path).map_err(archive_err)?;
        } else {
            builder
                .append_path_with_name(path, &name)
                .map_err(archive_err)?;
        }
    }

    let encoder = builder.into_inner().map_err(archive_err)?;
    let mut writer = encoder.finish().map_err(archive_err)?;
    writer.flush().map_err(archive_err)?;
    Ok(())
}

/// Extract `archive_file` under `target_dir`, creating directories as needed.
///
/// No recovery is attempted: on failure whatever was written stays on disk.
pub fn extract(archive_file: &Path, target_dir: &Path) -> Result<()> {
    let archive_err = |e| archive_error(archive_file, e);

    let file = File::open(archive_file).map_err(archive_err)?;
    std::fs::create_dir_all(target_dir)?;

    let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
    archive.unpack(target_dir).map_err(archive_err)?;

    debug!(
        "extracted {} into {}",
        archive_file.display(),
        target_dir.display()
    );
    Ok(())
}

fn archive_error(path: &Path, source: std::io::Error) -> SnapError {
    SnapError::Archive {
        path: path.display().to_string(),
        source,
    }
}
