use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::PipelineError;
use crate::warning::{ExtractWarning, WarningCode};

pub fn unpack_archive(zip_path: &Path, dest_dir: &Path) -> Result<Vec<String>, PipelineError> {
    let file = File::open(zip_path)?;
    let mut archive = ZipArchive::new(file)?;

    fs::create_dir_all(dest_dir)?;

    let mut names = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if !entry.is_file() {
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };

        let out_path = dest_dir.join(&relative);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out_file = File::create(&out_path)?;
        io::copy(&mut entry, &mut out_file)?;

        names.push(relative.to_string_lossy().into_owned());
    }

    info!("extracted {} file(s) from {}", names.len(), zip_path.display());
    Ok(names)
}

pub fn pack_archive(zip_path: &Path, files: &[PathBuf]) -> Result<(), PipelineError> {
    let mut writer = ZipWriter::new(File::create(zip_path)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                PipelineError::InvalidOption(format!(
                    "cannot archive path without a file name: '{}'",
                    path.display()
                ))
            })?;
        writer.start_file(name, options)?;
        writer.write_all(&fs::read(path)?)?;
    }

    writer.finish()?;
    info!("compressed {} file(s) into {}", files.len(), zip_path.display());
    Ok(())
}

pub fn cleanup_intermediates(
    dir: &Path,
    extensions: &[&str],
    warnings: &mut Vec<ExtractWarning>,
) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            warn!("cleanup skipped, cannot read {}: {error}", dir.display());
            warnings.push(ExtractWarning::new(
                WarningCode::CleanupFailed,
                format!("cannot read '{}': {error}", dir.display()),
            ));
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| {
                extensions
                    .iter()
                    .any(|candidate| extension.eq_ignore_ascii_case(candidate))
            });
        if !matches {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => info!("removed intermediate file {}", path.display()),
            Err(error) => {
                warn!("failed to remove {}: {error}", path.display());
                warnings.push(ExtractWarning::new(
                    WarningCode::CleanupFailed,
                    format!("failed to remove '{}': {error}", path.display()),
                ));
            }
        }
    }
}
