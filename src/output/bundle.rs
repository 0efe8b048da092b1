use anyhow::{Context, Result};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::core::report::REPORT_FILENAME;
use crate::core::RunOutput;
use crate::utils::sanitize_filename;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn bundle_filename(basename: &str) -> String {
    format!("{}_set.zip", sanitize_filename(basename))
}

/// Packs every judging workbook, plus the report when present, into one
/// ZIP archive.
pub fn bundle(run: &RunOutput) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for sheet in &run.sheets {
        zip.start_file(sheet.file_name.as_str(), options)
            .with_context(|| format!("failed to add {}", sheet.file_name))?;
        zip.write_all(&sheet.workbook)?;
    }

    if let Some(report) = &run.report {
        zip.start_file(REPORT_FILENAME, options)
            .with_context(|| format!("failed to add {}", REPORT_FILENAME))?;
        zip.write_all(UTF8_BOM)?;
        zip.write_all(report.as_bytes())?;
    }

    let cursor = zip.finish().context("failed to finish ZIP archive")?;
    Ok(cursor.into_inner())
}

/// Writes the bundle into `dir` and returns its path.
pub fn write_bundle(run: &RunOutput, dir: &Path, basename: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let path = dir.join(bundle_filename(basename));
    let bytes = bundle(run)?;
    std::fs::write(&path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;

    info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}
