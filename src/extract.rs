//! Upload Extraction Module
//! Pulls CSV/JSON/text files out of uploaded ZIP archives into a local data folder.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

/// File extensions that are extracted or copied.
const DATA_EXTENSIONS: [&str; 3] = [".csv", ".json", ".txt"];

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to read input directory {path}: {source}")]
    InputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("ZIP error: {0}")]
    Zip(#[from] ZipError),
}

/// What happened to each file in the input directory.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Files written from archive members.
    pub extracted: Vec<PathBuf>,
    /// Plain data files copied as-is.
    pub copied: Vec<PathBuf>,
    /// Inputs that were neither archives nor data files.
    pub skipped: Vec<PathBuf>,
    /// Inputs that failed, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl ExtractionReport {
    /// Output files produced, extracted first.
    pub fn found(&self) -> impl Iterator<Item = &PathBuf> {
        self.extracted.iter().chain(self.copied.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.extracted.is_empty() && self.copied.is_empty()
    }
}

fn is_data_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    DATA_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Extract data members of every ZIP archive in `input_dir`, and copy plain
/// data files, into `output_dir`.
///
/// Only base file names are kept, so members with the same name overwrite
/// each other. A failure on one input is recorded and the rest still run.
pub fn extract_uploads(
    input_dir: &Path,
    output_dir: &Path,
) -> Result<ExtractionReport, ExtractError> {
    fs::create_dir_all(output_dir).map_err(|source| ExtractError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let entries = fs::read_dir(input_dir).map_err(|source| ExtractError::InputDir {
        path: input_dir.to_path_buf(),
        source,
    })?;

    let mut inputs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    inputs.sort();

    let mut report = ExtractionReport::default();
    for path in inputs {
        if let Err(e) = process_file(&path, output_dir, &mut report) {
            log::warn!("Error processing {}: {e}", path.display());
            report.failed.push((path, e.to_string()));
        }
    }

    if report.is_empty() {
        log::warn!(
            "No CSV/JSON/TXT files found in uploads. Archives such as .pbit/.pbix \
             models may need BI tooling to export their data manually."
        );
    } else {
        log::info!(
            "Extraction complete: {} extracted, {} copied",
            report.extracted.len(),
            report.copied.len()
        );
    }
    Ok(report)
}

fn process_file(
    path: &Path,
    output_dir: &Path,
    report: &mut ExtractionReport,
) -> Result<(), ExtractError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    match ZipArchive::new(File::open(path)?) {
        Ok(mut archive) => {
            let before = report.extracted.len();
            extract_archive(&mut archive, output_dir, &mut report.extracted)?;
            if report.extracted.len() == before {
                log::info!(
                    "{} has no CSV/JSON/TXT members; manual handling required",
                    path.display()
                );
                report.skipped.push(path.to_path_buf());
            }
        }
        Err(ZipError::InvalidArchive(_)) if is_data_file(&name) => {
            let target = output_dir.join(&name);
            fs::copy(path, &target)?;
            log::info!("Copied {} -> {}", path.display(), target.display());
            report.copied.push(target);
        }
        Err(ZipError::InvalidArchive(_)) | Err(ZipError::UnsupportedArchive(_)) => {
            log::info!("{} is not extractable; manual handling required", path.display());
            report.skipped.push(path.to_path_buf());
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Writes data members into `output_dir`, pushing each target onto `extracted`
/// once written, so members before a failure are still reported.
fn extract_archive(
    archive: &mut ZipArchive<File>,
    output_dir: &Path,
    extracted: &mut Vec<PathBuf>,
) -> Result<(), ExtractError> {
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() || !is_data_file(entry.name()) {
            continue;
        }

        let member = entry.name().to_string();
        // Keep the base name only; also rejects traversal like "../x.csv"
        let Some(base) = Path::new(&member).file_name().map(|n| n.to_os_string()) else {
            continue;
        };
        let target = output_dir.join(base);
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        log::info!("Extracted {member} -> {}", target.display());
        extracted.push(target);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fcp_extract_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("in")).unwrap();
        dir
    }

    fn write_zip(path: &Path, members: &[(&str, &[u8])]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, data) in members {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn extracts_data_members_by_base_name() {
        let dir = temp_dir("members");
        write_zip(
            &dir.join("in").join("upload.zip"),
            &[
                ("nested/flights.CSV", &b"date,operator\n"[..]),
                ("meta/info.json", &b"{}"[..]),
                ("image.png", &b"\x89PNG"[..]),
            ],
        );
        let out = dir.join("out");

        let report = extract_uploads(&dir.join("in"), &out).unwrap();

        assert_eq!(report.extracted.len(), 2);
        assert_eq!(fs::read_to_string(out.join("flights.CSV")).unwrap(), "date,operator\n");
        assert!(out.join("info.json").is_file());
        assert!(!out.join("image.png").exists());
        assert!(report.failed.is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn copies_plain_files_and_skips_others() {
        let dir = temp_dir("plain");
        fs::write(dir.join("in").join("notes.txt"), "hello").unwrap();
        fs::write(dir.join("in").join("model.pbit"), "not a zip").unwrap();
        let out = dir.join("out");

        let report = extract_uploads(&dir.join("in"), &out).unwrap();

        assert_eq!(report.copied, vec![out.join("notes.txt")]);
        assert_eq!(report.skipped, vec![dir.join("in").join("model.pbit")]);
        assert_eq!(fs::read_to_string(out.join("notes.txt")).unwrap(), "hello");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn archive_without_data_is_skipped() {
        let dir = temp_dir("no_data");
        write_zip(&dir.join("in").join("report.pbix"), &[("DataModel", &b"\0\0"[..])]);

        let report = extract_uploads(&dir.join("in"), &dir.join("out")).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.skipped.len(), 1);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn partial_archive_failure_keeps_written_members() {
        let dir = temp_dir("partial");
        write_zip(
            &dir.join("in").join("upload.zip"),
            &[("first.csv", &b"a\n"[..]), ("second.csv", &b"b\n"[..])],
        );
        let out = dir.join("out");
        // A directory in the way makes the second member fail
        fs::create_dir_all(out.join("second.csv")).unwrap();

        let report = extract_uploads(&dir.join("in"), &out).unwrap();

        assert_eq!(report.extracted, vec![out.join("first.csv")]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, dir.join("in").join("upload.zip"));
        assert!(report.skipped.is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_input_dir_is_an_error() {
        let dir = temp_dir("missing_input");
        let err = extract_uploads(&dir.join("nope"), &dir.join("out")).unwrap_err();
        assert!(matches!(err, ExtractError::InputDir { .. }));

        let _ = fs::remove_dir_all(&dir);
    }
}
