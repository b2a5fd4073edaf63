//! Success and error reports

use crate::ReportError;
use assetlens_domain::{AffectedAssetEntry, AttributeField, ErrorEntry};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Base of every report file name
pub const REPORT_BASE_NAME: &str = "model-attribute-mapping";

/// Line written above the header of each report
pub const PLACEHOLDER_LINE: &str = "INTENTIONALLY LEFT BLANK";

const PLACEHOLDER_COUNT: usize = 3;

/// Header of the error report
pub const ERROR_COLUMNS: [&str; 5] = ["asset_number", "id", "input", "error", "messages"];

/// Paths of the two reports written for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    /// Success report
    pub success: PathBuf,
    /// Error report
    pub error: PathBuf,
}

pub(crate) type CsvFile = csv::Writer<BufWriter<File>>;

/// Create `path` and return a CSV writer positioned after `blank_lines`
/// placeholder lines
pub(crate) fn create_csv(path: &Path, blank_lines: usize) -> Result<CsvFile, ReportError> {
    let io_error = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = BufWriter::new(File::create(path).map_err(io_error)?);
    for _ in 0..blank_lines {
        writeln!(file, "{}", PLACEHOLDER_LINE).map_err(io_error)?;
    }

    Ok(csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(file))
}

pub(crate) fn csv_error(path: &Path) -> impl Fn(csv::Error) -> ReportError + '_ {
    move |source| ReportError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes the per-run success and error reports
#[derive(Debug, Clone)]
pub struct ReportSink {
    output_dir: PathBuf,
    timestamp: String,
}

impl ReportSink {
    /// Create a sink writing into `output_dir` with the run's timestamp
    pub fn new(output_dir: impl Into<PathBuf>, timestamp: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            timestamp: timestamp.into(),
        }
    }

    /// Header of the success report
    pub fn success_columns() -> Vec<&'static str> {
        ["asset_number", "id", "input"]
            .into_iter()
            .chain(AttributeField::ALL.iter().map(|f| f.key()))
            .collect()
    }

    fn path_for(&self, rows: usize, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}-{}_{}_{}.csv", REPORT_BASE_NAME, rows, self.timestamp, suffix))
    }

    /// Write both reports, even when empty
    pub fn emit(
        &self,
        successes: &[AffectedAssetEntry],
        errors: &[ErrorEntry],
    ) -> Result<ReportPaths, ReportError> {
        let success = self.path_for(successes.len(), "success");
        info!("Writing successes to {}", success.display());
        self.write_successes(&success, successes)?;

        let error = self.path_for(errors.len(), "error");
        info!("Writing errors to {}", error.display());
        self.write_errors(&error, errors)?;

        Ok(ReportPaths { success, error })
    }

    fn write_successes(&self, path: &Path, rows: &[AffectedAssetEntry]) -> Result<(), ReportError> {
        let mut writer = create_csv(path, PLACEHOLDER_COUNT)?;
        writer.write_record(Self::success_columns()).map_err(csv_error(path))?;

        for row in rows {
            let mut record = vec![row.asset_number.clone(), row.id.to_string(), row.input.clone()];
            record.extend(
                AttributeField::ALL
                    .iter()
                    .map(|f| row.extracted.get(*f).unwrap_or_default().to_string()),
            );
            writer.write_record(&record).map_err(csv_error(path))?;
        }

        writer.flush().map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_errors(&self, path: &Path, rows: &[ErrorEntry]) -> Result<(), ReportError> {
        let mut writer = create_csv(path, PLACEHOLDER_COUNT)?;
        writer.write_record(ERROR_COLUMNS).map_err(csv_error(path))?;

        for row in rows {
            let id = row.id.to_string();
            writer
                .write_record([
                    row.asset_number.as_str(),
                    id.as_str(),
                    row.input.as_str(),
                    row.kind.as_str(),
                    row.message.as_str(),
                ])
                .map_err(csv_error(path))?;
        }

        writer.flush().map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetlens_domain::{AssetRecord, AttributeSet, ExtractedAttributes, FailureKind};
    use chrono::Utc;
    use std::fs;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn asset(number: &str) -> AssetRecord {
        AssetRecord::new(Uuid::new_v4(), number, Uuid::new_v4(), Uuid::new_v4(), Utc::now())
            .with_model("MacBook Pro 13\" M1")
    }

    #[test]
    fn test_success_columns() {
        let columns = ReportSink::success_columns();
        assert_eq!(
            columns,
            vec![
                "asset_number",
                "id",
                "input",
                "color",
                "displaySize",
                "keyboard",
                "make",
                "model",
                "memory",
                "modelNumber",
                "operatingSystem",
                "processor",
                "processorFrequency",
                "storage",
                "storageType",
            ]
        );
    }

    #[test]
    fn test_emit_writes_both_files() {
        let dir = TempDir::new().unwrap();
        let sink = ReportSink::new(dir.path(), "20240101120000");

        let a = asset("A-1");
        let mut attributes = AttributeSet::new();
        attributes.insert(AttributeField::Make, "Apple");
        attributes.insert(AttributeField::DisplaySize, "13.3\"");
        let extracted = ExtractedAttributes::new("MacBook Pro 13\" M1", attributes);
        let entry = AffectedAssetEntry::new(&a, extracted);

        let failed = asset("A-2");
        let error =
            ErrorEntry::new(&failed, FailureKind::Timeout, "Run run_1 did not complete in time");

        let paths = sink.emit(&[entry], &[error]).unwrap();
        assert!(paths.success.ends_with("model-attribute-mapping-1_20240101120000_success.csv"));
        assert!(paths.error.ends_with("model-attribute-mapping-1_20240101120000_error.csv"));

        let success = fs::read_to_string(&paths.success).unwrap();
        let lines: Vec<_> = success.lines().collect();
        assert_eq!(&lines[..3], &[PLACEHOLDER_LINE; 3]);
        assert!(lines[3].starts_with("asset_number,id,input,color,displaySize"));
        assert_eq!(
            lines[4],
            format!("A-1,{},\"MacBook Pro 13\"\" M1\",,\"13.3\"\"\",,Apple,,,,,,,,", a.id)
        );

        let errors = fs::read_to_string(&paths.error).unwrap();
        let lines: Vec<_> = errors.lines().collect();
        assert_eq!(lines[3], "asset_number,id,input,error,messages");
        assert_eq!(
            lines[4],
            format!(
                "A-2,{},\"MacBook Pro 13\"\" M1\",timeout,Run run_1 did not complete in time",
                failed.id
            )
        );
    }

    #[test]
    fn test_emit_empty_reports() {
        let dir = TempDir::new().unwrap();
        let sink = ReportSink::new(dir.path(), "20240101120000");

        let paths = sink.emit(&[], &[]).unwrap();
        assert!(paths.success.ends_with("model-attribute-mapping-0_20240101120000_success.csv"));

        let contents = fs::read_to_string(&paths.error).unwrap();
        assert_eq!(contents.lines().count(), 4);
    }
}
