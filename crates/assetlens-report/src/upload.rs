//! Bulk-upload export

use crate::sink::{create_csv, csv_error};
use crate::ReportError;
use assetlens_domain::{AssetRecord, AssetType, Assignee, Organization};
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Header of the upload file, in column order
pub const UPLOAD_COLUMNS: [&str; 32] = [
    "ASSET NUMBER",
    "ORGANIZATION",
    "ORGANIZATION ID",
    "ASSIGNEE FIRST NAME (ADD ONLY)",
    "ASSIGNEE LAST NAME (ADD ONLY)",
    "PERSONAL EMAIL (ADD ONLY)",
    "WORK EMAIL (ADD ONLY)",
    "STATUS",
    "TYPE",
    "CONDITION",
    "MAKE",
    "MODEL",
    "MODEL NUMBER",
    "DISPLAY SIZE",
    "SERIAL NUMBER",
    "PROCESSOR",
    "PROCESSOR FREQUENCY",
    "MEMORY",
    "STORAGE",
    "KEYBOARD CONFIGURATION",
    "COLOR",
    "PURCHASE DATE",
    "WARRANTY EXPIRATION DATE",
    "RELEASE DATE",
    "TECHNICAL FUNCTIONALITY",
    "STORAGE TYPE",
    "OPERATING SYSTEM",
    "IMEI",
    "HAS CHARGER",
    "NOTES / KNOWN ISSUES",
    "DEVICE PHOTOS",
    "REMOVE DEVICE PHOTOS (CHECKBOX)",
];

/// One export row, already rendered in column order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRow {
    organization: String,
    values: [String; 32],
}

fn text(value: Option<&str>) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or_default().to_string()
}

fn date(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

fn flag(value: bool) -> String {
    let rendered = if value { "TRUE" } else { "FALSE" };
    rendered.to_string()
}

impl UploadRow {
    /// Render a reconciled asset with its resolved references
    pub fn new(
        asset: &AssetRecord,
        organization: &Organization,
        asset_type: &AssetType,
        assignee: Option<&Assignee>,
    ) -> Self {
        let assignee_text = |pick: fn(&Assignee) -> Option<&str>| text(assignee.and_then(pick));
        let email_or = |pick: fn(&Assignee) -> Option<&str>| {
            text(assignee.and_then(|a| pick(a).filter(|v| !v.is_empty()).or(a.email.as_deref())))
        };

        let values = [
            asset.asset_number.clone(),
            organization.name.clone(),
            organization.id.to_string(),
            assignee_text(|a| a.first_name.as_deref()),
            assignee_text(|a| a.last_name.as_deref()),
            email_or(|a| a.personal_email.as_deref()),
            email_or(|a| a.work_email.as_deref()),
            asset.status.clone(),
            asset_type.name.clone(),
            text(asset.cosmetic_condition.as_deref()),
            text(asset.make.as_deref()),
            text(asset.model.as_deref()),
            text(asset.model_number.as_deref()),
            text(asset.display_size.as_deref()),
            text(asset.serial_number.as_deref()),
            text(asset.processor.as_deref()),
            text(asset.processor_frequency.as_deref()),
            text(asset.memory.as_deref()),
            text(asset.storage.as_deref()),
            text(asset.keyboard.as_deref()),
            text(asset.color.as_deref()),
            date(asset.purchase_date),
            date(asset.warranty_expiration),
            date(asset.release_date),
            text(asset.technical_functionality.as_deref()),
            text(asset.storage_type.as_deref()),
            text(asset.operating_system.as_deref()),
            text(asset.imei_number.as_deref()),
            flag(asset.has_charger),
            text(asset.customer_note.as_deref()),
            String::new(),
            flag(false),
        ];

        Self {
            organization: organization.name.clone(),
            values,
        }
    }

    /// Value of a column by header name
    pub fn get(&self, column: &str) -> Option<&str> {
        UPLOAD_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|i| self.values[i].as_str())
    }

    /// Organization name shown in the row
    pub fn organization(&self) -> &str {
        &self.organization
    }
}

/// Writes the bulk-upload export file
#[derive(Debug, Clone)]
pub struct UploadWriter {
    output_dir: PathBuf,
    timestamp: String,
}

impl UploadWriter {
    /// Create a writer for `output_dir` with the run's timestamp
    pub fn new(output_dir: impl Into<PathBuf>, timestamp: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            timestamp: timestamp.into(),
        }
    }

    /// File name for a given first organization and row count
    pub fn file_name(&self, organization: &str, rows: usize) -> String {
        let organization: String = organization
            .chars()
            .map(|c| if c == '/' || c == '\\' { '-' } else { c })
            .collect();
        format!("asset-upload-{}-{}_{}.csv", organization, rows, self.timestamp)
    }

    /// Write the export, or nothing when there are no rows
    pub fn write(&self, rows: &[UploadRow]) -> Result<Option<PathBuf>, ReportError> {
        let Some(first) = rows.first() else {
            warn!("No asset upload rows to write");
            return Ok(None);
        };

        let path = self.output_dir.join(self.file_name(first.organization(), rows.len()));
        self.write_rows(&path, rows)?;
        info!("Wrote {} asset upload rows to {}", rows.len(), path.display());
        Ok(Some(path))
    }

    fn write_rows(&self, path: &Path, rows: &[UploadRow]) -> Result<(), ReportError> {
        let mut writer = create_csv(path, 0)?;
        writer.write_record(UPLOAD_COLUMNS).map_err(csv_error(path))?;
        for row in rows {
            writer.write_record(&row.values).map_err(csv_error(path))?;
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
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn organization() -> Organization {
        Organization {
            id: Uuid::new_v4(),
            name: "Acme".to_string(),
        }
    }

    fn laptop() -> AssetType {
        AssetType {
            name: "Laptop".to_string(),
        }
    }

    fn asset() -> AssetRecord {
        let mut asset = AssetRecord::new(
            Uuid::new_v4(),
            "A-0042",
            Uuid::new_v4(),
            Uuid::new_v4(),
            Utc::now(),
        )
        .with_model("MacBook Air")
        .with_attribute(assetlens_domain::AttributeField::Make, "Apple");
        asset.status = "deployed".to_string();
        asset.has_charger = true;
        asset.purchase_date = Some(Utc.with_ymd_and_hms(2023, 3, 14, 0, 0, 0).unwrap());
        asset
    }

    #[test]
    fn test_row_rendering() {
        let org = organization();
        let row = UploadRow::new(&asset(), &org, &laptop(), None);

        assert_eq!(row.get("ASSET NUMBER"), Some("A-0042"));
        assert_eq!(row.get("ORGANIZATION ID").map(String::from), Some(org.id.to_string()));
        assert_eq!(row.get("TYPE"), Some("Laptop"));
        assert_eq!(row.get("MAKE"), Some("Apple"));
        assert_eq!(row.get("HAS CHARGER"), Some("TRUE"));
        assert_eq!(row.get("REMOVE DEVICE PHOTOS (CHECKBOX)"), Some("FALSE"));
        assert_eq!(row.get("PURCHASE DATE"), Some("2023-03-14T00:00:00.000Z"));
        assert_eq!(row.get("WARRANTY EXPIRATION DATE"), Some(""));
        assert_eq!(row.get("ASSIGNEE FIRST NAME (ADD ONLY)"), Some(""));
    }

    #[test]
    fn test_assignee_email_fallback() {
        let assignee = Assignee {
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            personal_email: Some(String::new()),
            work_email: Some("ada@work.example".to_string()),
            email: Some("ada@example.com".to_string()),
        };
        let row = UploadRow::new(&asset(), &organization(), &laptop(), Some(&assignee));

        assert_eq!(row.get("ASSIGNEE FIRST NAME (ADD ONLY)"), Some("Ada"));
        assert_eq!(row.get("PERSONAL EMAIL (ADD ONLY)"), Some("ada@example.com"));
        assert_eq!(row.get("WORK EMAIL (ADD ONLY)"), Some("ada@work.example"));
    }

    #[test]
    fn test_write_file() {
        let dir = TempDir::new().unwrap();
        let writer = UploadWriter::new(dir.path(), "20240101120000");
        let rows = vec![
            UploadRow::new(&asset(), &organization(), &laptop(), None),
            UploadRow::new(&asset(), &organization(), &laptop(), None),
        ];

        let path = writer.write(&rows).unwrap().unwrap();
        assert!(path.ends_with("asset-upload-Acme-2_20240101120000.csv"));

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], UPLOAD_COLUMNS.join(","));
        assert!(lines[1].starts_with("A-0042,Acme,"));
    }

    #[test]
    fn test_no_rows_no_file() {
        let dir = TempDir::new().unwrap();
        let writer = UploadWriter::new(dir.path(), "20240101120000");

        assert_eq!(writer.write(&[]).unwrap(), None);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_file_name_strips_separators() {
        let writer = UploadWriter::new(".", "20240101120000");
        assert_eq!(
            writer.file_name("Acme/West", 3),
            "asset-upload-Acme-West-3_20240101120000.csv"
        );
    }
}
