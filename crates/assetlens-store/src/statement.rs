//! SQL statement builders shared by both backends
//!
//! Both Postgres and SQLite accept `$n` positional placeholders, so the same
//! text is executed everywhere.

use assetlens_domain::{AssetId, AttributeDelta};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Table holding assets
pub const ASSET_TABLE: &str = "asset";

/// Maximum rows returned by one candidate fetch
pub const PAGE_SIZE: usize = 1000;

/// Columns read for every candidate, in mapping order
pub(crate) const ASSET_COLUMNS: [&str; 28] = [
    "id",
    "asset_number",
    "organization_id",
    "assignee_id",
    "asset_type_id",
    "model",
    "color",
    "display_size",
    "keyboard",
    "make",
    "memory",
    "model_number",
    "operating_system",
    "processor",
    "processor_frequency",
    "storage",
    "storage_type",
    "serial_number",
    "status",
    "cosmetic_condition",
    "technical_functionality",
    "customer_note",
    "imei_number",
    "has_charger",
    "purchase_date",
    "warranty_expiration",
    "release_date",
    "created_at",
];

/// Restrictions applied to a candidate fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateFilter {
    /// Only assets of this organization
    pub organization_id: Option<Uuid>,
    /// Only assets created strictly before this instant
    pub created_before: Option<DateTime<Utc>>,
}

impl CandidateFilter {
    /// Build the fetch query over the given select list
    ///
    /// Placeholders are numbered in the order organization, cursor; callers
    /// bind in the same order.
    pub fn to_sql(&self, table: &str, select_list: &str) -> String {
        let mut sql = format!("SELECT {} FROM {} WHERE deleted_at IS NULL", select_list, table);
        let mut param = 0;

        if self.organization_id.is_some() {
            param += 1;
            sql.push_str(&format!(" AND organization_id = ${}", param));
        }

        if self.created_before.is_some() {
            param += 1;
            sql.push_str(&format!(" AND created_at < ${}", param));
        }

        sql.push_str(&format!(" ORDER BY created_at DESC LIMIT {};", PAGE_SIZE));
        sql
    }
}

/// A parameterized single-row update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStatement {
    /// Statement text
    pub sql: String,
    /// Column values, bound as `$1..$n`
    pub values: Vec<String>,
    /// Target row, bound last
    pub id: AssetId,
}

impl UpdateStatement {
    /// Build `UPDATE <table> SET <col> = $1, ... WHERE id = $n+1;`
    ///
    /// Column names come from the attribute field table. An empty delta gives
    /// the degenerate `UPDATE <table> SET WHERE id = $1;`, which existing
    /// tooling compares byte for byte.
    pub fn build(table: &str, delta: &AttributeDelta, id: AssetId) -> Self {
        let mut assignments = String::new();
        let mut values = Vec::with_capacity(delta.len());

        for (idx, (field, value)) in delta.iter().enumerate() {
            if idx > 0 {
                assignments.push_str(", ");
            }
            assignments.push_str(&format!("{} = ${}", field.column(), idx + 1));
            values.push(value.to_string());
        }
        if !assignments.is_empty() {
            assignments.push(' ');
        }

        let sql = format!(
            "UPDATE {} SET {}WHERE id = ${};",
            table,
            assignments,
            values.len() + 1
        );

        Self { sql, values, id }
    }

    /// All parameters in bind order, with the id rendered as text
    pub fn params(&self) -> Vec<String> {
        let mut params = self.values.clone();
        params.push(self.id.to_string());
        params
    }

    /// Whether the statement sets no column
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetlens_domain::{AttributeField, AttributeSet};

    fn full_delta() -> AttributeSet {
        AttributeSet::from_pairs([
            ("color", "Space Gray"),
            ("displaySize", "13.3\""),
            ("keyboard", "US"),
            ("make", "Apple"),
            ("model", "MacBook Pro"),
            ("memory", "8 GB"),
            ("modelNumber", "A2159"),
            ("operatingSystem", "macOS Ventura"),
            ("processor", "M1 Pro"),
            ("processorFrequency", "3.2 GHz"),
            ("storage", "512 GB"),
            ("storageType", "SSD"),
        ])
        .unwrap()
    }

    #[test]
    fn test_update_all_fields() {
        let id = Uuid::new_v4();
        let stmt = UpdateStatement::build(ASSET_TABLE, &full_delta(), id);

        assert_eq!(
            stmt.sql,
            "UPDATE asset SET color = $1, display_size = $2, keyboard = $3, make = $4, \
             model = $5, memory = $6, model_number = $7, operating_system = $8, \
             processor = $9, processor_frequency = $10, storage = $11, storage_type = $12 \
             WHERE id = $13;"
        );
        assert_eq!(stmt.values.len(), 12);
        assert_eq!(stmt.values[1], "13.3\"");
        assert_eq!(stmt.params().last().unwrap(), &id.to_string());
    }

    #[test]
    fn test_update_two_fields() {
        let id = Uuid::new_v4();
        let mut delta = AttributeSet::new();
        delta.insert(AttributeField::Color, "Space Gray");
        delta.insert(AttributeField::DisplaySize, "13.3\"");

        let stmt = UpdateStatement::build("asset", &delta, id);

        assert_eq!(
            stmt.sql,
            "UPDATE asset SET color = $1, display_size = $2 WHERE id = $3;"
        );
        assert_eq!(
            stmt.params(),
            vec!["Space Gray".to_string(), "13.3\"".to_string(), id.to_string()]
        );
    }

    #[test]
    fn test_update_empty_delta_is_degenerate() {
        let id = Uuid::new_v4();
        let stmt = UpdateStatement::build("asset", &AttributeSet::new(), id);

        assert_eq!(stmt.sql, "UPDATE asset SET WHERE id = $1;");
        assert!(stmt.is_empty());
        assert_eq!(stmt.params(), vec![id.to_string()]);
    }

    #[test]
    fn test_update_placeholder_count_tracks_delta() {
        let id = Uuid::new_v4();
        let mut delta = AttributeSet::new();
        delta.insert(AttributeField::StorageType, "SSD");

        let stmt = UpdateStatement::build("asset", &delta, id);
        assert_eq!(stmt.sql, "UPDATE asset SET storage_type = $1 WHERE id = $2;");
    }

    #[test]
    fn test_fetch_without_filters() {
        let sql = CandidateFilter::default().to_sql("asset", "*");
        assert_eq!(
            sql,
            "SELECT * FROM asset WHERE deleted_at IS NULL ORDER BY created_at DESC LIMIT 1000;"
        );
    }

    #[test]
    fn test_fetch_with_cursor_only() {
        let filter = CandidateFilter {
            organization_id: None,
            created_before: Some(Utc::now()),
        };
        let sql = filter.to_sql("asset", "id");
        assert!(sql.contains("AND created_at < $1 ORDER BY"));
        assert!(!sql.contains("organization_id"));
    }

    #[test]
    fn test_fetch_with_both_filters() {
        let filter = CandidateFilter {
            organization_id: Some(Uuid::new_v4()),
            created_before: Some(Utc::now()),
        };
        let sql = filter.to_sql("asset", "id");
        assert!(sql.contains("AND organization_id = $1 AND created_at < $2"));
    }
}
