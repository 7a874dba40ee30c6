//! The backend's paginated response envelope.
//!
//! Window queries come back wrapped in a JSON object whose metadata keys
//! use the backend's hyphenated spelling (`page-count`, `records-size`,
//! `skip-records`, `row-count`). [`PageEnvelope`] mirrors that wire shape;
//! [`PaginatedResponse`] is the typed page the rest of the application
//! works with, with the 1-based page number already computed.

use serde::Deserialize;

/// Raw wire envelope for a window query. `records-size` is the page size
/// the server applied, `skip-records` the offset it honored.
#[derive(Clone, Debug, Deserialize)]
pub struct PageEnvelope<R> {
    #[serde(default = "Vec::new")]
    pub records: Vec<R>,
    #[serde(rename = "page-count", default)]
    pub page_count: u64,
    #[serde(rename = "records-size", default)]
    pub records_size: u64,
    #[serde(rename = "skip-records", default)]
    pub skip_records: u64,
    #[serde(rename = "row-count", default)]
    pub row_count: u64,
    /// Only present when the query asked for `showsql`.
    #[serde(rename = "sql-command", default)]
    pub sql_command: Option<String>,
}

impl<R> PageEnvelope<R> {
    /// Decode into a typed page, mapping each raw record through
    /// `transform`. The page number is derived from the offset the server
    /// reports, so it stays truthful even when the server clamps `$skip`.
    pub fn into_page<T>(self, transform: impl FnMut(R) -> T) -> PaginatedResponse<T> {
        let page = if self.records_size == 0 {
            1
        } else {
            self.skip_records / self.records_size + 1
        };
        PaginatedResponse {
            records: self.records.into_iter().map(transform).collect(),
            page,
            page_size: self.records_size,
            total_pages: self.page_count,
            total_records: self.row_count,
            sql: self.sql_command,
        }
    }
}

/// One page of application records plus its page frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaginatedResponse<T> {
    pub records: Vec<T>,
    /// 1-based page number.
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub total_records: u64,
    /// Generated SQL, when the query requested it.
    pub sql: Option<String>,
}

impl<T> PaginatedResponse<T> {
    /// The uniform "nothing came back" page returned when a query fails.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            page: 1,
            page_size: 0,
            total_pages: 0,
            total_records: 0,
            sql: None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_envelope_decodes_hyphenated_keys() {
        let body = json!({
            "records": [{"id": 118, "Name": "Joe Block"}],
            "page-count": 4,
            "records-size": 20,
            "skip-records": 40,
            "row-count": 62,
            "array-count": 0,
        });
        let envelope: PageEnvelope<Value> = serde_json::from_value(body).unwrap();
        assert_eq!(envelope.records.len(), 1);
        assert_eq!(envelope.page_count, 4);
        assert_eq!(envelope.records_size, 20);
        assert_eq!(envelope.skip_records, 40);
        assert_eq!(envelope.row_count, 62);
        assert!(envelope.sql_command.is_none());
    }

    #[test]
    fn test_page_number_from_offset() {
        let envelope = PageEnvelope::<Value> {
            records: vec![],
            page_count: 4,
            records_size: 20,
            skip_records: 40,
            row_count: 62,
            sql_command: None,
        };
        let page = envelope.into_page(|r| r);
        assert_eq!(page.page, 3);
        assert_eq!(page.page_size, 20);
        assert_eq!(page.total_pages, 4);
        assert_eq!(page.total_records, 62);
    }

    #[test]
    fn test_zero_page_size_lands_on_page_one() {
        let envelope = PageEnvelope::<Value> {
            records: vec![],
            page_count: 0,
            records_size: 0,
            skip_records: 0,
            row_count: 0,
            sql_command: None,
        };
        assert_eq!(envelope.into_page(|r| r).page, 1);
    }

    #[test]
    fn test_missing_metadata_defaults_to_zero() {
        let body = json!({ "records": [] });
        let envelope: PageEnvelope<Value> = serde_json::from_value(body).unwrap();
        let page = envelope.into_page(|r| r);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_records, 0);
    }

    #[test]
    fn test_sql_command_carried_over() {
        let body = json!({
            "records": [],
            "row-count": 0,
            "sql-command": "SELECT * FROM C_BPartner",
        });
        let envelope: PageEnvelope<Value> = serde_json::from_value(body).unwrap();
        let page = envelope.into_page(|r| r);
        assert_eq!(page.sql.as_deref(), Some("SELECT * FROM C_BPartner"));
    }

    #[test]
    fn test_into_page_applies_transform() {
        let body = json!({
            "records": [{"Name": "Ada"}, {"Name": "Grace"}],
            "records-size": 2,
            "row-count": 2,
            "page-count": 1,
        });
        let envelope: PageEnvelope<Value> = serde_json::from_value(body).unwrap();
        let page = envelope.into_page(|r| r["Name"].as_str().unwrap_or("").to_string());
        assert_eq!(page.records, vec!["Ada".to_string(), "Grace".to_string()]);
    }

    #[test]
    fn test_empty_page_shape() {
        let page = PaginatedResponse::<Value>::empty();
        assert!(page.is_empty());
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 0);
    }
}
