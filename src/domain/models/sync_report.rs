use serde::{Deserialize, Serialize};

use super::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// The source returned no records.
    Empty,
    /// Records were fetched but none could be indexed.
    Skipped,
    /// At least one point was written.
    Success,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Empty => "empty",
            SyncStatus::Skipped => "skipped",
            SyncStatus::Success => "success",
        }
    }
}

/// Summary of one synchronization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub status: SyncStatus,
    pub collection: String,
    pub records: usize,
    pub upserted: usize,
    pub skipped_ids: Vec<Option<RecordId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_dim: Option<usize>,
}

impl SyncReport {
    pub fn empty(collection: impl Into<String>) -> Self {
        Self {
            status: SyncStatus::Empty,
            collection: collection.into(),
            records: 0,
            upserted: 0,
            skipped_ids: Vec::new(),
            vector_dim: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SyncStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_names_match_the_serialized_form() {
        for status in [SyncStatus::Empty, SyncStatus::Skipped, SyncStatus::Success] {
            assert_eq!(serde_json::to_value(status).unwrap(), json!(status.as_str()));
        }
    }

    #[test]
    fn only_success_counts_as_success() {
        let mut report = SyncReport::empty("companies");
        assert!(!report.is_success());

        report.status = SyncStatus::Skipped;
        assert!(!report.is_success());

        report.status = SyncStatus::Success;
        assert!(report.is_success());
    }

    #[test]
    fn report_serializes_missing_ids_as_null() {
        let report = SyncReport {
            status: SyncStatus::Success,
            collection: "companies".to_string(),
            records: 3,
            upserted: 1,
            skipped_ids: vec![Some(RecordId::Integer(2)), None],
            vector_dim: Some(8),
        };

        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "status": "success",
                "collection": "companies",
                "records": 3,
                "upserted": 1,
                "skipped_ids": [2, null],
                "vector_dim": 8
            })
        );
    }
}
