use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::application::{fallback_records, RecordSource};
use crate::domain::{DomainError, Record};

/// Serves a fixed list of records. Used when no relational source is
/// configured and in tests.
pub struct InMemoryRecordSource {
    records: Vec<Record>,
    failure: Option<String>,
    fallback: Option<Vec<Record>>,
    fetch_calls: AtomicUsize,
}

impl InMemoryRecordSource {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            failure: None,
            fallback: None,
            fetch_calls: AtomicUsize::new(0),
        }
    }

    /// Every fetch fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new(Vec::new())
        }
    }

    /// Replaces the built-in placeholder records.
    pub fn with_fallback(mut self, records: Vec<Record>) -> Self {
        self.fallback = Some(records);
        self
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSource for InMemoryRecordSource {
    async fn fetch(&self, _procedure: &str, limit: usize) -> Result<Vec<Record>, DomainError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(DomainError::source(message.clone())),
            None => Ok(self.records.iter().take(limit).cloned().collect()),
        }
    }

    fn fallback(&self, limit: usize) -> Vec<Record> {
        match &self.fallback {
            Some(records) => records.iter().take(limit).cloned().collect(),
            None => fallback_records(limit),
        }
    }
}
