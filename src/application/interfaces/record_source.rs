use async_trait::async_trait;

use crate::domain::{DomainError, Record, RecordId};

/// Fetches ordered records from the relational system of record.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Calls the named procedure. Transport and response failures are
    /// reported as errors; callers decide whether to degrade.
    async fn fetch(&self, procedure: &str, limit: usize) -> Result<Vec<Record>, DomainError>;

    /// Deterministic records used when `fetch` fails or returns nothing.
    fn fallback(&self, limit: usize) -> Vec<Record> {
        fallback_records(limit)
    }
}

/// Fixed placeholder companies, truncated to `limit`.
pub fn fallback_records(limit: usize) -> Vec<Record> {
    let samples = [
        (
            1,
            "FPT Software",
            "https://fptsoftware.com",
            "10000+",
            "Global IT services and software outsourcing company",
            "Hanoi, Vietnam",
            "Information Technology",
        ),
        (
            2,
            "VNG Corporation",
            "https://vng.com.vn",
            "1000-5000",
            "Internet and technology company building games, messaging and cloud services",
            "Ho Chi Minh City, Vietnam",
            "Internet, Gaming",
        ),
        (
            3,
            "Tiki",
            "https://tiki.vn",
            "1000-5000",
            "E-commerce platform",
            "Ho Chi Minh City, Vietnam",
            "E-commerce, Retail",
        ),
    ];

    samples
        .into_iter()
        .take(limit)
        .map(|(id, name, website, size, description, addresses, industries)| {
            Record::new(Some(RecordId::Integer(id)))
                .with_name(name)
                .with_website(website)
                .with_size(size)
                .with_description(description)
                .with_addresses(addresses)
                .with_industries(industries)
        })
        .collect()
}
