//! Serving-path lookups over a collection filled by a sync run.

use std::sync::Arc;

use recordsync::application::ProviderFactory;
use recordsync::{
    DomainError, EmbeddingProvider, EmbeddingResolver, InMemoryRecordSource, InMemoryVectorIndex,
    MockEmbedding, PointId, Record, RecordId, RecordSource, RetrieveRecordsUseCase, SyncOptions,
    SyncRecordsUseCase, SyncSettings, VectorIndex,
};
use serde_json::json;

const COLLECTION: &str = "companies";
const MODEL: &str = "test-model";
const DIM: usize = 8;

struct TestEnv {
    records: Vec<Record>,
    sync: SyncRecordsUseCase,
    retrieve: RetrieveRecordsUseCase,
}

fn company(id: i64) -> Record {
    let name = format!("Company {}", id);
    Record::new(Some(RecordId::Integer(id)))
        .with_description(format!("{} builds things", name))
        .with_name(name)
}

/// Sync and retrieval share one index and one resolver, as in the container.
fn setup(count: i64) -> TestEnv {
    let records: Vec<Record> = (1..=count).map(company).collect();
    let index = Arc::new(InMemoryVectorIndex::new()) as Arc<dyn VectorIndex>;

    let embedding = Arc::new(MockEmbedding::with_dimensions(DIM));
    let factory: ProviderFactory = Arc::new(
        move |_model: &str| -> Result<Arc<dyn EmbeddingProvider>, DomainError> {
            Ok(Arc::clone(&embedding) as Arc<dyn EmbeddingProvider>)
        },
    );
    let resolver = Arc::new(EmbeddingResolver::new("local://test", factory));

    let sync = SyncRecordsUseCase::new(
        Arc::new(InMemoryRecordSource::new(records.clone())) as Arc<dyn RecordSource>,
        Arc::clone(&index),
        Arc::clone(&resolver),
        SyncSettings {
            procedure: "get_company_infor".to_string(),
            collection: COLLECTION.to_string(),
            embedding_model: MODEL.to_string(),
            configured_vector_size: None,
        },
    );
    let retrieve = RetrieveRecordsUseCase::new(index, resolver, MODEL, COLLECTION);

    TestEnv {
        records,
        sync,
        retrieve,
    }
}

#[tokio::test]
async fn test_blank_query_is_rejected() {
    let env = setup(1);

    for query in ["", "   \n\t"] {
        let err = env.retrieve.execute(query, 5).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)), "{query:?}");
    }
}

#[tokio::test]
async fn test_matching_record_ranks_first() {
    let env = setup(5);
    env.sync.execute(SyncOptions::default()).await.unwrap();

    let query = env.records[2].descriptive_text();
    let results = env.retrieve.execute(&query, 5).await.unwrap();

    assert_eq!(results.len(), 5);
    assert_eq!(results[0].id(), &PointId::Integer(3));
    assert_eq!(results[0].payload()["id"], json!(3));
    assert_eq!(results[0].payload()["name"], json!("Company 3"));
    assert!((results[0].score() - 1.0).abs() < 1e-5);
    assert!(results
        .windows(2)
        .all(|pair| pair[0].score() >= pair[1].score()));
}

#[tokio::test]
async fn test_results_are_truncated_to_top_k() {
    let env = setup(5);
    env.sync.execute(SyncOptions::default()).await.unwrap();

    let results = env.retrieve.execute("Company 4 builds things", 2).await.unwrap();

    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_search_before_sync_reports_missing_collection() {
    let env = setup(1);

    let err = env.retrieve.execute("anything", 3).await.unwrap_err();

    assert!(matches!(err, DomainError::NotFound(_)));
}
