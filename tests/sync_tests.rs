//! End-to-end sync runs against in-memory adapters.

use std::sync::Arc;

use recordsync::application::ProviderFactory;
use recordsync::{
    DomainError, EmbeddingProvider, EmbeddingResolver, InMemoryRecordSource, InMemoryVectorIndex,
    MockEmbedding, PointId, Record, RecordId, RecordSource, SyncOptions, SyncRecordsUseCase,
    SyncSettings, SyncStatus, VectorIndex,
};
use recordsync::domain::CollectionSpec;
use serde_json::json;

const COLLECTION: &str = "companies";
const DIM: usize = 8;

struct TestEnv {
    index: Arc<InMemoryVectorIndex>,
    embedding: Arc<MockEmbedding>,
    use_case: SyncRecordsUseCase,
}

fn setup(source: InMemoryRecordSource, index: InMemoryVectorIndex, embedding: MockEmbedding) -> TestEnv {
    let index = Arc::new(index);
    let embedding = Arc::new(embedding);

    let shared = Arc::clone(&embedding);
    let factory: ProviderFactory = Arc::new(
        move |_model: &str| -> Result<Arc<dyn EmbeddingProvider>, DomainError> {
            Ok(Arc::clone(&shared) as Arc<dyn EmbeddingProvider>)
        },
    );
    let resolver = Arc::new(EmbeddingResolver::new("local://test", factory));

    let use_case = SyncRecordsUseCase::new(
        Arc::new(source) as Arc<dyn RecordSource>,
        Arc::clone(&index) as Arc<dyn VectorIndex>,
        resolver,
        SyncSettings {
            procedure: "get_company_infor".to_string(),
            collection: COLLECTION.to_string(),
            embedding_model: "test-model".to_string(),
            configured_vector_size: None,
        },
    );

    TestEnv {
        index,
        embedding,
        use_case,
    }
}

fn company(id: i64, name: &str) -> Record {
    Record::new(Some(RecordId::Integer(id)))
        .with_name(name)
        .with_description(format!("{} builds things", name))
}

fn companies(count: i64) -> Vec<Record> {
    (1..=count).map(|i| company(i, &format!("Company {}", i))).collect()
}

#[tokio::test]
async fn test_sync_skips_records_without_id_or_text() {
    let records = vec![
        Record::new(Some(RecordId::Integer(1)))
            .with_name("Acme")
            .with_description("Tech co"),
        Record::new(Some(RecordId::Integer(2))),
        Record::new(None).with_name("X"),
    ];
    let env = setup(
        InMemoryRecordSource::new(records),
        InMemoryVectorIndex::new(),
        MockEmbedding::with_dimensions(DIM),
    );

    let report = env.use_case.execute(SyncOptions::default()).await.unwrap();

    assert_eq!(report.status, SyncStatus::Success);
    assert_eq!(report.records, 3);
    assert_eq!(report.upserted, 1);
    assert_eq!(report.skipped_ids, vec![Some(RecordId::Integer(2)), None]);
    assert_eq!(report.vector_dim, Some(DIM));

    let points = env.index.points(COLLECTION).await;
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].id(), &PointId::Integer(1));
    assert_eq!(points[0].payload()["name"], json!("Acme"));
    assert_eq!(points[0].payload()["website"], json!(null));
}

#[tokio::test]
async fn test_rerun_with_unchanged_records_is_idempotent() {
    let env = setup(
        InMemoryRecordSource::new(companies(4)),
        InMemoryVectorIndex::new(),
        MockEmbedding::with_dimensions(DIM),
    );

    env.use_case.execute(SyncOptions::default()).await.unwrap();
    let first = env.index.points(COLLECTION).await;

    let report = env.use_case.execute(SyncOptions::default()).await.unwrap();
    let second = env.index.points(COLLECTION).await;

    assert_eq!(report.upserted, 4);
    assert_eq!(first, second);
    assert_eq!(env.index.create_calls().await, 1);
    assert_eq!(env.index.recreate_calls().await, 0);
}

#[tokio::test]
async fn test_upserts_are_split_into_batches() {
    let env = setup(
        InMemoryRecordSource::new(companies(5)),
        InMemoryVectorIndex::new(),
        MockEmbedding::with_dimensions(DIM),
    );

    let report = env
        .use_case
        .execute(SyncOptions::default().with_batch_size(2))
        .await
        .unwrap();

    assert_eq!(report.upserted, 5);
    assert_eq!(env.index.batch_sizes().await, vec![2, 2, 1]);
}

#[tokio::test]
async fn test_zero_batch_size_is_rejected() {
    let env = setup(
        InMemoryRecordSource::new(companies(1)),
        InMemoryVectorIndex::new(),
        MockEmbedding::with_dimensions(DIM),
    );

    let err = env
        .use_case
        .execute(SyncOptions::default().with_batch_size(0))
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::InvalidInput(_)));
}

#[tokio::test]
async fn test_collection_with_matching_dimension_is_kept() {
    let index = InMemoryVectorIndex::new();
    index
        .create_collection(&CollectionSpec::cosine(COLLECTION, DIM))
        .await
        .unwrap();
    let env = setup(
        InMemoryRecordSource::new(companies(2)),
        index,
        MockEmbedding::with_dimensions(DIM),
    );

    env.use_case.execute(SyncOptions::default()).await.unwrap();

    assert_eq!(env.index.create_calls().await, 1);
    assert_eq!(env.index.recreate_calls().await, 0);
}

#[tokio::test]
async fn test_collection_with_other_dimension_is_recreated() {
    let index = InMemoryVectorIndex::new();
    index
        .create_collection(&CollectionSpec::cosine(COLLECTION, 4))
        .await
        .unwrap();
    let env = setup(
        InMemoryRecordSource::new(companies(2)),
        index,
        MockEmbedding::with_dimensions(DIM),
    );

    let report = env.use_case.execute(SyncOptions::default()).await.unwrap();

    assert_eq!(report.vector_dim, Some(DIM));
    assert_eq!(env.index.recreate_calls().await, 1);
    let info = env.index.get_collection(COLLECTION).await.unwrap().unwrap();
    assert_eq!(info.dimension, Some(DIM));
}

#[tokio::test]
async fn test_failed_batch_keeps_earlier_batches() {
    let env = setup(
        InMemoryRecordSource::new(companies(5)),
        InMemoryVectorIndex::new().failing_after(1),
        MockEmbedding::with_dimensions(DIM),
    );

    let err = env
        .use_case
        .execute(SyncOptions::default().with_batch_size(2))
        .await
        .unwrap_err();

    assert!(err.is_storage_error());
    assert_eq!(env.index.point_count(COLLECTION).await, 2);
}

#[tokio::test]
async fn test_empty_source_and_fallback_reports_empty() {
    let env = setup(
        InMemoryRecordSource::new(vec![]).with_fallback(vec![]),
        InMemoryVectorIndex::new(),
        MockEmbedding::with_dimensions(DIM),
    );

    let report = env.use_case.execute(SyncOptions::default()).await.unwrap();

    assert_eq!(report.status, SyncStatus::Empty);
    assert_eq!(report.upserted, 0);
    assert!(env.index.get_collection(COLLECTION).await.unwrap().is_none());
    assert_eq!(env.embedding.encode_calls(), 0);
}

#[tokio::test]
async fn test_records_without_text_report_skipped() {
    let records = vec![
        Record::new(Some(RecordId::Integer(1))),
        Record::new(Some(RecordId::Integer(2))).with_name(""),
    ];
    let env = setup(
        InMemoryRecordSource::new(records),
        InMemoryVectorIndex::new(),
        MockEmbedding::with_dimensions(DIM),
    );

    let report = env.use_case.execute(SyncOptions::default()).await.unwrap();

    assert_eq!(report.status, SyncStatus::Skipped);
    assert_eq!(report.upserted, 0);
    assert_eq!(
        report.skipped_ids,
        vec![Some(RecordId::Integer(1)), Some(RecordId::Integer(2))]
    );
    assert!(env.index.batch_sizes().await.is_empty());
}

#[tokio::test]
async fn test_failing_source_syncs_fallback_records() {
    let env = setup(
        InMemoryRecordSource::failing("connection refused"),
        InMemoryVectorIndex::new(),
        MockEmbedding::with_dimensions(DIM),
    );

    let report = env.use_case.execute(SyncOptions::default()).await.unwrap();

    assert_eq!(report.status, SyncStatus::Success);
    assert_eq!(report.upserted, 3);
    let ids: Vec<PointId> = env
        .index
        .points(COLLECTION)
        .await
        .iter()
        .map(|p| p.id().clone())
        .collect();
    assert_eq!(
        ids,
        vec![PointId::Integer(1), PointId::Integer(2), PointId::Integer(3)]
    );
}

#[tokio::test]
async fn test_unreported_dimension_is_sampled_once_per_run() {
    let env = setup(
        InMemoryRecordSource::new(companies(3)),
        InMemoryVectorIndex::new(),
        MockEmbedding::with_dimensions(DIM).without_dimension_report(),
    );

    let report = env.use_case.execute(SyncOptions::default()).await.unwrap();

    assert_eq!(report.vector_dim, Some(DIM));
    // one sample encode plus one per record
    assert_eq!(env.embedding.encode_calls(), 4);
}

#[tokio::test]
async fn test_collection_override_and_limit() {
    let env = setup(
        InMemoryRecordSource::new(companies(5)),
        InMemoryVectorIndex::new(),
        MockEmbedding::with_dimensions(DIM),
    );

    let report = env
        .use_case
        .execute(
            SyncOptions::default()
                .with_collection("staging")
                .with_limit(2),
        )
        .await
        .unwrap();

    assert_eq!(report.collection, "staging");
    assert_eq!(report.upserted, 2);
    assert_eq!(env.index.point_count("staging").await, 2);
    assert_eq!(env.index.point_count(COLLECTION).await, 0);
}
