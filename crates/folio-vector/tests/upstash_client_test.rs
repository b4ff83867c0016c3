//! Upstash REST client tests against a wiremock server.

use folio_core::{Error, VectorMetadata, VectorQuery, VectorRecord, VectorStoreClient};
use folio_vector::{UpstashConfig, UpstashVectorIndex};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> UpstashVectorIndex {
    UpstashVectorIndex::new(UpstashConfig::new(server.uri(), "test-token")).unwrap()
}

fn ok(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "result": result }))
}

#[tokio::test]
async fn test_upsert_sends_metadata_with_chunk_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upsert"))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_json(json!({
            "id": "exp-1",
            "vector": [0.5, 0.5],
            "metadata": {
                "title": "Experience",
                "chunk_type": "experience",
                "source_file": "cv.md",
                "content": "Rust services"
            }
        })))
        .respond_with(ok(json!("Success")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .upsert(VectorRecord {
            id: "exp-1".to_string(),
            vector: vec![0.5, 0.5],
            metadata: VectorMetadata {
                title: Some("Experience".to_string()),
                category: Some("experience".to_string()),
                source_file: Some("cv.md".to_string()),
                content: "Rust services".to_string(),
            },
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_and_reset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/delete"))
        .and(body_json(json!(["orphan"])))
        .respond_with(ok(json!({ "deleted": 1 })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/reset"))
        .respond_with(ok(json!("Success")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.delete("orphan").await.unwrap();
    client.reset().await.unwrap();
}

#[tokio::test]
async fn test_text_query_uses_query_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query-data"))
        .and(body_partial_json(json!({ "data": "software engineer", "topK": 5 })))
        .respond_with(ok(json!([
            { "id": "a", "score": 0.91, "metadata": { "title": "A", "chunk_type": "bio" } },
            { "id": "b", "score": 0.42 }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let hits = client
        .query(VectorQuery::Text("software engineer".to_string()), 5)
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "a");
    assert_eq!(
        hits[0].metadata.as_ref().unwrap().category.as_deref(),
        Some("bio")
    );
    assert!(hits[1].metadata.is_none());
}

#[tokio::test]
async fn test_list_all_ids_follows_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/range"))
        .and(body_partial_json(json!({ "cursor": "0" })))
        .respond_with(ok(json!({
            "nextCursor": "2",
            "vectors": [{ "id": "a" }, { "id": "b" }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/range"))
        .and(body_partial_json(json!({ "cursor": "2" })))
        .respond_with(ok(json!({ "nextCursor": "", "vectors": [{ "id": "c" }] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let ids = client.list_all_ids(2).await.unwrap();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_info_parses_counts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(ok(json!({
            "vectorCount": 42,
            "pendingVectorCount": 0,
            "indexSize": 1000,
            "dimension": 1024,
            "similarityFunction": "COSINE"
        })))
        .mount(&server)
        .await;

    let info = client_for(&server).info().await.unwrap();
    assert_eq!(info.vector_count, 42);
    assert_eq!(info.dimension, 1024);
}

#[tokio::test]
async fn test_error_response_maps_to_vector_store_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upsert"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "Invalid vector dimension: 2, expected: 1024",
            "status": 400
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .upsert(VectorRecord {
            id: "x".to_string(),
            vector: vec![0.1, 0.2],
            metadata: VectorMetadata::default(),
        })
        .await
        .unwrap_err();
    match err {
        Error::VectorStore(msg) => assert!(msg.contains("Invalid vector dimension")),
        other => panic!("expected vector store error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_index_is_an_error() {
    let client =
        UpstashVectorIndex::new(UpstashConfig::new("http://127.0.0.1:1", "t")).unwrap();
    assert!(matches!(client.info().await, Err(Error::VectorStore(_))));
}
