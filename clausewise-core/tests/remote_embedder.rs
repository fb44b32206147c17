//! Remote embedding providers driven through the orchestrator.
//!
//! A local TCP listener plays the embedding service and answers each
//! connection with the next canned HTTP response.

use clausewise_core::backend::MockBackend;
use clausewise_core::embeddings::{Embedder, LocalEmbedder, OllamaEmbedder, OpenAiEmbedder};
use clausewise_core::error::{ClausewiseError, IndexError};
use clausewise_core::index::{ArtifactEmbedder, IndexArtifact, IndexEntry, VectorIndex};
use clausewise_core::orchestrator::ReasoningOrchestrator;
use clausewise_core::rules::RuleRegistry;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Dimensions of the default Ollama model (`all-minilm`).
const DIMS: usize = 384;

const PARTY_CLAUSE: &str = "Party A is Acme Corp. Party B is Globex Ltd.";
const LAW_CLAUSE: &str = "This agreement is governed by the laws of Delaware.";

/// Read one HTTP request (headers plus `Content-Length` body).
async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let body_len = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                return;
            }
        }
    }
}

/// Start a stub embedding service and return its base URL.
async fn serve(responses: Vec<(u16, String)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            let reply = format!(
                "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        }
    });
    format!("http://{}", addr)
}

async fn local_vector(text: &str) -> Vec<f32> {
    LocalEmbedder::new(DIMS).embed(text).await.unwrap()
}

async fn ollama_reply(text: &str) -> (u16, String) {
    let body = serde_json::json!({ "embeddings": [local_vector(text).await] });
    (200, body.to_string())
}

async fn openai_reply(text: &str) -> (u16, String) {
    let body = serde_json::json!({ "data": [{ "embedding": local_vector(text).await }] });
    (200, body.to_string())
}

async fn contract_index(embedder: Box<dyn Embedder>) -> VectorIndex {
    let mut entries = Vec::new();
    for (content, filename) in [(PARTY_CLAUSE, "c1.txt"), (LAW_CLAUSE, "c2.txt")] {
        let mut metadata = serde_json::Map::new();
        metadata.insert("filename".into(), filename.into());
        entries.push(IndexEntry {
            content: content.to_string(),
            metadata,
            embedding: local_vector(content).await,
        });
    }
    let artifact = IndexArtifact {
        embedder: ArtifactEmbedder {
            provider: "ollama".into(),
            model: Some("all-minilm".into()),
            dimensions: DIMS,
        },
        entries,
    };
    VectorIndex::from_artifact(artifact, embedder).unwrap()
}

async fn ollama_orchestrator(base_url: String, backend: Arc<MockBackend>) -> ReasoningOrchestrator {
    let embedder = OllamaEmbedder::new(Some("all-minilm".into()), Some(base_url));
    let index = contract_index(Box::new(embedder)).await;
    ReasoningOrchestrator::new(
        Arc::new(RuleRegistry::from_rules(Vec::new()).unwrap()),
        Arc::new(index),
        backend,
    )
}

#[tokio::test]
async fn test_remote_embedder_on_current_thread_runtime() {
    let base_url = serve(vec![ollama_reply(PARTY_CLAUSE).await]).await;
    let backend = Arc::new(MockBackend::new());
    let orch = ollama_orchestrator(base_url, backend.clone()).await;

    let result = orch.check_compliance("party", 1).await.unwrap();
    assert_eq!(result.sources, vec!["c1.txt"]);
    assert_eq!(result.source_count, Some(1));
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn test_remote_embedder_inside_spawned_tasks() {
    let base_url = serve(vec![
        ollama_reply(LAW_CLAUSE).await,
        ollama_reply(LAW_CLAUSE).await,
    ])
    .await;
    let backend = Arc::new(MockBackend::new());
    let orch = Arc::new(ollama_orchestrator(base_url, backend.clone()).await);

    let mut handles = Vec::new();
    for _ in 0..2 {
        let orch = orch.clone();
        handles.push(tokio::spawn(async move {
            orch.answer_question("Which law governs?", 1).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().sources, vec!["c2.txt"]);
    }
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test]
async fn test_embedder_server_error_surfaces_as_index_error() {
    let base_url = serve(vec![
        (500, r#"{"error": "overloaded"}"#.to_string()),
        ollama_reply(PARTY_CLAUSE).await,
    ])
    .await;
    let backend = Arc::new(MockBackend::new());
    let orch = ollama_orchestrator(base_url, backend.clone()).await;

    match orch.check_compliance("party", 2).await {
        Err(ClausewiseError::Index(IndexError::Unavailable { message })) => {
            assert!(message.contains("500"), "unexpected message: {}", message);
        }
        other => panic!("Expected Index error, got {:?}", other),
    }
    assert_eq!(backend.call_count(), 0);

    let result = orch.check_compliance("party", 2).await.unwrap();
    assert_eq!(result.sources, vec!["c1.txt", "c2.txt"]);
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn test_ollama_http_status_is_reported() {
    let base_url = serve(vec![(404, r#"{"error": "model not found"}"#.to_string())]).await;
    let embedder = OllamaEmbedder::new(Some("all-minilm".into()), Some(base_url));

    match embedder.embed("party").await {
        Err(IndexError::Unavailable { message }) => {
            assert!(message.contains("404"), "unexpected message: {}", message);
            assert!(!message.contains("no embedding"));
        }
        other => panic!("Expected Unavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_openai_embedder_against_stub() {
    let base_url = serve(vec![openai_reply(LAW_CLAUSE).await]).await;
    let embedder = OpenAiEmbedder::new("test-key".into(), None, Some(base_url));

    let vector = embedder.embed("governing law").await.unwrap();
    assert_eq!(vector, local_vector(LAW_CLAUSE).await);
}

#[tokio::test]
async fn test_unreachable_embedder_is_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let backend = Arc::new(MockBackend::new());
    let orch = ollama_orchestrator(base_url, backend.clone()).await;
    let err = orch.answer_question("Who are the parties?", 1).await.unwrap_err();
    assert!(matches!(err, ClausewiseError::Index(IndexError::Unavailable { .. })));
    assert_eq!(backend.call_count(), 0);
}
