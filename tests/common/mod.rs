//! Shared test helpers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use mimir::{
    BodyChunk, CacheEntry, EmbeddingProvider, InboundMessage, MimirError, Mimir, OutboundMessage,
    Processor, Result, Session,
};

/// Embedding provider answering from a fixed table and counting calls.
#[derive(Default)]
pub struct StubProvider {
    vectors: HashMap<String, Vec<f64>>,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, prompt: &str, vector: Vec<f64>) -> Self {
        self.vectors.insert(prompt.to_string(), vector);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn embed(&self, prompt: &str) -> Result<Vec<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.vectors
            .get(prompt)
            .cloned()
            .ok_or_else(|| MimirError::Transport(format!("no vector for {prompt:?}")))
    }
}

/// Build a processor over a stub provider.
pub fn processor(provider: Arc<StubProvider>, threshold: f64) -> Processor {
    Mimir::builder()
        .embedding_provider(provider)
        .similarity_threshold(threshold)
        .build()
        .unwrap()
}

/// Unit vector at cosine `score` from `[1, 0]`.
pub fn at_score(score: f64) -> Vec<f64> {
    vec![score, (1.0 - score * score).sqrt()]
}

pub fn entry(prompt: &str, embedding: Vec<f64>, response: &[u8]) -> CacheEntry {
    CacheEntry::new(prompt, Arc::from(embedding), response.to_vec())
}

pub fn prompt_body(prompt: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({ "prompt": prompt, "max_tokens": 16 })).unwrap()
}

pub fn request_body(body: Vec<u8>) -> InboundMessage {
    InboundMessage::RequestBody(BodyChunk::last(body))
}

pub fn response_body(body: &[u8]) -> InboundMessage {
    InboundMessage::ResponseBody(BodyChunk::last(body.to_vec()))
}

/// Run a full request/response exchange; returns the answer to the
/// request body.
pub async fn exchange(session: &mut Session, prompt: &str, upstream: &[u8]) -> OutboundMessage {
    assert_eq!(
        session.handle(InboundMessage::RequestHeaders).await,
        OutboundMessage::RequestHeaders
    );
    let answer = session.handle(request_body(prompt_body(prompt))).await;
    if answer.is_immediate() {
        return answer;
    }
    assert_eq!(
        session.handle(InboundMessage::ResponseHeaders).await,
        OutboundMessage::ResponseHeaders
    );
    assert_eq!(
        session.handle(response_body(upstream)).await,
        OutboundMessage::ResponseBody
    );
    answer
}
