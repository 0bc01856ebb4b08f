//! Tests for the per-stream protocol state machine.

mod common;

use std::sync::Arc;

use common::*;
use mimir::{BodyChunk, EmbeddingCache, InboundMessage, Mimir, OutboundMessage};

#[tokio::test]
async fn headers_pass_through() {
    let provider = Arc::new(StubProvider::new());
    let mut session = processor(Arc::clone(&provider), 0.75).session();

    assert_eq!(
        session.handle(InboundMessage::RequestHeaders).await,
        OutboundMessage::RequestHeaders
    );
    assert_eq!(
        session.handle(InboundMessage::ResponseHeaders).await,
        OutboundMessage::ResponseHeaders
    );
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn unrecognized_gets_empty_answer() {
    let provider = Arc::new(StubProvider::new());
    let mut session = processor(provider, 0.75).session();

    assert_eq!(
        session.handle(InboundMessage::Unrecognized).await,
        OutboundMessage::Empty
    );
}

#[tokio::test]
async fn chunked_request_runs_pipeline_only_on_last_chunk() {
    let provider = Arc::new(StubProvider::new().with("hello", vec![1.0, 0.0]));
    let mut session = processor(Arc::clone(&provider), 0.75).session();

    let body = prompt_body("hello");
    let (head, tail) = body.split_at(body.len() / 2);

    let first = session
        .handle(InboundMessage::RequestBody(BodyChunk::partial(head.to_vec())))
        .await;
    assert_eq!(first, OutboundMessage::RequestBody);
    assert_eq!(provider.calls(), 0, "pipeline must wait for end of stream");
    assert!(session.pending_prompt().is_none());

    let second = session
        .handle(InboundMessage::RequestBody(BodyChunk::last(tail.to_vec())))
        .await;
    assert_eq!(second, OutboundMessage::RequestBody);
    assert_eq!(provider.calls(), 1);
    assert_eq!(session.pending_prompt(), Some("hello"));
}

#[tokio::test]
async fn tie_break_returns_first_inserted_best() {
    let provider = Arc::new(StubProvider::new().with("query", vec![1.0, 0.0]));
    let processor = processor(provider, 0.75);
    let cache = processor.semantic_cache();
    cache.insert(entry("low", at_score(0.6), b"low"));
    cache.insert(entry("first", at_score(0.9), b"first"));
    cache.insert(entry("second", at_score(0.9), b"second"));

    let mut session = processor.session();
    let answer = session.handle(request_body(prompt_body("query"))).await;

    assert_eq!(
        answer,
        OutboundMessage::Immediate {
            status: 200,
            body: b"first".to_vec(),
        }
    );
}

#[tokio::test]
async fn below_threshold_passes_through() {
    let provider = Arc::new(StubProvider::new().with("query", vec![1.0, 0.0]));
    let processor = processor(provider, 0.75);
    processor
        .semantic_cache()
        .insert(entry("near", at_score(0.74), b"near"));

    let mut session = processor.session();
    let answer = session.handle(request_body(prompt_body("query"))).await;
    assert_eq!(answer, OutboundMessage::RequestBody);
}

#[tokio::test]
async fn threshold_is_inclusive() {
    let provider = Arc::new(StubProvider::new().with("query", vec![1.0, 0.0]));
    let processor = processor(provider, 1.0);
    processor
        .semantic_cache()
        .insert(entry("same", vec![2.0, 0.0], b"cached"));

    let mut session = processor.session();
    let answer = session.handle(request_body(prompt_body("query"))).await;
    assert!(answer.is_immediate());
}

#[tokio::test]
async fn match_without_stored_response_passes_through() {
    let provider = Arc::new(StubProvider::new().with("query", vec![1.0, 0.0]));
    let processor = processor(provider, 0.75);
    processor
        .semantic_cache()
        .insert(entry("query", vec![1.0, 0.0], b""));

    let mut session = processor.session();
    let answer = session.handle(request_body(prompt_body("query"))).await;
    assert_eq!(answer, OutboundMessage::RequestBody);
}

#[tokio::test]
async fn miss_then_response_is_cached_and_replayed() {
    let provider = Arc::new(StubProvider::new().with("what is rust", vec![0.2, 0.9, 0.1]));
    let processor = processor(Arc::clone(&provider), 0.75);

    let mut first = processor.session();
    let answer = exchange(&mut first, "what is rust", b"{\"text\":\"a language\"}").await;
    assert_eq!(answer, OutboundMessage::RequestBody);
    assert_eq!(processor.semantic_cache().len(), 1);

    let mut second = processor.session();
    let answer = exchange(&mut second, "what is rust", b"unused").await;
    assert_eq!(
        answer,
        OutboundMessage::Immediate {
            status: 200,
            body: b"{\"text\":\"a language\"}".to_vec(),
        }
    );
    assert_eq!(provider.calls(), 1, "second lookup must come from the memo");
    assert_eq!(processor.semantic_cache().len(), 1);
}

#[tokio::test]
async fn identical_prompts_embed_once() {
    let provider = Arc::new(StubProvider::new().with("p", vec![1.0, 1.0]));
    let processor = processor(Arc::clone(&provider), 0.75);

    let mut session = processor.session();
    session.handle(request_body(prompt_body("p"))).await;
    session.handle(request_body(prompt_body("p"))).await;

    assert_eq!(provider.calls(), 1);
    assert_eq!(
        processor.embedding_cache().get("p").as_deref(),
        Some(&[1.0, 1.0][..])
    );
}

#[tokio::test]
async fn chunked_response_is_cached_whole() {
    let provider = Arc::new(StubProvider::new().with("p", vec![1.0, 0.0]));
    let processor = processor(provider, 0.75);

    let mut session = processor.session();
    session.handle(request_body(prompt_body("p"))).await;
    session
        .handle(InboundMessage::ResponseBody(BodyChunk::partial(b"hello ".to_vec())))
        .await;
    session
        .handle(InboundMessage::ResponseBody(BodyChunk::last(b"world".to_vec())))
        .await;

    let found = processor.semantic_cache().search(&[1.0, 0.0]);
    assert_eq!(found.entry.unwrap().response, b"hello world");
}

#[tokio::test]
async fn response_without_pending_prompt_is_not_cached() {
    let provider = Arc::new(StubProvider::new());
    let processor = processor(provider, 0.75);

    let mut session = processor.session();
    session.handle(InboundMessage::ResponseHeaders).await;
    let answer = session.handle(response_body(b"orphan")).await;

    assert_eq!(answer, OutboundMessage::ResponseBody);
    assert!(processor.semantic_cache().is_empty());
}

#[tokio::test]
async fn invalid_json_passes_through() {
    let provider = Arc::new(StubProvider::new());
    let processor = processor(Arc::clone(&provider), 0.75);

    let mut session = processor.session();
    let answer = session.handle(request_body(b"{not json".to_vec())).await;
    assert_eq!(answer, OutboundMessage::RequestBody);
    assert!(session.pending_prompt().is_none());

    session.handle(response_body(b"upstream")).await;
    assert!(processor.semantic_cache().is_empty());
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn missing_or_non_string_prompt_passes_through() {
    let provider = Arc::new(StubProvider::new());
    let processor = processor(Arc::clone(&provider), 0.75);
    let mut session = processor.session();

    for body in [
        br#"{"messages": [{"role": "user", "content": "hi"}]}"#.to_vec(),
        br#"{"prompt": ["a", "b"]}"#.to_vec(),
        br#"{"prompt": null}"#.to_vec(),
    ] {
        let answer = session.handle(request_body(body)).await;
        assert_eq!(answer, OutboundMessage::RequestBody);
    }
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn empty_prompt_is_matched_but_never_stored() {
    let provider = Arc::new(StubProvider::new().with("", vec![1.0, 0.0]));
    let processor = processor(Arc::clone(&provider), 0.75);
    processor
        .semantic_cache()
        .insert(entry("seed", vec![1.0, 0.0], b"cached"));

    let mut session = processor.session();
    let answer = session.handle(request_body(prompt_body(""))).await;
    assert_eq!(
        answer,
        OutboundMessage::Immediate {
            status: 200,
            body: b"cached".to_vec(),
        }
    );
    assert_eq!(provider.calls(), 1);
    assert!(session.pending_prompt().is_none());
}

#[tokio::test]
async fn empty_prompt_miss_does_not_cache_response() {
    let provider = Arc::new(StubProvider::new().with("", vec![0.0, 1.0]));
    let processor = processor(Arc::clone(&provider), 0.75);
    processor
        .semantic_cache()
        .insert(entry("seed", vec![1.0, 0.0], b"cached"));

    let mut session = processor.session();
    let answer = exchange(&mut session, "", b"upstream").await;
    assert_eq!(answer, OutboundMessage::RequestBody);
    assert_eq!(provider.calls(), 1);
    assert_eq!(processor.semantic_cache().len(), 1);
}

#[tokio::test]
async fn embedding_failure_passes_through_without_caching() {
    // Stub has no vector for this prompt and answers with a transport error.
    let provider = Arc::new(StubProvider::new());
    let processor = processor(Arc::clone(&provider), 0.75);

    let mut session = processor.session();
    let answer = exchange(&mut session, "unknown", b"upstream").await;

    assert_eq!(answer, OutboundMessage::RequestBody);
    assert_eq!(provider.calls(), 1);
    assert!(processor.embedding_cache().get("unknown").is_none());
    assert!(processor.semantic_cache().is_empty());
}

#[tokio::test]
async fn memo_hit_works_without_provider() {
    let memo = Arc::new(EmbeddingCache::new());
    memo.insert("known", Arc::from(vec![0.0, 1.0]));
    let processor = Mimir::builder().embedding_cache(memo).build().unwrap();
    processor
        .semantic_cache()
        .insert(entry("known", vec![0.0, 1.0], b"cached"));

    let mut session = processor.session();
    let answer = session.handle(request_body(prompt_body("known"))).await;
    assert!(answer.is_immediate());

    let answer = session.handle(request_body(prompt_body("other"))).await;
    assert_eq!(answer, OutboundMessage::RequestBody);
}

#[tokio::test]
async fn hit_still_records_pending_prompt() {
    let provider = Arc::new(StubProvider::new().with("p", vec![1.0, 0.0]));
    let processor = processor(provider, 0.75);
    processor
        .semantic_cache()
        .insert(entry("p", vec![1.0, 0.0], b"cached"));

    let mut session = processor.session();
    let answer = session.handle(request_body(prompt_body("p"))).await;
    assert!(answer.is_immediate());
    assert_eq!(session.pending_prompt(), Some("p"));
}

#[tokio::test]
async fn new_request_replaces_pending_prompt() {
    let provider = Arc::new(StubProvider::new().with("a", vec![1.0, 0.0]));
    let processor = processor(provider, 0.75);

    let mut session = processor.session();
    session.handle(request_body(prompt_body("a"))).await;
    assert_eq!(session.pending_prompt(), Some("a"));

    // A prompt-less request must not inherit the previous prompt.
    session.handle(request_body(b"{}".to_vec())).await;
    assert!(session.pending_prompt().is_none());

    session.handle(response_body(b"for the prompt-less request")).await;
    assert!(processor.semantic_cache().is_empty());
}

#[tokio::test]
async fn pending_prompt_is_committed_once() {
    let provider = Arc::new(StubProvider::new().with("p", vec![1.0, 0.0]));
    let processor = processor(provider, 0.75);

    let mut session = processor.session();
    session.handle(request_body(prompt_body("p"))).await;
    session.handle(response_body(b"one")).await;
    session.handle(response_body(b"two")).await;

    assert_eq!(processor.semantic_cache().len(), 1);
    assert!(session.pending_prompt().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sessions_each_insert_once() {
    const SESSIONS: usize = 32;

    let mut provider = StubProvider::new();
    for i in 0..SESSIONS {
        provider = provider.with(&format!("prompt-{i}"), vec![i as f64 + 1.0, 1.0]);
    }
    let processor = processor(Arc::new(provider), 1.01);

    let mut handles = Vec::new();
    for i in 0..SESSIONS {
        let processor = processor.clone();
        handles.push(tokio::spawn(async move {
            let mut session = processor.session();
            exchange(&mut session, &format!("prompt-{i}"), format!("r{i}").as_bytes()).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), OutboundMessage::RequestBody);
    }

    assert_eq!(processor.semantic_cache().len(), SESSIONS);
}
