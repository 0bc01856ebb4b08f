//! Per-stream protocol state machine.
//!
//! A [`Session`] consumes the inbound messages of one processing stream in
//! order and answers each with exactly one outbound message:
//!
//! | Inbound                     | Action                              | Outbound                  |
//! |-----------------------------|-------------------------------------|---------------------------|
//! | request headers             | none                                | request headers (continue)|
//! | request body chunk          | buffer                              | request body (continue)   |
//! | request body, end of stream | prompt pipeline                     | immediate or request body |
//! | response headers            | none                                | response headers          |
//! | response body chunk         | buffer                              | response body             |
//! | response body, end of stream| commit pending prompt, if any       | response body             |
//! | anything else               | none                                | empty                     |
//!
//! At most one prompt is pending per session: the stream is assumed to
//! carry strictly alternating request/response exchanges.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::{CACHE_HIT_STATUS, Processor};
use crate::cache::CacheEntry;
use crate::telemetry;
use crate::types::{BodyChunk, InboundMessage, OutboundMessage};

/// Name of the JSON request field that is embedded and matched.
pub const PROMPT_FIELD: &str = "prompt";

/// A prompt whose response has not arrived yet.
#[derive(Debug, Clone)]
struct PendingPrompt {
    prompt: String,
    embedding: Arc<[f64]>,
}

/// State of one processing stream.
pub struct Session {
    processor: Processor,
    pending: Option<PendingPrompt>,
    request_body: Vec<u8>,
    response_body: Vec<u8>,
}

impl Session {
    pub(crate) fn new(processor: Processor) -> Self {
        Self {
            processor,
            pending: None,
            request_body: Vec::new(),
            response_body: Vec::new(),
        }
    }

    /// Handle one inbound message and produce its answer.
    pub async fn handle(&mut self, message: InboundMessage) -> OutboundMessage {
        match message {
            InboundMessage::RequestHeaders => OutboundMessage::RequestHeaders,
            InboundMessage::RequestBody(chunk) => {
                debug!(end_of_stream = chunk.end_of_stream, "request body");
                match assemble(&mut self.request_body, chunk) {
                    Some(body) => self.on_request_complete(&body).await,
                    None => OutboundMessage::RequestBody,
                }
            }
            InboundMessage::ResponseHeaders => OutboundMessage::ResponseHeaders,
            InboundMessage::ResponseBody(chunk) => {
                debug!(end_of_stream = chunk.end_of_stream, "response body");
                if let Some(body) = assemble(&mut self.response_body, chunk) {
                    self.on_response_complete(body);
                }
                OutboundMessage::ResponseBody
            }
            InboundMessage::Unrecognized => OutboundMessage::Empty,
        }
    }

    /// Prompt recorded by the last complete request body, if any.
    pub fn pending_prompt(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.prompt.as_str())
    }

    async fn on_request_complete(&mut self, body: &[u8]) -> OutboundMessage {
        self.pending = None;

        let Some(prompt) = extract_prompt(body) else {
            return OutboundMessage::RequestBody;
        };
        debug!(prompt_len = prompt.len(), "prompt extracted");

        let Some(embedding) = self.processor.embedding_for(&prompt).await else {
            return OutboundMessage::RequestBody;
        };

        let found = self.processor.semantic_cache().search(&embedding);
        // An empty prompt may be answered from the cache but is never stored.
        if !prompt.is_empty() {
            self.pending = Some(PendingPrompt { prompt, embedding });
        }

        let threshold = self.processor.threshold();
        match found.entry {
            Some(entry) if found.score >= threshold && entry.has_response() => {
                info!(score = found.score, threshold, "semantic cache hit");
                metrics::counter!(telemetry::SEMANTIC_CACHE_HITS_TOTAL).increment(1);
                OutboundMessage::Immediate {
                    status: CACHE_HIT_STATUS,
                    body: entry.response.clone(),
                }
            }
            _ => {
                debug!(score = found.score, threshold, "semantic cache miss");
                metrics::counter!(telemetry::SEMANTIC_CACHE_MISSES_TOTAL).increment(1);
                OutboundMessage::RequestBody
            }
        }
    }

    fn on_response_complete(&mut self, body: Vec<u8>) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        debug!(
            prompt_len = pending.prompt.len(),
            response_len = body.len(),
            "caching response"
        );
        self.processor
            .semantic_cache()
            .insert(CacheEntry::new(pending.prompt, pending.embedding, body));
    }
}

/// Accumulate a body chunk; returns the whole body once the final chunk
/// arrives and resets the buffer.
fn assemble(buffer: &mut Vec<u8>, chunk: BodyChunk) -> Option<Vec<u8>> {
    if !chunk.end_of_stream {
        buffer.extend_from_slice(&chunk.body);
        return None;
    }
    if buffer.is_empty() {
        return Some(chunk.body);
    }
    let mut body = std::mem::take(buffer);
    body.extend_from_slice(&chunk.body);
    Some(body)
}

/// Pull the string `prompt` field out of a JSON object body.
fn extract_prompt(body: &[u8]) -> Option<String> {
    let mut object: Map<String, Value> = match serde_json::from_slice(body) {
        Ok(object) => object,
        Err(e) => {
            debug!(error = %e, "request body is not a JSON object");
            return None;
        }
    };
    match object.remove(PROMPT_FIELD) {
        Some(Value::String(prompt)) => Some(prompt),
        _ => None,
    }
}
