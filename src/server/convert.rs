//! Conversions between native message types and ext_proc protobuf types.
//!
//! Server side: proto → native for inbound requests, native → proto for
//! outbound responses. The reverse directions exist for clients and tests
//! that drive a processor over gRPC.

use crate::types::{BodyChunk, InboundMessage, OutboundMessage};

use super::proto::envoy::r#type::v3::HttpStatus;
use super::proto::ext_proc::{self as pb, processing_request, processing_response};

// =============================================================================
// From Proto → Native (incoming requests)
// =============================================================================

impl From<pb::HttpBody> for BodyChunk {
    fn from(p: pb::HttpBody) -> Self {
        BodyChunk {
            body: p.body,
            end_of_stream: p.end_of_stream,
        }
    }
}

impl From<pb::ProcessingRequest> for InboundMessage {
    fn from(p: pb::ProcessingRequest) -> Self {
        use processing_request::Request;

        match p.request {
            Some(Request::RequestHeaders(_)) => InboundMessage::RequestHeaders,
            Some(Request::RequestBody(body)) => InboundMessage::RequestBody(body.into()),
            Some(Request::ResponseHeaders(_)) => InboundMessage::ResponseHeaders,
            Some(Request::ResponseBody(body)) => InboundMessage::ResponseBody(body.into()),
            Some(Request::RequestTrailers(_) | Request::ResponseTrailers(_)) | None => {
                InboundMessage::Unrecognized
            }
        }
    }
}

// =============================================================================
// From Native → Proto (outgoing responses)
// =============================================================================

impl From<OutboundMessage> for pb::ProcessingResponse {
    fn from(message: OutboundMessage) -> Self {
        use processing_response::Response;

        let response = match message {
            OutboundMessage::RequestHeaders => {
                Some(Response::RequestHeaders(pb::HeadersResponse::default()))
            }
            OutboundMessage::RequestBody => Some(Response::RequestBody(pb::BodyResponse::default())),
            OutboundMessage::ResponseHeaders => {
                Some(Response::ResponseHeaders(pb::HeadersResponse::default()))
            }
            OutboundMessage::ResponseBody => {
                Some(Response::ResponseBody(pb::BodyResponse::default()))
            }
            OutboundMessage::Immediate { status, body } => {
                Some(Response::ImmediateResponse(pb::ImmediateResponse {
                    status: Some(HttpStatus {
                        code: i32::from(status),
                    }),
                    body,
                    ..Default::default()
                }))
            }
            OutboundMessage::Empty => None,
        };

        pb::ProcessingResponse { response }
    }
}

// =============================================================================
// Client-side conversions
// =============================================================================

impl From<BodyChunk> for pb::HttpBody {
    fn from(chunk: BodyChunk) -> Self {
        pb::HttpBody {
            body: chunk.body,
            end_of_stream: chunk.end_of_stream,
        }
    }
}

impl From<InboundMessage> for pb::ProcessingRequest {
    fn from(message: InboundMessage) -> Self {
        use processing_request::Request;

        let request = match message {
            InboundMessage::RequestHeaders => Some(Request::RequestHeaders(pb::HttpHeaders::default())),
            InboundMessage::RequestBody(chunk) => Some(Request::RequestBody(chunk.into())),
            InboundMessage::ResponseHeaders => {
                Some(Request::ResponseHeaders(pb::HttpHeaders::default()))
            }
            InboundMessage::ResponseBody(chunk) => Some(Request::ResponseBody(chunk.into())),
            InboundMessage::Unrecognized => None,
        };

        pb::ProcessingRequest {
            request,
            ..Default::default()
        }
    }
}

impl From<pb::ProcessingResponse> for OutboundMessage {
    fn from(p: pb::ProcessingResponse) -> Self {
        use processing_response::Response;

        match p.response {
            Some(Response::RequestHeaders(_)) => OutboundMessage::RequestHeaders,
            Some(Response::RequestBody(_)) => OutboundMessage::RequestBody,
            Some(Response::ResponseHeaders(_)) => OutboundMessage::ResponseHeaders,
            Some(Response::ResponseBody(_)) => OutboundMessage::ResponseBody,
            Some(Response::ImmediateResponse(immediate)) => OutboundMessage::Immediate {
                status: immediate
                    .status
                    .and_then(|s| u16::try_from(s.code).ok())
                    .unwrap_or_default(),
                body: immediate.body,
            },
            Some(Response::RequestTrailers(_) | Response::ResponseTrailers(_)) | None => {
                OutboundMessage::Empty
            }
        }
    }
}
