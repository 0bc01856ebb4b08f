//! Inbound and outbound stream messages.

/// A piece of an HTTP body as delivered by the proxy.
///
/// In buffered mode the whole body arrives as a single chunk with
/// `end_of_stream` set; in streamed mode it arrives in several.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyChunk {
    pub body: Vec<u8>,
    pub end_of_stream: bool,
}

impl BodyChunk {
    /// A chunk followed by more chunks.
    pub fn partial(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            end_of_stream: false,
        }
    }

    /// The final chunk of a body.
    pub fn last(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            end_of_stream: true,
        }
    }
}

/// A message received from the proxy on a processing stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    RequestHeaders,
    RequestBody(BodyChunk),
    ResponseHeaders,
    ResponseBody(BodyChunk),
    /// Trailers, or a message with no recognised payload. Answered with
    /// [`OutboundMessage::Empty`].
    Unrecognized,
}

impl InboundMessage {
    /// Short name of the variant, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundMessage::RequestHeaders => "request_headers",
            InboundMessage::RequestBody(_) => "request_body",
            InboundMessage::ResponseHeaders => "response_headers",
            InboundMessage::ResponseBody(_) => "response_body",
            InboundMessage::Unrecognized => "unrecognized",
        }
    }
}

/// A message sent back to the proxy; exactly one per [`InboundMessage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// Continue with request headers unmodified.
    RequestHeaders,
    /// Continue with the request body unmodified.
    RequestBody,
    /// Continue with response headers unmodified.
    ResponseHeaders,
    /// Continue with the response body unmodified.
    ResponseBody,
    /// Answer the original caller directly; the upstream is skipped.
    Immediate { status: u16, body: Vec<u8> },
    /// Inert answer to an unrecognised message.
    Empty,
}

impl OutboundMessage {
    /// Whether this message short-circuits the exchange.
    pub fn is_immediate(&self) -> bool {
        matches!(self, OutboundMessage::Immediate { .. })
    }
}
