//! ext_proc gRPC service implementation.
//!
//! Every `Process` stream is driven by its own spawned task, so streams
//! run in parallel on the multi-thread runtime. Within a stream, inbound
//! messages are handled one at a time and each answer is sent before the
//! next message is read, which keeps outbound order equal to inbound order.
//!
//! Answers flow through a bounded channel backing the response stream. If
//! the peer goes away while a message is being handled (for example during
//! a slow embedding call), the channel closes and the in-flight work is
//! dropped.

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, info, warn};

use super::proto::ext_proc::external_processor_server::{
    ExternalProcessor, ExternalProcessorServer,
};
use super::proto::ext_proc::{ProcessingRequest, ProcessingResponse};
use crate::processor::{Processor, Session};
use crate::telemetry;
use crate::types::InboundMessage;

/// Default number of answers buffered per stream.
pub const DEFAULT_STREAM_BUFFER: usize = 16;

/// Sending half of a stream's answers.
pub type ResponseSender = mpsc::Sender<Result<ProcessingResponse, Status>>;

/// gRPC service that runs a [`Session`] per ext_proc stream.
pub struct ExtProcService {
    processor: Processor,
    buffer: usize,
}

impl ExtProcService {
    /// Create a new service sharing the given processor's caches.
    pub fn new(processor: Processor) -> Self {
        Self {
            processor,
            buffer: DEFAULT_STREAM_BUFFER,
        }
    }

    /// Set the per-stream answer buffer (minimum 1).
    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }

    /// Wrap in the generated tonic server type.
    pub fn into_server(self) -> ExternalProcessorServer<Self> {
        ExternalProcessorServer::new(self)
    }
}

#[tonic::async_trait]
impl ExternalProcessor for ExtProcService {
    type ProcessStream = ReceiverStream<Result<ProcessingResponse, Status>>;

    async fn process(
        &self,
        request: Request<Streaming<ProcessingRequest>>,
    ) -> Result<Response<Self::ProcessStream>, Status> {
        let inbound = request.into_inner();
        let (tx, rx) = mpsc::channel(self.buffer);

        tokio::spawn(drive(self.processor.session(), inbound, tx));

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

/// Run one session over an inbound stream until it ends.
///
/// - clean end of input ends the session normally
/// - a receive error is answered with `Status::unknown` and ends the session
/// - a closed outbound channel ends the session, cancelling in-flight work
pub async fn drive<S>(mut session: Session, mut inbound: S, outbound: ResponseSender)
where
    S: Stream<Item = Result<ProcessingRequest, Status>> + Unpin,
{
    let _active = ActiveSession::enter();
    info!("processing stream started");

    while let Some(next) = inbound.next().await {
        let request = match next {
            Ok(request) => request,
            Err(status) => {
                warn!(error = %status, "receive failed, aborting stream");
                // The peer may already be gone; nothing else to do either way.
                let _ = outbound
                    .send(Err(Status::unknown(format!("recv error: {status}"))))
                    .await;
                return;
            }
        };

        let message = InboundMessage::from(request);
        debug!(kind = message.kind(), "handling message");

        let answer = tokio::select! {
            biased;
            _ = outbound.closed() => {
                debug!("peer closed the stream mid-message");
                return;
            }
            answer = session.handle(message) => answer,
        };

        if outbound.send(Ok(answer.into())).await.is_err() {
            debug!("peer closed the stream");
            return;
        }
    }

    info!("processing stream finished");
}

/// Tracks the active-session gauge for the lifetime of a stream task.
struct ActiveSession;

impl ActiveSession {
    fn enter() -> Self {
        metrics::gauge!(telemetry::SESSIONS_ACTIVE).increment(1.0);
        ActiveSession
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        metrics::gauge!(telemetry::SESSIONS_ACTIVE).decrement(1.0);
    }
}
