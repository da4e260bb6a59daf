use std::pin::Pin;
use std::sync::Arc;

use parley_model::{ChatReply, ChatRequest, Transport, TransportError};
use tracing::Instrument;

type SendResult = Result<ChatReply, Box<dyn TransportError>>;
type BoxedSendFuture = Pin<Box<dyn Future<Output = SendResult> + Send>>;
type HandlerFn = Arc<dyn Fn(ChatRequest) -> BoxedSendFuture + Send + Sync>;

/// A wrapper around a transport that provides a type-erased interface for
/// the other modules.
#[derive(Clone)]
pub struct TransportClient {
    handler_fn: HandlerFn,
}

impl TransportClient {
    #[inline]
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        // We have to erase the type `T`, since the controller doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req: ChatRequest| {
            let fut = transport.send(&req);
            let turns = req.transcript.len();
            let fut: BoxedSendFuture = Box::pin(
                async move {
                    trace!("sending {turns} turns");
                    match fut.await {
                        Ok(reply) => {
                            trace!("got a reply");
                            Ok(reply)
                        }
                        Err(err) => {
                            error!(kind = ?err.kind(), "got an error: {err}");
                            Err(Box::new(err) as Box<dyn TransportError>)
                        }
                    }
                }
                .instrument(trace_span!("transport client req")),
            );
            fut
        });
        Self { handler_fn }
    }

    /// Sends a request and returns the reply.
    ///
    /// The transport is invoked when this method is called, not when the
    /// returned future is first polled.
    #[inline]
    pub fn send(
        &self,
        req: ChatRequest,
    ) -> impl Future<Output = SendResult> + Send + 'static {
        (self.handler_fn)(req)
    }
}
