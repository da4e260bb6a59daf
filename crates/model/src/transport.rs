use std::error::Error;

use crate::error::ErrorKind;
use crate::request::ChatRequest;
use crate::response::ChatReply;

/// The error type for a transport.
pub trait TransportError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that carries one turn's request to the chat service and brings
/// back its reply.
///
/// Once the transport is created, it should behave like a stateless object.
/// It can still have internal state, but callers should not rely on it,
/// and the transport should be prepared for being dropped anytime.
///
/// Implementations must fail with a descriptive error when the service
/// answers with an unsuccessful status or when the reply cannot be parsed.
/// Timeouts, if any, are also reported through the error.
pub trait Transport: Send + Sync {
    /// The error type that may be returned by the transport.
    type Error: TransportError;

    /// Sends a request to the chat service.
    ///
    /// The returned future must not borrow from `self` or `req`.
    fn send(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatReply, Self::Error>> + Send + 'static;
}
