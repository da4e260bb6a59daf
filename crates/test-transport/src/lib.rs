//! A local fake transport for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};

use parley_model::{
    ChatReply, ChatRequest, ErrorKind, Transport, TransportError,
};
use tokio::time::sleep;

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

impl StdError for Error {}

impl TransportError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Default)]
struct Shared {
    script: VecDeque<PresetReply>,
    requests: Vec<ChatRequest>,
}

/// A local fake transport for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// transport should answer. Each request takes the next step of the script
/// at the moment [`Transport::send`] is called, so steps are matched to
/// requests in call order even when their replies are delayed differently.
/// If there are no steps left, an error will be returned.
///
/// Clones share the same script and request log.
#[derive(Clone, Default)]
pub struct TestTransport {
    shared: Arc<Mutex<Shared>>,
}

impl TestTransport {
    #[inline]
    pub fn add_step(&self, preset: PresetReply) {
        self.lock().script.push_back(preset);
    }

    #[inline]
    pub fn add_reply<S: Into<String>>(&self, text: S) {
        self.add_step(PresetReply::reply(text));
    }

    #[inline]
    pub fn add_failure<S: Into<String>>(&self, message: S) {
        self.add_step(PresetReply::failure(message));
    }

    /// Returns every request received so far, in call order.
    #[inline]
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.lock().requests.clone()
    }

    #[inline]
    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        // A panicking test thread must not hide the script from the others.
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Transport for TestTransport {
    type Error = crate::Error;

    fn send(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatReply, Self::Error>> + Send + 'static
    {
        let step = {
            let mut shared = self.lock();
            shared.requests.push(req.clone());
            shared.script.pop_front()
        };

        async move {
            let Some(step) = step else {
                return Err(Error {
                    message: "no enough steps".to_owned(),
                    kind: ErrorKind::Other,
                });
            };
            if let Some(delay) = step.delay() {
                sleep(delay).await;
            }
            match step.outcome {
                PresetOutcome::Reply(text) => Ok(ChatReply::new(text)),
                PresetOutcome::Failure(message) => Err(Error {
                    message,
                    kind: ErrorKind::Status,
                }),
            }
        }
    }
}
