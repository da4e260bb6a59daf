mod builder;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::panic;
use std::path::Path;
use std::sync::Arc;

use parley_model::{
    ChatReply, ChatRequest, ErrorKind, RequestConfig, TransportError, Turn,
};

use crate::error::Error;
use crate::store::SessionStore;
use crate::transport_client::TransportClient;
use crate::upload::{FileEncoder, file_turn_content};
pub use builder::SessionControllerBuilder;

/// The content of the `system` turn appended when a turn fails.
pub const ERROR_MESSAGE: &str =
    "Sorry, there was an error processing your message.";

/// The greeting seeded into an empty session.
pub const DEFAULT_GREETING: &str = "\
Hello, I'm Alfred, your AI assistant. I can assist you with:
- Retrieving Terminal Aerodrome Forecast (TAF) data for airports like KJFK and KDCA
- Accessing METAR data for locations such as KJFK, KNYL, and KNJK
- Uploading documents for detailed analysis and insights
- And much more...
How may I assist you today?";

/// Runs conversational turns against a transport.
///
/// The controller does not prevent overlapping turns. Each turn appends its
/// user message and takes the resulting transcript in one store operation,
/// so user turns keep the order in which [`submit_turn`] was called, while
/// replies are appended in the order they arrive.
///
/// Clones share the same store and transport.
///
/// [`submit_turn`]: SessionController::submit_turn
#[derive(Clone)]
pub struct SessionController {
    store: SessionStore,
    client: TransportClient,
    config: Arc<RequestConfig>,
    greeting: Arc<str>,
}

impl SessionController {
    /// Returns the store this controller writes to.
    #[inline]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Returns the settings sent with every request.
    #[inline]
    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    /// Seeds the configured greeting if the session has never been seeded
    /// and is still empty. Returns whether it fired.
    #[inline]
    pub fn seed_greeting(&self) -> bool {
        self.store.seed_greeting(&*self.greeting)
    }

    /// Submits one turn.
    ///
    /// Blank input (empty after trimming) is ignored: nothing is appended,
    /// the transport is not called, and the future resolves to `Ok(None)`.
    ///
    /// Otherwise the user turn is appended and the transport is invoked
    /// right away, before the returned future is first polled. The rest of
    /// the turn runs on its own task, so it completes even if the returned
    /// future is dropped. Must be called within a tokio runtime.
    ///
    /// The future resolves to the appended `assistant` turn. On failure a
    /// `system` turn with [`ERROR_MESSAGE`] is appended instead and the
    /// original error is returned; the turn is not retried. The busy flag
    /// stays set until the transport settles.
    pub fn submit_turn<S: Into<String>>(
        &self,
        text: S,
    ) -> impl Future<Output = Result<Option<Turn>, Box<dyn TransportError>>>
    + Send
    + 'static {
        let text = text.into();
        let task = if text.trim().is_empty() {
            trace!("ignored blank input");
            None
        } else {
            let transcript = self.store.append(Turn::user(text));
            self.store.set_busy(true);
            let guard = BusyGuard(self.store.clone());
            let request = ChatRequest {
                transcript,
                config: (*self.config).clone(),
            };
            let reply_fut = self.client.send(request);
            Some(tokio::spawn(finish_turn(reply_fut, guard)))
        };

        async move {
            let Some(task) = task else {
                return Ok(None);
            };
            match task.await {
                Ok(result) => result.map(Some),
                Err(err) if err.is_panic() => {
                    panic::resume_unwind(err.into_panic())
                }
                Err(_) => Err(Box::new(Interrupted) as Box<dyn TransportError>),
            }
        }
    }

    /// Uploads a file as a user turn.
    ///
    /// The file is encoded first. If encoding fails, an `Encoding` error is
    /// returned and the transcript is left untouched. Otherwise the encoded
    /// file is submitted like any other turn, and a transport failure is
    /// returned as a `Transport` error (the `system` error turn is still
    /// appended).
    pub async fn upload_file<E: FileEncoder>(
        &self,
        encoder: &E,
        path: impl AsRef<Path>,
    ) -> Result<Option<Turn>, Error> {
        let path = path.as_ref();
        let file = match encoder.encode(path).await {
            Ok(file) => file,
            Err(err) => {
                error!("failed to encode {}: {err}", path.display());
                return Err(Error::encoding(err));
            }
        };
        debug!("encoded {} ({} bytes)", file.name, file.encoding.len());
        self.submit_turn(file_turn_content(&file))
            .await
            .map_err(Error::transport)
    }
}

/// Waits for the reply and appends the turn that settles it.
async fn finish_turn(
    reply_fut: impl Future<Output = Result<ChatReply, Box<dyn TransportError>>>,
    guard: BusyGuard,
) -> Result<Turn, Box<dyn TransportError>> {
    let store = &guard.0;
    match reply_fut.await {
        Ok(reply) => {
            let turn = Turn::assistant(reply.reply_text);
            store.append(turn.clone());
            debug!("turn completed");
            Ok(turn)
        }
        Err(err) => {
            warn!("turn failed: {err}");
            store.append(Turn::system(ERROR_MESSAGE));
            Err(err)
        }
    }
}

/// Clears the busy flag when the turn ends, however it ends.
struct BusyGuard(SessionStore);

impl Drop for BusyGuard {
    #[inline]
    fn drop(&mut self) {
        self.0.set_busy(false);
    }
}

/// The turn's task was cancelled, which only happens when the runtime
/// shuts down.
#[derive(Debug)]
struct Interrupted;

impl Display for Interrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "the turn was interrupted")
    }
}

impl StdError for Interrupted {}

impl TransportError for Interrupted {
    #[inline]
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}
