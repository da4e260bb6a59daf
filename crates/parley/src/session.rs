use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use parley_core::speech::{SpeechSource, forward_speech};
use parley_core::{
    DraftComposer, Error, SessionController, SessionControllerBuilder,
    SessionState,
};
use parley_model::{RequestConfig, Transcript, Transport, TransportError, Turn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::encoders::DataUrlEncoder;

type TranscriptObserver = Box<dyn Fn(&Transcript) + Send + Sync>;
type BusyObserver = Box<dyn Fn(bool) + Send + Sync>;

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    controller_builder: SessionControllerBuilder,
    encoder: DataUrlEncoder,
    on_transcript: Option<TranscriptObserver>,
    on_busy: Option<BusyObserver>,
}

impl SessionBuilder {
    /// Creates a session builder with a specified transport.
    pub fn with_transport<T: Transport + 'static>(transport: T) -> Self {
        Self {
            controller_builder: SessionControllerBuilder::with_transport(
                transport,
            ),
            encoder: DataUrlEncoder::documents(),
            on_transcript: None,
            on_busy: None,
        }
    }

    /// Sets the model and user identity sent with every turn.
    #[inline]
    pub fn with_config(mut self, config: RequestConfig) -> Self {
        self.controller_builder = self.controller_builder.with_config(config);
        self
    }

    /// Sets the greeting seeded into an empty transcript.
    #[inline]
    pub fn with_greeting<S: Into<String>>(mut self, greeting: S) -> Self {
        self.controller_builder =
            self.controller_builder.with_greeting(greeting);
        self
    }

    /// Replaces the encoder used by [`Session::upload_file`]. Defaults to
    /// [`DataUrlEncoder::documents`].
    #[inline]
    pub fn with_encoder(mut self, encoder: DataUrlEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Attaches a callback to be invoked when the transcript changes.
    ///
    /// Rapid changes may be coalesced into one call with the latest
    /// transcript.
    #[inline]
    pub fn on_transcript(
        mut self,
        on_transcript: impl Fn(&Transcript) + Send + Sync + 'static,
    ) -> Self {
        self.on_transcript = Some(Box::new(on_transcript));
        self
    }

    /// Attaches a callback to be invoked when the busy flag flips.
    #[inline]
    pub fn on_busy(
        mut self,
        on_busy: impl Fn(bool) + Send + Sync + 'static,
    ) -> Self {
        self.on_busy = Some(Box::new(on_busy));
        self
    }

    /// Builds a new session.
    ///
    /// Must be called within a tokio runtime if any callback is attached.
    pub fn build(self) -> Session {
        let controller = self.controller_builder.build();

        let observer_task = if self.on_transcript.is_some()
            || self.on_busy.is_some()
        {
            let rx = controller.store().subscribe();
            Some(tokio::spawn(observe_state(
                rx,
                self.on_transcript,
                self.on_busy,
            )))
        } else {
            None
        };

        Session {
            controller,
            composer: Arc::new(Mutex::new(DraftComposer::new())),
            encoder: self.encoder,
            speech: Mutex::new(None),
            observer_task,
        }
    }
}

struct AttachedSpeech {
    source: Arc<dyn SpeechSource>,
    task: JoinHandle<()>,
}

/// A chat session, like a window that displays messages and has an input
/// box.
///
/// The session ties a [`SessionController`] to a shared draft and the
/// optional input sources feeding it.
pub struct Session {
    controller: SessionController,
    composer: Arc<Mutex<DraftComposer>>,
    encoder: DataUrlEncoder,
    speech: Mutex<Option<AttachedSpeech>>,
    observer_task: Option<JoinHandle<()>>,
}

impl Session {
    /// Returns the underlying controller.
    #[inline]
    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Locks and returns the draft composer.
    #[inline]
    pub fn composer(&self) -> MutexGuard<'_, DraftComposer> {
        self.composer.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the current transcript.
    #[inline]
    pub fn transcript(&self) -> Transcript {
        self.controller.store().transcript()
    }

    /// Returns whether a turn is awaiting its reply.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.controller.store().is_busy()
    }

    /// Seeds the greeting if the transcript is still empty.
    #[inline]
    pub fn seed_greeting(&self) -> bool {
        self.controller.seed_greeting()
    }

    /// Submits the current draft.
    ///
    /// A blank draft is left in place and nothing is sent. Otherwise the
    /// draft is consumed before the turn is submitted, so it is sent at
    /// most once. The turn completes even if the returned future is
    /// dropped.
    pub fn send_draft(
        &self,
    ) -> impl Future<Output = Result<Option<Turn>, Box<dyn TransportError>>>
    + Send
    + 'static {
        let text = {
            let mut composer = self.composer();
            if composer.draft().trim().is_empty() {
                String::new()
            } else {
                composer.consume_draft()
            }
        };
        self.controller.submit_turn(text)
    }

    /// Submits a message directly, bypassing the draft.
    #[inline]
    pub fn send_message<S: Into<String>>(
        &self,
        text: S,
    ) -> impl Future<Output = Result<Option<Turn>, Box<dyn TransportError>>>
    + Send
    + 'static {
        self.controller.submit_turn(text)
    }

    /// Encodes the file at `path` and submits it as a user turn.
    #[inline]
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<Option<Turn>, Error> {
        self.controller.upload_file(&self.encoder, path).await
    }

    /// Attaches a speech source whose transcripts are merged into the
    /// draft while listening. Replaces any source attached before.
    ///
    /// Must be called within a tokio runtime.
    pub fn attach_speech(&self, source: Arc<dyn SpeechSource>) {
        let task = tokio::spawn(forward_speech(
            Arc::clone(&self.composer),
            source.fragments(),
        ));
        let mut speech = self.speech.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = speech.replace(AttachedSpeech { source, task }) {
            previous.source.stop_listening();
            previous.task.abort();
        }
    }

    /// Starts listening, if a speech source is attached.
    pub fn start_listening(&self) -> bool {
        let speech = self.speech.lock().unwrap_or_else(|e| e.into_inner());
        let Some(speech) = speech.as_ref() else {
            return false;
        };
        self.composer().start_listening();
        speech.source.start_listening();
        true
    }

    /// Stops listening. Fragments arriving afterwards are ignored.
    pub fn stop_listening(&self) {
        self.composer().stop_listening();
        let speech = self.speech.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(speech) = speech.as_ref() {
            speech.source.stop_listening();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(task) = self.observer_task.take() {
            task.abort();
        }
        let speech = self.speech.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(speech) = speech.take() {
            speech.source.stop_listening();
            speech.task.abort();
        }
    }
}

async fn observe_state(
    mut rx: watch::Receiver<SessionState>,
    on_transcript: Option<TranscriptObserver>,
    on_busy: Option<BusyObserver>,
) {
    let mut last = rx.borrow_and_update().clone();
    while rx.changed().await.is_ok() {
        let state = rx.borrow_and_update().clone();
        if state.transcript() != last.transcript() {
            if let Some(on_transcript) = &on_transcript {
                on_transcript(state.transcript());
            }
        }
        if state.is_busy() != last.is_busy() {
            if let Some(on_busy) = &on_busy {
                on_busy(state.is_busy());
            }
        }
        last = state;
    }
    trace!("session store has been dropped");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use parley_core::{DEFAULT_GREETING, ERROR_MESSAGE};
    use parley_model::Role;
    use parley_test_transport::{PresetReply, TestTransport};
    use tokio::sync::mpsc;
    use tokio::task::yield_now;

    use super::*;

    #[derive(Default)]
    struct FakeSpeech {
        tx: Mutex<Option<mpsc::UnboundedSender<String>>>,
        listening: Mutex<bool>,
    }

    impl FakeSpeech {
        fn say(&self, text: &str) {
            if let Some(tx) = self.tx.lock().unwrap().as_ref() {
                tx.send(text.to_owned()).ok();
            }
        }
    }

    impl SpeechSource for FakeSpeech {
        fn start_listening(&self) {
            *self.listening.lock().unwrap() = true;
        }

        fn stop_listening(&self) {
            *self.listening.lock().unwrap() = false;
        }

        fn fragments(&self) -> mpsc::UnboundedReceiver<String> {
            let (tx, rx) = mpsc::unbounded_channel();
            *self.tx.lock().unwrap() = Some(tx);
            rx
        }
    }

    async fn settle() {
        for _ in 0..4 {
            yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_send_draft() {
        let transport = TestTransport::default();
        transport.add_reply("METAR KJFK 121251Z 18010KT");
        let session = SessionBuilder::with_transport(transport.clone()).build();

        assert!(session.seed_greeting());
        session.composer().set_draft("Get METAR for KJFK");
        let turn = session.send_draft().await.unwrap().unwrap();
        assert_eq!(turn.content(), "METAR KJFK 121251Z 18010KT");
        assert_eq!(session.composer().draft(), "");

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[0].content(), DEFAULT_GREETING);
        assert_eq!(transcript[1].content(), "Get METAR for KJFK");
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_blank_draft_is_kept() {
        let transport = TestTransport::default();
        let session = SessionBuilder::with_transport(transport.clone()).build();

        session.composer().set_draft("   ");
        assert!(session.send_draft().await.unwrap().is_none());
        assert_eq!(session.composer().draft(), "   ");
        assert_eq!(transport.request_count(), 0);
        assert!(session.transcript().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_observers() {
        let transport = TestTransport::default();
        transport.add_step(
            PresetReply::failure("connection reset")
                .with_delay(Duration::from_secs(1)),
        );
        let transcript_calls = Arc::new(AtomicUsize::new(0));
        let busy_log = Arc::new(Mutex::new(Vec::new()));

        let session = SessionBuilder::with_transport(transport)
            .on_transcript({
                let transcript_calls = Arc::clone(&transcript_calls);
                move |_| {
                    transcript_calls.fetch_add(1, Ordering::SeqCst);
                }
            })
            .on_busy({
                let busy_log = Arc::clone(&busy_log);
                move |busy| busy_log.lock().unwrap().push(busy)
            })
            .build();
        settle().await;

        let fut = session.send_message("Get TAF for KLAX");
        settle().await;
        assert_eq!(*busy_log.lock().unwrap(), vec![true]);
        assert_eq!(transcript_calls.load(Ordering::SeqCst), 1);

        assert!(fut.await.is_err());
        settle().await;
        assert_eq!(*busy_log.lock().unwrap(), vec![true, false]);
        assert_eq!(transcript_calls.load(Ordering::SeqCst), 2);

        let last = session.transcript().last().cloned().unwrap();
        assert_eq!(last.role(), Role::System);
        assert_eq!(last.content(), ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_speech_into_draft() {
        let session =
            SessionBuilder::with_transport(TestTransport::default()).build();
        assert!(!session.start_listening());

        let speech = Arc::new(FakeSpeech::default());
        session.attach_speech(speech.clone());
        session.composer().set_draft("Hello");
        assert!(session.start_listening());
        assert!(*speech.listening.lock().unwrap());

        speech.say("big");
        speech.say("world");
        settle().await;
        assert_eq!(session.composer().draft(), "Hello big world");

        session.stop_listening();
        assert!(!*speech.listening.lock().unwrap());
        speech.say("ignored");
        settle().await;
        assert_eq!(session.composer().draft(), "Hello big world");
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_file() {
        let transport = TestTransport::default();
        let session = SessionBuilder::with_transport(transport.clone()).build();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.exe");
        std::fs::write(&path, "MZ").unwrap();

        let err = session.upload_file(&path).await.unwrap_err();
        assert_eq!(err.kind(), parley_core::ErrorKind::Encoding);
        assert!(session.transcript().is_empty());
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_file() {
        let transport = TestTransport::default();
        transport.add_reply("Got your winds table.");
        let session = SessionBuilder::with_transport(transport.clone()).build();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("winds.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();

        session.upload_file(&path).await.unwrap();
        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(
            transcript[0].content(),
            "File uploaded: winds.csv\nContent: data:text/csv;base64,YSxiCjEsMgo="
        );
        assert_eq!(transcript[1].content(), "Got your winds table.");
    }
}
