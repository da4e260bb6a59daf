//! Speech input supports.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::composer::DraftComposer;

/// A speech recognizer that emits incremental transcripts while listening.
///
/// There is no contract on latency or finality granularity: every value
/// sent on the channel returned by [`SpeechSource::fragments`] is treated as
/// a new fragment, and none of them is dropped.
pub trait SpeechSource: Send + Sync {
    /// Starts recognizing speech.
    fn start_listening(&self);

    /// Stops recognizing speech. The source may still publish a final value
    /// afterwards.
    fn stop_listening(&self);

    /// Returns a receiver of recognized fragments, in the order they were
    /// recognized.
    fn fragments(&self) -> mpsc::UnboundedReceiver<String>;
}

/// Feeds every fragment into the shared composer until the source goes
/// away.
///
/// Empty values are skipped, since sources publish them when they reset.
/// Whether a fragment is applied is decided by the composer's own listening
/// state at the moment it arrives.
pub async fn forward_speech(
    composer: Arc<Mutex<DraftComposer>>,
    mut fragments: mpsc::UnboundedReceiver<String>,
) {
    trace!("start forwarding speech");
    while let Some(fragment) = fragments.recv().await {
        if fragment.is_empty() {
            continue;
        }
        let mut composer = composer.lock().unwrap_or_else(|e| e.into_inner());
        composer.on_speech_fragment(&fragment);
    }
    trace!("speech source has been dropped");
}
