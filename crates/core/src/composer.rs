/// Whether speech fragments are currently accepted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ListenState {
    /// Fragments are dropped.
    #[default]
    Idle,
    /// Fragments are appended to the draft.
    Listening,
}

/// Owns the not-yet-submitted input and merges typed text with speech.
///
/// Speech never replaces the draft, it is appended to it, so text typed
/// before dictation survives. Fragments that arrive while idle are dropped
/// for good; nothing is queued or replayed on the next start.
#[derive(Clone, Debug, Default)]
pub struct DraftComposer {
    draft: String,
    state: ListenState,
}

impl DraftComposer {
    /// Creates an empty, idle composer.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current draft.
    #[inline]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Replaces the draft verbatim.
    #[inline]
    pub fn set_draft<S: Into<String>>(&mut self, text: S) {
        self.draft = text.into();
    }

    /// Returns the listening state.
    #[inline]
    pub fn listen_state(&self) -> ListenState {
        self.state
    }

    /// Returns `true` while listening.
    #[inline]
    pub fn is_listening(&self) -> bool {
        self.state == ListenState::Listening
    }

    /// Starts accepting speech fragments.
    pub fn start_listening(&mut self) {
        if self.state != ListenState::Listening {
            debug!("start listening");
            self.state = ListenState::Listening;
        }
    }

    /// Stops accepting speech fragments.
    pub fn stop_listening(&mut self) {
        if self.state != ListenState::Idle {
            debug!("stop listening");
            self.state = ListenState::Idle;
        }
    }

    /// Applies a speech fragment. Returns whether it was applied.
    pub fn on_speech_fragment(&mut self, fragment: &str) -> bool {
        if self.state != ListenState::Listening {
            trace!("drop late fragment");
            return false;
        }
        self.draft.push(' ');
        self.draft.push_str(fragment);
        true
    }

    /// Clears the draft and returns its prior value.
    #[inline]
    pub fn consume_draft(&mut self) -> String {
        std::mem::take(&mut self.draft)
    }
}
