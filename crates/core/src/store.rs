use std::sync::Arc;

use parley_model::{Transcript, Turn};
use tokio::sync::watch;

/// A snapshot of the session, as seen by observers.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct SessionState {
    transcript: Transcript,
    busy: bool,
    seeded: bool,
}

impl SessionState {
    /// Returns the transcript.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns `true` if a turn is awaiting its reply.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.busy
    }
}

/// The single source of truth for the transcript and the busy flag.
///
/// Every mutation runs as one critical section that also notifies the
/// observers, so no two appends can interleave their read-modify-write.
/// Clones are handles to the same store.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<watch::Sender<SessionState>>,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            state: Arc::new(state),
        }
    }

    /// Appends `turn` at the end and returns the full updated transcript.
    ///
    /// The returned transcript is captured inside the same critical section
    /// as the push, so it is exactly the sequence that existed right after
    /// this append.
    pub fn append(&self, turn: Turn) -> Transcript {
        let mut updated = Transcript::new();
        self.state.send_modify(|state| {
            trace!(role = ?turn.role(), "append turn #{}", state.transcript.len());
            state.transcript.push(turn);
            updated = state.transcript.clone();
        });
        updated
    }

    /// Replaces the whole transcript, used for bulk loads.
    ///
    /// Does nothing and returns `false` if the current transcript is not
    /// empty. A successful replacement also counts as the session's seed.
    pub fn replace(&self, transcript: Transcript) -> bool {
        self.state.send_if_modified(|state| {
            if !state.transcript.is_empty() || transcript.is_empty() {
                return false;
            }
            debug!("replace transcript with {} turns", transcript.len());
            state.transcript = transcript;
            state.seeded = true;
            true
        })
    }

    /// Seeds the initial `system` greeting.
    ///
    /// The greeting fires at most once per store, and only when the
    /// transcript is empty at the moment of the call. Returns whether it
    /// fired.
    pub fn seed_greeting<S: Into<String>>(&self, greeting: S) -> bool {
        let greeting = greeting.into();
        self.state.send_if_modified(|state| {
            if state.seeded || !state.transcript.is_empty() {
                return false;
            }
            debug!("seed greeting");
            state.seeded = true;
            state.transcript.push(Turn::system(greeting));
            true
        })
    }

    /// Sets the busy flag. Observers are only notified on actual changes.
    pub fn set_busy(&self, busy: bool) {
        self.state.send_if_modified(|state| {
            if state.busy == busy {
                return false;
            }
            state.busy = busy;
            true
        });
    }

    /// Returns a copy of the current transcript.
    #[inline]
    pub fn transcript(&self) -> Transcript {
        self.state.borrow().transcript.clone()
    }

    /// Returns `true` if a turn is awaiting its reply.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.state.borrow().busy
    }

    /// Returns a copy of the current state.
    #[inline]
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Subscribes to state changes.
    #[inline]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

impl Default for SessionStore {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use parley_model::Role;

    use super::*;

    #[test]
    fn test_append_returns_updated_transcript() {
        let store = SessionStore::new();
        let first = store.append(Turn::user("Hi"));
        assert_eq!(first.len(), 1);

        let second = store.append(Turn::assistant("Hello"));
        assert_eq!(second.len(), 2);
        assert_eq!(second[0], Turn::user("Hi"));
        assert_eq!(second[1], Turn::assistant("Hello"));
        assert_eq!(store.transcript(), second);
        // Earlier results are values, not views.
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_seed_greeting_once() {
        let store = SessionStore::new();
        assert!(store.seed_greeting("Hello"));
        assert!(!store.seed_greeting("Hello"));
        assert_eq!(store.transcript().len(), 1);
        assert!(store.transcript().is_greeting_only());
    }

    #[test]
    fn test_reentrant_seeding() {
        let store = SessionStore::new();
        let fired: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| store.seed_greeting("Hello")))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(fired.iter().filter(|f| **f).count(), 1);
        assert_eq!(store.transcript().len(), 1);

        // Replacing with nothing is not a seed.
        let store = SessionStore::new();
        assert!(!store.replace(Transcript::new()));
        assert!(store.seed_greeting("Hi"));
    }

    #[test]
    fn test_seed_skipped_when_not_empty() {
        let store = SessionStore::new();
        store.append(Turn::user("Hi"));
        assert!(!store.seed_greeting("Hello"));
        assert_eq!(store.transcript()[0].role(), Role::User);
    }

    #[test]
    fn test_replace() {
        let store = SessionStore::new();
        let saved =
            Transcript::from(vec![Turn::user("Hi"), Turn::assistant("Hey")]);
        assert!(store.replace(saved.clone()));
        assert_eq!(store.transcript(), saved);

        assert!(!store.replace(Transcript::from(vec![Turn::user("Other")])));
        assert_eq!(store.transcript(), saved);
        assert!(!store.seed_greeting("Hello"));
    }

    #[test]
    fn test_observers() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        store.set_busy(false);
        assert!(!rx.has_changed().unwrap());

        store.set_busy(true);
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_busy());

        store.append(Turn::user("Hi"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().transcript().len(), 1);

        store.replace(Transcript::from(vec![Turn::user("ignored")]));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_concurrent_appends() {
        let store = SessionStore::new();
        thread::scope(|s| {
            for t in 0..4 {
                let store = store.clone();
                s.spawn(move || {
                    for i in 0..50 {
                        let updated = store.append(Turn::user(format!("{t}:{i}")));
                        assert_eq!(
                            updated.last().unwrap().content(),
                            format!("{t}:{i}")
                        );
                    }
                });
            }
        });

        let transcript = store.transcript();
        assert_eq!(transcript.len(), 200);
        for t in 0..4 {
            let own: Vec<_> = transcript
                .iter()
                .filter(|turn| turn.content().starts_with(&format!("{t}:")))
                .map(|turn| turn.content().to_owned())
                .collect();
            let expected: Vec<_> = (0..50).map(|i| format!("{t}:{i}")).collect();
            assert_eq!(own, expected);
        }
    }
}
