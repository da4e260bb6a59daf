use std::ops::Index;
use std::slice;

use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Messages from the client itself, such as greetings and error notes.
    System,
    /// The human side of the dialogue.
    User,
    /// The remote chat service.
    Assistant,
}

/// One role-tagged message in the dialogue.
///
/// Turns are immutable once built. The content is opaque text, it may
/// carry markup or an embedded file payload, and is never parsed here.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    /// Creates a turn with the given role.
    #[inline]
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a `system` turn.
    #[inline]
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::new(Role::System, content)
    }

    /// Creates a `user` turn.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an `assistant` turn.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Returns the role of this turn.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the content of this turn.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// An ordered sequence of turns.
///
/// The order is the dialogue history, and it is sent verbatim to the chat
/// service on every request.
#[derive(Clone, Default, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Creates an empty transcript.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the turns as a slice.
    #[inline]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Returns the number of turns.
    #[inline]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` if there are no turns.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Returns the turn at `idx`, if any.
    #[inline]
    pub fn get(&self, idx: usize) -> Option<&Turn> {
        self.turns.get(idx)
    }

    /// Returns the most recent turn, if any.
    #[inline]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Iterates over all turns in order.
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    /// Iterates over the turns a person would see in a chat window, which
    /// excludes `system` turns.
    pub fn visible_turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(|t| t.role != Role::System)
    }

    /// Returns `true` if the transcript only holds the initial greeting.
    pub fn is_greeting_only(&self) -> bool {
        matches!(self.turns.as_slice(), [turn] if turn.role == Role::System)
    }

    /// Appends a turn at the end.
    #[inline]
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }
}

impl From<Vec<Turn>> for Transcript {
    #[inline]
    fn from(turns: Vec<Turn>) -> Self {
        Self { turns }
    }
}

impl FromIterator<Turn> for Transcript {
    fn from_iter<I: IntoIterator<Item = Turn>>(iter: I) -> Self {
        Self {
            turns: iter.into_iter().collect(),
        }
    }
}

impl Index<usize> for Transcript {
    type Output = Turn;

    #[inline]
    fn index(&self, idx: usize) -> &Turn {
        &self.turns[idx]
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = slice::Iter<'a, Turn>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

/// The default model identifier sent with every request.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// The default user identity sent with every request.
pub const DEFAULT_USER_ID: &str = "default-user";

/// Fixed per-session settings that accompany every request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Target model identifier.
    pub model: String,
    /// The identity of the user talking to the service.
    pub user_id: String,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_owned(),
            user_id: DEFAULT_USER_ID.to_owned(),
        }
    }
}

/// A request to be sent through a transport.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChatRequest {
    /// The full history, exactly as it stood right after the user's turn
    /// was appended.
    pub transcript: Transcript,
    /// Request settings.
    pub config: RequestConfig,
}
