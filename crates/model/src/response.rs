use serde::{Deserialize, Serialize};

/// A reply from the chat service for one turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatReply {
    /// The assistant's text.
    pub reply_text: String,
}

impl ChatReply {
    /// Creates a reply with the given text.
    #[inline]
    pub fn new<S: Into<String>>(reply_text: S) -> Self {
        Self {
            reply_text: reply_text.into(),
        }
    }
}
