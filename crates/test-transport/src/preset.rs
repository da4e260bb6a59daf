use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How a scripted step ends.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetOutcome {
    #[serde(rename = "reply")]
    Reply(String),
    #[serde(rename = "failure")]
    Failure(String),
}

/// The preset outcome for one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetReply {
    /// What the transport answers with.
    pub outcome: PresetOutcome,
    /// If set, the transport waits this many milliseconds before answering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

impl PresetReply {
    /// Creates a `PresetReply` that succeeds with the given text.
    #[inline]
    pub fn reply<S: Into<String>>(text: S) -> Self {
        Self {
            outcome: PresetOutcome::Reply(text.into()),
            delay_ms: None,
        }
    }

    /// Creates a `PresetReply` that fails with the given message.
    #[inline]
    pub fn failure<S: Into<String>>(message: S) -> Self {
        Self {
            outcome: PresetOutcome::Failure(message.into()),
            delay_ms: None,
        }
    }

    /// Delays the outcome by `delay`.
    #[inline]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = Some(delay.as_millis() as u64);
        self
    }

    #[inline]
    pub(crate) fn delay(&self) -> Option<Duration> {
        self.delay_ms.map(Duration::from_millis)
    }
}
