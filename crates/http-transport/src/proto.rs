use parley_model::{ChatRequest, Role, Turn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ChatResponseBody {
    pub response: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ErrorBody {
    pub detail: Option<Value>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Message {
    role: Role,
    content: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Configurable {
    user_id: String,
    model: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ChatRequestBody {
    messages: Vec<Message>,
    configurable: Configurable,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(req: &ChatRequest) -> ChatRequestBody {
    ChatRequestBody {
        messages: req.transcript.iter().map(create_message).collect(),
        configurable: Configurable {
            user_id: req.config.user_id.clone(),
            model: req.config.model.clone(),
        },
    }
}

#[inline]
fn create_message(turn: &Turn) -> Message {
    Message {
        role: turn.role(),
        content: turn.content().to_owned(),
    }
}

/// Picks the most helpful message out of an unsuccessful response.
pub fn error_message(status: u16, body: &[u8]) -> String {
    let detail = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.detail);
    match detail {
        Some(Value::String(detail)) if !detail.is_empty() => detail,
        // Validation failures carry structured details.
        Some(detail @ (Value::Array(_) | Value::Object(_))) => detail.to_string(),
        _ => format!("HTTP error! status: {status}"),
    }
}
