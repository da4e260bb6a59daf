use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use parley_model::{
    ChatReply, ChatRequest, ErrorKind, RequestConfig, Role, Transcript,
    Transport, TransportError, Turn,
};
use tokio::time::sleep;

#[derive(Debug)]
struct FakeTransportError(ErrorKind);

impl Display for FakeTransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for FakeTransportError {}

impl TransportError for FakeTransportError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Echoes the last user turn back after a tiny delay.
struct EchoTransport;

impl Transport for EchoTransport {
    type Error = FakeTransportError;

    fn send(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatReply, Self::Error>> + Send + 'static
    {
        let last_user = req
            .transcript
            .iter()
            .rev()
            .find(|t| t.role() == Role::User)
            .map(|t| t.content().to_owned());
        async move {
            sleep(Duration::from_millis(1)).await;
            match last_user {
                Some(text) => Ok(ChatReply::new(format!("You said {text}"))),
                None => Err(FakeTransportError(ErrorKind::MalformedResponse)),
            }
        }
    }
}

mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reply() {
        let transport = EchoTransport;
        let req = ChatRequest {
            transcript: Transcript::from(vec![
                Turn::system("Hello"),
                Turn::user("Good morning"),
            ]),
            config: RequestConfig::default(),
        };
        let reply = transport.send(&req).await.unwrap();
        assert_eq!(reply.reply_text, "You said Good morning");
    }

    #[tokio::test]
    async fn test_error() {
        let transport = EchoTransport;
        let req = ChatRequest {
            transcript: Transcript::new(),
            config: RequestConfig::default(),
        };
        let fut = transport.send(&req);
        // The future must outlive the request it was built from.
        drop(req);
        let err = fut.await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }
}
