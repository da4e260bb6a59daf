//! A transport for chat services speaking JSON over HTTP.
//!
//! Each turn is one `POST {base_url}/api/chat` carrying the whole transcript
//! and the request settings. The service answers with
//! `{"response": "..."}`, or with an unsuccessful status and an optional
//! `{"detail": "..."}` body.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mime::Mime;
use parley_model::{
    ChatReply, ChatRequest, ErrorKind, Transport, TransportError,
};
use reqwest::{Client, header};

pub use config::{
    DEFAULT_BASE_URL, HttpTransportConfig, HttpTransportConfigBuilder,
};
use proto::ChatResponseBody;

/// Error type for [`HttpTransport`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_decode() {
            ErrorKind::MalformedResponse
        } else {
            ErrorKind::Network
        };
        Self::new(format!("{err}"), kind)
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl TransportError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// JSON-over-HTTP transport.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    config: Arc<HttpTransportConfig>,
}

impl HttpTransport {
    /// Creates a new `HttpTransport` with the given configuration.
    #[inline]
    pub fn new(config: HttpTransportConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl Transport for HttpTransport {
    type Error = Error;

    fn send(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatReply, Self::Error>> + Send + 'static
    {
        let body = proto::create_request(req);
        let mut builder = self
            .client
            .post(self.config.endpoint())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .json(&body);
        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }
        let resp_fut = builder.send();

        async move {
            let resp = resp_fut.await.map_err(Error::from_reqwest)?;
            let status = resp.status();
            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned);
            let body = resp.bytes().await.map_err(Error::from_reqwest)?;
            trace!("got {status} with {} bytes", body.len());

            if !status.is_success() {
                let message = proto::error_message(status.as_u16(), &body);
                return Err(Error::new(message, ErrorKind::Status));
            }

            let is_json = content_type
                .as_deref()
                .map(|v| {
                    v.parse::<Mime>()
                        .map(|m| {
                            m.subtype() == mime::JSON
                                || m.suffix() == Some(mime::JSON)
                        })
                        .unwrap_or(false)
                })
                // Lenient servers may omit the header entirely.
                .unwrap_or(true);
            if !is_json {
                return Err(Error::new(
                    format!("Unexpected content type: {content_type:?}"),
                    ErrorKind::MalformedResponse,
                ));
            }

            // Here we got a successful response.
            let reply = serde_json::from_slice::<ChatResponseBody>(&body)
                .map_err(|err| {
                    Error::new(format!("{err}"), ErrorKind::MalformedResponse)
                })?;
            Ok(ChatReply::new(reply.response))
        }
    }
}
