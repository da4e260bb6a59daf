//! Core logic of a chat session: the transcript store, the turn controller,
//! the draft composer, and the seams for speech and file input.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod composer;
mod controller;
mod error;
pub mod speech;
mod store;
mod transport_client;
pub mod upload;

pub use composer::{DraftComposer, ListenState};
pub use controller::{
    DEFAULT_GREETING, ERROR_MESSAGE, SessionController,
    SessionControllerBuilder,
};
pub use error::{Error, ErrorKind};
pub use store::{SessionState, SessionStore};
