//! An out-of-the-box chat session that assembles the session engine, an
//! HTTP transport, and a file encoder.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library to bring a chat session into your own host apps.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod encoders;
mod session;

pub use session::{Session, SessionBuilder};

/// Re-exports of [`parley_core`] crate.
pub mod core {
    pub use parley_core::*;
}
