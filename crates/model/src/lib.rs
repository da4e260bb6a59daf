//! Shared vocabulary for a chat session and the services it talks to.
//!
//! This crate establishes the protocol between the session engine and a
//! remote chat service, so that the engine can switch between transports
//! (HTTP, in-process fakes, etc.) without modifying the core codebase.
//!
//! Types in this crate don't define any session behavior, instead they are
//! the constraints that transport implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod request;
mod response;
mod transport;

pub use error::*;
pub use request::*;
pub use response::*;
pub use transport::*;
