//! Built-in file encoders.

mod data_url;

pub use data_url::{DataUrlEncoder, EncodeError, EncodeErrorKind};
