//! Wire codec for the installer machine dialog.
//!
//! The installer writes newline-delimited requests (`***Q:STRING name`,
//! `***D:MULTI-STRING name boundary`, ...) interleaved with `#` note lines;
//! the front-end answers with bare reply lines (`VALUE name=int:3`,
//! `CONFIRM name=yes`, ...). [`decode`] turns requests into [`Event`]s and
//! [`encode`] turns an answered event back into reply lines.

mod decode;
mod encode;
mod error;
mod message;
mod value;
pub mod wire;

pub use decode::decode;
pub use encode::{encode, encode_command};
pub use error::{DecodeError, EncodeError};
pub use message::{
    Confirm, DisplayMultiString, DisplayValue, Event, EventKind, Log, QueryMultiString,
    QueryString, QueryValue, Severity,
};
pub use value::{Value, ValueType};
pub use wire::Command;
