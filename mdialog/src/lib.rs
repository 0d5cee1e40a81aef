//! Front-end driver for the installer machine dialog.
//!
//! `mdialog` talks to an installer running its machine dialect over a pair
//! of byte streams: it decodes the installer's requests into typed
//! [`Event`]s, encodes replies, and wraps the command prompt (`env-get`,
//! `env-query`, `log`, `install`, ...) in blocking helpers.
//!
//! # Quick start
//!
//! ```no_run
//! use std::process::{Command, Stdio};
//!
//! use mdialog::{Event, Session};
//!
//! let mut child = Command::new("installer")
//!     .arg("DIALOG/dialect=str:machine")
//!     .stdin(Stdio::piped())
//!     .stdout(Stdio::piped())
//!     .spawn()?;
//! let mut session = Session::new(child.stdout.take().unwrap(), child.stdin.take().unwrap());
//!
//! loop {
//!     match session.next_event()? {
//!         Event::QueryString(_) => {
//!             let version = session.environment_get("INFO/PACKAGE_VERSION")?;
//!             println!("{version}");
//!             session.quit()?;
//!         }
//!         Event::Terminate => break,
//!         _ => {}
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod env;
mod error;
mod session;

pub use env::EnvValue;
pub use error::{Error, Result};
pub use mdialog_proto::{
    Confirm, DecodeError, DisplayMultiString, DisplayValue, EncodeError, Event, EventKind, Log,
    QueryMultiString, QueryString, QueryValue, Severity, Value, ValueType,
};
pub use session::{Session, SessionBuilder};
