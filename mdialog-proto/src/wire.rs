//! Line markers and tokens of the machine dialect.

use std::fmt;

/// Prefix of informational lines; ignored on input.
pub const NOTE_PREFIX: &str = "#";
/// Prefix of request lines.
pub const REQUEST_PREFIX: &str = "***";

/// Prefix shared by all log severities.
pub const LOG_PREFIX: &str = "L:";

/// `Q:STRING <name>`.
pub const QUERY_STRING: &str = "Q:STRING";
/// `Q:MULTI-STRING <name> <boundary> <abortboundary>`.
pub const QUERY_MULTI_STRING: &str = "Q:MULTI-STRING";
/// `Q:VALUE <name>`.
pub const QUERY_VALUE: &str = "Q:VALUE";
/// `D:VALUE <name>=<type>:<value>`.
pub const DISPLAY_VALUE: &str = "D:VALUE";
/// `D:MULTI-STRING <name> <boundary>`.
pub const DISPLAY_MULTI_STRING: &str = "D:MULTI-STRING";
/// `CONFIRM <what> <description>`.
pub const CONFIRM: &str = "CONFIRM";
/// End of dialog.
pub const TERMINATE: &str = "TERMINATE";

/// Reply opcode carrying a typed value.
pub const RESPONSE_VALUE: &str = "VALUE";
/// Reply opcode for a confirmation.
pub const RESPONSE_CONFIRM: &str = "CONFIRM";
/// Reply opcode aborting a value prompt or confirmation.
pub const RESPONSE_ABORT: &str = "ABORT";

/// Command sent to the installer's command prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Command<'a> {
    /// `env-get -k <name>`: display an environment entry.
    EnvGet(&'a str),
    /// `env-query -k <name>`: prompt for a scalar environment entry.
    EnvQuery(&'a str),
    /// `env-query-multi -k <name>`: prompt for a multi-line environment entry.
    EnvQueryMulti(&'a str),
    /// `log`: display the installer log.
    Log,
    /// `noop`.
    Noop,
    /// `quit`.
    Quit,
    /// `install`.
    Install,
    /// `abort`.
    Abort,
}

impl fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnvGet(name) => write!(f, "env-get -k {name}"),
            Self::EnvQuery(name) => write!(f, "env-query -k {name}"),
            Self::EnvQueryMulti(name) => write!(f, "env-query-multi -k {name}"),
            Self::Log => f.write_str("log"),
            Self::Noop => f.write_str("noop"),
            Self::Quit => f.write_str("quit"),
            Self::Install => f.write_str("install"),
            Self::Abort => f.write_str("abort"),
        }
    }
}
