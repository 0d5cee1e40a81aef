//! Dialog events decoded from the incoming request stream.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::{Value, ValueType};

/// One decoded unit of the dialog.
///
/// Request-shaped variants ([`Event::QueryString`], [`Event::QueryMultiString`],
/// [`Event::QueryValue`], [`Event::Confirm`]) carry reply fields that the
/// caller fills in before handing the event to [`encode`](crate::encode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
#[allow(clippy::exhaustive_enums, clippy::large_enum_variant)]
pub enum Event {
    /// A log record emitted by the installer.
    Log(Log),
    /// Prompt for a single line of text.
    QueryString(QueryString),
    /// Prompt for a list of lines.
    QueryMultiString(QueryMultiString),
    /// Prompt for a typed value.
    QueryValue(QueryValue),
    /// A typed value shown by the installer.
    DisplayValue(DisplayValue),
    /// A list of lines shown by the installer.
    DisplayMultiString(DisplayMultiString),
    /// Yes/no question.
    Confirm(Confirm),
    /// End of the dialog.
    Terminate,
}

/// Stable discriminant of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[allow(clippy::exhaustive_enums)]
pub enum EventKind {
    /// [`Event::Log`].
    Log,
    /// [`Event::QueryString`].
    QueryString,
    /// [`Event::QueryMultiString`].
    QueryMultiString,
    /// [`Event::QueryValue`].
    QueryValue,
    /// [`Event::DisplayValue`].
    DisplayValue,
    /// [`Event::DisplayMultiString`].
    DisplayMultiString,
    /// [`Event::Confirm`].
    Confirm,
    /// [`Event::Terminate`].
    Terminate,
}

impl EventKind {
    /// Kebab-case name, as used in JSON output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::QueryString => "query-string",
            Self::QueryMultiString => "query-multi-string",
            Self::QueryValue => "query-value",
            Self::DisplayValue => "display-value",
            Self::DisplayMultiString => "display-multi-string",
            Self::Confirm => "confirm",
            Self::Terminate => "terminate",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Event {
    /// Returns the discriminant of this event.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Log(_) => EventKind::Log,
            Self::QueryString(_) => EventKind::QueryString,
            Self::QueryMultiString(_) => EventKind::QueryMultiString,
            Self::QueryValue(_) => EventKind::QueryValue,
            Self::DisplayValue(_) => EventKind::DisplayValue,
            Self::DisplayMultiString(_) => EventKind::DisplayMultiString,
            Self::Confirm(_) => EventKind::Confirm,
            Self::Terminate => EventKind::Terminate,
        }
    }

    /// Name of the prompt or variable the event refers to.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::QueryString(e) => Some(&e.name),
            Self::QueryMultiString(e) => Some(&e.name),
            Self::QueryValue(e) => Some(&e.name),
            Self::DisplayValue(e) => Some(&e.name),
            Self::DisplayMultiString(e) => Some(&e.name),
            Self::Confirm(e) => Some(&e.what),
            Self::Log(_) | Self::Terminate => None,
        }
    }

    /// Whether the remote side blocks until a reply is encoded.
    pub const fn needs_response(&self) -> bool {
        matches!(
            self,
            Self::QueryString(_)
                | Self::QueryMultiString(_)
                | Self::QueryValue(_)
                | Self::Confirm(_)
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Log(e) => write!(f, "Log {} {}", e.severity, e.record),
            Self::QueryString(e) => match &e.value {
                Some(v) => write!(f, "QueryString {} {v}", e.name),
                None => write!(f, "QueryString {}", e.name),
            },
            Self::QueryMultiString(e) => match &e.value {
                Some(v) => write!(f, "QueryMultiString {} {}", e.name, v.len()),
                None => write!(f, "QueryMultiString {} -", e.name),
            },
            Self::QueryValue(e) => {
                write!(f, "QueryValue {}={} abort={}", e.name, e.value, e.abort)
            }
            Self::DisplayValue(e) => write!(
                f,
                "DisplayValue {}={}:{}",
                e.name,
                e.value.value_type(),
                e.value
            ),
            Self::DisplayMultiString(e) => {
                write!(f, "DisplayMultiString {} {}", e.name, e.value.len())
            }
            Self::Confirm(e) => {
                write!(f, "Confirm {}({}) abort={}", e.what, e.description, e.abort)
            }
            Self::Terminate => f.write_str("Terminate"),
        }
    }
}

/// Severity of a [`Log`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(clippy::exhaustive_enums)]
pub enum Severity {
    /// Informational.
    Info,
    /// Warning.
    Warning,
    /// Error.
    Error,
    /// Critical.
    Critical,
    /// Fatal.
    Fatal,
}

impl Severity {
    /// Upper-case level name as written after the `L:` prefix.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
            Self::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log record (`L:<SEVERITY> <record>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Log {
    /// Record severity.
    pub severity: Severity,
    /// Message text, verbatim.
    pub record: String,
}

/// Single-line text prompt (`Q:STRING <name>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct QueryString {
    /// Prompt name.
    pub name: String,
    /// Reply; must be set before encoding.
    pub value: Option<String>,
}

/// Multi-line prompt (`Q:MULTI-STRING <name> <boundary> <abortboundary>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct QueryMultiString {
    /// Prompt name.
    pub name: String,
    /// Line that terminates the reply.
    pub boundary: String,
    /// Line that aborts the prompt.
    pub abort_boundary: String,
    /// Reply with the abort boundary instead of a value.
    pub abort: bool,
    /// Reply lines; must be set unless aborting.
    pub value: Option<Vec<String>>,
}

/// Typed value prompt (`Q:VALUE <name>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct QueryValue {
    /// Variable name.
    pub name: String,
    /// Reply with `ABORT <name>`.
    pub abort: bool,
    /// Reply value.
    pub value: Value,
}

/// Displayed typed value (`D:VALUE <name>=<type>:<value>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct DisplayValue {
    /// Variable name.
    pub name: String,
    /// Decoded value.
    pub value: Value,
}

impl DisplayValue {
    /// Type tag the value was sent with.
    pub const fn value_type(&self) -> ValueType {
        self.value.value_type()
    }
}

/// Displayed list of lines (`D:MULTI-STRING <name> <boundary>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct DisplayMultiString {
    /// Variable name.
    pub name: String,
    /// Line that terminated the payload.
    pub boundary: String,
    /// Payload lines. Empty when the payload was redirected to a sink.
    pub value: Vec<String>,
}

/// Confirmation (`CONFIRM <what> <description>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Confirm {
    /// Confirmation identifier.
    pub what: String,
    /// Human-readable question.
    pub description: String,
    /// Reply with `ABORT <what>`.
    pub abort: bool,
    /// Yes/no answer.
    pub reply: bool,
}
