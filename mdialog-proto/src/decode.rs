//! Request line decoder.
//!
//! Reads the incoming stream one line at a time. `D:MULTI-STRING` requests
//! keep reading until their boundary line, so a single [`decode`] call may
//! consume many lines.

use std::io::{self, BufRead, Write};

use tracing::{debug, error};

use crate::error::DecodeError;
use crate::message::{
    Confirm, DisplayMultiString, DisplayValue, Event, Log, QueryMultiString, QueryString,
    QueryValue, Severity,
};
use crate::value::{Value, ValueType};
use crate::wire;

/// Reads requests from `r` until one decodes into an [`Event`].
///
/// Note lines are skipped. When `sink` is given, the payload lines of a
/// `D:MULTI-STRING` request are written to it (each followed by `\n`)
/// instead of being collected into the event.
pub fn decode<R: BufRead + ?Sized>(
    r: &mut R,
    sink: Option<&mut dyn Write>,
) -> Result<Event, DecodeError> {
    let mut line = String::new();
    loop {
        if !read_line(r, &mut line)? {
            return Err(DecodeError::ConnectionTerminated);
        }
        if line.ends_with('\r') {
            line.pop();
        }
        debug!(target: "mdialog.proto", "got: {line}");

        if line.starts_with(wire::NOTE_PREFIX) {
            continue;
        }
        let result = match line.strip_prefix(wire::REQUEST_PREFIX) {
            Some(request) => parse_request(request, r, sink),
            None => Err(DecodeError::NotARequest { line }),
        };
        return match result {
            Ok(event) => {
                debug!(target: "mdialog.proto", "decoded: {event}");
                Ok(event)
            }
            Err(e) => {
                error!(target: "mdialog.proto", "cannot parse input: {e}");
                Err(e)
            }
        };
    }
}

/// Reads one line into `buf` without its `\n`.
///
/// A `\r` before the `\n` is kept; request lines drop it, payload lines
/// stay verbatim. Returns `false` at end of stream.
fn read_line<R: BufRead + ?Sized>(r: &mut R, buf: &mut String) -> io::Result<bool> {
    buf.clear();
    if r.read_line(buf)? == 0 {
        return Ok(false);
    }
    if buf.ends_with('\n') {
        buf.pop();
    }
    Ok(true)
}

/// Decodes a request with the `***` prefix already stripped.
fn parse_request<R: BufRead + ?Sized>(
    request: &str,
    r: &mut R,
    sink: Option<&mut dyn Write>,
) -> Result<Event, DecodeError> {
    let malformed = |command| DecodeError::Malformed {
        command,
        line: request.to_owned(),
    };

    if request.starts_with(wire::LOG_PREFIX) {
        let (token, record) = request
            .split_once(' ')
            .ok_or_else(|| malformed(wire::LOG_PREFIX))?;
        return Ok(Event::Log(Log {
            severity: severity(token)?,
            record: record.to_owned(),
        }));
    }

    if let Some(name) = args(request, wire::QUERY_STRING) {
        return Ok(Event::QueryString(QueryString {
            name: name.to_owned(),
            value: None,
        }));
    }

    if let Some(rest) = args(request, wire::QUERY_MULTI_STRING) {
        let fields: Vec<&str> = rest.split(' ').collect();
        let &[name, boundary, abort_boundary] = fields.as_slice() else {
            return Err(malformed(wire::QUERY_MULTI_STRING));
        };
        if fields.iter().any(|f| f.is_empty()) {
            return Err(malformed(wire::QUERY_MULTI_STRING));
        }
        return Ok(Event::QueryMultiString(QueryMultiString {
            name: name.to_owned(),
            boundary: boundary.to_owned(),
            abort_boundary: abort_boundary.to_owned(),
            abort: false,
            value: None,
        }));
    }

    if let Some(name) = args(request, wire::QUERY_VALUE) {
        return Ok(Event::QueryValue(QueryValue {
            name: name.to_owned(),
            abort: false,
            value: Value::None,
        }));
    }

    if let Some(rest) = args(request, wire::DISPLAY_VALUE) {
        let (name, typed) = rest
            .split_once('=')
            .ok_or_else(|| malformed(wire::DISPLAY_VALUE))?;
        let (tag, text) = typed
            .split_once(':')
            .ok_or_else(|| malformed(wire::DISPLAY_VALUE))?;
        return Ok(Event::DisplayValue(DisplayValue {
            name: name.to_owned(),
            value: typed_value(name, tag, text)?,
        }));
    }

    if let Some(rest) = args(request, wire::DISPLAY_MULTI_STRING) {
        let (name, boundary) = rest
            .split_once(' ')
            .ok_or_else(|| malformed(wire::DISPLAY_MULTI_STRING))?;
        debug!(target: "mdialog.proto", "in-request reading multi-string {name}");
        let value = read_payload(r, name, boundary, sink)?;
        return Ok(Event::DisplayMultiString(DisplayMultiString {
            name: name.to_owned(),
            boundary: boundary.to_owned(),
            value,
        }));
    }

    if let Some(rest) = args(request, wire::CONFIRM) {
        let (what, description) = rest
            .split_once(' ')
            .ok_or_else(|| malformed(wire::CONFIRM))?;
        return Ok(Event::Confirm(Confirm {
            what: what.to_owned(),
            description: description.to_owned(),
            abort: false,
            reply: false,
        }));
    }

    if request == wire::TERMINATE {
        return Ok(Event::Terminate);
    }

    Err(DecodeError::Unsupported {
        command: request.split(' ').next().unwrap_or_default().to_owned(),
    })
}

/// Returns what follows `command` and a single space.
fn args<'a>(request: &'a str, command: &str) -> Option<&'a str> {
    request.strip_prefix(command)?.strip_prefix(' ')
}

fn severity(token: &str) -> Result<Severity, DecodeError> {
    let level = match token.strip_prefix(wire::LOG_PREFIX) {
        Some("INFO") => Severity::Info,
        Some("WARNING") => Severity::Warning,
        Some("ERROR") => Severity::Error,
        Some("CRITICAL") => Severity::Critical,
        Some("FATAL") => Severity::Fatal,
        _ => {
            return Err(DecodeError::UnknownSeverity {
                token: token.to_owned(),
            });
        }
    };
    Ok(level)
}

fn typed_value(name: &str, tag: &str, text: &str) -> Result<Value, DecodeError> {
    let unknown = || DecodeError::UnknownType {
        name: name.to_owned(),
        tag: tag.to_owned(),
    };
    let ty: ValueType = tag.parse().map_err(|_| unknown())?;
    match Value::parse_typed(ty, text) {
        Some(Ok(value)) => Ok(value),
        Some(Err(source)) => Err(DecodeError::InvalidInteger {
            name: name.to_owned(),
            text: text.to_owned(),
            source,
        }),
        None => Err(unknown()),
    }
}

/// Reads payload lines up to (not including) `boundary`.
fn read_payload<R: BufRead + ?Sized>(
    r: &mut R,
    name: &str,
    boundary: &str,
    mut sink: Option<&mut dyn Write>,
) -> Result<Vec<String>, DecodeError> {
    let mut value = Vec::new();
    let mut line = String::new();
    loop {
        if !read_line(r, &mut line)? {
            return Err(DecodeError::TruncatedPayload {
                name: name.to_owned(),
                boundary: boundary.to_owned(),
            });
        }
        if line.strip_suffix('\r').unwrap_or(&line) == boundary {
            break;
        }
        match sink.as_deref_mut() {
            Some(out) => {
                out.write_all(line.as_bytes())?;
                out.write_all(b"\n")?;
            }
            None => value.push(line.clone()),
        }
    }
    if let Some(out) = sink {
        out.flush()?;
    }
    Ok(value)
}
