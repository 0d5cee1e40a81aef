//! Response encoder.
//!
//! Replies are rendered into a buffer and validated before anything is
//! written, then written in one go and flushed.

use std::io::Write;

use crate::error::EncodeError;
use crate::message::{Confirm, Event, QueryMultiString, QueryString, QueryValue};
use crate::value::Value;
use crate::wire::{self, Command};

/// Writes the reply carried by `event` to `w`.
///
/// One-way events (`Log`, `DisplayValue`, `DisplayMultiString`,
/// `Terminate`) produce no output.
pub fn encode<W: Write + ?Sized>(w: &mut W, event: &Event) -> Result<(), EncodeError> {
    let out = match event {
        Event::QueryString(q) => query_string(q)?,
        Event::QueryMultiString(q) => query_multi_string(q)?,
        Event::QueryValue(q) => query_value(q)?,
        Event::Confirm(c) => confirm(c),
        Event::Log(_)
        | Event::DisplayValue(_)
        | Event::DisplayMultiString(_)
        | Event::Terminate => return Ok(()),
    };
    w.write_all(out.as_bytes())?;
    w.flush()?;
    Ok(())
}

/// Writes a single command line to `w`.
pub fn encode_command<W: Write + ?Sized>(w: &mut W, command: Command<'_>) -> std::io::Result<()> {
    writeln!(w, "{command}")?;
    w.flush()
}

fn single_line(name: &str, text: &str) -> Result<(), EncodeError> {
    if text.contains('\n') {
        return Err(EncodeError::NewLine {
            name: name.to_owned(),
        });
    }
    Ok(())
}

fn query_string(q: &QueryString) -> Result<String, EncodeError> {
    let value = q.value.as_deref().ok_or_else(|| EncodeError::MissingValue {
        name: q.name.clone(),
    })?;
    single_line(&q.name, value)?;
    Ok(format!("{value}\n"))
}

fn query_multi_string(q: &QueryMultiString) -> Result<String, EncodeError> {
    if q.abort {
        return Ok(format!("{}\n", q.abort_boundary));
    }
    let lines = q.value.as_deref().ok_or_else(|| EncodeError::MissingValue {
        name: q.name.clone(),
    })?;
    let mut out = String::new();
    for line in lines {
        single_line(&q.name, line)?;
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(&q.boundary);
    out.push('\n');
    Ok(out)
}

fn query_value(q: &QueryValue) -> Result<String, EncodeError> {
    if let Value::Str(s) = &q.value {
        single_line(&q.name, s)?;
    }
    if q.abort {
        return Ok(format!("{} {}\n", wire::RESPONSE_ABORT, q.name));
    }
    Ok(format!(
        "{} {}={}:{}\n",
        wire::RESPONSE_VALUE,
        q.name,
        q.value.value_type(),
        q.value
    ))
}

fn confirm(c: &Confirm) -> String {
    if c.abort {
        format!("{} {}\n", wire::RESPONSE_ABORT, c.what)
    } else {
        let answer = if c.reply { "yes" } else { "no" };
        format!("{} {}={answer}\n", wire::RESPONSE_CONFIRM, c.what)
    }
}
