//! Front-end side of a machine dialog.
//!
//! A [`Session`] owns the installer's output (our incoming stream) and
//! input (our outgoing stream). Events are pulled one at a time with
//! [`Session::next_event`]; the command helpers write a command line at the
//! installer's command prompt and, where one is expected, consume its reply.

use std::io::{BufRead, BufReader, Read, Write};

use mdialog_proto::{Command, Event};
use tracing::debug;

use crate::env::EnvValue;
use crate::error::{Error, Result};

/// Default read buffer size.
const BUFFER_SIZE: usize = 10 * 1024;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Streams attached; operations allowed.
    Open,
    /// Terminated, disconnected, or broken by a protocol violation.
    Closed,
}

/// Builder for a [`Session`].
///
/// # Example
///
/// ```
/// use mdialog::SessionBuilder;
///
/// let incoming: &[u8] = b"***TERMINATE\n";
/// let mut session = SessionBuilder::new()
///     .buffer_capacity(64 * 1024)
///     .build(incoming, Vec::new());
/// assert!(session.next_event().is_ok());
/// assert!(session.is_closed());
/// ```
#[derive(Debug, Clone, Copy)]
#[must_use = "a SessionBuilder does nothing until .build() is called"]
pub struct SessionBuilder {
    /// Capacity of the read buffer wrapped around the incoming stream.
    buffer_capacity: usize,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            buffer_capacity: BUFFER_SIZE,
        }
    }
}

impl SessionBuilder {
    /// Creates a builder with a 10 KiB read buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the read buffer capacity.
    pub const fn buffer_capacity(mut self, bytes: usize) -> Self {
        self.buffer_capacity = bytes;
        self
    }

    /// Builds a session over a raw incoming stream.
    pub fn build<R: Read, W: Write>(self, incoming: R, outgoing: W) -> Session<BufReader<R>, W> {
        Session::from_parts(BufReader::with_capacity(self.buffer_capacity, incoming), outgoing)
    }

    /// Builds a session over an already buffered incoming stream.
    ///
    /// The buffer capacity setting is ignored.
    pub fn build_buffered<R: BufRead, W: Write>(self, incoming: R, outgoing: W) -> Session<R, W> {
        Session::from_parts(incoming, outgoing)
    }
}

/// A dialog session over one incoming and one outgoing stream.
///
/// Every operation takes `&mut self`; a session serves one caller at a time.
/// Once the installer terminates, the stream ends, or a malformed request
/// is read, the session is closed and every further operation fails with
/// [`Error::Closed`].
#[derive(Debug)]
pub struct Session<R, W> {
    /// Incoming request stream.
    incoming: R,
    /// Outgoing reply/command stream.
    outgoing: W,
    /// Current lifecycle state.
    state: State,
}

impl<R: Read, W: Write> Session<BufReader<R>, W> {
    /// Creates a session with default settings.
    pub fn new(incoming: R, outgoing: W) -> Self {
        SessionBuilder::new().build(incoming, outgoing)
    }
}

impl<R: BufRead, W: Write> Session<R, W> {
    /// Creates an open session from its streams.
    const fn from_parts(incoming: R, outgoing: W) -> Self {
        Self {
            incoming,
            outgoing,
            state: State::Open,
        }
    }

    /// Whether the session has ended.
    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    /// Returns the underlying streams.
    pub fn into_inner(self) -> (R, W) {
        (self.incoming, self.outgoing)
    }

    /// Blocks until the next event is decoded.
    pub fn next_event(&mut self) -> Result<Event> {
        self.read_event(None)
    }

    /// Like [`next_event`](Self::next_event), but a `D:MULTI-STRING`
    /// payload is written to `sink` line by line instead of being kept in
    /// the returned event.
    pub fn next_event_with_sink(&mut self, sink: &mut dyn Write) -> Result<Event> {
        self.read_event(Some(sink))
    }

    /// Writes the reply carried by `event`.
    ///
    /// Nothing is written when the reply is invalid; the session stays open
    /// in that case.
    pub fn send_response(&mut self, event: &Event) -> Result<()> {
        self.ensure_open()?;
        let result = mdialog_proto::encode(&mut self.outgoing, event).map_err(Error::from);
        self.close_on_io(result)
    }

    /// Reads an environment entry with `env-get`.
    pub fn environment_get(&mut self, name: &str) -> Result<EnvValue> {
        debug!(target: "mdialog", "env-get {name}");
        self.command(Command::EnvGet(name))?;

        let value = match self.next_event()? {
            Event::DisplayValue(e) => EnvValue::Scalar(e.value),
            Event::DisplayMultiString(e) => EnvValue::Multi(e.value),
            other => return Err(unexpected("env-get", &other)),
        };
        debug!(target: "mdialog", "env-get {name}={value}");
        Ok(value)
    }

    /// Sets an environment entry with `env-query` or `env-query-multi`,
    /// depending on the shape of `value`.
    pub fn environment_set(&mut self, name: &str, value: impl Into<EnvValue>) -> Result<()> {
        let value = value.into();
        debug!(target: "mdialog", "env-query {name}={value}");

        let command = match value {
            EnvValue::Multi(_) => Command::EnvQueryMulti(name),
            EnvValue::Scalar(_) => Command::EnvQuery(name),
        };
        self.command(command)?;

        let mut event = self.next_event()?;
        match (&mut event, value) {
            (Event::QueryValue(q), EnvValue::Scalar(v)) => q.value = v,
            (Event::QueryMultiString(q), EnvValue::Multi(lines)) => q.value = Some(lines),
            (Event::QueryValue(_), actual @ EnvValue::Multi(_)) => {
                return Err(shape_mismatch(name, "a single value", &actual));
            }
            (Event::QueryMultiString(_), actual @ EnvValue::Scalar(_)) => {
                return Err(shape_mismatch(name, "a list of lines", &actual));
            }
            (other, _) => return Err(unexpected("env-query", other)),
        }
        self.send_response(&event)
    }

    /// Streams the installer log into `sink` with the `log` command.
    pub fn download_log(&mut self, sink: &mut impl Write) -> Result<()> {
        self.command(Command::Log)?;
        match self.next_event_with_sink(sink)? {
            Event::DisplayMultiString(_) => Ok(()),
            other => Err(unexpected("log", &other)),
        }
    }

    /// Sends `noop`.
    pub fn noop(&mut self) -> Result<()> {
        self.command(Command::Noop)
    }

    /// Sends `quit`.
    pub fn quit(&mut self) -> Result<()> {
        self.command(Command::Quit)
    }

    /// Sends `install`.
    pub fn install(&mut self) -> Result<()> {
        self.command(Command::Install)
    }

    /// Sends `abort`.
    pub fn abort(&mut self) -> Result<()> {
        self.command(Command::Abort)
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            State::Open => Ok(()),
            State::Closed => Err(Error::Closed),
        }
    }

    fn command(&mut self, command: Command<'_>) -> Result<()> {
        self.ensure_open()?;
        let result =
            mdialog_proto::encode_command(&mut self.outgoing, command).map_err(Error::from);
        self.close_on_io(result)
    }

    fn read_event(&mut self, sink: Option<&mut dyn Write>) -> Result<Event> {
        self.ensure_open()?;
        match mdialog_proto::decode(&mut self.incoming, sink) {
            Ok(event) => {
                if matches!(event, Event::Terminate) {
                    debug!(target: "mdialog", "dialog terminated");
                    self.state = State::Closed;
                }
                Ok(event)
            }
            Err(e) => {
                self.state = State::Closed;
                Err(e.into())
            }
        }
    }

    /// A failed write leaves the remote side in an unknown state.
    fn close_on_io<T>(&mut self, result: Result<T>) -> Result<T> {
        if matches!(result, Err(Error::Io(_))) {
            self.state = State::Closed;
        }
        result
    }
}

fn unexpected(operation: &'static str, event: &Event) -> Error {
    Error::UnexpectedEvent {
        operation,
        event: event.to_string(),
        kind: event.kind(),
    }
}

fn shape_mismatch(name: &str, expected: &'static str, actual: &EnvValue) -> Error {
    Error::ShapeMismatch {
        name: name.to_owned(),
        expected,
        actual: actual.value_type(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Seek};

    use mdialog_proto::{Severity, Value};

    use super::*;

    type TestSession = Session<BufReader<Cursor<Vec<u8>>>, Vec<u8>>;

    fn session(incoming: &str) -> TestSession {
        Session::new(Cursor::new(incoming.as_bytes().to_vec()), Vec::new())
    }

    fn outgoing(session: TestSession) -> String {
        String::from_utf8(session.into_inner().1).unwrap()
    }

    fn expect_prompt(session: &mut TestSession) {
        match session.next_event().unwrap() {
            Event::QueryString(q) => assert_eq!(q.name, "prompt"),
            other => panic!("expected prompt, got {other}"),
        }
    }

    #[test]
    fn terminate_only() {
        let mut s = session("***TERMINATE\n");
        assert_eq!(s.next_event().unwrap(), Event::Terminate);
        assert!(s.is_closed());
        assert!(matches!(s.next_event(), Err(Error::Closed)));
        assert!(matches!(s.noop(), Err(Error::Closed)));
        assert_eq!(outgoing(s), "");
    }

    #[test]
    fn invalid_tokens() {
        for incoming in [
            "XXX\n",
            "***XXX\n",
            "***Q:STRING1 str1\n",
            "***Q:MUTLI-STRING str1\n",
        ] {
            let mut s = session(incoming);
            let err = s.next_event().unwrap_err();
            assert!(err.is_protocol_violation(), "{incoming}: {err}");
            assert!(s.is_closed());
        }
    }

    #[test]
    fn connection_termination() {
        let mut s = session("#note\n");
        assert!(matches!(s.next_event(), Err(Error::ConnectionTerminated)));
        assert!(s.is_closed());
    }

    #[test]
    fn coverage() {
        let incoming = concat!(
            "#NOTE\n",
            "#NOTE\n",
            "***L:INFO log record\n",
            "***L:WARNING log record\n",
            "***L:ERROR log record\n",
            "***L:CRITICAL log record\n",
            "***L:FATAL log record\n",
            "#INFO\n",
            "***Q:STRING str1\n",
            "***Q:MULTI-STRING mstr0 boundary1 boundary2\n",
            "***Q:MULTI-STRING mstr1 boundary1 boundary2\n",
            "***Q:MULTI-STRING mstr2 boundary1 boundary2\n",
            "***Q:VALUE value0\n",
            "***Q:VALUE value1\n",
            "***Q:VALUE value2\n",
            "***Q:VALUE value3\n",
            "***Q:VALUE value4\n",
            "***Q:VALUE value5\n",
            "***D:VALUE value10=none:NoneType\n",
            "***D:VALUE value11=bool:True\n",
            "***D:VALUE value12=bool:False\n",
            "***D:VALUE value13=int:52\n",
            "***D:VALUE value14=str:value 2\n",
            "***D:MULTI-STRING mstr3 boundary2\n",
            "line 1\n",
            "line 2\n",
            "boundary2\n",
            "***CONFIRM confirm0 description 0\n",
            "***CONFIRM confirm1 description 1\n",
            "***CONFIRM confirm2 description 1\n",
            "***TERMINATE\n",
        );
        let expected = concat!(
            "value 1\n",
            "boundary2\n",
            "line 1\n",
            "line 2\n",
            "boundary1\n",
            "boundary1\n",
            "ABORT value0\n",
            "VALUE value1=none:null\n",
            "VALUE value2=bool:true\n",
            "VALUE value3=bool:false\n",
            "VALUE value4=int:47\n",
            "VALUE value5=str:string 1\n",
            "ABORT confirm0\n",
            "CONFIRM confirm1=no\n",
            "CONFIRM confirm2=yes\n",
        );
        let mut s = session(incoming);

        for severity in [
            Severity::Info,
            Severity::Warning,
            Severity::Error,
            Severity::Critical,
            Severity::Fatal,
        ] {
            let Event::Log(log) = s.next_event().unwrap() else {
                panic!("expected Log");
            };
            assert_eq!(log.severity, severity);
            assert_eq!(log.record, "log record");
        }

        let mut event = s.next_event().unwrap();
        let Event::QueryString(q) = &mut event else {
            panic!("expected QueryString");
        };
        assert_eq!(q.name, "str1");
        q.value = Some("value 1".into());
        s.send_response(&event).unwrap();

        for i in 0..3 {
            let mut event = s.next_event().unwrap();
            let Event::QueryMultiString(q) = &mut event else {
                panic!("expected QueryMultiString");
            };
            assert_eq!(q.name, format!("mstr{i}"));
            match i {
                0 => q.abort = true,
                1 => q.value = Some(vec!["line 1".into(), "line 2".into()]),
                _ => q.value = Some(Vec::new()),
            }
            s.send_response(&event).unwrap();
        }

        let values = [
            None,
            Some(Value::None),
            Some(Value::Bool(true)),
            Some(Value::Bool(false)),
            Some(Value::Int(47)),
            Some(Value::Str("string 1".into())),
        ];
        for (i, value) in values.into_iter().enumerate() {
            let mut event = s.next_event().unwrap();
            let Event::QueryValue(q) = &mut event else {
                panic!("expected QueryValue");
            };
            assert_eq!(q.name, format!("value{i}"));
            match value {
                Some(v) => q.value = v,
                None => q.abort = true,
            }
            s.send_response(&event).unwrap();
        }

        let displayed = [
            Value::None,
            Value::Bool(true),
            Value::Bool(false),
            Value::Int(52),
            Value::Str("value 2".into()),
        ];
        for (i, want) in displayed.into_iter().enumerate() {
            let Event::DisplayValue(d) = s.next_event().unwrap() else {
                panic!("expected DisplayValue");
            };
            assert_eq!(d.name, format!("value1{i}"));
            assert_eq!(d.value, want);
        }

        let Event::DisplayMultiString(d) = s.next_event().unwrap() else {
            panic!("expected DisplayMultiString");
        };
        assert_eq!(d.name, "mstr3");
        assert_eq!(d.value, vec!["line 1", "line 2"]);

        for (what, abort, reply) in [
            ("confirm0", true, false),
            ("confirm1", false, false),
            ("confirm2", false, true),
        ] {
            let mut event = s.next_event().unwrap();
            let Event::Confirm(c) = &mut event else {
                panic!("expected Confirm");
            };
            assert_eq!(c.what, what);
            c.abort = abort;
            c.reply = reply;
            s.send_response(&event).unwrap();
        }

        assert_eq!(s.next_event().unwrap(), Event::Terminate);
        assert_eq!(outgoing(s), expected);
    }

    #[test]
    fn download_log() {
        let mut s = session(concat!(
            "***Q:STRING prompt\n",
            "***D:MULTI-STRING log boundary1\n",
            "line 1\n",
            "line 2\n",
            "boundary1\n",
            "***TERMINATE\n",
        ));
        expect_prompt(&mut s);
        let mut log = Vec::new();
        s.download_log(&mut log).unwrap();
        assert_eq!(log, b"line 1\nline 2\n");
        assert_eq!(s.next_event().unwrap(), Event::Terminate);
        assert_eq!(outgoing(s), "log\n");
    }

    #[test]
    fn download_log_to_file() {
        let mut s = session(concat!(
            "***D:MULTI-STRING log boundary1\n",
            "first\n",
            "boundary1\n",
        ));
        let mut file = tempfile::tempfile().unwrap();
        s.download_log(&mut file).unwrap();

        let mut written = String::new();
        file.rewind().unwrap();
        file.read_to_string(&mut written).unwrap();
        assert_eq!(written, "first\n");
    }

    #[test]
    fn download_log_unexpected_event() {
        let mut s = session("***Q:STRING prompt\n");
        let err = s.download_log(&mut Vec::<u8>::new()).unwrap_err();
        assert!(err.is_unexpected_event());
        assert!(!s.is_closed());
    }

    #[test]
    fn environment_get() {
        let mut s = session(concat!(
            "***Q:STRING prompt\n",
            "***D:VALUE key1=str:value1\n",
            "***Q:STRING prompt\n",
            "***D:MULTI-STRING key2 boundary1\n",
            "line 1\n",
            "line 2\n",
            "boundary1\n",
            "***TERMINATE\n",
        ));
        expect_prompt(&mut s);
        let value = s.environment_get("key1").unwrap();
        assert_eq!(value, EnvValue::Scalar(Value::Str("value1".into())));

        expect_prompt(&mut s);
        let value = s.environment_get("key2").unwrap();
        assert_eq!(value, EnvValue::Multi(vec!["line 1".into(), "line 2".into()]));

        assert_eq!(s.next_event().unwrap(), Event::Terminate);
        assert_eq!(outgoing(s), "env-get -k key1\nenv-get -k key2\n");
    }

    #[test]
    fn environment_get_unexpected_event() {
        let mut s = session("***Q:VALUE key1\n");
        let err = s.environment_get("key1").unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedEvent {
                operation: "env-get",
                kind: mdialog_proto::EventKind::QueryValue,
                ..
            }
        ));
    }

    #[test]
    fn environment_set() {
        let mut s = session(concat!(
            "***Q:STRING prompt\n",
            "***Q:VALUE key1\n",
            "***Q:STRING prompt\n",
            "***Q:MULTI-STRING key2 boundary1 boundary2\n",
            "***TERMINATE\n",
        ));
        expect_prompt(&mut s);
        s.environment_set("key1", "value 1").unwrap();

        expect_prompt(&mut s);
        s.environment_set("key2", vec!["line 1".to_owned(), "line 2".to_owned()])
            .unwrap();

        assert_eq!(s.next_event().unwrap(), Event::Terminate);
        assert_eq!(
            outgoing(s),
            concat!(
                "env-query -k key1\n",
                "VALUE key1=str:value 1\n",
                "env-query-multi -k key2\n",
                "line 1\n",
                "line 2\n",
                "boundary1\n",
            )
        );
    }

    #[test]
    fn environment_set_shape_mismatch() {
        let mut s = session("***Q:STRING prompt\n***Q:VALUE key1\n");
        expect_prompt(&mut s);
        let err = s.environment_set("key1", &["a", "b"][..]).unwrap_err();
        assert!(err.is_caller_error());
        assert!(matches!(err, Error::ShapeMismatch { .. }));
        assert_eq!(outgoing(s), "env-query-multi -k key1\n");
    }

    #[test]
    fn environment_set_newline_rejected() {
        let mut s = session("***Q:STRING prompt\n***Q:VALUE key1\n");
        expect_prompt(&mut s);
        let err = s.environment_set("key1", "test\nwith new line").unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));
        assert!(!s.is_closed());
        assert_eq!(outgoing(s), "env-query -k key1\n");
    }

    #[test]
    fn environment_set_unexpected_event() {
        let mut s = session("***CONFIRM x really\n");
        let err = s.environment_set("key1", 5_i64).unwrap_err();
        assert!(err.is_unexpected_event());
    }

    #[test]
    fn one_line_commands() {
        let mut s = session(concat!(
            "***Q:STRING prompt\n",
            "***Q:STRING prompt\n",
            "***Q:STRING prompt\n",
            "***Q:STRING prompt\n",
            "***TERMINATE\n",
        ));
        expect_prompt(&mut s);
        s.install().unwrap();
        expect_prompt(&mut s);
        s.quit().unwrap();
        expect_prompt(&mut s);
        s.abort().unwrap();
        expect_prompt(&mut s);
        s.noop().unwrap();
        assert_eq!(s.next_event().unwrap(), Event::Terminate);
        assert_eq!(outgoing(s), "install\nquit\nabort\nnoop\n");
    }

    #[test]
    fn sink_receives_display_payload() {
        let mut s = session("***D:MULTI-STRING k b\nx\ny\nb\n");
        let mut sink = Vec::new();
        let Event::DisplayMultiString(d) = s.next_event_with_sink(&mut sink).unwrap() else {
            panic!("expected DisplayMultiString");
        };
        assert!(d.value.is_empty());
        assert_eq!(sink, b"x\ny\n");
    }

    /// Outgoing stream whose reader went away.
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_closes_session() {
        let incoming = "***Q:STRING prompt\n***Q:STRING prompt\n";
        let mut s = SessionBuilder::new().build(incoming.as_bytes(), BrokenPipe);
        assert!(matches!(s.next_event().unwrap(), Event::QueryString(_)));

        assert!(matches!(s.install(), Err(Error::Io(_))));
        assert!(s.is_closed());
        assert!(matches!(s.next_event(), Err(Error::Closed)));
    }

    #[test]
    fn reply_write_failure_closes_session() {
        let mut s = SessionBuilder::new().build("***Q:STRING str1\n".as_bytes(), BrokenPipe);
        let mut event = s.next_event().unwrap();
        if let Event::QueryString(q) = &mut event {
            q.value = Some("value 1".into());
        }
        assert!(matches!(s.send_response(&event), Err(Error::Io(_))));
        assert!(s.is_closed());
    }

    #[test]
    fn small_buffer() {
        let incoming = "***D:MULTI-STRING k b\na fairly long payload line\nb\n***TERMINATE\n";
        let mut s = SessionBuilder::new()
            .buffer_capacity(4)
            .build(incoming.as_bytes(), Vec::new());
        let Event::DisplayMultiString(d) = s.next_event().unwrap() else {
            panic!("expected DisplayMultiString");
        };
        assert_eq!(d.value, vec!["a fairly long payload line"]);
        assert_eq!(s.next_event().unwrap(), Event::Terminate);
    }
}
