//! `mdialog run`: drive an installer through its machine dialog.
//!
//! Usage: `mdialog run [OPTIONS] -- PROGRAM [ARG...]`
//!
//! Every `Q:STRING` prompt is taken to be the installer's command prompt and
//! consumes the next queued step. Other questions are aborted.

use std::collections::VecDeque;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};

use anyhow::{Context, Result};
use mdialog::{EnvValue, Event, Log, Session, Severity, Value, ValueType};

use crate::OutputFormat;

/// Arguments for `mdialog run`.
#[derive(clap::Args)]
#[command(trailing_var_arg = true)]
pub struct RunArgs {
    /// Set an environment entry (format: KEY=TYPE:VALUE; multi-str lines are comma separated).
    #[arg(long = "set", value_name = "KEY=TYPE:VALUE", value_parser = parse_assignment)]
    set: Vec<(String, EnvValue)>,

    /// Print an environment entry.
    #[arg(long = "get", value_name = "KEY")]
    get: Vec<String>,

    /// Download the installer log into FILE.
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Send `install` once all steps ran, instead of `quit`.
    #[arg(long)]
    install: bool,

    /// Output format for `--get` results.
    #[arg(long, default_value = "table")]
    format: OutputFormat,

    /// Installer program and its arguments.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

/// One command issued at the installer's prompt.
#[derive(Debug)]
enum Step {
    /// `env-query` / `env-query-multi`.
    Set(String, EnvValue),
    /// `env-get`.
    Get(String),
    /// `log`.
    Log(PathBuf),
    /// `install` or `quit`.
    Finish { install: bool },
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let (program, args) = self
            .command
            .split_first()
            .context("missing installer program")?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to start {program}"))?;
        let incoming = child.stdout.take().context("installer stdout not captured")?;
        let outgoing = child.stdin.take().context("installer stdin not captured")?;

        let mut steps: VecDeque<Step> = self
            .set
            .into_iter()
            .map(|(k, v)| Step::Set(k, v))
            .chain(self.get.into_iter().map(Step::Get))
            .chain(self.log.map(Step::Log))
            .collect();
        steps.push_back(Step::Finish {
            install: self.install,
        });

        let mut session = Session::new(incoming, outgoing);
        let outcome = drive(&mut session, steps);
        drop(session);

        let (results, status) = reap(&mut child, outcome)?;
        print_results(&results, self.format)?;
        if !status.success() {
            anyhow::bail!("{program} exited with {status}");
        }
        Ok(())
    }
}

/// Waits for the installer, killing it first if the dialog failed.
fn reap<T>(child: &mut Child, outcome: Result<T>) -> Result<(T, ExitStatus)> {
    if outcome.is_err() {
        // Already exited if the failure was the installer closing its output.
        let _ = child.kill();
    }
    let status = child.wait().context("failed to wait for installer")?;
    outcome.map(|value| (value, status))
}

/// Runs `steps` against the session until the installer terminates.
///
/// Returns the entries read by `Step::Get`, in order.
fn drive<R, W>(
    session: &mut Session<R, W>,
    mut steps: VecDeque<Step>,
) -> Result<Vec<(String, EnvValue)>>
where
    R: std::io::BufRead,
    W: std::io::Write,
{
    let mut results = Vec::new();
    loop {
        let mut event = session.next_event()?;
        match &mut event {
            Event::Terminate => return Ok(results),
            Event::Log(log) => forward_log(log),
            Event::DisplayValue(d) => {
                tracing::info!(
                    target: "installer",
                    "{}={}:{}",
                    d.name,
                    d.value_type(),
                    d.value
                );
            }
            Event::DisplayMultiString(d) => {
                tracing::info!(target: "installer", "{} ({} lines)", d.name, d.value.len());
            }
            Event::QueryString(_) => match steps.pop_front() {
                Some(step) => perform(session, step, &mut results)?,
                None => session.abort()?,
            },
            Event::QueryMultiString(q) => {
                tracing::warn!(target: "installer", "aborting unexpected prompt {}", q.name);
                q.abort = true;
                session.send_response(&event)?;
            }
            Event::QueryValue(q) => {
                tracing::warn!(target: "installer", "aborting unexpected prompt {}", q.name);
                q.abort = true;
                session.send_response(&event)?;
            }
            Event::Confirm(c) => {
                tracing::warn!(
                    target: "installer",
                    "aborting confirmation {}: {}",
                    c.what,
                    c.description
                );
                c.abort = true;
                session.send_response(&event)?;
            }
        }
    }
}

fn perform<R, W>(
    session: &mut Session<R, W>,
    step: Step,
    results: &mut Vec<(String, EnvValue)>,
) -> Result<()>
where
    R: std::io::BufRead,
    W: std::io::Write,
{
    match step {
        Step::Set(name, value) => session
            .environment_set(&name, value)
            .with_context(|| format!("failed to set {name}"))?,
        Step::Get(name) => {
            let value = session
                .environment_get(&name)
                .with_context(|| format!("failed to read {name}"))?;
            results.push((name, value));
        }
        Step::Log(path) => {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            session
                .download_log(&mut BufWriter::new(file))
                .context("failed to download log")?;
        }
        Step::Finish { install: true } => session.install()?,
        Step::Finish { install: false } => session.quit()?,
    }
    Ok(())
}

/// Re-emits an installer log record at the matching level.
fn forward_log(log: &Log) {
    match log.severity {
        Severity::Info => tracing::info!(target: "installer", "{}", log.record),
        Severity::Warning => tracing::warn!(target: "installer", "{}", log.record),
        Severity::Error | Severity::Critical | Severity::Fatal => {
            tracing::error!(target: "installer", "{} {}", log.severity, log.record);
        }
    }
}

fn print_results(results: &[(String, EnvValue)], format: OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        let obj: serde_json::Map<String, serde_json::Value> = results
            .iter()
            .map(|(k, v)| Ok((k.clone(), serde_json::to_value(v)?)))
            .collect::<serde_json::Result<_>>()?;
        println!("{}", serde_json::to_string_pretty(&obj)?);
        return Ok(());
    }
    for (name, value) in results {
        println!("{name:<40} {value}");
    }
    Ok(())
}

/// Parses `KEY=TYPE:VALUE`.
fn parse_assignment(spec: &str) -> Result<(String, EnvValue)> {
    let (key, typed) = spec
        .split_once('=')
        .with_context(|| format!("invalid assignment {spec:?}; use KEY=TYPE:VALUE"))?;
    let (tag, text) = typed
        .split_once(':')
        .with_context(|| format!("missing type in {spec:?}; use KEY=TYPE:VALUE"))?;
    let ty: ValueType = tag.parse().map_err(anyhow::Error::msg)?;
    let value = match ty {
        ValueType::None => EnvValue::Scalar(Value::None),
        ValueType::Bool => EnvValue::Scalar(Value::Bool(parse_bool(text)?)),
        ValueType::Int => EnvValue::Scalar(Value::Int(
            text.parse().with_context(|| format!("invalid integer {text:?}"))?,
        )),
        ValueType::Str => EnvValue::Scalar(Value::Str(text.to_owned())),
        ValueType::MultiStr => EnvValue::Multi(text.split(',').map(str::to_owned).collect()),
        _ => anyhow::bail!("unsupported type {tag:?}"),
    };
    Ok((key.to_owned(), value))
}

fn parse_bool(text: &str) -> Result<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "1" => Ok(true),
        "false" | "f" | "no" | "0" => Ok(false),
        _ => anyhow::bail!("invalid boolean {text:?}"),
    }
}
