//! `mdialog decode`: print the events of a captured installer transcript.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use mdialog::{Event, SessionBuilder};

use crate::OutputFormat;

/// Arguments for `mdialog decode`.
#[derive(clap::Args)]
pub struct DecodeArgs {
    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,

    /// Transcript file; reads stdin when omitted.
    file: Option<PathBuf>,
}

impl DecodeArgs {
    pub fn run(self) -> Result<()> {
        let input: Box<dyn BufRead> = match &self.file {
            Some(p) => Box::new(BufReader::new(
                File::open(p).with_context(|| format!("failed to open {}", p.display()))?,
            )),
            None => Box::new(io::stdin().lock()),
        };
        // Request-shaped events are not answered.
        let mut session = SessionBuilder::new().build_buffered(input, io::sink());

        let mut count = 0usize;
        loop {
            let event = session
                .next_event()
                .with_context(|| format!("after {count} events"))?;
            print_event(&event, self.format)?;
            count += 1;
            if matches!(event, Event::Terminate) {
                return Ok(());
            }
        }
    }
}

fn print_event(event: &Event, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(event)?),
        OutputFormat::Table => match event {
            Event::DisplayMultiString(d) => {
                println!("{event}");
                for line in &d.value {
                    println!("    {line}");
                }
            }
            _ => println!("{event}"),
        },
    }
    Ok(())
}
