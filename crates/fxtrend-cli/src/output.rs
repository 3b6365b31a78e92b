use std::io::{self, Write};

use fxtrend_core::Envelope;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::commands::CommandOutput;
use crate::error::CliError;

pub fn render(output: &CommandOutput, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut writer = stdout.lock();

    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(&output.envelope)?
            } else {
                serde_json::to_string(&output.envelope)?
            };
            writeln!(writer, "{payload}")?;
        }
        OutputFormat::Table => write_table(&mut writer, &output.envelope, &output.summary)?,
    }

    Ok(())
}

fn write_table<W: Write>(
    writer: &mut W,
    envelope: &Envelope<Value>,
    summary: &[(String, String)],
) -> Result<(), CliError> {
    let width = summary
        .iter()
        .map(|(label, _)| label.len())
        .chain(std::iter::once("request_id".len()))
        .max()
        .unwrap_or(0);

    for (label, value) in summary {
        writeln!(writer, "{label:<width$} : {value}")?;
    }

    if !envelope.errors.is_empty() {
        writeln!(writer, "errors:")?;
        for error in &envelope.errors {
            match error.retryable {
                Some(true) => writeln!(writer, "  - {}: {} (retryable)", error.code, error.message)?,
                _ => writeln!(writer, "  - {}: {}", error.code, error.message)?,
            }
        }
    }

    if !envelope.meta.warnings.is_empty() {
        writeln!(writer, "warnings:")?;
        for warning in &envelope.meta.warnings {
            writeln!(writer, "  - {warning}")?;
        }
    }

    let sources = envelope
        .meta
        .source_chain
        .iter()
        .map(|source| source.as_str())
        .collect::<Vec<_>>()
        .join(",");
    writeln!(writer, "{:<width$} : {sources}", "source")?;
    writeln!(writer, "{:<width$} : {}", "latency_ms", envelope.meta.latency_ms)?;
    writeln!(writer, "{:<width$} : {}", "request_id", envelope.meta.request_id)?;

    Ok(())
}
