use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use scanlink_node::{Outcome, ResultRecord, StatusEvent};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

const RECORD_HEADER: [&str; 3] = ["NAME", "PHONE", "IDENTIFIER"];

#[derive(Serialize)]
struct RecordOutput<'a> {
    kind: &'static str,
    #[serde(flatten)]
    record: &'a ResultRecord,
    timestamp: String,
}

#[derive(Serialize)]
struct EventOutput<'a> {
    kind: &'static str,
    #[serde(flatten)]
    event: &'a StatusEvent,
    timestamp: String,
}

#[derive(Serialize)]
struct OutcomeOutput<'a> {
    kind: &'static str,
    outcome: &'a str,
    identifier: Option<String>,
    bytes: Option<usize>,
}

/// One record as it arrives from the receiver.
pub fn print_record(record: &ResultRecord, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = RecordOutput {
                kind: "record",
                record,
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(RECORD_HEADER.to_vec()).add_row(record_row(record));
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{} - {} - {}",
                record.name, record.phone, record.identifier
            );
        }
    }
    flush_stdout();
}

/// A list of records, e.g. search results.
pub fn print_records(records: &[&ResultRecord], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&records),
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(RECORD_HEADER.to_vec());
            for record in records {
                table.add_row(record_row(record));
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for record in records {
                println!(
                    "{} - {} - {}",
                    record.name, record.phone, record.identifier
                );
            }
        }
    }
    flush_stdout();
}

pub fn print_event(event: &StatusEvent, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = EventOutput {
                kind: "status",
                event,
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("[{}] {}", event.kind.as_str(), event.message);
        }
    }
    flush_stdout();
}

pub fn print_outcome(outcome: &Outcome, format: OutputFormat) {
    let (label, identifier, bytes) = match outcome {
        Outcome::Sent { identifier, bytes } => ("sent", Some(identifier.to_string()), Some(*bytes)),
        Outcome::NoTrigger => ("no_trigger", None, None),
        Outcome::RejectedLength { code } => ("rejected_length", Some(code.clone()), None),
        Outcome::Duplicate { identifier } => ("duplicate", Some(identifier.to_string()), None),
    };

    match format {
        OutputFormat::Json => print_json(&OutcomeOutput {
            kind: "send",
            outcome: label,
            identifier,
            bytes,
        }),
        OutputFormat::Table => {
            let mut table = new_table();
            table
                .set_header(vec!["OUTCOME", "IDENTIFIER", "BYTES"])
                .add_row(vec![
                    label.to_string(),
                    identifier.unwrap_or_default(),
                    bytes.map(|b| b.to_string()).unwrap_or_default(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => match (identifier, bytes) {
            (Some(identifier), Some(bytes)) => println!("{label}: {identifier} ({bytes} bytes)"),
            (Some(identifier), None) => println!("{label}: {identifier}"),
            _ => println!("{label}"),
        },
    }
    flush_stdout();
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn record_row(record: &ResultRecord) -> Vec<String> {
    vec![
        record.name.clone(),
        record.phone.clone(),
        record.identifier.clone(),
    ]
}

fn flush_stdout() {
    let _ = std::io::stdout().flush();
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
