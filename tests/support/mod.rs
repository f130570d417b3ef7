// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared helpers for the join integration tests.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::io::Write as _;

use crossbeam_channel::unbounded;
use tempfile::NamedTempFile;

use recflow::core::record::Separators;
use recflow::core::transform::TransformerRegistry;
use recflow::{Context, Envelope, Options, Record, Value};

pub fn context() -> Context {
    Context::new(Separators::default())
}

/// Write a left file in DKVP format.
pub fn dkvp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn parse_dkvp(line: &str) -> Record {
    line.split(',')
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap();
            (k.to_string(), Value::from_inferred(v))
        })
        .collect()
}

/// Parse DKVP lines into an envelope stream terminated by end-of-stream.
pub fn records(lines: &str) -> Vec<Envelope> {
    let mut envelopes: Vec<Envelope> = lines
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| Envelope::record(parse_dkvp(line), context()))
        .collect();
    envelopes.push(Envelope::EndOfStream(context()));
    envelopes
}

/// Build the join verb from a command-line segment and push the given
/// envelopes through it, collecting everything it emits.
pub fn run_join(line: &str, envelopes: Vec<Envelope>) -> Vec<Envelope> {
    let registry = TransformerRegistry::standard();
    let mut tokens = line.split_whitespace().map(str::to_string);
    let name = tokens.next().unwrap();
    let args: Vec<String> = tokens.collect();
    let setup = registry.lookup(&name).unwrap();
    let (mut transformer, files) = (setup.parse)(&args, &Options::default()).unwrap();
    assert!(files.is_empty());

    let (tx, rx) = unbounded();
    for envelope in envelopes {
        transformer.transform(envelope, &tx);
    }
    drop(tx);
    rx.iter().collect()
}

pub fn field(record: &Record, key: &str) -> String {
    record.get(key).map(|v| v.to_string()).unwrap_or_default()
}

/// Render a record back to a single DKVP line for compact assertions.
pub fn render(record: &Record) -> String {
    record
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}
