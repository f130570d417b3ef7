// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record readers.
//!
//! A reader turns a list of file names (or stdin) into an envelope stream
//! on a bounded channel, terminated by exactly one `EndOfStream` envelope.
//! I/O and parse errors go out on a dedicated error channel; the consumer
//! treats the first error as fatal, so readers stop parsing the offending
//! handle and still terminate the stream.

mod csv;
mod dkvp;
mod json;

pub use csv::CsvReader;
pub use dkvp::DkvpReader;
pub use json::JsonReader;

use std::fs::File;
use std::io::Read;
use std::thread;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use crate::core::config::{ReaderOptions, FORMAT_CSV, FORMAT_DKVP, FORMAT_JSON};
use crate::core::error::{RecflowError, RecflowResult};
use crate::core::record::{Context, Envelope};

/// Capacity of a reader's record channel.
pub const READER_CHANNEL_CAPACITY: usize = 10;

pub const STDIN_FILENAME: &str = "(stdin)";

/// A record reader: produces an envelope stream from a list of files.
///
/// Implementations send one `Envelope::Record` per input record, errors on
/// `err_tx`, and a final `Envelope::EndOfStream` regardless of errors.
pub trait RecordReader: Send {
    fn read(
        &mut self,
        filenames: &[String],
        context: Context,
        tx: &Sender<Envelope>,
        err_tx: &Sender<RecflowError>,
    );
}

/// Instantiate a reader for the configured input format.
pub fn create(options: &ReaderOptions) -> RecflowResult<Box<dyn RecordReader>> {
    match options.format.as_str() {
        FORMAT_DKVP => Ok(Box::new(DkvpReader::new(options))),
        FORMAT_CSV => Ok(Box::new(CsvReader::new(options))),
        FORMAT_JSON => Ok(Box::new(JsonReader::new())),
        other => Err(RecflowError::unsupported_format(other)),
    }
}

/// Start a reader on its own thread with a freshly allocated channel pair.
///
/// The error channel is unbounded: a reader that continues past failed
/// files may report several errors before the consumer (which treats the
/// first one as fatal) gets around to them, and it must never block on a
/// report, or the stream would miss its `EndOfStream` terminator.
pub fn spawn_reader(
    mut reader: Box<dyn RecordReader>,
    filenames: Vec<String>,
    context: Context,
) -> (Receiver<Envelope>, Receiver<RecflowError>) {
    let (tx, rx) = bounded(READER_CHANNEL_CAPACITY);
    let (err_tx, err_rx) = unbounded();
    thread::spawn(move || {
        reader.read(&filenames, context, &tx, &err_tx);
    });
    (rx, err_rx)
}

/// Read one input handle to a string: the named file, or stdin when the
/// name list was empty.
pub(crate) fn slurp(filename: &str) -> RecflowResult<String> {
    let mut text = String::new();
    if filename == STDIN_FILENAME {
        std::io::stdin().read_to_string(&mut text)?;
    } else {
        File::open(filename)?.read_to_string(&mut text)?;
    }
    Ok(text)
}

/// The effective input file list: stdin when no names were given.
pub(crate) fn effective_filenames(filenames: &[String]) -> Vec<String> {
    if filenames.is_empty() {
        vec![STDIN_FILENAME.to_string()]
    } else {
        filenames.to_vec()
    }
}

/// Split handle text into records on the record separator, dropping the
/// trailing empty slice a final separator leaves behind.
pub(crate) fn split_lines<'a>(text: &'a str, irs: &str) -> Vec<&'a str> {
    let mut lines: Vec<&str> = text.split(irs).collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines
}
