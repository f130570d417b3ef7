// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record writers consuming the final output channel.

mod csv;
mod dkvp;
mod json;

pub use csv::CsvWriter;
pub use dkvp::DkvpWriter;
pub use json::JsonWriter;

use std::io::Write;

use crate::core::config::{WriterOptions, FORMAT_CSV, FORMAT_DKVP, FORMAT_JSON};
use crate::core::error::{RecflowError, RecflowResult};
use crate::core::record::Record;

/// A record writer: renders records to its output handle.
///
/// `finish` is called once after the end-of-stream envelope, for formats
/// with closing syntax or buffered output.
pub trait RecordWriter: Send {
    fn write(&mut self, record: &Record) -> RecflowResult<()>;

    fn finish(&mut self) -> RecflowResult<()> {
        Ok(())
    }
}

/// Instantiate a writer for the configured output format.
pub fn create(
    options: &WriterOptions,
    out: Box<dyn Write + Send>,
) -> RecflowResult<Box<dyn RecordWriter>> {
    match options.format.as_str() {
        FORMAT_DKVP => Ok(Box::new(DkvpWriter::new(options, out))),
        FORMAT_CSV => Ok(Box::new(CsvWriter::new(options, out))),
        FORMAT_JSON => Ok(Box::new(JsonWriter::new(out))),
        other => Err(RecflowError::unsupported_format(other)),
    }
}
