// SPDX-License-Identifier: MIT OR Apache-2.0

//! CSV writer: header from the first record's keys; a schema change (a
//! record with different keys) emits a blank line and a fresh header, the
//! block form the CSV reader accepts back.

use std::io::Write;

use crate::core::config::WriterOptions;
use crate::core::error::RecflowResult;
use crate::core::record::Record;
use crate::core::stream::output::RecordWriter;

pub struct CsvWriter {
    ors: String,
    ofs: String,
    header: Option<Vec<String>>,
    out: Box<dyn Write + Send>,
}

impl CsvWriter {
    pub fn new(options: &WriterOptions, out: Box<dyn Write + Send>) -> CsvWriter {
        CsvWriter {
            ors: options.ors(),
            ofs: options.ofs(),
            header: None,
            out,
        }
    }

    fn write_joined<I: Iterator<Item = String>>(&mut self, items: I) -> RecflowResult<()> {
        let line = items.collect::<Vec<String>>().join(&self.ofs);
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(self.ors.as_bytes())?;
        Ok(())
    }
}

impl RecordWriter for CsvWriter {
    fn write(&mut self, record: &Record) -> RecflowResult<()> {
        let keys: Vec<String> = record.keys().cloned().collect();
        let schema_changed = match &self.header {
            Some(header) => *header != keys,
            None => false,
        };
        if schema_changed {
            self.out.write_all(self.ors.as_bytes())?;
            self.header = None;
        }
        if self.header.is_none() {
            self.write_joined(keys.iter().cloned())?;
            self.header = Some(keys);
        }
        self.write_joined(record.iter().map(|(_, value)| value.to_string()))?;
        Ok(())
    }

    fn finish(&mut self) -> RecflowResult<()> {
        self.out.flush()?;
        Ok(())
    }
}
