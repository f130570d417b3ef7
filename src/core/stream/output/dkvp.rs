// SPDX-License-Identifier: MIT OR Apache-2.0

//! DKVP writer: `a=1,b=2,c=3` per record.

use std::io::Write;

use crate::core::config::WriterOptions;
use crate::core::error::RecflowResult;
use crate::core::record::Record;
use crate::core::stream::output::RecordWriter;

pub struct DkvpWriter {
    ors: String,
    ofs: String,
    ops: String,
    out: Box<dyn Write + Send>,
}

impl DkvpWriter {
    pub fn new(options: &WriterOptions, out: Box<dyn Write + Send>) -> DkvpWriter {
        DkvpWriter {
            ors: options.ors(),
            ofs: options.ofs(),
            ops: options.ops(),
            out,
        }
    }
}

impl RecordWriter for DkvpWriter {
    fn write(&mut self, record: &Record) -> RecflowResult<()> {
        let mut line = String::new();
        for (i, (key, value)) in record.iter().enumerate() {
            if i > 0 {
                line.push_str(&self.ofs);
            }
            line.push_str(key);
            line.push_str(&self.ops);
            line.push_str(&value.to_string());
        }
        line.push_str(&self.ors);
        self.out.write_all(line.as_bytes())?;
        Ok(())
    }

    fn finish(&mut self) -> RecflowResult<()> {
        self.out.flush()?;
        Ok(())
    }
}
