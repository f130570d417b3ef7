// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON writer: records as a top-level array of objects.

use std::io::Write;

use crate::core::error::RecflowResult;
use crate::core::record::Record;
use crate::core::stream::output::RecordWriter;

pub struct JsonWriter {
    wrote_any: bool,
    out: Box<dyn Write + Send>,
}

impl JsonWriter {
    pub fn new(out: Box<dyn Write + Send>) -> JsonWriter {
        JsonWriter {
            wrote_any: false,
            out,
        }
    }
}

impl RecordWriter for JsonWriter {
    fn write(&mut self, record: &Record) -> RecflowResult<()> {
        let prefix = if self.wrote_any { ",\n" } else { "[\n" };
        self.out.write_all(prefix.as_bytes())?;
        self.wrote_any = true;

        let mut fields = serde_json::Map::new();
        for (key, value) in record.iter() {
            fields.insert(key.clone(), value.to_json());
        }
        let rendered = serde_json::to_string_pretty(&serde_json::Value::Object(fields))
            .map_err(|err| crate::core::error::RecflowError::runtime(err.to_string()))?;
        self.out.write_all(rendered.as_bytes())?;
        Ok(())
    }

    fn finish(&mut self) -> RecflowResult<()> {
        if self.wrote_any {
            self.out.write_all(b"\n]\n")?;
        } else {
            self.out.write_all(b"[\n]\n")?;
        }
        self.out.flush()?;
        Ok(())
    }
}
