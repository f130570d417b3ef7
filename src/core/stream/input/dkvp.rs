// SPDX-License-Identifier: MIT OR Apache-2.0

//! DKVP (delimited key-value pair) reader: `a=1,b=2,c=3` per line.
//!
//! A field without a pair separator gets its 1-based position as its key,
//! so positional data degrades gracefully rather than erroring.

use crossbeam_channel::Sender;

use crate::core::config::ReaderOptions;
use crate::core::error::RecflowError;
use crate::core::record::{Context, Envelope, Record, Value};
use crate::core::stream::input::{effective_filenames, slurp, split_lines, RecordReader};

pub struct DkvpReader {
    irs: String,
    ifs: String,
    ips: String,
}

impl DkvpReader {
    pub fn new(options: &ReaderOptions) -> DkvpReader {
        DkvpReader {
            irs: options.irs(),
            ifs: options.ifs(),
            ips: options.ips(),
        }
    }

    fn parse_line(&self, line: &str) -> Record {
        let mut record = Record::new();
        for (i, field) in line.split(self.ifs.as_str()).enumerate() {
            match field.split_once(self.ips.as_str()) {
                Some((key, value)) => {
                    record.put(key.to_string(), Value::from_inferred(value));
                }
                None => {
                    record.put((i + 1).to_string(), Value::from_inferred(field));
                }
            }
        }
        record
    }
}

impl RecordReader for DkvpReader {
    fn read(
        &mut self,
        filenames: &[String],
        mut context: Context,
        tx: &Sender<Envelope>,
        err_tx: &Sender<RecflowError>,
    ) {
        for filename in effective_filenames(filenames) {
            let text = match slurp(&filename) {
                Ok(text) => text,
                Err(err) => {
                    let _ = err_tx.send(RecflowError::format(&filename, err.to_string()));
                    continue;
                }
            };
            context.update_for_start_of_file(&filename);
            for line in split_lines(&text, &self.irs) {
                if line.is_empty() {
                    continue;
                }
                context.update_for_input_record();
                if tx
                    .send(Envelope::record(self.parse_line(line), context.clone()))
                    .is_err()
                {
                    return;
                }
            }
        }
        let _ = tx.send(Envelope::EndOfStream(context));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::Separators;
    use crossbeam_channel::unbounded;
    use std::io::Write;

    fn read_all(contents: &str) -> Vec<Envelope> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        let filename = file.path().to_string_lossy().to_string();

        let mut reader = DkvpReader::new(&ReaderOptions::default());
        let (tx, rx) = unbounded();
        let (err_tx, _err_rx) = unbounded();
        reader.read(
            &[filename],
            Context::new(Separators::default()),
            &tx,
            &err_tx,
        );
        rx.try_iter().collect()
    }

    #[test]
    fn test_reads_records_and_terminates() {
        let envelopes = read_all("a=1,b=2\na=3,b=4\n");
        assert_eq!(envelopes.len(), 3);
        let first = envelopes[0].as_record().unwrap();
        assert_eq!(first.get("a"), Some(&Value::Int(1)));
        assert_eq!(first.get("b"), Some(&Value::Int(2)));
        assert!(envelopes[2].is_end_of_stream());
        assert_eq!(envelopes[1].context().nr, 2);
    }

    #[test]
    fn test_positional_keys_without_pair_separator() {
        let envelopes = read_all("x,y=2\n");
        let record = envelopes[0].as_record().unwrap();
        assert_eq!(record.get("1"), Some(&Value::String("x".into())));
        assert_eq!(record.get("y"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_missing_file_reports_error_and_still_terminates() {
        let mut reader = DkvpReader::new(&ReaderOptions::default());
        let (tx, rx) = unbounded();
        let (err_tx, err_rx) = unbounded();
        reader.read(
            &["/no/such/file.dkvp".to_string()],
            Context::new(Separators::default()),
            &tx,
            &err_tx,
        );
        assert!(err_rx.try_recv().is_ok());
        let envelopes: Vec<Envelope> = rx.try_iter().collect();
        assert_eq!(envelopes.len(), 1);
        assert!(envelopes[0].is_end_of_stream());
    }
}
