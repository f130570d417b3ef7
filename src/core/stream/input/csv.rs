// SPDX-License-Identifier: MIT OR Apache-2.0

//! Header-based CSV reader (separator-split, no quoting).
//!
//! The first line of each file is the header; each data line must have the
//! same field count. A blank line ends the current schema block and the
//! next non-blank line is taken as a fresh header, matching the writer's
//! schema-change output.

use crossbeam_channel::Sender;

use crate::core::config::ReaderOptions;
use crate::core::error::RecflowError;
use crate::core::record::{Context, Envelope, Record, Value};
use crate::core::stream::input::{effective_filenames, slurp, split_lines, RecordReader};

pub struct CsvReader {
    irs: String,
    ifs: String,
}

impl CsvReader {
    pub fn new(options: &ReaderOptions) -> CsvReader {
        CsvReader {
            irs: options.irs(),
            ifs: options.ifs(),
        }
    }

    fn process_file(
        &self,
        filename: &str,
        text: &str,
        context: &mut Context,
        tx: &Sender<Envelope>,
        err_tx: &Sender<RecflowError>,
    ) -> bool {
        let mut header: Option<Vec<String>> = None;
        for line in split_lines(text, &self.irs) {
            if line.is_empty() {
                header = None;
                continue;
            }
            let fields: Vec<&str> = line.split(self.ifs.as_str()).collect();
            match &header {
                None => {
                    header = Some(fields.iter().map(|s| s.to_string()).collect());
                }
                Some(keys) => {
                    if fields.len() != keys.len() {
                        let _ = err_tx.send(RecflowError::format(
                            filename,
                            format!(
                                "data line has {} fields; header has {}",
                                fields.len(),
                                keys.len()
                            ),
                        ));
                        return false;
                    }
                    let record: Record = keys
                        .iter()
                        .cloned()
                        .zip(fields.iter().map(|v| Value::from_inferred(v)))
                        .collect();
                    context.update_for_input_record();
                    if tx.send(Envelope::record(record, context.clone())).is_err() {
                        return false;
                    }
                }
            }
        }
        true
    }
}

impl RecordReader for CsvReader {
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
            if !self.process_file(&filename, &text, &mut context, tx, err_tx) {
                break;
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

    fn read_all(contents: &str) -> (Vec<Envelope>, Vec<RecflowError>) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        let filename = file.path().to_string_lossy().to_string();

        let mut reader = CsvReader::new(&ReaderOptions {
            format: "csv".to_string(),
            ..ReaderOptions::default()
        });
        let (tx, rx) = unbounded();
        let (err_tx, err_rx) = unbounded();
        reader.read(
            &[filename],
            Context::new(Separators::default()),
            &tx,
            &err_tx,
        );
        (rx.try_iter().collect(), err_rx.try_iter().collect())
    }

    #[test]
    fn test_header_named_fields() {
        let (envelopes, errors) = read_all("id,name\n1,a\n2,b\n");
        assert!(errors.is_empty());
        assert_eq!(envelopes.len(), 3);
        let record = envelopes[1].as_record().unwrap();
        assert_eq!(record.get("id"), Some(&Value::Int(2)));
        assert_eq!(record.get("name"), Some(&Value::String("b".into())));
    }

    #[test]
    fn test_schema_change_after_blank_line() {
        let (envelopes, errors) = read_all("id\n1\n\nname\nx\n");
        assert!(errors.is_empty());
        let record = envelopes[1].as_record().unwrap();
        assert_eq!(record.get("name"), Some(&Value::String("x".into())));
    }

    #[test]
    fn test_ragged_line_is_an_error() {
        let (envelopes, errors) = read_all("id,name\n1\n");
        assert_eq!(errors.len(), 1);
        assert!(envelopes.last().unwrap().is_end_of_stream());
    }
}
