// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON reader: a top-level array of objects, a single object, or a
//! concatenated sequence of either. Field order inside objects is
//! preserved end to end (`preserve_order`).

use crossbeam_channel::Sender;

use crate::core::error::RecflowError;
use crate::core::record::{Context, Envelope, Record, Value};
use crate::core::stream::input::{effective_filenames, slurp, RecordReader};

#[derive(Default)]
pub struct JsonReader;

impl JsonReader {
    pub fn new() -> JsonReader {
        JsonReader
    }

    fn emit_object(
        fields: &serde_json::Map<String, serde_json::Value>,
        context: &mut Context,
        tx: &Sender<Envelope>,
    ) -> bool {
        let record: Record = fields
            .iter()
            .map(|(key, value)| (key.clone(), Value::from_json(value)))
            .collect();
        context.update_for_input_record();
        tx.send(Envelope::record(record, context.clone())).is_ok()
    }
}

impl RecordReader for JsonReader {
    fn read(
        &mut self,
        filenames: &[String],
        mut context: Context,
        tx: &Sender<Envelope>,
        err_tx: &Sender<RecflowError>,
    ) {
        'files: for filename in effective_filenames(filenames) {
            let text = match slurp(&filename) {
                Ok(text) => text,
                Err(err) => {
                    let _ = err_tx.send(RecflowError::format(&filename, err.to_string()));
                    continue;
                }
            };
            context.update_for_start_of_file(&filename);

            for item in serde_json::Deserializer::from_str(&text).into_iter::<serde_json::Value>()
            {
                let item = match item {
                    Ok(item) => item,
                    Err(err) => {
                        let _ = err_tx.send(RecflowError::format(&filename, err.to_string()));
                        break 'files;
                    }
                };
                match item {
                    serde_json::Value::Object(fields) => {
                        if !Self::emit_object(&fields, &mut context, tx) {
                            return;
                        }
                    }
                    serde_json::Value::Array(items) => {
                        for element in items {
                            match element {
                                serde_json::Value::Object(fields) => {
                                    if !Self::emit_object(&fields, &mut context, tx) {
                                        return;
                                    }
                                }
                                other => {
                                    let _ = err_tx.send(RecflowError::format(
                                        &filename,
                                        format!("non-object array element: {other}"),
                                    ));
                                    break 'files;
                                }
                            }
                        }
                    }
                    other => {
                        let _ = err_tx.send(RecflowError::format(
                            &filename,
                            format!("top-level JSON item is not an object or array: {other}"),
                        ));
                        break 'files;
                    }
                }
            }
        }
        let _ = tx.send(Envelope::EndOfStream(context));
    }
}
