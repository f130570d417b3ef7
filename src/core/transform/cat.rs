// SPDX-License-Identifier: MIT OR Apache-2.0

//! `cat`: pass records through, optionally numbering them.

use clap::Parser;
use crossbeam_channel::Sender;

use crate::core::config::Options;
use crate::core::error::RecflowResult;
use crate::core::record::{Envelope, Value};
use crate::core::transform::{parse_with, RecordTransformer};

pub const VERB: &str = "cat";

#[derive(Parser, Debug)]
#[command(name = VERB, about = "Passes input records directly to output")]
struct CatArgs {
    /// Prepend a field with the output record number
    #[arg(short = 'n')]
    number: bool,

    /// Name for the counter field
    #[arg(long = "counter-field", value_name = "NAME", default_value = "n")]
    counter_field: String,

    #[arg(value_name = "FILES")]
    files: Vec<String>,
}

pub fn parse(
    args: &[String],
    _main_options: &Options,
) -> RecflowResult<(Box<dyn RecordTransformer>, Vec<String>)> {
    let parsed: CatArgs = parse_with(VERB, args)?;
    Ok((
        Box::new(CatTransformer {
            number: parsed.number,
            counter_field: parsed.counter_field,
            counter: 0,
        }),
        parsed.files,
    ))
}

struct CatTransformer {
    number: bool,
    counter_field: String,
    counter: i64,
}

impl RecordTransformer for CatTransformer {
    fn transform(&mut self, envelope: Envelope, out: &Sender<Envelope>) {
        match envelope {
            Envelope::Record(mut record, context) => {
                if self.number {
                    self.counter += 1;
                    let mut numbered = crate::core::record::Record::new();
                    numbered.put(self.counter_field.clone(), Value::Int(self.counter));
                    for (key, value) in record.iter() {
                        numbered.put(key.clone(), value.clone());
                    }
                    *record = numbered;
                }
                let _ = out.send(Envelope::Record(record, context));
            }
            other => {
                let _ = out.send(other);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{Context, Record, Separators};
    use crossbeam_channel::unbounded;

    #[test]
    fn test_numbering_prepends_counter() {
        let (transformer, files) =
            parse(&["-n".to_string()], &Options::default()).unwrap();
        assert!(files.is_empty());
        let mut transformer = transformer;

        let (tx, rx) = unbounded();
        let ctx = Context::new(Separators::default());
        let mut record = Record::new();
        record.put("a".to_string(), Value::Int(7));
        transformer.transform(Envelope::record(record, ctx.clone()), &tx);
        transformer.transform(Envelope::EndOfStream(ctx), &tx);

        let outputs: Vec<Envelope> = rx.try_iter().collect();
        assert_eq!(outputs.len(), 2);
        let record = outputs[0].as_record().unwrap();
        let keys: Vec<&String> = record.keys().collect();
        assert_eq!(keys, ["n", "a"]);
        assert_eq!(record.get("n"), Some(&Value::Int(1)));
    }
}
