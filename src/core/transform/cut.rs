// SPDX-License-Identifier: MIT OR Apache-2.0

//! `cut`: project records onto a field list, or its complement.

use clap::Parser;
use crossbeam_channel::Sender;

use crate::core::config::Options;
use crate::core::error::RecflowResult;
use crate::core::record::{Envelope, Record};
use crate::core::transform::{parse_with, RecordTransformer};

pub const VERB: &str = "cut";

#[derive(Parser, Debug)]
#[command(name = VERB, about = "Passes through input records with only specified fields")]
struct CutArgs {
    /// Comma-separated field names to retain (or exclude, with -x)
    #[arg(short = 'f', value_name = "a,b,c", value_delimiter = ',', required = true)]
    fields: Vec<String>,

    /// Exclude the named fields instead of retaining them
    #[arg(short = 'x')]
    complement: bool,

    /// Retain fields in the order given by -f, not record order
    #[arg(short = 'o')]
    argument_order: bool,

    #[arg(value_name = "FILES")]
    files: Vec<String>,
}

pub fn parse(
    args: &[String],
    _main_options: &Options,
) -> RecflowResult<(Box<dyn RecordTransformer>, Vec<String>)> {
    let parsed: CutArgs = parse_with(VERB, args)?;
    if parsed.complement && parsed.argument_order {
        return Err(crate::core::error::RecflowError::configuration(
            "cut: -o is meaningless with -x",
        ));
    }
    Ok((
        Box::new(CutTransformer {
            fields: parsed.fields,
            complement: parsed.complement,
            argument_order: parsed.argument_order,
        }),
        parsed.files,
    ))
}

struct CutTransformer {
    fields: Vec<String>,
    complement: bool,
    argument_order: bool,
}

impl CutTransformer {
    fn project(&self, record: &Record) -> Record {
        if self.complement {
            record
                .iter()
                .filter(|(key, _)| !self.fields.contains(*key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        } else if self.argument_order {
            self.fields
                .iter()
                .filter_map(|name| record.get(name).map(|v| (name.clone(), v.clone())))
                .collect()
        } else {
            record
                .iter()
                .filter(|(key, _)| self.fields.contains(*key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        }
    }
}

impl RecordTransformer for CutTransformer {
    fn transform(&mut self, envelope: Envelope, out: &Sender<Envelope>) {
        match envelope {
            Envelope::Record(record, context) => {
                let _ = out.send(Envelope::record(self.project(&record), context));
            }
            other => {
                let _ = out.send(other);
            }
        }
    }
}
