// SPDX-License-Identifier: MIT OR Apache-2.0

//! `head`: pass the first N records, drop the rest.
//!
//! There is no upstream cancellation in this pipeline, so once the count
//! is reached remaining records are consumed and discarded; the reader
//! still runs the input to completion.

use clap::Parser;
use crossbeam_channel::Sender;

use crate::core::config::Options;
use crate::core::error::RecflowResult;
use crate::core::record::Envelope;
use crate::core::transform::{parse_with, RecordTransformer};

pub const VERB: &str = "head";

#[derive(Parser, Debug)]
#[command(name = VERB, about = "Passes through the first n records")]
struct HeadArgs {
    /// Number of records to pass through
    #[arg(short = 'n', value_name = "COUNT", default_value_t = 10)]
    count: u64,

    #[arg(value_name = "FILES")]
    files: Vec<String>,
}

pub fn parse(
    args: &[String],
    _main_options: &Options,
) -> RecflowResult<(Box<dyn RecordTransformer>, Vec<String>)> {
    let parsed: HeadArgs = parse_with(VERB, args)?;
    Ok((
        Box::new(HeadTransformer {
            count: parsed.count,
            seen: 0,
        }),
        parsed.files,
    ))
}

struct HeadTransformer {
    count: u64,
    seen: u64,
}

impl RecordTransformer for HeadTransformer {
    fn transform(&mut self, envelope: Envelope, out: &Sender<Envelope>) {
        match &envelope {
            Envelope::Record(..) => {
                if self.seen < self.count {
                    self.seen += 1;
                    let _ = out.send(envelope);
                }
            }
            _ => {
                let _ = out.send(envelope);
            }
        }
    }
}
