// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tail`: buffer the stream and emit the last N records at end-of-stream.

use std::collections::VecDeque;

use clap::Parser;
use crossbeam_channel::Sender;

use crate::core::config::Options;
use crate::core::error::RecflowResult;
use crate::core::record::Envelope;
use crate::core::transform::{parse_with, RecordTransformer};

pub const VERB: &str = "tail";

#[derive(Parser, Debug)]
#[command(name = VERB, about = "Passes through the last n records")]
struct TailArgs {
    /// Number of records to retain
    #[arg(short = 'n', value_name = "COUNT", default_value_t = 10)]
    count: usize,

    #[arg(value_name = "FILES")]
    files: Vec<String>,
}

pub fn parse(
    args: &[String],
    _main_options: &Options,
) -> RecflowResult<(Box<dyn RecordTransformer>, Vec<String>)> {
    let parsed: TailArgs = parse_with(VERB, args)?;
    Ok((
        Box::new(TailTransformer {
            count: parsed.count,
            buffer: VecDeque::new(),
        }),
        parsed.files,
    ))
}

struct TailTransformer {
    count: usize,
    buffer: VecDeque<Envelope>,
}

impl RecordTransformer for TailTransformer {
    fn transform(&mut self, envelope: Envelope, out: &Sender<Envelope>) {
        match &envelope {
            Envelope::Record(..) => {
                if self.buffer.len() == self.count {
                    self.buffer.pop_front();
                }
                if self.count > 0 {
                    self.buffer.push_back(envelope);
                }
            }
            Envelope::EndOfStream(_) => {
                for retained in self.buffer.drain(..) {
                    let _ = out.send(retained);
                }
                let _ = out.send(envelope);
            }
            Envelope::SideOutput(..) => {
                let _ = out.send(envelope);
            }
        }
    }
}
