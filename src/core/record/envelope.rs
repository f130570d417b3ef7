// SPDX-License-Identifier: MIT OR Apache-2.0

//! The envelope flowing through pipeline channels.

use crate::core::record::{Context, Record};

/// One item on a pipeline channel.
///
/// `EndOfStream` is produced exactly once per run, by the record reader,
/// and is always the last envelope seen by any stage: every stage forwards
/// it exactly once, after flushing its own buffered output. `SideOutput`
/// carries text destined for the output stream (e.g. from a print-style
/// side effect) and is threaded through the same channels so its ordering
/// relative to records is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Record(Box<Record>, Context),
    SideOutput(String, Context),
    EndOfStream(Context),
}

impl Envelope {
    pub fn record(record: Record, context: Context) -> Envelope {
        Envelope::Record(Box::new(record), context)
    }

    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Envelope::EndOfStream(_))
    }

    /// The record payload, if this envelope carries one.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Envelope::Record(record, _) => Some(record),
            _ => None,
        }
    }

    pub fn context(&self) -> &Context {
        match self {
            Envelope::Record(_, context) => context,
            Envelope::SideOutput(_, context) => context,
            Envelope::EndOfStream(context) => context,
        }
    }
}
