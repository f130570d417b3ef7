// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transformers (verbs) and the verb registry.
//!
//! A transformer is one stage of the pipeline. It consumes one envelope
//! per call and writes zero or more envelopes to its output channel. A
//! transformer may retain envelopes across calls (sorting, joining,
//! tailing); when the end-of-stream envelope arrives it must flush any
//! retained output and then forward that envelope, exactly once, as the
//! last thing it does.

pub mod cat;
pub mod cut;
pub mod head;
pub mod join;
pub mod tail;

use crossbeam_channel::Sender;

use crate::core::config::Options;
use crate::core::error::{RecflowError, RecflowResult};
use crate::core::record::Envelope;

/// One pipeline stage. Each instance is owned by exactly one worker
/// thread for its entire lifetime, so implementations need no internal
/// synchronization.
pub trait RecordTransformer: Send {
    fn transform(&mut self, envelope: Envelope, out: &Sender<Envelope>);
}

/// Parse one verb's argument segment into a transformer.
///
/// `args` is the segment between the verb name and the next `then` (or
/// end of line); trailing non-flag arguments are returned as input file
/// names (only the last verb in a chain may have them).
pub type VerbParser =
    fn(args: &[String], main_options: &Options) -> RecflowResult<(Box<dyn RecordTransformer>, Vec<String>)>;

/// One registry entry: a verb name and its parser.
pub struct VerbSetup {
    pub verb: &'static str,
    pub parse: VerbParser,
}

/// The verb lookup table, built once at process start and passed to the
/// CLI by reference.
pub struct TransformerRegistry {
    entries: Vec<VerbSetup>,
}

impl TransformerRegistry {
    /// The standard verb set.
    pub fn standard() -> TransformerRegistry {
        TransformerRegistry {
            entries: vec![
                VerbSetup {
                    verb: cat::VERB,
                    parse: cat::parse,
                },
                VerbSetup {
                    verb: cut::VERB,
                    parse: cut::parse,
                },
                VerbSetup {
                    verb: head::VERB,
                    parse: head::parse,
                },
                VerbSetup {
                    verb: join::VERB,
                    parse: join::parse,
                },
                VerbSetup {
                    verb: tail::VERB,
                    parse: tail::parse,
                },
            ],
        }
    }

    pub fn lookup(&self, verb: &str) -> Option<&VerbSetup> {
        self.entries.iter().find(|entry| entry.verb == verb)
    }

    pub fn verb_names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|entry| entry.verb).collect()
    }
}

/// Parse a verb segment with the verb's clap definition, mapping parse
/// failures (including `--help` requests) to configuration errors whose
/// message is clap's rendered usage text.
pub(crate) fn parse_with<A: clap::Parser>(
    verb: &'static str,
    args: &[String],
) -> RecflowResult<A> {
    let argv = std::iter::once(verb.to_string()).chain(args.iter().cloned());
    A::try_parse_from(argv).map_err(|err| RecflowError::configuration(err.to_string()))
}
