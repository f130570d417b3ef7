// SPDX-License-Identifier: MIT OR Apache-2.0

//! `join`: joins records from a left file with records from the main
//! input stream, like the system `join` command but for record streams.
//!
//! Two mutually exclusive algorithms, fixed at construction:
//!
//! * **Half-streaming** (default, unsorted input): the entire left file
//!   is read into buckets keyed by the left join-field values on the
//!   first call, then each right record is matched against them.
//! * **Doubly-streaming** (`-s`, sorted input): a [`JoinBucketKeeper`]
//!   cursor steps the left file forward in lockstep with the right
//!   stream, holding one bucket at a time. This trades the sortedness
//!   obligation for bounded memory.

pub mod bucket;
pub mod keeper;

pub use bucket::{BucketsByKey, JoinBucket};
pub use keeper::JoinBucketKeeper;

use std::collections::HashSet;

use clap::Parser;
use crossbeam_channel::{never, select, Sender};

use crate::core::config::{decode_separator, Options, ReaderOptions};
use crate::core::error::{fatal, RecflowError, RecflowResult};
use crate::core::record::{Context, Envelope, Record, Separators};
use crate::core::stream::input::{self, spawn_reader};
use crate::core::transform::{parse_with, RecordTransformer};

pub const VERB: &str = "join";

#[derive(Parser, Debug)]
#[command(
    name = VERB,
    about = "Joins records from the left file with records from the main input stream",
    long_about = "Joins records from the left file name with records from the main input \
stream. Functionality is essentially the same as the system \"join\" command, but for \
record streams. Left-file format options default to those of the main input but may be \
overridden with -i/--irs/--ifs/--ips after the verb name."
)]
struct JoinArgs {
    /// Left file name
    #[arg(short = 'f', value_name = "FILE", required = true)]
    left_file: String,

    /// Comma-separated join-field names for output
    #[arg(short = 'j', value_name = "a,b,c", value_delimiter = ',', required = true)]
    output_fields: Vec<String>,

    /// Comma-separated join-field names for the left file; defaults to -j values
    #[arg(short = 'l', value_name = "a,b,c", value_delimiter = ',')]
    left_fields: Vec<String>,

    /// Comma-separated join-field names for the right input; defaults to -j values
    #[arg(short = 'r', value_name = "a,b,c", value_delimiter = ',')]
    right_fields: Vec<String>,

    /// Additional prefix for non-join output field names from the left file
    #[arg(long = "lp", value_name = "TEXT", default_value = "")]
    left_prefix: String,

    /// Additional prefix for non-join output field names from the right input
    #[arg(long = "rp", value_name = "TEXT", default_value = "")]
    right_prefix: String,

    /// Do not emit paired records
    #[arg(long = "np")]
    no_pairs: bool,

    /// Emit unpaired records from the left file
    #[arg(long = "ul")]
    emit_left_unpairables: bool,

    /// Emit unpaired records from the right input
    #[arg(long = "ur")]
    emit_right_unpairables: bool,

    /// Enable unsorted input (the default even without -u): the entire
    /// left file is loaded into memory
    #[arg(short = 'u')]
    unsorted: bool,

    /// Require sorted input: both sides must be sorted lexically by their
    /// join-field names, else not all records will be paired
    #[arg(short = 's', long = "sorted-input")]
    sorted_input: bool,

    /// Left-file input format override
    #[arg(short = 'i', value_name = "FORMAT")]
    input_format: Option<String>,

    /// Left-file record-separator override
    #[arg(long = "irs", value_name = "SEP")]
    irs: Option<String>,

    /// Left-file field-separator override
    #[arg(long = "ifs", value_name = "SEP")]
    ifs: Option<String>,

    /// Left-file pair-separator override
    #[arg(long = "ips", value_name = "SEP")]
    ips: Option<String>,

    #[arg(value_name = "FILES")]
    files: Vec<String>,
}

/// The join verb's option bag, validated before any record is read.
#[derive(Debug, Clone)]
pub struct JoinOptions {
    pub left_prefix: String,
    pub right_prefix: String,

    pub output_join_field_names: Vec<String>,
    pub left_join_field_names: Vec<String>,
    pub right_join_field_names: Vec<String>,

    pub allow_unsorted_input: bool,
    pub emit_pairables: bool,
    pub emit_left_unpairables: bool,
    pub emit_right_unpairables: bool,

    pub left_file_name: String,
    /// Reader options for the left file; defaults to the main input's.
    pub reader_options: ReaderOptions,
}

impl JoinOptions {
    /// Minimal useful configuration: inner join on the given fields, left
    /// file in the main input's format. Used directly by tests; the CLI
    /// path goes through [`parse`].
    pub fn new(left_file_name: impl Into<String>, join_field_names: Vec<String>) -> JoinOptions {
        JoinOptions {
            left_prefix: String::new(),
            right_prefix: String::new(),
            output_join_field_names: join_field_names.clone(),
            left_join_field_names: join_field_names.clone(),
            right_join_field_names: join_field_names,
            allow_unsorted_input: true,
            emit_pairables: true,
            emit_left_unpairables: false,
            emit_right_unpairables: false,
            left_file_name: left_file_name.into(),
            reader_options: ReaderOptions::default(),
        }
    }

    fn validate(&self) -> RecflowResult<()> {
        if self.left_file_name.is_empty() {
            return Err(RecflowError::missing_parameter("join: -f (left file name)"));
        }
        if self.output_join_field_names.is_empty() {
            return Err(RecflowError::missing_parameter("join: -j (output field names)"));
        }
        if !self.emit_pairables && !self.emit_left_unpairables && !self.emit_right_unpairables {
            return Err(RecflowError::configuration(
                "join: all emit flags are unset; no output is possible",
            ));
        }
        let llen = self.left_join_field_names.len();
        let rlen = self.right_join_field_names.len();
        let olen = self.output_join_field_names.len();
        if llen != rlen || llen != olen {
            return Err(RecflowError::configuration(format!(
                "join: must have equal left,right,output field-name lists; got lengths {llen},{rlen},{olen}",
            )));
        }
        Ok(())
    }

    /// Initial context for the left file's own reader.
    fn left_initial_context(&self) -> Context {
        let separators = Separators {
            irs: self.reader_options.irs(),
            ifs: self.reader_options.ifs(),
            ips: self.reader_options.ips(),
            ..Separators::default()
        };
        let mut context = Context::new(separators);
        context.update_for_start_of_file(&self.left_file_name);
        context
    }
}

pub fn parse(
    args: &[String],
    main_options: &Options,
) -> RecflowResult<(Box<dyn RecordTransformer>, Vec<String>)> {
    let parsed: JoinArgs = parse_with(VERB, args)?;

    let output_fields = parsed.output_fields;
    let left_fields = if parsed.left_fields.is_empty() {
        output_fields.clone()
    } else {
        parsed.left_fields
    };
    let right_fields = if parsed.right_fields.is_empty() {
        output_fields.clone()
    } else {
        parsed.right_fields
    };

    let mut reader_options = main_options.reader.clone();
    if let Some(format) = parsed.input_format {
        reader_options.format = format;
        // Format change resets separators to that format's defaults
        // unless explicitly overridden below.
        reader_options.irs = None;
        reader_options.ifs = None;
        reader_options.ips = None;
    }
    if let Some(irs) = parsed.irs {
        reader_options.irs = Some(decode_separator(&irs));
    }
    if let Some(ifs) = parsed.ifs {
        reader_options.ifs = Some(decode_separator(&ifs));
    }
    if let Some(ips) = parsed.ips {
        reader_options.ips = Some(decode_separator(&ips));
    }

    let opts = JoinOptions {
        left_prefix: parsed.left_prefix,
        right_prefix: parsed.right_prefix,
        output_join_field_names: output_fields,
        left_join_field_names: left_fields,
        right_join_field_names: right_fields,
        allow_unsorted_input: parsed.unsorted || !parsed.sorted_input,
        emit_pairables: !parsed.no_pairs,
        emit_left_unpairables: parsed.emit_left_unpairables,
        emit_right_unpairables: parsed.emit_right_unpairables,
        left_file_name: parsed.left_file,
        reader_options,
    };

    Ok((Box::new(JoinTransformer::new(opts)?), parsed.files))
}

/// Pair formation: merges one left record with one right record under the
/// configured output names and prefixes.
struct Pairer {
    output_join_field_names: Vec<String>,
    left_join_field_names: Vec<String>,
    left_prefix: String,
    right_prefix: String,
    left_field_name_set: HashSet<String>,
    right_field_name_set: HashSet<String>,
}

impl Pairer {
    fn new(opts: &JoinOptions) -> Pairer {
        Pairer {
            output_join_field_names: opts.output_join_field_names.clone(),
            left_join_field_names: opts.left_join_field_names.clone(),
            left_prefix: opts.left_prefix.clone(),
            right_prefix: opts.right_prefix.clone(),
            left_field_name_set: opts.left_join_field_names.iter().cloned().collect(),
            right_field_name_set: opts.right_join_field_names.iter().cloned().collect(),
        }
    }

    /// Emit the cartesian product of the bucketed left records with the
    /// current right record.
    fn form_and_emit_pairs(
        &self,
        lefts: &[Envelope],
        right: &Record,
        right_context: &Context,
        out: &Sender<Envelope>,
    ) {
        for left_envelope in lefts {
            let Some(left) = left_envelope.as_record() else {
                continue;
            };
            let mut outrec = Record::new();

            // Join fields first, under the output names, with the left
            // record's values. The name lists are length-validated at
            // construction.
            for (left_name, output_name) in self
                .left_join_field_names
                .iter()
                .zip(self.output_join_field_names.iter())
            {
                if let Some(value) = left.get(left_name) {
                    outrec.put(output_name.clone(), value.clone());
                }
            }

            // Then non-join left fields, prefixed.
            for (key, value) in left.iter() {
                if !self.left_field_name_set.contains(key) {
                    outrec.put(format!("{}{}", self.left_prefix, key), value.clone());
                }
            }

            // Then non-join right fields, prefixed. Collisions with the
            // prefixed left fields are last-write-wins by design.
            for (key, value) in right.iter() {
                if !self.right_field_name_set.contains(key) {
                    outrec.put(format!("{}{}", self.right_prefix, key), value.clone());
                }
            }

            // NR/FILENAME continuity follows the streaming (right) side.
            let _ = out.send(Envelope::record(outrec, right_context.clone()));
        }
    }
}

enum JoinMode {
    HalfStreaming {
        ingested: bool,
        buckets: BucketsByKey,
        left_unpairables: Vec<Envelope>,
    },
    DoublyStreaming(JoinBucketKeeper),
}

pub struct JoinTransformer {
    opts: JoinOptions,
    pairer: Pairer,
    mode: JoinMode,
}

impl JoinTransformer {
    pub fn new(opts: JoinOptions) -> RecflowResult<JoinTransformer> {
        opts.validate()?;
        let pairer = Pairer::new(&opts);

        let mode = if opts.allow_unsorted_input {
            // Half-streaming (default): the left file is ingested in full
            // on the first transform call, not here, so a pipeline that
            // never delivers an envelope performs no left I/O.
            JoinMode::HalfStreaming {
                ingested: false,
                buckets: BucketsByKey::new(),
                left_unpairables: Vec::new(),
            }
        } else {
            // Doubly-streaming: step the left file forward in lockstep
            // with the right stream. Requires both inputs sorted on their
            // join keys; lets joins run in bounded memory.
            let reader = input::create(&opts.reader_options)?;
            let (left_rx, left_err_rx) = spawn_reader(
                reader,
                vec![opts.left_file_name.clone()],
                opts.left_initial_context(),
            );
            JoinMode::DoublyStreaming(JoinBucketKeeper::new(
                left_rx,
                left_err_rx,
                opts.left_join_field_names.clone(),
            ))
        };

        Ok(JoinTransformer { opts, pairer, mode })
    }

    fn transform_half_streaming(&mut self, envelope: Envelope, out: &Sender<Envelope>) {
        let JoinMode::HalfStreaming {
            ingested,
            buckets,
            left_unpairables,
        } = &mut self.mode
        else {
            unreachable!("dispatched on mode");
        };

        // First call, record or end-of-stream: ingest the entire left
        // file. End-of-stream must ingest too, so that an empty right
        // stream still yields the whole left file under --ul.
        if !*ingested {
            ingest_left_file(&self.opts, buckets, left_unpairables);
            *ingested = true;
        }

        match envelope {
            Envelope::Record(record, context) => {
                match record.grouping_key(&self.opts.right_join_field_names) {
                    Some((key, _)) => match buckets.get_mut(&key) {
                        Some(left_bucket) => {
                            left_bucket.was_paired = true;
                            if self.opts.emit_pairables {
                                self.pairer.form_and_emit_pairs(
                                    &left_bucket.records,
                                    &record,
                                    &context,
                                    out,
                                );
                            }
                        }
                        None => {
                            if self.opts.emit_right_unpairables {
                                let _ = out.send(Envelope::Record(record, context));
                            }
                        }
                    },
                    None => {
                        // Right record lacking join fields is unpairable.
                        if self.opts.emit_right_unpairables {
                            let _ = out.send(Envelope::Record(record, context));
                        }
                    }
                }
            }
            Envelope::EndOfStream(_) => {
                if self.opts.emit_left_unpairables {
                    for left_envelope in buckets.drain_unpaired() {
                        let _ = out.send(left_envelope);
                    }
                    for left_envelope in left_unpairables.drain(..) {
                        let _ = out.send(left_envelope);
                    }
                }
                let _ = out.send(envelope);
            }
            Envelope::SideOutput(..) => {
                let _ = out.send(envelope);
            }
        }
    }

    fn transform_doubly_streaming(&mut self, envelope: Envelope, out: &Sender<Envelope>) {
        let JoinMode::DoublyStreaming(keeper) = &mut self.mode else {
            unreachable!("dispatched on mode");
        };

        match envelope {
            Envelope::Record(record, context) => {
                let is_paired = match record.select_values(&self.opts.right_join_field_names) {
                    Some(right_values) => keeper.find_bucket(Some(&right_values)),
                    None => false,
                };

                // Left buckets the cursor advanced past are released now,
                // before this right record's own output.
                if self.opts.emit_left_unpairables {
                    keeper.output_and_release_left_unpaireds(out);
                } else {
                    keeper.release_left_unpaireds();
                }

                if is_paired {
                    if self.opts.emit_pairables {
                        self.pairer
                            .form_and_emit_pairs(&keeper.bucket.records, &record, &context, out);
                    }
                } else if self.opts.emit_right_unpairables {
                    let _ = out.send(Envelope::Record(record, context));
                }
            }
            Envelope::EndOfStream(_) => {
                keeper.find_bucket(None);
                if self.opts.emit_left_unpairables {
                    keeper.output_and_release_left_unpaireds(out);
                }
                let _ = out.send(envelope);
            }
            Envelope::SideOutput(..) => {
                let _ = out.send(envelope);
            }
        }
    }
}

impl RecordTransformer for JoinTransformer {
    fn transform(&mut self, envelope: Envelope, out: &Sender<Envelope>) {
        match self.mode {
            JoinMode::HalfStreaming { .. } => self.transform_half_streaming(envelope, out),
            JoinMode::DoublyStreaming(_) => self.transform_doubly_streaming(envelope, out),
        }
    }
}

/// Read the entire left file, bucketing records by their join-field
/// values; records lacking any join field go to the unpairable list in
/// arrival order. Runs synchronously over the reader thread's channel
/// pair; any reader error is fatal.
fn ingest_left_file(
    opts: &JoinOptions,
    buckets: &mut BucketsByKey,
    left_unpairables: &mut Vec<Envelope>,
) {
    let reader = match input::create(&opts.reader_options) {
        Ok(reader) => reader,
        Err(err) => fatal(&err),
    };
    let (left_rx, left_err_rx) = spawn_reader(
        reader,
        vec![opts.left_file_name.clone()],
        opts.left_initial_context(),
    );
    log::debug!("join: ingesting left file {}", opts.left_file_name);

    let mut left_err_rx = left_err_rx;
    let mut count: u64 = 0;
    loop {
        select! {
            recv(left_err_rx) -> msg => match msg {
                Ok(err) => fatal(&err),
                Err(_) => left_err_rx = never(),
            },
            recv(left_rx) -> msg => match msg {
                Ok(Envelope::Record(record, context)) => {
                    count += 1;
                    match record.grouping_key(&opts.left_join_field_names) {
                        Some((key, values)) => {
                            buckets.add(key, values, Envelope::Record(record, context));
                        }
                        None => left_unpairables.push(Envelope::Record(record, context)),
                    }
                }
                Ok(Envelope::EndOfStream(_)) | Err(_) => break,
                Ok(Envelope::SideOutput(..)) => {}
            },
        }
    }
    log::debug!(
        "join: left file {} ingested, {count} records",
        opts.left_file_name
    );
}
