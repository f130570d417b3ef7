// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line front end.
//!
//! The grammar is positional, not flag-driven:
//!
//! ```text
//! recflow [global options] verb [verb options] {then verb [verb options]}... [files...]
//! ```
//!
//! Global options are scanned left to right until the first token that is
//! not a recognized global flag; that token must be a verb name. The rest
//! of the line is split on the keyword `then` into verb segments, each
//! parsed by its verb's own clap definition. Only the last segment may
//! carry trailing input file names.

use crate::core::config::{decode_separator, Options, FORMAT_CSV, FORMAT_DKVP, FORMAT_JSON};
use crate::core::error::{RecflowError, RecflowResult};
use crate::core::transform::{RecordTransformer, TransformerRegistry};

/// The `then` keyword separating verbs in a chain.
pub const CHAIN_KEYWORD: &str = "then";

/// A fully parsed command line, ready to hand to the runner.
pub struct Command {
    pub options: Options,
    pub transformers: Vec<Box<dyn RecordTransformer>>,
    pub filenames: Vec<String>,
}

/// Parse argv (without the program name) into a runnable command.
pub fn parse(args: &[String], registry: &TransformerRegistry) -> RecflowResult<Command> {
    let mut options = Options::default();
    let rest = parse_global_options(args, &mut options)?;

    if rest.is_empty() {
        return Err(usage_error(registry, "no verb given"));
    }

    let mut transformers = Vec::new();
    let mut filenames = Vec::new();
    let segments: Vec<&[String]> = rest.split(|token| token == CHAIN_KEYWORD).collect();
    let last = segments.len() - 1;

    for (i, segment) in segments.iter().enumerate() {
        let Some((verb, verb_args)) = segment.split_first() else {
            return Err(usage_error(registry, "empty verb segment"));
        };
        let Some(setup) = registry.lookup(verb) else {
            return Err(usage_error(registry, &format!("unknown verb \"{verb}\"")));
        };
        let (transformer, segment_files) = (setup.parse)(verb_args, &options)?;
        if !segment_files.is_empty() && i != last {
            return Err(RecflowError::configuration(format!(
                "extra arguments {segment_files:?} in mid-chain verb \"{verb}\"; \
input file names go after the last verb",
            )));
        }
        transformers.push(transformer);
        filenames = segment_files;
    }

    Ok(Command {
        options,
        transformers,
        filenames,
    })
}

/// Consume recognized global flags from the front of argv; returns the
/// remaining tokens (the verb chain).
fn parse_global_options<'a>(
    args: &'a [String],
    options: &mut Options,
) -> RecflowResult<&'a [String]> {
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();

        // Zero-argument format shorthands.
        match flag {
            "--idkvp" => set_input_format(options, FORMAT_DKVP),
            "--icsv" => set_input_format(options, FORMAT_CSV),
            "--ijson" => set_input_format(options, FORMAT_JSON),
            "--odkvp" => options.writer.format = FORMAT_DKVP.to_string(),
            "--ocsv" => options.writer.format = FORMAT_CSV.to_string(),
            "--ojson" => options.writer.format = FORMAT_JSON.to_string(),
            "--dkvp" => set_both_formats(options, FORMAT_DKVP),
            "--csv" => set_both_formats(options, FORMAT_CSV),
            "--json" => set_both_formats(options, FORMAT_JSON),
            _ => {
                // One-argument globals.
                let Some(value) = one_argument_flag(flag) else {
                    break;
                };
                i += 1;
                let Some(argument) = args.get(i) else {
                    return Err(RecflowError::missing_parameter(flag));
                };
                value(options, argument.clone());
            }
        }
        i += 1;
    }
    Ok(&args[i..])
}

type GlobalSetter = fn(&mut Options, String);

fn one_argument_flag(flag: &str) -> Option<GlobalSetter> {
    match flag {
        "-i" => Some(|opts, v| set_input_format(opts, &v)),
        "-o" => Some(|opts, v| opts.writer.format = v),
        "--io" => Some(|opts, v| {
            set_both_formats(opts, &v);
        }),
        "--irs" => Some(|opts, v| opts.reader.irs = Some(decode_separator(&v))),
        "--ifs" => Some(|opts, v| opts.reader.ifs = Some(decode_separator(&v))),
        "--ips" => Some(|opts, v| opts.reader.ips = Some(decode_separator(&v))),
        "--ors" => Some(|opts, v| opts.writer.ors = Some(decode_separator(&v))),
        "--ofs" => Some(|opts, v| opts.writer.ofs = Some(decode_separator(&v))),
        "--ops" => Some(|opts, v| opts.writer.ops = Some(decode_separator(&v))),
        "--rs" => Some(|opts, v| {
            let v = decode_separator(&v);
            opts.reader.irs = Some(v.clone());
            opts.writer.ors = Some(v);
        }),
        "--fs" => Some(|opts, v| {
            let v = decode_separator(&v);
            opts.reader.ifs = Some(v.clone());
            opts.writer.ofs = Some(v);
        }),
        "--ps" => Some(|opts, v| {
            let v = decode_separator(&v);
            opts.reader.ips = Some(v.clone());
            opts.writer.ops = Some(v);
        }),
        _ => None,
    }
}

fn set_input_format(options: &mut Options, format: &str) {
    options.reader.format = format.to_string();
}

fn set_both_formats(options: &mut Options, format: &str) {
    options.reader.format = format.to_string();
    options.writer.format = format.to_string();
}

fn usage_error(registry: &TransformerRegistry, message: &str) -> RecflowError {
    RecflowError::configuration(format!(
        "{message}\nusage: recflow [global options] verb [verb options] \
{{then verb [verb options]}}... [files...]\nverbs: {}",
        registry.verb_names().join(" "),
    ))
}
