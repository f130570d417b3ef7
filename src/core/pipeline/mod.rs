// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transformer-chain wiring.
//!
//! The chain is a box that reads envelopes from the record-reader channel
//! and writes them to the record-writer channel. Inside the box, each of
//! the N transformers runs on its own worker thread, connected by N−1
//! freshly allocated bounded channels:
//!
//!   reader ─> [ transformer 0 ─> transformer 1 ─> ... ─> transformer N−1 ] ─> writer
//!
//! The small channel bound gives natural backpressure: a slow downstream
//! stage blocks its upstream producers without unbounded queueing. There
//! is no cancellation path; a fatal error anywhere terminates the process.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::core::record::Envelope;
use crate::core::transform::RecordTransformer;

/// Capacity of the channels between adjacent transformers.
pub const STAGE_CHANNEL_CAPACITY: usize = 1;

/// Wire N transformers between an input and an output channel and start
/// one worker thread per transformer. Returns the worker handles; the
/// caller drains the output channel and then joins them.
pub fn run_chain(
    input: Receiver<Envelope>,
    transformers: Vec<Box<dyn RecordTransformer>>,
    output: Sender<Envelope>,
) -> Vec<JoinHandle<()>> {
    let n = transformers.len();
    if n == 0 {
        // Degenerate chain: pipe input straight to output.
        return vec![thread::spawn(move || {
            for envelope in input.iter() {
                let end_of_stream = envelope.is_end_of_stream();
                if output.send(envelope).is_err() || end_of_stream {
                    break;
                }
            }
        })];
    }

    let mut handles = Vec::with_capacity(n);
    let mut upstream = input;
    for (i, transformer) in transformers.into_iter().enumerate() {
        if i == n - 1 {
            handles.push(spawn_worker(transformer, upstream, output));
            break;
        }
        let (tx, rx) = bounded(STAGE_CHANNEL_CAPACITY);
        handles.push(spawn_worker(transformer, upstream, tx));
        upstream = rx;
    }

    handles
}

fn spawn_worker(
    mut transformer: Box<dyn RecordTransformer>,
    input: Receiver<Envelope>,
    output: Sender<Envelope>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        for envelope in input.iter() {
            let end_of_stream = envelope.is_end_of_stream();
            match envelope {
                // Side-channel text carries no record: forward it without
                // invoking the transformer so record output and printed
                // text stay in their original relative order.
                Envelope::SideOutput(..) => {
                    let _ = output.send(envelope);
                }
                _ => transformer.transform(envelope, &output),
            }
            if end_of_stream {
                break;
            }
        }
    })
}
