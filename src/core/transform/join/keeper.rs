// SPDX-License-Identifier: MIT OR Apache-2.0

//! The join-bucket keeper: left-side cursor for the sort-merge join.
//!
//! Both inputs must be pre-sorted lexically ascending on their join-field
//! projections — a caller-enforced precondition, not verified here. The
//! keeper holds one live bucket (all consecutive left records sharing one
//! key) plus a single peek record, and advances the left stream only when
//! the right stream's current key compares greater than the bucket's key.
//! Once the cursor has passed a key, that bucket is released (emitted as
//! left-unpaired if requested) and can never be rejoined: this is what
//! makes sortedness mandatory for correctness.
//!
//! State machine over (bucket key, peek, leof):
//!   (0) prefill:     no bucket key, not at left EOF
//!   (1) full:        bucket key set, peek record present
//!   (2) last bucket: bucket key set, no peek (left EOF behind it)
//!   (3) eof:         no bucket key, left EOF

use std::cmp::Ordering;
use std::collections::VecDeque;

use crossbeam_channel::{never, select, Receiver, Sender};

use crate::core::error::{fatal, RecflowError};
use crate::core::record::value::compare_lexically;
use crate::core::record::{Envelope, Value};
use crate::core::transform::join::bucket::JoinBucket;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeeperState {
    Prefill,
    Full,
    LastBucket,
    Eof,
}

pub struct JoinBucketKeeper {
    // Left-stream source: record channel plus error channel from the
    // reader thread spawned by the join transformer.
    left_rx: Receiver<Envelope>,
    left_err_rx: Receiver<RecflowError>,
    reader_done: bool,

    left_field_names: Vec<String>,

    peek: Option<Envelope>,
    pub bucket: JoinBucket,
    left_unpaireds: VecDeque<Envelope>,

    leof: bool,
    state: KeeperState,
}

impl JoinBucketKeeper {
    pub fn new(
        left_rx: Receiver<Envelope>,
        left_err_rx: Receiver<RecflowError>,
        left_field_names: Vec<String>,
    ) -> JoinBucketKeeper {
        JoinBucketKeeper {
            left_rx,
            left_err_rx,
            reader_done: false,
            left_field_names,
            peek: None,
            bucket: JoinBucket::new(None),
            left_unpaireds: VecDeque::new(),
            leof: false,
            state: KeeperState::Prefill,
        }
    }

    fn compute_state(&self) -> KeeperState {
        if self.bucket.left_field_values.is_none() {
            if !self.leof {
                KeeperState::Prefill
            } else {
                KeeperState::Eof
            }
        } else if self.peek.is_none() {
            KeeperState::LastBucket
        } else {
            KeeperState::Full
        }
    }

    /// Locate the left bucket (if any) for the given right-side key values
    /// and point `self.bucket` at it, returning whether the right record
    /// is paired. `None` signals right end-of-stream and drains all
    /// remaining left input into the unpaired list.
    ///
    /// Left buckets the cursor advances past, and left records lacking the
    /// join fields, are moved to the unpaired list along the way.
    pub fn find_bucket(&mut self, right_field_values: Option<&[Value]>) -> bool {
        let mut is_paired = false;

        if self.state == KeeperState::Prefill {
            self.prepare_for_first_bucket();
            if self.peek.is_some() {
                self.fill_next_bucket();
            }
            self.state = self.compute_state();
        }

        match right_field_values {
            Some(right_values) => {
                if self.state == KeeperState::Full || self.state == KeeperState::LastBucket {
                    let bucket_values = self
                        .bucket
                        .left_field_values
                        .as_deref()
                        .unwrap_or_else(|| {
                            panic!("internal coding error: bucket key missing in state {:?}", self.state)
                        });
                    match compare_lexically(bucket_values, right_values) {
                        Ordering::Less => {
                            // Advance left until match or left EOF. This may
                            // or may not find a bucket for the current key.
                            self.prepare_for_new_bucket(right_values);
                            if self.peek.is_some() {
                                self.fill_next_bucket();
                            }
                            let matched = !self.bucket.records.is_empty()
                                && self
                                    .bucket
                                    .left_field_values
                                    .as_deref()
                                    .is_some_and(|values| {
                                        compare_lexically(values, right_values) == Ordering::Equal
                                    });
                            if matched {
                                is_paired = true;
                                self.bucket.was_paired = true;
                            }
                        }
                        Ordering::Equal => {
                            // Stay on the current bucket.
                            self.bucket.was_paired = true;
                            is_paired = true;
                        }
                        Ordering::Greater => {
                            // Right key sits between the previous bucket and
                            // the current one: no match, no advance.
                        }
                    }
                } else if self.state != KeeperState::Eof {
                    panic!("internal coding error: failed transition from prefill state");
                }
            }
            None => {
                // Right end-of-stream.
                self.mark_remainings_as_unpaired();
            }
        }

        self.state = self.compute_state();
        is_paired
    }

    /// Emit and clear the left-unpaired list, preserving arrival order.
    pub fn output_and_release_left_unpaireds(&mut self, out: &Sender<Envelope>) {
        for envelope in self.left_unpaireds.drain(..) {
            let _ = out.send(envelope);
        }
    }

    /// Discard the left-unpaired list (left-unpairable emission disabled).
    pub fn release_left_unpaireds(&mut self) {
        self.left_unpaireds.clear();
    }

    /// Find the first peek record possessing all join fields; records
    /// lacking them go straight to the unpaired list.
    fn prepare_for_first_bucket(&mut self) {
        loop {
            self.peek = self.read_record();
            match &self.peek {
                None => {
                    self.leof = true;
                    return;
                }
                Some(envelope) => {
                    if record_of(envelope).has_all_fields(&self.left_field_names) {
                        return;
                    }
                    let skipped = self.peek.take();
                    self.left_unpaireds.extend(skipped);
                }
            }
        }
    }

    /// The right key has moved past the current bucket: release it (to the
    /// unpaired list if never paired), then consume left records while
    /// their keys compare less than the right key.
    fn prepare_for_new_bucket(&mut self, right_field_values: &[Value]) {
        if !self.bucket.was_paired {
            self.left_unpaireds.extend(self.bucket.records.drain(..));
        }
        self.bucket = JoinBucket::new(None);

        let Some(peek) = &self.peek else {
            return; // left EOF
        };
        let peek_values = record_of(peek)
            .select_values(&self.left_field_names)
            .unwrap_or_else(|| panic!("internal coding error: peek record should have had join keys"));
        if compare_lexically(&peek_values, right_field_values) != Ordering::Less {
            return;
        }

        // Keep seeking until the peek key reaches or passes the right key,
        // or left EOF. Every record passed over is unpairable.
        loop {
            let skipped = self.peek.take();
            self.left_unpaireds.extend(skipped);

            loop {
                self.peek = self.read_record();
                match &self.peek {
                    None => break,
                    Some(envelope) => {
                        if record_of(envelope).has_all_fields(&self.left_field_names) {
                            break;
                        }
                        let skipped = self.peek.take();
                        self.left_unpaireds.extend(skipped);
                    }
                }
            }

            let Some(peek) = &self.peek else {
                self.leof = true;
                break;
            };
            let peek_values = record_of(peek)
                .select_values(&self.left_field_names)
                .unwrap_or_else(|| {
                    panic!("internal coding error: peek record should have had join keys")
                });
            if compare_lexically(&peek_values, right_field_values) != Ordering::Less {
                break;
            }
        }
    }

    /// Form a complete bucket from the peek record: move it in, then read
    /// left records with the same key until one too many is read, which
    /// becomes the next peek. Records lacking join fields are skipped to
    /// the unpaired list.
    fn fill_next_bucket(&mut self) {
        let peek = self
            .peek
            .take()
            .unwrap_or_else(|| panic!("internal coding error: fill_next_bucket without peek"));
        let peek_values = record_of(&peek)
            .select_values(&self.left_field_names)
            .unwrap_or_else(|| panic!("internal coding error: peek record should have had join keys"));

        self.bucket.left_field_values = Some(peek_values);
        self.bucket.records.push(peek);
        self.bucket.was_paired = false;

        loop {
            match self.read_record() {
                None => {
                    self.leof = true;
                    break;
                }
                Some(envelope) => {
                    match record_of(&envelope).select_values(&self.left_field_names) {
                        Some(values) => {
                            let bucket_values = self
                                .bucket
                                .left_field_values
                                .as_deref()
                                .expect("bucket key set above");
                            if compare_lexically(bucket_values, &values) != Ordering::Equal {
                                self.peek = Some(envelope);
                                break;
                            }
                            self.bucket.records.push(envelope);
                        }
                        None => self.left_unpaireds.push_back(envelope),
                    }
                }
            }
        }
    }

    /// Right end-of-stream: everything left-side still buffered or unread
    /// becomes unpairable.
    fn mark_remainings_as_unpaired(&mut self) {
        if !self.bucket.was_paired {
            self.left_unpaireds.extend(self.bucket.records.drain(..));
        } else {
            self.bucket.records.clear();
        }
        self.bucket.left_field_values = None;

        if let Some(peek) = self.peek.take() {
            self.left_unpaireds.push_back(peek);
        }

        while let Some(envelope) = self.read_record() {
            self.left_unpaireds.push_back(envelope);
        }
        self.leof = true;
    }

    /// Next left record, or `None` at left end-of-stream. A reader error is
    /// fatal to the run.
    fn read_record(&mut self) -> Option<Envelope> {
        if self.reader_done {
            return None;
        }
        loop {
            select! {
                recv(self.left_err_rx) -> msg => match msg {
                    Ok(err) => fatal(&err),
                    // Reader finished and dropped its error side; stop
                    // selecting on it.
                    Err(_) => self.left_err_rx = never(),
                },
                recv(self.left_rx) -> msg => match msg {
                    Ok(Envelope::EndOfStream(_)) | Err(_) => {
                        self.reader_done = true;
                        return None;
                    }
                    Ok(envelope @ Envelope::Record(..)) => return Some(envelope),
                    Ok(Envelope::SideOutput(..)) => continue,
                },
            }
        }
    }
}

fn record_of(envelope: &Envelope) -> &crate::core::record::Record {
    envelope
        .as_record()
        .unwrap_or_else(|| panic!("internal coding error: keeper buffered a non-record envelope"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{Context, Record, Separators};
    use crossbeam_channel::unbounded;

    fn left_source(keys: &[&str]) -> (Receiver<Envelope>, Receiver<RecflowError>) {
        let (tx, rx) = unbounded();
        let (_err_tx, err_rx) = unbounded::<RecflowError>();
        let mut ctx = Context::new(Separators::default());
        for key in keys {
            ctx.update_for_input_record();
            let mut record = Record::new();
            if !key.is_empty() {
                record.put("l".to_string(), Value::String(key.to_string()));
            } else {
                record.put("other".to_string(), Value::Int(0));
            }
            tx.send(Envelope::record(record, ctx.clone())).unwrap();
        }
        tx.send(Envelope::EndOfStream(ctx)).unwrap();
        (rx, err_rx)
    }

    fn keeper_over(keys: &[&str]) -> JoinBucketKeeper {
        let (rx, err_rx) = left_source(keys);
        JoinBucketKeeper::new(rx, err_rx, vec!["l".to_string()])
    }

    fn key(s: &str) -> Vec<Value> {
        vec![Value::String(s.to_string())]
    }

    #[test]
    fn test_right_keys_below_first_bucket_never_advance() {
        // Left: e e g g. Rights a, b never pair; everything left ends
        // unpaired at right EOF.
        let mut keeper = keeper_over(&["e", "e", "g", "g"]);
        assert!(!keeper.find_bucket(Some(&key("a"))));
        assert!(!keeper.find_bucket(Some(&key("b"))));
        keeper.find_bucket(None);
        assert_eq!(keeper.left_unpaireds.len(), 4);
    }

    #[test]
    fn test_matching_walk_through_buckets() {
        let mut keeper = keeper_over(&["e", "e", "g"]);
        assert!(keeper.find_bucket(Some(&key("e"))));
        assert_eq!(keeper.bucket.records.len(), 2);
        // Same key again: stays on the bucket.
        assert!(keeper.find_bucket(Some(&key("e"))));
        // Advance past e to g.
        assert!(keeper.find_bucket(Some(&key("g"))));
        assert_eq!(keeper.bucket.records.len(), 1);
        keeper.find_bucket(None);
        // Both buckets were paired: nothing unpaired.
        assert!(keeper.left_unpaireds.is_empty());
    }

    #[test]
    fn test_skipped_bucket_is_released_unpaired() {
        // Right jumps from a to f, passing the e-bucket without a match.
        let mut keeper = keeper_over(&["e", "e", "g"]);
        assert!(!keeper.find_bucket(Some(&key("a"))));
        assert!(!keeper.find_bucket(Some(&key("f"))));
        assert_eq!(keeper.left_unpaireds.len(), 2);
        assert!(keeper.find_bucket(Some(&key("g"))));
        keeper.find_bucket(None);
        assert_eq!(keeper.left_unpaireds.len(), 2);
    }

    #[test]
    fn test_records_lacking_join_fields_go_unpaired() {
        // "" marks a record without the join field.
        let mut keeper = keeper_over(&["", "e", "", "g"]);
        assert!(keeper.find_bucket(Some(&key("e"))));
        keeper.find_bucket(None);
        // Two field-less records plus the unpaired g bucket... g never
        // paired, so 3 total.
        assert_eq!(keeper.left_unpaireds.len(), 3);
    }

    #[test]
    fn test_empty_left_source() {
        let mut keeper = keeper_over(&[]);
        assert!(!keeper.find_bucket(Some(&key("a"))));
        keeper.find_bucket(None);
        assert!(keeper.left_unpaireds.is_empty());
        assert_eq!(keeper.state, KeeperState::Eof);
    }
}
