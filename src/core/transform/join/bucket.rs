// SPDX-License-Identifier: MIT OR Apache-2.0

//! Join buckets: left-side records grouped by join-key value.

use crate::core::record::{Envelope, Value};

/// The set of left records sharing one join-key value, plus the pairing
/// flag used to emit left-unpairables after the stream ends.
///
/// In the half-streaming join, buckets live for the whole run (one per
/// distinct left key). In the doubly-streaming join there is exactly one
/// live bucket at a time and `left_field_values` is `None` before the
/// first fill and after the keeper drains.
#[derive(Debug)]
pub struct JoinBucket {
    pub left_field_values: Option<Vec<Value>>,
    pub records: Vec<Envelope>,
    pub was_paired: bool,
}

impl JoinBucket {
    pub fn new(left_field_values: Option<Vec<Value>>) -> JoinBucket {
        JoinBucket {
            left_field_values,
            records: Vec::new(),
            was_paired: false,
        }
    }
}

/// Insertion-ordered bucket map for the half-streaming join: lookup is by
/// spliced key string, and end-of-stream drains walk buckets in creation
/// order.
#[derive(Debug, Default)]
pub struct BucketsByKey {
    order: Vec<String>,
    buckets: std::collections::HashMap<String, JoinBucket>,
}

impl BucketsByKey {
    pub fn new() -> BucketsByKey {
        BucketsByKey::default()
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut JoinBucket> {
        self.buckets.get_mut(key)
    }

    /// Append a left record to its key's bucket, creating the bucket on
    /// first encounter of the key.
    pub fn add(&mut self, key: String, left_field_values: Vec<Value>, envelope: Envelope) {
        match self.buckets.get_mut(&key) {
            Some(bucket) => bucket.records.push(envelope),
            None => {
                let mut bucket = JoinBucket::new(Some(left_field_values));
                bucket.records.push(envelope);
                self.order.push(key.clone());
                self.buckets.insert(key, bucket);
            }
        }
    }

    /// Drain the records of never-paired buckets, in bucket-creation order.
    pub fn drain_unpaired(&mut self) -> Vec<Envelope> {
        let mut out = Vec::new();
        for key in &self.order {
            if let Some(bucket) = self.buckets.get_mut(key) {
                if !bucket.was_paired {
                    out.append(&mut bucket.records);
                }
            }
        }
        out
    }

    #[cfg(test)]
    pub fn bucket_count(&self) -> usize {
        self.order.len()
    }
}
