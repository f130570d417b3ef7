// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-record metadata carried alongside each record.
//!
//! Workers run concurrently, so the context is copied into every envelope
//! rather than shared: a downstream stage must never observe mutations made
//! upstream after handoff.

/// Active input/output separators, resolved from the reader/writer options
/// at stream start and carried with each record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Separators {
    pub irs: String,
    pub ifs: String,
    pub ips: String,
    pub ors: String,
    pub ofs: String,
    pub ops: String,
}

impl Default for Separators {
    fn default() -> Separators {
        Separators {
            irs: "\n".to_string(),
            ifs: ",".to_string(),
            ips: "=".to_string(),
            ors: "\n".to_string(),
            ofs: ",".to_string(),
            ops: "=".to_string(),
        }
    }
}

/// Record-level metadata: global and per-file record numbers, source file
/// name, and the active separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    /// Input record number, monotonic across all input files.
    pub nr: u64,
    /// File record number, reset at the start of each input file.
    pub fnr: u64,
    /// Name of the file the record was read from, or `(stdin)`.
    pub filename: String,
    pub separators: Separators,
}

impl Context {
    pub fn new(separators: Separators) -> Context {
        Context {
            nr: 0,
            fnr: 0,
            filename: String::new(),
            separators,
        }
    }

    /// Reset per-file state when the reader opens the next input file.
    pub fn update_for_start_of_file(&mut self, filename: &str) {
        self.fnr = 0;
        self.filename = filename.to_string();
    }

    /// Advance record counters as each input record is produced.
    pub fn update_for_input_record(&mut self) {
        self.nr += 1;
        self.fnr += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_across_files() {
        let mut ctx = Context::new(Separators::default());
        ctx.update_for_start_of_file("a.dkvp");
        ctx.update_for_input_record();
        ctx.update_for_input_record();
        assert_eq!((ctx.nr, ctx.fnr), (2, 2));

        ctx.update_for_start_of_file("b.dkvp");
        ctx.update_for_input_record();
        assert_eq!((ctx.nr, ctx.fnr), (3, 1));
        assert_eq!(ctx.filename, "b.dkvp");
    }
}
