// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stream configuration: formats and separators.
//!
//! Separator options are tri-state: unset fields resolve to the default
//! for the selected format, so `-i csv` picks up the CSV defaults while an
//! explicit `--ifs` always wins.

use crate::core::record::Separators;

pub const FORMAT_DKVP: &str = "dkvp";
pub const FORMAT_CSV: &str = "csv";
pub const FORMAT_JSON: &str = "json";

pub const DEFAULT_FORMAT: &str = FORMAT_DKVP;

/// Options for the record reader side.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    pub format: String,
    pub irs: Option<String>,
    pub ifs: Option<String>,
    pub ips: Option<String>,
}

impl Default for ReaderOptions {
    fn default() -> ReaderOptions {
        ReaderOptions {
            format: DEFAULT_FORMAT.to_string(),
            irs: None,
            ifs: None,
            ips: None,
        }
    }
}

impl ReaderOptions {
    pub fn irs(&self) -> String {
        self.irs.clone().unwrap_or_else(|| "\n".to_string())
    }

    pub fn ifs(&self) -> String {
        self.ifs
            .clone()
            .unwrap_or_else(|| default_fs(&self.format).to_string())
    }

    pub fn ips(&self) -> String {
        self.ips.clone().unwrap_or_else(|| "=".to_string())
    }
}

/// Options for the record writer side.
#[derive(Debug, Clone)]
pub struct WriterOptions {
    pub format: String,
    pub ors: Option<String>,
    pub ofs: Option<String>,
    pub ops: Option<String>,
}

impl Default for WriterOptions {
    fn default() -> WriterOptions {
        WriterOptions {
            format: DEFAULT_FORMAT.to_string(),
            ors: None,
            ofs: None,
            ops: None,
        }
    }
}

impl WriterOptions {
    pub fn ors(&self) -> String {
        self.ors.clone().unwrap_or_else(|| "\n".to_string())
    }

    pub fn ofs(&self) -> String {
        self.ofs
            .clone()
            .unwrap_or_else(|| default_fs(&self.format).to_string())
    }

    pub fn ops(&self) -> String {
        self.ops.clone().unwrap_or_else(|| "=".to_string())
    }
}

fn default_fs(format: &str) -> &'static str {
    // DKVP and CSV both default to comma; kept as a lookup so per-format
    // defaults stay in one place.
    match format {
        FORMAT_CSV => ",",
        _ => ",",
    }
}

/// Decode the C-style backslash escapes accepted in separator flags, so
/// `--ifs '\t'` works without shell quoting tricks.
pub fn decode_separator(text: &str) -> String {
    let mut decoded = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            decoded.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => decoded.push('\n'),
            Some('t') => decoded.push('\t'),
            Some('r') => decoded.push('\r'),
            Some('\\') => decoded.push('\\'),
            Some(other) => {
                decoded.push('\\');
                decoded.push(other);
            }
            None => decoded.push('\\'),
        }
    }
    decoded
}

/// Whole-run options: main-input reader, output writer.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub reader: ReaderOptions,
    pub writer: WriterOptions,
}

impl Options {
    /// Resolve the active separators for attachment to record contexts.
    pub fn separators(&self) -> Separators {
        Separators {
            irs: self.reader.irs(),
            ifs: self.reader.ifs(),
            ips: self.reader.ips(),
            ors: self.writer.ors(),
            ofs: self.writer.ofs(),
            ops: self.writer.ops(),
        }
    }
}
