// SPDX-License-Identifier: MIT OR Apache-2.0

//! recflow: a streaming record processor.
//!
//! Input files are parsed into streams of ordered key-value records,
//! pushed through a chain of transformer verbs (each on its own worker
//! thread, connected by bounded channels), and rendered back out in the
//! configured output format.
//!
//! The library surface exists for the binary and for integration tests;
//! the stable interface is the command line.

pub mod cli;
pub mod core;

pub use crate::core::config::Options;
pub use crate::core::error::{RecflowError, RecflowResult};
pub use crate::core::record::{Context, Envelope, Record, Value};
