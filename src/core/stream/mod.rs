// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record stream I/O: readers producing envelope streams and writers
//! consuming the final output channel.

pub mod input;
pub mod output;
