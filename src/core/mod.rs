// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod config;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod runner;
pub mod stream;
pub mod transform;
