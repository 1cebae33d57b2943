// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core types shared across the Benchbot crates.
//!
//! - [`error`] - the crate-wide [`Error`] and [`Result`] types
//! - [`execution`] - the record of one pull-request event moving through the
//!   benchmark pipeline, and the state machine it follows

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod error;
pub mod execution;

pub use error::{Error, Result};
pub use execution::{EventRun, RunState, RunTransition};
