// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark result model and comparison for Benchbot.
//!
//! This crate holds the pure part of the pipeline: it knows nothing about
//! workspaces, processes or GitHub.
//!
//! # Quick Start
//!
//! ```no_run
//! use benchbot_benchmarks::{compare, io, markdown};
//!
//! let base = io::read_result("master.json")?;
//! let candidate = io::read_result("pr.json")?;
//!
//! let comparison = compare(&base, &candidate);
//! println!("{}", markdown::render(&comparison));
//! # Ok::<(), benchbot_benchmarks::io::LoadError>(())
//! ```
//!
//! # Modules
//!
//! - [`result`] - the `BenchmarkResult` document and its shape validation
//! - [`compare`] - the comparison engine and badge tiers
//! - [`format`] - number formatting for report cells
//! - [`markdown`] - markdown report rendering
//! - [`io`] - reading and writing documents

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod compare;
pub mod format;
pub mod io;
pub mod markdown;
pub mod result;

pub use compare::{compare, BadgeTier, ComparisonResult, SuiteComparison, TestComparison};
pub use io::LoadError;
pub use result::{BenchmarkResult, ShapeError, Stat, Suite, Test};
