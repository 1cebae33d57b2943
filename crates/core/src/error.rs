// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for Benchbot core.

use crate::execution::RunState;
use thiserror::Error;

/// Result alias using the core [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by core types.
#[derive(Debug, Error)]
pub enum Error {
    /// A run tried to move between two states the state machine does not connect.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition {
        /// State the run was in.
        from: RunState,
        /// State that was requested.
        to: RunState,
    },
}
