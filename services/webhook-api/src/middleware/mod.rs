// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! Request extractors and layers.

pub mod github_event;

pub use github_event::{headers, GithubEvent};
