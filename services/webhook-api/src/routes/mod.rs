// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

pub mod health;
pub mod webhook;
