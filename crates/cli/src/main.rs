// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchbot CLI entry point.

#[tokio::main]
async fn main() {
    if let Err(e) = benchbot_cli::run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
