// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! Loading benchmark documents.
//!
//! Loading is a two-step affair: the text must be JSON, then the JSON must
//! have the [`BenchmarkResult`] shape. The two failures are kept apart in
//! [`LoadError`] because callers report them differently.

use crate::result::{BenchmarkResult, ShapeError};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading a result document.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The text contains no JSON document.
    #[error("No JSON document found in suite output")]
    NoDocument,

    /// The text is not valid JSON.
    #[error("Invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The JSON does not have the result shape.
    #[error("{0}")]
    Shape(#[from] ShapeError),
}

/// Read and validate a result document from a file.
pub fn read_result(path: impl AsRef<Path>) -> Result<BenchmarkResult, LoadError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_result(&content)
}

/// Parse and validate a result document.
///
/// When the whole text is not JSON, suites are assumed to have logged around
/// the document. Every line that opens a JSON object is then a candidate
/// start, and the last candidate whose first JSON value has the result shape
/// wins. Trailing output after that value is ignored.
pub fn parse_result(text: &str) -> Result<BenchmarkResult, LoadError> {
    if text.trim().is_empty() {
        return Err(LoadError::NoDocument);
    }

    let whole = match serde_json::from_str::<Value>(text) {
        Ok(value) => return from_value(value),
        Err(e) => e,
    };

    let mut rejected = None;
    for start in object_line_starts(text).into_iter().rev() {
        let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        let Some(Ok(value)) = values.next() else {
            continue;
        };
        match from_value(value) {
            Ok(result) => return Ok(result),
            Err(e) => rejected = Some(e),
        }
    }
    Err(rejected.unwrap_or(LoadError::Parse(whole)))
}

/// Validate an already parsed JSON document.
pub fn from_value(value: Value) -> Result<BenchmarkResult, LoadError> {
    if !value.is_object() {
        return Err(ShapeError::single("document is not a JSON object").into());
    }
    let result =
        BenchmarkResult::from_document(value).map_err(|e| ShapeError::single(e.to_string()))?;
    result.validate()?;
    Ok(result)
}

fn object_line_starts(text: &str) -> Vec<usize> {
    let mut offset = 0;
    let mut starts = Vec::new();
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('{') {
            starts.push(offset + line.len() - trimmed.len());
        }
        offset += line.len();
    }
    starts
}
