// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark result documents.
//!
//! A suite run emits one [`BenchmarkResult`]: a named list of suites, each a
//! list of tests carrying a throughput stat. Fields the pipeline does not read
//! (timestamps, per-test flags, extra stat columns) are kept in flattened JSON
//! maps. A result loaded from JSON also keeps the document it was parsed from,
//! which is what reports echo back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use thiserror::Error;

/// Free-form JSON fields carried alongside the typed ones.
pub type Metadata = Map<String, Value>;

/// One benchmark run, as emitted by a suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Name of the benchmark run.
    pub name: String,
    /// Suites in the order the run reported them.
    pub suites: Vec<Suite>,
    /// Everything else (`timestamp`, `generated`, `elapsedMs`, ...).
    #[serde(flatten)]
    pub metadata: Metadata,
    /// Document this result was parsed from, untouched.
    #[serde(skip)]
    document: Option<Value>,
}

/// A named group of tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suite {
    /// Suite name, unique within a result.
    #[serde(default)]
    pub name: String,
    /// Tests in reported order.
    pub tests: Vec<Test>,
    /// Unrecognized fields.
    #[serde(flatten)]
    pub extra: Metadata,
}

/// A single benchmark test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    /// Test name.
    #[serde(default)]
    pub name: String,
    /// Whether the suite skipped this test.
    #[serde(default, skip_serializing_if = "is_false")]
    pub skipped: bool,
    /// Measurement, absent for skipped tests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat: Option<Stat>,
    /// Flags such as `fastest` or `reference`.
    #[serde(flatten)]
    pub extra: Metadata,
}

/// Measurement of one test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    /// Runs per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rps: Option<f64>,
    /// `duration`, `cycle`, `count`, `avg`, `percent`, ...
    #[serde(flatten)]
    pub extra: Metadata,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl BenchmarkResult {
    /// Create an empty result with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            suites: Vec::new(),
            metadata: Metadata::new(),
            document: None,
        }
    }

    /// Typed view of `document`, which is kept as the source document.
    pub fn from_document(document: Value) -> Result<Self, serde_json::Error> {
        let mut result = Self::deserialize(&document)?;
        result.document = Some(document);
        Ok(result)
    }

    /// The document as parsed, when the result was loaded from JSON.
    pub fn document(&self) -> Option<&Value> {
        self.document.as_ref()
    }

    /// Pretty-printed source document.
    ///
    /// Key order and number representation are those of the input. Results
    /// built in code are serialized from their fields instead.
    pub fn document_json(&self) -> String {
        match &self.document {
            Some(document) => serde_json::to_string_pretty(document),
            None => serde_json::to_string_pretty(self),
        }
        .unwrap_or_default()
    }

    /// Append a suite.
    pub fn with_suite(mut self, suite: Suite) -> Self {
        self.suites.push(suite);
        self
    }

    /// First suite with the given name.
    pub fn suite(&self, name: &str) -> Option<&Suite> {
        self.suites.iter().find(|s| s.name == name)
    }

    /// Check the document against the result shape.
    ///
    /// Every suite needs a non-empty name unique within the result, every test
    /// a non-empty name. Skipped tests carry no stat; other tests carry a stat
    /// with a finite, non-negative `rps`. All violations are collected.
    pub fn validate(&self) -> Result<(), ShapeError> {
        let mut violations = Vec::new();
        let mut seen = HashSet::new();

        for (si, suite) in self.suites.iter().enumerate() {
            let suite_loc = format!("suites[{}]", si);
            if suite.name.is_empty() {
                violations.push(format!("{}: suite has no name", suite_loc));
            } else if !seen.insert(suite.name.as_str()) {
                violations.push(format!(
                    "{}: duplicate suite name \"{}\"",
                    suite_loc, suite.name
                ));
            }

            for (ti, test) in suite.tests.iter().enumerate() {
                let loc = format!("{}.tests[{}]", suite_loc, ti);
                if test.name.is_empty() {
                    violations.push(format!("{}: test has no name", loc));
                }
                match (&test.stat, test.skipped) {
                    (Some(_), true) => {
                        violations.push(format!("{}: skipped test has a stat", loc));
                    }
                    (None, false) => {
                        violations
                            .push(format!("{}: test is not skipped but has no stat", loc));
                    }
                    (Some(stat), false) => match stat.rps {
                        None => violations.push(format!("{}: stat has no rps", loc)),
                        Some(rps) if !rps.is_finite() || rps < 0.0 => {
                            violations.push(format!(
                                "{}: rps {} is not a finite value >= 0",
                                loc, rps
                            ));
                        }
                        Some(_) => {}
                    },
                    (None, true) => {}
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ShapeError { violations })
        }
    }
}

impl Suite {
    /// Create an empty suite.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tests: Vec::new(),
            extra: Metadata::new(),
        }
    }

    /// Append a test.
    pub fn with_test(mut self, test: Test) -> Self {
        self.tests.push(test);
        self
    }

    /// First test with the given name.
    pub fn test(&self, name: &str) -> Option<&Test> {
        self.tests.iter().find(|t| t.name == name)
    }
}

impl Test {
    /// A measured test.
    pub fn measured(name: impl Into<String>, rps: f64) -> Self {
        Self {
            name: name.into(),
            skipped: false,
            stat: Some(Stat {
                rps: Some(rps),
                extra: Metadata::new(),
            }),
            extra: Metadata::new(),
        }
    }

    /// A skipped test.
    pub fn skipped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            skipped: true,
            stat: None,
            extra: Metadata::new(),
        }
    }

    /// Throughput usable for comparison: finite and strictly positive.
    ///
    /// A zero rate cannot serve as the base of a relative change and is
    /// reported like a missing measurement.
    pub fn measured_rps(&self) -> Option<f64> {
        self.stat
            .as_ref()
            .and_then(|s| s.rps)
            .filter(|rps| rps.is_finite() && *rps > 0.0)
    }
}

/// A result document that does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "invalid benchmark result ({} violation(s)): {}",
    .violations.len(),
    .violations.join("; ")
)]
pub struct ShapeError {
    /// One entry per problem, prefixed with its location in the document.
    pub violations: Vec<String>,
}

impl ShapeError {
    /// A shape error with a single violation.
    pub fn single(violation: impl Into<String>) -> Self {
        Self {
            violations: vec![violation.into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "name": "Simple example",
            "suites": [
                {
                    "name": "String concatenate",
                    "tests": [
                        {
                            "name": "Concat with '+'",
                            "fastest": true,
                            "stat": { "duration": 5.007, "cycle": 153, "rps": 30556.69 }
                        },
                        { "name": "Increment with +=", "skipped": true }
                    ]
                }
            ],
            "timestamp": 1491573679617u64,
            "elapsedMs": 20902
        })
    }

    #[test]
    fn test_deserialize_keeps_metadata() {
        let result: BenchmarkResult = serde_json::from_value(sample()).unwrap();
        assert_eq!(result.name, "Simple example");
        assert_eq!(result.metadata["elapsedMs"], json!(20902));

        let test = &result.suites[0].tests[0];
        assert_eq!(test.extra["fastest"], json!(true));
        let stat = test.stat.as_ref().unwrap();
        assert_eq!(stat.rps, Some(30556.69));
        assert_eq!(stat.extra["cycle"], json!(153));
        assert!(result.suites[0].tests[1].skipped);
    }

    #[test]
    fn test_serialize_does_not_invent_fields() {
        let result: BenchmarkResult = serde_json::from_value(sample()).unwrap();
        let back = serde_json::to_value(&result).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_document_json_keeps_source_text() {
        let source = json!({
            "suites": [{
                "tests": [{ "stat": { "rps": 1000, "count": 5 }, "name": "T" }],
                "name": "S"
            }],
            "name": "X",
            "elapsedMs": 3
        });
        let result = BenchmarkResult::from_document(source.clone()).unwrap();
        assert_eq!(result.document(), Some(&source));

        let echoed = result.document_json();
        assert!(echoed.contains("\"rps\": 1000,"));
        let suites_at = echoed.find("\"suites\"").unwrap();
        let name_at = echoed.find("\"name\": \"X\"").unwrap();
        assert!(suites_at < name_at);
    }

    #[test]
    fn test_built_result_serializes_fields() {
        let result =
            BenchmarkResult::new("X").with_suite(Suite::new("S").with_test(Test::skipped("T")));
        assert!(result.document().is_none());
        let echoed: Value = serde_json::from_str(&result.document_json()).unwrap();
        assert_eq!(echoed["suites"][0]["tests"][0]["skipped"], json!(true));
    }

    #[test]
    fn test_name_suites_and_tests_are_required() {
        for document in [
            json!({ "suites": [] }),
            json!({ "name": "x" }),
            json!({ "name": "x", "suites": [{ "name": "s" }] }),
            json!({ "level": "info", "msg": "done" }),
        ] {
            assert!(BenchmarkResult::from_document(document.clone()).is_err(), "{document}");
        }
    }

    #[test]
    fn test_valid_document_passes() {
        let result: BenchmarkResult = serde_json::from_value(sample()).unwrap();
        assert!(result.validate().is_ok());
    }

    #[test]
    fn test_missing_names_are_reported() {
        let result: BenchmarkResult = serde_json::from_value(json!({
            "name": "x",
            "suites": [{ "tests": [{ "stat": { "rps": 1.0 } }] }]
        }))
        .unwrap();
        let err = result.validate().unwrap_err();
        assert_eq!(err.violations.len(), 2);
        assert!(err.violations[0].contains("suites[0]: suite has no name"));
        assert!(err.violations[1].contains("suites[0].tests[0]: test has no name"));
    }

    #[test]
    fn test_skipped_test_with_stat_is_rejected() {
        let mut test = Test::measured("t", 10.0);
        test.skipped = true;
        let result = BenchmarkResult::new("x").with_suite(Suite::new("s").with_test(test));
        let err = result.validate().unwrap_err();
        assert!(err.to_string().contains("skipped test has a stat"));
    }

    #[test]
    fn test_negative_or_missing_rps_is_rejected() {
        let mut no_rps = Test::measured("b", 1.0);
        no_rps.stat.as_mut().unwrap().rps = None;
        let result = BenchmarkResult::new("x").with_suite(
            Suite::new("s")
                .with_test(Test::measured("a", -1.0))
                .with_test(no_rps)
                .with_test(Test::measured("c", f64::INFINITY)),
        );
        let err = result.validate().unwrap_err();
        assert_eq!(err.violations.len(), 3);
    }

    #[test]
    fn test_unstat_non_skipped_test_is_rejected() {
        let mut test = Test::skipped("t");
        test.skipped = false;
        let result = BenchmarkResult::new("x").with_suite(Suite::new("s").with_test(test));
        assert!(result.validate().is_err());
    }

    #[test]
    fn test_duplicate_suite_names_are_rejected() {
        let result = BenchmarkResult::new("x")
            .with_suite(Suite::new("s"))
            .with_suite(Suite::new("s"));
        let err = result.validate().unwrap_err();
        assert!(err.violations[0].contains("duplicate suite name"));
    }

    #[test]
    fn test_zero_rps_is_valid_but_not_measured() {
        let test = Test::measured("t", 0.0);
        let result =
            BenchmarkResult::new("x").with_suite(Suite::new("s").with_test(test.clone()));
        assert!(result.validate().is_ok());
        assert_eq!(test.measured_rps(), None);
        assert_eq!(Test::measured("t", 12.5).measured_rps(), Some(12.5));
    }
}
