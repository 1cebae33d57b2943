// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! Comparison of a base and a candidate benchmark run.
//!
//! [`compare`] pairs suites and tests by name and computes, for each test, the
//! throughput delta of the candidate against the base. Suites and tests keep
//! the order in which they first appear, scanning the base run first.

use crate::format::format_num;
use crate::result::{BenchmarkResult, Suite, Test};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Shown in place of a throughput that was not measured.
pub const SKIP_SENTINEL: &str = "[SKIP]";

/// Shown in place of a delta that cannot be computed.
pub const NO_DIFF: &str = "-";

const SHIELDS_BASE: &str = "https://img.shields.io/badge/performance";

/// Visual category of a relative throughput change.
///
/// | percent      | tier            |
/// |--------------|-----------------|
/// | `> 20`       | BestImprovement |
/// | `(5, 20]`    | Improvement     |
/// | `[-5, 5]`    | Neutral         |
/// | `[-20, -5)`  | MinorRegression |
/// | `< -20`      | Regression      |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BadgeTier {
    /// More than 20% faster.
    BestImprovement,
    /// More than 5% and up to 20% faster.
    Improvement,
    /// Within 5% either way.
    Neutral,
    /// More than 5% and up to 20% slower.
    MinorRegression,
    /// More than 20% slower.
    Regression,
    /// At least one side has no measurement.
    Skipped,
}

impl BadgeTier {
    /// Tier for a relative change in percent.
    pub fn from_percent(percent: f64) -> Self {
        if percent.is_nan() {
            Self::Skipped
        } else if percent > 20.0 {
            Self::BestImprovement
        } else if percent > 5.0 {
            Self::Improvement
        } else if percent >= -5.0 {
            Self::Neutral
        } else if percent >= -20.0 {
            Self::MinorRegression
        } else {
            Self::Regression
        }
    }

    /// shields.io color name.
    pub fn color(&self) -> &'static str {
        match self {
            Self::BestImprovement => "brightgreen",
            Self::Improvement => "green",
            Self::Neutral => "yellow",
            Self::MinorRegression => "orange",
            Self::Regression => "red",
            Self::Skipped => "lightgrey",
        }
    }

    /// Badge image URL for this tier showing `percentage`.
    ///
    /// shields.io treats `-` as a separator, so dashes in the label are doubled.
    pub fn badge_url(&self, percentage: &str) -> String {
        match self {
            Self::Skipped => format!("{}-skipped-{}.svg", SHIELDS_BASE, self.color()),
            _ => format!(
                "{}-{}%25-{}.svg",
                SHIELDS_BASE,
                percentage.replace('-', "--"),
                self.color()
            ),
        }
    }
}

/// Comparison of one test across both runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestComparison {
    /// Test name.
    pub name: String,
    /// Present and skipped on both sides.
    pub skipped: bool,
    /// Base throughput, or [`SKIP_SENTINEL`].
    pub master_rps: String,
    /// Candidate throughput, or [`SKIP_SENTINEL`].
    pub pr_rps: String,
    /// Signed throughput delta, or [`NO_DIFF`].
    pub diff: String,
    /// Signed relative change in percent, empty when not comparable.
    pub percentage: String,
    /// Tier the change falls into.
    pub badge: BadgeTier,
}

impl TestComparison {
    /// Badge image URL for this row.
    pub fn badge_url(&self) -> String {
        self.badge.badge_url(&self.percentage)
    }

    /// Whether both sides had a measurement.
    pub fn is_comparable(&self) -> bool {
        self.badge != BadgeTier::Skipped
    }
}

/// Comparison of one suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteComparison {
    /// Suite name.
    pub name: String,
    /// Per-test comparisons, in first-appearance order.
    pub tests: Vec<TestComparison>,
}

/// Full comparison of a base run against a candidate run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Name of the base run.
    pub name: String,
    /// Per-suite comparisons, in first-appearance order.
    pub suites: Vec<SuiteComparison>,
    /// Base run document, pretty-printed.
    #[serde(rename = "masterJSON")]
    pub master_json: String,
    /// Candidate run document, pretty-printed.
    #[serde(rename = "prJSON")]
    pub pr_json: String,
}

impl ComparisonResult {
    /// Iterate over every test comparison of every suite.
    pub fn tests(&self) -> impl Iterator<Item = &TestComparison> {
        self.suites.iter().flat_map(|s| s.tests.iter())
    }
}

/// Compare `candidate` against `base`.
///
/// Neither input is modified. Both source documents are embedded in the result
/// for audit, exactly as they were loaded.
pub fn compare(base: &BenchmarkResult, candidate: &BenchmarkResult) -> ComparisonResult {
    let names = first_seen(
        base.suites
            .iter()
            .chain(candidate.suites.iter())
            .map(|s| s.name.as_str()),
    );

    let suites = names
        .into_iter()
        .map(|name| compare_suite(name, base.suite(name), candidate.suite(name)))
        .collect();

    ComparisonResult {
        name: base.name.clone(),
        suites,
        master_json: base.document_json(),
        pr_json: candidate.document_json(),
    }
}

fn compare_suite(name: &str, base: Option<&Suite>, candidate: Option<&Suite>) -> SuiteComparison {
    let base_tests = base.map(|s| s.tests.as_slice()).unwrap_or_default();
    let candidate_tests = candidate.map(|s| s.tests.as_slice()).unwrap_or_default();

    let names = first_seen(
        base_tests
            .iter()
            .chain(candidate_tests.iter())
            .map(|t| t.name.as_str()),
    );

    SuiteComparison {
        name: name.to_string(),
        tests: names
            .into_iter()
            .map(|test| {
                compare_test(
                    test,
                    base.and_then(|s| s.test(test)),
                    candidate.and_then(|s| s.test(test)),
                )
            })
            .collect(),
    }
}

fn compare_test(name: &str, base: Option<&Test>, candidate: Option<&Test>) -> TestComparison {
    let skipped = matches!((base, candidate), (Some(b), Some(c)) if b.skipped && c.skipped);
    let master = base.and_then(Test::measured_rps);
    let pr = candidate.and_then(Test::measured_rps);

    let format_rps = |rps: Option<f64>| {
        rps.map(|v| format_num(v, 0, false))
            .unwrap_or_else(|| SKIP_SENTINEL.to_string())
    };

    let (diff, percentage, badge) = match (master, pr) {
        (Some(m), Some(p)) => {
            let percent = (p - m) * 100.0 / m;
            (
                format_num(p - m, 0, true),
                format_num(percent, 0, true),
                BadgeTier::from_percent(percent),
            )
        }
        _ => (NO_DIFF.to_string(), String::new(), BadgeTier::Skipped),
    };

    TestComparison {
        name: name.to_string(),
        skipped,
        master_rps: format_rps(master),
        pr_rps: format_rps(pr),
        diff,
        percentage,
        badge,
    }
}

fn first_seen<'a>(names: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    names.filter(|name| seen.insert(*name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(suites: Vec<Suite>) -> BenchmarkResult {
        suites
            .into_iter()
            .fold(BenchmarkResult::new("X"), BenchmarkResult::with_suite)
    }

    fn single(rps: f64) -> BenchmarkResult {
        result(vec![Suite::new("S").with_test(Test::measured("T", rps))])
    }

    #[test]
    fn test_suite_union_keeps_first_seen_order() {
        let base = result(vec![Suite::new("a"), Suite::new("b"), Suite::new("c")]);
        let candidate = result(vec![Suite::new("d"), Suite::new("b"), Suite::new("e")]);

        let names: Vec<_> = compare(&base, &candidate)
            .suites
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_test_union_covers_both_sides() {
        let base = result(vec![Suite::new("S")
            .with_test(Test::measured("one", 10.0))
            .with_test(Test::measured("two", 10.0))]);
        let candidate = result(vec![Suite::new("S")
            .with_test(Test::measured("three", 10.0))
            .with_test(Test::measured("one", 10.0))]);

        let cmp = compare(&base, &candidate);
        let names: Vec<_> = cmp.tests().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["one", "two", "three"]);
        assert_eq!(cmp.suites[0].tests[1].pr_rps, SKIP_SENTINEL);
        assert_eq!(cmp.suites[0].tests[2].master_rps, SKIP_SENTINEL);
    }

    #[test]
    fn test_suite_only_in_candidate() {
        let base = result(vec![]);
        let candidate = result(vec![Suite::new("new").with_test(Test::measured("T", 50.0))]);

        let cmp = compare(&base, &candidate);
        let t = &cmp.suites[0].tests[0];
        assert_eq!(t.master_rps, SKIP_SENTINEL);
        assert_eq!(t.pr_rps, "50");
        assert_eq!(t.diff, NO_DIFF);
        assert_eq!(t.percentage, "");
        assert_eq!(t.badge, BadgeTier::Skipped);
        assert!(!t.skipped);
    }

    #[test]
    fn test_percentage_sign() {
        let cmp = compare(&single(100.0), &single(120.0));
        let t = &cmp.suites[0].tests[0];
        assert_eq!(t.percentage, "+20");
        assert_eq!(t.diff, "+20");
        assert_eq!(t.badge, BadgeTier::Improvement);
    }

    #[test]
    fn test_regression_is_negative() {
        let cmp = compare(&single(1000.0), &single(700.0));
        let t = &cmp.suites[0].tests[0];
        assert_eq!(t.percentage, "-30");
        assert_eq!(t.diff, "-300");
        assert_eq!(t.badge, BadgeTier::Regression);
        assert_eq!(
            t.badge_url(),
            "https://img.shields.io/badge/performance---30%25-red.svg"
        );
    }

    #[test]
    fn test_both_skipped() {
        let base = result(vec![Suite::new("S").with_test(Test::skipped("T"))]);
        let candidate = base.clone();

        let t = compare(&base, &candidate).suites[0].tests[0].clone();
        assert!(t.skipped);
        assert_eq!(t.master_rps, SKIP_SENTINEL);
        assert_eq!(t.pr_rps, SKIP_SENTINEL);
        assert_eq!(t.diff, NO_DIFF);
        assert_eq!(
            t.badge_url(),
            "https://img.shields.io/badge/performance-skipped-lightgrey.svg"
        );
    }

    #[test]
    fn test_skipped_requires_both_sides_present() {
        let base = result(vec![Suite::new("S")]);
        let candidate = result(vec![Suite::new("S").with_test(Test::skipped("T"))]);
        assert!(!compare(&base, &candidate).suites[0].tests[0].skipped);

        let base = result(vec![Suite::new("S").with_test(Test::skipped("T"))]);
        let candidate = result(vec![Suite::new("S").with_test(Test::measured("T", 5.0))]);
        assert!(!compare(&base, &candidate).suites[0].tests[0].skipped);
    }

    #[test]
    fn test_zero_base_is_not_comparable() {
        let cmp = compare(&single(0.0), &single(10.0));
        let t = &cmp.suites[0].tests[0];
        assert_eq!(t.master_rps, SKIP_SENTINEL);
        assert_eq!(t.diff, NO_DIFF);
        assert!(!t.is_comparable());
    }

    #[test]
    fn test_badge_tier_boundaries() {
        assert_eq!(BadgeTier::from_percent(21.0), BadgeTier::BestImprovement);
        assert_eq!(BadgeTier::from_percent(20.0), BadgeTier::Improvement);
        assert_eq!(BadgeTier::from_percent(5.1), BadgeTier::Improvement);
        assert_eq!(BadgeTier::from_percent(5.0), BadgeTier::Neutral);
        assert_eq!(BadgeTier::from_percent(0.0), BadgeTier::Neutral);
        assert_eq!(BadgeTier::from_percent(-5.0), BadgeTier::Neutral);
        assert_eq!(BadgeTier::from_percent(-5.1), BadgeTier::MinorRegression);
        assert_eq!(BadgeTier::from_percent(-20.0), BadgeTier::MinorRegression);
        assert_eq!(BadgeTier::from_percent(-25.0), BadgeTier::Regression);
        assert_eq!(BadgeTier::from_percent(f64::NAN), BadgeTier::Skipped);
    }

    #[test]
    fn test_compare_is_deterministic() {
        let base = result(vec![
            Suite::new("S1").with_test(Test::measured("a", 1234.5)),
            Suite::new("S2").with_test(Test::skipped("b")),
        ]);
        let candidate = result(vec![
            Suite::new("S2").with_test(Test::measured("b", 10.0)),
            Suite::new("S1").with_test(Test::measured("a", 1000.0)),
        ]);

        let first = serde_json::to_string(&compare(&base, &candidate)).unwrap();
        let second = serde_json::to_string(&compare(&base, &candidate)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_raw_documents_are_retained() {
        let base = single(100.0);
        let candidate = single(200.0);
        let cmp = compare(&base, &candidate);

        let master: BenchmarkResult = serde_json::from_str(&cmp.master_json).unwrap();
        let pr: BenchmarkResult = serde_json::from_str(&cmp.pr_json).unwrap();
        assert_eq!(master, base);
        assert_eq!(pr, candidate);
        assert_eq!(cmp.name, "X");
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(compare(&single(100.0), &single(110.0))).unwrap();
        let t = &json["suites"][0]["tests"][0];
        assert_eq!(t["masterRps"], "100");
        assert_eq!(t["prRps"], "110");
        assert_eq!(t["badge"], "improvement");
        assert!(json.get("masterJSON").is_some());
        assert!(json.get("prJSON").is_some());
    }

    #[test]
    fn test_loaded_documents_are_embedded_verbatim() {
        let text = concat!(
            r#"{"suites":[{"tests":[{"stat":{"rps":1000,"count":5},"name":"T"}],"name":"S"}],"#,
            r#""name":"X","elapsedMs":3}"#,
        );
        let base = crate::io::parse_result(text).unwrap();
        let candidate = crate::io::parse_result(&text.replace("1000", "1100")).unwrap();
        let cmp = compare(&base, &candidate);

        let expected: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(cmp.master_json, serde_json::to_string_pretty(&expected).unwrap());
        assert!(cmp.master_json.contains("\"rps\": 1000,"));
        assert!(cmp.pr_json.contains("\"rps\": 1100,"));
        assert!(cmp.master_json.trim_start().starts_with("{\n  \"suites\""));
        assert_eq!(cmp.suites[0].tests[0].diff, "+100");
    }
}
