// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! Markdown report generation for comparisons.
//!
//! The report is meant to be posted as a pull-request comment: a heading with
//! the run name, one table per suite and two collapsed sections holding the
//! raw documents of both runs.

use crate::compare::{ComparisonResult, SuiteComparison, TestComparison};
use std::fmt;

/// Render a comparison as a markdown document.
pub fn render(result: &ComparisonResult) -> String {
    Report(result).to_string()
}

/// [`fmt::Display`] adapter producing the markdown report.
pub struct Report<'a>(pub &'a ComparisonResult);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;

        writeln!(f, "# Benchmark results")?;
        writeln!(f)?;
        writeln!(f, "## {}", escape_html(&result.name))?;
        writeln!(f)?;

        for suite in &result.suites {
            write_suite(f, suite)?;
        }

        write_details(f, "Master detailed results", &result.master_json)?;
        write_details(f, "PR detailed results", &result.pr_json)?;
        Ok(())
    }
}

fn write_suite(f: &mut fmt::Formatter<'_>, suite: &SuiteComparison) -> fmt::Result {
    writeln!(f, "### Suite: {}", escape_html(&suite.name))?;
    writeln!(f)?;
    writeln!(f, "| Test | Master (runs/sec) | PR (runs/sec) | Diff (runs/sec) |")?;
    writeln!(f, "| ------- | ----- | ------- | ------- |")?;
    for test in &suite.tests {
        write_row(f, test)?;
    }
    writeln!(f)
}

fn write_row(f: &mut fmt::Formatter<'_>, test: &TestComparison) -> fmt::Result {
    let alt = if test.is_comparable() {
        format!("Performance: {}%", test.percentage)
    } else {
        "Performance: skipped".to_string()
    };

    writeln!(
        f,
        "|**{}**| `{}` | `{}` | ![{}]({}) `{}` |",
        escape_cell(&test.name),
        escape_cell(&test.master_rps),
        escape_cell(&test.pr_rps),
        alt,
        test.badge_url(),
        escape_cell(&test.diff),
    )
}

fn write_details(f: &mut fmt::Formatter<'_>, summary: &str, json: &str) -> fmt::Result {
    if json.is_empty() {
        return Ok(());
    }
    writeln!(f, "<details>")?;
    writeln!(f, "  <summary>{}</summary>", summary)?;
    writeln!(f, "  <pre>")?;
    writeln!(f, "{}", escape_html(json))?;
    writeln!(f, "  </pre>")?;
    writeln!(f, "</details>")?;
    writeln!(f)
}

/// Escape text for inclusion in HTML (and therefore GitHub markdown).
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '`' => out.push_str("&#x60;"),
            '=' => out.push_str("&#x3D;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_cell(text: &str) -> String {
    escape_html(text).replace('|', "\\|")
}
