// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! Number formatting for report cells.

/// Format `value` rounded to `decimals` places with `,` thousands separators.
///
/// Rounding is half away from zero. Trailing fractional zeros are dropped.
/// With `add_sign`, positive values get a leading `+`; the sign is decided on
/// the unrounded value, so `0.3` formats as `+0`.
///
/// ```
/// use benchbot_benchmarks::format::format_num;
///
/// assert_eq!(format_num(30556.692, 0, false), "30,557");
/// assert_eq!(format_num(20.0, 0, true), "+20");
/// assert_eq!(format_num(-1234.5, 0, true), "-1,235");
/// ```
pub fn format_num(value: f64, decimals: usize, add_sign: bool) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    let digits = format!("{:.*}", decimals, rounded.abs());

    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f.trim_end_matches('0')),
        None => (digits.as_str(), ""),
    };

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    if add_sign && value > 0.0 {
        out.push('+');
    } else if rounded < 0.0 {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
