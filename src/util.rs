// Value normalization and small numeric helpers.
//
// Catalogue targets and submitted values are curated by hand, so everything
// here is total: placeholders and garbage become `0` instead of errors.
use num_format::{Locale, ToFormattedString};
use std::collections::BTreeMap;

use crate::types::RawValue;

/// Normalize a stored target or actual into a plain number.
///
/// - Missing values and the `"-"` placeholder are `0`.
/// - Numbers pass through unchanged.
/// - Text keeps only digits and `.` (so `"80%"` is `80` and `"1,000"` is
///   `1000`); anything that still does not parse is `0`.
pub fn parse_value(raw: Option<&RawValue>) -> f64 {
    match raw {
        None => 0.0,
        Some(RawValue::Number(n)) => *n,
        Some(RawValue::Text(s)) => parse_text(s),
    }
}

pub fn parse_text(s: &str) -> f64 {
    if s.trim() == "-" {
        return 0.0;
    }
    let digits: String = s.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    match digits.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Parse `maize=10;beans=2,500` into a key to value map. Pairs without `=`
/// or with an empty key are dropped.
pub fn parse_sub_values(s: Option<&str>) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();
    let Some(s) = s else {
        return out;
    };
    for pair in s.split(';') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        out.insert(key.to_string(), parse_text(value));
    }
    out
}

/// `true`, `yes` and `1` (any case) are set; everything else is not.
pub fn parse_flag(s: Option<&str>) -> bool {
    matches!(
        s.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("true") | Some("yes") | Some("1")
    )
}

pub fn average(v: &[f64]) -> f64 {
    // Returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// Round half away from zero to two decimals. Only applied to final
/// presentation values.
pub fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators (`1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_percent_and_thousands() {
        assert_eq!(parse_value(Some(&RawValue::from("80%"))), 80.0);
        assert_eq!(parse_value(Some(&RawValue::from("62%"))), 62.0);
        assert_eq!(parse_value(Some(&RawValue::from("1,000"))), 1000.0);
        assert_eq!(
            parse_value(Some(&RawValue::from("1,685,230,763"))),
            1_685_230_763.0
        );
    }

    #[test]
    fn test_parse_value_placeholders_are_zero() {
        assert_eq!(parse_value(None), 0.0);
        assert_eq!(parse_value(Some(&RawValue::from("-"))), 0.0);
        assert_eq!(parse_value(Some(&RawValue::from(""))), 0.0);
        assert_eq!(parse_value(Some(&RawValue::from("n/a"))), 0.0);
        assert_eq!(parse_value(Some(&RawValue::from("1.2.3"))), 0.0);
    }

    #[test]
    fn test_parse_value_numbers_unchanged_and_idempotent() {
        assert_eq!(parse_value(Some(&RawValue::Number(42.5))), 42.5);
        for raw in ["80%", "1,000", "-", "12.75", "abc"] {
            let once = parse_value(Some(&RawValue::from(raw)));
            let twice = parse_value(Some(&RawValue::Number(once)));
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_parse_sub_values() {
        let m = parse_sub_values(Some("maize=10; beans = 2,500;broken;=4"));
        assert_eq!(m.len(), 2);
        assert_eq!(m["maize"], 10.0);
        assert_eq!(m["beans"], 2500.0);
        assert!(parse_sub_values(None).is_empty());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(Some("TRUE")));
        assert!(parse_flag(Some(" 1 ")));
        assert!(!parse_flag(Some("false")));
        assert!(!parse_flag(None));
    }

    #[test]
    fn test_round2_and_format() {
        assert_eq!(round2(37.499), 37.5);
        assert_eq!(round2(30.30303), 30.3);
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-0.0, 2), "0.00");
        assert_eq!(format_int(9855), "9,855");
    }
}
