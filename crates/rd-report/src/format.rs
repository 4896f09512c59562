//! Number formatting for the text report.

use rd_types::{percent_points, round_half_away, UnwindHorizon};
use rust_decimal::Decimal;

/// Fixed decimals with comma thousands separators, e.g. `-1,234.50`.
pub fn thousands(value: Decimal, dp: u32) -> String {
    let rounded = round_half_away(value, dp);
    let digits = format!("{:.prec$}", rounded.abs(), prec = dp as usize);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// Dollar amount, e.g. `$1,234.56` or `-$933.00`.
pub fn usd(value: Decimal) -> String {
    let body = thousands(value, 2);
    match body.strip_prefix('-') {
        Some(abs) => format!("-${}", abs),
        None => format!("${}", body),
    }
}

/// Fraction rendered as a percentage, e.g. `0.1234` at 2 places is `12.34%`.
pub fn percent(value: Decimal, dp: u32) -> String {
    format!("{:.prec$}%", percent_points(value, dp), prec = dp as usize)
}

/// Plain fixed-point number.
pub fn fixed(value: Decimal, dp: u32) -> String {
    format!("{:.prec$}", round_half_away(value, dp), prec = dp as usize)
}

/// Days to unwind; an unbounded horizon prints as `inf`.
pub fn horizon(value: UnwindHorizon) -> String {
    match value {
        UnwindHorizon::Days(d) => fixed(d, 2),
        UnwindHorizon::Unbounded => "inf".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn thousands_grouping() {
        assert_eq!(thousands(dec!(0), 2), "0.00");
        assert_eq!(thousands(dec!(999.999), 2), "1,000.00");
        assert_eq!(thousands(dec!(1234567.891), 2), "1,234,567.89");
        assert_eq!(thousands(dec!(-21067), 0), "-21,067");
        assert_eq!(thousands(dec!(100000), 0), "100,000");
        assert_eq!(thousands(dec!(-0.001), 2), "0.00");
    }

    #[test]
    fn usd_format() {
        assert_eq!(usd(dec!(21067)), "$21,067.00");
        assert_eq!(usd(dec!(-933)), "-$933.00");
        assert_eq!(usd(dec!(530.665)), "$530.67");
    }

    #[test]
    fn percent_format() {
        assert_eq!(percent(dec!(-0.0442873), 2), "-4.43%");
        assert_eq!(percent(dec!(0.025189), 4), "2.5189%");
        assert_eq!(percent(dec!(0.3), 2), "30.00%");
    }

    #[test]
    fn horizon_format() {
        assert_eq!(horizon(UnwindHorizon::Days(dec!(10))), "10.00");
        assert_eq!(horizon(UnwindHorizon::Days(dec!(5.666666))), "5.67");
        assert_eq!(horizon(UnwindHorizon::Unbounded), "inf");
    }
}
