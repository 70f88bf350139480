//! Base-unit to display-string conversion
//!
//! Amounts are carried as integer base units everywhere; strings exist only
//! at the UI boundary. Conversion is pure integer arithmetic so the
//! format/parse round trip is exact across the whole u64 range.

/// 10^precision, saturating for out-of-range precisions
#[must_use]
pub fn pow10(precision: u8) -> u64 {
    10u64.checked_pow(u32::from(precision)).unwrap_or(u64::MAX)
}

/// Render base units as a grouped display string with exactly
/// `precision` fractional digits
#[must_use]
pub fn format_units(units: u64, precision: u8) -> String {
    let scale = pow10(precision);
    let whole = units / scale;
    let frac = units % scale;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if precision == 0 {
        grouped
    } else {
        format!("{grouped}.{frac:0width$}", width = precision as usize)
    }
}

/// Parse free-form user input into base units
///
/// Grouping separators and stray characters are ignored. Anything that
/// does not yield a usable non-negative number parses as zero. Fractional
/// digits beyond `precision` are rounded half-up.
#[must_use]
pub fn parse_units(text: &str, precision: u8) -> u64 {
    if text.contains('-') {
        return 0;
    }

    let mut whole_digits = String::new();
    let mut frac_digits = String::new();
    let mut seen_dot = false;
    let mut seen_any = false;
    for ch in text.chars() {
        match ch {
            '0'..='9' => {
                seen_any = true;
                if seen_dot {
                    frac_digits.push(ch);
                } else {
                    whole_digits.push(ch);
                }
            }
            '.' => {
                // A second decimal point terminates the number
                if seen_dot {
                    break;
                }
                seen_dot = true;
            }
            ',' | ' ' | '_' => {}
            _ => {}
        }
    }
    if !seen_any {
        return 0;
    }

    let scale = pow10(precision);
    let whole: u64 = if whole_digits.is_empty() {
        0
    } else {
        // Overflow-length digit runs saturate rather than wrap
        whole_digits.parse().unwrap_or(u64::MAX)
    };

    let p = precision as usize;
    let mut frac: u64 = 0;
    if p > 0 {
        let taken: String = frac_digits.chars().take(p).collect();
        if !taken.is_empty() {
            let missing = p - taken.len();
            frac = taken.parse::<u64>().unwrap_or(0) * pow10(missing as u8);
        }
    }
    let round_up = frac_digits
        .chars()
        .nth(p)
        .and_then(|c| c.to_digit(10))
        .is_some_and(|d| d >= 5);

    whole
        .saturating_mul(scale)
        .saturating_add(frac)
        .saturating_add(u64::from(round_up))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 8, "0.00000000")]
    #[case(1, 8, "0.00000001")]
    #[case(100_000_000, 8, "1.00000000")]
    #[case(123_456_789, 8, "1.23456789")]
    #[case(1_234_567, 0, "1,234,567")]
    #[case(1_000_000_000, 2, "10,000,000.00")]
    fn formats_with_grouping(#[case] units: u64, #[case] precision: u8, #[case] expected: &str) {
        assert_eq!(format_units(units, precision), expected);
    }

    #[rstest]
    #[case("", 8, 0)]
    #[case("abc", 8, 0)]
    #[case("-5", 8, 0)]
    #[case("1.23456789", 8, 123_456_789)]
    #[case("1,234,567", 0, 1_234_567)]
    #[case("1.2.3", 2, 120)]
    #[case("0.005", 2, 1)]
    #[case("0.004", 2, 0)]
    #[case("12.6", 0, 13)]
    #[case("$1,000.50", 2, 100_050)]
    #[case(".5", 2, 50)]
    fn parses_messy_input(#[case] text: &str, #[case] precision: u8, #[case] expected: u64) {
        assert_eq!(parse_units(text, precision), expected);
    }

    proptest! {
        #[test]
        fn format_parse_round_trip(units in 0u64..=u64::MAX / 2, precision in 0u8..=8) {
            let text = format_units(units, precision);
            prop_assert_eq!(parse_units(&text, precision), units);
        }
    }
}
