use rust_decimal::Decimal;

fn two_places(val: Decimal) -> Decimal {
    let mut rounded = val.round_dp(2);
    rounded.rescale(2);
    rounded
}

/// Signed amount with two decimals: `+20.00`, `-20.00`.
pub fn signed(val: Decimal) -> String {
    let fixed = two_places(val);
    if fixed.is_sign_negative() && !fixed.is_zero() {
        format!("{fixed}")
    } else {
        format!("+{}", fixed.abs())
    }
}

/// Format a decimal as a currency amount with thousands separators: $1,234.56
pub fn money(val: Decimal, currency: &str) -> String {
    let fixed = two_places(val);
    let negative = fixed.is_sign_negative() && !fixed.is_zero();
    let cents = fixed.abs().to_string();
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-{currency}{with_commas}.{dec_part}")
    } else {
        format!("{currency}{with_commas}.{dec_part}")
    }
}

/// Amount as it appears in receipt file names: `12.30` -> `12_30`.
pub fn filename_amount(val: Decimal) -> String {
    two_places(val.abs()).to_string().replace('.', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(d("1234.56"), "$"), "$1,234.56");
        assert_eq!(money(d("-500"), "$"), "-$500.00");
        assert_eq!(money(d("0"), "$"), "$0.00");
        assert_eq!(money(d("1000000.99"), "$"), "$1,000,000.99");
        assert_eq!(money(d("42.1"), "EUR "), "EUR 42.10");
    }

    #[test]
    fn test_signed() {
        assert_eq!(signed(d("20")), "+20.00");
        assert_eq!(signed(d("-20")), "-20.00");
        assert_eq!(signed(d("0")), "+0.00");
        assert_eq!(signed(d("3.456")), "+3.46");
    }

    #[test]
    fn test_filename_amount() {
        assert_eq!(filename_amount(d("20")), "20_00");
        assert_eq!(filename_amount(d("-12.3")), "12_30");
        assert_eq!(filename_amount(d("1234.56")), "1234_56");
    }
}
