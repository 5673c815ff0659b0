//! Display helpers shared by the CLI and the exporters.

/// Digits of `n` in groups of three: 1234567 -> "1,234,567"
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let lead = digits.len() % 3;
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, d) in digits.char_indices() {
        if i > 0 && (i + 3 - lead) % 3 == 0 {
            out.push(',');
        }
        out.push(d);
    }
    out
}

/// Dollar amount rounded to the cent: $1,234.56 / -$500.00. Amounts that
/// round to zero never carry a minus sign.
pub fn money(val: f64) -> String {
    let cents = (val.abs() * 100.0).round() as u64;
    let sign = if val < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${}.{:02}", group_thousands(cents / 100), cents % 100)
}

/// Net flow gets an explicit sign: +$1,240.25 / -$80.00
pub fn signed_money(val: f64) -> String {
    if val >= 0.0 {
        format!("+{}", money(val))
    } else {
        money(val)
    }
}

/// Remaining-time label: "2m 5s" or "45s".
pub fn format_time(seconds: u64) -> String {
    let mins = seconds / 60;
    let secs = seconds % 60;
    if mins > 0 {
        format!("{mins}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.56), "$1,234.56");
        assert_eq!(money(-500.00), "-$500.00");
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(-0.001), "$0.00");
        assert_eq!(money(1000000.99), "$1,000,000.99");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(12_345), "12,345");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_money_rounds_to_cents() {
        assert_eq!(money(0.005), "$0.01");
        assert_eq!(money(999.999), "$1,000.00");
        assert_eq!(money(-1234.5), "-$1,234.50");
    }

    #[test]
    fn test_signed_money() {
        assert_eq!(signed_money(1240.25), "+$1,240.25");
        assert_eq!(signed_money(-80.0), "-$80.00");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(120), "2m 0s");
        assert_eq!(format_time(125), "2m 5s");
        assert_eq!(format_time(45), "45s");
        assert_eq!(format_time(0), "0s");
    }
}
