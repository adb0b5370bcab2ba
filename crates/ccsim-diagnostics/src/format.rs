// ─────────────────────────────────────────────────────────────────────
// Cluster Charge Sim — Number Formatting
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────

/// Group the decimal digits of `n` in threes: `-1234567` → `"-1,234,567"`.
pub fn int_with_commas(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `int_with_commas` for unsigned counts; values beyond `i64::MAX` saturate.
pub fn count_with_commas(n: u64) -> String {
    int_with_commas(i64::try_from(n).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_values_unchanged() {
        assert_eq!(int_with_commas(0), "0");
        assert_eq!(int_with_commas(7), "7");
        assert_eq!(int_with_commas(999), "999");
        assert_eq!(int_with_commas(-999), "-999");
    }

    #[test]
    fn test_grouping() {
        assert_eq!(int_with_commas(1000), "1,000");
        assert_eq!(int_with_commas(1234567), "1,234,567");
        assert_eq!(int_with_commas(100000), "100,000");
        assert_eq!(int_with_commas(-1234567), "-1,234,567");
        assert_eq!(int_with_commas(-1000), "-1,000");
    }

    #[test]
    fn test_extremes() {
        assert_eq!(int_with_commas(i64::MIN), "-9,223,372,036,854,775,808");
        assert_eq!(int_with_commas(i64::MAX), "9,223,372,036,854,775,807");
        assert_eq!(count_with_commas(u64::MAX), "9,223,372,036,854,775,807");
        assert_eq!(count_with_commas(2_555_904), "2,555,904");
    }
}
