//! Employment income tax calculation.

use rust_decimal::Decimal;

use crate::config::IncomeTaxConfig;

/// Calculates employment income tax on a monthly taxable amount.
///
/// The bracket containing `taxable_pay` (`min < pay <= max`) is applied to the
/// whole amount: `pay * rate / 100 - deduction`, floored at zero and rounded
/// to cents. Amounts outside every bracket, including zero and negative
/// amounts, owe nothing.
///
/// # Examples
///
/// ```
/// use adjustment_engine::calculation::calculate_income_tax;
/// use adjustment_engine::config::IncomeTaxConfig;
/// use rust_decimal::Decimal;
///
/// let brackets = IncomeTaxConfig::default();
///
/// // 10000 falls in the 25% bracket: 2500 - 850
/// assert_eq!(calculate_income_tax(Decimal::from(10000), &brackets), Decimal::from(1650));
/// assert_eq!(calculate_income_tax(Decimal::from(1500), &brackets), Decimal::ZERO);
/// ```
pub fn calculate_income_tax(taxable_pay: Decimal, config: &IncomeTaxConfig) -> Decimal {
    config
        .brackets
        .iter()
        .find(|bracket| {
            taxable_pay > bracket.min_amount
                && bracket.max_amount.is_none_or(|max| taxable_pay <= max)
        })
        .map(|bracket| {
            let tax = taxable_pay * bracket.rate / Decimal::ONE_HUNDRED - bracket.deduction;
            tax.max(Decimal::ZERO).round_dp(2)
        })
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn tax(amount: &str) -> Decimal {
        calculate_income_tax(dec(amount), &IncomeTaxConfig::default())
    }

    /// IT-001: zero and negative pay owe nothing
    #[test]
    fn test_zero_and_negative() {
        assert_eq!(tax("0"), Decimal::ZERO);
        assert_eq!(tax("-500"), Decimal::ZERO);
    }

    /// IT-002: exempt bracket upper bound is inclusive
    #[test]
    fn test_exempt_bracket_boundary() {
        assert_eq!(tax("2000"), Decimal::ZERO);
        assert_eq!(tax("2000.01"), dec("0.00"));
    }

    /// IT-003: each bracket at its upper bound
    #[test]
    fn test_bracket_upper_bounds() {
        assert_eq!(tax("4000"), dec("300"));
        assert_eq!(tax("7000"), dec("900"));
        assert_eq!(tax("10000"), dec("1650"));
        assert_eq!(tax("14000"), dec("2850"));
    }

    /// IT-004: top bracket is open ended
    #[test]
    fn test_top_bracket() {
        assert_eq!(tax("20000"), dec("4950"));
    }

    /// IT-005: result is rounded to cents
    #[test]
    fn test_rounding() {
        assert_eq!(tax("3333.33"), dec("200.00"));
        assert_eq!(tax("5000.05"), dec("500.01"));
    }

    /// IT-006: empty bracket table owes nothing
    #[test]
    fn test_no_brackets() {
        let config = IncomeTaxConfig { brackets: vec![] };
        assert_eq!(calculate_income_tax(dec("9000"), &config), Decimal::ZERO);
    }
}
