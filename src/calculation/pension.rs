//! Pension contribution calculation.

use rust_decimal::Decimal;

use crate::config::PensionRates;
use crate::models::PensionContribution;

/// Calculates employee and employer contributions on a pensionable amount.
///
/// Contributions are not rounded; rounding happens on the figures that are
/// paid out (net pay).
///
/// # Examples
///
/// ```
/// use adjustment_engine::calculation::calculate_pension;
/// use adjustment_engine::config::PensionRates;
/// use rust_decimal::Decimal;
///
/// let pension = calculate_pension(Decimal::from(10000), &PensionRates::default());
/// assert_eq!(pension.employee, Decimal::from(700));
/// assert_eq!(pension.employer, Decimal::from(1100));
/// assert_eq!(pension.total, Decimal::from(1800));
/// ```
pub fn calculate_pension(pensionable: Decimal, rates: &PensionRates) -> PensionContribution {
    let employee = pensionable * rates.personnel_rate;
    let employer = pensionable * rates.employer_rate;
    PensionContribution {
        employee,
        employer,
        total: employee + employer,
    }
}
