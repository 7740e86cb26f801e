//! Payroll summary calculation.
//!
//! Derives the totals stored on a [`PayrollRecord`] from its own earning and
//! deduction lines and overtime hours. Adjustments are not included; they are
//! aggregated separately onto `earning_adjustment` and
//! `deduction_adjustment_total`.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::config::{OvertimeMultipliers, PayrollConfig};
use crate::error::{EngineError, EngineResult};
use crate::models::{OvertimeHours, PayrollRecord, PayrollSummary, TaxableSplit};

use super::classifier::{TaxabilityClass, classify};
use super::income_tax::calculate_income_tax;
use super::pension::calculate_pension;
use super::taxability::split_component;

/// Name of the earning component derived from overtime hours.
pub const OVERTIME_COMPONENT: &str = "overtime";

/// Calculates overtime pay from hours worked.
///
/// The hourly rate is `basic_salary / monthly_hours`; each band's hours are
/// multiplied by its multiplier. The result is rounded to cents.
///
/// # Examples
///
/// ```
/// use adjustment_engine::calculation::calculate_overtime;
/// use adjustment_engine::config::OvertimeMultipliers;
/// use adjustment_engine::models::OvertimeHours;
/// use rust_decimal::Decimal;
///
/// let hours = OvertimeHours {
///     night: Decimal::from(4),
///     ..Default::default()
/// };
/// // 12000 / 240 = 50 per hour, 4h at 1.5
/// let pay = calculate_overtime(Decimal::from(12000), &hours, &OvertimeMultipliers::default()).unwrap();
/// assert_eq!(pay, Decimal::from(300));
/// ```
pub fn calculate_overtime(
    basic_salary: Decimal,
    hours: &OvertimeHours,
    multipliers: &OvertimeMultipliers,
) -> EngineResult<Decimal> {
    if hours.is_empty() {
        return Ok(Decimal::ZERO);
    }
    if multipliers.monthly_hours <= Decimal::ZERO {
        return Err(EngineError::CalculationError {
            message: "monthly_hours must be positive to derive an hourly rate".to_string(),
        });
    }

    let hourly_rate = basic_salary / multipliers.monthly_hours;
    let weighted_hours = hours.evening * multipliers.evening
        + hours.night * multipliers.night
        + hours.rest_day * multipliers.rest_day
        + hours.public_holiday * multipliers.public_holiday;

    Ok((hourly_rate * weighted_hours).round_dp(2))
}

/// Derives the summary totals of a payroll record.
///
/// # Errors
///
/// - `Validation` if the record carries an explicit overtime line
/// - `UnknownComponent` for any unknown line name
/// - `ComponentKindMismatch` if a deduction is listed as an earning or the
///   reverse
pub fn calculate_payroll_summary(
    record: &PayrollRecord,
    config: &PayrollConfig,
) -> EngineResult<PayrollSummary> {
    if record.earnings.contains_key(OVERTIME_COMPONENT) {
        return Err(EngineError::validation(
            "earnings.overtime",
            "overtime pay is derived from overtime_hours",
        ));
    }

    let overtime = calculate_overtime(
        record.personnel.basic_salary,
        &record.overtime_hours,
        config.overtime(),
    )?;

    let mut gross_taxable_pay = overtime;
    let mut gross_non_taxable_pay = Decimal::ZERO;
    let mut pensionable = Decimal::ZERO;
    let mut splits = BTreeMap::new();

    for (component, amount) in &record.earnings {
        let class = classify(component)?;
        let split: TaxableSplit =
            split_component(component, *amount, &record.personnel, config.allowances())?;

        gross_taxable_pay += split.taxable;
        gross_non_taxable_pay += split.non_taxable;
        if class.is_pensionable() {
            pensionable += *amount;
        }
        if class == TaxabilityClass::PartiallyTaxable {
            splits.insert(component.clone(), split);
        }
    }

    let mut other_deductions = Decimal::ZERO;
    for (component, amount) in &record.deductions {
        if classify(component)? != TaxabilityClass::Deduction {
            return Err(EngineError::ComponentKindMismatch {
                name: component.clone(),
                expected: "a deduction".to_string(),
            });
        }
        other_deductions += *amount;
    }

    let gross_pay = gross_taxable_pay + gross_non_taxable_pay;
    let employment_income_tax = calculate_income_tax(gross_taxable_pay, config.income_tax());
    let pension = calculate_pension(pensionable, config.pension());
    let total_payroll_deduction = employment_income_tax + pension.employee + other_deductions;

    Ok(PayrollSummary {
        overtime,
        gross_pay,
        gross_taxable_pay,
        gross_non_taxable_pay,
        employment_income_tax,
        net_pay: (gross_pay - total_payroll_deduction).round_dp(2),
        expense: gross_pay + pension.employer,
        pension,
        other_deductions,
        total_payroll_deduction,
        splits,
    })
}
