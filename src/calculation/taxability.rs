//! Taxable and non-taxable split of earning components.
//!
//! Fully taxable and exempt components split trivially. Partially taxable
//! allowances are exempt up to a limit that depends on the employee's basic
//! salary, working environment or working area.

use rust_decimal::Decimal;

use crate::config::{AllowanceConfig, SalaryLinkedCap};
use crate::error::{EngineError, EngineResult};
use crate::models::{PersonnelProfile, TaxableSplit};

use super::classifier::{TaxabilityClass, classify};

/// Splits an earning amount into its taxable and non-taxable parts.
///
/// # Arguments
///
/// * `component` - The earning component name (e.g. "transport_for_work")
/// * `amount` - The amount paid for the component
/// * `personnel` - The employee the amount is paid to
/// * `allowances` - Allowance exemption limits
///
/// # Errors
///
/// Returns `UnknownComponent` for an unknown name and `ComponentKindMismatch`
/// when the component is a deduction.
///
/// # Examples
///
/// ```
/// use adjustment_engine::calculation::split_component;
/// use adjustment_engine::config::AllowanceConfig;
/// use adjustment_engine::models::{PersonnelProfile, WorkingArea, WorkingEnvironment};
/// use rust_decimal::Decimal;
///
/// let personnel = PersonnelProfile {
///     personnel_id: "EMP-001".to_string(),
///     full_name: String::new(),
///     basic_salary: Decimal::from(8000),
///     working_environment: WorkingEnvironment::Good,
///     working_area: WorkingArea::Other,
///     daily_per_diem: Decimal::ZERO,
/// };
///
/// // 8000 / 4 = 2000 exempt, the rest taxable
/// let split = split_component(
///     "transport_for_work",
///     Decimal::from(2500),
///     &personnel,
///     &AllowanceConfig::default(),
/// )
/// .unwrap();
/// assert_eq!(split.non_taxable, Decimal::from(2000));
/// assert_eq!(split.taxable, Decimal::from(500));
/// ```
pub fn split_component(
    component: &str,
    amount: Decimal,
    personnel: &PersonnelProfile,
    allowances: &AllowanceConfig,
) -> EngineResult<TaxableSplit> {
    match classify(component)? {
        TaxabilityClass::FullyTaxable | TaxabilityClass::Pensionable | TaxabilityClass::Deferred => {
            Ok(TaxableSplit::fully_taxable(amount))
        }
        TaxabilityClass::NonTaxable => Ok(TaxableSplit::non_taxable(amount)),
        TaxabilityClass::PartiallyTaxable => {
            split_partially_taxable(component, amount, personnel, allowances)
        }
        TaxabilityClass::Deduction => Err(EngineError::ComponentKindMismatch {
            name: component.to_string(),
            expected: "an earning".to_string(),
        }),
    }
}

fn split_partially_taxable(
    component: &str,
    amount: Decimal,
    personnel: &PersonnelProfile,
    allowances: &AllowanceConfig,
) -> EngineResult<TaxableSplit> {
    let amount = amount.max(Decimal::ZERO);
    let split = match component {
        "transport_home_to_office" => {
            split_with_ceiling(amount, allowances.transport_home_to_office_cap)
        }
        "fuel_home_to_office" => split_with_ceiling(amount, allowances.fuel_home_to_office_cap),
        "transport_for_work" => {
            split_salary_linked(amount, personnel.basic_salary, &allowances.transport_for_work)
        }
        "fuel_for_work" => {
            split_salary_linked(amount, personnel.basic_salary, &allowances.fuel_for_work)
        }
        "hardship_allowance" => split_hardship(amount, personnel, allowances),
        "per_diem" => split_per_diem(amount, personnel, allowances),
        other => {
            return Err(EngineError::CalculationError {
                message: format!("No exemption rule for partially taxable component '{}'", other),
            });
        }
    };
    Ok(split)
}

/// Exempt up to `ceiling`, taxable above it.
fn split_with_ceiling(amount: Decimal, ceiling: Decimal) -> TaxableSplit {
    let ceiling = ceiling.max(Decimal::ZERO);
    if amount <= ceiling {
        TaxableSplit::non_taxable(amount)
    } else {
        TaxableSplit {
            taxable: amount - ceiling,
            non_taxable: ceiling,
        }
    }
}

/// Exempt up to `salary / divisor`; once exceeded, the exemption is that
/// limit when it is below the cap and the cap otherwise.
fn split_salary_linked(amount: Decimal, basic_salary: Decimal, rule: &SalaryLinkedCap) -> TaxableSplit {
    if rule.salary_divisor.is_zero() {
        return split_with_ceiling(amount, rule.cap_amount);
    }
    let limit = basic_salary / rule.salary_divisor;
    if amount <= limit {
        TaxableSplit::non_taxable(amount)
    } else if limit < rule.cap_amount {
        split_with_ceiling(amount, limit)
    } else {
        split_with_ceiling(amount, rule.cap_amount)
    }
}

fn split_hardship(
    amount: Decimal,
    personnel: &PersonnelProfile,
    allowances: &AllowanceConfig,
) -> TaxableSplit {
    // Environments without a configured limit get no exemption.
    let percent = allowances
        .hardship_limits
        .get(&personnel.working_environment)
        .copied()
        .unwrap_or_default();
    split_with_ceiling(amount, personnel.basic_salary * percent)
}

/// Per diem exemption is assessed on the daily rate, then scaled to the
/// amount claimed.
fn split_per_diem(
    amount: Decimal,
    personnel: &PersonnelProfile,
    allowances: &AllowanceConfig,
) -> TaxableSplit {
    let Some(rule) = allowances.per_diem.get(&personnel.working_area) else {
        return TaxableSplit::fully_taxable(amount);
    };
    if rule.fully_non_taxable {
        return TaxableSplit::non_taxable(amount);
    }

    let daily = personnel.daily_per_diem;
    if daily <= Decimal::ZERO {
        return TaxableSplit::fully_taxable(amount);
    }

    let ceiling = (personnel.basic_salary * rule.percent_limit).max(rule.cap_amount);
    let exempt_daily = daily.min(ceiling);
    let non_taxable = (amount * exempt_daily / daily).round_dp(2);
    TaxableSplit {
        taxable: amount - non_taxable,
        non_taxable,
    }
}
