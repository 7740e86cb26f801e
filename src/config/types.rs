//! Configuration types for payroll rules.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files. Every section has a
//! `Default` carrying the statutory values used when no file overrides it.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

use crate::models::{WorkingArea, WorkingEnvironment};

/// One employment income tax bracket.
///
/// A taxable amount falls in the bracket when
/// `min_amount < amount <= max_amount`. The tax is computed on the whole
/// amount: `amount * rate / 100 - deduction`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IncomeTaxBracket {
    /// Exclusive lower bound.
    pub min_amount: Decimal,
    /// Inclusive upper bound; `None` for the top bracket.
    #[serde(default)]
    pub max_amount: Option<Decimal>,
    /// Rate in percent (e.g. 15 for 15%).
    pub rate: Decimal,
    /// Fixed amount subtracted from the computed tax.
    #[serde(default)]
    pub deduction: Decimal,
}

/// Employment income tax configuration from income_tax.yaml.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IncomeTaxConfig {
    /// Brackets, ordered by `min_amount`.
    pub brackets: Vec<IncomeTaxBracket>,
}

impl Default for IncomeTaxConfig {
    fn default() -> Self {
        let bracket = |min: i64, max: Option<i64>, rate: i64, deduction: i64| IncomeTaxBracket {
            min_amount: Decimal::from(min),
            max_amount: max.map(Decimal::from),
            rate: Decimal::from(rate),
            deduction: Decimal::from(deduction),
        };
        Self {
            brackets: vec![
                bracket(0, Some(2000), 0, 0),
                bracket(2000, Some(4000), 15, 300),
                bracket(4000, Some(7000), 20, 500),
                bracket(7000, Some(10000), 25, 850),
                bracket(10000, Some(14000), 30, 1350),
                bracket(14000, None, 35, 2050),
            ],
        }
    }
}

/// Pension contribution rates from pension.yaml.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PensionRates {
    /// Fraction of pensionable pay withheld from the employee.
    pub personnel_rate: Decimal,
    /// Fraction of pensionable pay contributed by the employer.
    pub employer_rate: Decimal,
}

impl Default for PensionRates {
    fn default() -> Self {
        Self {
            personnel_rate: Decimal::new(7, 2),
            employer_rate: Decimal::new(11, 2),
        }
    }
}

/// Exemption limit tied to the basic salary (`salary / salary_divisor`)
/// with a fallback ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SalaryLinkedCap {
    /// Divisor applied to the basic salary.
    pub salary_divisor: Decimal,
    /// Exempt ceiling applied when the salary-linked limit is exceeded.
    pub cap_amount: Decimal,
}

impl Default for SalaryLinkedCap {
    fn default() -> Self {
        Self {
            salary_divisor: Decimal::from(4),
            cap_amount: Decimal::from(2200),
        }
    }
}

/// Per diem exemption rule for a working area.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PerDiemLimit {
    /// Daily exempt limit as a fraction of the basic salary.
    #[serde(default)]
    pub percent_limit: Decimal,
    /// Daily exempt floor.
    #[serde(default)]
    pub cap_amount: Decimal,
    /// The whole per diem is exempt.
    #[serde(default)]
    pub fully_non_taxable: bool,
}

impl PerDiemLimit {
    fn partial(percent_limit: Decimal, cap_amount: i64) -> Self {
        Self {
            percent_limit,
            cap_amount: Decimal::from(cap_amount),
            fully_non_taxable: false,
        }
    }

    fn exempt() -> Self {
        Self {
            percent_limit: Decimal::ZERO,
            cap_amount: Decimal::ZERO,
            fully_non_taxable: true,
        }
    }
}

/// Allowance exemption configuration from allowances.yaml.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AllowanceConfig {
    /// Exempt ceiling for transport from home to office.
    pub transport_home_to_office_cap: Decimal,
    /// Exempt ceiling for fuel from home to office.
    pub fuel_home_to_office_cap: Decimal,
    /// Exemption rule for transport used for work.
    pub transport_for_work: SalaryLinkedCap,
    /// Exemption rule for fuel used for work.
    pub fuel_for_work: SalaryLinkedCap,
    /// Exempt hardship allowance as a fraction of basic salary.
    pub hardship_limits: HashMap<WorkingEnvironment, Decimal>,
    /// Per diem exemption by working area.
    pub per_diem: HashMap<WorkingArea, PerDiemLimit>,
}

impl Default for AllowanceConfig {
    fn default() -> Self {
        let hardship_limits = HashMap::from([
            (WorkingEnvironment::Adverse, Decimal::new(25, 2)),
            (WorkingEnvironment::VeryAdverse, Decimal::new(40, 2)),
            (WorkingEnvironment::ExtremelyAdverse, Decimal::new(60, 2)),
        ]);
        let per_diem = HashMap::from([
            (
                WorkingArea::NonGovernmentalManager,
                PerDiemLimit::partial(Decimal::new(5, 2), 1000),
            ),
            (
                WorkingArea::DeputyNonGovernmentalManager,
                PerDiemLimit::partial(Decimal::new(5, 2), 1000),
            ),
            (
                WorkingArea::NonGovernmentalExpert,
                PerDiemLimit::partial(Decimal::new(4, 2), 500),
            ),
            (
                WorkingArea::Other,
                PerDiemLimit::partial(Decimal::new(4, 2), 500),
            ),
            (WorkingArea::GovernmentOfficial, PerDiemLimit::exempt()),
            (
                WorkingArea::ConstructionMachineryOperator,
                PerDiemLimit::exempt(),
            ),
        ]);
        Self {
            transport_home_to_office_cap: Decimal::from(600),
            fuel_home_to_office_cap: Decimal::from(600),
            transport_for_work: SalaryLinkedCap::default(),
            fuel_for_work: SalaryLinkedCap::default(),
            hardship_limits,
            per_diem,
        }
    }
}

/// Overtime multipliers from overtime.yaml.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OvertimeMultipliers {
    /// Working hours in a month; `basic_salary / monthly_hours` is the hourly rate.
    pub monthly_hours: Decimal,
    /// Evening overtime multiplier.
    pub evening: Decimal,
    /// Night overtime multiplier.
    pub night: Decimal,
    /// Weekly rest day multiplier.
    pub rest_day: Decimal,
    /// Public holiday multiplier.
    pub public_holiday: Decimal,
}

impl Default for OvertimeMultipliers {
    fn default() -> Self {
        Self {
            monthly_hours: Decimal::from(240),
            evening: Decimal::new(125, 2),
            night: Decimal::new(150, 2),
            rest_day: Decimal::from(2),
            public_holiday: Decimal::new(250, 2),
        }
    }
}

/// The complete payroll rule configuration.
///
/// # Example
///
/// ```
/// use adjustment_engine::config::PayrollConfig;
/// use rust_decimal::Decimal;
///
/// let config = PayrollConfig::default();
/// assert_eq!(config.pension().personnel_rate, Decimal::new(7, 2));
/// assert_eq!(config.income_tax().brackets.len(), 6);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayrollConfig {
    income_tax: IncomeTaxConfig,
    pension: PensionRates,
    allowances: AllowanceConfig,
    overtime: OvertimeMultipliers,
}

impl PayrollConfig {
    /// Creates a PayrollConfig from its component parts.
    ///
    /// Brackets are sorted by their lower bound.
    pub fn new(
        income_tax: IncomeTaxConfig,
        pension: PensionRates,
        allowances: AllowanceConfig,
        overtime: OvertimeMultipliers,
    ) -> Self {
        let mut income_tax = income_tax;
        income_tax
            .brackets
            .sort_by(|a, b| a.min_amount.cmp(&b.min_amount));
        Self {
            income_tax,
            pension,
            allowances,
            overtime,
        }
    }

    /// Returns the income tax configuration.
    pub fn income_tax(&self) -> &IncomeTaxConfig {
        &self.income_tax
    }

    /// Returns the pension rates.
    pub fn pension(&self) -> &PensionRates {
        &self.pension
    }

    /// Returns the allowance exemption configuration.
    pub fn allowances(&self) -> &AllowanceConfig {
        &self.allowances
    }

    /// Returns the overtime multipliers.
    pub fn overtime(&self) -> &OvertimeMultipliers {
        &self.overtime
    }
}
