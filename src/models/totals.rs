//! Derived totals stored on payroll records and adjustments.
//!
//! None of these values are entered by users. They are recomputed by the
//! calculation layer whenever a record or one of its adjustments changes.

use std::collections::BTreeMap;
use std::iter::Sum;
use std::ops::AddAssign;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The taxable and non-taxable parts of a single amount.
///
/// # Example
///
/// ```
/// use adjustment_engine::models::TaxableSplit;
/// use rust_decimal::Decimal;
///
/// let split = TaxableSplit::fully_taxable(Decimal::from(500));
/// assert_eq!(split.total(), Decimal::from(500));
/// assert_eq!(split.non_taxable, Decimal::ZERO);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxableSplit {
    /// Portion subject to employment income tax.
    pub taxable: Decimal,
    /// Exempt portion.
    pub non_taxable: Decimal,
}

impl TaxableSplit {
    /// Entire amount is taxable.
    pub fn fully_taxable(amount: Decimal) -> Self {
        Self {
            taxable: amount,
            non_taxable: Decimal::ZERO,
        }
    }

    /// Entire amount is exempt.
    pub fn non_taxable(amount: Decimal) -> Self {
        Self {
            taxable: Decimal::ZERO,
            non_taxable: amount,
        }
    }

    /// Sum of both parts.
    pub fn total(&self) -> Decimal {
        self.taxable + self.non_taxable
    }
}

/// Employee, employer and combined pension contributions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PensionContribution {
    /// Withheld from the employee.
    pub employee: Decimal,
    /// Paid by the employer on top of gross pay.
    pub employer: Decimal,
    /// `employee + employer`.
    pub total: Decimal,
}

impl AddAssign<&PensionContribution> for PensionContribution {
    fn add_assign(&mut self, rhs: &PensionContribution) {
        self.employee += rhs.employee;
        self.employer += rhs.employer;
        self.total += rhs.total;
    }
}

/// Totals derived from a payroll record's own lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollSummary {
    /// Overtime pay derived from overtime hours.
    pub overtime: Decimal,
    /// Sum of every earning line plus overtime.
    pub gross_pay: Decimal,
    /// Taxable part of gross pay.
    pub gross_taxable_pay: Decimal,
    /// Exempt part of gross pay.
    pub gross_non_taxable_pay: Decimal,
    /// Employment income tax on `gross_taxable_pay`.
    pub employment_income_tax: Decimal,
    /// Pension contributions on pensionable earnings.
    pub pension: PensionContribution,
    /// Sum of the deduction lines, excluding tax and pension.
    pub other_deductions: Decimal,
    /// Tax, employee pension and other deductions.
    pub total_payroll_deduction: Decimal,
    /// `gross_pay - total_payroll_deduction`, rounded to cents.
    pub net_pay: Decimal,
    /// Cost to the employer: gross pay plus employer pension.
    pub expense: Decimal,
    /// Taxable split of each partially taxable earning line.
    #[serde(default)]
    pub splits: BTreeMap<String, TaxableSplit>,
}

/// Aggregated figures for earning adjustments.
///
/// The same shape is used twice on an adjustment: once for the month being
/// corrected (the adjusted month) and once for the month the corrections are
/// paid in (the recorded month).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentTotals {
    /// Taxable part of the adjusted earnings.
    pub gross_taxable_pay: Decimal,
    /// Exempt part of the adjusted earnings.
    pub gross_non_taxable_pay: Decimal,
    /// Taxable plus exempt adjusted earnings.
    pub gross_pay: Decimal,
    /// Originally recorded taxable pay plus the adjusted taxable pay.
    pub total_taxable_pay: Decimal,
    /// Income tax on `total_taxable_pay`.
    pub employment_income_tax_total: Decimal,
    /// Additional tax owed because of the adjustment.
    pub employment_income_tax: Decimal,
    /// Pension contributions on pensionable adjusted earnings.
    pub pension: PensionContribution,
    /// Additional tax plus employee pension.
    pub total_earning_deduction: Decimal,
    /// Adjusted gross pay plus employer pension.
    pub expense: Decimal,
}

impl AddAssign<&AdjustmentTotals> for AdjustmentTotals {
    fn add_assign(&mut self, rhs: &AdjustmentTotals) {
        self.gross_taxable_pay += rhs.gross_taxable_pay;
        self.gross_non_taxable_pay += rhs.gross_non_taxable_pay;
        self.gross_pay += rhs.gross_pay;
        self.total_taxable_pay += rhs.total_taxable_pay;
        self.employment_income_tax_total += rhs.employment_income_tax_total;
        self.employment_income_tax += rhs.employment_income_tax;
        self.pension += &rhs.pension;
        self.total_earning_deduction += rhs.total_earning_deduction;
        self.expense += rhs.expense;
    }
}

impl<'a> Sum<&'a AdjustmentTotals> for AdjustmentTotals {
    fn sum<I: Iterator<Item = &'a AdjustmentTotals>>(iter: I) -> Self {
        iter.fold(Self::default(), |mut acc, totals| {
            acc += totals;
            acc
        })
    }
}
