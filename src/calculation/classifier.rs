//! Pay component classification.
//!
//! Every earning or deduction line is keyed by a component name. This module
//! maps those names onto the class that decides how the amount is taxed and
//! whether it attracts pension.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Earnings taxed in full.
pub const FULLY_TAXABLE: &[&str] = &[
    "overtime",
    "housing_allowance",
    "position_allowance",
    "commission",
    "telephone_allowance",
    "one_time_bonus",
    "casual_labor_wage",
];

/// Earnings taxed in full and subject to pension.
pub const PENSIONABLE: &[&str] = &["basic_salary"];

/// Earnings with an exempt portion up to a configured limit.
pub const PARTIALLY_TAXABLE: &[&str] = &[
    "transport_home_to_office",
    "transport_for_work",
    "fuel_home_to_office",
    "fuel_for_work",
    "per_diem",
    "hardship_allowance",
];

/// Earnings exempt from income tax.
pub const NON_TAXABLE: &[&str] = &[
    "public_cash_award",
    "incidental_operation_allowance",
    "medical_allowance",
    "cash_gift",
    "personal_injury",
    "child_support_payment",
    "tuition_fees",
];

/// Bonuses and encashments paid outside the regular cycle; taxed in full.
pub const DEFERRED_EARNINGS: &[&str] = &[
    "leave_encashment",
    "quarterly_bonus",
    "semi_annual_bonus",
    "annual_bonus",
    "performance_based_bonus",
    "project_completion_bonuses",
    "holiday_bonus",
    "other_bonus",
];

/// Deduction components.
pub const DEDUCTIONS: &[&str] = &[
    "charitable_donation",
    "saving_plan",
    "loan_payment",
    "court_order",
    "workers_association",
    "personnel_insurance_saving",
    "university_cost_share_pay",
    "red_cross",
    "party_contribution",
    "other_deduction",
];

/// How a pay component is treated for tax and pension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxabilityClass {
    /// Taxed in full.
    FullyTaxable,
    /// Taxed in full and subject to pension.
    Pensionable,
    /// Exempt up to a limit that depends on the employee.
    PartiallyTaxable,
    /// Exempt.
    NonTaxable,
    /// Irregular bonus or encashment, taxed in full.
    Deferred,
    /// Not an earning.
    Deduction,
}

impl TaxabilityClass {
    /// All classes, in declaration order.
    pub const ALL: [TaxabilityClass; 6] = [
        TaxabilityClass::FullyTaxable,
        TaxabilityClass::Pensionable,
        TaxabilityClass::PartiallyTaxable,
        TaxabilityClass::NonTaxable,
        TaxabilityClass::Deferred,
        TaxabilityClass::Deduction,
    ];

    /// Component names belonging to this class.
    pub fn components(self) -> &'static [&'static str] {
        match self {
            TaxabilityClass::FullyTaxable => FULLY_TAXABLE,
            TaxabilityClass::Pensionable => PENSIONABLE,
            TaxabilityClass::PartiallyTaxable => PARTIALLY_TAXABLE,
            TaxabilityClass::NonTaxable => NON_TAXABLE,
            TaxabilityClass::Deferred => DEFERRED_EARNINGS,
            TaxabilityClass::Deduction => DEDUCTIONS,
        }
    }

    /// True when the whole amount is taxable.
    pub fn is_fully_taxable(self) -> bool {
        matches!(
            self,
            TaxabilityClass::FullyTaxable | TaxabilityClass::Pensionable | TaxabilityClass::Deferred
        )
    }

    /// True for every class except deductions.
    pub fn is_earning(self) -> bool {
        self != TaxabilityClass::Deduction
    }

    /// True when the amount attracts pension contributions.
    pub fn is_pensionable(self) -> bool {
        self == TaxabilityClass::Pensionable
    }
}

/// Classifies a pay component by name.
///
/// # Errors
///
/// Returns `UnknownComponent` if the name is not in any list.
///
/// # Examples
///
/// ```
/// use adjustment_engine::calculation::{TaxabilityClass, classify};
///
/// assert_eq!(classify("basic_salary").unwrap(), TaxabilityClass::Pensionable);
/// assert_eq!(classify("per_diem").unwrap(), TaxabilityClass::PartiallyTaxable);
/// assert!(classify("basic_salary").unwrap().is_fully_taxable());
/// assert!(classify("unicorn_allowance").is_err());
/// ```
pub fn classify(component: &str) -> EngineResult<TaxabilityClass> {
    TaxabilityClass::ALL
        .into_iter()
        .find(|class| class.components().contains(&component))
        .ok_or_else(|| EngineError::UnknownComponent {
            name: component.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn all_components() -> Vec<&'static str> {
        TaxabilityClass::ALL
            .into_iter()
            .flat_map(|class| class.components().iter().copied())
            .collect()
    }

    /// CL-001: basic salary is pensionable and fully taxable
    #[test]
    fn test_basic_salary_is_pensionable() {
        let class = classify("basic_salary").unwrap();
        assert_eq!(class, TaxabilityClass::Pensionable);
        assert!(class.is_fully_taxable());
        assert!(class.is_pensionable());
        assert!(class.is_earning());
    }

    /// CL-002: deferred bonuses count as fully taxable
    #[test]
    fn test_deferred_is_fully_taxable() {
        let class = classify("annual_bonus").unwrap();
        assert_eq!(class, TaxabilityClass::Deferred);
        assert!(class.is_fully_taxable());
        assert!(!class.is_pensionable());
    }

    /// CL-003: deductions are not earnings
    #[test]
    fn test_deduction_is_not_earning() {
        let class = classify("loan_payment").unwrap();
        assert_eq!(class, TaxabilityClass::Deduction);
        assert!(!class.is_earning());
        assert!(!class.is_fully_taxable());
    }

    /// CL-004: partially and non-taxable classes
    #[test]
    fn test_partial_and_exempt_classes() {
        assert_eq!(
            classify("transport_for_work").unwrap(),
            TaxabilityClass::PartiallyTaxable
        );
        assert_eq!(
            classify("medical_allowance").unwrap(),
            TaxabilityClass::NonTaxable
        );
        assert!(!TaxabilityClass::PartiallyTaxable.is_fully_taxable());
    }

    /// CL-005: unknown names are rejected
    #[test]
    fn test_unknown_component() {
        match classify("Basic_Salary") {
            Err(EngineError::UnknownComponent { name }) => assert_eq!(name, "Basic_Salary"),
            other => panic!("Expected UnknownComponent, got {:?}", other),
        }
    }

    /// CL-006: lists are disjoint
    #[test]
    fn test_lists_are_disjoint() {
        let all = all_components();
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(all.len(), unique.len());
    }

    /// CL-009: every fully taxable or pensionable name is taxed in full
    #[test]
    fn test_fully_taxable_and_pensionable_names_are_taxed_in_full() {
        for name in FULLY_TAXABLE.iter().chain(PENSIONABLE) {
            let class = classify(name).unwrap();
            assert!(class.is_fully_taxable(), "{} should be taxed in full", name);
            assert!(class.is_earning());
        }
        assert!(!PENSIONABLE.is_empty());
        assert!(!FULLY_TAXABLE.is_empty());
    }

    proptest! {
        /// CL-007: every known name classifies to the list it appears in
        #[test]
        fn prop_classify_agrees_with_membership(index in 0usize..45) {
            let all = all_components();
            let name = all[index % all.len()];
            let class = classify(name).unwrap();
            let owners: Vec<_> = TaxabilityClass::ALL
                .into_iter()
                .filter(|c| c.components().contains(&name))
                .collect();
            prop_assert_eq!(owners, vec![class]);
        }

        /// CL-008: names outside the lists are never classified
        #[test]
        fn prop_unknown_names_fail(name in "[a-z_]{1,24}") {
            let known = all_components().contains(&name.as_str());
            prop_assert_eq!(classify(&name).is_ok(), known);
        }
    }
}
