//! Error types for the Adjustment Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while recording payrolls and
//! recalculating adjustments.

use thiserror::Error;

/// The main error type for the Adjustment Engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use adjustment_engine::error::EngineError;
///
/// let error = EngineError::UnknownComponent {
///     name: "bonus_points".to_string(),
/// };
/// assert_eq!(error.to_string(), "Unknown pay component: bonus_points");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// The pay component name is not part of the classification table.
    #[error("Unknown pay component: {name}")]
    UnknownComponent {
        /// The component name that was not recognised.
        name: String,
    },

    /// A known component was used where a different kind was required,
    /// e.g. a deduction component on an earning adjustment.
    #[error("Component '{name}' cannot be used as {expected}")]
    ComponentKindMismatch {
        /// The component name.
        name: String,
        /// What the caller expected (e.g. "an earning").
        expected: String,
    },

    /// A record with the given id does not exist for the organization.
    #[error("{kind} not found: {id}")]
    RecordNotFound {
        /// The kind of record (e.g. "Payroll record").
        kind: String,
        /// The id that was looked up.
        id: String,
    },

    /// A payroll record already exists for the personnel and period.
    #[error("Payroll for personnel '{personnel_id}' in {period} already exists")]
    DuplicatePayroll {
        /// The personnel identifier.
        personnel_id: String,
        /// The payroll period, as displayed.
        period: String,
    },

    /// A field failed a business validation rule.
    #[error("Invalid field '{field}': {message}")]
    Validation {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A payroll period could not be parsed or is out of range.
    #[error("Invalid payroll period '{value}'")]
    InvalidPeriod {
        /// The rejected input.
        value: String,
    },

    /// The record store failed to serve a request.
    #[error("Record store error: {message}")]
    Store {
        /// A description of the store failure.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

impl EngineError {
    /// Shorthand for a [`EngineError::Validation`] error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a [`EngineError::RecordNotFound`] error.
    pub fn not_found(kind: impl Into<String>, id: impl ToString) -> Self {
        Self::RecordNotFound {
            kind: kind.into(),
            id: id.to_string(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/file.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/file.yaml"
        );
    }

    #[test]
    fn test_config_parse_error_displays_path_and_message() {
        let error = EngineError::ConfigParseError {
            path: "/config/bad.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse configuration file '/config/bad.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_component_kind_mismatch_displays_expectation() {
        let error = EngineError::ComponentKindMismatch {
            name: "loan_payment".to_string(),
            expected: "an earning".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Component 'loan_payment' cannot be used as an earning"
        );
    }

    #[test]
    fn test_record_not_found_displays_kind_and_id() {
        let error = EngineError::not_found("Payroll record", "abc");
        assert_eq!(error.to_string(), "Payroll record not found: abc");
    }

    #[test]
    fn test_duplicate_payroll_displays_personnel_and_period() {
        let error = EngineError::DuplicatePayroll {
            personnel_id: "EMP-7".to_string(),
            period: "January-2024".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Payroll for personnel 'EMP-7' in January-2024 already exists"
        );
    }

    #[test]
    fn test_validation_displays_field_and_message() {
        let error = EngineError::validation("per_diem", "daily per diem is not set");
        assert_eq!(
            error.to_string(),
            "Invalid field 'per_diem': daily per diem is not set"
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_unknown_component() -> EngineResult<()> {
            Err(EngineError::UnknownComponent {
                name: "x".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_unknown_component()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
