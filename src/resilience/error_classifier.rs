//! # Migration Error Classification
//!
//! Decides whether a failed migration step is worth another attempt.
//!
//! Classification is a small ordered table of rules. Each rule lists
//! case-insensitive substrings and the category they map to; the first rule
//! with a matching substring wins. Anything unmatched is `Unknown` and is not
//! retried.
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │ Failure message │────▶│ Ordered rules   │────▶│ ErrorCategory   │
//! │                 │     │ (first match)   │     │ type, retryable │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use migration_core::resilience::{ErrorCategorizer, ErrorType};
//!
//! let categorizer = ErrorCategorizer::new();
//! let category = categorizer.categorize("Connection timeout");
//! assert_eq!(category.error_type, ErrorType::Network);
//! assert!(category.retryable);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad failure families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Connectivity problems; usually transient
    Network,

    /// Lock contention or server-side database trouble
    Database,

    /// Bad input or generated DDL; retrying cannot help
    Validation,

    /// Nothing matched
    Unknown,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorType::Network => write!(f, "network"),
            ErrorType::Database => write!(f, "database"),
            ErrorType::Validation => write!(f, "validation"),
            ErrorType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Result of classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCategory {
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    pub retryable: bool,
}

impl ErrorCategory {
    pub const UNKNOWN: ErrorCategory = ErrorCategory {
        error_type: ErrorType::Unknown,
        retryable: false,
    };
}

/// One row of the classification table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRule {
    patterns: Vec<String>,
    category: ErrorCategory,
}

impl ErrorRule {
    pub fn new<I, P>(error_type: ErrorType, retryable: bool, patterns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|pattern| pattern.as_ref().to_lowercase())
                .collect(),
            category: ErrorCategory {
                error_type,
                retryable,
            },
        }
    }

    /// `message` must already be lowercased
    fn matches(&self, message: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| message.contains(pattern.as_str()))
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// Ordered, first-match-wins failure classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCategorizer {
    rules: Vec<ErrorRule>,
}

impl Default for ErrorCategorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorCategorizer {
    /// Categorizer with the standard rule table
    pub fn new() -> Self {
        Self::with_rules(Self::standard_rules())
    }

    pub fn with_rules(rules: Vec<ErrorRule>) -> Self {
        Self { rules }
    }

    pub fn standard_rules() -> Vec<ErrorRule> {
        vec![
            ErrorRule::new(
                ErrorType::Network,
                true,
                ["timeout", "connection", "network"],
            ),
            ErrorRule::new(ErrorType::Database, true, ["deadlock", "database"]),
            ErrorRule::new(ErrorType::Validation, false, ["invalid", "validation"]),
        ]
    }

    pub fn rules(&self) -> &[ErrorRule] {
        &self.rules
    }

    /// Classify a failure by its display message
    pub fn categorize<E: fmt::Display + ?Sized>(&self, error: &E) -> ErrorCategory {
        let message = error.to_string().to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&message))
            .map(ErrorRule::category)
            .unwrap_or(ErrorCategory::UNKNOWN)
    }
}
