//! Safety report models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Violation severity. Critical and High make a prescription unsafe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }

    /// Does a violation at this severity make the prescription unsafe?
    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of safety violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Incompatibility,
    ToxicOverdose,
    Contraindication,
    DosageOutOfRange,
    IngredientCountIssue,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::Incompatibility => "incompatibility",
            ViolationKind::ToxicOverdose => "toxic_overdose",
            ViolationKind::Contraindication => "contraindication",
            ViolationKind::DosageOutOfRange => "dosage_out_of_range",
            ViolationKind::IngredientCountIssue => "ingredient_count_issue",
        }
    }
}

/// A single safety finding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: Severity,
    /// Canonical names of the herbs involved (empty for whole-formula findings)
    pub herbs: Vec<String>,
    pub message: String,
}

impl Violation {
    pub fn involves(&self, herb: &str) -> bool {
        self.herbs.iter().any(|h| h == herb)
    }
}

/// Result of validating one prescription. Always produced, never omitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafetyReport {
    is_safe: bool,
    violations: Vec<Violation>,
    /// Handling guidance and lexicon-coverage notices; never affect `is_safe`
    notes: Vec<String>,
}

impl SafetyReport {
    /// Build a report; `is_safe` is derived from the violations.
    pub fn new(violations: Vec<Violation>, notes: Vec<String>) -> Self {
        let is_safe = !violations.iter().any(|v| v.severity.is_blocking());
        Self {
            is_safe,
            violations,
            notes,
        }
    }

    pub fn is_safe(&self) -> bool {
        self.is_safe
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn violations_of(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }

    pub fn count_of(&self, kind: ViolationKind) -> usize {
        self.violations_of(kind).count()
    }

    /// Highest severity present, if any.
    pub fn highest_severity(&self) -> Option<Severity> {
        self.violations.iter().map(|v| v.severity).max()
    }
}
