//! Formula role models (君臣佐使).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Structural role of an ingredient within a formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaRole {
    /// 君: carries the primary therapeutic action
    Sovereign,
    /// 臣: reinforces the sovereign
    Minister,
    /// 佐: moderates or complements
    Assistant,
    /// 使: harmonizes or guides
    Envoy,
}

impl FormulaRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormulaRole::Sovereign => "Sovereign",
            FormulaRole::Minister => "Minister",
            FormulaRole::Assistant => "Assistant",
            FormulaRole::Envoy => "Envoy",
        }
    }
}

impl fmt::Display for FormulaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role assigned to one herb, with the reason it was assigned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoleAssignment {
    pub herb_name: String,
    pub role: FormulaRole,
    pub rationale: String,
}

/// Find the role assigned to a herb.
pub fn role_of<'a>(
    assignments: &'a [RoleAssignment],
    herb_name: &str,
) -> Option<&'a RoleAssignment> {
    assignments.iter().find(|a| a.herb_name == herb_name)
}
