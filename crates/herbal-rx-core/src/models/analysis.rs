//! Prescription analysis result.

use serde::{Deserialize, Serialize};

use super::herb::{Herb, PrescriptionMetadata};
use super::roles::{role_of, RoleAssignment};
use super::safety::SafetyReport;

/// Merged output of extraction, safety validation and role classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionAnalysis {
    /// Unique herbs, highest confidence first
    pub herbs: Vec<Herb>,
    pub safety: SafetyReport,
    /// One assignment per herb
    pub roles: Vec<RoleAssignment>,
    /// Non-fatal extraction notes (duplicate-name conflicts, nothing extracted, ...)
    pub warnings: Vec<String>,
    pub metadata: PrescriptionMetadata,
    /// Fingerprint of the lexicon snapshot the verdict was computed against
    pub lexicon_fingerprint: String,
}

impl PrescriptionAnalysis {
    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn herb(&self, name: &str) -> Option<&Herb> {
        self.herbs.iter().find(|h| h.name() == name)
    }

    pub fn role_of(&self, name: &str) -> Option<&RoleAssignment> {
        role_of(&self.roles, name)
    }

    /// True when nothing usable was extracted.
    pub fn is_empty(&self) -> bool {
        self.herbs.is_empty()
    }

    /// Get the lowest extraction confidence among the herbs.
    pub fn lowest_confidence(&self) -> Option<f64> {
        self.herbs
            .iter()
            .map(Herb::confidence)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FormulaRole;

    fn make_analysis() -> PrescriptionAnalysis {
        PrescriptionAnalysis {
            herbs: vec![
                Herb::new("麻黄", 9.0, 0.95).unwrap(),
                Herb::new("甘草", 3.0, 0.80).unwrap(),
            ],
            safety: SafetyReport::new(vec![], vec![]),
            roles: vec![
                RoleAssignment {
                    herb_name: "麻黄".into(),
                    role: FormulaRole::Sovereign,
                    rationale: "test".into(),
                },
                RoleAssignment {
                    herb_name: "甘草".into(),
                    role: FormulaRole::Envoy,
                    rationale: "test".into(),
                },
            ],
            warnings: vec![],
            metadata: PrescriptionMetadata::default(),
            lexicon_fingerprint: "abc".into(),
        }
    }

    #[test]
    fn test_lookup_helpers() {
        let analysis = make_analysis();
        assert_eq!(analysis.herb("甘草").map(Herb::dosage_g), Some(3.0));
        assert_eq!(analysis.role_of("麻黄").map(|r| r.role), Some(FormulaRole::Sovereign));
        assert!(analysis.role_of("桂枝").is_none());
        assert_eq!(analysis.lowest_confidence(), Some(0.80));
        assert!(!analysis.is_empty());
    }

    #[test]
    fn test_json_roundtrip_is_stable() {
        let analysis = make_analysis();
        let json = analysis.to_json().unwrap();
        let restored: PrescriptionAnalysis = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, analysis);
        assert!(json.contains("\"dosage_g\""));
        assert!(json.contains("\"sovereign\""));
    }
}
