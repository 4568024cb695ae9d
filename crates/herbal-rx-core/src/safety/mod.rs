//! Prescription safety validation.
//!
//! Checks run in a fixed order and all of them always run:
//! 1. Incompatible pairs (Critical)
//! 2. Toxic dosage ceilings (High)
//! 3. Patient contraindications (High)
//! 4. Dosage reasonableness (Medium)
//! 5. Ingredient count (Medium / Low)
//!
//! A prescription is unsafe iff any violation is Critical or High. The
//! validator is pure; malformed input becomes a violation, never a panic.

mod checks;

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::SafetyConfig;
use crate::lexicon::HerbLexicon;
use crate::models::{Herb, PatientProfile, SafetyReport};

use checks::Resolved;

/// Validates herb lists against the lexicon's safety rules.
pub struct SafetyValidator {
    lexicon: Arc<HerbLexicon>,
    config: SafetyConfig,
}

impl SafetyValidator {
    pub fn new(lexicon: Arc<HerbLexicon>, config: SafetyConfig) -> Self {
        Self { lexicon, config }
    }

    /// Validate a herb list, optionally for a specific patient.
    pub fn validate(&self, herbs: &[Herb], profile: Option<&PatientProfile>) -> SafetyReport {
        let resolved: Vec<Resolved<'_>> = herbs
            .iter()
            .map(|herb| Resolved {
                herb,
                entry: self.lexicon.find(herb.name()),
            })
            .collect();

        let unique_count = resolved
            .iter()
            .map(Resolved::name)
            .collect::<HashSet<_>>()
            .len();

        let mut violations = Vec::new();
        let mut notes = Vec::new();

        checks::check_incompatibility(&resolved, &mut violations);
        checks::check_toxicity(&resolved, &mut violations, &mut notes);
        if let Some(profile) = profile {
            checks::check_contraindications(&resolved, profile, &mut violations);
        }
        checks::check_dosage_ranges(&resolved, &self.config, &mut violations, &mut notes);
        checks::check_ingredient_count(unique_count, &self.config, &mut violations);

        let report = SafetyReport::new(violations, notes);
        tracing::debug!(
            herbs = herbs.len(),
            violations = report.violations().len(),
            is_safe = report.is_safe(),
            "safety validation complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgeBand, Severity, ViolationKind};

    fn validator() -> SafetyValidator {
        SafetyValidator::new(
            Arc::new(HerbLexicon::builtin().unwrap()),
            SafetyConfig::default(),
        )
    }

    fn herb(name: &str, dosage: f64) -> Herb {
        Herb::new(name, dosage, 1.0).unwrap()
    }

    fn mahuang_tang() -> Vec<Herb> {
        vec![
            herb("麻黄", 9.0),
            herb("桂枝", 6.0),
            herb("苦杏仁", 6.0),
            herb("甘草", 3.0),
        ]
    }

    #[test]
    fn test_classic_formula_is_safe() {
        let report = validator().validate(&mahuang_tang(), None);
        assert!(report.is_safe());
        assert!(report.violations().is_empty());
        assert!(report.notes().is_empty());
    }

    #[test]
    fn test_incompatible_pair_is_critical() {
        let mut herbs = mahuang_tang();
        herbs.push(herb("甘遂", 1.0));

        let report = validator().validate(&herbs, None);
        assert!(!report.is_safe());
        assert_eq!(report.count_of(ViolationKind::Incompatibility), 1);

        let violation = report.violations_of(ViolationKind::Incompatibility).next().unwrap();
        assert_eq!(violation.severity, Severity::Critical);
        assert!(violation.involves("甘草"));
        assert!(violation.involves("甘遂"));
    }

    #[test]
    fn test_mutual_listing_reported_once() {
        // Both entries list each other; the pair reports once
        let herbs = vec![herb("川乌", 1.5), herb("白蔹", 6.0), herb("甘草", 3.0)];
        let report = validator().validate(&herbs, None);
        assert_eq!(report.count_of(ViolationKind::Incompatibility), 1);
    }

    #[test]
    fn test_toxic_overdose_and_note() {
        let herbs = vec![herb("川乌", 6.0), herb("甘草", 3.0), herb("大枣", 9.0)];
        let report = validator().validate(&herbs, None);

        assert!(!report.is_safe());
        let overdose = report.violations_of(ViolationKind::ToxicOverdose).next().unwrap();
        assert_eq!(overdose.severity, Severity::High);
        assert!(overdose.message.contains("pre-decoction"));
        assert!(overdose.message.contains("3 g"));
        // Range check still runs for toxic herbs
        assert_eq!(report.count_of(ViolationKind::DosageOutOfRange), 1);
        assert!(report.notes().iter().any(|n| n.starts_with("川乌")));
    }

    #[test]
    fn test_toxic_within_ceiling_only_noted() {
        let herbs = vec![herb("附子", 9.0), herb("干姜", 6.0), herb("甘草", 6.0)];
        let report = validator().validate(&herbs, None);
        assert!(report.is_safe());
        assert_eq!(report.notes().len(), 1);
    }

    #[test]
    fn test_contraindications() {
        let herbs = mahuang_tang();
        let profile = PatientProfile::new()
            .pregnant()
            .with_condition("Hypertension");

        let report = validator().validate(&herbs, Some(&profile));
        assert!(!report.is_safe());
        let contraindications: Vec<_> = report
            .violations_of(ViolationKind::Contraindication)
            .collect();
        // 桂枝 in pregnancy, 麻黄 with hypertension
        assert_eq!(contraindications.len(), 2);
        assert!(contraindications.iter().all(|v| v.severity == Severity::High));
        assert!(contraindications
            .iter()
            .any(|v| v.involves("桂枝") && v.message.contains("pregnancy")));
        assert!(contraindications
            .iter()
            .any(|v| v.involves("麻黄") && v.message.contains("hypertension")));
    }

    #[test]
    fn test_pediatric_profile() {
        let profile = PatientProfile::new().with_age_band(AgeBand::Pediatric);
        let report = validator().validate(&mahuang_tang(), Some(&profile));
        assert_eq!(report.count_of(ViolationKind::Contraindication), 1);
        assert!(report.violations()[0].involves("苦杏仁"));
    }

    #[test]
    fn test_dosage_out_of_range_messages() {
        let herbs = vec![herb("麻黄", 1.0), herb("桂枝", 20.0), herb("甘草", 3.0)];
        let report = validator().validate(&herbs, None);

        assert!(report.is_safe());
        let messages: Vec<&str> = report
            .violations_of(ViolationKind::DosageOutOfRange)
            .map(|v| v.message.as_str())
            .collect();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("too low: may be ineffective"));
        assert!(messages[1].contains("too high: confirm safety"));
    }

    #[test]
    fn test_degenerate_dosage_from_external_record() {
        let zero: Herb = serde_json::from_str(r#"{"name":"甘草","dosage_g":0}"#).unwrap();
        let negative: Herb = serde_json::from_str(r#"{"name":"麻黄","dosage_g":-3}"#).unwrap();
        let report = validator().validate(&[zero, negative, herb("桂枝", 6.0)], None);

        assert!(report.is_safe());
        assert_eq!(report.count_of(ViolationKind::DosageOutOfRange), 2);
        assert!(report.violations()[0].message.contains("invalid dosage"));
    }

    #[test]
    fn test_unknown_herb_generic_ceiling() {
        let herbs = vec![herb("某某草", 45.0), herb("麻黄", 9.0), herb("甘草", 3.0)];
        let report = validator().validate(&herbs, None);

        assert_eq!(report.count_of(ViolationKind::DosageOutOfRange), 1);
        assert!(report.violations()[0].involves("某某草"));
        assert!(report.notes()[0].contains("not in the lexicon"));
    }

    #[test]
    fn test_external_names_resolved() {
        let herbs = vec![herb("Licorice", 6.0), herb("Euphorbia Kansui", 1.0)];
        let report = validator().validate(&herbs, None);
        assert_eq!(report.count_of(ViolationKind::Incompatibility), 1);
    }

    #[test]
    fn test_prefixed_names_resolved() {
        let herbs = vec![herb("炙甘草", 6.0), herb("醋甘遂", 1.0), herb("大枣", 9.0)];
        let report = validator().validate(&herbs, None);

        assert!(!report.is_safe());
        let pair = report.violations_of(ViolationKind::Incompatibility).next().unwrap();
        assert!(pair.involves("甘草") && pair.involves("甘遂"));
        assert!(report.notes().iter().all(|n| !n.contains("not in the lexicon")));
    }

    #[test]
    fn test_ingredient_count() {
        let report = validator().validate(&[herb("麻黄", 9.0), herb("甘草", 3.0)], None);
        assert!(report.is_safe());
        let count = report.violations_of(ViolationKind::IngredientCountIssue).next().unwrap();
        assert_eq!(count.severity, Severity::Medium);
        assert!(count.message.contains("too few"));

        let many: Vec<Herb> = HerbLexicon::builtin()
            .unwrap()
            .entries()
            .filter(|e| !e.is_toxic() && e.incompatible_with.is_empty())
            .take(21)
            .map(|e| herb(&e.name, e.safe_range.min))
            .collect();
        let report = validator().validate(&many, None);
        let count = report.violations_of(ViolationKind::IngredientCountIssue).next().unwrap();
        assert_eq!(count.severity, Severity::Low);
    }

    #[test]
    fn test_empty_list() {
        let report = validator().validate(&[], None);
        assert!(report.is_safe());
        assert_eq!(report.count_of(ViolationKind::IngredientCountIssue), 1);
    }
}
