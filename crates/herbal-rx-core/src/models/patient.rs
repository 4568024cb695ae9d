//! Patient profile models.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::lexicon::Contraindication;

/// Age band used for population contraindications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBand {
    Pediatric,
    #[default]
    Adult,
    Elderly,
}

/// Patient attributes relevant to contraindication checks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientProfile {
    #[serde(default)]
    pub is_pregnant: bool,
    #[serde(default)]
    pub age_band: AgeBand,
    /// Named conditions (e.g. "hypertension"), matched case-insensitively
    #[serde(default)]
    pub conditions: BTreeSet<String>,
}

impl PatientProfile {
    /// Create an adult, non-pregnant profile with no conditions.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pregnant(mut self) -> Self {
        self.is_pregnant = true;
        self
    }

    pub fn with_age_band(mut self, age_band: AgeBand) -> Self {
        self.age_band = age_band;
        self
    }

    pub fn with_condition(mut self, condition: &str) -> Self {
        self.conditions.insert(condition.trim().to_lowercase());
        self
    }

    /// All populations and conditions that currently apply to this patient.
    pub fn active_flags(&self) -> Vec<Contraindication> {
        let mut flags = Vec::new();
        if self.is_pregnant {
            flags.push(Contraindication::Pregnant);
        }
        match self.age_band {
            AgeBand::Pediatric => flags.push(Contraindication::Pediatric),
            AgeBand::Elderly => flags.push(Contraindication::Elderly),
            AgeBand::Adult => {}
        }
        flags.extend(
            self.conditions
                .iter()
                .map(|c| Contraindication::from(c.clone())),
        );
        flags
    }

    /// Check whether a contraindication applies to this patient.
    pub fn is_affected_by(&self, contraindication: &Contraindication) -> bool {
        self.active_flags().contains(contraindication)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_has_no_flags() {
        assert!(PatientProfile::new().active_flags().is_empty());
    }

    #[test]
    fn test_active_flags() {
        let profile = PatientProfile::new()
            .pregnant()
            .with_age_band(AgeBand::Elderly)
            .with_condition(" Hypertension ");

        let flags = profile.active_flags();
        assert!(flags.contains(&Contraindication::Pregnant));
        assert!(flags.contains(&Contraindication::Elderly));
        assert!(flags.contains(&Contraindication::Condition("hypertension".into())));
        assert!(!flags.contains(&Contraindication::Pediatric));
    }

    #[test]
    fn test_condition_case_insensitive() {
        let profile: PatientProfile =
            serde_json::from_str(r#"{"conditions":["Insomnia"],"age_band":"pediatric"}"#).unwrap();

        assert!(profile.is_affected_by(&Contraindication::from("insomnia".to_string())));
        assert!(profile.is_affected_by(&Contraindication::Pediatric));
        assert!(!profile.is_pregnant);
    }

    #[test]
    fn test_pregnancy_condition_alias() {
        // A "pregnancy" condition string maps onto the pregnant flag
        let profile = PatientProfile::new().with_condition("pregnancy");
        assert!(profile.is_affected_by(&Contraindication::Pregnant));
    }
}
