//! Herb line item and prescription models.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected herb construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HerbError {
    #[error("Herb name is empty")]
    EmptyName,

    #[error("Dosage for {name} must be a positive number of grams, got {dosage}")]
    InvalidDosage { name: String, dosage: f64 },
}

/// One ingredient line item. Dosage is always in grams.
///
/// Built through [`Herb::new`], which rejects empty names and non-positive
/// dosages. Records deserialized from outside the engine skip that check, so
/// the safety validator still flags degenerate dosages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Herb {
    name: String,
    dosage_g: f64,
    #[serde(default)]
    preparation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<String>,
    #[serde(default = "full_confidence")]
    confidence: f64,
}

fn full_confidence() -> f64 {
    1.0
}

impl Herb {
    /// Create a herb. Confidence is clamped into [0, 1].
    pub fn new(name: impl Into<String>, dosage_g: f64, confidence: f64) -> Result<Self, HerbError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(HerbError::EmptyName);
        }
        if !dosage_g.is_finite() || dosage_g <= 0.0 {
            return Err(HerbError::InvalidDosage {
                name,
                dosage: dosage_g,
            });
        }
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };

        Ok(Self {
            name,
            dosage_g,
            preparation: None,
            annotation: None,
            confidence,
        })
    }

    pub fn with_preparation(mut self, preparation: Option<String>) -> Self {
        self.preparation = preparation.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn with_annotation(mut self, annotation: Option<String>) -> Self {
        self.annotation = annotation.filter(|a| !a.trim().is_empty());
        self
    }

    /// Rename to the canonical lexicon name. A preparation implied by the
    /// original spelling fills in only when none is set.
    pub fn canonicalized(mut self, canonical: String, preparation: Option<String>) -> Self {
        self.name = canonical;
        if self.preparation.is_none() {
            self.preparation = preparation;
        }
        self
    }

    /// Canonical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dosage in grams.
    pub fn dosage_g(&self) -> f64 {
        self.dosage_g
    }

    pub fn preparation(&self) -> Option<&str> {
        self.preparation.as_deref()
    }

    /// Non-processing note from the source text (e.g. 先煎).
    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }

    /// Extraction confidence (0.0 - 1.0), not a clinical confidence.
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Dedup key: name plus dosage at milligram resolution.
    pub fn dedup_key(&self) -> (String, i64) {
        (self.name.clone(), (self.dosage_g * 1000.0).round() as i64)
    }
}

/// Free-text context that accompanies the herb list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionMetadata {
    /// e.g. "水煎服" / "decoct in water"
    pub preparation_method: Option<String>,
    /// e.g. "每日一剂，分两次温服"
    pub usage_instructions: Option<String>,
    pub syndrome_pattern: Option<String>,
    pub disease_name: Option<String>,
}

/// A prescription: unique herbs in rank order plus metadata. Read-only once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    herbs: Vec<Herb>,
    metadata: PrescriptionMetadata,
}

impl Prescription {
    pub fn new(herbs: Vec<Herb>, metadata: PrescriptionMetadata) -> Self {
        Self { herbs, metadata }
    }

    pub fn herbs(&self) -> &[Herb] {
        &self.herbs
    }

    pub fn metadata(&self) -> &PrescriptionMetadata {
        &self.metadata
    }

    pub fn herb_count(&self) -> usize {
        self.herbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.herbs.is_empty()
    }

    /// Total grams across all herbs (one daily dose).
    pub fn total_dosage_g(&self) -> f64 {
        self.herbs.iter().map(Herb::dosage_g).sum()
    }

    pub fn into_parts(self) -> (Vec<Herb>, PrescriptionMetadata) {
        (self.herbs, self.metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_herb() {
        let herb = Herb::new(" 麻黄 ", 9.0, 0.9)
            .unwrap()
            .with_preparation(Some("honey-fried".into()));

        assert_eq!(herb.name(), "麻黄");
        assert_eq!(herb.dosage_g(), 9.0);
        assert_eq!(herb.preparation(), Some("honey-fried"));
        assert!(herb.annotation().is_none());
    }

    #[test]
    fn test_invalid_dosage_rejected() {
        assert!(matches!(
            Herb::new("麻黄", 0.0, 0.9),
            Err(HerbError::InvalidDosage { .. })
        ));
        assert!(Herb::new("麻黄", -3.0, 0.9).is_err());
        assert!(Herb::new("麻黄", f64::NAN, 0.9).is_err());
        assert!(Herb::new("麻黄", f64::INFINITY, 0.9).is_err());
        assert_eq!(Herb::new("  ", 3.0, 0.9), Err(HerbError::EmptyName));
    }

    #[test]
    fn test_confidence_clamped() {
        assert_eq!(Herb::new("甘草", 3.0, 1.7).unwrap().confidence(), 1.0);
        assert_eq!(Herb::new("甘草", 3.0, -0.2).unwrap().confidence(), 0.0);
        assert_eq!(Herb::new("甘草", 3.0, f64::NAN).unwrap().confidence(), 0.0);
    }

    #[test]
    fn test_dedup_key_milligram_resolution() {
        let a = Herb::new("甘草", 3.0, 0.9).unwrap();
        let b = Herb::new("甘草", 3.0004, 0.5).unwrap();
        let c = Herb::new("甘草", 6.0, 0.5).unwrap();
        assert_eq!(a.dedup_key(), b.dedup_key());
        assert_ne!(a.dedup_key(), c.dedup_key());
    }

    #[test]
    fn test_serialized_field_names() {
        let herb = Herb::new("甘草", 3.0, 0.9).unwrap();
        let json = serde_json::to_value(&herb).unwrap();
        assert_eq!(json["name"], "甘草");
        assert_eq!(json["dosage_g"], 3.0);
        assert!(json["preparation"].is_null());
        assert!(json.get("annotation").is_none());
    }

    #[test]
    fn test_deserialize_external_record() {
        let herb: Herb = serde_json::from_str(r#"{"name":"甘草","dosage_g":0}"#).unwrap();
        assert_eq!(herb.dosage_g(), 0.0);
        assert_eq!(herb.confidence(), 1.0);
    }

    #[test]
    fn test_prescription_totals() {
        let herbs = vec![
            Herb::new("麻黄", 9.0, 1.0).unwrap(),
            Herb::new("甘草", 3.0, 1.0).unwrap(),
        ];
        let prescription = Prescription::new(herbs, PrescriptionMetadata::default());
        assert_eq!(prescription.herb_count(), 2);
        assert_eq!(prescription.total_dosage_g(), 12.0);
    }
}
