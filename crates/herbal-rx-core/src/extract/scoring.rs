//! Extraction confidence scoring.
//!
//! Component weights come from [`ConfidenceWeights`] (defaults):
//! - Lexicon membership × match quality: 50%
//! - Dosage plausibility: 20%
//! - Context (unit marker, medical keyword on the line): 15%
//! - Name shape: 15%

use serde::{Deserialize, Serialize};

use crate::config::{ConfidenceWeights, ExtractionConfig};
use crate::lexicon::{is_cjk, is_latin_name};

/// Breakdown of how a candidate was scored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    /// Match quality when the name resolved, 0 otherwise
    pub lexicon_score: f64,
    pub dosage_score: f64,
    pub context_score: f64,
    pub shape_score: f64,
}

impl ScoreBreakdown {
    /// Calculate weighted confidence score.
    pub fn weighted_score(&self, weights: &ConfidenceWeights) -> f64 {
        self.lexicon_score * weights.lexicon
            + self.dosage_score * weights.dosage
            + self.context_score * weights.context
            + self.shape_score * weights.shape
    }
}

/// Score dosage plausibility in grams. Implausible dosages are penalized, never rejected.
pub fn score_dosage(dosage_g: f64, config: &ExtractionConfig) -> f64 {
    if config.typical_dosage_g.contains(dosage_g) {
        1.0
    } else if config.plausible_dosage_g.contains(dosage_g) {
        0.5
    } else {
        0.2
    }
}

/// Score context: half for an explicit unit, half for a medical keyword on the line.
///
/// `keywords` must be lowercase.
pub fn score_context(has_unit: bool, line: &str, keywords: &[String]) -> f64 {
    let lower = line.to_lowercase();
    let unit = if has_unit { 0.5 } else { 0.0 };
    let keyword = if keywords.iter().any(|k| lower.contains(k.as_str())) {
        0.5
    } else {
        0.0
    };
    unit + keyword
}

/// Score how much a raw name looks like a herb name.
pub fn score_shape(name: &str) -> f64 {
    let name = name.trim();
    let cjk_chars = name.chars().count();
    if name.chars().all(is_cjk) && (2..=6).contains(&cjk_chars) {
        return 1.0;
    }
    let words = name.split_whitespace().count();
    if is_latin_name(name) && (1..=4).contains(&words) {
        return 0.8;
    }
    0.3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_score() {
        let breakdown = ScoreBreakdown {
            lexicon_score: 1.0,
            dosage_score: 1.0,
            context_score: 1.0,
            shape_score: 1.0,
        };
        assert!((breakdown.weighted_score(&ConfidenceWeights::default()) - 1.0).abs() < 0.001);

        let unknown = ScoreBreakdown {
            lexicon_score: 0.0,
            ..breakdown
        };
        assert!((unknown.weighted_score(&ConfidenceWeights::default()) - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_dosage_plausibility() {
        let config = ExtractionConfig::default();
        assert_eq!(score_dosage(9.0, &config), 1.0);
        assert_eq!(score_dosage(45.0, &config), 0.5);
        assert_eq!(score_dosage(1.5, &config), 0.5);
        assert_eq!(score_dosage(0.3, &config), 0.2);
        assert_eq!(score_dosage(250.0, &config), 0.2);
    }

    #[test]
    fn test_context() {
        let keywords = vec!["处方".to_string(), "rx".to_string()];
        assert_eq!(score_context(true, "处方: 麻黄 9g", &keywords), 1.0);
        assert_eq!(score_context(true, "麻黄 9g", &keywords), 0.5);
        assert_eq!(score_context(false, "Rx Ephedra 9", &keywords), 0.5);
        assert_eq!(score_context(false, "Ephedra 9", &keywords), 0.0);
    }

    #[test]
    fn test_shape() {
        assert_eq!(score_shape("麻黄"), 1.0);
        assert_eq!(score_shape("金银花"), 1.0);
        assert_eq!(score_shape("麻"), 0.3);
        assert_eq!(score_shape("Cinnamon Twig"), 0.8);
        assert_eq!(score_shape("one two three four five"), 0.3);
        assert_eq!(score_shape("麻黄abc"), 0.3);
    }
}
