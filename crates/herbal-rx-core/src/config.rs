//! Engine configuration.
//!
//! Every threshold the extractor, validator and role classifier apply lives
//! here. The defaults are empirically chosen starting points, not clinical
//! truths; deployments can override any of them from a JSON document.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lexicon::{DosageRange, FunctionalCategory};

/// Configuration errors. Fatal at initialization.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub extraction: ExtractionConfig,
    pub safety: SafetyConfig,
    pub roles: RoleConfig,
}

impl EngineConfig {
    /// Parse and validate a configuration document. Missing fields take defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.extraction.validate()?;
        self.safety.validate()?;
        self.roles.validate()
    }
}

/// Weights of the extraction confidence components. Must sum to 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ConfidenceWeights {
    pub lexicon: f64,
    pub dosage: f64,
    pub context: f64,
    pub shape: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            lexicon: 0.50,
            dosage: 0.20,
            context: 0.15,
            shape: 0.15,
        }
    }
}

impl ConfidenceWeights {
    pub fn total(&self) -> f64 {
        self.lexicon + self.dosage + self.context + self.shape
    }
}

/// Herb extraction parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Candidates below this confidence are dropped
    pub min_confidence: f64,
    pub weights: ConfidenceWeights,
    /// Dosages in this band score full plausibility
    pub typical_dosage_g: DosageRange,
    /// Dosages in this band score half plausibility; outside it, a floor score
    pub plausible_dosage_g: DosageRange,
    /// Non-herb phrases that co-occur with numbers in instructions
    pub denylist: Vec<String>,
    /// Line-level cues that the line belongs to a herb list
    pub medical_keywords: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.45,
            weights: ConfidenceWeights::default(),
            typical_dosage_g: DosageRange { min: 3.0, max: 30.0 },
            plausible_dosage_g: DosageRange { min: 1.0, max: 60.0 },
            denylist: default_denylist(),
            medical_keywords: default_medical_keywords(),
        }
    }
}

impl ExtractionConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::Invalid(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        let total = self.weights.total();
        if (total - 1.0).abs() > 1e-6 {
            return Err(ConfigError::Invalid(format!(
                "confidence weights must sum to 1, got {}",
                total
            )));
        }
        check_range("typical_dosage_g", self.typical_dosage_g)?;
        check_range("plausible_dosage_g", self.plausible_dosage_g)
    }
}

/// Safety validation parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SafetyConfig {
    /// Fewer unique herbs than this is not a credible formula
    pub min_ingredients: usize,
    /// More unique herbs than this should be simplified
    pub max_ingredients: usize,
    /// Generic ceiling for herbs missing from the lexicon
    pub unknown_herb_max_g: f64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            min_ingredients: 3,
            max_ingredients: 20,
            unknown_herb_max_g: 30.0,
        }
    }
}

impl SafetyConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.min_ingredients > self.max_ingredients {
            return Err(ConfigError::Invalid(
                "min_ingredients must not exceed max_ingredients".into(),
            ));
        }
        if !self.unknown_herb_max_g.is_finite() || self.unknown_herb_max_g <= 0.0 {
            return Err(ConfigError::Invalid(
                "unknown_herb_max_g must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Formula role classification parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoleConfig {
    /// Share of herbs (by dosage rank) eligible for Sovereign, at least one
    pub sovereign_quantile: f64,
    /// Sovereign dosage must exceed this
    pub sovereign_floor_g: f64,
    /// Minister dosage must exceed this
    pub minister_floor_g: f64,
    /// Assistant dosage band (inclusive)
    pub assistant_band_g: DosageRange,
    pub primary_categories: Vec<FunctionalCategory>,
    pub regulatory_categories: Vec<FunctionalCategory>,
    /// Canonical names of harmonizing herbs
    pub harmonizing_herbs: Vec<String>,
    /// Promote the top-dosage herb when no herb qualifies as Sovereign
    pub promote_top_when_no_sovereign: bool,
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            sovereign_quantile: 0.25,
            sovereign_floor_g: 6.0,
            minister_floor_g: 3.0,
            assistant_band_g: DosageRange { min: 3.0, max: 15.0 },
            primary_categories: vec![
                FunctionalCategory::ExteriorReleasing,
                FunctionalCategory::HeatClearing,
                FunctionalCategory::Purgative,
                FunctionalCategory::DampDraining,
                FunctionalCategory::InteriorWarming,
                FunctionalCategory::BloodActivating,
                FunctionalCategory::QiTonifying,
                FunctionalCategory::BloodNourishing,
                FunctionalCategory::YinNourishing,
                FunctionalCategory::YangTonifying,
            ],
            regulatory_categories: vec![
                FunctionalCategory::QiRegulating,
                FunctionalCategory::PhlegmResolving,
                FunctionalCategory::CoughRelieving,
                FunctionalCategory::Calming,
                FunctionalCategory::LiverCalming,
                FunctionalCategory::Digestive,
                FunctionalCategory::AromaticDampResolving,
                FunctionalCategory::Astringent,
                FunctionalCategory::Hemostatic,
            ],
            harmonizing_herbs: vec!["甘草".into(), "生姜".into(), "大枣".into()],
            promote_top_when_no_sovereign: true,
        }
    }
}

impl RoleConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !(self.sovereign_quantile > 0.0 && self.sovereign_quantile <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "sovereign_quantile must be within (0, 1], got {}",
                self.sovereign_quantile
            )));
        }
        if self.sovereign_floor_g < 0.0 || self.minister_floor_g < 0.0 {
            return Err(ConfigError::Invalid("dosage floors must be non-negative".into()));
        }
        check_range("assistant_band_g", self.assistant_band_g)
    }
}

fn check_range(field: &str, range: DosageRange) -> ConfigResult<()> {
    let finite = range.min.is_finite() && range.max.is_finite();
    if !finite || range.min < 0.0 || range.min > range.max {
        return Err(ConfigError::Invalid(format!(
            "{} must satisfy 0 <= min <= max, got {}..{}",
            field, range.min, range.max
        )));
    }
    Ok(())
}

/// Default non-herb phrase denylist.
fn default_denylist() -> Vec<String> {
    [
        // Heat and decoction instructions
        "文火", "武火", "小火", "大火", "慢火", "先煎", "后下", "包煎", "另煎", "烊化",
        "冲服", "水煎", "煎服", "煎至", "煎取", "加水", "浸泡", "煮", "再煮",
        // Administration
        "温服", "分服", "顿服", "每日", "每次", "一日", "日服", "饭前", "饭后", "睡前",
        "复诊", "服用",
        // English
        "simmer on low heat", "simmer", "decoct first", "add at the end", "dissolve and take",
        "dissolve", "decoct", "boil", "soak", "water", "take with", "times daily",
        "twice daily", "per day", "daily", "minutes", "before meals", "after meals",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Default line-level medical context keywords.
fn default_medical_keywords() -> Vec<String> {
    [
        "处方", "方药", "组成", "剂", "付", "汤", "散", "丸", "药", "rx", "herb",
        "formula", "prescription", "decoction", "ingredients",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.extraction.weights.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = EngineConfig::from_json(
            r#"{ "roles": { "sovereign_floor_g": 9.0 }, "safety": { "max_ingredients": 15 } }"#,
        )
        .unwrap();

        assert_eq!(config.roles.sovereign_floor_g, 9.0);
        assert_eq!(config.roles.minister_floor_g, 3.0);
        assert_eq!(config.safety.max_ingredients, 15);
        assert_eq!(config.safety.min_ingredients, 3);
        assert_eq!(config.extraction, ExtractionConfig::default());
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let result = EngineConfig::from_json(
            r#"{ "extraction": { "weights": {
                "lexicon": 0.9, "dosage": 0.2, "context": 0.1, "shape": 0.1
            } } }"#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_invalid_quantile_rejected() {
        let result = EngineConfig::from_json(r#"{ "roles": { "sovereign_quantile": 0.0 } }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_invalid_band_rejected() {
        let result = EngineConfig::from_json(
            r#"{ "roles": { "assistant_band_g": { "min": 20, "max": 10 } } }"#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "extraction": { "min_confidence": 0.6 } }"#).unwrap();

        let config = EngineConfig::from_path(&path).unwrap();
        assert_eq!(config.extraction.min_confidence, 0.6);
    }
}
