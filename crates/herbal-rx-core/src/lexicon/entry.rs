//! Herb lexicon reference models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Functional category of a herb (its primary therapeutic action class).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionalCategory {
    ExteriorReleasing,
    HeatClearing,
    Purgative,
    DampDraining,
    WindDampDispelling,
    InteriorWarming,
    QiRegulating,
    BloodActivating,
    Hemostatic,
    PhlegmResolving,
    CoughRelieving,
    Calming,
    LiverCalming,
    Digestive,
    AromaticDampResolving,
    QiTonifying,
    BloodNourishing,
    YinNourishing,
    YangTonifying,
    Astringent,
    Emetic,
    ExternalUse,
}

impl FunctionalCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionalCategory::ExteriorReleasing => "exterior-releasing",
            FunctionalCategory::HeatClearing => "heat-clearing",
            FunctionalCategory::Purgative => "purgative",
            FunctionalCategory::DampDraining => "damp-draining",
            FunctionalCategory::WindDampDispelling => "wind-damp-dispelling",
            FunctionalCategory::InteriorWarming => "interior-warming",
            FunctionalCategory::QiRegulating => "qi-regulating",
            FunctionalCategory::BloodActivating => "blood-activating",
            FunctionalCategory::Hemostatic => "hemostatic",
            FunctionalCategory::PhlegmResolving => "phlegm-resolving",
            FunctionalCategory::CoughRelieving => "cough-relieving",
            FunctionalCategory::Calming => "calming",
            FunctionalCategory::LiverCalming => "liver-calming",
            FunctionalCategory::Digestive => "digestive",
            FunctionalCategory::AromaticDampResolving => "aromatic-damp-resolving",
            FunctionalCategory::QiTonifying => "qi-tonifying",
            FunctionalCategory::BloodNourishing => "blood-nourishing",
            FunctionalCategory::YinNourishing => "yin-nourishing",
            FunctionalCategory::YangTonifying => "yang-tonifying",
            FunctionalCategory::Astringent => "astringent",
            FunctionalCategory::Emetic => "emetic",
            FunctionalCategory::ExternalUse => "external-use",
        }
    }
}

impl fmt::Display for FunctionalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Toxicity classification of a herb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToxicityClass {
    #[default]
    None,
    /// Mildly toxic (有小毒); no hard ceiling
    Caution,
    /// Toxic; carries a dosage ceiling and handling guidance
    Toxic,
}

/// Safe dosage range in grams per daily dose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DosageRange {
    pub min: f64,
    pub max: f64,
}

impl DosageRange {
    pub fn contains(&self, dosage: f64) -> bool {
        dosage >= self.min && dosage <= self.max
    }
}

/// A population or condition a herb is contraindicated for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Contraindication {
    Pregnant,
    Pediatric,
    Elderly,
    /// Named condition, stored lowercase (e.g. "hypertension")
    Condition(String),
}

impl From<String> for Contraindication {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "pregnant" | "pregnancy" => Contraindication::Pregnant,
            "pediatric" | "children" => Contraindication::Pediatric,
            "elderly" => Contraindication::Elderly,
            other => Contraindication::Condition(other.to_string()),
        }
    }
}

impl From<Contraindication> for String {
    fn from(value: Contraindication) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Contraindication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contraindication::Pregnant => write!(f, "pregnant"),
            Contraindication::Pediatric => write!(f, "pediatric"),
            Contraindication::Elderly => write!(f, "elderly"),
            Contraindication::Condition(name) => write!(f, "{}", name),
        }
    }
}

/// A single herb in the reference lexicon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LexiconEntry {
    /// Canonical name (Chinese)
    pub name: String,
    /// English common name
    pub english_name: String,
    /// Pinyin romanization, lowercase without tones
    pub pinyin: String,
    /// Alternative names and spellings
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Functional category
    pub category: FunctionalCategory,
    /// Safe daily dosage range in grams
    pub safe_range: DosageRange,
    /// Toxicity class
    #[serde(default)]
    pub toxicity: ToxicityClass,
    /// Dosage ceiling in grams (toxic entries only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toxic_ceiling: Option<f64>,
    /// Special preparation guidance (e.g. pre-decoction)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handling_note: Option<String>,
    /// Populations and conditions this herb is contraindicated for
    #[serde(default)]
    pub contraindicated_for: Vec<Contraindication>,
    /// Canonical names of herbs this one must not be combined with
    #[serde(default)]
    pub incompatible_with: Vec<String>,
    /// Guides the formula's action to a channel or body region
    #[serde(default)]
    pub channel_guiding: bool,
}

impl LexiconEntry {
    pub fn is_toxic(&self) -> bool {
        self.toxicity == ToxicityClass::Toxic
    }

    /// Check whether this entry lists `other` as incompatible.
    pub fn is_incompatible_with(&self, other: &str) -> bool {
        self.incompatible_with.iter().any(|name| name == other)
    }

    /// All lookup keys for this entry (canonical, English, pinyin, aliases), lowercased.
    pub fn lookup_keys(&self) -> Vec<String> {
        let mut keys = vec![
            self.name.to_lowercase(),
            self.english_name.to_lowercase(),
            self.pinyin.to_lowercase(),
        ];
        keys.extend(self.aliases.iter().map(|a| a.to_lowercase()));
        keys.dedup();
        keys
    }
}

/// A processing prefix (e.g. 炒, "honey-fried ") and the preparation it denotes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessingPrefix {
    pub prefix: String,
    pub preparation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contraindication_from_string() {
        assert_eq!(Contraindication::from("Pregnant".to_string()), Contraindication::Pregnant);
        assert_eq!(Contraindication::from("elderly".to_string()), Contraindication::Elderly);
        assert_eq!(
            Contraindication::from("Hypertension".to_string()),
            Contraindication::Condition("hypertension".into())
        );
    }

    #[test]
    fn test_entry_deserialize_defaults() {
        let json = r#"{
            "name": "陈皮", "english_name": "Tangerine Peel", "pinyin": "chenpi",
            "category": "qi_regulating", "safe_range": { "min": 3, "max": 10 }
        }"#;
        let entry: LexiconEntry = serde_json::from_str(json).unwrap();

        assert_eq!(entry.toxicity, ToxicityClass::None);
        assert!(entry.aliases.is_empty());
        assert!(!entry.channel_guiding);
        assert!(entry.safe_range.contains(3.0));
        assert!(!entry.safe_range.contains(10.5));
        assert_eq!(entry.lookup_keys(), vec!["陈皮", "tangerine peel", "chenpi"]);
    }

    #[test]
    fn test_category_display() {
        assert_eq!(FunctionalCategory::QiTonifying.to_string(), "qi-tonifying");
    }
}
