//! Herb extraction from free-text prescriptions.
//!
//! Pipeline per line: width folding → first matching strategy → denylist →
//! unit conversion → lexicon resolution → confidence scoring → threshold.

mod normalizer;
mod scoring;
mod strategy;

pub use normalizer::*;
pub use scoring::*;
pub use strategy::*;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::ExtractionConfig;
use crate::lexicon::{normalize_key, HerbLexicon, NameMatch};
use crate::models::Herb;

/// One extracted herb with its provenance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub herb: Herb,
    /// Width-folded source line
    pub source_line: String,
    /// Index among the non-empty lines of the input
    pub line_index: usize,
    /// Strategy that produced the match
    pub strategy: String,
    /// Whether the name resolved against the lexicon
    pub known: bool,
    pub breakdown: ScoreBreakdown,
}

/// Extracts herb candidates from prescription text.
pub struct HerbExtractor {
    lexicon: Arc<HerbLexicon>,
    config: ExtractionConfig,
    normalizer: DosageNormalizer,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    /// Lowercased copies of the configured phrase lists
    denylist: Vec<String>,
    keywords: Vec<String>,
}

impl HerbExtractor {
    /// Create an extractor with the built-in strategies.
    pub fn new(lexicon: Arc<HerbLexicon>, config: ExtractionConfig) -> Self {
        let denylist = config.denylist.iter().map(|d| normalize_key(d)).collect();
        let keywords = config.medical_keywords.iter().map(|k| k.to_lowercase()).collect();
        Self {
            lexicon,
            config,
            normalizer: DosageNormalizer::new(),
            strategies: default_strategies(),
            denylist,
            keywords,
        }
    }

    /// Append a custom strategy, tried after the built-in ones.
    pub fn with_strategy(mut self, strategy: Box<dyn ExtractionStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Replace the dosage normalizer (e.g. to add regional units).
    pub fn with_normalizer(mut self, normalizer: DosageNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Extract candidates in source order. Never fails; an empty result is the failure signal.
    pub fn extract(&self, text: &str) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        let lines = text
            .lines()
            .map(|l| fold_width(l).trim().to_string())
            .filter(|l| !l.is_empty());

        for (line_index, line) in lines.enumerate() {
            let Some((strategy, raws)) = self.match_line(&line) else {
                tracing::trace!(line_index, "no strategy matched");
                continue;
            };

            for raw in raws {
                if let Some(candidate) = self.evaluate(raw, &line, line_index, strategy) {
                    candidates.push(candidate);
                }
            }
        }

        tracing::debug!(count = candidates.len(), "extraction complete");
        candidates
    }

    /// First strategy yielding any match wins the line.
    fn match_line(&self, line: &str) -> Option<(&'static str, Vec<RawMatch>)> {
        self.strategies.iter().find_map(|s| {
            s.try_extract(line)
                .filter(|m| !m.is_empty())
                .map(|m| (s.name(), m))
        })
    }

    fn evaluate(
        &self,
        raw: RawMatch,
        line: &str,
        line_index: usize,
        strategy: &'static str,
    ) -> Option<Candidate> {
        let key = normalize_key(&raw.name);
        if let Some(phrase) = self.denylist.iter().find(|d| key.contains(d.as_str())) {
            tracing::debug!(name = %raw.name, phrase = %phrase, "denylisted phrase");
            return None;
        }

        let Some(dosage_g) = self.normalizer.to_grams(raw.quantity, raw.unit.as_deref()) else {
            tracing::debug!(name = %raw.name, unit = ?raw.unit, "not a mass dosage");
            return None;
        };

        let resolved = self.lexicon.resolve(&raw.name);
        let breakdown = ScoreBreakdown {
            lexicon_score: resolved.as_ref().map_or(0.0, |m| m.quality),
            dosage_score: score_dosage(dosage_g, &self.config),
            context_score: score_context(raw.unit.is_some(), line, &self.keywords),
            shape_score: score_shape(&raw.name),
        };
        let confidence = breakdown.weighted_score(&self.config.weights);

        if confidence < self.config.min_confidence {
            tracing::trace!(name = %raw.name, confidence, "below confidence threshold");
            return None;
        }

        let (name, preparation) = match &resolved {
            Some(NameMatch {
                canonical,
                preparation,
                ..
            }) => (canonical.clone(), preparation.clone()),
            None => (raw.name.clone(), None),
        };
        let (preparation, annotation) = self.split_annotation(preparation, raw.annotation);

        match Herb::new(name, dosage_g, confidence) {
            Ok(herb) => Some(Candidate {
                herb: herb
                    .with_preparation(preparation)
                    .with_annotation(annotation),
                source_line: line.to_string(),
                line_index,
                strategy: strategy.to_string(),
                known: resolved.is_some(),
                breakdown,
            }),
            Err(e) => {
                tracing::debug!(error = %e, "discarded candidate");
                None
            }
        }
    }

    /// A parenthesized processing marker (炒, honey-fried) is a preparation,
    /// anything else stays an annotation.
    fn split_annotation(
        &self,
        preparation: Option<String>,
        annotation: Option<String>,
    ) -> (Option<String>, Option<String>) {
        let Some(note) = annotation else {
            return (preparation, None);
        };
        let key = normalize_key(&note);
        let marker = self.lexicon.processing_prefixes().iter().find(|p| {
            p.prefix.trim().to_lowercase() == key || p.preparation.to_lowercase() == key
        });

        match marker {
            Some(p) if preparation.is_none() => (Some(p.preparation.clone()), None),
            _ => (preparation, Some(note)),
        }
    }
}
