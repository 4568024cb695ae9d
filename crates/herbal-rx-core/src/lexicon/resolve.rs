//! Herb name resolution against the lexicon.
//!
//! Resolution order:
//! 1. Exact match on any spelling (canonical, English, pinyin, alias)
//! 2. Processing-prefix strip (炒白术 → 白术 + "fried")
//! 3. Trailing suffix scan for text glued onto the name (用麻黄 → 麻黄)
//! 4. Fuzzy match for OCR-damaged Latin-script names

use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, normalized_levenshtein};

use super::{is_latin_name, normalize_key, HerbLexicon};

/// Match quality for a prefix-stripped name.
const PREFIX_QUALITY: f64 = 0.95;

/// Multiplier applied when the name was found inside a longer span.
const SUFFIX_PENALTY: f64 = 0.85;

/// Minimum combined similarity for a fuzzy match.
const FUZZY_THRESHOLD: f64 = 0.90;

/// Fuzzy matching only applies to names at least this long.
const FUZZY_MIN_LEN: usize = 5;

/// Multiplier applied to the similarity score of a fuzzy match.
const FUZZY_PENALTY: f64 = 0.9;

/// How a raw name was matched to the lexicon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Exact,
    PrefixStripped,
    Suffix,
    Fuzzy,
}

/// A resolved lexicon match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameMatch {
    /// Canonical lexicon name
    pub canonical: String,
    /// Preparation implied by a stripped processing prefix
    pub preparation: Option<String>,
    pub method: MatchMethod,
    /// Match quality (0.0 - 1.0)
    pub quality: f64,
}

impl HerbLexicon {
    /// Resolve a raw extracted name to a lexicon entry.
    pub fn resolve(&self, raw: &str) -> Option<NameMatch> {
        let key = normalize_key(raw);
        if key.is_empty() {
            return None;
        }

        self.resolve_direct(&key)
            .or_else(|| self.resolve_suffix(&key))
            .or_else(|| self.resolve_fuzzy(&key))
    }

    /// Split a processing prefix off a raw name, keeping the remainder only
    /// when it is a lexicon name. Returns (lookup key, preparation).
    pub fn strip_processing_prefix(&self, raw: &str) -> Option<(String, String)> {
        let key = normalize_key(raw);
        self.prefixes.iter().find_map(|p| {
            let rest = key.strip_prefix(&p.prefix)?.trim();
            if !rest.is_empty() && self.index.contains_key(rest) {
                Some((rest.to_string(), p.preparation.clone()))
            } else {
                None
            }
        })
    }

    fn resolve_direct(&self, key: &str) -> Option<NameMatch> {
        if let Some(canonical) = self.index.get(key) {
            return Some(NameMatch {
                canonical: canonical.clone(),
                preparation: None,
                method: MatchMethod::Exact,
                quality: 1.0,
            });
        }

        let (stripped, preparation) = self.strip_processing_prefix(key)?;
        let canonical = self.index.get(&stripped)?;
        Some(NameMatch {
            canonical: canonical.clone(),
            preparation: Some(preparation),
            method: MatchMethod::PrefixStripped,
            quality: PREFIX_QUALITY,
        })
    }

    fn resolve_suffix(&self, key: &str) -> Option<NameMatch> {
        let suffixes: Vec<String> = if is_latin_name(key) {
            let words: Vec<&str> = key.split(' ').collect();
            (1..words.len()).map(|start| words[start..].join(" ")).collect()
        } else if key.chars().all(is_cjk) {
            let chars: Vec<char> = key.chars().collect();
            (1..chars.len().saturating_sub(1))
                .map(|start| chars[start..].iter().collect())
                .collect()
        } else {
            return None;
        };

        suffixes.iter().find_map(|suffix| {
            self.resolve_direct(suffix).map(|m| NameMatch {
                method: MatchMethod::Suffix,
                quality: m.quality * SUFFIX_PENALTY,
                ..m
            })
        })
    }

    fn resolve_fuzzy(&self, key: &str) -> Option<NameMatch> {
        if !is_latin_name(key) || key.len() < FUZZY_MIN_LEN {
            return None;
        }

        let mut best: Option<(f64, &str)> = None;
        for (candidate, canonical) in self.latin_keys() {
            let score = fuzzy_match(key, candidate);
            if score >= FUZZY_THRESHOLD && best.map_or(true, |(b, _)| score > b) {
                best = Some((score, canonical));
            }
        }

        best.map(|(score, canonical)| NameMatch {
            canonical: canonical.to_string(),
            preparation: None,
            method: MatchMethod::Fuzzy,
            quality: score * FUZZY_PENALTY,
        })
    }
}

/// CJK unified ideograph (basic block plus extension A).
pub fn is_cjk(c: char) -> bool {
    matches!(c, '\u{4e00}'..='\u{9fff}' | '\u{3400}'..='\u{4dbf}')
}

/// Compute fuzzy string similarity using combined metrics.
fn fuzzy_match(a: &str, b: &str) -> f64 {
    // Jaro-Winkler favours shared prefixes, which OCR damage usually preserves
    let jw = jaro_winkler(a, b);
    let lev = normalized_levenshtein(a, b);
    jw * 0.6 + lev * 0.4
}
