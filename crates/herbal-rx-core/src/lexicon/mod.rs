//! Herb lexicon: immutable reference data loaded once at startup.
//!
//! The lexicon holds canonical herb names with their English/pinyin/alias
//! spellings, functional categories, safe dosage ranges, toxicity metadata and
//! incompatibility pairs. Adding a forbidden pair is a data edit in
//! `data/herb_lexicon.json`, never a code change.

mod entry;
mod resolve;

pub use entry::*;
pub use resolve::*;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Lexicon shipped with the crate.
const BUILTIN_LEXICON: &str = include_str!("../../data/herb_lexicon.json");

/// Lexicon loading errors. Fatal at initialization, never raised per analysis.
#[derive(Error, Debug)]
pub enum LexiconError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid entry {name}: {reason}")]
    InvalidEntry { name: String, reason: String },

    #[error("Duplicate lookup key '{key}' for {first} and {second}")]
    DuplicateKey {
        key: String,
        first: String,
        second: String,
    },

    #[error("{name} lists unknown herb '{reference}' as incompatible")]
    UnknownReference { name: String, reference: String },
}

pub type LexiconResult<T> = Result<T, LexiconError>;

/// On-disk lexicon document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexiconFile {
    pub version: String,
    #[serde(default)]
    pub processing_prefixes: Vec<ProcessingPrefix>,
    pub entries: Vec<LexiconEntry>,
}

/// Immutable herb lexicon. Share across threads with `Arc<HerbLexicon>`.
#[derive(Debug, Clone)]
pub struct HerbLexicon {
    version: String,
    /// Canonical name → entry
    entries: BTreeMap<String, LexiconEntry>,
    /// Lowercased lookup key → canonical name
    index: HashMap<String, String>,
    /// Latin-script lookup keys for fuzzy matching, (key, canonical name)
    latin_keys: Vec<(String, String)>,
    /// Longest prefix first
    prefixes: Vec<ProcessingPrefix>,
    fingerprint: String,
}

impl HerbLexicon {
    /// Load the lexicon shipped with the crate.
    pub fn builtin() -> LexiconResult<Self> {
        Self::from_json(BUILTIN_LEXICON)
    }

    /// Parse and validate a lexicon document.
    pub fn from_json(json: &str) -> LexiconResult<Self> {
        let file: LexiconFile = serde_json::from_str(json)?;
        Self::from_file(file)
    }

    /// Load a lexicon document from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> LexiconResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Build from an already-parsed document.
    pub fn from_file(file: LexiconFile) -> LexiconResult<Self> {
        let mut entries = BTreeMap::new();
        for entry in file.entries {
            validate_entry(&entry)?;
            if let Some(previous) = entries.insert(entry.name.clone(), entry) {
                return Err(LexiconError::DuplicateKey {
                    key: previous.name.clone(),
                    first: previous.name.clone(),
                    second: previous.name,
                });
            }
        }

        let mut index: HashMap<String, String> = HashMap::new();
        for entry in entries.values() {
            for key in entry.lookup_keys() {
                match index.get(&key) {
                    Some(existing) if existing != &entry.name => {
                        return Err(LexiconError::DuplicateKey {
                            key,
                            first: existing.clone(),
                            second: entry.name.clone(),
                        });
                    }
                    _ => {
                        index.insert(key, entry.name.clone());
                    }
                }
            }
        }

        for entry in entries.values() {
            for reference in &entry.incompatible_with {
                if !entries.contains_key(reference) {
                    return Err(LexiconError::UnknownReference {
                        name: entry.name.clone(),
                        reference: reference.clone(),
                    });
                }
            }
        }

        let mut latin_keys: Vec<(String, String)> = index
            .iter()
            .filter(|(key, _)| is_latin_name(key))
            .map(|(key, name)| (key.clone(), name.clone()))
            .collect();
        latin_keys.sort();

        let mut prefixes = file.processing_prefixes;
        prefixes.iter_mut().for_each(|p| p.prefix = p.prefix.to_lowercase());
        prefixes.sort_by(|a, b| {
            b.prefix
                .chars()
                .count()
                .cmp(&a.prefix.chars().count())
                .then_with(|| a.prefix.cmp(&b.prefix))
        });

        let fingerprint = compute_fingerprint(&file.version, &prefixes, &entries)?;

        tracing::debug!(
            version = %file.version,
            entries = entries.len(),
            keys = index.len(),
            "Herb lexicon loaded"
        );

        Ok(Self {
            version: file.version,
            entries,
            index,
            latin_keys,
            prefixes,
            fingerprint,
        })
    }

    /// Lexicon data version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// SHA-256 of the canonical lexicon content (hex).
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Get an entry by canonical name.
    pub fn get(&self, canonical: &str) -> Option<&LexiconEntry> {
        self.entries.get(canonical)
    }

    /// Look up an entry by any of its spellings (case-insensitive).
    pub fn lookup(&self, name: &str) -> Option<&LexiconEntry> {
        let key = normalize_key(name);
        self.index.get(&key).and_then(|canonical| self.entries.get(canonical))
    }

    /// Find the entry for a raw name, falling back to full resolution
    /// (processing prefixes, suffix scan, fuzzy match) when no spelling matches.
    pub fn find(&self, name: &str) -> Option<&LexiconEntry> {
        self.lookup(name).or_else(|| {
            self.resolve(name)
                .and_then(|m| self.entries.get(&m.canonical))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &LexiconEntry> {
        self.entries.values()
    }

    pub fn processing_prefixes(&self) -> &[ProcessingPrefix] {
        &self.prefixes
    }

    pub(crate) fn latin_keys(&self) -> &[(String, String)] {
        &self.latin_keys
    }
}

fn validate_entry(entry: &LexiconEntry) -> LexiconResult<()> {
    let invalid = |reason: &str| LexiconError::InvalidEntry {
        name: entry.name.clone(),
        reason: reason.to_string(),
    };

    if entry.name.trim().is_empty() {
        return Err(invalid("empty name"));
    }
    let range = entry.safe_range;
    let finite = range.min.is_finite() && range.max.is_finite();
    if !finite || range.min <= 0.0 || range.min > range.max {
        return Err(invalid("safe_range must satisfy 0 < min <= max"));
    }
    match (entry.toxicity, entry.toxic_ceiling) {
        (ToxicityClass::Toxic, None) => return Err(invalid("toxic entry without toxic_ceiling")),
        (ToxicityClass::Toxic, Some(ceiling)) if !ceiling.is_finite() || ceiling <= 0.0 => {
            return Err(invalid("toxic_ceiling must be positive"))
        }
        _ => {}
    }
    if entry.incompatible_with.iter().any(|n| n == &entry.name) {
        return Err(invalid("entry lists itself as incompatible"));
    }
    Ok(())
}

fn compute_fingerprint(
    version: &str,
    prefixes: &[ProcessingPrefix],
    entries: &BTreeMap<String, LexiconEntry>,
) -> LexiconResult<String> {
    #[derive(Serialize)]
    struct Canonical<'a> {
        version: &'a str,
        processing_prefixes: &'a [ProcessingPrefix],
        entries: Vec<&'a LexiconEntry>,
    }

    let canonical = Canonical {
        version,
        processing_prefixes: prefixes,
        entries: entries.values().collect(),
    };
    let bytes = serde_json::to_vec(&canonical)?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Lowercase and collapse internal whitespace.
pub(crate) fn normalize_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// True for names made of ASCII letters, spaces, hyphens and apostrophes.
pub(crate) fn is_latin_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == ' ' || c == '-' || c == '\'')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_json(incompatible: &str) -> String {
        format!(
            r#"{{
                "version": "test",
                "entries": [
                    {{ "name": "甘草", "english_name": "Licorice", "pinyin": "gancao",
                       "category": "qi_tonifying", "safe_range": {{ "min": 2, "max": 10 }},
                       "incompatible_with": [{}] }}
                ]
            }}"#,
            incompatible
        )
    }

    #[test]
    fn test_builtin_loads() {
        let lexicon = HerbLexicon::builtin().unwrap();
        assert!(lexicon.len() > 100);
        assert_eq!(lexicon.fingerprint().len(), 64);
        assert_eq!(lexicon.lookup("Licorice").map(|e| e.name.as_str()), Some("甘草"));
        assert_eq!(lexicon.lookup("gancao").map(|e| e.name.as_str()), Some("甘草"));
        assert_eq!(lexicon.lookup("  Cinnamon   Twig ").map(|e| e.name.as_str()), Some("桂枝"));
        assert!(lexicon.lookup("not a herb").is_none());
    }

    #[test]
    fn test_builtin_incompatibility_pairs() {
        let lexicon = HerbLexicon::builtin().unwrap();
        let licorice = lexicon.get("甘草").unwrap();
        assert!(licorice.is_incompatible_with("甘遂"));
        assert!(licorice.is_incompatible_with("海藻"));

        let aconite = lexicon.lookup("aconite").unwrap();
        assert!(aconite.is_toxic());
        assert_eq!(aconite.toxic_ceiling, Some(3.0));
        assert!(aconite.is_incompatible_with("半夏"));
    }

    #[test]
    fn test_prefixes_sorted_longest_first() {
        let lexicon = HerbLexicon::builtin().unwrap();
        let prefixes = lexicon.processing_prefixes();
        let pos = |p: &str| prefixes.iter().position(|x| x.prefix == p).unwrap();
        assert!(pos("蜜炙") < pos("炙"));
        assert!(pos("honey-fried ") < pos("fried "));
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = HerbLexicon::builtin().unwrap();
        let b = HerbLexicon::builtin().unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let other = HerbLexicon::from_json(&minimal_json("")).unwrap();
        assert_ne!(a.fingerprint(), other.fingerprint());
    }

    #[test]
    fn test_unknown_reference_rejected() {
        let result = HerbLexicon::from_json(&minimal_json(r#""甘遂""#));
        assert!(matches!(result, Err(LexiconError::UnknownReference { .. })));
    }

    #[test]
    fn test_toxic_without_ceiling_rejected() {
        let json = r#"{
            "version": "test",
            "entries": [
                { "name": "附子", "english_name": "Prepared Aconite", "pinyin": "fuzi",
                  "category": "interior_warming", "safe_range": { "min": 3, "max": 15 },
                  "toxicity": "toxic" }
            ]
        }"#;
        assert!(matches!(
            HerbLexicon::from_json(json),
            Err(LexiconError::InvalidEntry { .. })
        ));
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let json = r#"{
            "version": "test",
            "entries": [
                { "name": "生姜", "english_name": "Fresh Ginger", "pinyin": "shengjiang",
                  "aliases": ["ginger"], "category": "exterior_releasing",
                  "safe_range": { "min": 3, "max": 10 } },
                { "name": "干姜", "english_name": "Dried Ginger", "pinyin": "ganjiang",
                  "aliases": ["ginger"], "category": "interior_warming",
                  "safe_range": { "min": 3, "max": 10 } }
            ]
        }"#;
        assert!(matches!(
            HerbLexicon::from_json(json),
            Err(LexiconError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(matches!(
            HerbLexicon::from_json("{ not json"),
            Err(LexiconError::Json(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.json");
        std::fs::write(&path, minimal_json("")).unwrap();

        let lexicon = HerbLexicon::from_path(&path).unwrap();
        assert_eq!(lexicon.version(), "test");
        assert_eq!(lexicon.len(), 1);

        let missing = HerbLexicon::from_path(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(LexiconError::Io(_))));
    }
}
