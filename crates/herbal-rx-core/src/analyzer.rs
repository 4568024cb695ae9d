//! Prescription analysis facade.
//!
//! Pipeline: Extraction → Deduplication → {Safety validation, Role classification}
//!
//! Safety and role classification run on the same deduplicated herb list and do
//! not depend on each other.

use std::sync::Arc;

use thiserror::Error;

use crate::config::{ConfigError, EngineConfig};
use crate::dedup::deduplicate;
use crate::extract::HerbExtractor;
use crate::lexicon::{HerbLexicon, LexiconError};
use crate::metadata::extract_metadata;
use crate::models::{
    Herb, PatientProfile, Prescription, PrescriptionAnalysis, PrescriptionMetadata,
};
use crate::roles::FormulaRoleClassifier;
use crate::safety::SafetyValidator;

/// Engine initialization errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Lexicon error: {0}")]
    Lexicon(#[from] LexiconError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Entry point: one analyzer per lexicon snapshot, shared freely across threads.
pub struct PrescriptionAnalyzer {
    lexicon: Arc<HerbLexicon>,
    config: EngineConfig,
    extractor: HerbExtractor,
    validator: SafetyValidator,
    classifier: FormulaRoleClassifier,
}

impl PrescriptionAnalyzer {
    /// Create an analyzer. The configuration is validated first.
    pub fn new(lexicon: Arc<HerbLexicon>, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        tracing::info!(
            lexicon_version = lexicon.version(),
            herbs = lexicon.len(),
            "prescription analyzer ready"
        );

        Ok(Self {
            extractor: HerbExtractor::new(Arc::clone(&lexicon), config.extraction.clone()),
            validator: SafetyValidator::new(Arc::clone(&lexicon), config.safety.clone()),
            classifier: FormulaRoleClassifier::new(Arc::clone(&lexicon), config.roles.clone()),
            lexicon,
            config,
        })
    }

    /// Analyzer over the built-in lexicon with default configuration.
    pub fn with_builtin_lexicon() -> EngineResult<Self> {
        Self::new(Arc::new(HerbLexicon::builtin()?), EngineConfig::default())
    }

    pub fn lexicon(&self) -> &Arc<HerbLexicon> {
        &self.lexicon
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the extractor (e.g. one carrying custom strategies).
    pub fn with_extractor(mut self, extractor: HerbExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Extract and deduplicate a prescription, returning it with extraction warnings.
    pub fn extract(&self, text: &str) -> (Prescription, Vec<String>) {
        let candidates = self.extractor.extract(text);
        let (herbs, mut warnings) = deduplicate(candidates);
        if herbs.is_empty() {
            warnings.push("no herbs extracted".to_string());
        }
        (Prescription::new(herbs, extract_metadata(text)), warnings)
    }

    /// Analyze free-text prescription.
    pub fn analyze(&self, text: &str, profile: Option<&PatientProfile>) -> PrescriptionAnalysis {
        let (prescription, warnings) = self.extract(text);
        let (herbs, metadata) = prescription.into_parts();
        self.assemble(herbs, metadata, warnings, profile)
    }

    /// Analyze an already-structured herb list (e.g. generated JSON), skipping extraction.
    ///
    /// Names are canonicalized against the lexicon first; unknown names pass through.
    pub fn analyze_herbs(
        &self,
        herbs: Vec<Herb>,
        profile: Option<&PatientProfile>,
    ) -> PrescriptionAnalysis {
        let mut warnings = Vec::new();
        if herbs.is_empty() {
            warnings.push("no herbs provided".to_string());
        }
        let herbs = herbs.into_iter().map(|h| self.canonicalize(h)).collect();
        self.assemble(herbs, PrescriptionMetadata::default(), warnings, profile)
    }

    fn canonicalize(&self, herb: Herb) -> Herb {
        match self.lexicon.resolve(herb.name()) {
            Some(m) if m.canonical != herb.name() => {
                tracing::debug!(from = herb.name(), to = %m.canonical, "herb name canonicalized");
                herb.canonicalized(m.canonical, m.preparation)
            }
            _ => herb,
        }
    }

    fn assemble(
        &self,
        herbs: Vec<Herb>,
        metadata: PrescriptionMetadata,
        warnings: Vec<String>,
        profile: Option<&PatientProfile>,
    ) -> PrescriptionAnalysis {
        let safety = self.validator.validate(&herbs, profile);
        let roles = self.classifier.classify(&herbs);

        tracing::info!(
            herbs = herbs.len(),
            violations = safety.violations().len(),
            is_safe = safety.is_safe(),
            warnings = warnings.len(),
            "prescription analyzed"
        );

        PrescriptionAnalysis {
            herbs,
            safety,
            roles,
            warnings,
            metadata,
            lexicon_fingerprint: self.lexicon.fingerprint().to_string(),
        }
    }
}
