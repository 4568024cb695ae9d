//! Herbal Rx Core Library
//!
//! Extraction, safety validation and formula-role classification for free-text
//! herbal prescriptions.
//!
//! # Architecture
//!
//! ```text
//! Prescription text (typed or OCR)
//!         │
//!   HerbExtractor ── ordered strategies → denylist → units → lexicon → confidence
//!         │
//!   Deduplicator ── (name, dosage) collapse, conflict warnings, rank
//!         │
//!         ├──────────────────────────────┐
//!         ▼                              ▼
//!   SafetyValidator                FormulaRoleClassifier
//!   (pairs, toxicity,              (君 / 臣 / 佐 / 使)
//!    contraindications,
//!    ranges, count)
//!         │                              │
//!         └──────────────┬───────────────┘
//!                        ▼
//!               PrescriptionAnalysis
//! ```
//!
//! # Core Principle
//!
//! **The engine never silently passes an unsafe combination.** A safety report is
//! always produced; domain problems are violations, never errors.
//!
//! # Modules
//!
//! - [`lexicon`]: Immutable herb reference data and name resolution
//! - [`extract`]: Pattern-family herb extraction with confidence scoring
//! - [`dedup`]: Candidate deduplication and ranking
//! - [`safety`]: Safety rule validation
//! - [`roles`]: Formula role classification
//! - [`metadata`]: Diagnosis, syndrome, preparation and usage detection
//! - [`analyzer`]: The end-to-end facade
//! - [`config`]: Engine thresholds

pub mod analyzer;
pub mod config;
pub mod dedup;
pub mod extract;
pub mod lexicon;
pub mod metadata;
pub mod models;
pub mod roles;
pub mod safety;

// Re-export commonly used types
pub use analyzer::{EngineError, EngineResult, PrescriptionAnalyzer};
pub use config::{EngineConfig, ExtractionConfig, RoleConfig, SafetyConfig};
pub use extract::{Candidate, ExtractionStrategy, HerbExtractor, RawMatch};
pub use lexicon::{HerbLexicon, LexiconEntry, LexiconError};
pub use models::{
    AgeBand, FormulaRole, Herb, PatientProfile, Prescription, PrescriptionAnalysis,
    PrescriptionMetadata, RoleAssignment, SafetyReport, Severity, Violation, ViolationKind,
};
pub use roles::FormulaRoleClassifier;
pub use safety::SafetyValidator;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "herbal_rx_core=info";

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum HerbalRxError {
    #[error("Lexicon error: {0}")]
    LexiconError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<LexiconError> for HerbalRxError {
    fn from(e: LexiconError) -> Self {
        HerbalRxError::LexiconError(e.to_string())
    }
}

impl From<config::ConfigError> for HerbalRxError {
    fn from(e: config::ConfigError) -> Self {
        HerbalRxError::ConfigError(e.to_string())
    }
}

impl From<EngineError> for HerbalRxError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Lexicon(e) => e.into(),
            EngineError::Config(e) => e.into(),
        }
    }
}

impl From<serde_json::Error> for HerbalRxError {
    fn from(e: serde_json::Error) -> Self {
        HerbalRxError::SerializationError(e.to_string())
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Load an engine over the built-in lexicon with default thresholds.
#[uniffi::export]
pub fn load_engine() -> Result<Arc<HerbalRxEngine>, HerbalRxError> {
    let analyzer = PrescriptionAnalyzer::with_builtin_lexicon()?;
    Ok(Arc::new(HerbalRxEngine { analyzer }))
}

/// Load an engine from a lexicon document and an optional configuration document.
#[uniffi::export]
pub fn load_engine_from_json(
    lexicon_json: String,
    config_json: Option<String>,
) -> Result<Arc<HerbalRxEngine>, HerbalRxError> {
    let lexicon = HerbLexicon::from_json(&lexicon_json)?;
    let config = match config_json {
        Some(json) => EngineConfig::from_json(&json)?,
        None => EngineConfig::default(),
    };
    let analyzer = PrescriptionAnalyzer::new(Arc::new(lexicon), config)?;
    Ok(Arc::new(HerbalRxEngine { analyzer }))
}

/// Install the global tracing subscriber. `RUST_LOG` wins over `filter`.
///
/// Returns false when a subscriber was already installed.
#[uniffi::export]
pub fn init_logging(filter: Option<String>) -> bool {
    let fallback = filter.unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .try_init()
        .is_ok()
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe engine for FFI. Calls need no locking.
#[derive(uniffi::Object)]
pub struct HerbalRxEngine {
    analyzer: PrescriptionAnalyzer,
}

#[uniffi::export]
impl HerbalRxEngine {
    /// Analyze a free-text prescription.
    pub fn analyze(
        &self,
        text: String,
        profile: Option<FfiPatientProfile>,
    ) -> FfiPrescriptionAnalysis {
        let profile = profile.map(PatientProfile::from);
        self.analyzer.analyze(&text, profile.as_ref()).into()
    }

    /// Analyze a free-text prescription and return the analysis as JSON.
    pub fn analyze_json(
        &self,
        text: String,
        profile: Option<FfiPatientProfile>,
    ) -> Result<String, HerbalRxError> {
        let profile = profile.map(PatientProfile::from);
        Ok(self.analyzer.analyze(&text, profile.as_ref()).to_json()?)
    }

    /// Analyze a JSON array of herbs (`[{"name": ..., "dosage_g": ...}]`), skipping extraction.
    pub fn analyze_herbs_json(
        &self,
        herbs_json: String,
        profile: Option<FfiPatientProfile>,
    ) -> Result<String, HerbalRxError> {
        let herbs: Vec<Herb> = serde_json::from_str(&herbs_json)
            .map_err(|e| HerbalRxError::InvalidInput(e.to_string()))?;
        let profile = profile.map(PatientProfile::from);
        Ok(self.analyzer.analyze_herbs(herbs, profile.as_ref()).to_json()?)
    }

    pub fn lexicon_version(&self) -> String {
        self.analyzer.lexicon().version().to_string()
    }

    pub fn lexicon_fingerprint(&self) -> String {
        self.analyzer.lexicon().fingerprint().to_string()
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe age band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiAgeBand {
    Pediatric,
    Adult,
    Elderly,
}

impl From<FfiAgeBand> for AgeBand {
    fn from(band: FfiAgeBand) -> Self {
        match band {
            FfiAgeBand::Pediatric => AgeBand::Pediatric,
            FfiAgeBand::Adult => AgeBand::Adult,
            FfiAgeBand::Elderly => AgeBand::Elderly,
        }
    }
}

/// FFI-safe patient profile.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientProfile {
    pub is_pregnant: bool,
    pub age_band: FfiAgeBand,
    pub conditions: Vec<String>,
}

impl From<FfiPatientProfile> for PatientProfile {
    fn from(profile: FfiPatientProfile) -> Self {
        let mut result = PatientProfile::new().with_age_band(profile.age_band.into());
        if profile.is_pregnant {
            result = result.pregnant();
        }
        profile
            .conditions
            .iter()
            .fold(result, |p, condition| p.with_condition(condition))
    }
}

/// FFI-safe herb.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiHerb {
    pub name: String,
    pub dosage_g: f64,
    pub preparation: Option<String>,
    pub annotation: Option<String>,
    pub confidence: f64,
}

impl From<Herb> for FfiHerb {
    fn from(herb: Herb) -> Self {
        Self {
            name: herb.name().to_string(),
            dosage_g: herb.dosage_g(),
            preparation: herb.preparation().map(String::from),
            annotation: herb.annotation().map(String::from),
            confidence: herb.confidence(),
        }
    }
}

/// FFI-safe violation.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiViolation {
    pub kind: String,
    pub severity: String,
    pub herbs: Vec<String>,
    pub message: String,
}

impl From<Violation> for FfiViolation {
    fn from(violation: Violation) -> Self {
        Self {
            kind: violation.kind.as_str().to_string(),
            severity: violation.severity.as_str().to_string(),
            herbs: violation.herbs,
            message: violation.message,
        }
    }
}

/// FFI-safe safety report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSafetyReport {
    pub is_safe: bool,
    pub violations: Vec<FfiViolation>,
    pub notes: Vec<String>,
}

impl From<SafetyReport> for FfiSafetyReport {
    fn from(report: SafetyReport) -> Self {
        Self {
            is_safe: report.is_safe(),
            violations: report.violations().iter().cloned().map(|v| v.into()).collect(),
            notes: report.notes().to_vec(),
        }
    }
}

/// FFI-safe role assignment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRoleAssignment {
    pub herb_name: String,
    pub role: String,
    pub rationale: String,
}

impl From<RoleAssignment> for FfiRoleAssignment {
    fn from(assignment: RoleAssignment) -> Self {
        Self {
            herb_name: assignment.herb_name,
            role: assignment.role.as_str().to_string(),
            rationale: assignment.rationale,
        }
    }
}

/// FFI-safe prescription metadata.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescriptionMetadata {
    pub preparation_method: Option<String>,
    pub usage_instructions: Option<String>,
    pub syndrome_pattern: Option<String>,
    pub disease_name: Option<String>,
}

impl From<PrescriptionMetadata> for FfiPrescriptionMetadata {
    fn from(metadata: PrescriptionMetadata) -> Self {
        Self {
            preparation_method: metadata.preparation_method,
            usage_instructions: metadata.usage_instructions,
            syndrome_pattern: metadata.syndrome_pattern,
            disease_name: metadata.disease_name,
        }
    }
}

/// FFI-safe prescription analysis.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescriptionAnalysis {
    pub herbs: Vec<FfiHerb>,
    pub safety: FfiSafetyReport,
    pub roles: Vec<FfiRoleAssignment>,
    pub warnings: Vec<String>,
    pub metadata: FfiPrescriptionMetadata,
    pub lexicon_fingerprint: String,
}

impl From<PrescriptionAnalysis> for FfiPrescriptionAnalysis {
    fn from(analysis: PrescriptionAnalysis) -> Self {
        Self {
            herbs: analysis.herbs.into_iter().map(|h| h.into()).collect(),
            safety: analysis.safety.into(),
            roles: analysis.roles.into_iter().map(|r| r.into()).collect(),
            warnings: analysis.warnings,
            metadata: analysis.metadata.into(),
            lexicon_fingerprint: analysis.lexicon_fingerprint,
        }
    }
}
