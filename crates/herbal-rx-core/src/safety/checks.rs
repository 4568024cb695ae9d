//! Individual safety checks. Each appends violations and notes; none short-circuits.

use crate::config::SafetyConfig;
use crate::lexicon::{Contraindication, LexiconEntry};
use crate::models::{Herb, PatientProfile, Severity, Violation, ViolationKind};

/// A herb paired with its lexicon entry, if it has one.
pub(super) struct Resolved<'a> {
    pub herb: &'a Herb,
    pub entry: Option<&'a LexiconEntry>,
}

impl Resolved<'_> {
    /// Canonical name when known, the herb's own name otherwise.
    pub fn name(&self) -> &str {
        self.entry.map_or(self.herb.name(), |e| e.name.as_str())
    }
}

/// Forbidden pairs. Either side listing the other is enough; each unordered pair reports once.
pub(super) fn check_incompatibility(herbs: &[Resolved<'_>], violations: &mut Vec<Violation>) {
    for (i, a) in herbs.iter().enumerate() {
        let Some(entry_a) = a.entry else { continue };
        for b in &herbs[i + 1..] {
            let Some(entry_b) = b.entry else { continue };
            if entry_a.name == entry_b.name {
                continue;
            }
            if entry_a.is_incompatible_with(&entry_b.name)
                || entry_b.is_incompatible_with(&entry_a.name)
            {
                violations.push(Violation {
                    kind: ViolationKind::Incompatibility,
                    severity: Severity::Critical,
                    herbs: vec![entry_a.name.clone(), entry_b.name.clone()],
                    message: format!(
                        "{} and {} are a forbidden combination and must not be prescribed together",
                        entry_a.name, entry_b.name
                    ),
                });
            }
        }
    }
}

/// Toxic ceilings. Handling guidance is noted for every toxic herb present.
pub(super) fn check_toxicity(
    herbs: &[Resolved<'_>],
    violations: &mut Vec<Violation>,
    notes: &mut Vec<String>,
) {
    for resolved in herbs {
        let Some(entry) = resolved.entry.filter(|e| e.is_toxic()) else {
            continue;
        };
        let dosage = resolved.herb.dosage_g();

        if let Some(note) = &entry.handling_note {
            notes.push(format!("{}: {}", entry.name, note));
        }

        let Some(ceiling) = entry.toxic_ceiling else { continue };
        if dosage.is_finite() && dosage > ceiling {
            let mut message = format!(
                "{} at {} g exceeds the toxic ceiling of {} g",
                entry.name,
                fmt_grams(dosage),
                fmt_grams(ceiling)
            );
            if let Some(note) = &entry.handling_note {
                message.push_str("; ");
                message.push_str(note);
            }
            violations.push(Violation {
                kind: ViolationKind::ToxicOverdose,
                severity: Severity::High,
                herbs: vec![entry.name.clone()],
                message,
            });
        }
    }
}

/// Population and condition contraindications for the given patient.
pub(super) fn check_contraindications(
    herbs: &[Resolved<'_>],
    profile: &PatientProfile,
    violations: &mut Vec<Violation>,
) {
    if profile.active_flags().is_empty() {
        return;
    }

    for resolved in herbs {
        let Some(entry) = resolved.entry else { continue };
        let applicable = entry
            .contraindicated_for
            .iter()
            .filter(|c| profile.is_affected_by(c));
        for contraindication in applicable {
            violations.push(Violation {
                kind: ViolationKind::Contraindication,
                severity: Severity::High,
                herbs: vec![entry.name.clone()],
                message: format!(
                    "{} is contraindicated {}",
                    entry.name,
                    population(contraindication)
                ),
            });
        }
    }
}

fn population(contraindication: &Contraindication) -> String {
    match contraindication {
        Contraindication::Pregnant => "in pregnancy".to_string(),
        Contraindication::Pediatric => "for pediatric patients".to_string(),
        Contraindication::Elderly => "for elderly patients".to_string(),
        Contraindication::Condition(condition) => format!("for patients with {}", condition),
    }
}

/// Dosage reasonableness against the safe range, or the generic ceiling for unknown herbs.
pub(super) fn check_dosage_ranges(
    herbs: &[Resolved<'_>],
    config: &SafetyConfig,
    violations: &mut Vec<Violation>,
    notes: &mut Vec<String>,
) {
    for resolved in herbs {
        let name = resolved.name();
        let dosage = resolved.herb.dosage_g();

        if !dosage.is_finite() || dosage <= 0.0 {
            violations.push(Violation {
                kind: ViolationKind::DosageOutOfRange,
                severity: Severity::Medium,
                herbs: vec![name.to_string()],
                message: format!("{} has an invalid dosage ({})", name, dosage),
            });
            continue;
        }

        let message = match resolved.entry {
            Some(entry) if dosage < entry.safe_range.min => Some(format!(
                "{} at {} g is below the safe range of {}-{} g (too low: may be ineffective)",
                name,
                fmt_grams(dosage),
                fmt_grams(entry.safe_range.min),
                fmt_grams(entry.safe_range.max)
            )),
            Some(entry) if dosage > entry.safe_range.max => Some(format!(
                "{} at {} g is above the safe range of {}-{} g (too high: confirm safety)",
                name,
                fmt_grams(dosage),
                fmt_grams(entry.safe_range.min),
                fmt_grams(entry.safe_range.max)
            )),
            Some(_) => None,
            None => {
                notes.push(format!(
                    "{} is not in the lexicon; checked against a generic {} g ceiling only",
                    name,
                    fmt_grams(config.unknown_herb_max_g)
                ));
                (dosage > config.unknown_herb_max_g).then(|| {
                    format!(
                        "{} at {} g exceeds the generic ceiling of {} g for unlisted herbs (too high: confirm safety)",
                        name,
                        fmt_grams(dosage),
                        fmt_grams(config.unknown_herb_max_g)
                    )
                })
            }
        };

        if let Some(message) = message {
            violations.push(Violation {
                kind: ViolationKind::DosageOutOfRange,
                severity: Severity::Medium,
                herbs: vec![name.to_string()],
                message,
            });
        }
    }
}

/// Formula size.
pub(super) fn check_ingredient_count(
    unique_count: usize,
    config: &SafetyConfig,
    violations: &mut Vec<Violation>,
) {
    if unique_count < config.min_ingredients {
        violations.push(Violation {
            kind: ViolationKind::IngredientCountIssue,
            severity: Severity::Medium,
            herbs: Vec::new(),
            message: format!(
                "only {} herb(s): too few to constitute a credible formula (expected at least {})",
                unique_count, config.min_ingredients
            ),
        });
    } else if unique_count > config.max_ingredients {
        violations.push(Violation {
            kind: ViolationKind::IngredientCountIssue,
            severity: Severity::Low,
            herbs: Vec::new(),
            message: format!(
                "{} herbs exceeds {}: consider simplifying the formula",
                unique_count, config.max_ingredients
            ),
        });
    }
}

fn fmt_grams(value: f64) -> String {
    format!("{}", (value * 1000.0).round() / 1000.0)
}
