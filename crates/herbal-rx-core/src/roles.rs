//! Formula role classification (君臣佐使).
//!
//! Herbs are ranked by dosage, then assigned in passes:
//! 1. Sovereign: top quantile, primary-action category, dosage above the floor
//! 2. Minister: shares a sovereign's category, dosage above the floor
//! 3. Assistant: regulatory category, dosage within the band
//! 4. Envoy: harmonizing or channel-guiding herb
//! 5. Remainder: whichever of Minister/Assistant has fewer members
//!
//! Every herb receives exactly one role with a rationale.

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::RoleConfig;
use crate::lexicon::{FunctionalCategory, HerbLexicon, LexiconEntry};
use crate::models::{FormulaRole, Herb, RoleAssignment};

/// Assigns structural roles to the herbs of a formula.
pub struct FormulaRoleClassifier {
    lexicon: Arc<HerbLexicon>,
    config: RoleConfig,
}

impl FormulaRoleClassifier {
    pub fn new(lexicon: Arc<HerbLexicon>, config: RoleConfig) -> Self {
        Self { lexicon, config }
    }

    /// Classify herbs. Assignments come back in dosage-descending order (stable).
    pub fn classify(&self, herbs: &[Herb]) -> Vec<RoleAssignment> {
        let mut ranked: Vec<(&Herb, Option<&LexiconEntry>)> = herbs
            .iter()
            .map(|h| (h, self.lexicon.find(h.name())))
            .collect();
        ranked.sort_by(|a, b| {
            b.0.dosage_g()
                .partial_cmp(&a.0.dosage_g())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut roles: Vec<Option<(FormulaRole, String)>> = vec![None; ranked.len()];

        self.assign_sovereigns(&ranked, &mut roles);

        let sovereign_categories: HashSet<FunctionalCategory> = ranked
            .iter()
            .zip(&roles)
            .filter(|(_, r)| matches!(r, Some((FormulaRole::Sovereign, _))))
            .filter_map(|((_, entry), _)| entry.map(|e| e.category))
            .collect();

        for (i, (herb, entry)) in ranked.iter().enumerate() {
            if roles[i].is_some() {
                continue;
            }
            let Some(entry) = entry else { continue };
            if sovereign_categories.contains(&entry.category)
                && herb.dosage_g() > self.config.minister_floor_g
            {
                roles[i] = Some((
                    FormulaRole::Minister,
                    format!(
                        "reinforces sovereign action, same functional category ({})",
                        entry.category
                    ),
                ));
            }
        }

        for (i, (herb, entry)) in ranked.iter().enumerate() {
            if roles[i].is_some() {
                continue;
            }
            let Some(entry) = entry else { continue };
            if self.config.regulatory_categories.contains(&entry.category)
                && self.config.assistant_band_g.contains(herb.dosage_g())
            {
                roles[i] = Some((
                    FormulaRole::Assistant,
                    format!(
                        "moderates or complements the primary action ({})",
                        entry.category
                    ),
                ));
            }
        }

        for (i, (herb, entry)) in ranked.iter().enumerate() {
            if roles[i].is_some() {
                continue;
            }
            let guiding = entry.is_some_and(|e| e.channel_guiding);
            if self.is_harmonizing(herb, *entry) || guiding {
                roles[i] = Some((
                    FormulaRole::Envoy,
                    "harmonizes the formula or guides its action".to_string(),
                ));
            }
        }

        for i in 0..ranked.len() {
            if roles[i].is_some() {
                continue;
            }
            let count = |role: FormulaRole| {
                roles
                    .iter()
                    .filter(|r| matches!(r, Some((assigned, _)) if *assigned == role))
                    .count()
            };
            let role = if count(FormulaRole::Assistant) < count(FormulaRole::Minister) {
                FormulaRole::Assistant
            } else {
                FormulaRole::Minister
            };
            roles[i] = Some((
                role,
                "no specific criterion matched; balances minister and assistant membership"
                    .to_string(),
            ));
        }

        let assignments: Vec<RoleAssignment> = ranked
            .iter()
            .zip(roles)
            .filter_map(|((herb, _), role)| {
                role.map(|(role, rationale)| RoleAssignment {
                    herb_name: herb.name().to_string(),
                    role,
                    rationale,
                })
            })
            .collect();

        tracing::debug!(herbs = herbs.len(), "role classification complete");
        assignments
    }

    fn assign_sovereigns(
        &self,
        ranked: &[(&Herb, Option<&LexiconEntry>)],
        roles: &mut [Option<(FormulaRole, String)>],
    ) {
        if ranked.is_empty() {
            return;
        }

        let quota = ((ranked.len() as f64 * self.config.sovereign_quantile).ceil() as usize)
            .clamp(1, ranked.len());

        for (i, (herb, entry)) in ranked.iter().enumerate().take(quota) {
            let Some(entry) = entry else { continue };
            if self.config.primary_categories.contains(&entry.category)
                && herb.dosage_g() > self.config.sovereign_floor_g
            {
                roles[i] = Some((
                    FormulaRole::Sovereign,
                    format!(
                        "highest dosage, functionally aligned with a primary therapeutic action ({})",
                        entry.category
                    ),
                ));
            }
        }

        if !self.config.promote_top_when_no_sovereign || roles.iter().any(Option::is_some) {
            return;
        }

        let promoted = ranked
            .iter()
            .position(|(herb, entry)| !self.is_harmonizing(herb, *entry));
        if let Some(i) = promoted {
            roles[i] = Some((
                FormulaRole::Sovereign,
                "highest dosage in the formula; promoted because no herb met the sovereign criteria"
                    .to_string(),
            ));
        }
    }

    fn is_harmonizing(&self, herb: &Herb, entry: Option<&LexiconEntry>) -> bool {
        let name = entry.map_or(herb.name(), |e| e.name.as_str());
        self.config.harmonizing_herbs.iter().any(|h| h == name)
    }
}
