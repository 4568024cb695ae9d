//! Candidate deduplication and ranking.
//!
//! Exact duplicates (same name, same dosage at milligram resolution) collapse
//! to the most confident detection. The same herb at different dosages is a
//! conflict: the most confident detection wins (first seen on ties) and a
//! warning is recorded.

use std::collections::HashMap;

use crate::extract::Candidate;
use crate::models::Herb;

/// Deduplicate candidates into a ranked herb list plus conflict warnings.
///
/// Output is sorted by confidence descending, then first-seen order.
pub fn deduplicate(candidates: Vec<Candidate>) -> (Vec<Herb>, Vec<String>) {
    // Kept candidate per name in first-seen order, with the dosages it displaced
    let mut kept: Vec<(Candidate, Vec<f64>)> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for candidate in candidates {
        let name = candidate.herb.name().to_string();
        match by_name.get(&name) {
            None => {
                by_name.insert(name, kept.len());
                kept.push((candidate, Vec::new()));
            }
            Some(&slot) => {
                let (current, conflicts) = &mut kept[slot];
                let same_key = current.herb.dedup_key() == candidate.herb.dedup_key();
                if !same_key {
                    let loser = if candidate.herb.confidence() > current.herb.confidence() {
                        current.herb.dosage_g()
                    } else {
                        candidate.herb.dosage_g()
                    };
                    conflicts.push(loser);
                }
                if candidate.herb.confidence() > current.herb.confidence() {
                    *current = candidate;
                }
            }
        }
    }

    let mut warnings = Vec::new();
    for (candidate, conflicts) in &kept {
        let kept_mg = candidate.herb.dedup_key().1;
        let mut discarded: Vec<String> = Vec::new();
        for dosage in conflicts {
            let label = format!("{} g", fmt_grams(*dosage));
            if to_mg(*dosage) != kept_mg && !discarded.contains(&label) {
                discarded.push(label);
            }
        }
        if discarded.is_empty() {
            continue;
        }
        tracing::warn!(herb = candidate.herb.name(), "conflicting dosages");
        warnings.push(format!(
            "{} listed with conflicting dosages; kept {} g, discarded {}",
            candidate.herb.name(),
            fmt_grams(candidate.herb.dosage_g()),
            discarded.join(", ")
        ));
    }

    // Stable sort keeps first-seen order among equal confidences
    let mut herbs: Vec<Herb> = kept.into_iter().map(|(c, _)| c.herb).collect();
    herbs.sort_by(|a, b| {
        b.confidence()
            .partial_cmp(&a.confidence())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    (herbs, warnings)
}

fn to_mg(dosage: f64) -> i64 {
    (dosage * 1000.0).round() as i64
}

fn fmt_grams(dosage: f64) -> String {
    format!("{}", to_mg(dosage) as f64 / 1000.0)
}
