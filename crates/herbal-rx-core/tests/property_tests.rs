//! Property tests over generated formulas.

use std::collections::BTreeMap;

use herbal_rx_core::models::{Herb, Severity};
use herbal_rx_core::PrescriptionAnalyzer;
use proptest::prelude::*;

const HERBS: &[&str] = &[
    "麻黄", "桂枝", "柴胡", "黄芪", "当归", "陈皮", "黄连", "白术", "茯苓", "黄芩", "知母",
    "石膏", "川芎", "白芍", "熟地黄",
];

fn formula() -> impl Strategy<Value = BTreeMap<&'static str, u32>> {
    prop::collection::btree_map(prop::sample::select(HERBS), 3u32..=15, 1..10)
}

fn to_herbs(formula: &BTreeMap<&'static str, u32>) -> Vec<Herb> {
    formula
        .iter()
        .map(|(name, dosage)| Herb::new(*name, f64::from(*dosage), 1.0).unwrap())
        .collect()
}

fn to_text(herbs: &[Herb]) -> String {
    herbs
        .iter()
        .map(|h| format!("{} {}g", h.name(), h.dosage_g()))
        .collect::<Vec<_>>()
        .join("\n")
}

proptest! {
    #[test]
    fn every_herb_gets_exactly_one_role(formula in formula()) {
        let analyzer = PrescriptionAnalyzer::with_builtin_lexicon().unwrap();
        let herbs = to_herbs(&formula);
        let analysis = analyzer.analyze_herbs(herbs.clone(), None);

        prop_assert_eq!(analysis.roles.len(), herbs.len());
        for herb in &herbs {
            let count = analysis.roles.iter().filter(|r| r.herb_name == herb.name()).count();
            prop_assert_eq!(count, 1);
        }
        prop_assert!(analysis.roles.iter().all(|r| !r.rationale.is_empty()));
    }

    #[test]
    fn extraction_is_deterministic_and_idempotent(formula in formula()) {
        let analyzer = PrescriptionAnalyzer::with_builtin_lexicon().unwrap();
        let text = to_text(&to_herbs(&formula));

        let first = analyzer.analyze(&text, None);
        prop_assert_eq!(&first, &analyzer.analyze(&text, None));
        prop_assert_eq!(first.herbs.len(), formula.len());

        // Re-rendering the extracted herbs extracts the same herbs again
        let second = analyzer.analyze(&to_text(&first.herbs), None);
        prop_assert_eq!(first.herbs, second.herbs);
    }

    #[test]
    fn forbidden_pair_always_flips_safety(formula in formula()) {
        let analyzer = PrescriptionAnalyzer::with_builtin_lexicon().unwrap();
        let base = to_herbs(&formula);
        let before = analyzer.analyze_herbs(base.clone(), None);
        prop_assert!(before.safety.is_safe());

        let mut with_pair = base.clone();
        with_pair.push(Herb::new("甘草", 6.0, 1.0).unwrap());
        with_pair.push(Herb::new("甘遂", 1.0, 1.0).unwrap());
        let unsafe_analysis = analyzer.analyze_herbs(with_pair, None);
        prop_assert!(!unsafe_analysis.safety.is_safe());
        prop_assert_eq!(unsafe_analysis.safety.highest_severity(), Some(Severity::Critical));

        let after = analyzer.analyze_herbs(base, None);
        prop_assert!(after.safety.is_safe());
        prop_assert_eq!(before.safety, after.safety);
    }

    #[test]
    fn arbitrary_text_never_panics(text in "\\PC{0,200}") {
        let analyzer = PrescriptionAnalyzer::with_builtin_lexicon().unwrap();
        let analysis = analyzer.analyze(&text, None);
        prop_assert!(analysis.herbs.iter().all(|h| h.dosage_g() > 0.0));
        prop_assert_eq!(analysis.roles.len(), analysis.herbs.len());
    }
}
