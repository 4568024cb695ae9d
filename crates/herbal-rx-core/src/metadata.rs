//! Prescription metadata detection.
//!
//! Labelled lines (诊断: ..., Usage: ...) take priority; otherwise well-known
//! preparation and usage phrases mark a whole line.

use std::sync::LazyLock;

use regex::Regex;

use crate::extract::fold_width;
use crate::models::PrescriptionMetadata;

static DISEASE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:中医诊断|西医诊断|诊断|病名|diagnosis)\s*:\s*(?P<value>.+)$")
        .expect("valid regex")
});

static SYNDROME_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:证型|辨证|证候|syndrome(?: pattern)?|pattern)\s*:\s*(?P<value>.+)$")
        .expect("valid regex")
});

static PREPARATION_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:煎服法|煎法|preparation|decoction method)\s*:\s*(?P<value>.+)$")
        .expect("valid regex")
});

static USAGE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:用法|服法|usage|directions)\s*:\s*(?P<value>.+)$").expect("valid regex")
});

const PREPARATION_PHRASES: &[&str] = &["水煎", "煎服", "decoct in water", "boil in water"];

const USAGE_PHRASES: &[&str] = &[
    "每日",
    "日一剂",
    "一日",
    "每次",
    "times daily",
    "times a day",
    "twice daily",
    "once daily",
    "per day",
];

/// Detect metadata in prescription text. The first line found wins for each field.
pub fn extract_metadata(text: &str) -> PrescriptionMetadata {
    let lines: Vec<String> = text
        .lines()
        .map(|l| fold_width(l).trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();

    PrescriptionMetadata {
        disease_name: find_labelled(&lines, &DISEASE_LABEL),
        syndrome_pattern: find_labelled(&lines, &SYNDROME_LABEL),
        preparation_method: find_labelled(&lines, &PREPARATION_LABEL)
            .or_else(|| find_phrase(&lines, PREPARATION_PHRASES)),
        usage_instructions: find_labelled(&lines, &USAGE_LABEL)
            .or_else(|| find_phrase(&lines, USAGE_PHRASES)),
    }
}

fn find_labelled(lines: &[String], pattern: &Regex) -> Option<String> {
    lines.iter().find_map(|line| {
        pattern
            .captures(line)
            .and_then(|c| c.name("value"))
            .map(|v| v.as_str().trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

fn find_phrase(lines: &[String], phrases: &[&str]) -> Option<String> {
    lines
        .iter()
        .find(|line| {
            let lower = line.to_lowercase();
            phrases.iter().any(|p| lower.contains(p))
        })
        .cloned()
}
