//! Extraction pattern families.
//!
//! Each strategy recognizes one textual layout of a herb line item. The
//! extractor tries them in order and keeps the first family that yields any
//! match on a line. Patterns run on width-folded text.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::normalizer::{parse_chinese_numeral, parse_quantity};

/// Herb name: a run of ideographs, or up to five Latin words.
const NAME: &str = r"\p{Han}+|[A-Za-z][A-Za-z'\-]*(?:\s+[A-Za-z][A-Za-z'\-]*){0,4}";

/// Quantity, optionally a range.
const QUANTITY: &str = r"\d+(?:\.\d+)?(?:\s*[-~]\s*\d+(?:\.\d+)?)?";

/// Mass and non-mass units, longest alternative first.
const UNIT: &str =
    r"(?i:grams|gram|gm|mg|g|克|钱|qian|两|liang|分钟|分|fen|毫升|ml|minutes|minute|mins|min)";

static ANNOTATED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?P<name>{NAME})\s*\((?P<note>[^()]{{1,24}})\)\s*(?P<qty>{QUANTITY})\s*(?P<unit>{UNIT})(?:\s*\*\s*\d+)?(?:\s*[¥$]?\s*\d+(?:\.\d+)?\s*元?)?"
    ))
    .expect("valid regex")
});

static NAME_DOSE_UNIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?P<name>{NAME})\s*(?P<qty>{QUANTITY})\s*(?P<unit>{UNIT})"
    ))
    .expect("valid regex")
});

static COLON_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?P<name>{NAME})\s*:\s*(?P<qty>{QUANTITY})\s*(?P<unit>{UNIT})?"
    ))
    .expect("valid regex")
});

static CHINESE_NUMERAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?P<name>\p{Han}{2,6}?)(?P<num>[零一二两三四五六七八九十百半]+)",
        r"(?P<unit>分钟|钱|两|克|分)(?P<half>半)?"
    ))
    .expect("valid regex")
});

static NUMBERED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*\d+\s*[.、)]\s*(?P<name>{NAME})\s+(?P<qty>{QUANTITY})\s*(?P<unit>g|克)?"
    ))
    .expect("valid regex")
});

static SEPARATED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?P<name>{NAME})\s*(?P<qty>{QUANTITY})\s*(?P<unit>g|克)?\s*(?:[,;、]|$)"
    ))
    .expect("valid regex")
});

/// One raw line item as matched in the text, before lexicon lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMatch {
    pub name: String,
    /// Quantity in `unit` (range already reduced to its midpoint)
    pub quantity: f64,
    /// Unit as written; `None` means grams
    pub unit: Option<String>,
    /// Parenthesized note (先煎, 炒, decoct first)
    pub annotation: Option<String>,
}

/// A textual layout the extractor can recognize.
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Match a single width-folded line. `None` or an empty list means no match.
    fn try_extract(&self, line: &str) -> Option<Vec<RawMatch>>;
}

/// The built-in strategies in priority order.
pub fn default_strategies() -> Vec<Box<dyn ExtractionStrategy>> {
    vec![
        Box::new(AnnotatedStrategy),
        Box::new(NameDoseUnitStrategy),
        Box::new(ColonStrategy),
        Box::new(ChineseNumeralStrategy),
        Box::new(NumberedListStrategy),
        Box::new(SeparatedStrategy),
    ]
}

/// `name (annotation) dosage unit [* count] [price]`, annotation required.
pub struct AnnotatedStrategy;

impl ExtractionStrategy for AnnotatedStrategy {
    fn name(&self) -> &'static str {
        "annotated"
    }

    fn try_extract(&self, line: &str) -> Option<Vec<RawMatch>> {
        collect(&ANNOTATED_PATTERN, line, arabic_match)
    }
}

/// `name dosage unit`.
pub struct NameDoseUnitStrategy;

impl ExtractionStrategy for NameDoseUnitStrategy {
    fn name(&self) -> &'static str {
        "name_dose_unit"
    }

    fn try_extract(&self, line: &str) -> Option<Vec<RawMatch>> {
        collect(&NAME_DOSE_UNIT_PATTERN, line, arabic_match)
    }
}

/// `name: dosage [unit]`.
pub struct ColonStrategy;

impl ExtractionStrategy for ColonStrategy {
    fn name(&self) -> &'static str {
        "colon"
    }

    fn try_extract(&self, line: &str) -> Option<Vec<RawMatch>> {
        collect(&COLON_PATTERN, line, arabic_match)
    }
}

/// `name <chinese numeral> unit` (麻黄三钱, 当归二钱半).
pub struct ChineseNumeralStrategy;

impl ExtractionStrategy for ChineseNumeralStrategy {
    fn name(&self) -> &'static str {
        "chinese_numeral"
    }

    fn try_extract(&self, line: &str) -> Option<Vec<RawMatch>> {
        collect(&CHINESE_NUMERAL_PATTERN, line, |caps| {
            let mut quantity = parse_chinese_numeral(caps.name("num")?.as_str())?;
            if caps.name("half").is_some() {
                quantity += 0.5;
            }
            Some(RawMatch {
                name: caps.name("name")?.as_str().to_string(),
                quantity,
                unit: caps.name("unit").map(|u| u.as_str().to_string()),
                annotation: None,
            })
        })
    }
}

/// `1. name dosage [g]`.
pub struct NumberedListStrategy;

impl ExtractionStrategy for NumberedListStrategy {
    fn name(&self) -> &'static str {
        "numbered_list"
    }

    fn try_extract(&self, line: &str) -> Option<Vec<RawMatch>> {
        collect(&NUMBERED_PATTERN, line, arabic_match)
    }
}

/// `name dosage [g],` terminated by a separator or the end of the line.
pub struct SeparatedStrategy;

impl ExtractionStrategy for SeparatedStrategy {
    fn name(&self) -> &'static str {
        "separated"
    }

    fn try_extract(&self, line: &str) -> Option<Vec<RawMatch>> {
        collect(&SEPARATED_PATTERN, line, arabic_match)
    }
}

fn collect<F>(pattern: &Regex, line: &str, build: F) -> Option<Vec<RawMatch>>
where
    F: Fn(&Captures<'_>) -> Option<RawMatch>,
{
    let matches: Vec<RawMatch> = pattern.captures_iter(line).filter_map(|c| build(&c)).collect();
    (!matches.is_empty()).then_some(matches)
}

fn arabic_match(caps: &Captures<'_>) -> Option<RawMatch> {
    Some(RawMatch {
        name: caps.name("name")?.as_str().trim().to_string(),
        quantity: parse_quantity(caps.name("qty")?.as_str())?,
        unit: caps.name("unit").map(|u| u.as_str().to_string()),
        annotation: caps
            .name("note")
            .map(|n| n.as_str().trim().to_string())
            .filter(|n| !n.is_empty()),
    })
}
