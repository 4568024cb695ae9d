//! Dosage normalizer.
//!
//! Handles:
//! - Unit conversion to grams (钱→3 g, 两→30 g, 分→0.3 g, mg→0.001 g)
//! - Chinese numerals (三, 十二, 二钱半)
//! - Dosage ranges (6-10 → midpoint at input precision)
//! - Full-width OCR output (：９ｇ → :9g)

use std::collections::{HashMap, HashSet};

/// Normalizer for extracted dosages.
#[derive(Debug, Clone)]
pub struct DosageNormalizer {
    /// Unit → grams per unit
    mass_units: HashMap<String, f64>,
    /// Units that are never a herb dosage (volumes, durations)
    non_mass_units: HashSet<String>,
}

impl Default for DosageNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl DosageNormalizer {
    /// Create a new normalizer with default unit tables.
    pub fn new() -> Self {
        Self {
            mass_units: Self::default_mass_units(),
            non_mass_units: Self::default_non_mass_units(),
        }
    }

    /// Convert a quantity to grams.
    ///
    /// A missing unit means grams. Returns `None` for non-mass or unknown units.
    pub fn to_grams(&self, quantity: f64, unit: Option<&str>) -> Option<f64> {
        let Some(unit) = unit else {
            return Some(quantity);
        };
        if self.is_non_mass_unit(unit) {
            return None;
        }
        self.mass_units
            .get(&unit.trim().to_lowercase())
            .map(|factor| quantity * factor)
    }

    pub fn is_non_mass_unit(&self, unit: &str) -> bool {
        self.non_mass_units.contains(&unit.trim().to_lowercase())
    }

    /// Add a custom mass unit.
    pub fn add_unit(&mut self, unit: &str, grams_per_unit: f64) {
        self.mass_units.insert(unit.to_lowercase(), grams_per_unit);
    }

    /// Default mass unit factors.
    fn default_mass_units() -> HashMap<String, f64> {
        let mut map = HashMap::new();

        // Metric
        map.insert("g".into(), 1.0);
        map.insert("gm".into(), 1.0);
        map.insert("gram".into(), 1.0);
        map.insert("grams".into(), 1.0);
        map.insert("克".into(), 1.0);
        map.insert("mg".into(), 0.001);

        // Traditional
        map.insert("钱".into(), 3.0);
        map.insert("qian".into(), 3.0);
        map.insert("两".into(), 30.0);
        map.insert("liang".into(), 30.0);
        map.insert("分".into(), 0.3);
        map.insert("fen".into(), 0.3);

        map
    }

    fn default_non_mass_units() -> HashSet<String> {
        ["ml", "毫升", "分钟", "min", "mins", "minute", "minutes"]
            .into_iter()
            .map(String::from)
            .collect()
    }
}

/// Fold full-width ASCII variants and the ideographic space to half-width.
pub fn fold_width(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{3000}' => ' ',
            '\u{ff01}'..='\u{ff5e}' => char::from_u32(c as u32 - 0xfee0).unwrap_or(c),
            '×' => '*',
            '–' | '—' => '-',
            other => other,
        })
        .collect()
}

/// Parse an Arabic quantity, reducing a range to its midpoint.
///
/// The midpoint is rounded to the finest decimal precision of the bounds,
/// so "6-10" gives 8 and "1.5-3" gives 2.3.
pub fn parse_quantity(text: &str) -> Option<f64> {
    let text = text.trim();
    let bounds: Vec<&str> = text
        .split(&['-', '~'][..])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    match bounds.as_slice() {
        [single] => single.parse().ok(),
        [low, high] => {
            let low_value: f64 = low.parse().ok()?;
            let high_value: f64 = high.parse().ok()?;
            let precision = decimal_places(low).max(decimal_places(high));
            Some(round_to((low_value + high_value) / 2.0, precision))
        }
        _ => None,
    }
}

fn decimal_places(number: &str) -> u32 {
    number
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.len() as u32)
}

fn round_to(value: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places as i32);
    (value * scale).round() / scale
}

/// Parse a Chinese numeral (三, 十二, 二十, 两, 半, 一百) into a number.
pub fn parse_chinese_numeral(text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }
    if text == "半" {
        return Some(0.5);
    }

    let mut total = 0.0;
    let mut current: Option<f64> = None;
    let mut half = false;

    for c in text.chars() {
        match c {
            '零' => {}
            '十' => {
                total += current.unwrap_or(1.0) * 10.0;
                current = None;
            }
            '百' => {
                total += current.unwrap_or(1.0) * 100.0;
                current = None;
            }
            '半' => half = true,
            other => current = Some(chinese_digit(other)?),
        }
    }

    let value = total + current.unwrap_or(0.0) + if half { 0.5 } else { 0.0 };
    (value > 0.0).then_some(value)
}

fn chinese_digit(c: char) -> Option<f64> {
    let digit = match c {
        '一' => 1.0,
        '二' | '两' => 2.0,
        '三' => 3.0,
        '四' => 4.0,
        '五' => 5.0,
        '六' => 6.0,
        '七' => 7.0,
        '八' => 8.0,
        '九' => 9.0,
        _ => return None,
    };
    Some(digit)
}
