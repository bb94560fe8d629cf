use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::error::{Result, VoiceprepError};

/// Han characters collected by the GBK encoding standard (simplified,
/// traditional, and some variants). External domain constant, not derived.
pub const GBK_HAN_COUNT: usize = 21886;

/// Fixed reference set of Chinese numeral symbols.
pub const CHINESE_NUMERALS: [char; 14] = [
    '零', '一', '二', '三', '四', '五', '六', '七', '八', '九', '十', '百', '千', '万',
];

/// Common Chinese and English punctuation, matched literally.
const PUNCTUATION: &str =
    "，。！？、；：\"'‘’“”《》【】（）〔〕…—~`!@#$%^&*()_+-=[]{};:\\|,.<>/?";

/// Whether a code point lies in the basic CJK block or one of the
/// supplementary CJK extension planes.
pub fn is_han(c: char) -> bool {
    matches!(c,
        '\u{4e00}'..='\u{9fff}'
        | '\u{3400}'..='\u{4dbf}'
        | '\u{20000}'..='\u{2a6df}'
        | '\u{2a700}'..='\u{2b73f}'
        | '\u{2b740}'..='\u{2b81f}'
        | '\u{2b820}'..='\u{2ceaf}')
}

/// Character-level statistics over aggregated transcript text.
#[derive(Debug, Clone, Default)]
pub struct TextStats {
    pub total_chars: usize,
    pub unique_chars: usize,
    /// Character frequencies, descending by count; ties keep first-seen order.
    pub char_freq: Vec<(char, usize)>,
    pub han_total: usize,
    pub han_unique: usize,
    /// Unique Han characters over the GBK reference count, in [0, 1].
    pub gbk_coverage: f64,
    /// Unique numeral symbols seen over the 14-symbol reference set, in [0, 1].
    pub numeral_coverage: f64,
    pub space_count: usize,
    pub digit_count: usize,
    pub letter_count: usize,
    pub punctuation_count: usize,
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Compute statistics over transcript text. Pure function of its input.
pub fn text_stats(text: &str) -> TextStats {
    let mut counts: HashMap<char, usize> = HashMap::new();
    let mut first_seen: Vec<char> = Vec::new();

    let mut stats = TextStats::default();
    let mut han_seen: HashSet<char> = HashSet::new();
    let mut numerals_seen = 0usize;

    for c in text.chars() {
        stats.total_chars += 1;

        let entry = counts.entry(c).or_insert_with(|| {
            first_seen.push(c);
            0
        });
        *entry += 1;

        if is_han(c) {
            stats.han_total += 1;
            if han_seen.insert(c) && CHINESE_NUMERALS.contains(&c) {
                numerals_seen += 1;
            }
        } else if c.is_alphabetic() {
            stats.letter_count += 1;
        }

        if c == ' ' {
            stats.space_count += 1;
        }
        if c.is_ascii_digit() {
            stats.digit_count += 1;
        }
        if PUNCTUATION.contains(c) {
            stats.punctuation_count += 1;
        }
    }

    stats.unique_chars = counts.len();
    stats.han_unique = han_seen.len();
    stats.gbk_coverage = round4(stats.han_unique as f64 / GBK_HAN_COUNT as f64);
    stats.numeral_coverage = round4(numerals_seen as f64 / CHINESE_NUMERALS.len() as f64);

    let mut freq: Vec<(char, usize)> = first_seen
        .into_iter()
        .map(|c| (c, counts[&c]))
        .collect();
    // Stable sort keeps first-seen order among equal counts.
    freq.sort_by(|a, b| b.1.cmp(&a.1));
    stats.char_freq = freq;

    stats
}

/// Reconstruct the aggregated transcript text from a list artifact: one
/// `path|speaker|lang|text` line per entry, text fields concatenated in
/// file order.
pub fn merge_text_from_list(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(VoiceprepError::FileNotFound(path.display().to_string()));
    }

    let contents = fs::read_to_string(path)?;
    let mut merged = String::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(text) = line.splitn(4, '|').nth(3) {
            merged.push_str(text);
        }
    }
    Ok(merged)
}
