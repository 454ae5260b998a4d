//! # Text Normalizer Module
//!
//! Cleans raw text from any capture channel into a candidate product name.
//! Scanner output arrives with OCR artifacts (punctuation runs, stray noise
//! characters, digit/letter confusions), speech transcripts arrive lowercase
//! and run-on, and manual input arrives with accidental whitespace.
//!
//! Every function here is total: no input raises, and fully invalid input
//! yields an empty string. Emptiness and length enforcement belong to the
//! validator so that no data is silently lost at this stage.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

lazy_static! {
    // Two or more consecutive punctuation characters are scanning debris
    static ref PUNCT_RUN: Regex = Regex::new(r"[\p{P}\p{S}]{2,}").expect("punct run pattern");
    // A lone punctuation/symbol character surrounded by whitespace
    static ref ISOLATED_NOISE: Regex =
        Regex::new(r"(^|\s)[\p{P}\p{S}](\s|$)").expect("isolated noise pattern");
    // Candidate numeric tokens where OCR may have misread 0/1 as letters;
    // the replacement only fires when the token actually contains a digit
    static ref CONFUSED_DIGITS: Regex =
        Regex::new(r"\b[0-9OoIl]+(?:[.,][0-9OoIl]+)*\b").expect("confused digits pattern");
}

/// Portuguese connective particles kept lowercase inside product names.
const LOWERCASE_PARTICLES: &[&str] = &["de", "da", "do", "das", "dos", "e", "em", "com", "sem"];

/// Remove control characters, collapse repeated whitespace and trim the ends.
///
/// # Examples
///
/// ```rust
/// use carrinho_core::text_normalizer::strip_noise;
///
/// assert_eq!(strip_noise("  leite\t\tmimosa \u{0000}"), "leite mimosa");
/// ```
pub fn strip_noise(raw: &str) -> String {
    let without_control: String = raw.chars().filter(|c| !c.is_control()).collect();
    without_control
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Remove common scanning artifacts on top of [`strip_noise`].
///
/// Strips punctuation runs and isolated noise characters, and corrects
/// `O`/`0` and `l`/`1` confusions inside numeric tokens. Best-effort: a
/// garbled label is not guaranteed to come out readable.
pub fn clean_ocr_text(raw: &str) -> String {
    let stripped = strip_noise(raw);

    let no_runs = PUNCT_RUN.replace_all(&stripped, " ");
    // Replace twice: overlapping whitespace keeps a second pass cheap and simple
    let no_noise = ISOLATED_NOISE.replace_all(&no_runs, " ");
    let no_noise = ISOLATED_NOISE.replace_all(&no_noise, " ");

    let corrected = CONFUSED_DIGITS.replace_all(&no_noise, |caps: &regex::Captures| {
        let token = &caps[0];
        if !token.bytes().any(|b| b.is_ascii_digit()) {
            // Plain word that happens to be made of confusable letters
            return token.to_string();
        }
        token
            .chars()
            .map(|c| match c {
                'O' | 'o' => '0',
                'I' | 'l' => '1',
                other => other,
            })
            .collect::<String>()
    });

    let cleaned = strip_noise(&corrected);
    trace!("Cleaned OCR text: '{}' -> '{}'", raw, cleaned);
    cleaned
}

/// Produce the canonical name candidate: cleaned text with Portuguese
/// title casing (connective particles stay lowercase).
///
/// Never truncates and never rejects — length and emptiness are the
/// validator's concern. Fully invalid input yields an empty string.
///
/// # Examples
///
/// ```rust
/// use carrinho_core::text_normalizer::normalized_name;
///
/// assert_eq!(normalized_name("LEITE MIMOSA"), "Leite Mimosa");
/// assert_eq!(normalized_name("pão de forma"), "Pão de Forma");
/// assert_eq!(normalized_name("***"), "");
/// ```
pub fn normalized_name(raw: &str) -> String {
    let cleaned = clean_ocr_text(raw);
    if cleaned.is_empty() {
        return cleaned;
    }

    cleaned
        .split_whitespace()
        .enumerate()
        .map(|(index, word)| {
            let lower = word.to_lowercase();
            if index > 0 && LOWERCASE_PARTICLES.contains(&lower.as_str()) {
                lower
            } else {
                capitalize(&lower)
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
