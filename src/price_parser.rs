//! # Price Parser Module
//!
//! Extracts a monetary amount from localized free text, for all three
//! capture channels:
//!
//! - Scanner labels: "Leite Mimosa 1,29" (decimal comma, defensively also
//!   "1.29"), with or without the euro symbol
//! - Speech transcripts: spelled-out Portuguese currency phrases such as
//!   "dois euros e vinte e nove cêntimos"
//! - Manual entry: plain keyed-in numbers
//!
//! ## Disambiguation
//!
//! When several numeric tokens appear in one text, the token with an
//! explicit decimal group wins over bare integers, and the longest decimal
//! token wins among decimals. This is a heuristic, not a guarantee: inputs
//! with more than one plausible candidate are flagged ambiguous so the
//! validator can surface a warning instead of a silent wrong answer.
//!
//! All functions are total — no input raises, failure is `None`.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, trace};

use crate::amount::Amount;
use crate::business_rules::BusinessRules;
use crate::text_normalizer::strip_noise;

/// Portuguese number words up to the hundreds, both European and Brazilian
/// spellings. Values compose additively ("vinte e nove" = 29).
const NUMBER_WORDS: &[(&str, i64)] = &[
    ("zero", 0),
    ("um", 1),
    ("uma", 1),
    ("dois", 2),
    ("duas", 2),
    ("três", 3),
    ("tres", 3),
    ("quatro", 4),
    ("cinco", 5),
    ("seis", 6),
    ("sete", 7),
    ("oito", 8),
    ("nove", 9),
    ("dez", 10),
    ("onze", 11),
    ("doze", 12),
    ("treze", 13),
    ("catorze", 14),
    ("quatorze", 14),
    ("quinze", 15),
    ("dezasseis", 16),
    ("dezesseis", 16),
    ("dezassete", 17),
    ("dezessete", 17),
    ("dezoito", 18),
    ("dezanove", 19),
    ("dezenove", 19),
    ("vinte", 20),
    ("trinta", 30),
    ("quarenta", 40),
    ("cinquenta", 50),
    ("sessenta", 60),
    ("setenta", 70),
    ("oitenta", 80),
    ("noventa", 90),
    ("cem", 100),
    ("cento", 100),
    ("duzentos", 200),
    ("trezentos", 300),
    ("quatrocentos", 400),
    ("quinhentos", 500),
    ("seiscentos", 600),
    ("setecentos", 700),
    ("oitocentos", 800),
    ("novecentos", 900),
];

/// Filler verbs stripped from speech transcripts before the remainder
/// becomes the name candidate.
const FILLER_VERBS: &[&str] = &[
    "comprei", "compramos", "comprámos", "custou", "custa", "custam", "paguei", "levei", "gastei",
];

/// Connectives dropped when left dangling at either end of the name.
const EDGE_CONNECTIVES: &[&str] = &["por", "a", "e", "foi", "o"];

/// Build the alternation of number words, longest first so that
/// "dezassete" is never partially matched as "dez".
fn number_word_alternation() -> String {
    let mut words: Vec<&str> = NUMBER_WORDS.iter().map(|(w, _)| *w).collect();
    words.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    words.join("|")
}

fn currency_phrase_pattern() -> String {
    let words = number_word_alternation();
    // A number phrase: digits (optionally with a decimal group), or number
    // words joined by "e"
    let phrase = format!(r"(?:\d+(?:[.,]\d{{1,2}})?|(?:{w})(?:\s+e\s+(?:{w}))*)", w = words);
    format!(
        r"(?i)\b(?:(?P<eur>{p})\s+euros?(?:\s+e\s+(?P<cent>{p})\s+(?:c[êe]ntimos?|centavos?))?|(?P<conly>{p})\s+(?:c[êe]ntimos?|centavos?))\b",
        p = phrase
    )
}

lazy_static! {
    // Spelled-out or digit amounts anchored by a currency word
    static ref CURRENCY_PHRASE: Regex =
        Regex::new(&currency_phrase_pattern()).expect("currency phrase pattern should be valid");
    // Digit amounts anchored by the euro symbol, either side
    static ref SYMBOL_AMOUNT: Regex =
        Regex::new(r"(?:€\s*(?P<after>\d+(?:[.,]\d{1,2})?)|(?P<before>\d+(?:[.,]\d{1,2})?)\s*€)")
            .expect("symbol amount pattern should be valid");
    // Bare numeric tokens, decimal or integer
    static ref NUMERIC_TOKEN: Regex =
        Regex::new(r"\b(?P<int>\d+)(?:[.,](?P<frac>\d{1,2}))?\b")
            .expect("numeric token pattern should be valid");
    static ref WORD_VALUES: HashMap<&'static str, i64> = NUMBER_WORDS.iter().copied().collect();
}

/// A price located inside a larger text.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PriceMatch {
    /// The parsed amount
    pub amount: Amount,
    /// Byte offset where the price token starts
    pub start: usize,
    /// Byte offset one past the price token
    pub end: usize,
    /// More than one plausible candidate was present
    pub ambiguous: bool,
}

/// The outcome of splitting a natural-language utterance into a name
/// candidate and a price.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NamePriceCandidate {
    /// Cleaned remainder of the text once price and fillers are removed
    pub name: String,
    /// The located price, if any
    pub price: Option<Amount>,
    /// The price token was ambiguous (see [`PriceMatch::ambiguous`])
    pub price_ambiguous: bool,
}

/// Parse an additive Portuguese number phrase ("vinte e nove" → 29).
///
/// Digits are accepted as-is; unknown words fail the whole phrase.
fn parse_number_phrase(phrase: &str) -> Option<i64> {
    let trimmed = phrase.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return trimmed.parse().ok();
    }

    let mut total = 0i64;
    let mut seen_word = false;
    for token in trimmed.split_whitespace() {
        let lower = token.to_lowercase();
        if lower == "e" {
            continue;
        }
        let value = WORD_VALUES.get(lower.as_str())?;
        total += value;
        seen_word = true;
    }
    if seen_word {
        Some(total)
    } else {
        None
    }
}

/// Locate the most plausible price token in `text`.
///
/// Resolution order:
/// 1. amounts anchored by a currency word ("dois euros e vinte e nove
///    cêntimos", "2 euros", "50 cêntimos"),
/// 2. amounts anchored by the euro symbol ("1,29 €", "€2"),
/// 3. bare numeric tokens, preferring the longest explicit-decimal token
///    over bare integers.
///
/// Returns `None` when no numeric content is present. Never returns a
/// negative amount.
pub fn find_price(text: &str) -> Option<PriceMatch> {
    let start_time = std::time::Instant::now();
    let result = find_price_inner(text);

    crate::observability::record_price_parse_metrics(
        start_time.elapsed(),
        text.len(),
        result.is_some(),
        result.as_ref().map(|m| m.ambiguous).unwrap_or(false),
    );
    result
}

fn parse_currency_captures(caps: &regex::Captures, ambiguous: bool) -> Option<PriceMatch> {
    let full = caps.get(0).expect("regex match always has group 0");
    let cents = if let Some(eur) = caps.name("eur") {
        let eur_str = eur.as_str();
        // "1,29 euros" carries its cents in the digits already
        let euro_cents = if eur_str.contains([',', '.']) {
            Amount::parse_decimal(eur_str)?.cents()
        } else {
            parse_number_phrase(eur_str)?.checked_mul(100)?
        };
        let cent_part = match caps.name("cent") {
            Some(c) => parse_number_phrase(c.as_str())?,
            None => 0,
        };
        euro_cents.checked_add(cent_part)?
    } else {
        parse_number_phrase(caps.name("conly")?.as_str())?
    };

    trace!("Currency phrase '{}' parsed as {} cents", full.as_str(), cents);
    Some(PriceMatch {
        amount: Amount::from_cents(cents),
        start: full.start(),
        end: full.end(),
        ambiguous,
    })
}

fn find_price_inner(text: &str) -> Option<PriceMatch> {
    // 1. Currency-word phrases are the most explicit signal. A phrase that
    // fails to parse (overflow, stray separators) falls through to the
    // weaker scans instead of failing the whole extraction.
    let phrase_matches: Vec<regex::Captures> = CURRENCY_PHRASE.captures_iter(text).collect();
    if let Some(caps) = phrase_matches.first() {
        if let Some(found) = parse_currency_captures(caps, phrase_matches.len() > 1) {
            return Some(found);
        }
    }

    // 2. Euro-symbol-anchored digits
    let symbol_matches: Vec<regex::Captures> = SYMBOL_AMOUNT.captures_iter(text).collect();
    if let Some(caps) = symbol_matches.first() {
        let full = caps.get(0).expect("regex match always has group 0");
        let digits = caps
            .name("after")
            .or_else(|| caps.name("before"))
            .expect("symbol pattern always captures one side");
        let amount = Amount::parse_decimal(digits.as_str())?;
        return Some(PriceMatch {
            amount,
            start: full.start(),
            end: full.end(),
            ambiguous: symbol_matches.len() > 1,
        });
    }

    // 3. Bare numeric tokens: longest decimal-grouped token wins over integers
    let mut decimals: Vec<(usize, usize, &str)> = Vec::new();
    let mut integers: Vec<(usize, usize, &str)> = Vec::new();
    for caps in NUMERIC_TOKEN.captures_iter(text) {
        let full = caps.get(0).expect("regex match always has group 0");
        let entry = (full.start(), full.end(), full.as_str());
        if caps.name("frac").is_some() {
            decimals.push(entry);
        } else {
            integers.push(entry);
        }
    }

    if let Some(&(start, end, token)) = decimals
        .iter()
        .max_by(|a, b| (a.1 - a.0).cmp(&(b.1 - b.0)).then(b.0.cmp(&a.0)))
    {
        let amount = Amount::parse_decimal(token)?;
        let ambiguous = decimals.len() > 1;
        if ambiguous {
            debug!("Multiple decimal tokens in '{}', chose '{}'", text, token);
        }
        return Some(PriceMatch { amount, start, end, ambiguous });
    }

    if let Some(&(start, end, token)) = integers.first() {
        let amount = Amount::parse_decimal(token)?;
        return Some(PriceMatch { amount, start, end, ambiguous: integers.len() > 1 });
    }

    None
}

/// Extract just the amount, if any, from `text`.
///
/// # Examples
///
/// ```rust
/// use carrinho_core::amount::Amount;
/// use carrinho_core::price_parser::extract_price;
///
/// assert_eq!(extract_price("1,29"), Some(Amount::from_cents(129)));
/// assert_eq!(extract_price("abc"), None);
/// ```
pub fn extract_price(text: &str) -> Option<Amount> {
    find_price(text).map(|m| m.amount)
}

/// Split a natural-language utterance into a name candidate and a price.
///
/// The price token is located with [`find_price`]; the remainder minus
/// filler verbs ("comprei", "paguei", ...) and dangling connectives is the
/// name candidate. When no price token is found, the whole cleaned text
/// becomes the name and `price` is `None` — the validator then reports the
/// missing price, so nothing the user said is lost.
///
/// # Examples
///
/// ```rust
/// use carrinho_core::amount::Amount;
/// use carrinho_core::price_parser::extract_name_and_price;
///
/// let parsed =
///     extract_name_and_price("Comprei leite mimosa por dois euros e vinte e nove cêntimos");
/// assert_eq!(parsed.name, "leite mimosa");
/// assert_eq!(parsed.price, Some(Amount::from_cents(229)));
/// ```
pub fn extract_name_and_price(text: &str) -> NamePriceCandidate {
    let cleaned = strip_noise(text);
    let price_match = find_price(&cleaned);

    let remainder = match &price_match {
        Some(m) => format!("{} {}", &cleaned[..m.start], &cleaned[m.end..]),
        None => cleaned.clone(),
    };

    let mut tokens: Vec<&str> = remainder
        .split_whitespace()
        .filter(|token| {
            let lower = token.to_lowercase();
            !FILLER_VERBS.contains(&lower.as_str())
        })
        .collect();

    while let Some(first) = tokens.first() {
        if EDGE_CONNECTIVES.contains(&first.to_lowercase().as_str()) {
            tokens.remove(0);
        } else {
            break;
        }
    }
    while let Some(last) = tokens.last() {
        if EDGE_CONNECTIVES.contains(&last.to_lowercase().as_str()) {
            tokens.pop();
        } else {
            break;
        }
    }

    let name = tokens.join(" ");
    debug!(
        "Parsed utterance '{}' -> name '{}', price {:?}",
        text,
        name,
        price_match.as_ref().map(|m| m.amount)
    );

    NamePriceCandidate {
        name,
        price: price_match.as_ref().map(|m| m.amount),
        price_ambiguous: price_match.map(|m| m.ambiguous).unwrap_or(false),
    }
}

/// Round `amount` to the rules' increment. Produces suggestion material
/// only — callers must never substitute it for the original value without
/// an explicit user action.
pub fn rounded_to_increment(amount: Amount, rules: &BusinessRules) -> Amount {
    amount.rounded_to_increment(rules.rounding_increment)
}

/// Live re-formatting for the manual-entry field: canonical decimal-comma
/// rendering of a keyed-in price ("1.3" → "1,30").
///
/// This is deliberately a separate call site from blocking validation;
/// returns `None` when the input is not yet a parseable price so the
/// caller leaves the field untouched.
pub fn format_manual_input(raw: &str) -> Option<String> {
    Amount::parse_decimal(raw).map(|amount| amount.to_decimal_string())
}
