//! Amount extraction for receipts.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::{AMOUNT_SEPARATOR, AMOUNT_TOKEN};
use super::{ExtractionMatch, FieldExtractor};

/// Amount token extractor.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        AMOUNT_TOKEN
            .find_iter(text)
            .filter_map(|m| {
                let amount = normalize_amount(m.as_str())?;
                Some(ExtractionMatch::new(amount, m.as_str()).with_position(m.start(), m.end()))
            })
            .collect()
    }
}

/// Find the likely printed total: the largest amount-shaped token.
///
/// Receipts print their total as the largest figure; item prices, tax lines
/// and quantities are all smaller.
pub fn find_likely_amount(text: &str) -> Option<Decimal> {
    AmountExtractor::new()
        .extract_all(text)
        .into_iter()
        .map(|m| m.value)
        .max()
}

/// Normalize a matched token such as `12,345.67` or `1 234,5`.
///
/// Every separator is dropped except a final one followed by 1-2 digits,
/// which becomes the decimal point.
pub fn normalize_amount(token: &str) -> Option<Decimal> {
    let groups: Vec<&str> = AMOUNT_SEPARATOR.split(token.trim()).collect();

    let normalized = match groups.split_last() {
        Some((last, rest)) if !rest.is_empty() && (1..=2).contains(&last.len()) => {
            format!("{}.{}", rest.concat(), last)
        }
        _ => groups.concat(),
    };

    if normalized.is_empty() {
        return None;
    }

    Decimal::from_str(&normalized).ok()
}
