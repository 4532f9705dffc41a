//! Rule-based field heuristics for receipt text.

pub mod amounts;
pub mod category;
pub mod dates;
pub mod merchant;
pub mod patterns;

pub use amounts::{find_likely_amount, normalize_amount, AmountExtractor};
pub use category::{classify, Category, CategoryRule, CATEGORY_RULES};
pub use dates::{find_receipt_date, DateExtractor};
pub use merchant::guess_merchant;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A value found in text, with where it was found.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}
