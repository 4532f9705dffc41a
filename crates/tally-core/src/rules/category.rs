//! Keyword classification of receipt text into spending categories.

use serde::{Deserialize, Serialize};

/// Spending category assigned to a derived expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Grocery")]
    Grocery,
    #[serde(rename = "Food & Dining")]
    FoodAndDining,
    #[serde(rename = "Utilities")]
    Utilities,
    #[serde(rename = "Transportation")]
    Transportation,
    #[serde(rename = "Entertainment")]
    Entertainment,
    #[serde(rename = "Health & Medical")]
    HealthAndMedical,
    #[serde(rename = "Others")]
    Others,
}

impl Category {
    /// Ledger label for this category.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Grocery => "Grocery",
            Category::FoodAndDining => "Food & Dining",
            Category::Utilities => "Utilities",
            Category::Transportation => "Transportation",
            Category::Entertainment => "Entertainment",
            Category::HealthAndMedical => "Health & Medical",
            Category::Others => "Others",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Keywords (lowercase) that select a category.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub keywords: &'static [&'static str],
    pub category: Category,
}

impl CategoryRule {
    /// `text` must already be lowercase.
    fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| text.contains(k))
    }
}

/// Evaluated in order; the first matching rule wins.
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        keywords: &["walmart", "big bazaar", "supermarket", "grocery"],
        category: Category::Grocery,
    },
    CategoryRule {
        keywords: &["restaurant", "food", "cafe", "burger", "pizza"],
        category: Category::FoodAndDining,
    },
    CategoryRule {
        keywords: &["electric", "water bill", "internet", "utility"],
        category: Category::Utilities,
    },
    CategoryRule {
        keywords: &["petrol", "fuel", "gas station"],
        category: Category::Transportation,
    },
    CategoryRule {
        keywords: &["movie", "ticket", "entertainment"],
        category: Category::Entertainment,
    },
    CategoryRule {
        keywords: &["medicine", "pharmacy", "hospital"],
        category: Category::HealthAndMedical,
    },
];

/// Classify receipt text; falls back to [`Category::Others`].
pub fn classify(text: &str) -> Category {
    let text = text.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|rule| rule.matches(&text))
        .map(|rule| rule.category)
        .unwrap_or(Category::Others)
}
