use crate::models::category::{Category, UNKNOWN_CATEGORY_COLOR};
use crate::models::receipt::Receipt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Newest first.
    #[default]
    Date,
    /// Largest first.
    Amount,
}

impl SortKey {
    pub fn toggle(self) -> Self {
        match self {
            SortKey::Date => SortKey::Amount,
            SortKey::Amount => SortKey::Date,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Date => "date ↓",
            SortKey::Amount => "amount ↓",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Matched against the store name and every item, ignoring case.
    pub search: String,
    /// Exact category label; `None` shows every category.
    pub category: Option<String>,
    pub sort: SortKey,
}

pub fn filter_history<'a>(receipts: &'a [Receipt], query: &HistoryQuery) -> Vec<&'a Receipt> {
    let needle = query.search.to_lowercase();

    let mut matches: Vec<&Receipt> = receipts
        .iter()
        .filter(|receipt| {
            let matches_search = receipt.store().to_lowercase().contains(&needle)
                || receipt
                    .items()
                    .iter()
                    .any(|item| item.to_lowercase().contains(&needle));
            let matches_category = query
                .category
                .as_deref()
                .is_none_or(|category| receipt.category() == category);
            matches_search && matches_category
        })
        .collect();

    match query.sort {
        SortKey::Date => matches.sort_by(|a, b| b.date().cmp(&a.date())),
        SortKey::Amount => matches.sort_by(|a, b| b.amount().cmp(&a.amount())),
    }
    matches
}

/// Display color for a category label, neutral grey when it no longer exists.
pub fn category_color<'a>(categories: &'a [Category], name: &str) -> &'a str {
    categories
        .iter()
        .find(|c| c.name() == name)
        .map(Category::color)
        .unwrap_or(UNKNOWN_CATEGORY_COLOR)
}
