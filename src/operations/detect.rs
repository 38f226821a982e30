use crate::models::category::{Category, FALLBACK_CATEGORY};

/// Returns the name of the first category (in list order) with a keyword
/// contained in the store name or any item, ignoring case.
pub fn detect_category(store_name: &str, items: &[String], categories: &[Category]) -> String {
    let mut search_text = store_name.to_string();
    for item in items {
        search_text.push(' ');
        search_text.push_str(item);
    }
    let search_text = search_text.to_lowercase();

    categories
        .iter()
        .find(|category| {
            category
                .keywords()
                .iter()
                .any(|keyword| search_text.contains(&keyword.to_lowercase()))
        })
        .map(|category| category.name().to_string())
        .unwrap_or_else(|| FALLBACK_CATEGORY.to_string())
}
