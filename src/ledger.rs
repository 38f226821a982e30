//! In-memory owner of the receipt and category lists.
//!
//! Mutations swap in new lists; [`Snapshot`] clones are cheap and never
//! observe later changes.

use crate::error::{TrackerError, TrackerResult, ValidationError};
use crate::models::category::{Category, CategoryDraft, default_categories};
use crate::models::receipt::Receipt;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Read-only view of the ledger at one point in time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub receipts: Arc<[Receipt]>,
    pub categories: Arc<[Category]>,
}

#[derive(Debug, Clone)]
pub struct Ledger {
    receipts: Arc<[Receipt]>,
    categories: Arc<[Category]>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(default_categories())
    }
}

impl Ledger {
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            receipts: Arc::from(Vec::<Receipt>::new()),
            categories: Arc::from(categories),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            receipts: Arc::clone(&self.receipts),
            categories: Arc::clone(&self.categories),
        }
    }

    /// Receipts, most recent first.
    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    pub fn categories(&self) -> Arc<[Category]> {
        Arc::clone(&self.categories)
    }

    /// Prepends `receipt` so the newest one comes first.
    pub fn add_receipt(&mut self, receipt: Receipt) {
        info!(
            id = %receipt.id(),
            store = receipt.store(),
            amount = %receipt.amount(),
            category = receipt.category(),
            "Receipt added"
        );
        let mut receipts = Vec::with_capacity(self.receipts.len() + 1);
        receipts.push(receipt);
        receipts.extend(self.receipts.iter().cloned());
        self.receipts = Arc::from(receipts);
    }

    pub fn delete_receipt(&mut self, id: Uuid) -> TrackerResult<Receipt> {
        let pos = self
            .receipts
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| TrackerError::ReceiptNotFound(id.to_string()))?;

        let mut receipts = self.receipts.to_vec();
        let removed = receipts.remove(pos);
        self.receipts = Arc::from(receipts);
        info!(id = %id, "Receipt deleted");
        Ok(removed)
    }

    pub fn add_category(&mut self, draft: CategoryDraft) -> TrackerResult<Category> {
        let category = draft.build(None)?;
        self.ensure_unique_name(category.name(), None)?;

        let mut categories = self.categories.to_vec();
        categories.push(category.clone());
        self.categories = Arc::from(categories);
        info!(id = %category.id(), name = category.name(), "Category added");
        Ok(category)
    }

    /// Replaces the category with `id`, keeping its position. A draft without
    /// a color keeps the current one. Receipts tagged with the old name keep
    /// that name.
    pub fn update_category(&mut self, id: Uuid, mut draft: CategoryDraft) -> TrackerResult<Category> {
        let pos = self.category_position(id)?;
        if draft.color.is_none() {
            draft.color = Some(self.categories[pos].color().to_string());
        }
        let category = draft.build(Some(id))?;
        self.ensure_unique_name(category.name(), Some(id))?;

        let mut categories = self.categories.to_vec();
        let previous = std::mem::replace(&mut categories[pos], category.clone());
        self.categories = Arc::from(categories);
        info!(
            id = %id,
            old_name = previous.name(),
            new_name = category.name(),
            "Category updated"
        );
        Ok(category)
    }

    /// Removes the category. Receipts that used it keep a dangling label.
    pub fn delete_category(&mut self, id: Uuid) -> TrackerResult<Category> {
        let pos = self.category_position(id)?;
        let mut categories = self.categories.to_vec();
        let removed = categories.remove(pos);
        self.categories = Arc::from(categories);

        let orphaned = self
            .receipts
            .iter()
            .filter(|r| r.category() == removed.name())
            .count();
        info!(id = %id, name = removed.name(), orphaned, "Category deleted");
        Ok(removed)
    }

    pub fn replace_categories(&mut self, categories: Vec<Category>) -> TrackerResult<()> {
        for (idx, category) in categories.iter().enumerate() {
            if categories[..idx].iter().any(|c| c.name() == category.name()) {
                return Err(ValidationError::Duplicate {
                    field: "name".to_string(),
                    value: category.name().to_string(),
                }
                .into());
            }
        }
        debug!(count = categories.len(), "Categories replaced");
        self.categories = Arc::from(categories);
        Ok(())
    }

    pub fn find_category(&self, id: Uuid) -> Option<&Category> {
        self.categories.iter().find(|c| c.id() == id)
    }

    fn category_position(&self, id: Uuid) -> TrackerResult<usize> {
        self.categories
            .iter()
            .position(|c| c.id() == id)
            .ok_or_else(|| TrackerError::CategoryNotFound(id.to_string()))
    }

    fn ensure_unique_name(&self, name: &str, except: Option<Uuid>) -> Result<(), ValidationError> {
        let clash = self
            .categories
            .iter()
            .any(|c| c.name() == name && Some(c.id()) != except);
        if clash {
            return Err(ValidationError::Duplicate {
                field: "name".to_string(),
                value: name.to_string(),
            });
        }
        Ok(())
    }
}
