use crate::error::ValidationError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

/// One recognized purchase. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    id: Uuid,
    date: NaiveDate,
    store: String,
    amount: Decimal,
    category: String,
    items: Vec<String>,
}

impl Receipt {
    pub fn new(
        date: NaiveDate,
        store: impl Into<String>,
        amount: Decimal,
        category: impl Into<String>,
        items: Vec<String>,
    ) -> Result<Self, ValidationError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ValidationError::Negative {
                field: "amount".to_string(),
            });
        }

        Ok(Self {
            id: Uuid::new_v4(),
            date,
            store: store.into(),
            amount,
            category: category.into(),
            items,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn store(&self) -> &str {
        &self.store
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Category name this receipt was tagged with. May no longer exist.
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }
}
