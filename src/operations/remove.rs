use crate::error::{TrackerResult, ValidationError};
use crate::ledger::Ledger;
use crate::models::receipt::Receipt;
use uuid::Uuid;

/// Parses a user-typed id, rejecting blanks and malformed UUIDs.
pub fn parse_id(field: &str, input: &str) -> Result<Uuid, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Uuid::parse_str(input).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "expected a UUID".to_string(),
    })
}

pub fn remove_receipt(ledger: &mut Ledger, input: &str) -> TrackerResult<Receipt> {
    let id = parse_id("receipt ID", input)?;
    ledger.delete_receipt(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackerError;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn ledger_with_one() -> (Ledger, Uuid) {
        let mut ledger = Ledger::default();
        let receipt = Receipt::new(
            NaiveDate::from_ymd_opt(2025, 11, 10).expect("Invalid date"),
            "Magnit",
            Decimal::from(300),
            "Groceries",
            vec!["Milk".to_string()],
        )
        .unwrap();
        let id = receipt.id();
        ledger.add_receipt(receipt);
        (ledger, id)
    }

    #[test]
    fn test_remove_existing_receipt() {
        let (mut ledger, id) = ledger_with_one();
        let removed = remove_receipt(&mut ledger, &format!("  {}  ", id)).unwrap();
        assert_eq!(removed.id(), id);
        assert!(ledger.receipts().is_empty());
    }

    #[test]
    fn test_remove_with_empty_id() {
        let (mut ledger, _) = ledger_with_one();
        let result = remove_receipt(&mut ledger, "   ");
        assert!(matches!(
            result,
            Err(TrackerError::Validation(ValidationError::Required { .. }))
        ));
        assert_eq!(ledger.receipts().len(), 1);
    }

    #[test]
    fn test_remove_with_invalid_id_format() {
        let (mut ledger, _) = ledger_with_one();
        let result = remove_receipt(&mut ledger, "invalid-uuid");
        assert!(matches!(
            result,
            Err(TrackerError::Validation(ValidationError::InvalidFormat { .. }))
        ));
    }

    #[test]
    fn test_remove_nonexistent_receipt() {
        let (mut ledger, _) = ledger_with_one();
        let missing = Uuid::new_v4();
        let result = remove_receipt(&mut ledger, &missing.to_string());
        assert!(matches!(result, Err(TrackerError::ReceiptNotFound(ref id)) if *id == missing.to_string()));
        assert_eq!(ledger.receipts().len(), 1);
    }
}
