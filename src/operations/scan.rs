//! Simulated receipt recognition.
//!
//! Nothing is decoded: after a fixed delay a receipt is sampled from a small
//! catalog and categorized by keyword detection.

use super::detect::detect_category;
use crate::error::{ScanError, TrackerResult, ValidationError};
use crate::models::category::Category;
use crate::models::receipt::Receipt;
use chrono::{Local, NaiveDate};
use rand::Rng;
use rust_decimal::Decimal;
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const SAMPLE_STORES: [&str; 5] = [
    "Pyaterochka",
    "Magnit",
    "Perekrestok",
    "Pharmacy 36.6",
    "Yandex Taxi",
];

pub const SAMPLE_ITEMS: [&[&str]; 5] = [
    &["Milk 3.2%", "White bread", "Butter"],
    &["Paracetamol", "Vitamins"],
    &["City ride"],
    &["T-shirt", "Jeans"],
    &["Caffe latte", "Cheesecake"],
];

const MIN_AMOUNT: i64 = 200;
const MAX_AMOUNT: i64 = 3199;

const IMAGE_EXTENSIONS: [&str; 9] = [
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "heic", "tif", "tiff",
];

/// A picture handed in for recognition. Only its presence matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptImage {
    path: PathBuf,
}

impl ReceiptImage {
    /// Returns `None` for missing files and anything that is not an image.
    pub fn open(path: &Path) -> Option<Self> {
        if !path.is_file() {
            debug!(path = %path.display(), "Ignoring missing receipt image");
            return None;
        }

        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                IMAGE_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false);

        if !is_image {
            debug!(path = %path.display(), "Ignoring non-image file");
            return None;
        }

        Some(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Samples store, items and amount independently and tags the result.
pub fn generate_receipt<R: Rng + ?Sized>(
    rng: &mut R,
    categories: &[Category],
    today: NaiveDate,
) -> Result<Receipt, ValidationError> {
    let store = SAMPLE_STORES[rng.gen_range(0..SAMPLE_STORES.len())];
    let items: Vec<String> = SAMPLE_ITEMS[rng.gen_range(0..SAMPLE_ITEMS.len())]
        .iter()
        .map(|item| item.to_string())
        .collect();
    let amount = Decimal::from(rng.gen_range(MIN_AMOUNT..=MAX_AMOUNT));
    let category = detect_category(store, &items, categories);

    Receipt::new(today, store, amount, category, items)
}

/// Runs one recognition at a time; overlapping requests are rejected.
#[derive(Debug)]
pub struct Scanner {
    delay: Duration,
    busy: Cell<bool>,
}

struct BusyGuard<'a>(&'a Cell<bool>);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Scanner {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            busy: Cell::new(false),
        }
    }

    /// Waits out the recognition delay and produces a receipt for `image`.
    ///
    /// `categories` is captured at call time; edits made while waiting do
    /// not affect detection. The caller adds the receipt to the ledger.
    pub async fn process(
        &self,
        image: &ReceiptImage,
        categories: Arc<[Category]>,
    ) -> TrackerResult<Receipt> {
        if self.busy.replace(true) {
            return Err(ScanError::InProgress.into());
        }
        let _guard = BusyGuard(&self.busy);

        debug!(path = %image.path().display(), delay_ms = self.delay.as_millis() as u64, "Recognizing receipt");
        tokio::time::sleep(self.delay).await;

        let today = Local::now().date_naive();
        let receipt = generate_receipt(&mut rand::thread_rng(), &categories, today)?;
        info!(
            store = receipt.store(),
            amount = %receipt.amount(),
            category = receipt.category(),
            "Receipt recognized"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackerError;
    use crate::models::category::default_categories;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::NamedTempFile;

    fn temp_file_with_suffix(suffix: &str) -> NamedTempFile {
        tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("Failed to create temp file")
    }

    fn categories() -> Arc<[Category]> {
        Arc::from(default_categories())
    }

    #[test]
    fn test_open_accepts_image_extensions() {
        for suffix in [".png", ".JPG", ".jpeg", ".webp"] {
            let tmp = temp_file_with_suffix(suffix);
            let image = ReceiptImage::open(tmp.path());
            assert!(image.is_some(), "{} should be accepted", suffix);
            assert_eq!(image.unwrap().path(), tmp.path());
        }
    }

    #[test]
    fn test_open_ignores_non_images() {
        let tmp = temp_file_with_suffix(".txt");
        assert!(ReceiptImage::open(tmp.path()).is_none());

        let tmp = temp_file_with_suffix("");
        assert!(ReceiptImage::open(tmp.path()).is_none());
    }

    #[test]
    fn test_open_ignores_missing_file() {
        assert!(ReceiptImage::open(Path::new("definitely-missing-receipt.png")).is_none());
    }

    #[test]
    fn test_generate_receipt_uses_catalog_and_detection() {
        let categories = default_categories();
        let today = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let receipt = generate_receipt(&mut rng, &categories, today).unwrap();
            assert_eq!(receipt.date(), today);
            assert!(SAMPLE_STORES.contains(&receipt.store()));
            assert!(SAMPLE_ITEMS.iter().any(|items| *items == receipt.items()));
            assert!(receipt.amount() >= Decimal::from(MIN_AMOUNT));
            assert!(receipt.amount() <= Decimal::from(MAX_AMOUNT));
            assert_eq!(
                receipt.category(),
                detect_category(receipt.store(), receipt.items(), &categories)
            );
        }
    }

    #[test]
    fn test_generate_receipt_is_deterministic_for_seed() {
        let categories = default_categories();
        let today = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        let a = generate_receipt(&mut StdRng::seed_from_u64(42), &categories, today).unwrap();
        let b = generate_receipt(&mut StdRng::seed_from_u64(42), &categories, today).unwrap();

        assert_eq!(a.store(), b.store());
        assert_eq!(a.items(), b.items());
        assert_eq!(a.amount(), b.amount());
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test(start_paused = true)]
    async fn test_process_waits_for_delay() {
        let tmp = temp_file_with_suffix(".png");
        let image = ReceiptImage::open(tmp.path()).unwrap();
        let scanner = Scanner::new(Duration::from_millis(1500));

        let started = tokio::time::Instant::now();
        let receipt = scanner.process(&image, categories()).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(1500));
        assert_eq!(receipt.date(), Local::now().date_naive());
        assert!(!scanner.busy.get());
    }

    #[tokio::test(start_paused = true)]
    async fn test_process_rejects_overlapping_scan() {
        let tmp = temp_file_with_suffix(".png");
        let image = ReceiptImage::open(tmp.path()).unwrap();
        let scanner = Scanner::new(Duration::from_millis(1500));

        let first = scanner.process(&image, categories());
        tokio::pin!(first);
        tokio::select! {
            biased;
            _ = &mut first => panic!("first scan finished before the delay"),
            _ = tokio::task::yield_now() => {}
        }
        assert!(scanner.busy.get());

        let second = scanner.process(&image, categories()).await;
        assert!(matches!(second, Err(TrackerError::Scan(ScanError::InProgress))));

        assert!(first.await.is_ok());
        assert!(!scanner.busy.get());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_pending_scan_releases_scanner() {
        let tmp = temp_file_with_suffix(".png");
        let image = ReceiptImage::open(tmp.path()).unwrap();
        let scanner = Scanner::new(Duration::from_millis(1500));

        {
            let pending = scanner.process(&image, categories());
            tokio::pin!(pending);
            tokio::select! {
                biased;
                _ = &mut pending => panic!("scan finished before the delay"),
                _ = tokio::task::yield_now() => {}
            }
            assert!(scanner.busy.get());
        }

        assert!(!scanner.busy.get());
        assert!(scanner.process(&image, categories()).await.is_ok());
    }
}
