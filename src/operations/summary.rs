//! Derived figures for the dashboard and export screens.
//!
//! Everything here is recomputed from the receipt list on each call.

use crate::ledger::Snapshot;
use crate::models::category::Category;
use crate::models::receipt::Receipt;
use chrono::{Duration, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashSet;

/// Number of calendar days shown in the daily chart, today included.
pub const DAILY_WINDOW_DAYS: i64 = 7;

pub const TOP_CATEGORY_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub name: String,
    pub color: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedCategory {
    pub name: String,
    pub color: String,
    pub amount: Decimal,
    /// Percentage of the grand total, 0..=100.
    pub share: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

pub fn total_amount(receipts: &[Receipt]) -> Decimal {
    receipts.iter().map(Receipt::amount).sum()
}

/// Per-category sums in category order. Categories summing to zero are left
/// out, and so are receipts whose label matches no category.
pub fn category_totals(receipts: &[Receipt], categories: &[Category]) -> Vec<CategoryTotal> {
    categories
        .iter()
        .map(|category| CategoryTotal {
            name: category.name().to_string(),
            color: category.color().to_string(),
            amount: receipts
                .iter()
                .filter(|r| r.category() == category.name())
                .map(Receipt::amount)
                .sum(),
        })
        .filter(|total| total.amount > Decimal::ZERO)
        .collect()
}

/// Sums for the last [`DAILY_WINDOW_DAYS`] days, oldest first.
pub fn daily_totals(receipts: &[Receipt], today: NaiveDate) -> Vec<DailyTotal> {
    (0..DAILY_WINDOW_DAYS)
        .rev()
        .map(|days_back| {
            let date = today - Duration::days(days_back);
            DailyTotal {
                date,
                amount: receipts
                    .iter()
                    .filter(|r| r.date() == date)
                    .map(Receipt::amount)
                    .sum(),
            }
        })
        .collect()
}

/// Receipts dated within the same [`DAILY_WINDOW_DAYS`] days that
/// [`daily_totals`] covers, `today` included.
pub fn recent_count(receipts: &[Receipt], today: NaiveDate) -> usize {
    let window_start = today - Duration::days(DAILY_WINDOW_DAYS - 1);
    receipts
        .iter()
        .filter(|r| r.date() >= window_start && r.date() <= today)
        .count()
}

pub fn average_amount(receipts: &[Receipt]) -> Decimal {
    if receipts.is_empty() {
        return Decimal::ZERO;
    }
    round_to_integer(total_amount(receipts) / Decimal::from(receipts.len()))
}

/// Largest category totals first, at most [`TOP_CATEGORY_LIMIT`] of them.
pub fn top_categories(receipts: &[Receipt], categories: &[Category]) -> Vec<RankedCategory> {
    let total = total_amount(receipts);
    let mut totals = category_totals(receipts, categories);
    totals.sort_by(|a, b| b.amount.cmp(&a.amount));

    totals
        .into_iter()
        .take(TOP_CATEGORY_LIMIT)
        .map(|t| RankedCategory {
            share: share_percent(t.amount, total),
            name: t.name,
            color: t.color,
            amount: t.amount,
        })
        .collect()
}

pub fn period(receipts: &[Receipt]) -> Option<Period> {
    let start = receipts.iter().map(Receipt::date).min()?;
    let end = receipts.iter().map(Receipt::date).max()?;
    Some(Period { start, end })
}

/// Number of distinct category labels in use, dangling ones included.
pub fn distinct_categories(receipts: &[Receipt]) -> usize {
    receipts
        .iter()
        .map(Receipt::category)
        .collect::<HashSet<_>>()
        .len()
}

pub(crate) fn round_to_integer(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

fn share_percent(amount: Decimal, total: Decimal) -> f64 {
    if total.is_zero() {
        return 0.0;
    }
    (amount / total * Decimal::ONE_HUNDRED).to_f64().unwrap_or(0.0)
}

/// Everything the dashboard shows, computed in one pass over a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub receipt_count: usize,
    pub total: Decimal,
    pub recent_count: usize,
    pub average: Decimal,
    pub category_totals: Vec<CategoryTotal>,
    pub daily_totals: Vec<DailyTotal>,
    pub top_categories: Vec<RankedCategory>,
    pub period: Option<Period>,
    pub category_count: usize,
}

impl Dashboard {
    pub fn compute(snapshot: &Snapshot, today: NaiveDate) -> Self {
        let receipts = &snapshot.receipts[..];
        let categories = &snapshot.categories[..];
        Self {
            receipt_count: receipts.len(),
            total: total_amount(receipts),
            recent_count: recent_count(receipts, today),
            average: average_amount(receipts),
            category_totals: category_totals(receipts, categories),
            daily_totals: daily_totals(receipts, today),
            top_categories: top_categories(receipts, categories),
            period: period(receipts),
            category_count: distinct_categories(receipts),
        }
    }
}
