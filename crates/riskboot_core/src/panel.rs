//! Price panel and return matrix construction.
//!
//! A [`PricePanel`] is the raw input to the engine: a date-keyed map of
//! category groups, each holding one price per ticker. `f64::NAN` marks a
//! missing observation. Selecting a category collapses the panel into a
//! dense, time-ordered [`ReturnMatrix`] of simple returns, dropping any date
//! with an incomplete cross-section so that rows stay contemporaneously
//! aligned across assets.

use std::collections::BTreeMap;

use jiff::civil::Date;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// Multi-level price panel: date -> category -> ticker -> value.
///
/// Dates iterate chronologically (`BTreeMap` ordering). The panel is
/// immutable to the engine once handed over; `f64::NAN` is the sentinel for
/// "missing".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricePanel {
    dates: BTreeMap<Date, BTreeMap<String, BTreeMap<String, f64>>>,
}

impl PricePanel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a single observation.
    pub fn insert(
        &mut self,
        date: Date,
        category: impl Into<String>,
        ticker: impl Into<String>,
        value: f64,
    ) {
        self.dates
            .entry(date)
            .or_default()
            .entry(category.into())
            .or_default()
            .insert(ticker.into(), value);
    }

    /// Returns true if the panel holds no dates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of dates in the panel.
    #[must_use]
    pub fn num_dates(&self) -> usize {
        self.dates.len()
    }

    /// Collapse one category into a dense return matrix.
    ///
    /// The ticker set is the union over all dates, in first-seen order
    /// during the chronological scan. A date is dropped wholesale when any
    /// ticker of that set has no finite value there (absent entry or NaN) —
    /// a single missing observation invalidates the whole cross-section for
    /// that date. Surviving price series are turned into simple returns
    /// `(p_t - p_{t-1}) / p_{t-1}`.
    pub fn select_category(&self, category: &str) -> Result<ReturnMatrix, DataError> {
        if self.dates.is_empty() {
            return Err(DataError::EmptyPanel);
        }

        // First pass: every date must carry the category; collect the union
        // ticker set in first-seen order.
        let mut tickers: Vec<String> = Vec::new();
        let mut ticker_index: FxHashMap<String, usize> = FxHashMap::default();
        for group in self.dates.values() {
            let Some(prices) = group.get(category) else {
                return Err(DataError::MissingCategory(category.to_string()));
            };
            for ticker in prices.keys() {
                if !ticker_index.contains_key(ticker) {
                    ticker_index.insert(ticker.clone(), tickers.len());
                    tickers.push(ticker.clone());
                }
            }
        }

        // Second pass: keep only dates with a finite value for every ticker.
        let mut prices: Vec<Vec<f64>> = Vec::new();
        for group in self.dates.values() {
            let day_prices = &group[category];
            let mut row = Vec::with_capacity(tickers.len());
            let complete = tickers.iter().all(|ticker| {
                day_prices.get(ticker).is_some_and(|v| {
                    if v.is_finite() {
                        row.push(*v);
                        true
                    } else {
                        false
                    }
                })
            });
            if complete {
                prices.push(row);
            }
        }

        if prices.len() < 2 {
            return Err(DataError::EmptyAfterFilter(category.to_string()));
        }

        // Simple returns over consecutive surviving dates.
        let rows = prices
            .windows(2)
            .map(|pair| {
                pair[0]
                    .iter()
                    .zip(pair[1].iter())
                    .map(|(prev, cur)| (cur - prev) / prev)
                    .collect()
            })
            .collect();

        Ok(ReturnMatrix { tickers, rows })
    }
}

/// Dense matrix of simple returns for one selected category.
///
/// Rows are time steps in chronological order, columns follow
/// [`ReturnMatrix::tickers`] (first-seen order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnMatrix {
    tickers: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl ReturnMatrix {
    /// Build a matrix directly from ticker names and return rows.
    ///
    /// All rows must have one entry per ticker.
    #[must_use]
    pub fn new(tickers: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == tickers.len()));
        Self { tickers, rows }
    }

    /// Ticker names, one per column.
    #[must_use]
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Number of assets (columns).
    #[must_use]
    pub fn num_assets(&self) -> usize {
        self.tickers.len()
    }

    /// Number of time steps (rows).
    #[must_use]
    pub fn num_steps(&self) -> usize {
        self.rows.len()
    }

    /// The return rows, time-ordered.
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// One-step portfolio returns `r_t = row_t . weights` for every row.
    #[must_use]
    pub fn portfolio_returns(&self, weights: &[f64]) -> Vec<f64> {
        self.rows
            .iter()
            .map(|row| row.iter().zip(weights.iter()).map(|(r, w)| r * w).sum())
            .collect()
    }
}
