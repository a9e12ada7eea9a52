#![allow(dead_code)]

use astraport::domain::error::AstraportError;
use astraport::domain::event::RiskEvent;
use astraport::domain::holdings::HoldingsMap;
use astraport::domain::price_series::PricePoint;
use astraport::ports::data_port::DataPort;
use astraport::ports::event_port::EventPort;
use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;

pub struct MockDataPort {
    pub holdings: HashMap<String, Vec<(String, f64)>>,
    pub prices: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            holdings: HashMap::new(),
            prices: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_holdings(mut self, wallet: &str, holdings: &[(&str, f64)]) -> Self {
        self.holdings.insert(
            wallet.to_string(),
            holdings.iter().map(|(a, v)| (a.to_string(), *v)).collect(),
        );
        self
    }

    /// Daily prices starting 2024-01-01.
    pub fn with_prices(mut self, asset: &str, prices: &[f64]) -> Self {
        let start = date(2024, 1, 1);
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint {
                date: start + chrono::Days::new(i as u64),
                price,
            })
            .collect();
        self.prices.insert(asset.to_string(), points);
        self
    }

    pub fn with_error(mut self, asset: &str, reason: &str) -> Self {
        self.errors.insert(asset.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_holdings(&self, wallet: &str) -> Result<HoldingsMap, AstraportError> {
        let pairs = self
            .holdings
            .get(wallet)
            .ok_or_else(|| AstraportError::NoData {
                wallet: wallet.to_string(),
            })?;
        Ok(HoldingsMap::from_pairs(pairs.iter().map(|(a, v)| (a.as_str(), *v)))?)
    }

    fn fetch_prices(
        &self,
        asset: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, AstraportError> {
        if let Some(reason) = self.errors.get(asset) {
            return Err(AstraportError::DataSource {
                reason: reason.clone(),
            });
        }
        match self.prices.get(asset) {
            Some(points) => Ok(points
                .iter()
                .filter(|p| p.date >= start_date && p.date <= end_date)
                .cloned()
                .collect()),
            None => Err(AstraportError::DataSource {
                reason: format!("no price file for {asset}"),
            }),
        }
    }

    fn list_assets(&self) -> Result<Vec<String>, AstraportError> {
        let mut assets: Vec<String> = self.prices.keys().cloned().collect();
        assets.sort();
        Ok(assets)
    }
}

#[derive(Default)]
pub struct RecordingEventPort {
    pub events: RefCell<Vec<RiskEvent>>,
}

impl RecordingEventPort {
    pub fn warnings(&self) -> Vec<RiskEvent> {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.is_warning())
            .cloned()
            .collect()
    }
}

impl EventPort for RecordingEventPort {
    fn emit(&self, event: &RiskEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

/// Wallet from the worked example: 5000 USD, 3000 EUR, 2000 GBP.
pub fn reference_port() -> MockDataPort {
    MockDataPort::new()
        .with_holdings("GREF", &[("USD", 5000.0), ("EUR", 3000.0), ("GBP", 2000.0)])
        .with_prices("USD", &[1.0, 1.0, 1.0, 1.0])
        .with_prices("EUR", &[1.10, 1.12, 1.09, 1.11])
        .with_prices("GBP", &[1.25, 1.27, 1.24, 1.26])
}
