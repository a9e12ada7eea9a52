//! CSV file data adapter.
//!
//! Layout under the base directory:
//! - `<WALLET>_holdings.csv` with columns `asset,amount`
//! - `<ASSET>_prices.csv` with columns `date,price` (`YYYY-MM-DD`)

use crate::domain::error::AstraportError;
use crate::domain::holdings::HoldingsMap;
use crate::domain::price_series::PricePoint;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const HOLDINGS_SUFFIX: &str = "_holdings.csv";
const PRICES_SUFFIX: &str = "_prices.csv";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn holdings_path(&self, wallet: &str) -> PathBuf {
        self.base_path.join(format!("{}{}", wallet, HOLDINGS_SUFFIX))
    }

    fn prices_path(&self, asset: &str) -> PathBuf {
        self.base_path.join(format!("{}{}", asset, PRICES_SUFFIX))
    }

    fn read(&self, path: &Path) -> Result<String, AstraportError> {
        fs::read_to_string(path).map_err(|e| AstraportError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })
    }
}

fn column<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<&'r str, AstraportError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| AstraportError::DataSource {
            reason: format!("missing {} column", name),
        })
}

fn number(value: &str, name: &str) -> Result<f64, AstraportError> {
    value.parse().map_err(|e| AstraportError::DataSource {
        reason: format!("invalid {} value {:?}: {}", name, value, e),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_holdings(&self, wallet: &str) -> Result<HoldingsMap, AstraportError> {
        let path = self.holdings_path(wallet);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AstraportError::NoData {
                    wallet: wallet.to_string(),
                });
            }
            Err(e) => {
                return Err(AstraportError::DataSource {
                    reason: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut holdings = HoldingsMap::new();

        for result in rdr.records() {
            let record = result.map_err(|e| AstraportError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let asset = column(&record, 0, "asset")?;
            let amount = number(column(&record, 1, "amount")?, "amount")?;
            holdings.insert(asset, amount)?;
        }

        Ok(holdings)
    }

    fn fetch_prices(
        &self,
        asset: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, AstraportError> {
        let content = self.read(&self.prices_path(asset))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut points = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| AstraportError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = column(&record, 0, "date")?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                AstraportError::DataSource {
                    reason: format!("invalid date format: {}", e),
                }
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            let price = number(column(&record, 1, "price")?, "price")?;
            points.push(PricePoint { date, price });
        }

        points.sort_by_key(|p| p.date);
        Ok(points)
    }

    fn list_assets(&self) -> Result<Vec<String>, AstraportError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| AstraportError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut assets = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| AstraportError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(asset) = name_str.strip_suffix(PRICES_SUFFIX) {
                if !asset.is_empty() {
                    assets.push(asset.to_string());
                }
            }
        }

        assets.sort();
        Ok(assets)
    }
}
