//! Holdings and price-history access port.

use crate::domain::error::AstraportError;
use crate::domain::holdings::HoldingsMap;
use crate::domain::price_series::PricePoint;
use chrono::NaiveDate;

pub trait DataPort {
    fn fetch_holdings(&self, wallet: &str) -> Result<HoldingsMap, AstraportError>;

    /// Prices for `asset` dated within `[start_date, end_date]`, oldest first.
    fn fetch_prices(
        &self,
        asset: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, AstraportError>;

    fn list_assets(&self) -> Result<Vec<String>, AstraportError>;
}
