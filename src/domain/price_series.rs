//! Price series and derived simple returns.

use chrono::NaiveDate;

use super::error::InvalidInput;

/// A single dated observation as delivered by a data port.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Chronologically ordered prices for one asset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    prices: Vec<f64>,
}

impl PriceSeries {
    pub fn new(prices: Vec<f64>) -> Self {
        Self { prices }
    }

    /// Builds a series from dated points, sorting them by date first.
    pub fn from_points(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self {
            prices: points.into_iter().map(|p| p.price).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Period-over-period simple returns, `(p[i] - p[i-1]) / p[i-1]`.
    ///
    /// Every price used as a divisor must be finite and strictly positive; the
    /// final price only needs to be finite and non-negative. A ratio that
    /// overflows to infinity is rejected. Series shorter than two points
    /// yield an empty return series.
    pub fn returns(&self) -> Result<Vec<f64>, InvalidInput> {
        if self.prices.len() < 2 {
            return Ok(Vec::new());
        }

        let last = self.prices.len() - 1;
        for (index, &price) in self.prices.iter().enumerate() {
            let valid = if index < last {
                price.is_finite() && price > 0.0
            } else {
                price.is_finite() && price >= 0.0
            };
            if !valid {
                return Err(InvalidInput::InvalidPrice { index, price });
            }
        }

        self.prices
            .windows(2)
            .enumerate()
            .map(|(index, w)| {
                let r = (w[1] - w[0]) / w[0];
                if r.is_finite() {
                    Ok(r)
                } else {
                    Err(InvalidInput::NonFiniteReturn { index })
                }
            })
            .collect()
    }
}

impl From<Vec<f64>> for PriceSeries {
    fn from(prices: Vec<f64>) -> Self {
        Self::new(prices)
    }
}

impl From<&[f64]> for PriceSeries {
    fn from(prices: &[f64]) -> Self {
        Self::new(prices.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn returns_basic() {
        let series = PriceSeries::from(vec![100.0, 105.0, 103.0, 110.0]);
        let returns = series.returns().unwrap();
        assert_eq!(returns.len(), 3);
        assert!((returns[0] - 0.05).abs() < 1e-12);
        assert!((returns[1] - (-2.0 / 105.0)).abs() < 1e-12);
        assert!((returns[2] - (7.0 / 103.0)).abs() < 1e-12);
    }

    #[test]
    fn returns_short_series_is_empty() {
        assert!(PriceSeries::default().returns().unwrap().is_empty());
        assert!(PriceSeries::from(vec![42.0]).returns().unwrap().is_empty());
    }

    #[test]
    fn returns_rejects_zero_divisor() {
        let series = PriceSeries::from(vec![100.0, 0.0, 50.0]);
        let err = series.returns().unwrap_err();
        assert_eq!(err, InvalidInput::InvalidPrice { index: 1, price: 0.0 });
    }

    #[test]
    fn returns_rejects_negative_price() {
        let series = PriceSeries::from(vec![100.0, 90.0, -1.0]);
        assert!(matches!(
            series.returns(),
            Err(InvalidInput::InvalidPrice { index: 2, .. })
        ));
    }

    #[test]
    fn returns_rejects_nan() {
        let series = PriceSeries::from(vec![f64::NAN, 90.0]);
        assert!(matches!(
            series.returns(),
            Err(InvalidInput::InvalidPrice { index: 0, .. })
        ));
    }

    #[test]
    fn returns_allows_final_price_of_zero() {
        let series = PriceSeries::from(vec![10.0, 5.0, 0.0]);
        let returns = series.returns().unwrap();
        assert!((returns[0] - (-0.5)).abs() < 1e-12);
        assert!((returns[1] - (-1.0)).abs() < 1e-12);
    }

    #[test]
    fn from_points_sorts_by_date() {
        let series = PriceSeries::from_points(vec![
            PricePoint { date: date(3), price: 3.0 },
            PricePoint { date: date(1), price: 1.0 },
            PricePoint { date: date(2), price: 2.0 },
        ]);
        assert_eq!(series, PriceSeries::from(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn returns_rejects_overflowing_ratio() {
        let series = PriceSeries::from(vec![1e-300, 1e300, 1e-300]);
        assert_eq!(
            series.returns(),
            Err(InvalidInput::NonFiniteReturn { index: 0 })
        );
    }
}
