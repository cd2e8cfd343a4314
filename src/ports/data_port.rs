//! Data access port trait.

use crate::domain::error::SimError;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily closes for `symbol` in `[start_date, end_date]`, sorted by date.
    ///
    /// An unknown symbol or an empty range is `SimError::DataUnavailable`,
    /// never an empty series.
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, SimError>;

    fn list_symbols(&self) -> Result<Vec<String>, SimError>;
}
