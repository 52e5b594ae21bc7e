use serde::{Deserialize, Serialize};

use crate::database::batch_operations::{column, TableRecord, TableSpec};
use crate::database::postgres::sql_type_wrapper::SqlValue;

/// A row of `instruments.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub instrument_id: i64,
    pub sector_name: String,
    pub country_name: String,
    pub index_name: String,
    pub instrument_type: String,
}

impl TableRecord for Instrument {
    fn table_spec() -> TableSpec<Self> {
        TableSpec::new(
            "instruments",
            vec![
                column("instrument_id", |r: &Self| SqlValue::Int(r.instrument_id)),
                column("sector_name", |r: &Self| SqlValue::from(r.sector_name.as_str())),
                column("country_name", |r: &Self| SqlValue::from(r.country_name.as_str())),
                column("index_name", |r: &Self| SqlValue::from(r.index_name.as_str())),
                column("instrument_type", |r: &Self| SqlValue::from(r.instrument_type.as_str())),
            ],
            vec!["instrument_id"],
        )
    }
}

/// A daily closing price, a row of `prices.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub date: String,
    pub price: f64,
    pub instrument_id: i64,
}

impl TableRecord for Price {
    fn table_spec() -> TableSpec<Self> {
        TableSpec::new(
            "prices",
            vec![
                column("date", |r: &Self| SqlValue::from(r.date.as_str())),
                column("price", |r: &Self| SqlValue::Float(r.price)),
                column("instrument_id", |r: &Self| SqlValue::Int(r.instrument_id)),
            ],
            vec!["date", "instrument_id"],
        )
    }
}

/// A customer execution, a row of `trades.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub customer_id: i64,
    pub execution_time: String,
    pub direction: String,
    pub execution_size: f64,
    pub execution_price: f64,
    pub instrument_id: i64,
}

impl TableRecord for Trade {
    fn table_spec() -> TableSpec<Self> {
        TableSpec::new(
            "trades",
            vec![
                column("customer_id", |r: &Self| SqlValue::Int(r.customer_id)),
                column("execution_time", |r: &Self| SqlValue::from(r.execution_time.as_str())),
                column("direction", |r: &Self| SqlValue::from(r.direction.as_str())),
                column("execution_size", |r: &Self| SqlValue::Float(r.execution_size)),
                column("execution_price", |r: &Self| SqlValue::Float(r.execution_price)),
                column("instrument_id", |r: &Self| SqlValue::Int(r.instrument_id)),
            ],
            vec!["customer_id", "execution_time"],
        )
    }
}

/// The price of `currency` in `base_currency` on `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyQuote {
    pub date: String,
    pub base_currency: String,
    pub currency: String,
    pub price: f64,
}

impl TableRecord for CurrencyQuote {
    fn table_spec() -> TableSpec<Self> {
        TableSpec::new(
            "currencies",
            vec![
                column("date", |r: &Self| SqlValue::from(r.date.as_str())),
                column("base_currency", |r: &Self| SqlValue::from(r.base_currency.as_str())),
                column("currency", |r: &Self| SqlValue::from(r.currency.as_str())),
                column("price", |r: &Self| SqlValue::Float(r.price)),
            ],
            vec!["date", "currency"],
        )
    }
}
