use std::collections::BTreeMap;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::ExchangeRateSettings;
use crate::records::CurrencyQuote;

const HISTORICAL_PATH: &str = "/api/v2/historical";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(thiserror::Error, Debug)]
pub enum FetchExchangeRatesError {
    #[error("Could not build http client: {0}")]
    CouldNotBuildClient(reqwest::Error),

    #[error("Network request failed: {0}")]
    Network(reqwest::Error),

    #[error("Exchange rate api responded with status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Invalid exchange rate response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Body of `GET /api/v2/historical`: date -> currency code -> price.
///
/// Other top level sections are ignored, `data` is required and every price must be a number.
#[derive(Debug, Deserialize)]
pub struct HistoricalRatesResponse {
    pub data: BTreeMap<String, BTreeMap<String, f64>>,
}

impl HistoricalRatesResponse {
    /// Flattens the response into quotes ordered by date then currency code.
    pub fn into_quotes(self, base_currency: &str) -> Vec<CurrencyQuote> {
        self.data
            .into_iter()
            .flat_map(|(date, prices)| {
                prices.into_iter().map(move |(currency, price)| CurrencyQuote {
                    date: date.clone(),
                    base_currency: base_currency.to_string(),
                    currency,
                    price,
                })
            })
            .collect()
    }
}

pub struct ExchangeRateClient {
    client: Client,
    settings: ExchangeRateSettings,
}

impl ExchangeRateClient {
    pub fn new(settings: ExchangeRateSettings) -> Result<Self, FetchExchangeRatesError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(FetchExchangeRatesError::CouldNotBuildClient)?;

        Ok(Self { client, settings })
    }

    fn historical_url(&self) -> String {
        format!("{}{}", self.settings.base_url.trim_end_matches('/'), HISTORICAL_PATH)
    }

    /// Requests the configured date range once. Any failure is returned as is, nothing retries.
    pub async fn fetch_historical(&self) -> Result<Vec<CurrencyQuote>, FetchExchangeRatesError> {
        let date_from = self.settings.date_from.format(DATE_FORMAT).to_string();
        let date_to = self.settings.date_to.format(DATE_FORMAT).to_string();

        info!("Fetching exchange rates from {} to {}", date_from, date_to);

        // the query carries the api key, keep the url out of any error message
        let response = self
            .client
            .get(self.historical_url())
            .query(&[
                ("apikey", self.settings.api_key.as_str()),
                ("date_from", date_from.as_str()),
                ("date_to", date_to.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FetchExchangeRatesError::Network(e.without_url()))?;

        let status = response.status();
        let body =
            response.text().await.map_err(|e| FetchExchangeRatesError::Network(e.without_url()))?;

        if !status.is_success() {
            return Err(FetchExchangeRatesError::UnexpectedStatus { status: status.as_u16(), body });
        }

        let decoded: HistoricalRatesResponse = serde_json::from_str(&body)?;
        debug!("Exchange rate response holds {} dates", decoded.data.len());

        let quotes = decoded.into_quotes(&self.settings.base_currency);
        info!("Fetched {} exchange rate quotes", quotes.len());

        Ok(quotes)
    }
}
