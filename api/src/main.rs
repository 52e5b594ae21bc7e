mod console;

use std::process::exit;

use tradeload::config::{DatabaseSettings, ExchangeRateSettings};
use tradeload::{import_currency_rates, setup_info_logger, tradeload_error, ImportCurrencyRatesError};

use crate::console::{print_error_message, print_success_message};

async fn run() -> Result<(), ImportCurrencyRatesError> {
    let database = DatabaseSettings::from_env()?;
    let settings = ExchangeRateSettings::from_env()?;

    let summary = import_currency_rates(&database, settings).await?;
    print_success_message(&format!(
        "Imported {} exchange rate quotes ({} already stored)",
        summary.inserted,
        summary.skipped()
    ));

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    setup_info_logger();

    if let Err(e) = run().await {
        tradeload_error!("Exchange rate import failed: {}", e);
        print_error_message(&format!("Exchange rate import failed: {}", e));
        exit(1);
    }
}
