mod console;

use std::process::exit;

use tradeload::config::{DatabaseSettings, LoadSettings};
use tradeload::{load_files, setup_info_logger, tradeload_error, tradeload_info, LoadFilesError};

use crate::console::{print_error_message, print_success_message};

async fn run() -> Result<(), LoadFilesError> {
    let database = DatabaseSettings::from_env()?;
    let settings = LoadSettings::from_env()?;

    tradeload_info!("Loading csv files from {}", settings.data_dir.display());
    let summaries = load_files(&database, &settings).await?;

    for summary in summaries {
        print_success_message(&format!(
            "{}: inserted {} of {} records",
            summary.table, summary.inserted, summary.records
        ));
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    setup_info_logger();

    if let Err(e) = run().await {
        tradeload_error!("Loading files failed: {}", e);
        print_error_message(&format!("Loading files failed: {}", e));
        exit(1);
    }
}
