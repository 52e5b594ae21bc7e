use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::info;

use crate::config::{
    ConfigError, DatabaseSettings, ExchangeRateSettings, LoadSettings, INSTRUMENTS_FILE,
    PRICES_FILE, TRADES_FILE,
};
use crate::database::batch_operations::TableRecord;
use crate::database::postgres::batch_operations::{
    build_bulk_upserts, execute_statements, BuildBulkUpsertError, ExecuteStatementsError,
    StatementExecutor,
};
use crate::database::postgres::setup::{setup_postgres, SetupPostgresError};
use crate::exchange_rates::{ExchangeRateClient, FetchExchangeRatesError};
use crate::records::{CurrencyQuote, Instrument, Price, Trade};
use crate::simple_file_formatters::csv::{read_csv_records, ReadCsvError};

/// What a single table load did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub table: &'static str,
    pub records: usize,
    pub statements: usize,
    pub inserted: u64,
}

impl LoadSummary {
    /// Records the conflict clause skipped because the key was already stored.
    pub fn skipped(&self) -> u64 {
        (self.records as u64).saturating_sub(self.inserted)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoadTableError {
    #[error("Invalid table definition: {0}")]
    InvalidSpec(#[from] BuildBulkUpsertError),

    #[error("{0}")]
    Execution(#[from] ExecuteStatementsError),
}

#[derive(thiserror::Error, Debug)]
pub enum LoadFilesError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Could not setup postgres: {0}")]
    SetupPostgresError(#[from] SetupPostgresError),

    #[error("{0}")]
    ReadCsvError(#[from] ReadCsvError),

    #[error("Could not load table: {0}")]
    LoadTableError(#[from] LoadTableError),
}

#[derive(thiserror::Error, Debug)]
pub enum ImportCurrencyRatesError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Could not setup postgres: {0}")]
    SetupPostgresError(#[from] SetupPostgresError),

    #[error("Could not fetch exchange rates: {0}")]
    FetchExchangeRatesError(#[from] FetchExchangeRatesError),

    #[error("Could not load table: {0}")]
    LoadTableError(#[from] LoadTableError),
}

/// Builds the upserts for `records` and runs them in order against `executor`.
pub async fn load_records<R, E>(
    executor: &E,
    records: &[R],
    chunk_size: usize,
) -> Result<LoadSummary, LoadTableError>
where
    R: TableRecord,
    E: StatementExecutor + Sync,
{
    let table = R::table_spec();
    let statements = build_bulk_upserts(&table, records, chunk_size)?;
    let inserted = execute_statements(executor, table.table_name, &statements).await?;

    let summary = LoadSummary {
        table: table.table_name,
        records: records.len(),
        statements: statements.len(),
        inserted,
    };
    info!(
        "{} - inserted {} of {} records in {} statements, {} already present",
        summary.table,
        summary.inserted,
        summary.records,
        summary.statements,
        summary.skipped()
    );

    Ok(summary)
}

async fn load_csv_table<R, E>(
    executor: &E,
    path: &Path,
    chunk_size: usize,
) -> Result<LoadSummary, LoadFilesError>
where
    R: TableRecord + DeserializeOwned,
    E: StatementExecutor + Sync,
{
    info!("Starting loading {}...", path.display());
    let records: Vec<R> = read_csv_records(path)?;
    info!("Read {} records from {}", records.len(), path.display());

    Ok(load_records(executor, &records, chunk_size).await?)
}

/// Loads instruments, then prices, then trades. Prices and trades refer to instruments, so
/// the order is fixed. The first failure stops the load; tables already loaded stay loaded.
pub async fn load_tables_from_files<E>(
    executor: &E,
    settings: &LoadSettings,
    chunk_size: usize,
) -> Result<Vec<LoadSummary>, LoadFilesError>
where
    E: StatementExecutor + Sync,
{
    Ok(vec![
        load_csv_table::<Instrument, _>(
            executor,
            &settings.file_path(INSTRUMENTS_FILE),
            chunk_size,
        )
        .await?,
        load_csv_table::<Price, _>(executor, &settings.file_path(PRICES_FILE), chunk_size).await?,
        load_csv_table::<Trade, _>(executor, &settings.file_path(TRADES_FILE), chunk_size).await?,
    ])
}

/// Entry point of the csv loader: init script, then the three files.
pub async fn load_files(
    database: &DatabaseSettings,
    settings: &LoadSettings,
) -> Result<Vec<LoadSummary>, LoadFilesError> {
    let client = setup_postgres(&database.connection_string, &database.init_sql).await?;

    load_tables_from_files(&client, settings, database.chunk_size).await
}

/// Fetches the configured range and writes it through the same bulk upsert path as the files.
pub async fn import_quotes<E>(
    executor: &E,
    api: &ExchangeRateClient,
    chunk_size: usize,
) -> Result<LoadSummary, ImportCurrencyRatesError>
where
    E: StatementExecutor + Sync,
{
    let quotes: Vec<CurrencyQuote> = api.fetch_historical().await?;

    Ok(load_records(executor, &quotes, chunk_size).await?)
}

/// Entry point of the exchange rate importer.
pub async fn import_currency_rates(
    database: &DatabaseSettings,
    settings: ExchangeRateSettings,
) -> Result<LoadSummary, ImportCurrencyRatesError> {
    // build the http client before connecting so a bad setup never opens a connection
    let api = ExchangeRateClient::new(settings)?;
    let client = setup_postgres(&database.connection_string, &database.init_sql).await?;

    import_quotes(&client, &api, database.chunk_size).await
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::Mutex, time::Duration};

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use mockito::Matcher;
    use tempfile::tempdir;

    use super::*;
    use crate::database::postgres::batch_operations::BulkStatement;

    #[derive(thiserror::Error, Debug)]
    #[error("relation does not exist")]
    struct MissingTable;

    /// Keeps the first word after `INSERT INTO` of every executed statement.
    struct TableRecorder {
        fail_on_table: Option<&'static str>,
        duplicates: u64,
        tables: Mutex<Vec<String>>,
    }

    impl TableRecorder {
        fn new() -> Self {
            TableRecorder { fail_on_table: None, duplicates: 0, tables: Mutex::new(Vec::new()) }
        }

        fn tables(&self) -> Vec<String> {
            self.tables.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StatementExecutor for TableRecorder {
        type Error = MissingTable;

        async fn execute_statement(&self, statement: &BulkStatement) -> Result<u64, Self::Error> {
            let table = statement.query.split_whitespace().nth(2).unwrap_or_default().to_string();
            if self.fail_on_table == Some(table.as_str()) {
                return Err(MissingTable);
            }
            self.tables.lock().unwrap().push(table);
            Ok((statement.rows as u64).saturating_sub(self.duplicates))
        }
    }

    fn write_fixtures(dir: &Path) {
        fs::write(
            dir.join(INSTRUMENTS_FILE),
            "instrument_id,sector_name,country_name,index_name,instrument_type\n\
             1,Tech,US,NASDAQ,equity\n\
             2,Energy,GB,FTSE,equity\n",
        )
        .unwrap();
        fs::write(
            dir.join(PRICES_FILE),
            "date,price,instrument_id\n2020-01-02,10.5,1\n2020-01-02,20.25,2\n2020-01-03,10.75,1\n",
        )
        .unwrap();
        fs::write(
            dir.join(TRADES_FILE),
            "customer_id,execution_time,direction,execution_size,execution_price,instrument_id\n\
             9,2020-01-02 10:00:00,buy,100,10.5,1\n",
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_tables_load_in_dependency_order() {
        let dir = tempdir().unwrap();
        write_fixtures(dir.path());
        let settings = LoadSettings { data_dir: dir.path().to_path_buf() };
        let recorder = TableRecorder::new();

        let summaries = load_tables_from_files(&recorder, &settings, 2).await.unwrap();

        assert_eq!(recorder.tables(), vec!["instruments", "prices", "prices", "trades"]);
        assert_eq!(
            summaries.iter().map(|s| (s.table, s.records, s.statements)).collect::<Vec<_>>(),
            vec![("instruments", 2, 1), ("prices", 3, 2), ("trades", 1, 1)]
        );
    }

    #[tokio::test]
    async fn test_failed_table_stops_the_load() {
        let dir = tempdir().unwrap();
        write_fixtures(dir.path());
        let settings = LoadSettings { data_dir: dir.path().to_path_buf() };
        let mut recorder = TableRecorder::new();
        recorder.fail_on_table = Some("prices");

        let err = load_tables_from_files(&recorder, &settings, 10).await.unwrap_err();

        assert!(matches!(err, LoadFilesError::LoadTableError(LoadTableError::Execution(_))));
        assert_eq!(recorder.tables(), vec!["instruments"]);
    }

    #[tokio::test]
    async fn test_bad_file_stops_before_later_tables() {
        let dir = tempdir().unwrap();
        write_fixtures(dir.path());
        fs::write(dir.path().join(PRICES_FILE), "date,price,instrument_id\n2020-01-02,abc,1\n")
            .unwrap();
        let settings = LoadSettings { data_dir: dir.path().to_path_buf() };
        let recorder = TableRecorder::new();

        let err = load_tables_from_files(&recorder, &settings, 10).await.unwrap_err();

        assert!(matches!(err, LoadFilesError::ReadCsvError(_)));
        assert_eq!(recorder.tables(), vec!["instruments"]);
    }

    #[tokio::test]
    async fn test_skipped_duplicates_are_reported() {
        let recorder = TableRecorder { duplicates: 1, ..TableRecorder::new() };
        let prices = vec![
            Price { date: "2020-01-02".to_string(), price: 1.0, instrument_id: 1 },
            Price { date: "2020-01-03".to_string(), price: 1.0, instrument_id: 1 },
        ];

        let summary = load_records(&recorder, &prices, 10).await.unwrap();

        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.skipped(), 1);
    }

    #[tokio::test]
    async fn test_invalid_chunk_size_is_rejected_before_executing() {
        let recorder = TableRecorder::new();
        let prices = vec![Price { date: "2020-01-02".to_string(), price: 1.0, instrument_id: 1 }];

        let err = load_records(&recorder, &prices, 0).await.unwrap_err();

        assert!(matches!(err, LoadTableError::InvalidSpec(BuildBulkUpsertError::InvalidChunkSize(0))));
        assert!(recorder.tables().is_empty());
    }

    #[test]
    fn test_import_quotes() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/api/v2/historical")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data": {"2020-01-02": {"USD": 1.1, "GBP": 0.85, "JPY": 121.9}}}"#)
            .create();

        let api = ExchangeRateClient::new(ExchangeRateSettings {
            api_key: "key".to_string(),
            base_url: server.url(),
            date_from: NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
            date_to: NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
            base_currency: "EUR".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        let recorder = TableRecorder::new();

        let rt = tokio::runtime::Runtime::new().unwrap();
        let summary = rt.block_on(import_quotes(&recorder, &api, 2)).unwrap();

        assert_eq!(summary.table, "currencies");
        assert_eq!(summary.records, 3);
        assert_eq!(summary.statements, 2);
        assert_eq!(recorder.tables(), vec!["currencies", "currencies"]);
    }
}
