// public
pub mod config;
pub mod exchange_rates;
pub mod records;

mod database;
pub use database::{
    batch_operations::{column, ColumnDefinition, TableRecord, TableSpec},
    postgres::{
        batch_operations::{
            build_bulk_upserts, execute_statements, BuildBulkUpsertError, BulkStatement,
            ExecuteStatementsError, StatementExecutor, DEFAULT_CHUNK_SIZE, MAX_BIND_PARAMETERS,
        },
        client::{PgType, PostgresClient, PostgresConnectionError, PostgresError, ToSql},
        setup::{setup_postgres, SetupPostgresError},
        sql_type_wrapper::SqlValue,
    },
};

mod simple_file_formatters;
pub use simple_file_formatters::csv::{read_csv_records, ReadCsvError};

mod logger;
pub use logger::{setup_info_logger, setup_logger};

mod start;
pub use start::{
    import_currency_rates, import_quotes, load_files, load_records, load_tables_from_files,
    ImportCurrencyRatesError, LoadFilesError, LoadSummary, LoadTableError,
};

// export 3rd party dependencies
pub use async_trait::async_trait;
pub use tracing::{error as tradeload_error, info as tradeload_info};
