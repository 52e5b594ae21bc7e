use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::database::postgres::client::{PostgresClient, PostgresConnectionError, PostgresError};

#[derive(thiserror::Error, Debug)]
pub enum SetupPostgresError {
    #[error("{0}")]
    PostgresConnection(#[from] PostgresConnectionError),

    #[error("Could not read init sql file {0}: {1}")]
    CouldNotReadInitSql(PathBuf, std::io::Error),

    #[error("Could not run init sql file {0}: {1}")]
    CouldNotRunInitSql(PathBuf, PostgresError),
}

pub async fn read_init_sql(init_sql_path: &Path) -> Result<String, SetupPostgresError> {
    tokio::fs::read_to_string(init_sql_path)
        .await
        .map_err(|e| SetupPostgresError::CouldNotReadInitSql(init_sql_path.to_path_buf(), e))
}

/// Connects to postgres and runs the init script verbatim before anything is loaded.
pub async fn setup_postgres(
    connection_str: &str,
    init_sql_path: &Path,
) -> Result<PostgresClient, SetupPostgresError> {
    info!("Setting up postgres");
    // read first so a missing script fails before touching the database
    let sql = read_init_sql(init_sql_path).await?;

    let client = PostgresClient::new(connection_str).await?;

    info!("Running init sql {}", init_sql_path.display());
    debug!("{}", sql);
    client
        .batch_execute(&sql)
        .await
        .map_err(|e| SetupPostgresError::CouldNotRunInitSql(init_sql_path.to_path_buf(), e))?;
    info!("Created tables from {}", init_sql_path.display());

    Ok(client)
}
