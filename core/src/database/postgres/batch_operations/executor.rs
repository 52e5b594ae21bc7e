use std::error::Error;

use async_trait::async_trait;
use tracing::{debug, error};

use super::bulk_upsert::BulkStatement;
use crate::database::postgres::client::{PostgresClient, PostgresError};

/// Something that can run a built statement and report how many rows it wrote.
#[async_trait]
pub trait StatementExecutor {
    type Error: Error + Send + Sync + 'static;

    async fn execute_statement(&self, statement: &BulkStatement) -> Result<u64, Self::Error>;
}

#[async_trait]
impl StatementExecutor for PostgresClient {
    type Error = PostgresError;

    async fn execute_statement(&self, statement: &BulkStatement) -> Result<u64, Self::Error> {
        self.execute(statement.query.as_str(), &statement.params_refs()).await
    }
}

#[derive(thiserror::Error, Debug)]
#[error("Statement {index} of {total} for table {table} failed: {source}")]
pub struct ExecuteStatementsError {
    pub table: String,
    pub index: usize,
    pub total: usize,
    #[source]
    pub source: Box<dyn Error + Send + Sync>,
}

/// Runs `statements` one after the other, in order.
///
/// The first failure stops the run and is returned; later statements are never sent.
/// Statements that already ran stay written, there is no surrounding transaction.
/// Returns the number of rows the store reported as inserted.
pub async fn execute_statements<E>(
    executor: &E,
    table: &str,
    statements: &[BulkStatement],
) -> Result<u64, ExecuteStatementsError>
where
    E: StatementExecutor + Sync,
{
    let total = statements.len();
    let mut inserted = 0;

    for (index, statement) in statements.iter().enumerate() {
        debug!("{} - executing statement {}/{} ({} rows)", table, index + 1, total, statement.rows);

        match executor.execute_statement(statement).await {
            Ok(count) => inserted += count,
            Err(e) => {
                error!("{} - statement {}/{} failed: {}", table, index + 1, total, e);
                return Err(ExecuteStatementsError {
                    table: table.to_string(),
                    index: index + 1,
                    total,
                    source: Box::new(e),
                });
            }
        }
    }

    Ok(inserted)
}
