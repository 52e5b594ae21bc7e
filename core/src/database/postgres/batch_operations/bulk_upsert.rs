//! Chunked multi-row `INSERT ... ON CONFLICT DO NOTHING` statements built from typed records.

use tokio_postgres::types::ToSql;
use tracing::debug;

use super::query_builder::{
    build_conflict_clause, build_insert_header, build_values_clause, format_table_name,
};
use crate::database::batch_operations::TableSpec;
use crate::database::postgres::sql_type_wrapper::SqlValue;

/// Postgres refuses statements binding more than `u16::MAX` parameters.
pub const MAX_BIND_PARAMETERS: usize = u16::MAX as usize;

/// Default number of records written by one statement.
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum BuildBulkUpsertError {
    #[error("Table {0} has no columns to insert")]
    NoColumns(String),

    #[error("Chunk size must be at least 1, got {0}")]
    InvalidChunkSize(usize),

    #[error("Conflict column {column} is not one of the columns of table {table}")]
    UnknownConflictColumn { table: String, column: String },

    #[error(
        "A chunk of {chunk_size} rows with {columns} columns exceeds the limit of {max} bind parameters",
        max = MAX_BIND_PARAMETERS
    )]
    TooManyParameters { chunk_size: usize, columns: usize },
}

/// One ready to execute statement and the arguments for its placeholders, in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkStatement {
    pub query: String,
    pub params: Vec<SqlValue>,
    pub rows: usize,
}

impl BulkStatement {
    pub fn params_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|param| param as &(dyn ToSql + Sync)).collect()
    }
}

fn validate_table_spec<R>(
    table: &TableSpec<R>,
    max_chunk_size: usize,
) -> Result<(), BuildBulkUpsertError> {
    if table.columns.is_empty() {
        return Err(BuildBulkUpsertError::NoColumns(table.table_name.to_string()));
    }

    if max_chunk_size < 1 {
        return Err(BuildBulkUpsertError::InvalidChunkSize(max_chunk_size));
    }

    if let Some(column) =
        table.conflict_key.iter().find(|key| !table.columns.iter().any(|col| col.name == **key))
    {
        return Err(BuildBulkUpsertError::UnknownConflictColumn {
            table: table.table_name.to_string(),
            column: column.to_string(),
        });
    }

    let columns = table.columns.len();
    if max_chunk_size.checked_mul(columns).map_or(true, |total| total > MAX_BIND_PARAMETERS) {
        return Err(BuildBulkUpsertError::TooManyParameters {
            chunk_size: max_chunk_size,
            columns,
        });
    }

    Ok(())
}

/// Builds one upsert statement per chunk of at most `max_chunk_size` records.
///
/// Chunks keep the input order and cover it without gaps or overlap, so the last chunk may be
/// shorter. An empty `records` slice produces no statements. Record values are never
/// inspected here; anything the store can not accept fails when the statement runs.
pub fn build_bulk_upserts<R>(
    table: &TableSpec<R>,
    records: &[R],
    max_chunk_size: usize,
) -> Result<Vec<BulkStatement>, BuildBulkUpsertError> {
    validate_table_spec(table, max_chunk_size)?;

    let column_names = table.column_names();
    let header = build_insert_header(&format_table_name(table.table_name), &column_names);
    let conflict = build_conflict_clause(&table.conflict_key);

    let statements = records
        .chunks(max_chunk_size)
        .map(|chunk| {
            let mut query = header.clone();
            query.push_str(&build_values_clause(chunk.len(), column_names.len()));
            query.push_str(&conflict);

            let params: Vec<SqlValue> =
                chunk.iter().flat_map(|record| table.row_values(record)).collect();

            BulkStatement { query, params, rows: chunk.len() }
        })
        .collect::<Vec<_>>();

    debug!(
        "{} - built {} statements for {} records, {} rows per statement at most",
        table.table_name,
        statements.len(),
        records.len(),
        max_chunk_size
    );

    Ok(statements)
}
