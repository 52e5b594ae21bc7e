//! PostgreSQL bulk upserts for loading record sets.
//!
//! Records are turned into chunked multi-row `INSERT ... ON CONFLICT DO NOTHING` statements
//! and executed one after the other against a single connection.

mod bulk_upsert;
mod executor;
mod query_builder;

pub use bulk_upsert::{
    build_bulk_upserts, BuildBulkUpsertError, BulkStatement, DEFAULT_CHUNK_SIZE,
    MAX_BIND_PARAMETERS,
};
pub use executor::{execute_statements, ExecuteStatementsError, StatementExecutor};
