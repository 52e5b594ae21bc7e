use crate::database::postgres::sql_type_wrapper::SqlValue;

/// Reserved SQL keywords that need quoting.
pub const RESERVED_KEYWORDS: &[&str] =
    &["group", "user", "order", "table", "index", "primary", "key"];

/// Definition of a column for bulk upserts: the column name and how to read its value
/// out of a record.
pub struct ColumnDefinition<R> {
    pub name: &'static str,
    pub extract: fn(&R) -> SqlValue,
}

impl<R> Clone for ColumnDefinition<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for ColumnDefinition<R> {}

impl<R> std::fmt::Debug for ColumnDefinition<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnDefinition").field("name", &self.name).finish()
    }
}

/// Creates a column definition for bulk upserts.
pub fn column<R>(name: &'static str, extract: fn(&R) -> SqlValue) -> ColumnDefinition<R> {
    ColumnDefinition { name, extract }
}

/// Everything needed to write records of type `R` into one table.
///
/// The order of `columns` is the order of the INSERT column list and of the flattened
/// arguments. `conflict_key` names the columns of the table's uniqueness constraint.
#[derive(Debug, Clone)]
pub struct TableSpec<R> {
    pub table_name: &'static str,
    pub columns: Vec<ColumnDefinition<R>>,
    pub conflict_key: Vec<&'static str>,
}

impl<R> TableSpec<R> {
    pub fn new(
        table_name: &'static str,
        columns: Vec<ColumnDefinition<R>>,
        conflict_key: Vec<&'static str>,
    ) -> Self {
        TableSpec { table_name, columns, conflict_key }
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|column| column.name).collect()
    }

    /// Reads every column of `record` in column order.
    pub fn row_values(&self, record: &R) -> Vec<SqlValue> {
        self.columns.iter().map(|column| (column.extract)(record)).collect()
    }
}

/// A record type that maps onto a single table.
pub trait TableRecord: Sized {
    fn table_spec() -> TableSpec<Self>;
}
