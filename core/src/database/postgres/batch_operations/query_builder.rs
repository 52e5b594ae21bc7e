//! SQL text generation for PostgreSQL bulk upserts.
//!
//! Every function here is pure string building; parameters are never inlined.

use crate::database::batch_operations::RESERVED_KEYWORDS;

/// Quotes an identifier if it's a reserved keyword.
#[inline]
pub fn quote_identifier(name: &str) -> String {
    if RESERVED_KEYWORDS.contains(&name) {
        format!("\"{}\"", name)
    } else {
        name.to_string()
    }
}

/// Formats a table name, handling schema.table format.
pub fn format_table_name(table_name: &str) -> String {
    if table_name.contains('.') {
        let parts: Vec<&str> = table_name.split('.').collect();
        if parts.len() == 2 {
            let schema = parts[0].trim_matches('"');
            let table = parts[1].trim_matches('"');
            format!("\"{}\".\"{}\"", schema, table)
        } else {
            table_name.to_string()
        }
    } else {
        quote_identifier(table_name)
    }
}

fn join_identifiers(columns: &[&str]) -> String {
    columns.iter().map(|col| quote_identifier(col)).collect::<Vec<_>>().join(", ")
}

/// Builds `INSERT INTO table (col1, col2, ...) VALUES `
pub fn build_insert_header(formatted_table_name: &str, column_names: &[&str]) -> String {
    format!("INSERT INTO {} ({}) VALUES ", formatted_table_name, join_identifiers(column_names))
}

/// Builds the value groups for `rows` rows of `total_columns` columns.
///
/// Row `i`, column `j` gets placeholder `$(i * total_columns + j + 1)`, so indices run from
/// `$1` to `$(rows * total_columns)` without gaps.
pub fn build_values_clause(rows: usize, total_columns: usize) -> String {
    let mut values = String::with_capacity(rows * total_columns * 7);

    for i in 0..rows {
        if i > 0 {
            values.push(',');
        }
        values.push('(');
        for j in 0..total_columns {
            if j > 0 {
                values.push(',');
            }
            values.push('$');
            values.push_str(&(i * total_columns + j + 1).to_string());
        }
        values.push(')');
    }

    values
}

/// Builds the conflict clause. Duplicates on the conflict key are always skipped, never updated.
pub fn build_conflict_clause(conflict_columns: &[&str]) -> String {
    if conflict_columns.is_empty() {
        " ON CONFLICT DO NOTHING".to_string()
    } else {
        format!(" ON CONFLICT ({}) DO NOTHING", join_identifiers(conflict_columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("index"), "\"index\"");
        assert_eq!(quote_identifier("index_name"), "index_name");
    }

    #[test]
    fn test_format_table_name() {
        assert_eq!(format_table_name("prices"), "prices");
        assert_eq!(format_table_name("market.prices"), "\"market\".\"prices\"");
        assert_eq!(format_table_name("order"), "\"order\"");
    }

    #[test]
    fn test_build_insert_header() {
        assert_eq!(
            build_insert_header("prices", &["date", "price", "instrument_id"]),
            "INSERT INTO prices (date, price, instrument_id) VALUES "
        );
    }

    #[test]
    fn test_build_values_clause() {
        assert_eq!(build_values_clause(1, 3), "($1,$2,$3)");
        assert_eq!(build_values_clause(2, 2), "($1,$2),($3,$4)");
        assert_eq!(build_values_clause(3, 1), "($1),($2),($3)");
        assert_eq!(build_values_clause(0, 4), "");
    }

    #[test]
    fn test_build_conflict_clause() {
        assert_eq!(
            build_conflict_clause(&["date", "currency"]),
            " ON CONFLICT (date, currency) DO NOTHING"
        );
        assert_eq!(build_conflict_clause(&[]), " ON CONFLICT DO NOTHING");
    }
}
