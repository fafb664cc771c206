//! Shared helpers for reading DuckDB row columns as strings.

/// Read a column value as text, trying multiple DuckDB types.
///
/// DuckDB integer columns return an error for `Option<String>`, so we try
/// String -> i64 -> f64 -> bool. SQL NULL yields `None`.
pub(crate) fn get_column_as_string(row: &duckdb::Row<'_>, idx: usize) -> Option<String> {
    if let Ok(v) = row.get::<_, Option<String>>(idx) {
        return v;
    }
    if let Ok(v) = row.get::<_, Option<i64>>(idx) {
        return v.map(|n| n.to_string());
    }
    if let Ok(v) = row.get::<_, Option<f64>>(idx) {
        return v.map(|f| f.to_string());
    }
    if let Ok(v) = row.get::<_, Option<bool>>(idx) {
        return v.map(|b| b.to_string());
    }
    None
}

/// Execute a prepared statement and collect all rows as text.
///
/// DuckDB panics on `stmt.column_count()` before execution, so the column
/// count is read from each row's statement instead.
pub(crate) fn collect_rows(
    stmt: &mut duckdb::Statement<'_>,
) -> duckdb::Result<Vec<Vec<Option<String>>>> {
    stmt.query_map([], |row| {
        let col_count = row.as_ref().column_count();
        Ok((0..col_count)
            .map(|i| get_column_as_string(row, i))
            .collect())
    })?
    .collect()
}
