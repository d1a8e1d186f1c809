//! Table-name parameterized operations.
//!
//! Table and column names arrive as plain strings. They are resolved against
//! the live schema and quoted before being spliced into SQL; values are
//! always bound as parameters.

use super::schema::{columns, quoted_columns, quoted_table};
use crate::db::{Database, Row, Value};
use crate::error::{AppError, Result};
use rusqlite::{Connection, Statement, params, params_from_iter};

impl Database {
    /// Insert one row, with `values` in column declaration order.
    pub fn add_record(&self, table: &str, values: &[Value]) -> Result<()> {
        let conn = self.connect()?;
        let quoted = quoted_table(&conn, table)?;
        let known = columns(&conn, table)?;

        if values.len() != known.len() {
            return Err(AppError::Arity {
                table: table.to_string(),
                expected: known.len(),
                got: values.len(),
            });
        }

        let placeholders = vec!["?"; values.len()].join(", ");
        conn.execute(
            &format!("INSERT INTO {quoted} VALUES ({placeholders})"),
            params_from_iter(values),
        )?;
        Ok(())
    }

    /// Select `columns` (all when `None` or empty) from rows matching every
    /// `column = value` pair in `conditions`.
    pub fn search(
        &self,
        table: &str,
        columns: Option<&[&str]>,
        conditions: &[(&str, Value)],
    ) -> Result<Vec<Row>> {
        let conn = self.connect()?;
        let quoted = quoted_table(&conn, table)?;
        let known = self::columns(&conn, table)?;

        let selected = match columns {
            Some(cols) if !cols.is_empty() => {
                quoted_columns(table, &known, cols.iter().copied())?.join(", ")
            }
            _ => "*".to_string(),
        };

        let mut sql = format!("SELECT {selected} FROM {quoted}");
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clause(table, &known, conditions)?);
        }

        let mut stmt = conn.prepare(&sql)?;
        collect_rows(&mut stmt, conditions.iter().map(|(_, v)| v))
    }

    /// Set each `update_values` pair on rows matching every `conditions`
    /// pair. Returns the number of rows changed.
    pub fn update(
        &self,
        table: &str,
        update_values: &[(&str, Value)],
        conditions: &[(&str, Value)],
    ) -> Result<usize> {
        if update_values.is_empty() {
            return Err(AppError::InvalidInput("Nothing to update".to_string()));
        }
        if conditions.is_empty() {
            return Err(AppError::InvalidInput(
                "Update requires at least one condition".to_string(),
            ));
        }

        let conn = self.connect()?;
        let quoted = quoted_table(&conn, table)?;
        let known = columns(&conn, table)?;

        let assignments = quoted_columns(table, &known, update_values.iter().map(|(c, _)| *c))?
            .into_iter()
            .map(|col| format!("{col} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let filter = where_clause(table, &known, conditions)?;

        let values = update_values.iter().chain(conditions).map(|(_, v)| v);
        let rows = conn.execute(
            &format!("UPDATE {quoted} SET {assignments} WHERE {filter}"),
            params_from_iter(values),
        )?;
        Ok(rows)
    }

    /// Delete rows where `column = key`. Returns the number of rows removed.
    pub fn delete_row_by_key(&self, table: &str, column: &str, key: Value) -> Result<usize> {
        let conn = self.connect()?;
        let quoted = quoted_table(&conn, table)?;
        let known = columns(&conn, table)?;
        let column = quoted_columns(table, &known, [column])?.remove(0);

        let rows = conn.execute(
            &format!("DELETE FROM {quoted} WHERE {column} = ?1"),
            params![key],
        )?;
        Ok(rows)
    }

    /// Every row of `table`.
    pub fn load_data(&self, table: &str) -> Result<Vec<Row>> {
        self.search(table, None, &[])
    }

    /// Up to `n` distinct rows in random order.
    pub fn get_random_data(&self, table: &str, n: usize) -> Result<Vec<Row>> {
        let conn = self.connect()?;
        let quoted = quoted_table(&conn, table)?;
        let limit = i64::try_from(n).unwrap_or(i64::MAX);

        let mut stmt = conn.prepare(&format!("SELECT * FROM {quoted} ORDER BY RANDOM() LIMIT ?1"))?;
        collect_rows(&mut stmt, [Value::Integer(limit)].iter())
    }

    /// Number of rows where `column = value`.
    pub fn get_count_of_relations(&self, table: &str, column: &str, value: Value) -> Result<i64> {
        let conn = self.connect()?;
        count_where(&conn, table, column, &value)
    }
}

fn count_where(conn: &Connection, table: &str, column: &str, value: &Value) -> Result<i64> {
    let quoted = quoted_table(conn, table)?;
    let known = columns(conn, table)?;
    let column = quoted_columns(table, &known, [column])?.remove(0);

    let count = conn.query_row(
        &format!("SELECT COUNT({column}) FROM {quoted} WHERE {column} = ?1"),
        params![value],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn where_clause(table: &str, known: &[String], conditions: &[(&str, Value)]) -> Result<String> {
    Ok(quoted_columns(table, known, conditions.iter().map(|(c, _)| *c))?
        .into_iter()
        .map(|col| format!("{col} = ?"))
        .collect::<Vec<_>>()
        .join(" AND "))
}

fn collect_rows<'v>(
    stmt: &mut Statement<'_>,
    values: impl Iterator<Item = &'v Value>,
) -> Result<Vec<Row>> {
    let width = stmt.column_count();
    let rows = stmt
        .query_map(params_from_iter(values), |row| {
            (0..width)
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Row>>()
        })?
        .collect::<std::result::Result<Vec<Row>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn where_clause_joins_with_and() {
        let known = vec!["email".to_string(), "book_id".to_string()];
        let clause = where_clause(
            "favorites",
            &known,
            &[
                ("email", Value::Text("a@b".into())),
                ("book_id", Value::Integer(1)),
            ],
        )
        .unwrap();
        assert_eq!(clause, "\"email\" = ? AND \"book_id\" = ?");
    }
}
