//! Declarative row-matching assertions.
//!
//! [`assert_table`] builds a [`TableAssertion`] for one table;
//! [`TableAssertion::contains_exactly_one_row_matching`] then checks that
//! exactly one row satisfies an [`ExpectedRow`] descriptor. Matching is by
//! value equality per declared column, with no tolerance for floating point
//! columns.

use std::fmt;

use pg_escape::quote_identifier;
use postgres::types::TableName;
use sqlx::PgPool;

use crate::error::{ErrorKind, HarnessResult};
use crate::{bail, harness_error};

/// A single value expected in a column.
///
/// The variants cover the column types the harness asserts on; each one maps
/// to the Postgres type it is bound as.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Bool(bool),
    /// Bound as `int8`. Postgres compares it against smaller integer columns
    /// through the built-in cross-type operators.
    Int(i64),
    /// Bound as `float8` and compared with exact equality, no tolerance.
    /// Exact matching is only well-defined against `double precision`
    /// columns; `real` and `numeric` columns go through a cast first, which
    /// can make exact comparisons fail for values that survived storage.
    Float(f64),
    Text(String),
    /// Rendered as an `is null` predicate instead of an equality bind.
    Null,
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Bool(value) => write!(f, "{value}"),
            SqlValue::Int(value) => write!(f, "{value}"),
            SqlValue::Float(value) => write!(f, "{value}"),
            SqlValue::Text(value) => write!(f, "{value:?}"),
            SqlValue::Null => write!(f, "null"),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<i16> for SqlValue {
    fn from(value: i16) -> Self {
        SqlValue::Int(value.into())
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value.into())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<f32> for SqlValue {
    fn from(value: f32) -> Self {
        SqlValue::Float(value.into())
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_owned())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

/// An ordered set of column/value pairs describing the row a table is
/// expected to contain.
///
/// The descriptor only drives equality-filtered queries; it is never
/// persisted. Columns not named in the descriptor are not constrained, and
/// an empty descriptor matches every row.
#[derive(Debug, Clone, Default)]
pub struct ExpectedRow {
    columns: Vec<(String, SqlValue)>,
}

impl ExpectedRow {
    pub fn new() -> ExpectedRow {
        Self::default()
    }

    /// Adds an expectation for `column`, replacing any previous one.
    pub fn with(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        let value = value.into();

        match self.columns.iter_mut().find(|(name, _)| name == column) {
            Some((_, existing)) => *existing = value,
            None => self.columns.push((column.to_owned(), value)),
        }

        self
    }

    /// Returns the declared column expectations, in insertion order.
    pub fn columns(&self) -> &[(String, SqlValue)] {
        &self.columns
    }
}

impl fmt::Display for ExpectedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (index, (column, value)) in self.columns.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{column}: {value}")?;
        }
        write!(f, "}}")
    }
}

/// Starts an assertion against the given table.
///
/// The table can be bare (`"products"`, defaulting to the `public` schema)
/// or schema-qualified (`"staging.products"`).
pub fn assert_table<'a>(pool: &'a PgPool, table: impl Into<TableName>) -> TableAssertion<'a> {
    TableAssertion {
        pool,
        table: table.into(),
    }
}

/// Assertion entry point for a single table.
pub struct TableAssertion<'a> {
    pool: &'a PgPool,
    table: TableName,
}

impl TableAssertion<'_> {
    /// Returns the total number of rows in the table.
    pub async fn row_count(&self) -> HarnessResult<i64> {
        self.count_rows_matching(&ExpectedRow::new()).await
    }

    /// Returns how many rows match the expected descriptor.
    pub async fn count_rows_matching(&self, expected: &ExpectedRow) -> HarnessResult<i64> {
        let sql = build_count_query(&self.table, expected);

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for (_, value) in expected.columns() {
            query = match value {
                SqlValue::Bool(value) => query.bind(*value),
                SqlValue::Int(value) => query.bind(*value),
                SqlValue::Float(value) => query.bind(*value),
                SqlValue::Text(value) => query.bind(value.clone()),
                // Null expectations become `is null` predicates with no bind.
                SqlValue::Null => query,
            };
        }

        query.fetch_one(self.pool).await.map_err(|err| {
            harness_error!(
                ErrorKind::QueryFailed,
                "failed to count matching rows",
                sql,
                source: err
            )
        })
    }

    /// Asserts that exactly one row matches the expected descriptor.
    ///
    /// Zero matches and more-than-one matches both fail with
    /// [`ErrorKind::AssertionFailed`]; the error detail carries the expected
    /// descriptor and the actual match count for diagnostics.
    pub async fn contains_exactly_one_row_matching(
        &self,
        expected: &ExpectedRow,
    ) -> HarnessResult<()> {
        let matches = self.count_rows_matching(expected).await?;

        if matches != 1 {
            bail!(
                ErrorKind::AssertionFailed,
                "expected exactly one matching row",
                format!("table {} has {matches} rows matching {expected}", self.table)
            );
        }

        Ok(())
    }
}

/// Renders the count query for the expected descriptor.
///
/// One equality predicate per declared column, `is null` for null
/// expectations, identifiers quoted so mixed-case column names survive.
fn build_count_query(table: &TableName, expected: &ExpectedRow) -> String {
    let mut sql = format!("select count(*) from {}", table.as_quoted_identifier());

    let mut placeholder = 0;
    for (index, (column, value)) in expected.columns().iter().enumerate() {
        sql.push_str(if index == 0 { " where " } else { " and " });

        let column = quote_identifier(column);
        match value {
            SqlValue::Null => {
                sql.push_str(&format!("{column} is null"));
            }
            _ => {
                placeholder += 1;
                sql.push_str(&format!("{column} = ${placeholder}"));
            }
        }
    }

    sql
}
