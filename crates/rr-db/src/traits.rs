//! Connection trait definition

use crate::error::{DbError, DbResult};
use rr_core::Value;

/// Result rows of a query, with column names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Database abstraction used by the session and the query executor.
///
/// Parameters bind positionally to `$1, $2, ...` placeholders.
pub trait Connection {
    /// Run a query and collect all rows
    fn query_rows(&self, sql: &str, params: &[Value]) -> DbResult<Rows>;

    /// Run a query and return the first column of the first row, or `Null`
    fn query_scalar(&self, sql: &str, params: &[Value]) -> DbResult<Value> {
        let rows = self.query_rows(sql, params)?;
        Ok(rows
            .rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .unwrap_or(Value::Null))
    }

    /// Execute a statement that modifies data, returns affected rows
    fn execute(&self, sql: &str, params: &[Value]) -> DbResult<usize>;

    /// Execute multiple SQL statements without parameters
    fn execute_batch(&self, sql: &str) -> DbResult<()>;

    fn begin(&self) -> DbResult<()> {
        self.execute_batch("BEGIN TRANSACTION")
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))
    }

    fn commit(&self) -> DbResult<()> {
        self.execute_batch("COMMIT")
            .map_err(|e| DbError::TransactionError(format!("COMMIT failed: {e}")))
    }

    fn rollback(&self) -> DbResult<()> {
        self.execute_batch("ROLLBACK")
            .map_err(|e| DbError::TransactionError(format!("ROLLBACK failed: {e}")))
    }

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// Execute `body` within a `BEGIN` / `COMMIT` transaction, rolling back on
/// error.
pub fn with_transaction<F, T>(conn: &dyn Connection, body: F) -> DbResult<T>
where
    F: FnOnce() -> DbResult<T>,
{
    conn.begin()?;

    let result = body();

    match &result {
        Ok(_) => {
            if let Err(commit_err) = conn.commit() {
                let _ = conn.rollback();
                return Err(commit_err);
            }
        }
        Err(e) => {
            log::debug!("Rolling back transaction on {}: {}", conn.db_type(), e);
            let _ = conn.rollback();
        }
    }
    result
}
