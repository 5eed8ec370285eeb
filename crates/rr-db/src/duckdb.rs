//! DuckDB connection backend

use crate::error::{DbError, DbResult};
use crate::traits::{Connection, Rows};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use duckdb::types::{TimeUnit, ToSql, ToSqlOutput, Value as DuckValue};
use rr_core::Value;
use std::path::Path;

/// DuckDB connection
pub struct DuckDbConnection {
    conn: duckdb::Connection,
}

impl DuckDbConnection {
    /// Create a new in-memory DuckDB connection
    pub fn open_memory() -> DbResult<Self> {
        let conn = duckdb::Connection::open_in_memory()
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Open (or create) a DuckDB database file
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = duckdb::Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{}: {}", path.display(), e)))?;
        Ok(Self { conn })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::open_memory()
        } else {
            Self::open(Path::new(path))
        }
    }

    /// Borrow the underlying DuckDB connection
    pub fn conn(&self) -> &duckdb::Connection {
        &self.conn
    }
}

impl Connection for DuckDbConnection {
    fn query_rows(&self, sql: &str, params: &[Value]) -> DbResult<Rows> {
        log::debug!("duckdb query: {} ({} params)", sql, params.len());
        check_params(params)?;
        let mut stmt = self.conn.prepare(sql)?;

        // DuckDB panics on column_count() before execution: collect rows first.
        let raw_rows: Vec<Vec<DuckValue>> = stmt
            .query_map(duckdb::params_from_iter(params.iter().map(SqlParam)), |row| {
                let col_count = row.as_ref().column_count();
                (0..col_count)
                    .map(|i| row.get::<_, DuckValue>(i))
                    .collect::<Result<Vec<_>, _>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let columns = (0..stmt.column_count())
            .map(|i| stmt.column_name(i).map_or("?".to_string(), |v| v.to_string()))
            .collect();

        let rows = raw_rows
            .into_iter()
            .map(|row| row.into_iter().map(from_duck_value).collect())
            .collect::<DbResult<Vec<Vec<Value>>>>()?;

        Ok(Rows { columns, rows })
    }

    fn execute(&self, sql: &str, params: &[Value]) -> DbResult<usize> {
        log::debug!("duckdb execute: {} ({} params)", sql, params.len());
        check_params(params)?;
        self.conn
            .execute(sql, duckdb::params_from_iter(params.iter().map(SqlParam)))
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))
    }

    fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| DbError::ExecutionError(e.to_string()))
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

fn check_params(params: &[Value]) -> DbResult<()> {
    match params
        .iter()
        .find(|p| matches!(p, Value::List(_) | Value::Ref(_)))
    {
        Some(p) => Err(DbError::UnsupportedParam(format!(
            "{} value '{}' must be expanded before binding",
            p.type_name(),
            p
        ))),
        None => Ok(()),
    }
}

/// Binding adapter for runtime values
struct SqlParam<'a>(&'a Value);

impl ToSql for SqlParam<'_> {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        let value = match self.0 {
            Value::Null => DuckValue::Null,
            Value::Bool(b) => DuckValue::Boolean(*b),
            Value::Int(n) => DuckValue::BigInt(*n),
            Value::Float(f) => DuckValue::Double(*f),
            Value::Text(s) => DuckValue::Text(s.clone()),
            Value::DateTime(dt) => {
                DuckValue::Timestamp(TimeUnit::Microsecond, dt.and_utc().timestamp_micros())
            }
            other => {
                return Err(duckdb::Error::ToSqlConversionFailure(
                    format!("cannot bind {} value", other.type_name()).into(),
                ))
            }
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

fn from_duck_value(value: DuckValue) -> DbResult<Value> {
    Ok(match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Bool(b),
        DuckValue::TinyInt(n) => Value::Int(n.into()),
        DuckValue::SmallInt(n) => Value::Int(n.into()),
        DuckValue::Int(n) => Value::Int(n.into()),
        DuckValue::BigInt(n) => Value::Int(n),
        DuckValue::UTinyInt(n) => Value::Int(n.into()),
        DuckValue::USmallInt(n) => Value::Int(n.into()),
        DuckValue::UInt(n) => Value::Int(n.into()),
        DuckValue::UBigInt(n) => Value::Int(
            i64::try_from(n).map_err(|_| DbError::UnsupportedType(format!("UBIGINT {n}")))?,
        ),
        DuckValue::HugeInt(n) => Value::Int(
            i64::try_from(n).map_err(|_| DbError::UnsupportedType(format!("HUGEINT {n}")))?,
        ),
        DuckValue::Float(f) => Value::Float(f.into()),
        DuckValue::Double(f) => Value::Float(f),
        DuckValue::Decimal(d) => {
            let text = d.to_string();
            Value::Float(
                text.parse::<f64>()
                    .map_err(|_| DbError::UnsupportedType(format!("DECIMAL {text}")))?,
            )
        }
        DuckValue::Text(s) => Value::Text(s),
        DuckValue::Enum(s) => Value::Text(s),
        DuckValue::Timestamp(unit, raw) => Value::DateTime(timestamp_to_datetime(unit, raw)?),
        DuckValue::Date32(days) => Value::DateTime(date32_to_datetime(days)?),
        other => return Err(DbError::UnsupportedType(format!("{other:?}"))),
    })
}

fn timestamp_to_datetime(unit: TimeUnit, raw: i64) -> DbResult<NaiveDateTime> {
    let micros = match unit {
        TimeUnit::Second => raw.checked_mul(1_000_000),
        TimeUnit::Millisecond => raw.checked_mul(1_000),
        TimeUnit::Microsecond => Some(raw),
        TimeUnit::Nanosecond => Some(raw / 1_000),
    };
    micros
        .and_then(DateTime::from_timestamp_micros)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| DbError::UnsupportedType(format!("TIMESTAMP out of range: {raw}")))
}

fn date32_to_datetime(days: i32) -> DbResult<NaiveDateTime> {
    // Date32 counts days from 1970-01-01; chrono counts from 0001-01-01 (day 1).
    const UNIX_EPOCH_FROM_CE: i32 = 719_163;
    days.checked_add(UNIX_EPOCH_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| DbError::UnsupportedType(format!("DATE out of range: {days}")))
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
