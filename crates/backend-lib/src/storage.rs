// ============================
// portfolio-backend-lib/src/storage.rs
// ============================
//! Persistence gateway: the only place that opens database connections.
//!
//! Every call opens its own connection, runs in autocommit mode and closes
//! the connection before returning. There is no pooling and no transaction
//! spanning more than one statement.
pub mod bootstrap;
mod dialect;

use async_trait::async_trait;
use serde_json::{Map, Number, Value};
use sqlx::any::{AnyArguments, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, AnyConnection, Column, Connection, Row, TypeInfo, ValueRef};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::DatabaseSettings;

pub use bootstrap::{initialize_schema, BootstrapFailure, BootstrapReport, BootstrapStep};
pub use dialect::Dialect;

/// A result row: column name to value
pub type Record = Map<String, Value>;

type AnyQuery<'q> = Query<'q, Any, AnyArguments<'q>>;

/// Errors raised by the gateway
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("unsupported database url scheme: {0}")]
    UnsupportedUrl(String),

    #[error("connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("fixture error: {0}")]
    Fixture(#[from] csv::Error),

    #[error("row has {found} values for {expected} columns")]
    Arity { expected: usize, found: usize },
}

/// A positionally bound statement parameter
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlParam {
    /// Interpret a fixture cell: `NULL`/empty become NULL, canonical integers stay integers
    pub fn from_fixture(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("NULL") {
            return SqlParam::Null;
        }
        match trimmed.parse::<i64>() {
            Ok(n) if n.to_string() == trimmed => SqlParam::Int(n),
            _ => SqlParam::Text(cell.to_string()),
        }
    }

    /// Text equal to `NULL` (any case) or blank is stored as NULL
    pub fn normalized(self) -> Self {
        match self {
            SqlParam::Text(s) if s.trim().is_empty() || s.trim().eq_ignore_ascii_case("NULL") => {
                SqlParam::Null
            },
            other => other,
        }
    }

    fn bind_to<'q>(&self, query: AnyQuery<'q>) -> AnyQuery<'q> {
        match self {
            SqlParam::Null => query.bind(None::<String>),
            SqlParam::Int(v) => query.bind(*v),
            SqlParam::Float(v) => query.bind(*v),
            SqlParam::Text(v) => query.bind(v.clone()),
        }
    }
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(value)
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::Int(value)
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlParam::Null, Into::into)
    }
}

/// Trait for database gateways
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Dialect the statements are written for
    fn dialect(&self) -> Dialect;

    /// Run one parameterized statement and return its rows.
    ///
    /// Statements use `?` markers. An INSERT returns a single
    /// `{"last_insert_id": n}` record when the backend can report one.
    async fn execute(&self, statement: &str, params: &[SqlParam]) -> Result<Vec<Record>, StoreError>;

    /// Run a raw, possibly multi-statement, script without parameters
    async fn execute_script(&self, script: &str) -> Result<(), StoreError>;

    /// Like [`execute`](Gateway::execute) but failures are logged and become an empty result
    async fn query(&self, statement: &str, params: &[SqlParam]) -> Vec<Record> {
        match self.execute(statement, params).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, statement, "query failed");
                Vec::new()
            },
        }
    }

    /// Insert each row separately; a failing row is logged and skipped.
    ///
    /// The result has one entry per input row holding the generated id, if any.
    async fn insert_rows(
        &self,
        table: &str,
        columns: &[String],
        rows: Vec<Vec<SqlParam>>,
    ) -> Vec<Result<Option<i64>, StoreError>> {
        let sql = self.dialect().insert_sql(table, columns);
        let mut results = Vec::with_capacity(rows.len());

        for row in rows {
            if row.len() != columns.len() {
                warn!(table, expected = columns.len(), found = row.len(), "skipping row with wrong arity");
                results.push(Err(StoreError::Arity {
                    expected: columns.len(),
                    found: row.len(),
                }));
                continue;
            }

            let params: Vec<SqlParam> = row.into_iter().map(SqlParam::normalized).collect();
            match self.execute(&sql, &params).await {
                Ok(records) => results.push(Ok(last_insert_id(&records))),
                Err(e) => {
                    warn!(table, error = %e, row = ?params, "failed to insert row");
                    results.push(Err(e));
                },
            }
        }

        results
    }
}

/// Pull the generated id out of an INSERT result
pub fn last_insert_id(records: &[Record]) -> Option<i64> {
    records
        .first()
        .and_then(|r| r.get("last_insert_id"))
        .and_then(Value::as_i64)
}

/// sqlx-backed gateway that connects per call
#[derive(Clone)]
pub struct Database {
    url: String,
    dialect: Dialect,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Create a gateway for a connection URL; nothing is opened yet
    pub fn new(url: impl Into<String>) -> Result<Self, StoreError> {
        sqlx::any::install_default_drivers();
        let url = url.into();
        let dialect = Dialect::from_url(&url)?;
        Ok(Self { url, dialect })
    }

    pub fn from_settings(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        Self::new(settings.connection_url())
    }

    async fn connect(&self) -> Result<AnyConnection, StoreError> {
        AnyConnection::connect(&self.url)
            .await
            .map_err(StoreError::Connect)
    }

    async fn run(
        &self,
        conn: &mut AnyConnection,
        statement: &str,
        params: &[SqlParam],
    ) -> Result<Vec<Record>, StoreError> {
        let sql = self.dialect.bind_markers(statement);
        let query = params
            .iter()
            .fold(sqlx::query::<Any>(&sql), |q, p| p.bind_to(q));
        let rows = query.fetch_all(&mut *conn).await?;

        if !is_plain_insert(statement) {
            return rows.iter().map(row_to_record).collect();
        }

        match sqlx::query::<Any>(self.dialect.last_insert_id_sql())
            .fetch_optional(&mut *conn)
            .await
        {
            Ok(Some(row)) => Ok(vec![row_to_record(&row)?]),
            Ok(None) => Ok(Vec::new()),
            Err(e) => {
                debug!(error = %e, "backend reported no insert id");
                Ok(Vec::new())
            },
        }
    }
}

#[async_trait]
impl Gateway for Database {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn execute(&self, statement: &str, params: &[SqlParam]) -> Result<Vec<Record>, StoreError> {
        debug!(dialect = %self.dialect, statement, params = params.len(), "execute");
        let mut conn = self.connect().await?;
        let result = self.run(&mut conn, statement, params).await;
        if let Err(e) = conn.close().await {
            debug!(error = %e, "error closing connection");
        }
        result
    }

    async fn execute_script(&self, script: &str) -> Result<(), StoreError> {
        let mut conn = self.connect().await?;
        let result = sqlx::Executor::execute(&mut conn, sqlx::raw_sql(script)).await;
        if let Err(e) = conn.close().await {
            debug!(error = %e, "error closing connection");
        }
        result.map(|_| ()).map_err(StoreError::from)
    }
}

fn is_plain_insert(statement: &str) -> bool {
    let head = statement.trim_start();
    head.get(..6).is_some_and(|s| s.eq_ignore_ascii_case("insert"))
        && !has_keyword(statement, "RETURNING")
}

/// Whether `keyword` appears as a bare word outside quoted literals and identifiers
fn has_keyword(statement: &str, keyword: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut word = String::new();

    for c in statement.chars().chain(std::iter::once(' ')) {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        if c.is_ascii_alphanumeric() || c == '_' {
            word.push(c);
            continue;
        }
        if word.eq_ignore_ascii_case(keyword) {
            return true;
        }
        word.clear();
        if matches!(c, '\'' | '"' | '`') {
            quote = Some(c);
        }
    }
    false
}

fn row_to_record(row: &AnyRow) -> Result<Record, StoreError> {
    let mut record = Record::new();
    for column in row.columns() {
        let value = decode_column(row, column.ordinal())?;
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

fn decode_column(row: &AnyRow, idx: usize) -> Result<Value, sqlx::Error> {
    let kind = {
        let raw = row.try_get_raw(idx)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        raw.type_info().name().to_string()
    };

    let value = match kind.as_str() {
        "BOOLEAN" => Value::Bool(row.try_get::<bool, _>(idx)?),
        "SMALLINT" => Value::from(row.try_get::<i16, _>(idx)?),
        "INTEGER" => Value::from(row.try_get::<i32, _>(idx)?),
        "BIGINT" => Value::from(row.try_get::<i64, _>(idx)?),
        "REAL" => float_value(f64::from(row.try_get::<f32, _>(idx)?)),
        "DOUBLE" => float_value(row.try_get::<f64, _>(idx)?),
        "BLOB" => {
            let bytes = row.try_get::<Vec<u8>, _>(idx)?;
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        },
        _ => Value::String(row.try_get::<String, _>(idx)?),
    };
    Ok(value)
}

fn float_value(v: f64) -> Value {
    Number::from_f64(v).map_or(Value::Null, Value::Number)
}
