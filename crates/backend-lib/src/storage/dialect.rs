//! SQL dialect differences between the supported backends.
use std::borrow::Cow;
use std::fmt;

use super::StoreError;

/// Wire dialect, chosen once from the connection URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    /// Pick the dialect from a connection URL scheme
    pub fn from_url(url: &str) -> Result<Self, StoreError> {
        let scheme = url.split(':').next().unwrap_or_default().to_ascii_lowercase();
        match scheme.as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            _ => Err(StoreError::UnsupportedUrl(scheme)),
        }
    }

    /// Directory name under `create_tables/`
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// Quote a table or column name
    pub fn quote_ident(self, ident: &str) -> String {
        match self {
            Dialect::MySql => format!("`{}`", ident.replace('`', "``")),
            Dialect::Postgres | Dialect::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    /// Rewrite `?` markers into the dialect's positional placeholders.
    ///
    /// Markers inside single-quoted literals are left alone.
    pub fn bind_markers<'a>(self, statement: &'a str) -> Cow<'a, str> {
        if self != Dialect::Postgres || !statement.contains('?') {
            return Cow::Borrowed(statement);
        }

        let mut out = String::with_capacity(statement.len() + 8);
        let mut in_literal = false;
        let mut n = 0;
        for ch in statement.chars() {
            match ch {
                '\'' => {
                    in_literal = !in_literal;
                    out.push(ch);
                },
                '?' if !in_literal => {
                    n += 1;
                    out.push('$');
                    out.push_str(&n.to_string());
                },
                _ => out.push(ch),
            }
        }
        Cow::Owned(out)
    }

    /// Query run on the same connection right after an INSERT
    pub fn last_insert_id_sql(self) -> &'static str {
        match self {
            Dialect::Postgres => "SELECT lastval() AS last_insert_id",
            Dialect::MySql => "SELECT CAST(LAST_INSERT_ID() AS SIGNED) AS last_insert_id",
            Dialect::Sqlite => "SELECT last_insert_rowid() AS last_insert_id",
        }
    }

    pub fn drop_table_sql(self, table: &str) -> String {
        let table = self.quote_ident(table);
        match self {
            Dialect::Postgres => format!("DROP TABLE IF EXISTS {table} CASCADE"),
            Dialect::MySql | Dialect::Sqlite => format!("DROP TABLE IF EXISTS {table}"),
        }
    }

    /// `INSERT INTO t (a, b) VALUES (?, ?)` with quoted identifiers
    pub fn insert_sql(self, table: &str, columns: &[String]) -> String {
        let cols = columns
            .iter()
            .map(|c| self.quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let marks = vec!["?"; columns.len()].join(", ");
        format!("INSERT INTO {} ({cols}) VALUES ({marks})", self.quote_ident(table))
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
