//! Schema bootstrap: optional purge, table creation and fixture seeding.
//!
//! Layout under the data directory:
//! - `create_tables/<dialect>/<table>.sql`
//! - `initial_data/<table>.csv` (header row of column names, then values)
//!
//! Nothing here aborts: each failed step is logged, recorded in the report
//! and bootstrap moves on to the next table.
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{Gateway, SqlParam, StoreError};

/// Tables in dependency order (parents first)
pub const CREATE_ORDER: [&str; 6] = [
    "users",
    "institutions",
    "positions",
    "experiences",
    "skills",
    "feedback",
];

/// Tables in the order they must be dropped (children first)
pub const DROP_ORDER: [&str; 6] = [
    "skills",
    "experiences",
    "positions",
    "institutions",
    "feedback",
    "users",
];

/// Bootstrap phase a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStep {
    Drop,
    Create,
    Seed,
}

impl fmt::Display for BootstrapStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BootstrapStep::Drop => "drop",
            BootstrapStep::Create => "create",
            BootstrapStep::Seed => "seed",
        })
    }
}

/// A non-fatal bootstrap failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapFailure {
    pub table: String,
    pub step: BootstrapStep,
    pub message: String,
}

/// What a bootstrap run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub dropped: Vec<String>,
    pub created: Vec<String>,
    /// Rows inserted per table, in seeding order
    pub seeded: Vec<(String, usize)>,
    pub failures: Vec<BootstrapFailure>,
}

impl BootstrapReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn rows_seeded(&self, table: &str) -> usize {
        self.seeded
            .iter()
            .find(|(t, _)| t == table)
            .map_or(0, |(_, n)| *n)
    }

    fn fail(&mut self, table: &str, step: BootstrapStep, err: impl fmt::Display) {
        warn!(table, %step, error = %err, "bootstrap step failed");
        self.failures.push(BootstrapFailure {
            table: table.to_string(),
            step,
            message: err.to_string(),
        });
    }
}

/// Parsed seed file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fixture {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlParam>>,
}

/// Parse CSV fixture text
pub fn parse_fixture(data: &[u8]) -> Result<Fixture, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(data);

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if columns.iter().all(String::is_empty) {
        return Ok(Fixture::default());
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(SqlParam::from_fixture).collect());
    }
    Ok(Fixture { columns, rows })
}

/// Read `initial_data/<table>.csv`
pub async fn read_fixture(path: &Path) -> Result<Fixture, StoreError> {
    let data = tokio::fs::read(path).await?;
    parse_fixture(&data)
}

fn create_path(data_dir: &Path, dialect: &str, table: &str) -> PathBuf {
    data_dir
        .join("create_tables")
        .join(dialect)
        .join(format!("{table}.sql"))
}

fn fixture_path(data_dir: &Path, table: &str) -> PathBuf {
    data_dir.join("initial_data").join(format!("{table}.csv"))
}

/// Drop (if `purge`), create and seed every table
pub async fn initialize_schema(
    gateway: &dyn Gateway,
    data_dir: &Path,
    purge: bool,
) -> BootstrapReport {
    let dialect = gateway.dialect();
    let mut report = BootstrapReport::default();
    info!(%dialect, data_dir = %data_dir.display(), purge, "initializing schema");

    if purge {
        for table in DROP_ORDER {
            match gateway.execute_script(&dialect.drop_table_sql(table)).await {
                Ok(()) => report.dropped.push(table.to_string()),
                Err(e) => report.fail(table, BootstrapStep::Drop, e),
            }
        }
    }

    for table in CREATE_ORDER {
        let path = create_path(data_dir, dialect.name(), table);
        let statement = match tokio::fs::read_to_string(&path).await {
            Ok(sql) => sql,
            Err(e) => {
                report.fail(table, BootstrapStep::Create, format!("{}: {e}", path.display()));
                continue;
            },
        };
        match gateway.execute_script(&statement).await {
            Ok(()) => report.created.push(table.to_string()),
            Err(e) => report.fail(table, BootstrapStep::Create, e),
        }
    }

    for table in CREATE_ORDER {
        let path = fixture_path(data_dir, table);
        let fixture = match read_fixture(&path).await {
            Ok(f) => f,
            Err(e) => {
                report.fail(table, BootstrapStep::Seed, format!("{}: {e}", path.display()));
                continue;
            },
        };
        if fixture.rows.is_empty() {
            info!(table, "no initial data");
            report.seeded.push((table.to_string(), 0));
            continue;
        }

        let results = gateway
            .insert_rows(table, &fixture.columns, fixture.rows)
            .await;
        let mut inserted = 0;
        for result in results {
            match result {
                Ok(_) => inserted += 1,
                Err(e) => report.fail(table, BootstrapStep::Seed, e),
            }
        }
        info!(table, inserted, "seeded table");
        report.seeded.push((table.to_string(), inserted));
    }

    info!(
        created = report.created.len(),
        failures = report.failures.len(),
        "done creating and populating tables"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_header_and_values() {
        let csv = b"inst_id,type,name,zip\n1,Academia,Michigan State University,48824\n2,Industry,\"Acme, Inc.\",NULL\n";
        let fixture = parse_fixture(csv).unwrap();
        assert_eq!(fixture.columns, vec!["inst_id", "type", "name", "zip"]);
        assert_eq!(fixture.rows.len(), 2);
        assert_eq!(fixture.rows[0][0], SqlParam::Int(1));
        assert_eq!(fixture.rows[1][2], SqlParam::Text("Acme, Inc.".into()));
        assert_eq!(fixture.rows[1][3], SqlParam::Null);
    }

    #[test]
    fn header_only_fixture_has_no_rows() {
        let fixture = parse_fixture(b"user_id,email,password,role,name\n").unwrap();
        assert_eq!(fixture.columns.len(), 5);
        assert!(fixture.rows.is_empty());

        let empty = parse_fixture(b"").unwrap();
        assert!(empty.columns.is_empty());
        assert!(empty.rows.is_empty());
    }

    #[test]
    fn ragged_rows_are_kept_for_the_insert_step() {
        let fixture = parse_fixture(b"a,b\n1,2\n3\n4,5\n").unwrap();
        assert_eq!(fixture.rows.len(), 3);
        assert_eq!(fixture.rows[1], vec![SqlParam::Int(3)]);
        assert_eq!(fixture.rows[2], vec![SqlParam::Int(4), SqlParam::Int(5)]);
    }

    #[test]
    fn hierarchy_drops_children_first() {
        let hierarchy = ["institutions", "positions", "experiences", "skills"];
        let drop_pos = |t: &str| DROP_ORDER.iter().position(|c| *c == t).unwrap();
        for pair in hierarchy.windows(2) {
            assert!(drop_pos(pair[1]) < drop_pos(pair[0]));
        }
        assert_eq!(DROP_ORDER.last(), Some(&"users"));
    }
}
