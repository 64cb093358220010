use std::collections::HashSet;
use std::path::Path;

use pctcore::RunRange;
use rusqlite::{params, Connection};

use crate::error::{PairError, Result};
use crate::io::columns::{PhaseSpaceColumns, REQUIRED_FIELDS};

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Phase space stored as one SQLite table per plane, one column per field.
#[derive(Debug)]
pub struct SqlitePhaseSpace {
    pub connection: Connection,
    pub source: String,
}

impl SqlitePhaseSpace {
    pub fn open(path: &Path) -> Result<Self> {
        let connection = Connection::open(path)?;
        Ok(SqlitePhaseSpace {
            connection,
            source: path.display().to_string(),
        })
    }

    pub fn from_connection(connection: Connection, source: &str) -> Self {
        SqlitePhaseSpace {
            connection,
            source: source.to_string(),
        }
    }

    pub fn column_names(&self, table: &str) -> Result<HashSet<String>> {
        let mut stmt = self
            .connection
            .prepare(&format!("PRAGMA table_info({})", quote_identifier(table)))?;
        let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
        let mut columns = HashSet::new();
        for name in names {
            columns.insert(name?);
        }
        Ok(columns)
    }

    /// Fails on the first required field the table does not have. A table
    /// that does not exist has no columns at all.
    pub fn check_schema(&self, table: &str) -> Result<()> {
        let columns = self.column_names(table)?;
        let source_name = format!("{}:{}", self.source, table);
        for field in REQUIRED_FIELDS {
            if !columns.contains(field) {
                return Err(PairError::missing_field(&source_name, field));
            }
        }
        Ok(())
    }

    /// Read the rows of `table` whose run lies in `run_range`, in table order.
    pub fn read_columns(&self, table: &str, run_range: RunRange) -> Result<PhaseSpaceColumns> {
        self.check_schema(table)?;

        let select = REQUIRED_FIELDS
            .iter()
            .map(|field| quote_identifier(field))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "SELECT {} FROM {} WHERE RunID >= ?1 AND RunID < ?2 ORDER BY rowid",
            select,
            quote_identifier(table)
        );
        let max_run = run_range.max_run.map_or(i64::MAX, i64::from);

        let mut stmt = self.connection.prepare(&query)?;
        let mut rows = stmt.query(params![run_range.min_run, max_run])?;

        let mut columns = PhaseSpaceColumns::default();
        while let Some(row) = rows.next()? {
            columns.run_id.push(row.get(0)?);
            columns.event_id.push(row.get(1)?);
            columns.track_id.push(row.get(2)?);
            columns.kinetic_energy.push(row.get(3)?);
            columns.global_time.push(row.get(4)?);
            for axis in 0..3 {
                columns.position[axis].push(row.get(5 + axis)?);
                columns.direction[axis].push(row.get(8 + axis)?);
            }
        }
        Ok(columns)
    }

    /// Store columns as `table`, replacing an existing table of that name.
    pub fn write_columns(&mut self, table: &str, columns: &PhaseSpaceColumns) -> Result<()> {
        let table = quote_identifier(table);
        let definitions = REQUIRED_FIELDS
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let sql_type = if i < 3 { "INTEGER" } else { "REAL" };
                format!("{} {}", quote_identifier(field), sql_type)
            })
            .collect::<Vec<_>>()
            .join(", ");

        let tx = self.connection.transaction()?;
        tx.execute(&format!("DROP TABLE IF EXISTS {}", table), [])?;
        tx.execute(&format!("CREATE TABLE {} ({})", table, definitions), [])?;
        {
            let placeholders = (1..=REQUIRED_FIELDS.len())
                .map(|i| format!("?{}", i))
                .collect::<Vec<_>>()
                .join(", ");
            let mut stmt = tx.prepare(&format!("INSERT INTO {} VALUES ({})", table, placeholders))?;
            for i in 0..columns.len() {
                stmt.execute(params![
                    columns.run_id[i],
                    columns.event_id[i],
                    columns.track_id[i],
                    columns.kinetic_energy[i],
                    columns.global_time[i],
                    columns.position[0][i],
                    columns.position[1][i],
                    columns.position[2][i],
                    columns.direction[0][i],
                    columns.direction[1][i],
                    columns.direction[2][i],
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

/// Open `path` and read `table`, see [`SqlitePhaseSpace::read_columns`].
pub fn read_sqlite_columns(path: &Path, table: &str, run_range: RunRange) -> Result<PhaseSpaceColumns> {
    SqlitePhaseSpace::open(path)?.read_columns(table, run_range)
}
