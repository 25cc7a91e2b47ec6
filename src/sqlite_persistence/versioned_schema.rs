use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection};

/// Column default for "seconds since the epoch, at insert time".
pub const DEFAULT_TIMESTAMP: &str = "(cast(strftime('%s','now') as int))";

/// Offset added to every schema version stored in `PRAGMA user_version`, so a
/// foreign SQLite file (user_version 0) is never mistaken for one of ours.
pub const BASE_DB_VERSION: usize = 99999;

/// Build a [`Column`] with every flag off, then apply `field = value` overrides.
#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            #[allow(unused_mut)]
            let mut column = $crate::sqlite_persistence::Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                default_value: None,
                foreign_key: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
        }
    }

    fn from_sql(declared: &str) -> Option<&'static SqlType> {
        match declared {
            "TEXT" => Some(&SqlType::Text),
            "INTEGER" => Some(&SqlType::Integer),
            "REAL" => Some(&SqlType::Real),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyOnDelete {
    NoAction,
    Restrict,
    Cascade,
}

impl ForeignKeyOnDelete {
    fn as_sql(&self) -> &'static str {
        match self {
            ForeignKeyOnDelete::NoAction => "NO ACTION",
            ForeignKeyOnDelete::Restrict => "RESTRICT",
            ForeignKeyOnDelete::Cascade => "CASCADE",
        }
    }
}

#[derive(Debug)]
pub struct ForeignKey {
    pub foreign_table: &'static str,
    pub foreign_column: &'static str,
    pub on_delete: ForeignKeyOnDelete,
}

#[derive(Debug)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub default_value: Option<&'static str>,
    pub foreign_key: Option<&'static ForeignKey>,
}

impl Column {
    fn definition(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type.as_sql());
        if self.is_primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if self.non_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(default_value) = self.default_value {
            sql.push_str(&format!(" DEFAULT {}", default_value));
        }
        if let Some(fk) = self.foreign_key {
            sql.push_str(&format!(
                " REFERENCES {}({}) ON DELETE {}",
                fk.foreign_table,
                fk.foreign_column,
                fk.on_delete.as_sql()
            ));
        }
        sql
    }
}

#[derive(Debug)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    /// `(index name, indexed column)` pairs.
    pub indices: &'static [(&'static str, &'static str)],
    pub unique_constraints: &'static [&'static [&'static str]],
}

/// A column as reported by `PRAGMA table_info`.
struct ActualColumn {
    name: String,
    declared_type: String,
    non_null: bool,
    default_value: Option<String>,
    is_primary_key: bool,
}

struct ActualForeignKey {
    from_column: String,
    to_table: String,
    to_column: String,
    on_delete: String,
}

fn strip_wrapping_parentheses(s: &str) -> &str {
    s.strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .unwrap_or(s)
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let mut parts: Vec<String> = self.columns.iter().map(Column::definition).collect();
        for unique in self.unique_constraints {
            parts.push(format!("UNIQUE ({})", unique.join(", ")));
        }
        conn.execute(
            &format!("CREATE TABLE {} ({});", self.name, parts.join(", ")),
            params![],
        )
        .with_context(|| format!("Failed to create table {}", self.name))?;

        for (index_name, column_name) in self.indices {
            conn.execute(
                &format!(
                    "CREATE INDEX {} ON {}({});",
                    index_name, self.name, column_name
                ),
                params![],
            )?;
        }
        Ok(())
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        self.validate_columns(conn)?;
        self.validate_indices(conn)?;
        self.validate_unique_constraints(conn)?;
        self.validate_foreign_keys(conn)
    }

    fn validate_columns(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let actual: Vec<ActualColumn> = stmt
            .query_map(params![], |row| {
                Ok(ActualColumn {
                    name: row.get(1)?,
                    declared_type: row.get(2)?,
                    non_null: row.get::<_, i32>(3)? == 1,
                    default_value: row.get(4)?,
                    is_primary_key: row.get::<_, i32>(5)? == 1,
                })
            })?
            .collect::<rusqlite::Result<_>>()?;

        if actual.len() != self.columns.len() {
            bail!(
                "Table {} has {} columns, expected {} (found: {}; expected: {})",
                self.name,
                actual.len(),
                self.columns.len(),
                actual
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                self.columns
                    .iter()
                    .map(|c| c.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        for (actual, expected) in actual.iter().zip(self.columns.iter()) {
            if actual.name != expected.name {
                bail!(
                    "Table {} column name mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    actual.name
                );
            }
            match SqlType::from_sql(&actual.declared_type) {
                Some(sql_type) if sql_type == expected.sql_type => {}
                _ => bail!(
                    "Table {} column {} type mismatch: expected {:?}, got {}",
                    self.name,
                    expected.name,
                    expected.sql_type,
                    actual.declared_type
                ),
            }
            if actual.non_null != expected.non_null {
                bail!(
                    "Table {} column {} non-null mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    expected.non_null,
                    actual.non_null
                );
            }
            let actual_default = actual.default_value.as_deref().map(strip_wrapping_parentheses);
            let expected_default = expected.default_value.map(strip_wrapping_parentheses);
            if actual_default != expected_default {
                bail!(
                    "Table {} column {} default mismatch: expected {:?}, got {:?}",
                    self.name,
                    expected.name,
                    expected.default_value,
                    actual.default_value
                );
            }
            if actual.is_primary_key != expected.is_primary_key {
                bail!(
                    "Table {} column {} primary key mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    expected.is_primary_key,
                    actual.is_primary_key
                );
            }
        }
        Ok(())
    }

    fn validate_indices(&self, conn: &Connection) -> Result<()> {
        for (index_name, _) in self.indices {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = ?1 AND tbl_name = ?2)",
                params![index_name, self.name],
                |row| row.get(0),
            )?;
            if !exists {
                bail!("Table {} is missing index '{}'", self.name, index_name);
            }
        }
        Ok(())
    }

    fn validate_unique_constraints(&self, conn: &Connection) -> Result<()> {
        if self.unique_constraints.is_empty() {
            return Ok(());
        }

        // UNIQUE table constraints show up as automatic unique indices.
        let mut stmt = conn.prepare(&format!("PRAGMA index_list({})", self.name))?;
        let unique_indices: Vec<String> = stmt
            .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, i32>(2)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .filter(|(_, unique)| *unique == 1)
            .map(|(name, _)| name)
            .collect();

        let mut covered: Vec<Vec<String>> = Vec::with_capacity(unique_indices.len());
        for index_name in &unique_indices {
            let mut info = conn.prepare(&format!("PRAGMA index_info({})", index_name))?;
            let columns = info
                .query_map([], |row| row.get::<_, String>(2))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            covered.push(columns);
        }

        for expected in self.unique_constraints {
            let found = covered
                .iter()
                .any(|columns| columns.iter().map(String::as_str).eq(expected.iter().copied()));
            if !found {
                bail!(
                    "Table {} is missing unique constraint on ({})",
                    self.name,
                    expected.join(", ")
                );
            }
        }
        Ok(())
    }

    fn validate_foreign_keys(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare(&format!("PRAGMA foreign_key_list({})", self.name))?;
        let actual: Vec<ActualForeignKey> = stmt
            .query_map([], |row| {
                Ok(ActualForeignKey {
                    to_table: row.get(2)?,
                    from_column: row.get(3)?,
                    to_column: row.get(4)?,
                    on_delete: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<_>>()?;

        for column in self.columns {
            let Some(expected) = column.foreign_key else {
                continue;
            };
            let on_delete = expected.on_delete.as_sql();
            match actual.iter().find(|fk| fk.from_column == column.name) {
                Some(fk)
                    if fk.to_table == expected.foreign_table
                        && fk.to_column == expected.foreign_column
                        && fk.on_delete == on_delete => {}
                Some(fk) => bail!(
                    "Table {} column {} foreign key mismatch: expected REFERENCES {}({}) ON DELETE {}, got REFERENCES {}({}) ON DELETE {}",
                    self.name,
                    column.name,
                    expected.foreign_table,
                    expected.foreign_column,
                    on_delete,
                    fk.to_table,
                    fk.to_column,
                    fk.on_delete
                ),
                None => bail!(
                    "Table {} column {} is missing foreign key REFERENCES {}({})",
                    self.name,
                    column.name,
                    expected.foreign_table,
                    expected.foreign_column
                ),
            }
        }
        Ok(())
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    /// Upgrades a database at `version - 1` to this version.
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute("PRAGMA foreign_keys = ON;", params![])?;
        for table in self.tables {
            table.create(conn)?;
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            [],
        )?;
        Ok(())
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.validate(conn)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite_column;

    const DECKS_FK: ForeignKey = ForeignKey {
        foreign_table: "decks",
        foreign_column: "id",
        on_delete: ForeignKeyOnDelete::Cascade,
    };

    const DECKS_TABLE: Table = Table {
        name: "decks",
        columns: &[
            sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
            sqlite_column!("name", &SqlType::Text, non_null = true),
            sqlite_column!(
                "created",
                &SqlType::Integer,
                non_null = true,
                default_value = Some(DEFAULT_TIMESTAMP)
            ),
        ],
        indices: &[("idx_decks_name", "name")],
        unique_constraints: &[],
    };

    const DECK_SLOTS_TABLE: Table = Table {
        name: "deck_slots",
        columns: &[
            sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
            sqlite_column!(
                "deck_id",
                &SqlType::Integer,
                non_null = true,
                foreign_key = Some(&DECKS_FK)
            ),
            sqlite_column!("card_id", &SqlType::Integer, non_null = true),
            sqlite_column!("weight", &SqlType::Real),
        ],
        indices: &[],
        unique_constraints: &[&["deck_id", "card_id"]],
    };

    const SCHEMA: VersionedSchema = VersionedSchema {
        version: 0,
        tables: &[DECKS_TABLE, DECK_SLOTS_TABLE],
        migration: None,
    };

    fn user_version(conn: &Connection) -> usize {
        conn.query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
            .unwrap() as usize
    }

    #[test]
    fn test_create_then_validate() {
        let conn = Connection::open_in_memory().unwrap();
        SCHEMA.create(&conn).unwrap();

        assert_eq!(user_version(&conn), BASE_DB_VERSION);
        SCHEMA.validate(&conn).unwrap();
    }

    #[test]
    fn test_created_unique_constraint_is_enforced() {
        let conn = Connection::open_in_memory().unwrap();
        SCHEMA.create(&conn).unwrap();

        conn.execute("INSERT INTO decks (id, name) VALUES (1, 'a')", [])
            .unwrap();
        conn.execute("INSERT INTO deck_slots (deck_id, card_id) VALUES (1, 7)", [])
            .unwrap();
        assert!(conn
            .execute("INSERT INTO deck_slots (deck_id, card_id) VALUES (1, 7)", [])
            .is_err());
    }

    #[test]
    fn test_validate_detects_missing_index() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE decks (id INTEGER PRIMARY KEY, name TEXT NOT NULL, created INTEGER NOT NULL DEFAULT (cast(strftime('%s','now') as int)))",
            [],
        )
        .unwrap();

        let err = DECKS_TABLE.validate(&conn).unwrap_err();
        assert!(err.to_string().contains("missing index 'idx_decks_name'"));
    }

    #[test]
    fn test_validate_detects_column_mismatch() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE decks (id INTEGER PRIMARY KEY, name TEXT, created INTEGER NOT NULL DEFAULT (cast(strftime('%s','now') as int)))",
            [],
        )
        .unwrap();
        conn.execute("CREATE INDEX idx_decks_name ON decks(name)", [])
            .unwrap();

        let err = DECKS_TABLE.validate(&conn).unwrap_err();
        assert!(err.to_string().contains("non-null mismatch"));
    }

    #[test]
    fn test_validate_detects_missing_unique_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        DECKS_TABLE.create(&conn).unwrap();
        conn.execute(
            "CREATE TABLE deck_slots (id INTEGER PRIMARY KEY, deck_id INTEGER NOT NULL REFERENCES decks(id) ON DELETE CASCADE, card_id INTEGER NOT NULL, weight REAL)",
            [],
        )
        .unwrap();

        let err = DECK_SLOTS_TABLE.validate(&conn).unwrap_err();
        assert!(err
            .to_string()
            .contains("missing unique constraint on (deck_id, card_id)"));
    }

    #[test]
    fn test_validate_detects_foreign_key_mismatch() {
        let conn = Connection::open_in_memory().unwrap();
        DECKS_TABLE.create(&conn).unwrap();
        conn.execute(
            "CREATE TABLE deck_slots (id INTEGER PRIMARY KEY, deck_id INTEGER NOT NULL REFERENCES decks(id) ON DELETE RESTRICT, card_id INTEGER NOT NULL, weight REAL, UNIQUE (deck_id, card_id))",
            [],
        )
        .unwrap();

        let err = DECK_SLOTS_TABLE.validate(&conn).unwrap_err();
        assert!(err.to_string().contains("foreign key mismatch"));
    }

    #[test]
    fn test_validate_detects_missing_foreign_key() {
        let conn = Connection::open_in_memory().unwrap();
        DECKS_TABLE.create(&conn).unwrap();
        conn.execute(
            "CREATE TABLE deck_slots (id INTEGER PRIMARY KEY, deck_id INTEGER NOT NULL, card_id INTEGER NOT NULL, weight REAL, UNIQUE (deck_id, card_id))",
            [],
        )
        .unwrap();

        let err = DECK_SLOTS_TABLE.validate(&conn).unwrap_err();
        assert!(err.to_string().contains("missing foreign key"));
    }

    #[test]
    fn test_strip_wrapping_parentheses() {
        assert_eq!(strip_wrapping_parentheses("(1)"), "1");
        assert_eq!(strip_wrapping_parentheses("'x'"), "'x'");
        assert_eq!(
            strip_wrapping_parentheses(DEFAULT_TIMESTAMP),
            "cast(strftime('%s','now') as int)"
        );
    }
}
