//! SQLite-backed card catalog store.

use super::models::{
    Card, CardRef, CardWithPrintings, CatalogFamily, NewSyncRun, Price, Printing, SyncRun,
    UpsertOutcome,
};
use super::query::CardFilter;
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// SQLite card catalog holding both families side by side.
///
/// A single connection serves reads and writes. Writes happen in one
/// `BEGIN IMMEDIATE` transaction per sync through [`Self::write_batch`].
pub struct SqliteCardStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

fn migrate_if_needed(conn: &mut Connection) -> Result<()> {
    let latest_version = CATALOG_VERSIONED_SCHEMAS.len() - 1;
    let latest_schema = &CATALOG_VERSIONED_SCHEMAS[latest_version];

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;

    if table_count == 0 {
        info!("Creating card catalog schema at version {}", latest_version);
        latest_schema.create(conn)?;
        return Ok(());
    }

    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if db_version < BASE_DB_VERSION as i64 {
        bail!(
            "Database has user_version {}, it was not created by this tool",
            db_version
        );
    }
    let mut current_version = (db_version - BASE_DB_VERSION as i64) as usize;
    if current_version > latest_version {
        bail!(
            "Database schema version {} is newer than supported version {}",
            current_version,
            latest_version
        );
    }

    if current_version < latest_version {
        let tx = conn.transaction()?;
        for schema in CATALOG_VERSIONED_SCHEMAS.iter().skip(current_version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating card catalog from version {} to {}",
                    current_version, schema.version
                );
                migration_fn(&tx)?;
            }
            current_version = schema.version;
        }
        tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
        tx.commit()?;
    }

    latest_schema
        .validate(conn)
        .context("Card catalog schema validation failed")
}

fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    // Unicode-aware lowercase. SQLite's lower() and LIKE only fold ASCII.
    conn.create_scalar_function(
        "casefold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

fn card_from_row(row: &Row) -> rusqlite::Result<Card> {
    Ok(Card {
        id: row.get("id")?,
        name: row.get("name")?,
        card_type: row.get("card_type")?,
        frame_type: row.get("frame_type")?,
        description: row.get("description")?,
        atk: row.get("atk")?,
        def_stat: row.get("def_stat")?,
        level: row.get("level")?,
        race: row.get("race")?,
        attribute: row.get("attribute")?,
    })
}

fn printing_from_row(row: &Row) -> rusqlite::Result<Printing> {
    Ok(Printing {
        set_name: row.get("set_name")?,
        set_code: row.get("set_code")?,
        set_rarity: row.get("set_rarity")?,
        set_rarity_code: row.get("set_rarity_code")?,
        set_price: row
            .get::<_, Option<i64>>("set_price_cents")?
            .map(Price::from_cents),
    })
}

const CARD_COLUMNS: &str =
    "id, name, card_type, frame_type, description, atk, def_stat, level, race, attribute";

impl SqliteCardStore {
    /// Open or create the catalog at `db_path`.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        let mut conn = Connection::open_with_flags(
            db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open card catalog at {:?}", db_path))?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrate_if_needed(&mut conn)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let store = Self::from_connection(conn, Some(db_path.to_path_buf()))?;
        info!(
            "Opened card catalog {:?}: {} localized cards, {} english cards",
            db_path,
            store.count_cards(CatalogFamily::Localized)?,
            store.count_cards(CatalogFamily::English)?
        );
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrate_if_needed(&mut conn)?;
        Self::from_connection(conn, None)
    }

    fn from_connection(conn: Connection, db_path: Option<PathBuf>) -> Result<Self> {
        register_functions(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            let conn = poisoned.into_inner();
            // A panic inside write_batch can leave its transaction open.
            if !conn.is_autocommit() {
                warn!("Rolling back transaction left open by a panicked writer");
                let _ = conn.execute("ROLLBACK", []);
            }
            conn
        })
    }

    /// Run `work` inside a single immediate transaction.
    ///
    /// Commits when `work` returns `Ok` and rolls back on `Err`, so readers
    /// see either everything or nothing from the batch.
    pub fn write_batch<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&CatalogWriter<'_>) -> Result<T, E>,
        E: From<rusqlite::Error>,
    {
        let conn = self.conn();
        conn.execute("BEGIN IMMEDIATE", [])?;

        let writer = CatalogWriter { conn: &conn };
        match work(&writer) {
            Ok(value) => {
                if let Err(e) = conn.execute("COMMIT", []) {
                    let _ = conn.execute("ROLLBACK", []);
                    return Err(e.into());
                }
                Ok(value)
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }

    pub fn get_card(&self, family: CatalogFamily, id: i64) -> Result<Option<CardWithPrintings>> {
        let conn = self.conn();
        let card = conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE id = ?1",
                    CARD_COLUMNS,
                    family.cards_table()
                ),
                params![id],
                card_from_row,
            )
            .optional()?;

        let Some(card) = card else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT set_name, set_code, set_rarity, set_rarity_code, set_price_cents
             FROM {} WHERE card_id = ?1 ORDER BY set_code",
            family.printings_table()
        ))?;
        let printings = stmt
            .query_map(params![id], printing_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(CardWithPrintings { card, printings }))
    }

    /// Cards matching `filter`, ordered by name then id.
    pub fn search_cards(
        &self,
        family: CatalogFamily,
        filter: &CardFilter,
        limit: usize,
    ) -> Result<Vec<Card>> {
        let Some((condition, value)) = filter.to_sql() else {
            return Ok(Vec::new());
        };

        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE {} ORDER BY name, id LIMIT ?2",
            CARD_COLUMNS,
            family.cards_table(),
            condition
        ))?;
        let cards = stmt
            .query_map(params![value, limit as i64], card_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }

    pub fn count_cards(&self, family: CatalogFamily) -> Result<usize> {
        let count: i64 = self.conn().query_row(
            &format!("SELECT COUNT(*) FROM {}", family.cards_table()),
            [],
            |r| r.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn count_printings(&self, family: CatalogFamily) -> Result<usize> {
        let count: i64 = self.conn().query_row(
            &format!("SELECT COUNT(*) FROM {}", family.printings_table()),
            [],
            |r| r.get(0),
        )?;
        Ok(count as usize)
    }

    /// Most recent sync runs for `family`, newest first.
    pub fn sync_history(&self, family: CatalogFamily, limit: usize) -> Result<Vec<SyncRun>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, remote_version, forced, cards, printings, skipped_printings, finished_at
             FROM sync_runs WHERE family = ?1 ORDER BY id DESC LIMIT ?2",
        )?;
        let runs = stmt
            .query_map(params![family.as_str(), limit as i64], |row| {
                Ok(SyncRun {
                    id: row.get(0)?,
                    family,
                    remote_version: row.get(1)?,
                    forced: row.get(2)?,
                    cards: row.get::<_, i64>(3)? as u64,
                    printings: row.get::<_, i64>(4)? as u64,
                    skipped_printings: row.get::<_, i64>(5)? as u64,
                    finished_at: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(runs)
    }
}

/// Write access handed to [`SqliteCardStore::write_batch`] closures.
pub struct CatalogWriter<'conn> {
    conn: &'conn Connection,
}

impl CatalogWriter<'_> {
    /// Insert the card or update it in place.
    ///
    /// Uses `ON CONFLICT DO UPDATE` rather than `INSERT OR REPLACE`. The
    /// latter deletes the row first, which would cascade to its printings.
    pub fn upsert_card(
        &self,
        family: CatalogFamily,
        card: &Card,
    ) -> rusqlite::Result<UpsertOutcome> {
        let table = family.cards_table();
        let existed: bool = self.conn.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", table),
            params![card.id],
            |r| r.get(0),
        )?;

        self.conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    card_type = excluded.card_type,
                    frame_type = excluded.frame_type,
                    description = excluded.description,
                    atk = excluded.atk,
                    def_stat = excluded.def_stat,
                    level = excluded.level,
                    race = excluded.race,
                    attribute = excluded.attribute",
                table, CARD_COLUMNS
            ),
            params![
                card.id,
                card.name,
                card.card_type,
                card.frame_type,
                card.description,
                card.atk,
                card.def_stat,
                card.level,
                card.race,
                card.attribute,
            ],
        )?;

        Ok(if existed {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Created
        })
    }

    /// Insert the printing or update it in place, keyed by `(card, set_code)`.
    pub fn upsert_printing(
        &self,
        card: CardRef,
        printing: &Printing,
    ) -> rusqlite::Result<UpsertOutcome> {
        let table = card.family.printings_table();
        let existed: bool = self.conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE card_id = ?1 AND set_code = ?2)",
                table
            ),
            params![card.id, printing.set_code],
            |r| r.get(0),
        )?;

        self.conn.execute(
            &format!(
                "INSERT INTO {} (card_id, set_name, set_code, set_rarity, set_rarity_code, set_price_cents)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(card_id, set_code) DO UPDATE SET
                    set_name = excluded.set_name,
                    set_rarity = excluded.set_rarity,
                    set_rarity_code = excluded.set_rarity_code,
                    set_price_cents = excluded.set_price_cents",
                table
            ),
            params![
                card.id,
                printing.set_name,
                printing.set_code,
                printing.set_rarity,
                printing.set_rarity_code,
                printing.set_price.map(|p| p.cents()),
            ],
        )?;

        Ok(if existed {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Created
        })
    }

    pub fn record_sync_run(&self, run: &NewSyncRun<'_>) -> rusqlite::Result<i64> {
        self.conn.execute(
            "INSERT INTO sync_runs (family, remote_version, forced, cards, printings, skipped_printings)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                run.family.as_str(),
                run.remote_version,
                run.forced,
                run.cards as i64,
                run.printings as i64,
                run.skipped_printings as i64,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}
