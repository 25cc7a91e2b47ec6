//! SQLite schema for the card catalog database.
//!
//! The localized and English catalogs live in parallel table pairs with the
//! same shape: `cards`/`card_sets` and `cards_en`/`card_sets_en`. Card ids are
//! the upstream passcodes. Printings are keyed by `(card_id, set_code)`.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    ForeignKey, ForeignKeyOnDelete, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

const CARDS_TABLE: Table = Table {
    name: "cards",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true), // passcode
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("card_type", &SqlType::Text, non_null = true),
        sqlite_column!("frame_type", &SqlType::Text, non_null = true),
        sqlite_column!("description", &SqlType::Text, non_null = true),
        sqlite_column!("atk", &SqlType::Integer),
        sqlite_column!("def_stat", &SqlType::Integer),
        sqlite_column!("level", &SqlType::Integer),
        sqlite_column!("race", &SqlType::Text, non_null = true),
        sqlite_column!("attribute", &SqlType::Text, non_null = true),
    ],
    indices: &[
        ("idx_cards_name", "name"),
        ("idx_cards_card_type", "card_type"),
        ("idx_cards_race", "race"),
        ("idx_cards_attribute", "attribute"),
        ("idx_cards_atk", "atk"),
        ("idx_cards_def_stat", "def_stat"),
        ("idx_cards_level", "level"),
    ],
    unique_constraints: &[],
};

const CARD_SETS_TABLE: Table = Table {
    name: "card_sets",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "card_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "cards",
                foreign_column: "id",
                on_delete: ForeignKeyOnDelete::Cascade,
            })
        ),
        sqlite_column!("set_name", &SqlType::Text, non_null = true),
        sqlite_column!("set_code", &SqlType::Text, non_null = true),
        sqlite_column!("set_rarity", &SqlType::Text, non_null = true),
        sqlite_column!("set_rarity_code", &SqlType::Text, non_null = true),
        sqlite_column!("set_price_cents", &SqlType::Integer), // NULL when unknown
    ],
    indices: &[
        ("idx_card_sets_set_name", "set_name"),
        ("idx_card_sets_set_code", "set_code"),
    ],
    unique_constraints: &[&["card_id", "set_code"]],
};

const CARDS_EN_TABLE: Table = Table {
    name: "cards_en",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("card_type", &SqlType::Text, non_null = true),
        sqlite_column!("frame_type", &SqlType::Text, non_null = true),
        sqlite_column!("description", &SqlType::Text, non_null = true),
        sqlite_column!("atk", &SqlType::Integer),
        sqlite_column!("def_stat", &SqlType::Integer),
        sqlite_column!("level", &SqlType::Integer),
        sqlite_column!("race", &SqlType::Text, non_null = true),
        sqlite_column!("attribute", &SqlType::Text, non_null = true),
    ],
    indices: &[
        ("idx_cards_en_name", "name"),
        ("idx_cards_en_card_type", "card_type"),
        ("idx_cards_en_race", "race"),
        ("idx_cards_en_attribute", "attribute"),
        ("idx_cards_en_atk", "atk"),
        ("idx_cards_en_def_stat", "def_stat"),
        ("idx_cards_en_level", "level"),
    ],
    unique_constraints: &[],
};

const CARD_SETS_EN_TABLE: Table = Table {
    name: "card_sets_en",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "card_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "cards_en",
                foreign_column: "id",
                on_delete: ForeignKeyOnDelete::Cascade,
            })
        ),
        sqlite_column!("set_name", &SqlType::Text, non_null = true),
        sqlite_column!("set_code", &SqlType::Text, non_null = true),
        sqlite_column!("set_rarity", &SqlType::Text, non_null = true),
        sqlite_column!("set_rarity_code", &SqlType::Text, non_null = true),
        sqlite_column!("set_price_cents", &SqlType::Integer),
    ],
    indices: &[
        ("idx_card_sets_en_set_name", "set_name"),
        ("idx_card_sets_en_set_code", "set_code"),
    ],
    unique_constraints: &[&["card_id", "set_code"]],
};

/// One row per completed sync, written in the same transaction as the upserts.
const SYNC_RUNS_TABLE: Table = Table {
    name: "sync_runs",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("family", &SqlType::Text, non_null = true), // 'localized' | 'english'
        sqlite_column!("remote_version", &SqlType::Text, non_null = true), // compact JSON
        sqlite_column!("forced", &SqlType::Integer, non_null = true),
        sqlite_column!("cards", &SqlType::Integer, non_null = true),
        sqlite_column!("printings", &SqlType::Integer, non_null = true),
        sqlite_column!("skipped_printings", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "finished_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_sync_runs_family", "family")],
    unique_constraints: &[],
};

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        CARDS_TABLE,
        CARD_SETS_TABLE,
        CARDS_EN_TABLE,
        CARD_SETS_EN_TABLE,
        SYNC_RUNS_TABLE,
    ],
    migration: None,
}];
