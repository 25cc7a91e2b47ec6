//! Catalog entities as stored and returned by [`super::SqliteCardStore`].

use serde::Serialize;
use std::fmt;

/// Which parallel table pair a card lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogFamily {
    Localized,
    English,
}

impl CatalogFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogFamily::Localized => "localized",
            CatalogFamily::English => "english",
        }
    }

    pub(crate) fn cards_table(&self) -> &'static str {
        match self {
            CatalogFamily::Localized => "cards",
            CatalogFamily::English => "cards_en",
        }
    }

    pub(crate) fn printings_table(&self) -> &'static str {
        match self {
            CatalogFamily::Localized => "card_sets",
            CatalogFamily::English => "card_sets_en",
        }
    }
}

impl fmt::Display for CatalogFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A market price in integer cents.
///
/// Upstream prices are decimal strings such as `"0.10"`. They are rounded
/// half-up to two decimals when parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Price {
    cents: i64,
}

impl Price {
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Parse a non-negative decimal like `"4.08"`, `"12"` or `".5"`.
    ///
    /// Returns `None` for empty, signed, exponent or otherwise malformed input,
    /// and on overflow.
    pub fn parse(text: &str) -> Option<Price> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let (whole, fraction) = match text.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (text, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        if !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().ok()?
        };

        let digit = |i: usize| -> i64 {
            fraction
                .as_bytes()
                .get(i)
                .map(|b| i64::from(b - b'0'))
                .unwrap_or(0)
        };
        let mut cents = digit(0) * 10 + digit(1);
        if digit(2) >= 5 {
            cents += 1;
        }

        whole.checked_mul(100)?.checked_add(cents).map(Price::from_cents)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

/// A card as stored in one family's `cards` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub id: i64,
    pub name: String,
    pub card_type: String,
    pub frame_type: String,
    pub description: String,
    pub atk: Option<i64>,
    pub def_stat: Option<i64>,
    pub level: Option<i64>,
    pub race: String,
    pub attribute: String,
}

/// One printing of a card in a set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Printing {
    pub set_name: String,
    pub set_code: String,
    pub set_rarity: String,
    pub set_rarity_code: String,
    pub set_price: Option<Price>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardWithPrintings {
    pub card: Card,
    pub printings: Vec<Printing>,
}

/// Identifies a stored card, used to attach printings to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CardRef {
    pub family: CatalogFamily,
    pub id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// History row describing a completed sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncRun {
    pub id: i64,
    pub family: CatalogFamily,
    pub remote_version: String,
    pub forced: bool,
    pub cards: u64,
    pub printings: u64,
    pub skipped_printings: u64,
    /// Unix seconds.
    pub finished_at: i64,
}

/// Values for a new `sync_runs` row. `finished_at` is set by the database.
#[derive(Debug, Clone)]
pub struct NewSyncRun<'a> {
    pub family: CatalogFamily,
    pub remote_version: &'a str,
    pub forced: bool,
    pub cards: u64,
    pub printings: u64,
    pub skipped_printings: u64,
}
