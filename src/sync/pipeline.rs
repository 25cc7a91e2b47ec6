//! Applies a fetched card list to the store inside one transaction.

use super::error::SyncError;
use crate::catalog_store::{
    validate_card, CardRef, CatalogFamily, CatalogWriter, NewSyncRun, Price, Printing,
    SqliteCardStore, UpsertOutcome,
};
use crate::ygoprodeck::{RawCardRecord, RawPrinting, VersionFingerprint};
use tracing::{debug, info, warn};

pub const PROGRESS_LOG_INTERVAL: usize = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub cards_created: u64,
    pub cards_updated: u64,
    pub printings_created: u64,
    pub printings_updated: u64,
    pub printings_skipped: u64,
}

impl ApplySummary {
    pub fn cards(&self) -> u64 {
        self.cards_created + self.cards_updated
    }

    pub fn printings(&self) -> u64 {
        self.printings_created + self.printings_updated
    }

    fn record_card(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.cards_created += 1,
            UpsertOutcome::Updated => self.cards_updated += 1,
        }
    }

    fn add_printings(&mut self, other: &ApplySummary) {
        self.printings_created += other.printings_created;
        self.printings_updated += other.printings_updated;
        self.printings_skipped += other.printings_skipped;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedCard {
    pub card_ref: CardRef,
    pub outcome: UpsertOutcome,
}

/// What the history row of this pass should say.
#[derive(Debug, Clone, Copy)]
pub struct RunContext<'a> {
    pub family: CatalogFamily,
    pub remote_version: &'a VersionFingerprint,
    pub forced: bool,
}

/// Turns upstream records into card and printing upserts.
#[derive(Debug, Clone)]
pub struct UpsertPipeline {
    progress_interval: usize,
}

impl Default for UpsertPipeline {
    fn default() -> Self {
        Self::new(PROGRESS_LOG_INTERVAL)
    }
}

impl UpsertPipeline {
    pub fn new(progress_interval: usize) -> Self {
        Self {
            progress_interval: progress_interval.max(1),
        }
    }

    pub fn apply_card(
        &self,
        writer: &CatalogWriter<'_>,
        family: CatalogFamily,
        record: &RawCardRecord,
    ) -> Result<AppliedCard, SyncError> {
        let card = validate_card(record)?;
        let outcome = writer.upsert_card(family, &card)?;
        Ok(AppliedCard {
            card_ref: CardRef {
                family,
                id: card.id,
            },
            outcome,
        })
    }

    /// Upsert every printing of `record` under `card`. Printings without a
    /// set code are skipped and counted.
    pub fn apply_printings(
        &self,
        writer: &CatalogWriter<'_>,
        card: CardRef,
        record: &RawCardRecord,
    ) -> Result<ApplySummary, SyncError> {
        let mut summary = ApplySummary::default();
        for raw in record.printings() {
            let Some(printing) = printing_from_raw(card.id, raw) else {
                summary.printings_skipped += 1;
                continue;
            };
            match writer.upsert_printing(card, &printing)? {
                UpsertOutcome::Created => summary.printings_created += 1,
                UpsertOutcome::Updated => summary.printings_updated += 1,
            }
        }
        Ok(summary)
    }

    /// Apply `records` and the history row in one unit of work.
    ///
    /// Any failure, validation included, rolls back the whole pass.
    pub fn apply_all(
        &self,
        store: &SqliteCardStore,
        run: &RunContext<'_>,
        records: &[RawCardRecord],
    ) -> Result<ApplySummary, SyncError> {
        let total = records.len();
        let remote_version = run.remote_version.to_string();

        store.write_batch(|writer| -> Result<ApplySummary, SyncError> {
            let mut summary = ApplySummary::default();

            for (index, record) in records.iter().enumerate() {
                let applied = self.apply_card(writer, run.family, record)?;
                summary.record_card(applied.outcome);
                summary.add_printings(&self.apply_printings(writer, applied.card_ref, record)?);

                if (index + 1) % self.progress_interval == 0 {
                    info!(
                        "Upserted {}/{} {} cards",
                        index + 1,
                        total,
                        run.family
                    );
                }
            }

            writer.record_sync_run(&NewSyncRun {
                family: run.family,
                remote_version: &remote_version,
                forced: run.forced,
                cards: summary.cards(),
                printings: summary.printings(),
                skipped_printings: summary.printings_skipped,
            })?;

            Ok(summary)
        })
    }
}

fn printing_from_raw(card_id: i64, raw: &RawPrinting) -> Option<Printing> {
    let set_code = raw
        .set_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty());
    let Some(set_code) = set_code else {
        debug!(
            "Skipping printing of card {} without set code ({:?})",
            card_id, raw.set_name
        );
        return None;
    };

    let set_price = raw.set_price.as_deref().and_then(|text| {
        let price = Price::parse(text);
        if price.is_none() {
            warn!(
                "Ignoring unparsable price {:?} for card {} in {}",
                text, card_id, set_code
            );
        }
        price
    });

    Some(Printing {
        set_name: raw.set_name.clone().unwrap_or_default(),
        set_code: set_code.to_string(),
        set_rarity: raw.set_rarity.clone().unwrap_or_default(),
        set_rarity_code: raw.set_rarity_code.clone().unwrap_or_default(),
        set_price,
    })
}
