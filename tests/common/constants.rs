#![allow(dead_code)]

pub const TEST_SPELL_ID: i64 = 1;
pub const TEST_SPELL_SET_CODE: &str = "SA-001";

// Sample catalog
pub const BLUE_EYES_ID: i64 = 89631139;
pub const DARK_MAGICIAN_ID: i64 = 46986414;
pub const KURIBOH_ID: i64 = 40640057;
pub const POT_OF_GREED_ID: i64 = 55144522;
pub const MIRROR_FORCE_ID: i64 = 44095762;
pub const SAMPLE_CATALOG_SIZE: usize = 5;

/// Requests per second used by harness fetchers unless a test overrides it.
pub const FAST_RATE: u32 = 1000;
