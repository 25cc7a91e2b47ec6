//! Shared harness for end-to-end sync tests.
//!
//! Tests import from here only:
//!
//! ```no_run
//! mod common;
//! use common::{fixtures, TestEnv};
//! use card_catalog_sync::{Locale, SyncOutcome};
//!
//! #[test]
//! fn test_sync() {
//!     let env = TestEnv::new();
//!     env.upstream.push_version(fixtures::version("1"));
//!     env.upstream.push_catalog(fixtures::single_spell_payload("0.10"));
//!     assert!(matches!(env.job(Locale::English).run(false), Ok(SyncOutcome::Done(_))));
//! }
//! ```

mod constants;
pub mod fixtures;
mod harness;
mod upstream;

pub use constants::*;
#[allow(unused_imports)]
pub use harness::{TestEnv, TEST_BASE_URL};
#[allow(unused_imports)]
pub use upstream::{FakeUpstream, RecordedCall};
