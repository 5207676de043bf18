//! Database access for mkat-ap
//!
//! Query helpers grouped per table. Reads take the pool; writes that must be
//! atomic with other writes take a `&mut SqliteConnection` so callers can pass
//! an open transaction (`&mut *tx`).

pub mod campaigns;
pub mod configs;
pub mod failures;
pub mod leads;
pub mod metrics;
pub mod tasks;
