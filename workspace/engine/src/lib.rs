//! Budget tracking and analytics.
//!
//! [`BudgetEngine`] keeps household spending limits consistent with the
//! transaction ledger, rejects overlapping limits and reports how far each
//! limit has been consumed.

pub mod engine;
pub mod error;
pub mod filter;
pub mod memory;
pub mod overlap;
pub mod projection;
pub mod resync;
pub mod sea;
pub mod status;
pub mod store;

#[cfg(test)]
mod testing;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub use engine::{BudgetEngine, BudgetPatch, EngineConfig, NewBudget, RecalculationSummary};
pub use error::{EngineError, ErrorKind, Result};
pub use filter::BudgetFilter;
pub use projection::BudgetUtilization;
pub use resync::{RecalcObserver, TracingObserver};
pub use status::{BudgetStatus, StatusBand, StatusThresholds};
pub use store::{Budget, BudgetStore, LedgerQuery};

/// Returns an engine backed by the given database for both budgets and the
/// ledger.
///
/// `today` pins the reference day for status and limit checks; the current
/// UTC date is used when it is `None`.
pub fn default_engine(
    db: DatabaseConnection,
    config: EngineConfig,
    today: Option<chrono::NaiveDate>,
) -> BudgetEngine {
    let engine = BudgetEngine::new(
        Arc::new(sea::SeaBudgetStore::new(db.clone())),
        Arc::new(sea::SeaLedger::new(db)),
        config,
    );
    match today {
        Some(today) => engine.with_today(today),
        None => engine,
    }
}
