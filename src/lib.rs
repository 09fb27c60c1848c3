// Ledger Core - owner-scoped analytics and mutations for a personal ledger
// Exposes all modules for use in the CLI, API server, and tests

pub mod error;
pub mod identity;
pub mod db;
pub mod scope;          // Authorization-scoped query building
pub mod range;          // Date windows + previous period
pub mod change;         // Percentage deltas
pub mod rollup;         // Top categories + "Other"
pub mod timeseries;     // Gap-filled daily series
pub mod aggregate;      // Owner-scoped sums
pub mod summary;
pub mod mutations;      // Two-phase scoped writes
pub mod queries;
pub mod config;
pub mod logging;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use error::{LedgerError, Result};
pub use identity::OwnerId;
pub use db::{
    Account, Category, Transaction, NewTransaction, DeletedId,
    open_database, setup_database, insert_account, insert_category,
};
pub use scope::{OwnerScope, TransactionFilter};
pub use range::{resolve, resolve_at, DateWindow, PeriodWindows};
pub use change::percent_change;
pub use rollup::{rollup_categories, CategorySpend};
pub use timeseries::{fill_missing_days, DailyActivity};
pub use aggregate::{period_totals, category_spend, daily_activity, PeriodTotals};
pub use summary::{summarize, summarize_at, Summary, SummaryRequest};
pub use mutations::{
    create_transaction, bulk_create_transactions, bulk_delete_transactions,
    update_transaction, delete_transaction,
};
pub use queries::{list_transactions, get_transaction, list_accounts, TransactionQuery, TransactionView};
pub use config::AppConfig;
pub use logging::init_logging;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
