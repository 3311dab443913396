// Expense Tracker - Core Library
// Exposes the record store, edit session and projections for the CLI, TUI, and tests

pub mod book;
pub mod config;
pub mod error;
pub mod expense;
pub mod import;
pub mod projection;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use book::ExpenseBook;
pub use config::{TrackerConfig, CONFIG_FILE};
pub use error::{ExpenseError, Result};
pub use expense::{
    parse_amount, parse_category, parse_date, Category, Expense, ExpenseDetails, ExpenseId,
};
pub use import::{
    import_csv, import_file, import_xlsx, parse_csv, parse_sheet, ImportReport, REQUIRED_COLUMNS,
};
pub use projection::{
    CategoryTotal, Granularity, Origin, Period, PeriodTotal, ProjectedRow, Projection,
};
pub use session::EditSession;
pub use store::ExpenseStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
