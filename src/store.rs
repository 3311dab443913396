// 🗄️ Record Store - durable expense persistence on SQLite
//
// No warm state: every call opens the database, runs a single statement
// (its own transaction) and closes the connection when it returns.
// A database locked by another process fails fast with StoreUnavailable.

use crate::error::{ExpenseError, Result};
use crate::expense::{Expense, ExpenseDetails, ExpenseId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const SELECT_COLUMNS: &str = "SELECT id, category, amount, date, description FROM expenses";

#[derive(Debug, Clone)]
pub struct ExpenseStore {
    path: PathBuf,
    require_description: bool,
}

impl ExpenseStore {
    /// Open (and if needed create) the store at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = ExpenseStore {
            path: path.into(),
            require_description: true,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Whether `create` / `update` demand a non-empty description
    pub fn require_description(mut self, required: bool) -> Self {
        self.require_description = required;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ========================================================================
    // CONNECTION HANDLING
    // ========================================================================

    fn unavailable(&self, source: rusqlite::Error) -> ExpenseError {
        ExpenseError::StoreUnavailable {
            path: self.path.clone(),
            source,
        }
    }

    /// Scoped connection: dropped (closed) when the caller returns
    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path).map_err(|e| self.unavailable(e))?;
        // No waiting on locks held by other processes
        conn.busy_timeout(Duration::ZERO)
            .map_err(|e| self.unavailable(e))?;
        Ok(conn)
    }

    /// Idempotent: creates the table if missing, never touches existing rows
    pub fn initialize(&self) -> Result<()> {
        let conn = self.connect()?;
        setup_schema(&conn).map_err(|e| self.unavailable(e))?;
        debug!(path = %self.path.display(), "expense store initialized");
        Ok(())
    }

    // ========================================================================
    // CRUD
    // ========================================================================

    pub fn create(&self, details: &ExpenseDetails) -> Result<ExpenseId> {
        details.validate(self.require_description)?;

        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO expenses (category, amount, date, description)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                details.category,
                details.amount,
                details.date,
                details.description,
            ],
        )
        .map_err(|e| self.unavailable(e))?;

        let id = ExpenseId::new(conn.last_insert_rowid());
        info!(%id, category = %details.category, amount = details.amount, "expense created");
        Ok(id)
    }

    /// Every live record in identity order
    pub fn read_all(&self) -> Result<Vec<Expense>> {
        let conn = self.connect()?;
        let expenses = query_all(&conn).map_err(|e| self.unavailable(e))?;
        debug!(count = expenses.len(), "loaded expenses");
        Ok(expenses)
    }

    pub fn find(&self, id: ExpenseId) -> Result<Expense> {
        let conn = self.connect()?;
        conn.query_row(
            &format!("{} WHERE id = ?1", SELECT_COLUMNS),
            params![id],
            expense_from_row,
        )
        .optional()
        .map_err(|e| self.unavailable(e))?
        .ok_or(ExpenseError::NotFound(id))
    }

    /// Replace every field except the identity
    pub fn update(&self, id: ExpenseId, details: &ExpenseDetails) -> Result<()> {
        details.validate(self.require_description)?;

        let conn = self.connect()?;
        let changed = conn
            .execute(
                "UPDATE expenses
                 SET category = ?1, amount = ?2, date = ?3, description = ?4
                 WHERE id = ?5",
                params![
                    details.category,
                    details.amount,
                    details.date,
                    details.description,
                    id,
                ],
            )
            .map_err(|e| self.unavailable(e))?;

        if changed == 0 {
            return Err(ExpenseError::NotFound(id));
        }
        info!(%id, "expense updated");
        Ok(())
    }

    pub fn delete(&self, id: ExpenseId) -> Result<()> {
        let conn = self.connect()?;
        let changed = conn
            .execute("DELETE FROM expenses WHERE id = ?1", params![id])
            .map_err(|e| self.unavailable(e))?;

        if changed == 0 {
            return Err(ExpenseError::NotFound(id));
        }
        info!(%id, "expense deleted");
        Ok(())
    }

    /// Remove every record; the id sequence is kept so old ids stay retired
    pub fn clear(&self) -> Result<usize> {
        let conn = self.connect()?;
        let removed = conn
            .execute("DELETE FROM expenses", [])
            .map_err(|e| self.unavailable(e))?;
        info!(removed, "expense store cleared");
        Ok(removed)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.connect()?;
        conn.query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))
            .map_err(|e| self.unavailable(e))
    }
}

// ============================================================================
// SQL HELPERS
// ============================================================================

fn setup_schema(conn: &Connection) -> rusqlite::Result<()> {
    // WAL keeps readers working while a write is in flight
    let _mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            category TEXT NOT NULL,
            amount REAL NOT NULL CHECK (amount >= 0),
            date TEXT NOT NULL,
            description TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date)",
        [],
    )?;

    Ok(())
}

fn query_all(conn: &Connection) -> rusqlite::Result<Vec<Expense>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_COLUMNS))?;
    let expenses = stmt
        .query_map([], expense_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(expenses)
}

fn expense_from_row(row: &Row<'_>) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: row.get(0)?,
        details: ExpenseDetails {
            category: row.get(1)?,
            amount: row.get(2)?,
            date: row.get(3)?,
            description: row.get(4)?,
        },
    })
}
