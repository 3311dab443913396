// 📒 Expense Book - the operations surface the CLI and TUI call
//
// Ties together the durable store, the edit session and the active
// display set (saved data, or an imported file while one is loaded).
// Every read goes back to the store; nothing is served from cache
// after a mutation.

use crate::config::TrackerConfig;
use crate::error::{ExpenseError, Result};
use crate::expense::{Expense, ExpenseDetails, ExpenseId};
use crate::import::{import_file, ImportReport};
use crate::projection::{CategoryTotal, Granularity, PeriodTotal, Projection};
use crate::session::EditSession;
use crate::store::ExpenseStore;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Rows loaded from an uploaded file
#[derive(Debug, Clone)]
struct ImportedSet {
    source: PathBuf,
    rows: Vec<ExpenseDetails>,
}

#[derive(Debug)]
pub struct ExpenseBook {
    store: ExpenseStore,
    session: EditSession,
    imported: Option<ImportedSet>,
}

impl ExpenseBook {
    pub fn new(store: ExpenseStore) -> Self {
        ExpenseBook {
            store,
            session: EditSession::default(),
            imported: None,
        }
    }

    /// Open the store named by the configuration
    pub fn open(config: &TrackerConfig) -> Result<Self> {
        let store = ExpenseStore::open(config.database.clone())?
            .require_description(config.require_description);
        Ok(Self::new(store))
    }

    pub fn store(&self) -> &ExpenseStore {
        &self.store
    }

    pub fn session(&self) -> EditSession {
        self.session
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    pub fn add(&mut self, details: &ExpenseDetails) -> Result<ExpenseId> {
        self.store.create(details)
    }

    /// Select `id` for editing and return its current values.
    /// The id is checked against the store now and again on confirm.
    pub fn begin_edit(&mut self, id: ExpenseId) -> Result<Expense> {
        let current = self.store.find(id)?;
        self.session.begin(id);
        Ok(current)
    }

    pub fn cancel_edit(&mut self) {
        self.session.cancel();
    }

    /// Apply `details` to the record selected by `begin_edit`
    pub fn confirm_edit(&mut self, details: &ExpenseDetails) -> Result<ExpenseId> {
        let id = self.session.target()?;

        // The selection may be from an earlier interaction; re-check it
        let live = self.store.read_all()?;
        if !live.iter().any(|e| e.id == id) {
            warn!(%id, "edit target vanished before confirm");
            self.session.cancel();
            return Err(ExpenseError::NotFound(id));
        }

        match self.store.update(id, details) {
            Ok(()) => {
                self.session.finish();
                Ok(id)
            }
            Err(ExpenseError::NotFound(id)) => {
                self.session.cancel();
                Err(ExpenseError::NotFound(id))
            }
            // Validation / store failures keep the edit open for a retry
            Err(e) => Err(e),
        }
    }

    pub fn remove(&mut self, id: ExpenseId) -> Result<()> {
        let result = self.store.delete(id);
        if result.is_ok() || matches!(result, Err(ExpenseError::NotFound(_))) {
            self.session.record_removed(id);
        }
        result
    }

    pub fn clear(&mut self) -> Result<usize> {
        let removed = self.store.clear()?;
        self.session.store_cleared();
        Ok(removed)
    }

    // ========================================================================
    // DISPLAY SET
    // ========================================================================

    /// Make the rows of `path` the active display set.
    /// On rejection the current display set is left as it was.
    pub fn import(&mut self, path: &Path) -> Result<ImportReport> {
        let report = import_file(path)?;
        info!(
            file = %path.display(),
            rows = report.rows.len(),
            dropped = report.dropped,
            "showing imported expenses"
        );
        self.imported = Some(ImportedSet {
            source: path.to_path_buf(),
            rows: report.rows.clone(),
        });
        Ok(report)
    }

    /// Persist the imported rows, then switch back to saved data
    pub fn save_imported(&mut self) -> Result<Vec<ExpenseId>> {
        let Some(set) = self.imported.take() else {
            return Ok(Vec::new());
        };

        let mut ids = Vec::with_capacity(set.rows.len());
        for (saved, details) in set.rows.iter().enumerate() {
            match self.store.create(details) {
                Ok(id) => ids.push(id),
                Err(e) => {
                    // Keep the unsaved remainder on display
                    self.imported = Some(ImportedSet {
                        source: set.source.clone(),
                        rows: set.rows[saved..].to_vec(),
                    });
                    return Err(e);
                }
            }
        }
        Ok(ids)
    }

    pub fn show_saved(&mut self) {
        self.imported = None;
    }

    pub fn is_showing_import(&self) -> bool {
        self.imported.is_some()
    }

    /// Fresh projection of the active display set
    pub fn snapshot(&self) -> Result<Projection> {
        match &self.imported {
            Some(set) => Ok(Projection::from_import(set.source.clone(), set.rows.clone())),
            None => Projection::load(&self.store),
        }
    }

    pub fn category_totals(&self) -> Result<Vec<CategoryTotal>> {
        Ok(self.snapshot()?.category_totals())
    }

    pub fn period_totals(&self, granularity: Granularity) -> Result<Vec<PeriodTotal>> {
        Ok(self.snapshot()?.period_totals(granularity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::Category;
    use crate::projection::Origin;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn test_book() -> (TempDir, ExpenseBook) {
        let dir = TempDir::new().unwrap();
        let store = ExpenseStore::open(dir.path().join("book.db")).unwrap();
        (dir, ExpenseBook::new(store))
    }

    fn details(category: Category, amount: f64, date: &str, description: &str) -> ExpenseDetails {
        ExpenseDetails::new(
            category,
            amount,
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            description,
        )
    }

    #[test]
    fn test_edit_round_trip() {
        let (_dir, mut book) = test_book();
        let id = book.add(&details(Category::Food, 8.0, "2024-04-01", "Tacos")).unwrap();

        let current = book.begin_edit(id).unwrap();
        assert_eq!(current.details.description, "Tacos");
        assert_eq!(book.session(), EditSession::Editing(id));

        let fixed = details(Category::Food, 9.5, "2024-04-01", "Tacos + drink");
        assert_eq!(book.confirm_edit(&fixed).unwrap(), id);
        assert_eq!(book.session(), EditSession::Idle);
        assert_eq!(book.store().find(id).unwrap().details, fixed);
    }

    #[test]
    fn test_begin_edit_on_missing_record() {
        let (_dir, mut book) = test_book();

        let err = book.begin_edit(ExpenseId::new(77)).unwrap_err();
        assert!(matches!(err, ExpenseError::NotFound(_)));
        assert_eq!(book.session(), EditSession::Idle);
    }

    #[test]
    fn test_deleting_other_record_keeps_edit_target() {
        let (_dir, mut book) = test_book();
        let first = book.add(&details(Category::Food, 1.0, "2024-01-01", "first")).unwrap();
        let second = book.add(&details(Category::Food, 2.0, "2024-01-02", "second")).unwrap();

        book.begin_edit(second).unwrap();
        book.remove(first).unwrap();
        assert_eq!(book.session().editing(), Some(second));

        // Confirm still lands on the record that was selected
        let fixed = details(Category::Other, 20.0, "2024-01-02", "second, fixed");
        book.confirm_edit(&fixed).unwrap();
        let all = book.store().read_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, second);
        assert_eq!(all[0].details, fixed);

        println!("✅ Stable edit target test PASSED");
    }

    #[test]
    fn test_deleting_edit_target_clears_session() {
        let (_dir, mut book) = test_book();
        let id = book.add(&details(Category::Food, 1.0, "2024-01-01", "doomed")).unwrap();
        let other = book.add(&details(Category::Food, 2.0, "2024-01-02", "bystander")).unwrap();

        book.begin_edit(id).unwrap();
        book.remove(id).unwrap();
        assert_eq!(book.session().editing(), None);

        let err = book
            .confirm_edit(&details(Category::Food, 5.0, "2024-01-01", "too late"))
            .unwrap_err();
        assert!(matches!(err, ExpenseError::NotFound(missing) if missing == id));
        assert_eq!(book.session(), EditSession::Idle);

        // The other record was not touched by the stale confirm
        assert_eq!(book.store().find(other).unwrap().details.description, "bystander");
    }

    #[test]
    fn test_target_removed_by_another_process() {
        let (dir, mut book) = test_book();
        let id = book.add(&details(Category::Food, 1.0, "2024-01-01", "shared")).unwrap();
        book.begin_edit(id).unwrap();

        let elsewhere = ExpenseStore::open(dir.path().join("book.db")).unwrap();
        elsewhere.delete(id).unwrap();

        let err = book
            .confirm_edit(&details(Category::Food, 5.0, "2024-01-01", "edit"))
            .unwrap_err();
        assert!(matches!(err, ExpenseError::NotFound(_)));
        assert_eq!(book.session(), EditSession::Idle);
        assert!(book.store().read_all().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_confirm_keeps_session() {
        let (_dir, mut book) = test_book();
        let id = book.add(&details(Category::Food, 1.0, "2024-01-01", "keep")).unwrap();
        book.begin_edit(id).unwrap();

        let err = book
            .confirm_edit(&details(Category::Food, -1.0, "2024-01-01", "keep"))
            .unwrap_err();
        assert!(matches!(err, ExpenseError::Validation { .. }));
        assert_eq!(book.session(), EditSession::Editing(id));
    }

    #[test]
    fn test_confirm_without_edit() {
        let (_dir, mut book) = test_book();
        let err = book
            .confirm_edit(&details(Category::Food, 1.0, "2024-01-01", "x"))
            .unwrap_err();
        assert!(matches!(err, ExpenseError::NoEditInProgress));
    }

    #[test]
    fn test_clear_orphans_edit() {
        let (_dir, mut book) = test_book();
        let id = book.add(&details(Category::Food, 1.0, "2024-01-01", "x")).unwrap();
        book.begin_edit(id).unwrap();

        assert_eq!(book.clear().unwrap(), 1);
        assert!(matches!(
            book.confirm_edit(&details(Category::Food, 1.0, "2024-01-01", "y")),
            Err(ExpenseError::NotFound(_))
        ));

        book.add(&details(Category::Food, 1.0, "2024-01-01", "after clear")).unwrap();
        assert_eq!(book.snapshot().unwrap().len(), 1);
    }

    #[test]
    fn test_aggregates_track_mutations() {
        let (_dir, mut book) = test_book();
        book.add(&details(Category::Food, 10.0, "2024-01-05", "a")).unwrap();
        book.add(&details(Category::Food, 5.0, "2024-01-20", "b")).unwrap();
        let ride = book.add(&details(Category::Transport, 3.0, "2024-02-01", "c")).unwrap();

        let months = book.period_totals(Granularity::Month).unwrap();
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].period.to_string(), "2024-01");
        assert_eq!(months[0].total, 15.0);

        book.remove(ride).unwrap();
        let categories = book.category_totals().unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].category, Category::Food);
        assert_eq!(categories[0].total, 15.0);
    }

    #[test]
    fn test_rejected_import_keeps_display_set() {
        let (dir, mut book) = test_book();
        book.add(&details(Category::Food, 10.0, "2024-01-05", "saved")).unwrap();

        let bad = dir.path().join("bad.csv");
        fs::write(&bad, "Category,Amount,Date\nFood,1,2024-01-01\n").unwrap();

        let err = book.import(&bad).unwrap_err();
        assert!(matches!(err, ExpenseError::ImportRejected { .. }));

        let snapshot = book.snapshot().unwrap();
        assert_eq!(snapshot.origin(), &Origin::Store);
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_import_becomes_display_set() {
        let (dir, mut book) = test_book();
        book.add(&details(Category::Food, 10.0, "2024-01-05", "saved")).unwrap();

        let good = dir.path().join("good.csv");
        fs::write(
            &good,
            "Category,Amount,Date,Description\nUtilities,60,2024-02-01,Power\nOther,5,2024-02-03,\n",
        )
        .unwrap();

        let report = book.import(&good).unwrap();
        assert_eq!(report.dropped, 1);

        let totals = book.category_totals().unwrap();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].category, Category::Utilities);
        // Import does not write to the store
        assert_eq!(book.store().count().unwrap(), 1);

        book.show_saved();
        assert_eq!(book.snapshot().unwrap().origin(), &Origin::Store);
    }

    #[test]
    fn test_save_imported() {
        let (dir, mut book) = test_book();
        let file = dir.path().join("upload.csv");
        fs::write(
            &file,
            "Category,Amount,Date,Description\nFood,4,2024-02-01,Bagel\nFood,6,2024-02-02,Soup\n",
        )
        .unwrap();

        book.import(&file).unwrap();
        let ids = book.save_imported().unwrap();

        assert_eq!(ids.len(), 2);
        assert!(!book.is_showing_import());
        assert_eq!(book.snapshot().unwrap().total(), 10.0);
    }
}
