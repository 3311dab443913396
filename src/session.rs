// ✏️ Edit Session - which expense (if any) the user is currently editing
//
// Passed explicitly between the caller and the core instead of living in
// ambient UI state. Holds an identity, never a row position.

use crate::error::{ExpenseError, Result};
use crate::expense::ExpenseId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EditSession {
    /// No edit in progress
    #[default]
    Idle,

    /// The user selected this expense and has not confirmed or cancelled yet
    Editing(ExpenseId),

    /// The target was removed under the session. Behaves like `Idle` for
    /// display, but a confirm reports `NotFound` for the retired id.
    Orphaned(ExpenseId),
}

impl EditSession {
    /// Identity being edited, if an edit is actually in progress
    pub fn editing(&self) -> Option<ExpenseId> {
        match self {
            EditSession::Editing(id) => Some(*id),
            EditSession::Idle | EditSession::Orphaned(_) => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing().is_some()
    }

    /// Select a record; replaces any previous selection
    pub fn begin(&mut self, id: ExpenseId) {
        *self = EditSession::Editing(id);
    }

    pub fn cancel(&mut self) {
        *self = EditSession::Idle;
    }

    /// Another path removed `id`; only matters if it is our target
    pub fn record_removed(&mut self, id: ExpenseId) {
        if *self == EditSession::Editing(id) {
            *self = EditSession::Orphaned(id);
        }
    }

    /// Every record was removed
    pub fn store_cleared(&mut self) {
        if let EditSession::Editing(id) = *self {
            *self = EditSession::Orphaned(id);
        }
    }

    /// Identity to confirm against, or the reason there is none.
    /// An orphaned session is consumed here and drops back to `Idle`.
    pub fn target(&mut self) -> Result<ExpenseId> {
        match *self {
            EditSession::Editing(id) => Ok(id),
            EditSession::Orphaned(id) => {
                *self = EditSession::Idle;
                Err(ExpenseError::NotFound(id))
            }
            EditSession::Idle => Err(ExpenseError::NoEditInProgress),
        }
    }

    /// Confirmed update went through
    pub fn finish(&mut self) {
        *self = EditSession::Idle;
    }
}
