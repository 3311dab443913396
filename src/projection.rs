// 📊 View Projection - read-only snapshot plus the two aggregates
//
// A projection is a point-in-time copy. It is never patched after a
// mutation; callers reload a new one instead.

use crate::error::Result;
use crate::expense::{Category, Expense, ExpenseDetails, ExpenseId};
use crate::store::ExpenseStore;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Where the rows of a projection came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Store,
    Import(PathBuf),
}

/// One displayed row. Imported rows have no durable identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedRow {
    pub id: Option<ExpenseId>,
    #[serde(flatten)]
    pub details: ExpenseDetails,
}

#[derive(Debug, Clone)]
pub struct Projection {
    origin: Origin,
    rows: Vec<ProjectedRow>,
}

impl Projection {
    /// Fresh snapshot of everything in the store
    pub fn load(store: &ExpenseStore) -> Result<Self> {
        Ok(Self::from_expenses(store.read_all()?))
    }

    pub fn from_expenses(expenses: Vec<Expense>) -> Self {
        Projection {
            origin: Origin::Store,
            rows: expenses
                .into_iter()
                .map(|e| ProjectedRow {
                    id: Some(e.id),
                    details: e.details,
                })
                .collect(),
        }
    }

    pub fn from_import(source: PathBuf, rows: Vec<ExpenseDetails>) -> Self {
        Projection {
            origin: Origin::Import(source),
            rows: rows
                .into_iter()
                .map(|details| ProjectedRow { id: None, details })
                .collect(),
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn rows(&self) -> &[ProjectedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.details.amount).sum()
    }

    // ========================================================================
    // AGGREGATES
    // ========================================================================

    /// Sum of amounts per category; each category present appears once
    pub fn category_totals(&self) -> Vec<CategoryTotal> {
        let mut totals: BTreeMap<Category, (f64, usize)> = BTreeMap::new();
        for row in &self.rows {
            let entry = totals.entry(row.details.category).or_insert((0.0, 0));
            entry.0 += row.details.amount;
            entry.1 += 1;
        }

        totals
            .into_iter()
            .map(|(category, (total, count))| CategoryTotal {
                category,
                total,
                count,
            })
            .collect()
    }

    /// Sum of amounts per day or month, oldest first
    pub fn period_totals(&self, granularity: Granularity) -> Vec<PeriodTotal> {
        let mut totals: BTreeMap<Period, (f64, usize)> = BTreeMap::new();
        for row in &self.rows {
            let entry = totals
                .entry(granularity.bucket(row.details.date))
                .or_insert((0.0, 0));
            entry.0 += row.details.amount;
            entry.1 += 1;
        }

        totals
            .into_iter()
            .map(|(period, (total, count))| PeriodTotal {
                period,
                total,
                count,
            })
            .collect()
    }
}

// ============================================================================
// AGGREGATE TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    Day,
    #[default]
    Month,
}

impl Granularity {
    pub fn bucket(&self, date: NaiveDate) -> Period {
        match self {
            Granularity::Day => Period::Day(date),
            Granularity::Month => Period::Month {
                year: date.year(),
                month: date.month(),
            },
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            Granularity::Day => Granularity::Month,
            Granularity::Month => Granularity::Day,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Granularity::Day => "Daily",
            Granularity::Month => "Monthly",
        }
    }
}

/// Time bucket key; ordering is chronological
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Period {
    Day(NaiveDate),
    Month { year: i32, month: u32 },
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Period::Day(date) => date.format("%Y-%m-%d").to_string(),
            Period::Month { year, month } => format!("{:04}-{:02}", year, month),
        };
        f.pad(&label)
    }
}

impl Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTotal {
    pub period: Period,
    pub total: f64,
    pub count: usize,
}
