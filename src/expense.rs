// 🧾 Expense Entity - the one record this application tracks
//
// "Position is not identity": an expense keeps the id the store gave it
// for its whole life, no matter how many other rows come and go.
//
// - ExpenseId: surrogate key assigned once by the store, never reused
// - Category: closed enumeration, no free-form categories
// - ExpenseDetails: the four user-editable values (replaced wholesale on update)

use crate::error::{ExpenseError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// IDENTITY
// ============================================================================

/// Durable identity of an expense (SQLite AUTOINCREMENT rowid)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(i64);

impl ExpenseId {
    pub fn new(raw: i64) -> Self {
        ExpenseId(raw)
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl FromStr for ExpenseId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(ExpenseId)
    }
}

impl ToSql for ExpenseId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for ExpenseId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_i64().map(ExpenseId)
    }
}

// ============================================================================
// CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Food,
    Transport,
    Entertainment,
    Utilities,
    Healthcare,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category '{0}' (expected one of Food, Transport, Entertainment, Utilities, Healthcare, Other)")]
pub struct UnknownCategory(pub String);

impl Category {
    /// Every category, in display order
    pub const ALL: [Category; 6] = [
        Category::Food,
        Category::Transport,
        Category::Entertainment,
        Category::Utilities,
        Category::Healthcare,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Entertainment => "Entertainment",
            Category::Utilities => "Utilities",
            Category::Healthcare => "Healthcare",
            Category::Other => "Other",
        }
    }

    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|c| c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn previous(&self) -> Self {
        let idx = Self::ALL.iter().position(|c| c == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCategory(wanted.to_string()))
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: UnknownCategory| FromSqlError::Other(Box::new(e)))
    }
}

// ============================================================================
// FIELD PARSING
// ============================================================================

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Parse a calendar date, dropping any time-of-day part
///
/// Accepts `2024-03-15`, `2024-03-15 00:00:00` (spreadsheet exports)
/// and `03/15/2024`.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let s = input.trim();

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Ok(date);
        }
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(datetime.date());
    }

    Err(ExpenseError::validation(
        "date",
        format!("'{}' is not a date (use YYYY-MM-DD)", s),
    ))
}

/// Parse a non-negative amount; a leading `$` is tolerated
pub fn parse_amount(input: &str) -> Result<f64> {
    let s = input.trim().trim_start_matches('$').trim();
    let amount: f64 = s
        .parse()
        .map_err(|_| ExpenseError::validation("amount", format!("'{}' is not a number", s)))?;
    // "-0" means zero; keep the sign bit out of the store
    let amount = amount + 0.0;
    check_amount(amount)?;
    Ok(amount)
}

pub fn parse_category(input: &str) -> Result<Category> {
    input
        .parse()
        .map_err(|e: UnknownCategory| ExpenseError::validation("category", e.to_string()))
}

fn check_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() {
        return Err(ExpenseError::validation("amount", "must be a finite number"));
    }
    if amount.is_sign_negative() {
        return Err(ExpenseError::validation(
            "amount",
            format!("must not be negative, got {:.2}", amount),
        ));
    }
    Ok(())
}

// ============================================================================
// EXPENSE VALUES
// ============================================================================

/// User-editable part of an expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDetails {
    pub category: Category,
    pub amount: f64,
    pub date: NaiveDate,
    pub description: String,
}

impl ExpenseDetails {
    pub fn new(
        category: Category,
        amount: f64,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Self {
        ExpenseDetails {
            category,
            amount,
            date,
            description: description.into(),
        }
    }

    /// Build from raw text fields (form input, CSV cells)
    pub fn parse(category: &str, amount: &str, date: &str, description: &str) -> Result<Self> {
        Ok(ExpenseDetails {
            category: parse_category(category)?,
            amount: parse_amount(amount)?,
            date: parse_date(date)?,
            description: description.trim().to_string(),
        })
    }

    /// Reject values the store must never hold
    pub fn validate(&self, require_description: bool) -> Result<()> {
        check_amount(self.amount)?;
        if require_description && self.description.trim().is_empty() {
            return Err(ExpenseError::validation("description", "is required"));
        }
        Ok(())
    }
}

/// An expense as stored: identity plus current values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    #[serde(flatten)]
    pub details: ExpenseDetails,
}
