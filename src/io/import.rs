use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::application::{GroupSnapshot, find_in_roster};
use crate::domain::{Amount, Expense, Member, MemberId, Split, parse_amount};

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub expenses: Vec<Expense>,
    pub errors: Vec<ImportError>,
}

impl ImportResult {
    pub fn imported(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Error that occurred during import
#[derive(Debug, Clone, PartialEq)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "line {} ({}): {}", self.line, field, self.error),
            None => write!(f, "line {}: {}", self.line, self.error),
        }
    }
}

/// One row of an expenses CSV.
///
/// `participants` is `name;name` for an equal split, `name:share;name:share`
/// for exact shares, or `name:50%;name:50%` for percentages.
#[derive(Debug, Deserialize)]
struct ExpenseRow {
    #[serde(default)]
    date: String,
    #[serde(default)]
    description: String,
    amount: String,
    #[serde(default)]
    category: String,
    paid_by: String,
    participants: String,
}

/// Load a group snapshot (roster plus expenses) from JSON.
pub fn load_snapshot<R: Read>(reader: R) -> Result<GroupSnapshot> {
    let snapshot: GroupSnapshot =
        serde_json::from_reader(reader).context("Invalid group snapshot JSON")?;
    tracing::debug!(
        members = snapshot.members.len(),
        expenses = snapshot.expenses.len(),
        "loaded group snapshot"
    );
    Ok(snapshot)
}

pub fn load_snapshot_file(path: &Path) -> Result<GroupSnapshot> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open group file '{}'", path.display()))?;
    load_snapshot(file)
}

/// Read expenses from CSV, resolving members by name against `roster`.
/// Bad rows are collected in the result instead of aborting the import.
pub fn import_expenses_csv<R: Read>(reader: R, roster: &[Member]) -> Result<ImportResult> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut result = ImportResult::default();

    for (line_num, row) in csv_reader.deserialize::<ExpenseRow>().enumerate() {
        let line = line_num + 2; // +2 for header and 0-indexing

        let row = match row {
            Ok(r) => r,
            Err(e) => {
                result.errors.push(ImportError {
                    line,
                    field: None,
                    error: format!("CSV parse error: {}", e),
                });
                continue;
            }
        };

        match parse_row(row, roster) {
            Ok(expense) => result.expenses.push(expense),
            Err((field, error)) => result.errors.push(ImportError {
                line,
                field: Some(field.to_string()),
                error,
            }),
        }
    }

    if !result.is_clean() {
        tracing::warn!(errors = result.errors.len(), "some expense rows were rejected");
    }
    Ok(result)
}

pub fn import_expenses_file(path: &Path, roster: &[Member]) -> Result<ImportResult> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open expenses file '{}'", path.display()))?;
    import_expenses_csv(file, roster)
}

type RowError = (&'static str, String);

fn parse_row(row: ExpenseRow, roster: &[Member]) -> Result<Expense, RowError> {
    let amount = parse_amount(&row.amount).map_err(|e| ("amount", format!("Invalid amount: {}", e)))?;
    if amount <= Amount::ZERO {
        return Err(("amount", "Amount must be positive".to_string()));
    }

    let payer = find_in_roster(roster, &row.paid_by).map_err(|e| ("paid_by", e.to_string()))?;
    let split = parse_participants(&row.participants, roster).map_err(|e| ("participants", e))?;
    let mut expense = split
        .into_expense(amount, payer.id)
        .map_err(|e| ("participants", e.to_string()))?;

    if !row.date.trim().is_empty() {
        let date = parse_date(&row.date).map_err(|e| ("date", e.to_string()))?;
        expense = expense.with_date(date);
    }
    if !row.description.trim().is_empty() {
        expense = expense.with_description(row.description.trim());
    }
    if !row.category.trim().is_empty() {
        expense = expense.with_category(row.category.trim());
    }

    Ok(expense)
}

fn parse_participants(input: &str, roster: &[Member]) -> Result<Split, String> {
    let entries: Vec<&str> = input
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if entries.is_empty() {
        return Err("No participants".to_string());
    }

    let resolve = |name: &str| -> Result<MemberId, String> {
        find_in_roster(roster, name)
            .map(|m| m.id)
            .map_err(|e| e.to_string())
    };

    if entries.iter().all(|e| !e.contains(':')) {
        let members = entries
            .iter()
            .map(|name| resolve(*name))
            .collect::<Result<_, _>>()?;
        return Ok(Split::Equal(members));
    }

    let mut pairs = Vec::with_capacity(entries.len());
    let mut percentages = 0;
    for entry in &entries {
        let (name, value) = entry
            .split_once(':')
            .ok_or_else(|| format!("Missing share for '{}'", entry))?;
        let value = value.trim();
        let (value, is_percentage) = match value.strip_suffix('%') {
            Some(v) => (v, true),
            None => (value, false),
        };
        if is_percentage {
            percentages += 1;
        }
        let value = parse_amount(value).map_err(|e| format!("Invalid share for '{}': {}", name, e))?;
        pairs.push((resolve(name)?, value));
    }

    match percentages {
        0 => Ok(Split::Exact(pairs)),
        n if n == pairs.len() => Ok(Split::Percentage(pairs)),
        _ => Err("Cannot mix percentages and amounts".to_string()),
    }
}

/// Parse a date given as RFC 3339 or `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    anyhow::bail!("Invalid date format: {}", s)
}
