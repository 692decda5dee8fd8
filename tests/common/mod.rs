// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::path::PathBuf;

use anyhow::Result;
use quota::application::{GroupSnapshot, SettlementService};
use quota::domain::{Amount, Expense, Member, MemberId, Participant};
use tempfile::TempDir;
use uuid::Uuid;

/// Member with a stable id, so failures are easy to read
pub fn member(n: u128, name: &str) -> Member {
    Member::new(name)
        .with_id(Uuid::from_u128(n))
        .with_email(format!("{}@example.com", name.to_lowercase()))
}

/// Alice, Bob and Carol, in that order
pub fn trio() -> Vec<Member> {
    vec![member(1, "Alice"), member(2, "Bob"), member(3, "Carol")]
}

/// Expense where every listed member owes the same explicit share
pub fn equal_expense(amount: Amount, payer: MemberId, among: &[MemberId]) -> Expense {
    let share = amount / Amount::from(among.len());
    Expense::new(
        amount,
        payer,
        among.iter().map(|m| Participant::new(*m, share)).collect(),
    )
}

pub fn test_service(snapshot: GroupSnapshot) -> SettlementService<GroupSnapshot> {
    SettlementService::new(snapshot)
}

/// Write a snapshot as JSON into a fresh temporary directory
pub fn write_group(snapshot: &GroupSnapshot) -> Result<(PathBuf, TempDir)> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("group.json");
    std::fs::write(&path, serde_json::to_string_pretty(snapshot)?)?;
    Ok((path, temp_dir))
}
