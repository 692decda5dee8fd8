use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{
    Amount, Expense, IntegrityReport, Member, MemberId, Split, build_integrity_report,
    calculate_settlements, compute_member_balance, round_cents,
};

use super::{
    AppError, ExpenseStore, GroupSettlement, MemberBalance, MemberRosterProvider, SettlementView,
};

/// Application service for one group's expenses.
/// This is the primary interface for any client (CLI, API, etc.).
pub struct SettlementService<S> {
    store: S,
}

/// Filter for narrowing the expenses a computation runs over
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub category: Option<String>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
}

impl ExpenseFilter {
    /// No filtering at all
    pub fn all() -> Self {
        Self::default()
    }

    fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
    }

    fn is_date_bounded(&self) -> bool {
        self.from_date.is_some() || self.to_date.is_some()
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        if let Some(category) = self.category() {
            if !expense.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }

        if self.is_date_bounded() {
            let Some(date) = expense.date else {
                return false;
            };
            if self.from_date.is_some_and(|from| date < from) {
                return false;
            }
            if self.to_date.is_some_and(|to| date > to) {
                return false;
            }
        }

        true
    }
}

/// Who shares a new expense, with members referenced by name or id
#[derive(Debug, Clone, PartialEq)]
pub enum SplitRequest {
    Equal(Vec<String>),
    Exact(Vec<(String, Amount)>),
    Percentage(Vec<(String, Decimal)>),
}

impl<S: ExpenseStore + MemberRosterProvider> SettlementService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ========================
    // Roster
    // ========================

    /// The group roster, rejecting duplicated member ids.
    pub fn roster(&self) -> Result<Vec<Member>, AppError> {
        let members = self.store.members()?;
        let mut seen = HashSet::new();
        for member in &members {
            if !seen.insert(member.id) {
                return Err(AppError::DuplicateMember(member.id));
            }
        }
        Ok(members)
    }

    /// Look up a member by id, or by name when the key is not an id.
    pub fn find_member(&self, key: &str) -> Result<Member, AppError> {
        find_in_roster(&self.roster()?, key)
    }

    // ========================
    // Expenses
    // ========================

    pub fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>, AppError> {
        let expenses: Vec<Expense> = self
            .store
            .expenses()?
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect();
        tracing::debug!(count = expenses.len(), "loaded expenses");
        Ok(expenses)
    }

    /// Build a new expense from a split request, resolving member names
    /// against the roster. Nothing is stored.
    pub fn build_expense(
        &self,
        amount: Amount,
        payer: &str,
        request: SplitRequest,
    ) -> Result<Expense, AppError> {
        if amount <= Amount::ZERO {
            return Err(AppError::InvalidAmount(
                "Amount must be positive".to_string(),
            ));
        }

        let roster = self.roster()?;
        let payer = find_in_roster(&roster, payer)?;
        let resolve = |key: &str| find_in_roster(&roster, key).map(|m| m.id);

        let split = match request {
            SplitRequest::Equal(keys) => Split::Equal(
                keys.iter()
                    .map(|k| resolve(k.as_str()))
                    .collect::<Result<_, _>>()?,
            ),
            SplitRequest::Exact(pairs) => Split::Exact(
                pairs
                    .iter()
                    .map(|(k, share)| resolve(k).map(|id| (id, *share)))
                    .collect::<Result<_, _>>()?,
            ),
            SplitRequest::Percentage(pairs) => Split::Percentage(
                pairs
                    .iter()
                    .map(|(k, pct)| resolve(k).map(|id| (id, *pct)))
                    .collect::<Result<_, _>>()?,
            ),
        };

        Ok(split.into_expense(amount, payer.id)?)
    }

    // ========================
    // Balances and settlements
    // ========================

    /// Balance of every roster member, in roster order.
    pub fn balances(&self, filter: &ExpenseFilter) -> Result<Vec<MemberBalance>, AppError> {
        Ok(self.settle(filter)?.balances)
    }

    /// Balance of one member.
    pub fn member_balance(
        &self,
        key: &str,
        filter: &ExpenseFilter,
    ) -> Result<MemberBalance, AppError> {
        let member = self.find_member(key)?;
        let expenses = self.list_expenses(filter)?;
        let balance = round_cents(compute_member_balance(member.id, &expenses));
        Ok(MemberBalance { member, balance })
    }

    /// Balances and the payments that clear them, with members resolved.
    pub fn settle(&self, filter: &ExpenseFilter) -> Result<GroupSettlement, AppError> {
        let roster = self.roster()?;
        let expenses = self.list_expenses(filter)?;
        let outcome = calculate_settlements(&expenses, &roster);

        tracing::debug!(
            members = roster.len(),
            expenses = expenses.len(),
            settlements = outcome.settlements.len(),
            "settled group"
        );

        let lookup = |id: MemberId| -> Result<Member, AppError> {
            roster
                .iter()
                .find(|m| m.id == id)
                .cloned()
                .ok_or(AppError::UnknownMember(id))
        };

        let balances = outcome
            .balances
            .iter()
            .map(|(id, balance)| {
                Ok(MemberBalance {
                    member: lookup(id)?,
                    balance: round_cents(balance),
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        let settlements = outcome
            .settlements
            .iter()
            .map(|s| {
                Ok(SettlementView {
                    from: lookup(s.from)?,
                    to: lookup(s.to)?,
                    amount: s.amount,
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(GroupSettlement {
            group: self.store.group_name(),
            expense_count: expenses.len(),
            total_spent: expenses.iter().map(|e| e.amount).sum(),
            balances,
            settlements,
        })
    }

    // ========================
    // Integrity
    // ========================

    /// Check the group's data and return a report.
    pub fn check_integrity(&self) -> Result<IntegrityReport, AppError> {
        let members = self.store.members()?;
        let expenses = self.store.expenses()?;
        let report = build_integrity_report(&members, &expenses);

        for issue in &report.issues {
            tracing::warn!(%issue, "integrity issue");
        }
        Ok(report)
    }
}

/// Resolve a member key (id or name) against a roster.
pub fn find_in_roster(roster: &[Member], key: &str) -> Result<Member, AppError> {
    if let Ok(id) = Uuid::parse_str(key.trim()) {
        return roster
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| AppError::MemberNotFound(key.to_string()));
    }

    let mut matches = roster.iter().filter(|m| m.matches_name(key));
    match (matches.next(), matches.next()) {
        (Some(member), None) => Ok(member.clone()),
        (Some(_), Some(_)) => Err(AppError::AmbiguousMember(key.to_string())),
        (None, _) => Err(AppError::MemberNotFound(key.to_string())),
    }
}
