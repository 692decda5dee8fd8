use serde::{Deserialize, Serialize};

use crate::domain::{Expense, Member};

use super::AppError;

/// Supplies the expenses of one group. Amounts and shares are expected to be
/// validated already; the engine does not check them.
pub trait ExpenseStore {
    fn expenses(&self) -> Result<Vec<Expense>, AppError>;
}

/// Supplies the complete roster of one group.
pub trait MemberRosterProvider {
    fn members(&self) -> Result<Vec<Member>, AppError>;

    /// Display name of the group, empty when unknown.
    fn group_name(&self) -> String {
        String::new()
    }
}

/// Everything known about a group, held in memory. This is what the loaders
/// in `io` produce and what the CLI settles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupSnapshot {
    #[serde(default)]
    pub name: String,
    pub members: Vec<Member>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
}

impl GroupSnapshot {
    pub fn new(name: impl Into<String>, members: Vec<Member>) -> Self {
        Self {
            name: name.into(),
            members,
            expenses: Vec::new(),
        }
    }

    pub fn with_expenses(mut self, expenses: impl IntoIterator<Item = Expense>) -> Self {
        self.expenses.extend(expenses);
        self
    }
}

impl ExpenseStore for GroupSnapshot {
    fn expenses(&self) -> Result<Vec<Expense>, AppError> {
        Ok(self.expenses.clone())
    }
}

impl MemberRosterProvider for GroupSnapshot {
    fn members(&self) -> Result<Vec<Member>, AppError> {
        Ok(self.members.clone())
    }

    fn group_name(&self) -> String {
        self.name.clone()
    }
}
