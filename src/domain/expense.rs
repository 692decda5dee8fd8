use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Amount, MemberId};

pub type ExpenseId = Uuid;

pub const DEFAULT_CATEGORY: &str = "General";

/// How the shares of an expense were originally decided. Informational only:
/// balances are always computed from the explicit shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitType {
    Equal,
    #[default]
    Exact,
    Percentage,
}

impl SplitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitType::Equal => "equal",
            SplitType::Exact => "exact",
            SplitType::Percentage => "percentage",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "equal" => Some(SplitType::Equal),
            "exact" => Some(SplitType::Exact),
            "percentage" => Some(SplitType::Percentage),
            _ => None,
        }
    }
}

impl std::fmt::Display for SplitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One member's portion of an expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub member: MemberId,
    /// What this member owes towards the expense
    pub share: Amount,
}

impl Participant {
    pub fn new(member: MemberId, share: Amount) -> Self {
        Self { member, share }
    }
}

/// A shared cost fronted by one member and owed by the participants.
///
/// Amounts and shares are expected to be non-negative and the shares are
/// expected to add up to `amount`. Neither is enforced here: validation
/// belongs to whoever records the expense, and `check_integrity` reports
/// violations after the fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(default = "Uuid::new_v4")]
    pub id: ExpenseId,
    /// Total cost
    pub amount: Amount,
    /// Member who fronted the money
    pub payer: MemberId,
    /// Ordered list of who owes what
    pub participants: Vec<Participant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_category")]
    pub category: String,
    /// When the expense happened; undated expenses are kept out of date-bounded views
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub split_type: SplitType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Expense {
    pub fn new(amount: Amount, payer: MemberId, participants: Vec<Participant>) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount,
            payer,
            participants,
            description: None,
            category: default_category(),
            date: None,
            split_type: SplitType::default(),
            notes: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_split_type(mut self, split_type: SplitType) -> Self {
        self.split_type = split_type;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Sum of all participant shares
    pub fn shares_total(&self) -> Amount {
        self.participants.iter().map(|p| p.share).sum()
    }

    /// Every member referenced by this expense, payer first.
    pub fn member_ids(&self) -> impl Iterator<Item = MemberId> + '_ {
        std::iter::once(self.payer).chain(self.participants.iter().map(|p| p.member))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_create_expense() {
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let expense = Expense::new(
            dec!(100),
            alice,
            vec![Participant::new(alice, dec!(50)), Participant::new(bob, dec!(50))],
        )
        .with_description("Dinner")
        .with_category("Food");

        assert_eq!(expense.amount, dec!(100));
        assert_eq!(expense.payer, alice);
        assert_eq!(expense.shares_total(), dec!(100));
        assert_eq!(expense.description.as_deref(), Some("Dinner"));
        assert_eq!(expense.category, "Food");
        assert_eq!(expense.split_type, SplitType::Exact);
        assert_eq!(expense.member_ids().collect::<Vec<_>>(), vec![alice, alice, bob]);
    }

    #[test]
    fn test_split_type_roundtrip() {
        for st in [SplitType::Equal, SplitType::Exact, SplitType::Percentage] {
            assert_eq!(SplitType::from_str(st.as_str()), Some(st));
        }
        assert_eq!(SplitType::from_str("EQUAL"), Some(SplitType::Equal));
        assert_eq!(SplitType::from_str("shares"), None);
    }

    #[test]
    fn test_deserialize_minimal_expense() {
        let json = r#"{
            "amount": 12.5,
            "payer": "6f1c1a52-8a3e-4f4e-9d5c-2f7b9c1d0a11",
            "participants": [
                { "member": "6f1c1a52-8a3e-4f4e-9d5c-2f7b9c1d0a11", "share": "12.5" }
            ]
        }"#;

        let expense: Expense = serde_json::from_str(json).unwrap();

        assert_eq!(expense.amount, dec!(12.5));
        assert_eq!(expense.shares_total(), dec!(12.5));
        assert_eq!(expense.category, DEFAULT_CATEGORY);
        assert!(expense.date.is_none());
    }
}
