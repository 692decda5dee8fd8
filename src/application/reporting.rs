use serde::{Deserialize, Serialize};

use crate::domain::{Amount, Member};

/// A member's balance with display details, rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberBalance {
    pub member: Member,
    pub balance: Amount,
}

/// A settlement with both ends resolved to roster members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementView {
    pub from: Member,
    pub to: Member,
    pub amount: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSettlement {
    pub group: String,
    pub expense_count: usize,
    pub total_spent: Amount,
    pub balances: Vec<MemberBalance>,
    pub settlements: Vec<SettlementView>,
}

impl GroupSettlement {
    pub fn is_settled(&self) -> bool {
        self.settlements.is_empty()
    }
}
