use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{Amount, Expense, Member, MemberId};

/// Net position of every member, in insertion order.
///
/// Positive means the group owes the member, negative means the member owes
/// the group. Order is the roster order, followed by any member that only
/// appeared in expenses, so everything derived from it is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balances(IndexMap<MemberId, Amount>);

impl Balances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero balance for every roster member, in roster order.
    pub fn for_roster(members: &[Member]) -> Self {
        members.iter().map(|m| (m.id, Amount::ZERO)).collect()
    }

    /// Add to a member's balance, creating the entry if needed.
    pub fn credit(&mut self, member: MemberId, amount: Amount) {
        *self.0.entry(member).or_insert(Amount::ZERO) += amount;
    }

    /// Subtract from a member's balance, creating the entry if needed.
    pub fn debit(&mut self, member: MemberId, amount: Amount) {
        *self.0.entry(member).or_insert(Amount::ZERO) -= amount;
    }

    pub fn get(&self, member: &MemberId) -> Option<Amount> {
        self.0.get(member).copied()
    }

    pub fn contains(&self, member: &MemberId) -> bool {
        self.0.contains_key(member)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MemberId, Amount)> + '_ {
        self.0.iter().map(|(id, amount)| (*id, *amount))
    }

    pub fn members(&self) -> impl Iterator<Item = MemberId> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all balances. Zero for a consistent expense set.
    pub fn total(&self) -> Amount {
        self.0.values().copied().sum()
    }
}

impl FromIterator<(MemberId, Amount)> for Balances {
    fn from_iter<T: IntoIterator<Item = (MemberId, Amount)>>(iter: T) -> Self {
        let mut balances = Balances::new();
        for (member, amount) in iter {
            balances.credit(member, amount);
        }
        balances
    }
}

/// Compute every member's balance from a group's expenses.
///
/// The payer is credited the full amount and each participant is debited
/// their share. Members missing from the roster still get an entry so that
/// the caller can notice the inconsistency. Inputs are not validated:
/// negative amounts or shares that do not add up flow straight into the
/// result, see `build_integrity_report`.
pub fn compute_balances(members: &[Member], expenses: &[Expense]) -> Balances {
    let mut balances = Balances::for_roster(members);

    for expense in expenses {
        balances.credit(expense.payer, expense.amount);
        for participant in &expense.participants {
            balances.debit(participant.member, participant.share);
        }
    }

    tracing::trace!(
        members = balances.len(),
        expenses = expenses.len(),
        "computed balances"
    );
    balances
}

/// Balance of a single member, using the same definition as `compute_balances`.
pub fn compute_member_balance(member: MemberId, expenses: &[Expense]) -> Amount {
    expenses.iter().fold(Amount::ZERO, |balance, expense| {
        let paid = if expense.payer == member {
            expense.amount
        } else {
            Amount::ZERO
        };
        let owed: Amount = expense
            .participants
            .iter()
            .filter(|p| p.member == member)
            .map(|p| p.share)
            .sum();
        balance + paid - owed
    })
}
