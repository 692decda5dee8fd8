use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Amount, Balances, Expense, ExpenseId, Member, MemberId, TOLERANCE, compute_balances};

/// Something in a group's data that breaks the expectations of the balance
/// engine. The engine itself never rejects input; this is how callers find
/// out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityIssue {
    DuplicateMember {
        member: MemberId,
    },
    UnknownMember {
        expense: ExpenseId,
        member: MemberId,
    },
    NegativeAmount {
        expense: ExpenseId,
        amount: Amount,
    },
    NegativeShare {
        expense: ExpenseId,
        member: MemberId,
        share: Amount,
    },
    ShareMismatch {
        expense: ExpenseId,
        amount: Amount,
        shares: Amount,
    },
    Unbalanced {
        total: Amount,
    },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::DuplicateMember { member } => {
                write!(f, "member {} is listed more than once", member)
            }
            IntegrityIssue::UnknownMember { expense, member } => {
                write!(f, "expense {} references unknown member {}", expense, member)
            }
            IntegrityIssue::NegativeAmount { expense, amount } => {
                write!(f, "expense {} has negative amount {}", expense, amount)
            }
            IntegrityIssue::NegativeShare {
                expense,
                member,
                share,
            } => write!(
                f,
                "expense {} gives member {} a negative share {}",
                expense, member, share
            ),
            IntegrityIssue::ShareMismatch {
                expense,
                amount,
                shares,
            } => write!(
                f,
                "expense {} shares add up to {} instead of {}",
                expense, shares, amount
            ),
            IntegrityIssue::Unbalanced { total } => {
                write!(f, "balances add up to {} instead of zero", total)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub member_count: usize,
    pub expense_count: usize,
    pub total_spent: Amount,
    pub balances: Balances,
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn is_balanced(&self) -> bool {
        self.balances.total().abs() <= TOLERANCE
    }
}

/// Check a group's roster and expenses for everything the balance engine
/// silently tolerates.
pub fn build_integrity_report(members: &[Member], expenses: &[Expense]) -> IntegrityReport {
    let mut issues = Vec::new();

    let mut roster = HashSet::new();
    for member in members {
        if !roster.insert(member.id) {
            issues.push(IntegrityIssue::DuplicateMember { member: member.id });
        }
    }

    for expense in expenses {
        let mut reported = HashSet::new();
        for member in expense.member_ids() {
            if !roster.contains(&member) && reported.insert(member) {
                issues.push(IntegrityIssue::UnknownMember {
                    expense: expense.id,
                    member,
                });
            }
        }

        if expense.amount < Amount::ZERO {
            issues.push(IntegrityIssue::NegativeAmount {
                expense: expense.id,
                amount: expense.amount,
            });
        }

        for participant in &expense.participants {
            if participant.share < Amount::ZERO {
                issues.push(IntegrityIssue::NegativeShare {
                    expense: expense.id,
                    member: participant.member,
                    share: participant.share,
                });
            }
        }

        let shares = expense.shares_total();
        if (shares - expense.amount).abs() > TOLERANCE {
            issues.push(IntegrityIssue::ShareMismatch {
                expense: expense.id,
                amount: expense.amount,
                shares,
            });
        }
    }

    let balances = compute_balances(members, expenses);
    let total = balances.total();
    if total.abs() > TOLERANCE {
        issues.push(IntegrityIssue::Unbalanced { total });
    }

    IntegrityReport {
        member_count: roster.len(),
        expense_count: expenses.len(),
        total_spent: expenses.iter().map(|e| e.amount).sum(),
        balances,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;
    use crate::domain::Participant;

    fn pair() -> Vec<Member> {
        vec![Member::new("Alice"), Member::new("Bob")]
    }

    #[test]
    fn test_consistent_group_is_healthy() {
        let members = pair();
        let expenses = vec![Expense::new(
            dec!(100),
            members[0].id,
            vec![
                Participant::new(members[0].id, dec!(50)),
                Participant::new(members[1].id, dec!(50)),
            ],
        )];

        let report = build_integrity_report(&members, &expenses);

        assert!(report.is_healthy());
        assert!(report.is_balanced());
        assert_eq!(report.member_count, 2);
        assert_eq!(report.expense_count, 1);
        assert_eq!(report.total_spent, dec!(100));
    }

    #[test]
    fn test_share_mismatch_and_unbalanced() {
        let members = pair();
        let expense = Expense::new(
            dec!(100),
            members[0].id,
            vec![Participant::new(members[1].id, dec!(60))],
        );
        let expense_id = expense.id;

        let report = build_integrity_report(&members, &[expense]);

        assert!(!report.is_balanced());
        assert_eq!(
            report.issues,
            vec![
                IntegrityIssue::ShareMismatch {
                    expense: expense_id,
                    amount: dec!(100),
                    shares: dec!(60),
                },
                IntegrityIssue::Unbalanced { total: dec!(40) },
            ]
        );
    }

    #[test]
    fn test_unknown_member_reported_once_per_expense() {
        let members = pair();
        let stranger = Uuid::new_v4();
        let expense = Expense::new(
            dec!(10),
            stranger,
            vec![Participant::new(stranger, dec!(10))],
        );

        let report = build_integrity_report(&members, &[expense]);

        let unknown: Vec<_> = report
            .issues
            .iter()
            .filter(|i| matches!(i, IntegrityIssue::UnknownMember { .. }))
            .collect();
        assert_eq!(unknown.len(), 1);
        assert!(report.is_balanced());
    }

    #[test]
    fn test_negative_values_and_duplicates() {
        let mut members = pair();
        members.push(members[0].clone());
        let expense = Expense::new(
            dec!(-10),
            members[0].id,
            vec![Participant::new(members[1].id, dec!(-10))],
        );

        let report = build_integrity_report(&members, &[expense]);

        assert_eq!(report.member_count, 2);
        assert!(report.issues.iter().any(|i| matches!(i, IntegrityIssue::DuplicateMember { .. })));
        assert!(report.issues.iter().any(|i| matches!(i, IntegrityIssue::NegativeAmount { .. })));
        assert!(report.issues.iter().any(|i| matches!(i, IntegrityIssue::NegativeShare { .. })));
    }

    #[test]
    fn test_issue_display() {
        let issue = IntegrityIssue::Unbalanced { total: dec!(40) };
        assert_eq!(issue.to_string(), "balances add up to 40 instead of zero");
    }
}
