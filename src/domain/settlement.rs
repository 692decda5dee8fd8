use serde::{Deserialize, Serialize};

use super::{Amount, Balances, Expense, Member, MemberId, TOLERANCE, compute_balances, round_cents};

/// A proposed payment: `from` pays `to` this amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub from: MemberId,
    pub to: MemberId,
    /// Rounded to cents, always at least 0.01
    pub amount: Amount,
}

/// Balances of a group together with the payments that clear them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementOutcome {
    pub balances: Balances,
    pub settlements: Vec<Settlement>,
}

struct Position {
    member: MemberId,
    owed: Amount,
}

/// Turn balances into a list of payments that brings everyone back to zero.
///
/// Greedy two-pointer walk over debtors and creditors, both taken in the
/// balances' own order. Each step moves the smaller of the two outstanding
/// amounts, so there are at most `debtors + creditors - 1` payments. The
/// result is reproducible but not guaranteed to be the smallest possible
/// plan. Balances within a cent of zero are considered settled. If the
/// balances do not sum to zero, whatever is left unmatched is dropped.
pub fn resolve_settlements(balances: &Balances) -> Vec<Settlement> {
    let mut debtors = Vec::new();
    let mut creditors = Vec::new();

    for (member, balance) in balances.iter() {
        if balance < -TOLERANCE {
            debtors.push(Position {
                member,
                owed: -balance,
            });
        } else if balance > TOLERANCE {
            creditors.push(Position {
                member,
                owed: balance,
            });
        }
    }

    let mut settlements = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < debtors.len() && j < creditors.len() {
        let debtor = &mut debtors[i];
        let creditor = &mut creditors[j];
        let amount = debtor.owed.min(creditor.owed);

        if amount > TOLERANCE {
            settlements.push(Settlement {
                from: debtor.member,
                to: creditor.member,
                amount: round_cents(amount),
            });
        }

        debtor.owed -= amount;
        creditor.owed -= amount;

        if debtor.owed < TOLERANCE {
            i += 1;
        }
        if creditor.owed < TOLERANCE {
            j += 1;
        }
    }

    tracing::trace!(
        debtors = debtors.len(),
        creditors = creditors.len(),
        settlements = settlements.len(),
        "resolved settlements"
    );
    settlements
}

/// Balances and settlements for a group in one go.
///
/// Pure function of its inputs: nothing is validated, mutated or stored. See
/// `compute_balances` for how inconsistent input is treated.
pub fn calculate_settlements(expenses: &[Expense], members: &[Member]) -> SettlementOutcome {
    let balances = compute_balances(members, expenses);
    let settlements = resolve_settlements(&balances);
    SettlementOutcome {
        balances,
        settlements,
    }
}

impl Balances {
    /// Balances as they would be once every settlement has been paid.
    pub fn after(&self, settlements: &[Settlement]) -> Balances {
        let mut result = self.clone();
        for settlement in settlements {
            result.credit(settlement.from, settlement.amount);
            result.debit(settlement.to, settlement.amount);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;

    fn ids(n: usize) -> Vec<MemberId> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn settlement(from: MemberId, to: MemberId, amount: Amount) -> Settlement {
        Settlement { from, to, amount }
    }

    #[test]
    fn test_no_balances_no_settlements() {
        assert!(resolve_settlements(&Balances::new()).is_empty());
    }

    #[test]
    fn test_single_debtor_single_creditor() {
        let m = ids(2);
        let balances = Balances::from_iter([(m[0], dec!(50)), (m[1], dec!(-50))]);

        assert_eq!(
            resolve_settlements(&balances),
            vec![settlement(m[1], m[0], dec!(50))]
        );
    }

    #[test]
    fn test_one_debtor_two_creditors() {
        let m = ids(3);
        let balances = Balances::from_iter([(m[0], dec!(40)), (m[1], dec!(10)), (m[2], dec!(-50))]);

        assert_eq!(
            resolve_settlements(&balances),
            vec![
                settlement(m[2], m[0], dec!(40)),
                settlement(m[2], m[1], dec!(10)),
            ]
        );
    }

    #[test]
    fn test_walk_follows_balance_order() {
        let m = ids(4);
        let balances = Balances::from_iter([
            (m[0], dec!(-30)),
            (m[1], dec!(20)),
            (m[2], dec!(-10)),
            (m[3], dec!(20)),
        ]);

        assert_eq!(
            resolve_settlements(&balances),
            vec![
                settlement(m[0], m[1], dec!(20)),
                settlement(m[0], m[3], dec!(10)),
                settlement(m[2], m[3], dec!(10)),
            ]
        );
    }

    #[test]
    fn test_near_zero_balances_are_settled() {
        let m = ids(3);
        let balances = Balances::from_iter([
            (m[0], dec!(0.005)),
            (m[1], dec!(25)),
            (m[2], dec!(-25.005)),
        ]);

        let settlements = resolve_settlements(&balances);

        assert_eq!(settlements, vec![settlement(m[2], m[1], dec!(25))]);
        assert!(settlements.iter().all(|s| s.from != m[0] && s.to != m[0]));
    }

    #[test]
    fn test_exactly_one_cent_is_not_a_debt() {
        let m = ids(2);
        let balances = Balances::from_iter([(m[0], dec!(0.01)), (m[1], dec!(-0.01))]);
        assert!(resolve_settlements(&balances).is_empty());
    }

    #[test]
    fn test_amounts_are_rounded_to_cents() {
        let m = ids(2);
        let balances = Balances::from_iter([(m[0], dec!(33.335)), (m[1], dec!(-33.335))]);

        assert_eq!(
            resolve_settlements(&balances),
            vec![settlement(m[1], m[0], dec!(33.34))]
        );
    }

    #[test]
    fn test_unbalanced_residue_is_dropped() {
        let m = ids(2);
        let balances = Balances::from_iter([(m[0], dec!(100)), (m[1], dec!(-60))]);

        assert_eq!(
            resolve_settlements(&balances),
            vec![settlement(m[1], m[0], dec!(60))]
        );
    }

    #[test]
    fn test_settlements_clear_balances() {
        let m = ids(5);
        let balances = Balances::from_iter([
            (m[0], dec!(12.50)),
            (m[1], dec!(-7.25)),
            (m[2], dec!(30)),
            (m[3], dec!(-20.25)),
            (m[4], dec!(-15)),
        ]);

        let settlements = resolve_settlements(&balances);
        let settled = balances.after(&settlements);

        assert!(settlements.len() <= 4);
        assert!(settled.iter().all(|(_, b)| b.abs() <= TOLERANCE));
    }

    #[test]
    fn test_calculate_settlements_is_deterministic() {
        let members: Vec<Member> = ["Alice", "Bob", "Carol"].into_iter().map(Member::new).collect();
        let expenses = vec![Expense::new(
            dec!(90),
            members[0].id,
            members
                .iter()
                .map(|m| crate::domain::Participant::new(m.id, dec!(30)))
                .collect(),
        )];

        let first = calculate_settlements(&expenses, &members);
        let second = calculate_settlements(&expenses, &members);

        assert_eq!(first, second);
        assert_eq!(first.settlements.len(), 2);
    }
}
