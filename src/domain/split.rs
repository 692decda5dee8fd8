use std::fmt;

use rust_decimal::Decimal;

use super::{Amount, Expense, MemberId, Participant, SplitType, TOLERANCE, floor_cents};

/// How to divide an expense among its participants. Every variant resolves to
/// explicit per-member shares; nothing downstream recomputes them.
#[derive(Debug, Clone, PartialEq)]
pub enum Split {
    /// Same share for everyone, leftover cents go to the first members listed
    Equal(Vec<MemberId>),
    /// Shares given verbatim
    Exact(Vec<(MemberId, Amount)>),
    /// Percent of the amount per member, must add up to 100
    Percentage(Vec<(MemberId, Decimal)>),
}

impl Split {
    pub fn split_type(&self) -> SplitType {
        match self {
            Split::Equal(_) => SplitType::Equal,
            Split::Exact(_) => SplitType::Exact,
            Split::Percentage(_) => SplitType::Percentage,
        }
    }

    /// Resolve into participant shares that add up exactly to `amount`
    /// (within a cent for `Exact`, whose shares are not rewritten).
    pub fn shares(&self, amount: Amount) -> Result<Vec<Participant>, SplitError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(SplitError::Negative(amount));
        }

        match self {
            Split::Equal(members) => {
                if members.is_empty() {
                    return Err(SplitError::NoParticipants);
                }
                let count = Decimal::from(members.len());
                let base = floor_cents(amount / count);
                let shares = distribute_remainder(amount, vec![base; members.len()]);
                Ok(zip_participants(members.iter().copied(), shares))
            }
            Split::Exact(pairs) => {
                if pairs.is_empty() {
                    return Err(SplitError::NoParticipants);
                }
                if let Some((_, share)) = pairs.iter().find(|(_, s)| s.is_sign_negative() && !s.is_zero()) {
                    return Err(SplitError::Negative(*share));
                }
                let total: Amount = pairs.iter().map(|(_, s)| *s).sum();
                if (total - amount).abs() > TOLERANCE {
                    return Err(SplitError::SharesMismatch { amount, total });
                }
                Ok(pairs
                    .iter()
                    .map(|(member, share)| Participant::new(*member, *share))
                    .collect())
            }
            Split::Percentage(pairs) => {
                if pairs.is_empty() {
                    return Err(SplitError::NoParticipants);
                }
                if let Some((_, pct)) = pairs.iter().find(|(_, p)| p.is_sign_negative() && !p.is_zero()) {
                    return Err(SplitError::Negative(*pct));
                }
                let total: Decimal = pairs.iter().map(|(_, p)| *p).sum();
                if (total - Decimal::ONE_HUNDRED).abs() > TOLERANCE {
                    return Err(SplitError::PercentagesMismatch(total));
                }
                let raw = pairs
                    .iter()
                    .map(|(_, pct)| floor_cents(amount * *pct / Decimal::ONE_HUNDRED))
                    .collect();
                let shares = distribute_remainder(amount, raw);
                Ok(zip_participants(pairs.iter().map(|(m, _)| *m), shares))
            }
        }
    }

    /// Build an expense paid by `payer` with the shares this split yields.
    pub fn into_expense(self, amount: Amount, payer: MemberId) -> Result<Expense, SplitError> {
        let participants = self.shares(amount)?;
        Ok(Expense::new(amount, payer, participants).with_split_type(self.split_type()))
    }
}

/// Hand out whatever `shares` miss from `amount` in whole cents, spread evenly
/// with the first shares taking the odd ones. Any sub-cent residue lands on the
/// first share so the total is exact. Shares that overshoot `amount` are cut
/// back starting from the largest one.
fn distribute_remainder(amount: Amount, mut shares: Vec<Amount>) -> Vec<Amount> {
    if shares.is_empty() {
        return shares;
    }

    let allotted: Amount = shares.iter().copied().sum();
    let leftover = amount - allotted;
    if leftover < Amount::ZERO {
        return reclaim_overshoot(-leftover, shares);
    }

    let count = Decimal::from(shares.len());
    let cents = (leftover / TOLERANCE).trunc();
    let per_share = (cents / count).trunc();
    let odd = cents - per_share * count;
    for (idx, share) in shares.iter_mut().enumerate() {
        let extra = if Decimal::from(idx) < odd {
            per_share + Decimal::ONE
        } else {
            per_share
        };
        *share += extra * TOLERANCE;
    }

    let residue = leftover - cents * TOLERANCE;
    if !residue.is_zero() {
        if let Some(first) = shares.first_mut() {
            *first += residue;
        }
    }
    shares
}

/// Take `excess` back out of the shares, largest first, never below zero.
fn reclaim_overshoot(mut excess: Amount, mut shares: Vec<Amount>) -> Vec<Amount> {
    let mut order: Vec<usize> = (0..shares.len()).collect();
    order.sort_by(|a, b| shares[*b].cmp(&shares[*a]));

    for idx in order {
        if excess.is_zero() {
            break;
        }
        let taken = excess.min(shares[idx]);
        shares[idx] -= taken;
        excess -= taken;
    }
    shares
}

fn zip_participants(
    members: impl Iterator<Item = MemberId>,
    shares: Vec<Amount>,
) -> Vec<Participant> {
    members
        .zip(shares)
        .map(|(member, share)| Participant::new(member, share))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    NoParticipants,
    Negative(Decimal),
    SharesMismatch { amount: Amount, total: Amount },
    PercentagesMismatch(Decimal),
}

impl fmt::Display for SplitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitError::NoParticipants => write!(f, "an expense needs at least one participant"),
            SplitError::Negative(value) => write!(f, "negative value in split: {}", value),
            SplitError::SharesMismatch { amount, total } => write!(
                f,
                "shares add up to {} but the expense amount is {}",
                total, amount
            ),
            SplitError::PercentagesMismatch(total) => {
                write!(f, "percentages add up to {} instead of 100", total)
            }
        }
    }
}

impl std::error::Error for SplitError {}
