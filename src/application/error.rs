use thiserror::Error;

use crate::domain::{MemberId, SplitError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Member not found: {0}")]
    MemberNotFound(String),

    #[error("Member {0} is not part of the group roster")]
    UnknownMember(MemberId),

    #[error("Member listed more than once in roster: {0}")]
    DuplicateMember(MemberId),

    #[error("Several members are named '{0}', use the member id instead")]
    AmbiguousMember(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid split: {0}")]
    InvalidSplit(#[from] SplitError),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}
