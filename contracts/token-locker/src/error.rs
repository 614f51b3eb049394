use cosmwasm_std::{OverflowError, StdError, Timestamp, Uint128};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Invalid parameters: {reason}")]
    InvalidParameters { reason: String },

    #[error("A lock already exists for this owner and asset")]
    LockAlreadyExists {},

    #[error("Lock not found")]
    LockNotFound {},

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Uint128, available: Uint128 },

    #[error("Tokens are still locked until {matures_at}")]
    TokensStillLocked { matures_at: Timestamp },

    #[error("Early withdrawal is disabled for this lock")]
    EarlyWithdrawalDisabled {},

    #[error("Unable to find a viable program address bump seed")]
    AddressSpaceExhausted {},

    #[error("Lock state invariant violated: {reason}")]
    InvariantViolation { reason: String },
}

impl ContractError {
    pub fn invalid_parameters(reason: impl Into<String>) -> Self {
        ContractError::InvalidParameters {
            reason: reason.into(),
        }
    }

    pub fn invariant(reason: impl Into<String>) -> Self {
        ContractError::InvariantViolation {
            reason: reason.into(),
        }
    }
}
