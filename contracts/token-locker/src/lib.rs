pub mod asset;
pub mod constants;
pub mod contract;
pub mod deriver;
mod error;
mod mock;
pub mod msg;
pub mod state;
pub mod vault;

pub use crate::error::ContractError;
