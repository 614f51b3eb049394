use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Binary, Timestamp, Uint128};
use cw20::Cw20ReceiveMsg;

use crate::asset::AssetInfo;
use crate::deriver::{DerivedAddress, LockAddresses};

#[cw_serde]
pub struct InstantiateMsg {}

#[cw_serde]
pub enum ExecuteMsg {
    /// Lock `amount` of `asset` for `lock_duration` seconds. Native coins
    /// must be attached; cw20 tokens are pulled with a prior allowance.
    CreateLock {
        asset: AssetInfo,
        amount: Uint128,
        lock_duration: u64,
    },
    /// Release the full amount once the lock has matured
    UnlockToken { owner: String, asset: AssetInfo },
    /// Release before (or after) maturity, burning the penalty share
    EarlyWithdraw { owner: String, asset: AssetInfo },
    /// This accepts a properly-encoded ReceiveMsg from a cw20 contract
    Receive(Cw20ReceiveMsg),
}

#[cw_serde]
pub enum ReceiveMsg {
    CreateLock { lock_duration: u64 },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// Returns the live lock of an owner for an asset
    #[returns(LockResponse)]
    Lock { owner: String, asset: AssetInfo },
    /// Returns the custody vault backing a lock
    #[returns(VaultResponse)]
    Vault { owner: String, asset: AssetInfo },
    /// Returns the owner's running totals
    #[returns(OwnerAggregateResponse)]
    OwnerAggregate { owner: String },
    /// Pre-computes every address a lock would use
    #[returns(LockAddresses)]
    Addresses { owner: String, asset: AssetInfo },
    /// Returns the fixed lock policy
    #[returns(PolicyResponse)]
    Policy {},
}

#[cw_serde]
pub struct LockResponse {
    pub owner: Addr,
    pub asset: AssetInfo,
    pub amount: Uint128,
    pub locked_at: Timestamp,
    pub matures_at: Timestamp,
    pub early_withdrawal_enabled: bool,
    pub is_mature: bool,
    pub address: DerivedAddress,
    pub vault_address: DerivedAddress,
}

#[cw_serde]
pub struct VaultResponse {
    pub address: DerivedAddress,
    pub lock: Binary,
    pub asset: AssetInfo,
    pub balance: Uint128,
}

#[cw_serde]
pub struct OwnerAggregateResponse {
    pub owner: Addr,
    pub address: DerivedAddress,
    pub total_locks: u64,
    pub total_locked_amount: Uint128,
    pub last_lock_time: Timestamp,
}

#[cw_serde]
pub struct PolicyResponse {
    pub early_withdrawal_penalty_percent: u64,
    pub max_lock_duration: u64,
}
