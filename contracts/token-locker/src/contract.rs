#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    from_json, to_json_binary, Addr, Binary, Coin, Deps, DepsMut, Env, MessageInfo, Response,
    StdError, StdResult, Uint128,
};
use cw2::set_contract_version;
use cw20::Cw20ReceiveMsg;

use crate::asset::AssetInfo;
use crate::constants::{EARLY_WITHDRAWAL_PENALTY_PERCENT, MAX_LOCK_DURATION};
use crate::deriver::{derive_all, owner_aggregate_address, LockAddresses};
use crate::error::ContractError;
use crate::msg::{
    ExecuteMsg, InstantiateMsg, LockResponse, OwnerAggregateResponse, PolicyResponse, QueryMsg,
    ReceiveMsg, VaultResponse,
};
use crate::state::{
    close_lock, create_lock_record, init_vault_if_needed, load_lock_record, load_vault,
    lock_exists, record_lock_activity, save_vault, LockRecord, LOCKS, OWNER_AGGREGATES, VAULTS,
};
use crate::vault::{split_penalty, CustodyVault};

// version info for migration info
const CONTRACT_NAME: &str = "crates.io:cw-token-locker";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Where the tokens of a new lock come from.
enum Funding {
    /// Native coins attached to the call; cw20 locks attach none and pull
    /// through an allowance.
    Attached(Vec<Coin>),
    /// cw20 tokens already delivered through the `Receive` hook.
    Received,
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    _msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute(
            "early_withdrawal_penalty_percent",
            EARLY_WITHDRAWAL_PENALTY_PERCENT.to_string(),
        ))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::CreateLock {
            asset,
            amount,
            lock_duration,
        } => {
            let asset = asset.validate(deps.api)?;
            let owner = info.sender;
            let funding = Funding::Attached(info.funds);
            try_create_lock(deps, env, owner, asset, amount, lock_duration, funding)
        }
        ExecuteMsg::UnlockToken { owner, asset } => try_unlock(deps, env, info, owner, asset),
        ExecuteMsg::EarlyWithdraw { owner, asset } => {
            try_early_withdraw(deps, env, info, owner, asset)
        }
        ExecuteMsg::Receive(msg) => try_receive(deps, env, info, msg),
    }
}

pub fn try_receive(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    wrapper: Cw20ReceiveMsg,
) -> Result<Response, ContractError> {
    if !info.funds.is_empty() {
        return Err(ContractError::invalid_parameters(
            "native funds sent along a cw20 hook",
        ));
    }
    let msg: ReceiveMsg = from_json(&wrapper.msg)?;
    let owner = deps.api.addr_validate(&wrapper.sender)?;
    // the calling contract is the token that was sent
    let asset = AssetInfo::cw20(info.sender);
    match msg {
        ReceiveMsg::CreateLock { lock_duration } => try_create_lock(
            deps,
            env,
            owner,
            asset,
            wrapper.amount,
            lock_duration,
            Funding::Received,
        ),
    }
}

fn try_create_lock(
    deps: DepsMut,
    env: Env,
    owner: Addr,
    asset: AssetInfo,
    amount: Uint128,
    lock_duration: u64,
    funding: Funding,
) -> Result<Response, ContractError> {
    if amount.is_zero() {
        return Err(ContractError::invalid_parameters(
            "amount must be greater than zero",
        ));
    }
    if lock_duration == 0 {
        return Err(ContractError::invalid_parameters(
            "lock duration must be greater than zero",
        ));
    }
    if lock_duration > MAX_LOCK_DURATION {
        return Err(ContractError::invalid_parameters(format!(
            "lock duration exceeds {} seconds",
            MAX_LOCK_DURATION
        )));
    }

    let program = &env.contract.address;
    let addrs = derive_all(program, &owner, &asset)?;
    if lock_exists(deps.storage, &addrs.lock) {
        return Err(ContractError::LockAlreadyExists {});
    }

    // every check happens before the first write
    let pull = match funding {
        Funding::Attached(funds) => {
            check_funding(&deps.as_ref(), &owner, &asset, amount, &funds)?;
            asset.transfer_from_msg(&owner, program, amount)?
        }
        Funding::Received => None,
    };
    let mut vault = init_vault_if_needed(deps.storage, &addrs.vault, &addrs.lock.address, &asset)?;
    vault.deposit(amount)?;

    let now = env.block.time;
    let record = LockRecord {
        owner: owner.clone(),
        asset: asset.clone(),
        amount,
        locked_at: now,
        matures_at: now.plus_seconds(lock_duration),
        early_withdrawal_enabled: true,
        bump: addrs.lock.bump,
        vault_bump: addrs.vault.bump,
    };
    let record = create_lock_record(deps.storage, &addrs.lock, record)?;
    save_vault(deps.storage, &addrs.vault, &vault)?;
    let aggregate = record_lock_activity(
        deps.storage,
        &addrs.owner_aggregate,
        &owner,
        amount,
        now,
    )?;

    let res = Response::new()
        .add_attribute("action", "create_lock")
        .add_attribute("owner", owner)
        .add_attribute("asset", asset.to_string())
        .add_attribute("amount", amount)
        .add_attribute("matures_at", record.matures_at.seconds().to_string())
        .add_attribute("lock_address", addrs.lock.address.to_base64())
        .add_attribute("total_locks", aggregate.total_locks.to_string())
        .add_messages(pull);
    Ok(res)
}

/// Attached funds must be exactly `amount` of a native asset, or nothing
/// at all for a cw20 asset whose holder balance must cover `amount`.
fn check_funding(
    deps: &Deps,
    owner: &Addr,
    asset: &AssetInfo,
    amount: Uint128,
    funds: &[Coin],
) -> Result<(), ContractError> {
    let available = match asset {
        AssetInfo::Native { denom } => {
            if funds.iter().any(|coin| &coin.denom != denom) {
                return Err(ContractError::invalid_parameters(format!(
                    "only {} may be attached",
                    denom
                )));
            }
            funds
                .iter()
                .try_fold(Uint128::zero(), |acc, coin| acc.checked_add(coin.amount))?
        }
        AssetInfo::Cw20 { .. } => {
            if !funds.is_empty() {
                return Err(ContractError::invalid_parameters(
                    "native funds sent to a cw20 lock",
                ));
            }
            asset.query_balance(&deps.querier, owner)?
        }
    };

    if available < amount {
        return Err(ContractError::InsufficientFunds {
            required: amount,
            available,
        });
    }
    if asset.is_native() && available > amount {
        return Err(ContractError::invalid_parameters(format!(
            "attached {} but locking {}",
            available, amount
        )));
    }
    Ok(())
}

pub fn try_unlock(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    owner: String,
    asset: AssetInfo,
) -> Result<Response, ContractError> {
    let asset = asset.validate(deps.api)?;
    let owner = authorize(&deps.as_ref(), &info, &owner)?;
    let (addrs, mut record, mut vault) = load_live_lock(&deps.as_ref(), &env, &owner, &asset)?;

    if !record.is_mature(env.block.time) {
        return Err(ContractError::TokensStillLocked {
            matures_at: record.matures_at,
        });
    }

    // release everything
    let amount = record.amount;
    let payout = vault.release_to(&record.owner, amount)?;
    record.amount = Uint128::zero();
    close_lock(deps.storage, &addrs.lock, &record, &addrs.vault, &vault)?;

    let res = Response::new()
        .add_attribute("action", "unlock_token")
        .add_attribute("owner", owner)
        .add_attribute("asset", asset.to_string())
        .add_attribute("withdrawn", amount)
        .add_attribute("lock_address", addrs.lock.address.to_base64())
        .add_messages(payout);
    Ok(res)
}

pub fn try_early_withdraw(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    owner: String,
    asset: AssetInfo,
) -> Result<Response, ContractError> {
    let asset = asset.validate(deps.api)?;
    let owner = authorize(&deps.as_ref(), &info, &owner)?;
    let (addrs, mut record, mut vault) = load_live_lock(&deps.as_ref(), &env, &owner, &asset)?;

    if !record.early_withdrawal_enabled {
        return Err(ContractError::EarlyWithdrawalDisabled {});
    }

    let (penalty, remainder) = split_penalty(record.amount, EARLY_WITHDRAWAL_PENALTY_PERCENT)?;
    let burn = vault.burn(penalty)?;
    let payout = vault.release_to(&record.owner, remainder)?;
    record.amount = Uint128::zero();
    close_lock(deps.storage, &addrs.lock, &record, &addrs.vault, &vault)?;

    let res = Response::new()
        .add_attribute("action", "early_withdraw")
        .add_attribute("owner", owner)
        .add_attribute("asset", asset.to_string())
        .add_attribute("burned", penalty)
        .add_attribute("withdrawn", remainder)
        .add_attribute("lock_address", addrs.lock.address.to_base64())
        .add_messages(burn)
        .add_messages(payout);
    Ok(res)
}

/// The named owner must be the signer of the call.
fn authorize(deps: &Deps, info: &MessageInfo, owner: &str) -> Result<Addr, ContractError> {
    let owner = deps.api.addr_validate(owner)?;
    if owner != info.sender {
        return Err(ContractError::Unauthorized {});
    }
    Ok(owner)
}

fn load_live_lock(
    deps: &Deps,
    env: &Env,
    owner: &Addr,
    asset: &AssetInfo,
) -> Result<(LockAddresses, LockRecord, CustodyVault), ContractError> {
    let program = &env.contract.address;
    let addrs = derive_all(program, owner, asset)?;
    let record = load_lock_record(deps.storage, &addrs.lock)?;
    if &record.owner != owner {
        return Err(ContractError::Unauthorized {});
    }
    let vault = load_vault(deps.storage, &addrs.vault)?;
    record.check_invariants(program, &addrs.lock, &addrs.vault, &vault)?;
    Ok((addrs, record, vault))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Lock { owner, asset } => to_json_binary(&query_lock(deps, env, owner, asset)?),
        QueryMsg::Vault { owner, asset } => to_json_binary(&query_vault(deps, env, owner, asset)?),
        QueryMsg::OwnerAggregate { owner } => {
            to_json_binary(&query_owner_aggregate(deps, env, owner)?)
        }
        QueryMsg::Addresses { owner, asset } => {
            to_json_binary(&query_addresses(deps, &env, owner, asset)?)
        }
        QueryMsg::Policy {} => to_json_binary(&query_policy()),
    }
}

fn query_addresses(
    deps: Deps,
    env: &Env,
    owner: String,
    asset: AssetInfo,
) -> StdResult<LockAddresses> {
    let owner = deps.api.addr_validate(&owner)?;
    let asset = asset.validate(deps.api)?;
    derive_all(&env.contract.address, &owner, &asset)
        .map_err(|err| StdError::generic_err(err.to_string()))
}

fn query_lock(deps: Deps, env: Env, owner: String, asset: AssetInfo) -> StdResult<LockResponse> {
    let addrs = query_addresses(deps, &env, owner, asset)?;
    let lock = LOCKS.load(deps.storage, addrs.lock.key())?;

    Ok(LockResponse {
        is_mature: lock.is_mature(env.block.time),
        owner: lock.owner,
        asset: lock.asset,
        amount: lock.amount,
        locked_at: lock.locked_at,
        matures_at: lock.matures_at,
        early_withdrawal_enabled: lock.early_withdrawal_enabled,
        address: addrs.lock,
        vault_address: addrs.vault,
    })
}

fn query_vault(deps: Deps, env: Env, owner: String, asset: AssetInfo) -> StdResult<VaultResponse> {
    let addrs = query_addresses(deps, &env, owner, asset)?;
    let vault = VAULTS.load(deps.storage, addrs.vault.key())?;

    Ok(VaultResponse {
        address: addrs.vault,
        lock: vault.lock,
        asset: vault.asset,
        balance: vault.balance,
    })
}

fn query_owner_aggregate(
    deps: Deps,
    env: Env,
    owner: String,
) -> StdResult<OwnerAggregateResponse> {
    let owner = deps.api.addr_validate(&owner)?;
    let address = owner_aggregate_address(&env.contract.address, &owner)
        .map_err(|err| StdError::generic_err(err.to_string()))?;
    let aggregate = OWNER_AGGREGATES.load(deps.storage, address.key())?;

    Ok(OwnerAggregateResponse {
        owner: aggregate.owner,
        address,
        total_locks: aggregate.total_locks,
        total_locked_amount: aggregate.total_locked_amount,
        last_lock_time: aggregate.last_lock_time,
    })
}

fn query_policy() -> PolicyResponse {
    PolicyResponse {
        early_withdrawal_penalty_percent: EARLY_WITHDRAWAL_PENALTY_PERCENT as u64,
        max_lock_duration: MAX_LOCK_DURATION,
    }
}
