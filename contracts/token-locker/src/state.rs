use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use cosmwasm_std::{Addr, Binary, Storage, Timestamp, Uint128};
use cw_storage_plus::Map;

use crate::asset::AssetInfo;
use crate::constants::LOCKER_SEED;
use crate::deriver::{create_program_address, DerivedAddress};
use crate::error::ContractError;
use crate::vault::CustodyVault;

/// One live lock per (owner, asset), stored at its derived address.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct LockRecord {
    pub owner: Addr,
    pub asset: AssetInfo,
    pub amount: Uint128,
    pub locked_at: Timestamp,
    pub matures_at: Timestamp,
    pub early_withdrawal_enabled: bool,
    pub bump: u8,
    pub vault_bump: u8,
}

impl LockRecord {
    pub fn is_mature(&self, now: Timestamp) -> bool {
        now >= self.matures_at
    }

    /// Checks the record really occupies `address` and that its vault
    /// mirrors the locked amount.
    pub fn check_invariants(
        &self,
        program: &Addr,
        address: &DerivedAddress,
        vault_address: &DerivedAddress,
        vault: &CustodyVault,
    ) -> Result<(), ContractError> {
        if self.amount.is_zero() {
            return Err(ContractError::invariant("live lock holds zero amount"));
        }
        let asset_seed = self.asset.seed();
        let rederived = create_program_address(
            &[LOCKER_SEED, self.owner.as_bytes(), asset_seed.as_slice()],
            self.bump,
            program.as_bytes(),
        );
        if rederived.as_ref() != Some(&address.address) || self.bump != address.bump {
            return Err(ContractError::invariant("stored bump does not match lock address"));
        }
        if self.vault_bump != vault_address.bump {
            return Err(ContractError::invariant("stored vault bump does not match vault address"));
        }
        if vault.lock != address.address || vault.asset != self.asset {
            return Err(ContractError::invariant("vault belongs to another lock"));
        }
        if vault.balance != self.amount {
            return Err(ContractError::invariant(format!(
                "vault balance {} differs from locked amount {}",
                vault.balance, self.amount
            )));
        }
        Ok(())
    }
}

/// Running totals per owner. Never removed when a lock closes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct OwnerAggregate {
    pub owner: Addr,
    pub total_locks: u64,
    pub total_locked_amount: Uint128,
    pub last_lock_time: Timestamp,
    pub bump: u8,
}

pub const LOCKS: Map<&[u8], LockRecord> = Map::new("locks");
pub const VAULTS: Map<&[u8], CustodyVault> = Map::new("vaults");
pub const OWNER_AGGREGATES: Map<&[u8], OwnerAggregate> = Map::new("owner_aggregates");

pub fn lock_exists(storage: &dyn Storage, address: &DerivedAddress) -> bool {
    LOCKS.has(storage, address.key())
}

/// Initializes the record, failing if the address is already occupied.
pub fn create_lock_record(
    storage: &mut dyn Storage,
    address: &DerivedAddress,
    record: LockRecord,
) -> Result<LockRecord, ContractError> {
    LOCKS.update(storage, address.key(), |existing| match existing {
        None => Ok(record),
        Some(_) => Err(ContractError::LockAlreadyExists {}),
    })
}

pub fn load_lock_record(
    storage: &dyn Storage,
    address: &DerivedAddress,
) -> Result<LockRecord, ContractError> {
    LOCKS
        .may_load(storage, address.key())?
        .ok_or(ContractError::LockNotFound {})
}

/// Loads the vault that must accompany every live lock.
pub fn load_vault(
    storage: &dyn Storage,
    address: &DerivedAddress,
) -> Result<CustodyVault, ContractError> {
    VAULTS
        .may_load(storage, address.key())?
        .ok_or_else(|| ContractError::invariant("live lock has no custody vault"))
}

/// Opens the vault account if absent. A leftover vault must be empty.
pub fn init_vault_if_needed(
    storage: &dyn Storage,
    address: &DerivedAddress,
    lock: &Binary,
    asset: &AssetInfo,
) -> Result<CustodyVault, ContractError> {
    match VAULTS.may_load(storage, address.key())? {
        Some(vault) if !vault.balance.is_zero() => {
            Err(ContractError::invariant("custody vault is not empty"))
        }
        Some(vault) => Ok(vault),
        None => Ok(CustodyVault::new(lock.clone(), asset.clone(), address.bump)),
    }
}

pub fn save_vault(
    storage: &mut dyn Storage,
    address: &DerivedAddress,
    vault: &CustodyVault,
) -> Result<(), ContractError> {
    VAULTS.save(storage, address.key(), vault)?;
    Ok(())
}

/// Destroys the record and its vault together. Both must already be empty.
pub fn close_lock(
    storage: &mut dyn Storage,
    address: &DerivedAddress,
    record: &LockRecord,
    vault_address: &DerivedAddress,
    vault: &CustodyVault,
) -> Result<(), ContractError> {
    if !record.amount.is_zero() || !vault.balance.is_zero() {
        return Err(ContractError::invariant("closing a lock that still holds funds"));
    }
    LOCKS.remove(storage, address.key());
    VAULTS.remove(storage, vault_address.key());
    Ok(())
}

/// Lazily creates the owner's aggregate, then counts one more lock.
pub fn record_lock_activity(
    storage: &mut dyn Storage,
    address: &DerivedAddress,
    owner: &Addr,
    amount: Uint128,
    now: Timestamp,
) -> Result<OwnerAggregate, ContractError> {
    let mut aggregate = OWNER_AGGREGATES
        .may_load(storage, address.key())?
        .unwrap_or_else(|| OwnerAggregate {
            owner: owner.clone(),
            total_locks: 0,
            total_locked_amount: Uint128::zero(),
            last_lock_time: now,
            bump: address.bump,
        });
    aggregate.total_locks = aggregate
        .total_locks
        .checked_add(1)
        .ok_or_else(|| ContractError::invariant("lock counter overflow"))?;
    aggregate.total_locked_amount = aggregate.total_locked_amount.checked_add(amount)?;
    aggregate.last_lock_time = now;
    OWNER_AGGREGATES.save(storage, address.key(), &aggregate)?;
    Ok(aggregate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deriver::{derive_all, LockAddresses};
    use cosmwasm_std::testing::MockStorage;

    fn setup() -> (Addr, LockAddresses, LockRecord, CustodyVault) {
        let program = Addr::unchecked("locker_contract");
        let owner = Addr::unchecked("owner");
        let asset = AssetInfo::native("ujuno");
        let addrs = derive_all(&program, &owner, &asset).unwrap();
        let record = LockRecord {
            owner,
            asset: asset.clone(),
            amount: Uint128::new(100),
            locked_at: Timestamp::from_seconds(10),
            matures_at: Timestamp::from_seconds(20),
            early_withdrawal_enabled: true,
            bump: addrs.lock.bump,
            vault_bump: addrs.vault.bump,
        };
        let mut vault = CustodyVault::new(addrs.lock.address.clone(), asset, addrs.vault.bump);
        vault.deposit(Uint128::new(100)).unwrap();
        (program, addrs, record, vault)
    }

    #[test]
    fn create_fails_if_occupied() {
        let mut storage = MockStorage::new();
        let (_, addrs, record, _) = setup();

        create_lock_record(&mut storage, &addrs.lock, record.clone()).unwrap();
        let mut other = record.clone();
        other.amount = Uint128::new(1);
        let res = create_lock_record(&mut storage, &addrs.lock, other);
        match res {
            Err(ContractError::LockAlreadyExists {}) => {}
            _ => panic!("Must return LockAlreadyExists error"),
        }
        // never overwritten
        assert_eq!(record, load_lock_record(&storage, &addrs.lock).unwrap());
    }

    #[test]
    fn load_missing_record() {
        let storage = MockStorage::new();
        let (_, addrs, _, _) = setup();
        match load_lock_record(&storage, &addrs.lock) {
            Err(ContractError::LockNotFound {}) => {}
            _ => panic!("Must return LockNotFound error"),
        }
    }

    #[test]
    fn invariants_hold_for_fresh_lock() {
        let (program, addrs, record, vault) = setup();
        record
            .check_invariants(&program, &addrs.lock, &addrs.vault, &vault)
            .unwrap();
    }

    #[test]
    fn invariants_catch_drift() {
        let (program, addrs, record, mut vault) = setup();
        vault.deposit(Uint128::new(1)).unwrap();
        let res = record.check_invariants(&program, &addrs.lock, &addrs.vault, &vault);
        assert!(matches!(res, Err(ContractError::InvariantViolation { .. })));

        let (program, addrs, mut record, vault) = setup();
        record.bump = record.bump.wrapping_sub(1);
        let res = record.check_invariants(&program, &addrs.lock, &addrs.vault, &vault);
        assert!(matches!(res, Err(ContractError::InvariantViolation { .. })));
    }

    #[test]
    fn close_requires_empty_lock() {
        let mut storage = MockStorage::new();
        let (_, addrs, mut record, mut vault) = setup();
        create_lock_record(&mut storage, &addrs.lock, record.clone()).unwrap();
        save_vault(&mut storage, &addrs.vault, &vault).unwrap();

        let res = close_lock(&mut storage, &addrs.lock, &record, &addrs.vault, &vault);
        assert!(matches!(res, Err(ContractError::InvariantViolation { .. })));

        vault.withdraw(Uint128::new(100)).unwrap();
        record.amount = Uint128::zero();
        close_lock(&mut storage, &addrs.lock, &record, &addrs.vault, &vault).unwrap();
        assert!(!lock_exists(&storage, &addrs.lock));
        assert!(!VAULTS.has(&storage, addrs.vault.key()));
    }

    #[test]
    fn aggregate_accumulates() {
        let mut storage = MockStorage::new();
        let (_, addrs, record, _) = setup();

        let first = record_lock_activity(
            &mut storage,
            &addrs.owner_aggregate,
            &record.owner,
            Uint128::new(100),
            Timestamp::from_seconds(5),
        )
        .unwrap();
        assert_eq!(1, first.total_locks);

        let second = record_lock_activity(
            &mut storage,
            &addrs.owner_aggregate,
            &record.owner,
            Uint128::new(50),
            Timestamp::from_seconds(9),
        )
        .unwrap();
        assert_eq!(2, second.total_locks);
        assert_eq!(Uint128::new(150), second.total_locked_amount);
        assert_eq!(Timestamp::from_seconds(9), second.last_lock_time);
        assert_eq!(addrs.owner_aggregate.bump, second.bump);
    }
}
