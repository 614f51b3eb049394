use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use cosmwasm_std::{Addr, Binary, CosmosMsg, Uint128};

use crate::asset::AssetInfo;
use crate::error::ContractError;

/// Asset-holding account owned by a lock record. Only the lock operations
/// move its balance; the balance always equals the record's amount.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct CustodyVault {
    /// Address of the owning lock record
    pub lock: Binary,
    pub asset: AssetInfo,
    pub balance: Uint128,
    pub bump: u8,
}

impl CustodyVault {
    pub fn new(lock: Binary, asset: AssetInfo, bump: u8) -> Self {
        CustodyVault {
            lock,
            asset,
            balance: Uint128::zero(),
            bump,
        }
    }

    pub fn deposit(&mut self, amount: Uint128) -> Result<(), ContractError> {
        self.balance = self.balance.checked_add(amount)?;
        Ok(())
    }

    pub fn withdraw(&mut self, amount: Uint128) -> Result<(), ContractError> {
        if amount > self.balance {
            return Err(ContractError::InsufficientFunds {
                required: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// Debits `amount` and returns the message paying it out to `recipient`.
    pub fn release_to(
        &mut self,
        recipient: &Addr,
        amount: Uint128,
    ) -> Result<Option<CosmosMsg>, ContractError> {
        self.withdraw(amount)?;
        if amount.is_zero() {
            return Ok(None);
        }
        Ok(Some(self.asset.transfer_msg(recipient, amount)?))
    }

    /// Debits `amount` and returns the message destroying it.
    pub fn burn(&mut self, amount: Uint128) -> Result<Option<CosmosMsg>, ContractError> {
        self.withdraw(amount)?;
        if amount.is_zero() {
            return Ok(None);
        }
        Ok(Some(self.asset.burn_msg(amount)?))
    }
}

/// Splits a locked amount into (penalty, remainder) for early withdrawal.
/// The penalty rounds down, so the owner never loses more than the rate.
pub fn split_penalty(
    amount: Uint128,
    penalty_percent: u128,
) -> Result<(Uint128, Uint128), ContractError> {
    let penalty = amount.multiply_ratio(penalty_percent, 100u128);
    let remainder = amount.checked_sub(penalty)?;
    Ok((penalty, remainder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::{BankMsg, Coin};

    fn vault_with(balance: u128) -> CustodyVault {
        let mut vault = CustodyVault::new(
            Binary::from(vec![1u8; 32]),
            AssetInfo::native("ujuno"),
            254,
        );
        vault.deposit(Uint128::new(balance)).unwrap();
        vault
    }

    #[test]
    fn release_debits_and_pays() {
        let mut vault = vault_with(100);
        let msg = vault
            .release_to(&Addr::unchecked("owner"), Uint128::new(100))
            .unwrap();
        assert_eq!(Uint128::zero(), vault.balance);
        assert_eq!(
            msg,
            Some(CosmosMsg::Bank(BankMsg::Send {
                to_address: "owner".into(),
                amount: vec![Coin::new(100, "ujuno")],
            }))
        );
    }

    #[test]
    fn cannot_overdraw() {
        let mut vault = vault_with(10);
        let res = vault.burn(Uint128::new(11));
        assert!(matches!(res, Err(ContractError::InsufficientFunds { .. })));
        assert_eq!(Uint128::new(10), vault.balance);
    }

    #[test]
    fn zero_movements_emit_nothing() {
        let mut vault = vault_with(1);
        assert_eq!(None, vault.burn(Uint128::zero()).unwrap());
        assert_eq!(Uint128::new(1), vault.balance);
    }

    #[test]
    fn penalty_split() {
        let (penalty, rest) = split_penalty(Uint128::new(1_000_000_000), 20).unwrap();
        assert_eq!(Uint128::new(200_000_000), penalty);
        assert_eq!(Uint128::new(800_000_000), rest);

        // rounds in the owner's favour
        let (penalty, rest) = split_penalty(Uint128::new(9), 20).unwrap();
        assert_eq!(Uint128::new(1), penalty);
        assert_eq!(Uint128::new(8), rest);

        let (penalty, rest) = split_penalty(Uint128::new(1), 20).unwrap();
        assert_eq!(Uint128::zero(), penalty);
        assert_eq!(Uint128::new(1), rest);
    }
}
