use std::fmt;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{
    to_json_binary, Addr, Api, BankMsg, Coin, CosmosMsg, QuerierWrapper, StdResult, Uint128,
    WasmMsg,
};
use cw20::{BalanceResponse, Cw20ExecuteMsg, Cw20QueryMsg};

/// Identity of a fungible token held in custody.
#[cw_serde]
pub enum AssetInfo {
    /// Bank module coin
    Native { denom: String },
    /// cw20 token contract
    Cw20 { contract_addr: Addr },
}

impl AssetInfo {
    pub fn native(denom: impl Into<String>) -> Self {
        AssetInfo::Native {
            denom: denom.into(),
        }
    }

    pub fn cw20(contract_addr: Addr) -> Self {
        AssetInfo::Cw20 { contract_addr }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, AssetInfo::Native { .. })
    }

    /// Canonicalizes user supplied cw20 addresses.
    pub fn validate(self, api: &dyn Api) -> StdResult<Self> {
        match self {
            AssetInfo::Native { denom } => Ok(AssetInfo::Native { denom }),
            AssetInfo::Cw20 { contract_addr } => Ok(AssetInfo::Cw20 {
                contract_addr: api.addr_validate(contract_addr.as_str())?,
            }),
        }
    }

    /// Bytes fed into address derivation. The kind prefix keeps a denom
    /// from colliding with a contract address of the same spelling.
    pub fn seed(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Balance of `holder`'s personal holding account for this asset.
    pub fn query_balance(&self, querier: &QuerierWrapper, holder: &Addr) -> StdResult<Uint128> {
        match self {
            AssetInfo::Native { denom } => Ok(querier.query_balance(holder, denom)?.amount),
            AssetInfo::Cw20 { contract_addr } => {
                let res: BalanceResponse = querier.query_wasm_smart(
                    contract_addr,
                    &Cw20QueryMsg::Balance {
                        address: holder.to_string(),
                    },
                )?;
                Ok(res.balance)
            }
        }
    }

    /// Pulls `amount` from `owner` into `recipient` using a prior cw20
    /// allowance. Native coins arrive attached to the call, so there is
    /// nothing to pull for them.
    pub fn transfer_from_msg(
        &self,
        owner: &Addr,
        recipient: &Addr,
        amount: Uint128,
    ) -> StdResult<Option<CosmosMsg>> {
        match self {
            AssetInfo::Native { .. } => Ok(None),
            AssetInfo::Cw20 { contract_addr } => {
                let msg = Cw20ExecuteMsg::TransferFrom {
                    owner: owner.to_string(),
                    recipient: recipient.to_string(),
                    amount,
                };
                Ok(Some(execute_cw20(contract_addr, &msg)?))
            }
        }
    }

    pub fn transfer_msg(&self, to: &Addr, amount: Uint128) -> StdResult<CosmosMsg> {
        match self {
            AssetInfo::Native { denom } => Ok(BankMsg::Send {
                to_address: to.to_string(),
                amount: vec![Coin::new(amount.u128(), denom.to_owned())],
            }
            .into()),
            AssetInfo::Cw20 { contract_addr } => {
                let msg = Cw20ExecuteMsg::Transfer {
                    recipient: to.to_string(),
                    amount,
                };
                execute_cw20(contract_addr, &msg)
            }
        }
    }

    /// Destroys `amount` out of the contract's holdings, shrinking total supply.
    pub fn burn_msg(&self, amount: Uint128) -> StdResult<CosmosMsg> {
        match self {
            AssetInfo::Native { denom } => Ok(BankMsg::Burn {
                amount: vec![Coin::new(amount.u128(), denom.to_owned())],
            }
            .into()),
            AssetInfo::Cw20 { contract_addr } => {
                execute_cw20(contract_addr, &Cw20ExecuteMsg::Burn { amount })
            }
        }
    }
}

impl fmt::Display for AssetInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AssetInfo::Native { denom } => write!(f, "native:{}", denom),
            AssetInfo::Cw20 { contract_addr } => write!(f, "cw20:{}", contract_addr),
        }
    }
}

fn execute_cw20(contract_addr: &Addr, msg: &Cw20ExecuteMsg) -> StdResult<CosmosMsg> {
    Ok(WasmMsg::Execute {
        contract_addr: contract_addr.to_string(),
        msg: to_json_binary(msg)?,
        funds: vec![],
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::from_json;

    #[test]
    fn seed_separates_asset_kinds() {
        let native = AssetInfo::native("token");
        let cw20 = AssetInfo::cw20(Addr::unchecked("token"));
        assert_ne!(native.seed(), cw20.seed());
        assert_eq!(b"native:token".to_vec(), native.seed());
    }

    #[test]
    fn burn_native_is_bank_burn() {
        let msg = AssetInfo::native("ujuno")
            .burn_msg(Uint128::new(20))
            .unwrap();
        assert_eq!(
            msg,
            CosmosMsg::Bank(BankMsg::Burn {
                amount: vec![Coin::new(20, "ujuno")]
            })
        );
    }

    #[test]
    fn burn_cw20_targets_token_contract() {
        let token = Addr::unchecked("token");
        let msg = AssetInfo::cw20(token).burn_msg(Uint128::new(7)).unwrap();
        match msg {
            CosmosMsg::Wasm(WasmMsg::Execute {
                contract_addr, msg, ..
            }) => {
                assert_eq!("token", contract_addr);
                let exec: Cw20ExecuteMsg = from_json(&msg).unwrap();
                assert_eq!(
                    exec,
                    Cw20ExecuteMsg::Burn {
                        amount: Uint128::new(7)
                    }
                );
            }
            _ => panic!("Must return a wasm execute message"),
        }
    }

    #[test]
    fn native_transfer_from_is_noop() {
        let owner = Addr::unchecked("owner");
        let contract = Addr::unchecked("contract");
        let msg = AssetInfo::native("ujuno")
            .transfer_from_msg(&owner, &contract, Uint128::new(5))
            .unwrap();
        assert!(msg.is_none());
    }
}
