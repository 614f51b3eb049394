#![cfg(test)]

use std::collections::HashMap;
use std::marker::PhantomData;

use cosmwasm_std::testing::{MockApi, MockQuerier, MockStorage};
use cosmwasm_std::{
    from_json, to_json_binary, Addr, Empty, OwnedDeps, Querier, QuerierResult, QueryRequest,
    SystemError, SystemResult, Uint128, WasmQuery,
};
use cw20::{BalanceResponse, Cw20QueryMsg};

/// Dependencies whose querier answers cw20 `Balance` queries from a fixed
/// (token, holder) table and forwards everything else to `MockQuerier`.
pub fn mock_dependencies_cw20(
    balances: &[(&Addr, &Addr, u128)],
) -> OwnedDeps<MockStorage, MockApi, Cw20Querier> {
    let balances = balances
        .iter()
        .map(|(token, holder, amount)| {
            (
                (token.to_string(), holder.to_string()),
                Uint128::new(*amount),
            )
        })
        .collect();

    OwnedDeps {
        storage: MockStorage::default(),
        api: MockApi::default(),
        querier: Cw20Querier {
            base: MockQuerier::new(&[]),
            balances,
        },
        custom_query_type: PhantomData,
    }
}

pub struct Cw20Querier {
    base: MockQuerier,
    balances: HashMap<(String, String), Uint128>,
}

impl Querier for Cw20Querier {
    fn raw_query(&self, bin_request: &[u8]) -> QuerierResult {
        let request: QueryRequest<Empty> = match from_json(bin_request) {
            Ok(request) => request,
            Err(e) => {
                return SystemResult::Err(SystemError::InvalidRequest {
                    error: format!("Parsing query request: {}", e),
                    request: bin_request.into(),
                })
            }
        };

        match request {
            QueryRequest::Wasm(WasmQuery::Smart { contract_addr, msg }) => {
                match from_json::<Cw20QueryMsg>(&msg) {
                    Ok(Cw20QueryMsg::Balance { address }) => {
                        let balance = self
                            .balances
                            .get(&(contract_addr, address))
                            .copied()
                            .unwrap_or_default();
                        SystemResult::Ok(to_json_binary(&BalanceResponse { balance }).into())
                    }
                    _ => SystemResult::Err(SystemError::UnsupportedRequest {
                        kind: "cw20 query".to_string(),
                    }),
                }
            }
            _ => self.base.raw_query(bin_request),
        }
    }
}
