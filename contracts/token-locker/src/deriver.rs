//! Deterministic addressing of lock records, custody vaults and owner
//! aggregates.
//!
//! An address is the SHA-256 of its seeds, a one-byte bump, the program
//! identity and a fixed marker. The canonical bump is the highest one whose
//! digest does not decode as an Ed25519 point, so no private key can ever
//! sign for the address: only this contract controls what is stored there.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Binary};
use ed25519_dalek::VerifyingKey;
use sha2::{Digest, Sha256};

use crate::asset::AssetInfo;
use crate::constants::{LOCKER_SEED, USER_INFO_SEED, VAULT_SEED};
use crate::error::ContractError;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

#[cw_serde]
pub struct DerivedAddress {
    pub address: Binary,
    pub bump: u8,
}

impl DerivedAddress {
    /// Storage key under which the account lives.
    pub fn key(&self) -> &[u8] {
        self.address.as_slice()
    }
}

/// Addresses of everything a single (owner, asset) lock touches.
#[cw_serde]
pub struct LockAddresses {
    pub lock: DerivedAddress,
    pub vault: DerivedAddress,
    pub owner_aggregate: DerivedAddress,
}

pub fn lock_address(
    program: &Addr,
    owner: &Addr,
    asset: &AssetInfo,
) -> Result<DerivedAddress, ContractError> {
    let asset_seed = asset.seed();
    find_program_address(
        &[LOCKER_SEED, owner.as_bytes(), asset_seed.as_slice()],
        program.as_bytes(),
    )
}

pub fn vault_address(
    program: &Addr,
    lock: &DerivedAddress,
    asset: &AssetInfo,
) -> Result<DerivedAddress, ContractError> {
    let asset_seed = asset.seed();
    find_program_address(
        &[VAULT_SEED, lock.key(), asset_seed.as_slice()],
        program.as_bytes(),
    )
}

pub fn owner_aggregate_address(
    program: &Addr,
    owner: &Addr,
) -> Result<DerivedAddress, ContractError> {
    find_program_address(&[USER_INFO_SEED, owner.as_bytes()], program.as_bytes())
}

pub fn derive_all(
    program: &Addr,
    owner: &Addr,
    asset: &AssetInfo,
) -> Result<LockAddresses, ContractError> {
    let lock = lock_address(program, owner, asset)?;
    let vault = vault_address(program, &lock, asset)?;
    let owner_aggregate = owner_aggregate_address(program, owner)?;
    Ok(LockAddresses {
        lock,
        vault,
        owner_aggregate,
    })
}

/// Searches bumps from 255 down and returns the first off-curve address.
pub fn find_program_address(
    seeds: &[&[u8]],
    program: &[u8],
) -> Result<DerivedAddress, ContractError> {
    search_bumps(seeds, program, is_off_curve)
}

/// Recomputes the address for a known bump. `None` if that bump lands on
/// the curve and therefore never names a program address.
pub fn create_program_address(seeds: &[&[u8]], bump: u8, program: &[u8]) -> Option<Binary> {
    let hash = hash_seeds(seeds, bump, program);
    if is_off_curve(&hash) {
        Some(Binary::from(hash.to_vec()))
    } else {
        None
    }
}

fn search_bumps<F>(seeds: &[&[u8]], program: &[u8], accept: F) -> Result<DerivedAddress, ContractError>
where
    F: Fn(&[u8; 32]) -> bool,
{
    for bump in (0..=u8::MAX).rev() {
        let hash = hash_seeds(seeds, bump, program);
        if accept(&hash) {
            return Ok(DerivedAddress {
                address: Binary::from(hash.to_vec()),
                bump,
            });
        }
    }
    Err(ContractError::AddressSpaceExhausted {})
}

fn hash_seeds(seeds: &[&[u8]], bump: u8, program: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for seed in seeds {
        // length prefix: ("ab", "c") and ("a", "bc") must not collide
        hasher.update((seed.len() as u32).to_be_bytes());
        hasher.update(seed);
    }
    hasher.update([bump]);
    hasher.update(program);
    hasher.update(PDA_MARKER);
    hasher.finalize().into()
}

fn is_off_curve(bytes: &[u8; 32]) -> bool {
    VerifyingKey::from_bytes(bytes).is_err()
}
