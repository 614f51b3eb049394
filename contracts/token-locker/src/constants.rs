/// Seed tag of the per (owner, asset) lock record.
pub const LOCKER_SEED: &[u8] = b"token_locker";
/// Seed tag of the custody vault owned by a lock record.
pub const VAULT_SEED: &[u8] = b"custody_vault";
/// Seed tag of the per-owner aggregate.
pub const USER_INFO_SEED: &[u8] = b"user_info";

/// Share of the locked amount burned on early withdrawal, in percent.
pub const EARLY_WITHDRAWAL_PENALTY_PERCENT: u128 = 20;

/// Two years, in seconds.
pub const MAX_LOCK_DURATION: u64 = 63_072_000;
