//! Program derived addresses.
//!
//! A PDA is `sha256(seeds ‖ bump ‖ program_id ‖ "ProgramDerivedAddress")`
//! for the highest bump whose hash is not a valid ed25519 point.

use ed25519_dalek::VerifyingKey;
use sha2::{Digest, Sha256};

use crate::identity::{PUBKEY_BYTES, WalletAddress};

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";
pub const MAX_SEED_LEN: usize = 32;
pub const MAX_SEEDS: usize = 16;

pub fn is_on_curve(bytes: &[u8; PUBKEY_BYTES]) -> bool {
    VerifyingKey::from_bytes(bytes).is_ok()
}

pub fn create_program_address(
    seeds: &[&[u8]],
    program_id: &WalletAddress,
) -> Option<WalletAddress> {
    if seeds.len() > MAX_SEEDS || seeds.iter().any(|seed| seed.len() > MAX_SEED_LEN) {
        return None;
    }
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(program_id.as_bytes());
    hasher.update(PDA_MARKER);
    let hash: [u8; PUBKEY_BYTES] = hasher.finalize().into();
    if is_on_curve(&hash) {
        return None;
    }
    Some(WalletAddress::from_bytes(hash))
}

pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &WalletAddress,
) -> Option<(WalletAddress, u8)> {
    if seeds.len() >= MAX_SEEDS {
        return None;
    }
    for bump in (0..=u8::MAX).rev() {
        let bump_seed = [bump];
        let mut with_bump: Vec<&[u8]> = seeds.to_vec();
        with_bump.push(&bump_seed);
        if let Some(address) = create_program_address(&with_bump, program_id) {
            return Some((address, bump));
        }
    }
    None
}
