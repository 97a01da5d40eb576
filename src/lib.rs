//! Human-readable identities for Solana wallets.
//!
//! Names from several independent naming services (`.sol`, `.glow`,
//! `.backpack`, `.ottr`, `@handle` and the multi-TLD registry) resolve to a
//! wallet address and profile picture, and wallet addresses resolve back to
//! their best known name.

pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod models;
pub mod providers;
pub mod resolver;
pub mod rpc;
pub mod state;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;
