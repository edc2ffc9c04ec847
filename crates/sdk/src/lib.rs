//! GroovySwap SDK for the [`Mangrove`] order-book DEX.
//!
//! # Overview
//!
//! Thin typed boundary over the on-chain exchange: market discovery, order
//! book snapshots, market orders and resting offers ("liquidity").
//!
//! [`dex::Dex`], [`dex::Market`] and [`dex::LiquidityProvider`] describe the
//! capabilities consumed by the CLI. [`mangrove::MangroveClient`] implements
//! them on top of an [`alloy`] provider with a signing wallet.
//!
//! Token amounts are exposed as [`fastnum`] decimals and converted from/to
//! on-chain fixed-point integers by [`num::Converter`].
//!
//! # Limitations/follow-ups
//!
//! * Market orders report amounts as balance deltas of the signer, so
//!   concurrent transfers to or from the signer within the same block skew
//!   the result.
//!
//! * Offers are posted by the signer itself (no maker contract), so posted
//!   offers rely on token approvals given to the exchange.
//!
//! # Features
//!
//! | Feature | Default | Description |
//! | --- | --- | --- |
//! | `display` | yes | Enables [`std::fmt::Display`] implementation for the order book. |
//! | `testing` | no | Enables [`testing`] module with in-memory stub exchange. |
//!
//! [`Mangrove`]: https://mangrove.exchange

pub mod abi;
pub mod book;
pub mod dex;
pub mod error;
pub mod mangrove;
pub mod num;
#[cfg(feature = "testing")]
pub mod testing;
pub mod types;

use alloy::primitives::Address;

#[derive(Clone, Copy, Debug)]
/// Addresses of the exchange contracts on the connected chain.
pub struct Deployment {
    mangrove: Address,
    reader: Address,
}

impl Deployment {
    pub fn new(mangrove: Address, reader: Address) -> Self { Self { mangrove, reader } }

    /// Core exchange contract, also the spender of maker/taker tokens.
    pub fn mangrove(&self) -> Address { self.mangrove }

    /// Read-only helper contract used to list markets and offers.
    pub fn reader(&self) -> Address { self.reader }
}
