use alloy::{
    contract,
    primitives::TxHash,
    providers::PendingTransactionError,
    transports::{RpcError, TransportErrorKind},
};
use thiserror::Error;

/// Errors returned by the SDK.
///
/// Everything coming from the node or the contracts is kept as-is, so the
/// caller can tell transport hiccups from reverted transactions.
#[derive(Debug, Error)]
pub enum DexError {
    #[error("RPC transport error: {0}")]
    Transport(#[from] RpcError<TransportErrorKind>),

    #[error("contract call failed: {}", describe_contract_error(.0))]
    Contract(#[from] contract::Error),

    #[error("pending transaction failed: {0}")]
    PendingTransaction(#[from] PendingTransactionError),

    #[error("transaction {0} reverted")]
    Reverted(TxHash),

    #[error("order not filled: wanted {wanted}, got {got}")]
    NotFilled { wanted: String, got: String },

    #[error("amount conversion failed: {0}")]
    Conversion(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Prefers the human readable revert reason (e.g.
/// `mgv/writeOffer/density/tooLow`) when the error carries revert data.
fn describe_contract_error(err: &contract::Error) -> String {
    err.as_revert_data()
        .and_then(|data| alloy_sol_types::decode_revert_reason(&data))
        .unwrap_or_else(|| err.to_string())
}
