//! Crate-wide error type.
//!
//! Every fallible operation in this crate returns [`Error`]. Variants are
//! grouped loosely along the error kinds named by the on-chain contract:
//! input validation, cryptography, script construction, chain-index
//! access and broadcast, and parsing on the extraction side.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The payload handed to the planner was empty.
    #[error("payload must contain at least one byte")]
    EmptyPayload,

    /// The payload exceeds the maximum size this encoding can address.
    #[error("payload of {len} bytes exceeds the maximum of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },

    /// A chunk size of zero was requested.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    /// The fee rate supplied for cost estimation was not positive.
    #[error("fee rate must be greater than zero")]
    InvalidFeeRate,

    /// The payout amount fell below the P2PKH dust floor.
    #[error("payout amount of {sats} sats is below the dust floor of {floor} sats")]
    BelowDustFloor { sats: u64, floor: u64 },

    /// The payload requires more parts than the one-byte slot count can address.
    #[error("payload requires {parts} inputs, exceeding the {max}-part limit")]
    TooManyParts { parts: usize, max: usize },

    /// A single push exceeded the 520-byte consensus limit.
    #[error("script push of {len} bytes exceeds the 520-byte limit")]
    PushTooLarge { len: usize },

    /// The assembled redeem script exceeded the consensus script size limit.
    #[error("redeem script of {len} bytes exceeds the {max}-byte consensus limit")]
    ScriptTooLarge { len: usize, max: usize },

    /// secp256k1 rejected a key or signing operation.
    #[error("cryptographic operation failed: {0}")]
    Crypto(#[source] secp256k1::Error),

    /// The legacy sighash could not be computed for the given input.
    #[error("could not compute sighash for input {index}")]
    Sighash { index: usize },

    /// Deriving a P2SH or P2PKH address from a script failed.
    #[error("could not derive address: {0}")]
    Address(#[source] bitcoin::address::Error),

    /// A user-supplied change address does not belong to the expected network.
    #[error("change address does not belong to the expected network")]
    WrongNetwork,

    /// Serializing the transaction failed, or produced a pathological size.
    #[error("failed to serialize transaction")]
    Serialize,

    /// The `ChainIndex` collaborator returned an error while polling history,
    /// fetching a raw transaction, or broadcasting. Retried by the watcher;
    /// fatal if it occurs during broadcast.
    #[error("chain index request failed: {0}")]
    Index(#[source] anyhow::Error),

    /// The transaction bytes handed to the extractor did not deserialize.
    #[error("could not deserialize transaction: {0}")]
    MalformedTransaction(#[source] bitcoin::consensus::encode::Error),

    /// An input's signature script had fewer than the three required pushes.
    #[error("input {index} has fewer than three pushes")]
    TooFewPushes { index: usize },

    /// An input's signature script contained an opcode where a data push was
    /// expected.
    #[error("input {index} contains a non-push opcode where data was expected")]
    UnexpectedOpcode { index: usize },

    /// A funding slot's UTXO has not yet been bound by the payment watcher.
    #[error("slot {index} has no bound UTXO")]
    UnboundSlot { index: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
