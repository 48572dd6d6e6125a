//! Consensus-derived and protocol-chosen constants shared by every module,
//! plus the default Electrum endpoints named by the on-chain/interface
//! contract (spec.md §6). Connecting to these endpoints is a caller's job;
//! this crate only carries the addresses as a single source of truth.

use bitcoin::hashes::{sha256, Hash};
use bitcoin::{Network, ScriptBuf};

/// Maximum number of bytes a single script push may carry (consensus rule).
pub const CHUNK_SIZE: usize = 520;

/// Total amount of payload data a single P2SH input's signature script can
/// carry across its chunk pushes (the on-chain contract's fixed budget per
/// input, independent of `CHUNK_SIZE`'s single-push limit).
pub const PART_SIZE: usize = 1461;

/// Minimum value, in satoshis, a P2PKH output may carry without being
/// relayed as dust.
pub const DUST_LIMIT_SATS: u64 = 546;

/// Upper bound on the number of funding slots a single injection may use.
/// Slots are ordered and consumed in sequence by the transaction builder;
/// this bound exists only to keep a single redemption transaction's input
/// count sane, not because of any one-byte index encoding (this crate does
/// not prefix chunks with an index byte; see SPEC_FULL.md §9).
pub const MAX_PARTS: usize = 255;

/// Largest payload this crate will plan for, derived from `MAX_PARTS *
/// PART_SIZE`.
pub const MAX_PAYLOAD_LEN: usize = MAX_PARTS * PART_SIZE;

pub const DEFAULT_ELECTRUM_MAINNET: &str = "blockstream.info:110";
pub const DEFAULT_ELECTRUM_TESTNET: &str = "blockstream.info:143";
pub const DEFAULT_ELECTRUM_REGTEST: &str = "localhost:50001";

/// Looks up the default Electrum server for a network, mirroring the
/// lookup a CLI front-end performs before it opens a connection.
pub fn default_electrum_endpoint(network: Network) -> &'static str {
    match network {
        Network::Bitcoin => DEFAULT_ELECTRUM_MAINNET,
        Network::Testnet => DEFAULT_ELECTRUM_TESTNET,
        Network::Regtest => DEFAULT_ELECTRUM_REGTEST,
        _ => DEFAULT_ELECTRUM_REGTEST,
    }
}

/// The key a `ChainIndex` implementation backed by an Electrum server
/// subscribes and queries history with: SHA-256 of the scriptPubKey, byte-
/// reversed, hex-encoded — the Electrum protocol's "scripthash" convention.
/// Grounded in `injector.go`'s `WaitPayments`, which computes this before
/// every `GetHistory` call.
pub fn electrum_script_hash(script_pubkey: &ScriptBuf) -> String {
    let digest = sha256::Hash::hash(script_pubkey.as_bytes());
    let mut bytes = digest.to_byte_array();
    bytes.reverse();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_network_specific() {
        assert_eq!(default_electrum_endpoint(Network::Bitcoin), DEFAULT_ELECTRUM_MAINNET);
        assert_eq!(default_electrum_endpoint(Network::Testnet), DEFAULT_ELECTRUM_TESTNET);
        assert_eq!(default_electrum_endpoint(Network::Regtest), DEFAULT_ELECTRUM_REGTEST);
    }

    #[test]
    fn script_hash_is_reversed_sha256_hex() {
        let script = ScriptBuf::new();
        let digest = sha256::Hash::hash(script.as_bytes());
        let mut expected = digest.to_byte_array();
        expected.reverse();

        assert_eq!(electrum_script_hash(&script), hex::encode(expected));
        assert_eq!(electrum_script_hash(&script).len(), 64);
    }
}
