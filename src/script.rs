//! Redeem script and signature script assembly for the legacy P2SH encoding.
//!
//! Grounded in `details/btc/redeem_script.rs` (`RedeemScript::from_pubkeys`,
//! `Builder`-based construction) and in `injection/p2sh.go`'s
//! `buildRedeemScript`/`buildSignatureScript`, which is the ground truth for
//! operator order: chunks are hashed from the last chunk down to the first,
//! so that the stack — built by pushing chunks in forward order in the
//! signature script — is popped back in forward order by the redeem script.

use crate::config::CHUNK_SIZE;
use crate::error::Error;
use bitcoin::blockdata::opcodes::all as opcodes;
use bitcoin::blockdata::script::{Builder, ScriptBuf};
use bitcoin::hashes::{hash160, Hash};
use bitcoin::script::PushBytesBuf;
use bitcoin::PublicKey;

/// Consensus limit on serialized script size (`MAX_SCRIPT_SIZE` in Bitcoin
/// Core), applied to the redeem script since it is itself pushed as data in
/// the signature script.
pub const MAX_SCRIPT_SIZE: usize = 10_000;

fn push_bytes(bytes: &[u8]) -> Result<PushBytesBuf, Error> {
    if bytes.len() > CHUNK_SIZE {
        return Err(Error::PushTooLarge { len: bytes.len() });
    }
    PushBytesBuf::try_from(bytes.to_vec()).map_err(|_| Error::PushTooLarge { len: bytes.len() })
}

/// Builds the redeem script for one funding slot: a chain of
/// `OP_HASH160 <hash160(chunk)> OP_EQUALVERIFY`, one per chunk in reverse
/// order, followed by `<pubkey> OP_CHECKSIG`.
pub fn build_redeem_script(pubkey: &PublicKey, chunks: &[&[u8]]) -> Result<ScriptBuf, Error> {
    let mut builder = Builder::new();

    for chunk in chunks.iter().rev() {
        let hash = hash160::Hash::hash(chunk);
        builder = builder
            .push_opcode(opcodes::OP_HASH160)
            .push_slice(hash.to_byte_array())
            .push_opcode(opcodes::OP_EQUALVERIFY);
    }

    let pubkey_bytes = push_bytes(&pubkey.to_bytes())?;
    let script = builder
        .push_slice(pubkey_bytes)
        .push_opcode(opcodes::OP_CHECKSIG)
        .into_script();

    if script.len() > MAX_SCRIPT_SIZE {
        return Err(Error::ScriptTooLarge {
            len: script.len(),
            max: MAX_SCRIPT_SIZE,
        });
    }

    Ok(script)
}

/// Builds the signature script for one funding slot: the DER-encoded
/// signature (with sighash byte appended), each chunk in forward order, and
/// the redeem script itself.
pub fn build_signature_script(
    signature_with_sighash: &[u8],
    chunks: &[&[u8]],
    redeem_script: &ScriptBuf,
) -> Result<ScriptBuf, Error> {
    let mut builder = Builder::new().push_slice(push_bytes(signature_with_sighash)?);

    for chunk in chunks {
        builder = builder.push_slice(push_bytes(chunk)?);
    }

    let redeem_bytes = PushBytesBuf::try_from(redeem_script.to_bytes())
        .map_err(|_| Error::PushTooLarge { len: redeem_script.len() })?;

    Ok(builder.push_slice(redeem_bytes).into_script())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Keypair;

    #[test]
    fn redeem_script_ends_with_pubkey_and_checksig() {
        let key = Keypair::from_secret_bytes(&[0x01; 32]).unwrap();
        let chunks: Vec<&[u8]> = vec![b"hello", b"world"];
        let script = build_redeem_script(&key.public_key(), &chunks).unwrap();
        let bytes = script.as_bytes();

        assert_eq!(bytes[bytes.len() - 1], opcodes::OP_CHECKSIG.to_u8());
        assert_eq!(bytes[bytes.len() - 35], 33);
    }

    #[test]
    fn redeem_script_has_one_hash_layer_per_chunk() {
        let key = Keypair::from_secret_bytes(&[0x01; 32]).unwrap();
        let chunks: Vec<&[u8]> = vec![b"a", b"b", b"c"];
        let script = build_redeem_script(&key.public_key(), &chunks).unwrap();
        let hash_ops = script
            .as_bytes()
            .iter()
            .filter(|&&b| b == opcodes::OP_HASH160.to_u8())
            .count();
        assert_eq!(hash_ops, 3);
    }

    #[test]
    fn oversized_chunk_is_rejected() {
        let key = Keypair::from_secret_bytes(&[0x01; 32]).unwrap();
        let huge = vec![0u8; CHUNK_SIZE + 1];
        let chunks: Vec<&[u8]> = vec![&huge];
        assert!(matches!(
            build_redeem_script(&key.public_key(), &chunks),
            Err(Error::PushTooLarge { .. })
        ));
    }

    #[test]
    fn signature_script_contains_every_chunk_and_the_redeem_script() {
        let key = Keypair::from_secret_bytes(&[0x01; 32]).unwrap();
        let chunks: Vec<&[u8]> = vec![b"one", b"two"];
        let redeem_script = build_redeem_script(&key.public_key(), &chunks).unwrap();
        let sig = vec![0u8; 71];

        let sig_script = build_signature_script(&sig, &chunks, &redeem_script).unwrap();
        let bytes = sig_script.as_bytes();
        assert!(bytes.windows(redeem_script.len()).any(|w| w == redeem_script.as_bytes()));
    }
}
