//! Builds the redemption transaction that spends every funding slot's UTXO
//! and pays out the reassembled value, in both estimation and signing mode.
//!
//! Grounded in `injection/p2sh.go`'s `P2SHBuildTX`/`buildSignatureScript`
//! (one txout, one input per part, two-phase signing) and in the dummy-key,
//! placeholder-signature estimation technique of `injector.go`'s
//! `EstimateCost` (a full-size dummy signature stands in for the real one so
//! the estimated transaction size matches the final one byte-for-byte).
//! Legacy sighash computation is grounded in the `legacy_signature_hash`
//! call shape confirmed across this corpus's modern `bitcoin` 0.31 users.

use crate::address::FundingPlan;
use crate::config::DUST_LIMIT_SATS;
use crate::error::Error;
use crate::keys::Keypair;
use crate::script::build_signature_script;
use bitcoin::absolute::LockTime;
use bitcoin::consensus;
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{Message, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};

/// A placeholder signature of the maximum DER length (a 73-byte ECDSA
/// signature, as the original source's `ECDSAMaxSignatureSize` constant),
/// used for cost estimation so the dummy transaction's size exactly matches
/// the one actually broadcast.
const MAX_SIGNATURE_LEN: usize = 73;

/// The UTXO a funding slot was paid with, bound by the payment watcher.
#[derive(Clone, Copy, Debug)]
pub struct BoundUtxo {
    pub outpoint: OutPoint,
    pub value: Amount,
}

/// Whether the builder should produce a realistically-sized placeholder
/// transaction for fee estimation, or the final, fully signed one. The
/// signing material travels inside the `Sign` variant itself, so a signer
/// and an estimate-mode build are not separately representable states —
/// there is nothing left for `build` to `unwrap`.
#[derive(Clone, Copy, Debug)]
enum Mode<'a> {
    Estimate,
    Sign(&'a [BoundUtxo], &'a Keypair),
}

/// Builds the dummy transaction used to estimate the injection's total
/// cost, before any address has been funded. Every input is a placeholder
/// outpoint; every signature is a placeholder of maximum length.
pub fn estimate(plan: &FundingPlan, payout_script: ScriptBuf) -> Result<Transaction, Error> {
    build(plan, payout_script, Amount::from_sat(0), Mode::Estimate)
}

/// Builds and signs the final redemption transaction once every slot's UTXO
/// has been bound.
pub fn sign(
    plan: &FundingPlan,
    payout_script: ScriptBuf,
    payout_value: Amount,
    utxos: &[BoundUtxo],
    keypair: &Keypair,
) -> Result<Transaction, Error> {
    if payout_value.to_sat() < DUST_LIMIT_SATS {
        return Err(Error::BelowDustFloor {
            sats: payout_value.to_sat(),
            floor: DUST_LIMIT_SATS,
        });
    }

    build(plan, payout_script, payout_value, Mode::Sign(utxos, keypair))
}

/// Computes the §4.4 cost estimate from an already-built estimate-mode
/// transaction: the total cost at `fee_rate` sats/byte plus the dust floor,
/// the per-slot share a payer should send to each funding address, and the
/// transaction's serialized size in bytes.
pub fn estimate_cost(
    tx: &Transaction,
    fee_rate: u64,
    slots: usize,
) -> Result<(Amount, Amount, usize), Error> {
    if fee_rate == 0 {
        return Err(Error::InvalidFeeRate);
    }

    if slots == 0 {
        return Err(Error::EmptyPayload);
    }

    let serialized_size = consensus::serialize(tx).len();
    let total_sats = serialized_size as u64 * fee_rate + DUST_LIMIT_SATS;
    let slots = slots as u64;
    let per_slot_sats = (total_sats + slots - 1) / slots;

    Ok((
        Amount::from_sat(total_sats),
        Amount::from_sat(per_slot_sats),
        serialized_size,
    ))
}

fn build(
    plan: &FundingPlan,
    payout_script: ScriptBuf,
    payout_value: Amount,
    mode: Mode<'_>,
) -> Result<Transaction, Error> {
    if plan.is_empty() {
        return Err(Error::EmptyPayload);
    }

    if let Mode::Sign(utxos, _) = mode {
        if utxos.len() != plan.len() {
            return Err(Error::UnboundSlot { index: utxos.len() });
        }
    }

    let input = plan
        .slots
        .iter()
        .enumerate()
        .map(|(index, _)| {
            let previous_output = match mode {
                Mode::Estimate => OutPoint::null(),
                Mode::Sign(utxos, _) => utxos[index].outpoint,
            };

            TxIn {
                previous_output,
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            }
        })
        .collect();

    let mut tx = Transaction {
        version: Version::ONE,
        lock_time: LockTime::ZERO,
        input,
        output: vec![TxOut {
            value: payout_value,
            script_pubkey: payout_script,
        }],
    };

    match mode {
        Mode::Estimate => fill_estimate_signature_scripts(&mut tx, plan)?,
        Mode::Sign(_, keypair) => fill_real_signature_scripts(&mut tx, plan, keypair)?,
    }

    Ok(tx)
}

fn fill_estimate_signature_scripts(tx: &mut Transaction, plan: &FundingPlan) -> Result<(), Error> {
    let placeholder_sig = vec![0u8; MAX_SIGNATURE_LEN];

    let scripts: Vec<ScriptBuf> = plan
        .slots
        .iter()
        .map(|slot| build_signature_script(&placeholder_sig, &slot.chunks, &slot.redeem_script))
        .collect::<Result<_, _>>()?;

    for (input, script) in tx.input.iter_mut().zip(scripts) {
        input.script_sig = script;
    }

    Ok(())
}

fn fill_real_signature_scripts(
    tx: &mut Transaction,
    plan: &FundingPlan,
    keypair: &Keypair,
) -> Result<(), Error> {
    let secp = Secp256k1::new();
    let sighash_type = EcdsaSighashType::All;

    // Two-phase signing: compute every signature against the unsigned
    // transaction first, then install scriptSigs, so that no input's
    // signature depends on another input's already-filled script.
    let mut signatures = Vec::with_capacity(plan.len());
    for (index, slot) in plan.slots.iter().enumerate() {
        let sighash = SighashCache::new(&*tx)
            .legacy_signature_hash(index, &slot.redeem_script, sighash_type.to_u32())
            .map_err(|_| Error::Sighash { index })?;

        let message = Message::from_digest(sighash.to_byte_array());
        let signature = secp.sign_ecdsa(&message, keypair.secret_key());

        let mut sig_bytes = signature.serialize_der().to_vec();
        sig_bytes.push(sighash_type.to_u32() as u8);
        signatures.push(sig_bytes);
    }

    for (index, (slot, signature)) in plan.slots.iter().zip(signatures).enumerate() {
        tx.input[index].script_sig =
            build_signature_script(&signature, &slot.chunks, &slot.redeem_script)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::derive_funding_plan;
    use bitcoin::Network;

    fn test_plan(payload: &[u8], key: &Keypair) -> FundingPlan {
        derive_funding_plan(payload, key, Network::Testnet).unwrap()
    }

    #[test]
    fn estimate_has_one_input_per_slot_and_one_output() {
        let key = Keypair::from_secret_bytes(&[0x01; 32]).unwrap();
        let plan = test_plan(&[0u8; 1462], &key);
        let payout = key.p2pkh_script_pubkey();

        let tx = estimate(&plan, payout).unwrap();
        assert_eq!(tx.input.len(), 2);
        assert_eq!(tx.output.len(), 1);
    }

    #[test]
    fn sign_rejects_payout_below_dust_floor() {
        let key = Keypair::from_secret_bytes(&[0x01; 32]).unwrap();
        let plan = test_plan(b"hello world", &key);
        let payout = key.p2pkh_script_pubkey();
        let utxo = BoundUtxo {
            outpoint: OutPoint::null(),
            value: Amount::from_sat(10_000),
        };

        let result = sign(&plan, payout, Amount::from_sat(10), &[utxo], &key);
        assert!(matches!(result, Err(Error::BelowDustFloor { .. })));
    }

    #[test]
    fn sign_rejects_mismatched_utxo_count() {
        let key = Keypair::from_secret_bytes(&[0x01; 32]).unwrap();
        let plan = test_plan(&[0u8; 1462], &key);
        let payout = key.p2pkh_script_pubkey();
        let utxo = BoundUtxo {
            outpoint: OutPoint::null(),
            value: Amount::from_sat(10_000),
        };

        let result = sign(&plan, payout, Amount::from_sat(10_000), &[utxo], &key);
        assert!(matches!(result, Err(Error::UnboundSlot { .. })));
    }

    #[test]
    fn estimate_cost_rejects_a_zero_fee_rate() {
        let key = Keypair::from_secret_bytes(&[0x01; 32]).unwrap();
        let plan = test_plan(b"hello world", &key);
        let payout = key.p2pkh_script_pubkey();
        let tx = estimate(&plan, payout).unwrap();

        let result = estimate_cost(&tx, 0, plan.len());
        assert!(matches!(result, Err(Error::InvalidFeeRate)));
    }

    #[test]
    fn estimate_cost_splits_the_total_evenly_across_slots() {
        let key = Keypair::from_secret_bytes(&[0x01; 32]).unwrap();
        let plan = test_plan(&[0u8; 1462], &key);
        let payout = key.p2pkh_script_pubkey();
        let tx = estimate(&plan, payout).unwrap();

        let (total, per_slot, serialized_size) = estimate_cost(&tx, 2, plan.len()).unwrap();
        assert_eq!(serialized_size, bitcoin::consensus::serialize(&tx).len());
        assert_eq!(total.to_sat(), serialized_size as u64 * 2 + DUST_LIMIT_SATS);
        assert!(per_slot.to_sat() * plan.len() as u64 >= total.to_sat());
    }

    #[test]
    fn signed_transaction_has_nonempty_script_sigs() {
        let key = Keypair::from_secret_bytes(&[0x01; 32]).unwrap();
        let plan = test_plan(b"hello world", &key);
        let payout = key.p2pkh_script_pubkey();
        let utxos: Vec<BoundUtxo> = plan
            .slots
            .iter()
            .map(|_| BoundUtxo {
                outpoint: OutPoint::null(),
                value: Amount::from_sat(10_000),
            })
            .collect();

        let tx = sign(&plan, payout, Amount::from_sat(1_000), &utxos, &key).unwrap();
        for input in &tx.input {
            assert!(!input.script_sig.is_empty());
        }
    }
}
